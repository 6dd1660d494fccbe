// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::ClientConfig;

/// Create a configured asynchronous HTTP client.
///
/// The timeout applies to every request made with the client, both page
/// fetches and webhook posts.
pub fn create_client(config: &ClientConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_with_defaults() {
        assert!(create_client(&ClientConfig::default()).is_ok());
    }
}
