// src/services/fetcher.rs

//! Page fetching.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};

/// Retrieves the raw markup of a page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url`, failing with [`AppError::Fetch`] on network errors,
    /// timeouts and non-success statuses.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Fetches pages over HTTP with a shared client.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::fetch(url, describe(&e)))?;

        let response = response
            .error_for_status()
            .map_err(|e| AppError::fetch(url, describe(&e)))?;

        response
            .text()
            .await
            .map_err(|e| AppError::fetch(url, describe(&e)))
    }
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("timed out: {error}")
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else if let Some(status) = error.status() {
        format!("HTTP status {status}")
    } else {
        error.to_string()
    }
}
