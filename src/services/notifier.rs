// src/services/notifier.rs

//! Webhook notification with bounded retry.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::error::{AppError, Result};
use crate::models::NotificationEvent;
use crate::utils::{RetryPolicy, retry};

/// Delivers a newest-link event somewhere.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Returns whether delivery was confirmed. Never fails.
    async fn notify(&self, link: &str, webhook_url: &str) -> bool;
}

/// Posts `{"press_release_link": ...}` to a webhook.
///
/// Only HTTP 200 confirms delivery; any other status, including other 2xx
/// codes, is retried according to the policy.
pub struct WebhookNotifier {
    client: Client,
    policy: RetryPolicy,
}

impl WebhookNotifier {
    /// Create a notifier with the default policy (3 attempts, 5 seconds apart).
    pub fn new(client: Client) -> Self {
        Self::with_policy(client, RetryPolicy::default())
    }

    pub fn with_policy(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn post_once(&self, link: &str, webhook_url: &str) -> Result<()> {
        let event = NotificationEvent::new(link);
        let response = self
            .client
            .post(webhook_url)
            .json(&event)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::notification(format!("timeout sending to {webhook_url}"))
                } else {
                    AppError::notification(e)
                }
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status if status.is_success() => Err(AppError::notification(format!(
                "unexpected status {status} from the webhook"
            ))),
            status => Err(AppError::notification(format!(
                "webhook responded with {status}"
            ))),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, link: &str, webhook_url: &str) -> bool {
        match retry(&self.policy, |_| self.post_once(link, webhook_url)).await {
            Ok(()) => {
                log::info!("Notification sent successfully for {}", link);
                true
            }
            Err(e) => {
                log::error!(
                    "Failed to send notification for {} after {} attempts: {}",
                    link,
                    e.attempts,
                    e.last_error
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClientConfig;
    use crate::utils::http::create_client;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LINK: &str = "https://example.com/pr/42";

    fn notifier() -> WebhookNotifier {
        let client = create_client(&ClientConfig::default()).unwrap();
        WebhookNotifier::with_policy(client, RetryPolicy::immediate(3))
    }

    async fn request_count(server: &MockServer) -> usize {
        server.received_requests().await.unwrap().len()
    }

    #[test]
    fn test_default_policy() {
        let client = create_client(&ClientConfig::default()).unwrap();
        let policy = *WebhookNotifier::new(client).policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_delivered_on_first_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_json(json!({ "press_release_link": LINK })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let delivered = notifier()
            .notify(LINK, &format!("{}/hook", server.uri()))
            .await;
        assert!(delivered);
    }

    #[tokio::test]
    async fn test_delivered_after_two_unavailable_responses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let delivered = notifier()
            .notify(LINK, &format!("{}/hook", server.uri()))
            .await;
        assert!(delivered);
        assert_eq!(request_count(&server).await, 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_three_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let delivered = notifier()
            .notify(LINK, &format!("{}/hook", server.uri()))
            .await;
        assert!(!delivered);
        assert_eq!(request_count(&server).await, 3);
    }

    #[tokio::test]
    async fn test_non_200_success_is_not_confirmation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let delivered = notifier()
            .notify(LINK, &format!("{}/hook", server.uri()))
            .await;
        assert!(!delivered);
        assert_eq!(request_count(&server).await, 3);
    }

    #[tokio::test]
    async fn test_unreachable_webhook_is_not_delivered() {
        let server = MockServer::start().await;
        let uri = format!("{}/hook", server.uri());
        drop(server);

        assert!(!notifier().notify(LINK, &uri).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_policy_waits_between_attempts_only() {
        let client = create_client(&ClientConfig::default()).unwrap();
        let notifier = WebhookNotifier::new(client);

        let started = tokio::time::Instant::now();
        assert!(!notifier.notify(LINK, "not a url").await);
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_secs(10), "waited {elapsed:?}");
        assert!(elapsed < Duration::from_secs(15), "waited {elapsed:?}");
    }
}
