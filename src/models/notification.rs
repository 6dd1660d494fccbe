//! Webhook payload.

use serde::{Deserialize, Serialize};

/// Event posted to the webhook when a new press release shows up.
///
/// Wire form: `{"press_release_link": "<href>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    #[serde(rename = "press_release_link")]
    pub link: String,
}

impl NotificationEvent {
    pub fn new(link: impl Into<String>) -> Self {
        Self { link: link.into() }
    }
}
