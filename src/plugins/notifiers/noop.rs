use async_trait::async_trait;

use crate::models::Alert;
use crate::plugins::traits::{NotificationResult, NotifierPlugin};
use crate::utils::error::Result;

/// Used when notifications are disabled; logs the alert and sends nothing.
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl NoopNotifier {
    pub fn new() -> Self {
        NoopNotifier
    }
}

#[async_trait]
impl NotifierPlugin for NoopNotifier {
    fn name(&self) -> &str {
        "No-op Notifier"
    }

    fn plugin_type(&self) -> &str {
        "none"
    }

    fn description(&self) -> &str {
        "Logs alerts without sending them"
    }

    async fn notify(&self, alert: &Alert) -> Result<NotificationResult> {
        tracing::info!(body = %alert.message_body(), "Notifications disabled, alert not sent");
        Ok(NotificationResult {
            channel: "none".to_string(),
            message_id: None,
        })
    }
}
