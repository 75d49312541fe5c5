use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::Alert;
use crate::utils::error::Result;

/// Receipt for a delivered alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationResult {
    pub channel: String,
    pub message_id: Option<String>,
}

/// An outbound alert channel (SMS, email, ...).
///
/// `notify` returning `Err` means the alert was not delivered. Callers treat
/// that as recoverable: the next scan re-raises the alert if prices still
/// qualify.
#[async_trait]
pub trait NotifierPlugin: Send + Sync {
    /// Plugin metadata
    fn name(&self) -> &str;
    fn plugin_type(&self) -> &str;
    fn description(&self) -> &str;

    async fn notify(&self, alert: &Alert) -> Result<NotificationResult>;
}
