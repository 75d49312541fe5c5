use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::SmsConfig;
use crate::models::Alert;
use crate::plugins::traits::{NotificationResult, NotifierPlugin};
use crate::utils::error::{AppError, Result};

const CHANNEL: &str = "sms";

/// Sends alerts as text messages through the Twilio Messages API.
pub struct SmsNotifier {
    client: Client,
    api_base: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
    to_number: String,
}

impl SmsNotifier {
    pub fn from_config(config: &SmsConfig) -> Result<Self> {
        let required = |value: &Option<String>, name: &str| {
            value
                .clone()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AppError::notification(CHANNEL, format!("Missing {}", name)))
        };

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            account_sid: required(&config.account_sid, "account_sid")?,
            auth_token: required(&config.auth_token, "auth_token")?,
            from_number: required(&config.from_number, "from_number")?,
            to_number: required(&config.to_number, "to_number")?,
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        )
    }

    pub async fn send(&self, body: &str, from: &str, to: &str) -> Result<NotificationResult> {
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("Body", body), ("From", from), ("To", to)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::notification(CHANNEL, format!("{}: {}", status, detail)));
        }

        let payload: serde_json::Value = response.json().await?;
        Ok(NotificationResult {
            channel: CHANNEL.to_string(),
            message_id: payload.get("sid").and_then(|v| v.as_str()).map(str::to_string),
        })
    }
}

#[async_trait]
impl NotifierPlugin for SmsNotifier {
    fn name(&self) -> &str {
        "SMS Notifier"
    }

    fn plugin_type(&self) -> &str {
        CHANNEL
    }

    fn description(&self) -> &str {
        "Sends price alerts as SMS via Twilio"
    }

    async fn notify(&self, alert: &Alert) -> Result<NotificationResult> {
        tracing::info!(to = %self.to_number, "Sending SMS");
        let result = self
            .send(&alert.message_body(), &self.from_number, &self.to_number)
            .await?;
        tracing::info!(message_id = ?result.message_id, "SMS sent");
        Ok(result)
    }
}
