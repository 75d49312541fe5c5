use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::EmailConfig;
use crate::models::Alert;
use crate::plugins::traits::{NotificationResult, NotifierPlugin};
use crate::utils::error::{AppError, Result};

const CHANNEL: &str = "email";

pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        let host = config
            .smtp_host
            .as_deref()
            .ok_or_else(|| AppError::notification(CHANNEL, "Missing smtp_host"))?;

        let builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| AppError::notification(CHANNEL, format!("Invalid SMTP relay: {}", e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };
        let mut builder = builder.port(config.smtp_port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: parse_mailbox(config.from_address.as_deref(), "from_address")?,
            to: parse_mailbox(config.to_address.as_deref(), "to_address")?,
        })
    }

    fn compose(&self, alert: &Alert) -> Result<Message> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(format!("Ticket alert: {}", alert.event_label))
            .header(ContentType::TEXT_PLAIN)
            .body(alert.message_body())
            .map_err(|e| AppError::notification(CHANNEL, format!("Failed to build message: {}", e)))
    }
}

fn parse_mailbox(address: Option<&str>, field: &str) -> Result<Mailbox> {
    let address = address.ok_or_else(|| AppError::notification(CHANNEL, format!("Missing {}", field)))?;
    address
        .parse()
        .map_err(|e| AppError::notification(CHANNEL, format!("Invalid {} '{}': {}", field, address, e)))
}

#[async_trait]
impl NotifierPlugin for EmailNotifier {
    fn name(&self) -> &str {
        "Email Notifier"
    }

    fn plugin_type(&self) -> &str {
        CHANNEL
    }

    fn description(&self) -> &str {
        "Sends price alerts via SMTP email"
    }

    async fn notify(&self, alert: &Alert) -> Result<NotificationResult> {
        let message = self.compose(alert)?;

        tracing::info!(to = %self.to, "Sending email");
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| AppError::notification(CHANNEL, e.to_string()))?;

        Ok(NotificationResult {
            channel: CHANNEL.to_string(),
            message_id: response.first_line().map(str::to_string),
        })
    }
}
