use super::notifiers::{EmailNotifier, NoopNotifier, SmsNotifier};
use super::traits::NotifierPlugin;
use crate::config::{NotificationChannel, NotificationsConfig};
use crate::utils::error::Result;

pub type NotifierPluginBox = Box<dyn NotifierPlugin>;

/// Build the notifier selected by configuration. `disabled` forces the
/// no-op notifier regardless of the configured channel.
pub fn build_notifier(config: &NotificationsConfig, disabled: bool) -> Result<NotifierPluginBox> {
    let channel = if disabled {
        NotificationChannel::None
    } else {
        config.channel
    };

    let notifier: NotifierPluginBox = match channel {
        NotificationChannel::Sms => Box::new(SmsNotifier::from_config(&config.sms)?),
        NotificationChannel::Email => Box::new(EmailNotifier::from_config(&config.email)?),
        NotificationChannel::None => Box::new(NoopNotifier::new()),
    };

    tracing::info!(notifier = notifier.name(), "Notifier ready");
    Ok(notifier)
}
