use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::browser::Locator;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// What to watch and how often. Built once at startup and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub event_label: String,
    pub target_url: String,
    /// `None` reports every parsed price.
    #[serde(default)]
    pub price_threshold: Option<f64>,
    #[serde(default = "default_refresh_lower")]
    pub refresh_lower_secs: u64,
    #[serde(default = "default_refresh_upper")]
    pub refresh_upper_secs: u64,
    #[serde(default = "default_retry_cap")]
    pub retry_cap: u32,
    #[serde(default = "default_wait_secs")]
    pub default_wait_secs: u64,
    #[serde(default = "default_short_delay")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_short_delay")]
    pub settle_delay_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub continue_button: String,
    pub listings_container: String,
    pub listing_item: String,
    pub listing_price: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub chrome_path: Option<String>,
    pub user_agent: Option<String>,
    pub window_size: Option<(u32, u32)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    Sms,
    Email,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub channel: NotificationChannel,
    pub sms: SmsConfig,
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmsConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    pub use_tls: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: Option<String>,
}

fn default_refresh_lower() -> u64 {
    30
}

fn default_refresh_upper() -> u64 {
    120
}

fn default_retry_cap() -> u32 {
    10
}

fn default_wait_secs() -> u64 {
    30
}

fn default_short_delay() -> u64 {
    5
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            continue_button: "//button[contains(text(), 'Continue')]".to_string(),
            listings_container: "//div[@class='resale-offer-selection']".to_string(),
            listing_item: ".//div[@class='resale-list-item']".to_string(),
            listing_price: ".//div[@class='seat-header-bottom row']/div[3]/div/div/span".to_string(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            user_agent: None,
            window_size: None,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            channel: NotificationChannel::Sms,
            sms: SmsConfig::default(),
            email: EmailConfig::default(),
        }
    }
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            from_number: None,
            to_number: None,
            api_base: "https://api.twilio.com".to_string(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: 587,
            username: None,
            password: None,
            from_address: None,
            to_address: None,
            use_tls: true,
        }
    }
}

impl MonitorConfig {
    pub fn default_wait(&self) -> Duration {
        Duration::from_secs(self.default_wait_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }
}

impl SelectorConfig {
    pub fn continue_button(&self) -> Locator {
        Locator::parse(&self.continue_button)
    }

    pub fn listings_container(&self) -> Locator {
        Locator::parse(&self.listings_container)
    }

    pub fn listing_item(&self) -> Locator {
        Locator::parse(&self.listing_item)
    }

    pub fn listing_price(&self) -> Locator {
        Locator::parse(&self.listing_price)
    }
}

impl AppConfig {
    /// Load and validate layered configuration.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Read layered configuration without validating it, so callers can apply
    /// overrides first.
    ///
    /// With an explicit `path` only that file is read; otherwise
    /// `config/default`, `config/{RUN_MODE}` and `config/local` are read when
    /// present. Environment variables prefixed `TICKET_WATCHER__` override
    /// both, and the conventional `TWILIO_*` / `CHROME_PATH` variables fill in
    /// credentials the files leave out.
    pub fn read(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => {
                let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
                builder
                    .add_source(File::with_name("config/default").required(false))
                    .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
                    .add_source(File::with_name("config/local").required(false))
            }
        };

        let s = builder
            .add_source(Environment::with_prefix("TICKET_WATCHER").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;
        config.apply_env_fallbacks();
        Ok(config)
    }

    fn apply_env_fallbacks(&mut self) {
        let sms = &mut self.notifications.sms;
        fill_from_env(&mut sms.account_sid, "TWILIO_ACCOUNT_SID");
        fill_from_env(&mut sms.auth_token, "TWILIO_AUTH_TOKEN");
        fill_from_env(&mut sms.from_number, "TWILIO_FROM_NUMBER");
        fill_from_env(&mut sms.to_number, "TWILIO_TO_NUMBER");
        fill_from_env(&mut self.browser.chrome_path, "CHROME_PATH");
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let monitor = &self.monitor;

        if monitor.event_label.trim().is_empty() {
            return Err(ConfigError::Message("Monitor event_label must not be empty".into()));
        }

        if Url::parse(&monitor.target_url).is_err() {
            return Err(ConfigError::Message("Invalid target URL format".into()));
        }

        if let Some(threshold) = monitor.price_threshold {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(ConfigError::Message(
                    "Price threshold must be a non-negative number".into(),
                ));
            }
        }

        if monitor.refresh_lower_secs == 0 {
            return Err(ConfigError::Message("Refresh lower bound must be greater than 0".into()));
        }

        if monitor.refresh_lower_secs >= monitor.refresh_upper_secs {
            return Err(ConfigError::Message(
                "Refresh lower bound must be less than upper bound".into(),
            ));
        }

        if monitor.retry_cap == 0 {
            return Err(ConfigError::Message("Retry cap must be at least 1".into()));
        }

        if monitor.default_wait_secs == 0 {
            return Err(ConfigError::Message("Default wait must be greater than 0".into()));
        }

        let selectors = [
            ("continue_button", &self.selectors.continue_button),
            ("listings_container", &self.selectors.listings_container),
            ("listing_item", &self.selectors.listing_item),
            ("listing_price", &self.selectors.listing_price),
        ];
        for (name, selector) in selectors {
            if selector.trim().is_empty() {
                return Err(ConfigError::Message(format!("Selector {} must not be empty", name)));
            }
        }

        match self.notifications.channel {
            NotificationChannel::Sms => {
                let sms = &self.notifications.sms;
                let missing = [
                    ("account_sid", &sms.account_sid),
                    ("auth_token", &sms.auth_token),
                    ("from_number", &sms.from_number),
                    ("to_number", &sms.to_number),
                ]
                .into_iter()
                .find(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()));

                if let Some((name, _)) = missing {
                    return Err(ConfigError::Message(format!("SMS notifications require {}", name)));
                }
            }
            NotificationChannel::Email => {
                let email = &self.notifications.email;
                if email.smtp_host.is_none() {
                    return Err(ConfigError::Message("Email notifications require smtp_host".into()));
                }
                if email.from_address.is_none() || email.to_address.is_none() {
                    return Err(ConfigError::Message(
                        "Email notifications require from_address and to_address".into(),
                    ));
                }
                if email.smtp_port == 0 {
                    return Err(ConfigError::Message("SMTP port must be greater than 0".into()));
                }
            }
            NotificationChannel::None => {}
        }

        Ok(())
    }
}

fn fill_from_env(slot: &mut Option<String>, var: &str) {
    if slot.is_none() {
        *slot = env::var(var).ok();
    }
}
