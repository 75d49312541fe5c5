use thiserror::Error;

/// Unrecoverable conditions that end the monitor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Fatal {
    #[error("initial load failed: page never reached {url}")]
    InitialLoadFailed { url: String },

    #[error("interstitial never resolved after {retries} retries")]
    InterstitialNeverResolved { retries: u32 },

    #[error("ticket table not found")]
    TicketTableNotFound,

    #[error("refresh interstitial failed")]
    RefreshInterstitialFailed,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Notification error: {channel}: {message}")]
    Notification { channel: String, message: String },

    #[error("Fatal: {0}")]
    Fatal(#[from] Fatal),
}

impl AppError {
    pub fn browser(context: &str, err: impl std::fmt::Display) -> Self {
        AppError::Browser(format!("{}: {}", context, err))
    }

    pub fn notification(channel: &str, message: impl Into<String>) -> Self {
        AppError::Notification {
            channel: channel.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
