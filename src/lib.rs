pub mod browser;
pub mod config;
pub mod core;
pub mod models;
pub mod plugins;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use utils::error::{AppError, Fatal};

pub type Result<T> = std::result::Result<T, AppError>;
