pub mod monitor;
pub mod navigator;
pub mod pacing;
pub mod price_parser;
pub mod scanner;
pub mod session;

pub use monitor::{MonitorLoop, MonitorState, MonitorStats, Termination};
pub use navigator::PageNavigator;
pub use pacing::RefreshPacer;
pub use price_parser::{ParseOutcome, PriceParser};
pub use scanner::PriceScanner;
pub use session::Session;
