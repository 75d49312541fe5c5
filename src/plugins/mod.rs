pub mod manager;
pub mod notifiers;
pub mod traits;

pub use manager::build_notifier;
pub use traits::{NotificationResult, NotifierPlugin};
