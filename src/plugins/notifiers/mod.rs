// Notifier plugin implementations
pub mod email;
pub mod noop;
pub mod sms;

pub use email::EmailNotifier;
pub use noop::NoopNotifier;
pub use sms::SmsNotifier;
