pub mod alert;
pub mod listing;

pub use alert::Alert;
pub use listing::{ParsedPrice, RawListing};
