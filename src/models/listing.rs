use serde::{Deserialize, Serialize};

/// A price string exactly as the page displayed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawListing(pub String);

impl RawListing {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RawListing {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// A listing price that parsed cleanly.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct ParsedPrice(f64);

impl ParsedPrice {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// `None` threshold admits every price.
    pub fn qualifies(&self, threshold: Option<f64>) -> bool {
        threshold.is_none_or(|limit| self.0 <= limit)
    }
}

impl std::fmt::Display for ParsedPrice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Debug formatting keeps the trailing ".0" on whole amounts
        write!(f, "{:?}", self.0)
    }
}
