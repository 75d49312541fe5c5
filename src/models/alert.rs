use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::listing::ParsedPrice;

/// Qualifying prices for one scan pass. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub event_label: String,
    pub prices: Vec<ParsedPrice>,
    pub detected_at: DateTime<Utc>,
}

impl Alert {
    /// Returns `None` when there is nothing to report.
    pub fn new(event_label: impl Into<String>, prices: Vec<ParsedPrice>) -> Option<Self> {
        if prices.is_empty() {
            return None;
        }

        Some(Self {
            event_label: event_label.into(),
            prices,
            detected_at: Utc::now(),
        })
    }

    pub fn lowest(&self) -> Option<ParsedPrice> {
        self.prices
            .iter()
            .copied()
            .min_by(|a, b| a.value().total_cmp(&b.value()))
    }

    /// Message body, e.g. `King Gizz Tickets --> [80.0, 95.5]`.
    pub fn message_body(&self) -> String {
        let prices = self
            .prices
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!("{} --> [{}]", self.event_label, prices)
    }
}
