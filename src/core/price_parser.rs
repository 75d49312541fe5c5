use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::models::{ParsedPrice, RawListing};

static CURRENCY_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:US\$|USD\$|A\$|C\$|NZ\$|[\$£€¥₹])\s*").expect("currency prefix pattern is valid")
});

/// Unsigned amount: plain digits or comma-grouped thousands, optional fraction.
static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?$").expect("amount pattern is valid")
});

/// Result of parsing one listing.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Price(ParsedPrice),
    /// Blank cell: loading placeholder or sold-out row.
    Empty,
    /// Non-blank text that is not a price.
    Malformed(String),
}

pub struct PriceParser {
    threshold: Option<f64>,
}

impl PriceParser {
    pub fn new(threshold: Option<f64>) -> Self {
        Self { threshold }
    }

    pub fn parse_listing(listing: &RawListing) -> ParseOutcome {
        let trimmed = listing.as_str().trim();
        if trimmed.is_empty() {
            return ParseOutcome::Empty;
        }

        let body = CURRENCY_PREFIX.replace(trimmed, "");
        if !AMOUNT.is_match(&body) {
            return ParseOutcome::Malformed(trimmed.to_string());
        }

        // Out of Decimal range means the cell is not a ticket price
        let digits = body.replace(',', "");
        match (Decimal::from_str(&digits), digits.parse::<f64>()) {
            (Ok(_), Ok(value)) => ParseOutcome::Price(ParsedPrice::new(value)),
            _ => ParseOutcome::Malformed(trimmed.to_string()),
        }
    }

    /// Qualifying prices in listing order.
    ///
    /// Blank listings are dropped quietly; anything else that fails to parse
    /// is logged as a warning and dropped.
    pub fn parse(&self, listings: &[RawListing]) -> Vec<ParsedPrice> {
        let mut parsed = Vec::with_capacity(listings.len());

        for listing in listings {
            match Self::parse_listing(listing) {
                ParseOutcome::Price(price) => parsed.push(price),
                ParseOutcome::Empty => {
                    tracing::debug!("Skipping empty listing");
                }
                ParseOutcome::Malformed(text) => {
                    tracing::warn!(text = %text, "Unexpected price format, skipping listing");
                }
            }
        }

        let qualifying: Vec<ParsedPrice> = parsed
            .iter()
            .copied()
            .filter(|p| p.qualifies(self.threshold))
            .collect();

        tracing::debug!(parsed = ?parsed, qualifying = ?qualifying, "Prices parsed");
        qualifying
    }
}
