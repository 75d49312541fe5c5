use crate::browser::{BrowserDriver, ElementHandle, Locator};
use crate::config::SelectorConfig;
use crate::core::session::Session;
use crate::models::RawListing;
use crate::utils::error::{Fatal, Result};

/// Reads the displayed price of every listing on a ready page.
pub struct PriceScanner {
    container: Locator,
    item: Locator,
    price: Locator,
}

impl PriceScanner {
    pub fn new(selectors: &SelectorConfig) -> Self {
        Self {
            container: selectors.listings_container(),
            item: selectors.listing_item(),
            price: selectors.listing_price(),
        }
    }

    /// Listings in document order. Rows whose price cell is missing or
    /// unreadable come back as empty strings; the page is mid-update during
    /// refreshes and one bad row must not sink the pass.
    pub async fn scan<D: BrowserDriver>(&self, session: &mut Session<D>) -> Result<Vec<RawListing>> {
        tracing::info!("Checking for ticket table");

        let wait = session.default_wait();
        let Some(table) = session.driver().wait_until_visible(&self.container, wait).await? else {
            tracing::error!(selector = %self.container, "Unable to locate the ticket table");
            return Err(Fatal::TicketTableNotFound.into());
        };

        let rows = session.driver().find_all(&self.item, Some(table)).await?;
        tracing::info!(count = rows.len(), "Ticket options found");

        let mut listings = Vec::with_capacity(rows.len());
        for row in rows {
            listings.push(self.read_price(session, row).await);
        }

        Ok(listings)
    }

    async fn read_price<D: BrowserDriver>(
        &self,
        session: &mut Session<D>,
        row: ElementHandle,
    ) -> RawListing {
        let cell = match session.driver().find(&self.price, Some(row)).await {
            Ok(Some(cell)) => cell,
            Ok(None) => {
                tracing::debug!("Listing has no price cell");
                return RawListing::empty();
            }
            Err(e) => {
                tracing::debug!("Price cell lookup failed: {}", e);
                return RawListing::empty();
            }
        };

        match session.driver().text(cell).await {
            Ok(text) => RawListing::new(text),
            Err(e) => {
                tracing::debug!("Price text unreadable: {}", e);
                RawListing::empty()
            }
        }
    }
}
