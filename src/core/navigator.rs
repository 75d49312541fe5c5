use std::time::Duration;

use crate::browser::{BrowserDriver, Locator};
use crate::config::{MonitorConfig, SelectorConfig};
use crate::core::session::Session;
use crate::utils::error::{Fatal, Result};

/// Drives the session from a cold start to a ready page:
/// load the target, wait for the URL, then get past the "continue" interstitial.
pub struct PageNavigator {
    target_url: String,
    continue_button: Locator,
    retry_cap: u32,
    retry_delay: Duration,
}

impl PageNavigator {
    pub fn new(monitor: &MonitorConfig, selectors: &SelectorConfig) -> Self {
        Self {
            target_url: monitor.target_url.clone(),
            continue_button: selectors.continue_button(),
            retry_cap: monitor.retry_cap,
            retry_delay: monitor.retry_delay(),
        }
    }

    pub async fn acquire_ready_page<D: BrowserDriver>(&self, session: &mut Session<D>) -> Result<()> {
        tracing::info!(url = %self.target_url, "Navigating to event page");
        session.driver().navigate(&self.target_url).await?;

        let wait = session.default_wait();
        if !session.driver().wait_until_url_equals(&self.target_url, wait).await? {
            tracing::error!("Error trying to fetch event url");
            return Err(Fatal::InitialLoadFailed {
                url: self.target_url.clone(),
            }
            .into());
        }

        let mut retries = 0;
        loop {
            if self.dismiss_interstitial(session).await? {
                return Ok(());
            }

            if retries >= self.retry_cap {
                tracing::error!(retries, "Continue button never appeared, giving up");
                return Err(Fatal::InterstitialNeverResolved { retries }.into());
            }

            retries += 1;
            tracing::warn!(
                retry = retries,
                retry_cap = self.retry_cap,
                "Unable to locate 'Continue' button, refreshing page"
            );
            tokio::time::sleep(self.retry_delay).await;
            session.driver().refresh().await?;
        }
    }

    /// Single attempt at the interstitial. `Ok(false)` means the button never
    /// became visible within the session's default wait.
    pub async fn dismiss_interstitial<D: BrowserDriver>(&self, session: &mut Session<D>) -> Result<bool> {
        tracing::info!("Attempting to click 'Continue' button");

        let wait = session.default_wait();
        match session.driver().wait_until_visible(&self.continue_button, wait).await? {
            Some(button) => {
                session.driver().click(button).await?;
                tracing::info!("'Continue' button clicked");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
