use std::time::Duration;

use crate::browser::BrowserDriver;

/// One live browser plus the upper bound applied to every wait on it.
pub struct Session<D: BrowserDriver> {
    driver: D,
    default_wait: Duration,
    closed: bool,
}

impl<D: BrowserDriver> Session<D> {
    pub fn new(driver: D, default_wait: Duration) -> Self {
        Self {
            driver,
            default_wait,
            closed: false,
        }
    }

    pub fn default_wait(&self) -> Duration {
        self.default_wait
    }

    pub fn driver(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Quit the browser. Safe to call more than once.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(e) = self.driver.quit().await {
            tracing::error!("Failed to close browser session: {}", e);
        } else {
            tracing::info!("Browser session closed");
        }
    }
}
