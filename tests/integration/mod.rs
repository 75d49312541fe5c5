// Shared fixtures for the integration tests: a scripted browser driver and a
// notifier that records what it was asked to send.

pub mod scanner_tests;
pub mod sms_tests;

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ticket_watcher::browser::{BrowserDriver, ElementHandle, Locator};
use ticket_watcher::config::{
    AppConfig, BrowserConfig, LoggingConfig, MonitorConfig, NotificationChannel,
    NotificationsConfig, SelectorConfig,
};
use ticket_watcher::core::{MonitorLoop, RefreshPacer, Session};
use ticket_watcher::models::Alert;
use ticket_watcher::plugins::{NotificationResult, NotifierPlugin};
use ticket_watcher::{AppError, Result};

pub const TARGET_URL: &str = "https://tix.example.com/shop/search?locale=en-US";
pub const CONTINUE: &str = "#continue";
pub const TABLE: &str = "#resale-table";
pub const ROW: &str = ".resale-list-item";
pub const PRICE: &str = ".price";

const TABLE_HANDLE: u64 = 1;
const CONTINUE_HANDLE: u64 = 2;
const ROW_BASE: u64 = 100;
const CELL_BASE: u64 = 1_000;

pub fn test_config() -> AppConfig {
    AppConfig {
        monitor: MonitorConfig {
            event_label: "King Gizz Tickets".to_string(),
            target_url: TARGET_URL.to_string(),
            price_threshold: Some(100.0),
            refresh_lower_secs: 30,
            refresh_upper_secs: 120,
            retry_cap: 10,
            default_wait_secs: 30,
            retry_delay_secs: 5,
            settle_delay_secs: 5,
        },
        selectors: SelectorConfig {
            continue_button: format!("css:{}", CONTINUE),
            listings_container: format!("css:{}", TABLE),
            listing_item: format!("css:{}", ROW),
            listing_price: format!("css:{}", PRICE),
        },
        browser: BrowserConfig::default(),
        notifications: NotificationsConfig {
            channel: NotificationChannel::None,
            ..NotificationsConfig::default()
        },
        logging: LoggingConfig::default(),
    }
}

/// One listing row as the fake page renders it.
#[derive(Debug, Clone)]
pub enum Cell {
    Text(String),
    Missing,
    Unreadable,
}

pub fn page(prices: &[&str]) -> Vec<Cell> {
    prices.iter().map(|p| Cell::Text(p.to_string())).collect()
}

#[derive(Debug, Default)]
pub struct FakeState {
    /// URL the tab reports after `navigate`; `None` means the requested URL.
    pub redirect_to: Option<String>,
    pub current_url: String,
    /// Outcome of each wait for the continue button; `continue_default` once drained.
    pub continue_script: VecDeque<bool>,
    pub continue_default: bool,
    /// One entry per scan; the table is missing once drained.
    pub pages: VecDeque<Vec<Cell>>,
    pub current_page: Vec<Cell>,

    pub navigations: usize,
    pub continue_waits: usize,
    pub clicks: usize,
    pub refreshes: usize,
    pub quits: usize,
}

#[derive(Clone, Default)]
pub struct FakeDriver {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeDriver {
    pub fn new() -> Self {
        let driver = Self::default();
        driver.state.lock().unwrap().continue_default = true;
        driver
    }

    pub fn with_pages(self, pages: Vec<Vec<Cell>>) -> Self {
        self.state.lock().unwrap().pages = pages.into();
        self
    }

    pub fn with_continue_script(self, script: Vec<bool>, default: bool) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.continue_script = script.into();
            state.continue_default = default;
        }
        self
    }

    pub fn redirecting_to(self, url: &str) -> Self {
        self.state.lock().unwrap().redirect_to = Some(url.to_string());
        self
    }

    pub fn snapshot<T>(&self, f: impl FnOnce(&FakeState) -> T) -> T {
        f(&self.state.lock().unwrap())
    }
}

#[async_trait]
impl BrowserDriver for FakeDriver {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.navigations += 1;
        state.current_url = state.redirect_to.clone().unwrap_or_else(|| url.to_string());
        Ok(())
    }

    async fn wait_until_url_equals(&mut self, url: &str, timeout: Duration) -> Result<bool> {
        let matches = self.state.lock().unwrap().current_url == url;
        if !matches {
            tokio::time::sleep(timeout).await;
        }
        Ok(matches)
    }

    async fn wait_until_visible(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<ElementHandle>> {
        let found = {
            let mut state = self.state.lock().unwrap();
            match locator.as_str() {
                CONTINUE => {
                    state.continue_waits += 1;
                    let visible = state
                        .continue_script
                        .pop_front()
                        .unwrap_or(state.continue_default);
                    visible.then(|| ElementHandle::new(CONTINUE_HANDLE))
                }
                TABLE => state.pages.pop_front().map(|page| {
                    state.current_page = page;
                    ElementHandle::new(TABLE_HANDLE)
                }),
                other => panic!("unexpected wait for {}", other),
            }
        };

        if found.is_none() {
            tokio::time::sleep(timeout).await;
        }
        Ok(found)
    }

    async fn find_all(
        &mut self,
        locator: &Locator,
        scope: Option<ElementHandle>,
    ) -> Result<Vec<ElementHandle>> {
        assert_eq!(locator.as_str(), ROW);
        assert_eq!(scope, Some(ElementHandle::new(TABLE_HANDLE)));

        let rows = self.state.lock().unwrap().current_page.len() as u64;
        Ok((0..rows).map(|i| ElementHandle::new(ROW_BASE + i)).collect())
    }

    async fn find(
        &mut self,
        locator: &Locator,
        scope: Option<ElementHandle>,
    ) -> Result<Option<ElementHandle>> {
        assert_eq!(locator.as_str(), PRICE);
        let row = scope.expect("price lookup is scoped to a row").id() - ROW_BASE;

        let state = self.state.lock().unwrap();
        Ok(match state.current_page.get(row as usize) {
            Some(Cell::Missing) | None => None,
            Some(_) => Some(ElementHandle::new(CELL_BASE + row)),
        })
    }

    async fn text(&mut self, element: ElementHandle) -> Result<String> {
        let row = (element.id() - CELL_BASE) as usize;
        let state = self.state.lock().unwrap();
        match state.current_page.get(row) {
            Some(Cell::Text(text)) => Ok(text.clone()),
            _ => Err(AppError::Browser("node detached".to_string())),
        }
    }

    async fn click(&mut self, element: ElementHandle) -> Result<()> {
        assert_eq!(element, ElementHandle::new(CONTINUE_HANDLE));
        self.state.lock().unwrap().clicks += 1;
        Ok(())
    }

    async fn refresh(&mut self) -> Result<()> {
        self.state.lock().unwrap().refreshes += 1;
        Ok(())
    }

    async fn quit(&mut self) -> Result<()> {
        self.state.lock().unwrap().quits += 1;
        Ok(())
    }
}

/// Records every message body it is handed.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub sent: Arc<Mutex<Vec<String>>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn bodies(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotifierPlugin for RecordingNotifier {
    fn name(&self) -> &str {
        "Recording Notifier"
    }

    fn plugin_type(&self) -> &str {
        "recording"
    }

    fn description(&self) -> &str {
        "Captures alerts for assertions"
    }

    async fn notify(&self, alert: &Alert) -> Result<NotificationResult> {
        self.sent.lock().unwrap().push(alert.message_body());
        if self.fail {
            return Err(AppError::notification("recording", "channel unavailable"));
        }
        Ok(NotificationResult {
            channel: "recording".to_string(),
            message_id: Some("msg-1".to_string()),
        })
    }
}

pub fn session(driver: FakeDriver) -> Session<FakeDriver> {
    Session::new(driver, Duration::from_secs(30))
}

pub fn monitor(
    config: &AppConfig,
    driver: FakeDriver,
    notifier: RecordingNotifier,
) -> MonitorLoop<FakeDriver> {
    let pacer = RefreshPacer::new(
        config.monitor.refresh_lower_secs,
        config.monitor.refresh_upper_secs,
        Box::new(StdRng::seed_from_u64(17)),
    );
    MonitorLoop::with_pacer(config, driver, Box::new(notifier), pacer)
}
