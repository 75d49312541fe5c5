use async_trait::async_trait;
use headless_chrome::browser::tab::NoElementFound;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

use crate::config::BrowserConfig;
use crate::utils::error::{AppError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

const IS_VISIBLE_JS: &str = r#"
function() {
    const rect = this.getBoundingClientRect();
    const style = window.getComputedStyle(this);
    return rect.width > 0 && rect.height > 0
        && style.visibility !== 'hidden' && style.display !== 'none';
}
"#;

const CLICK_JS: &str = "function() { this.click(); }";

const MATCH_ATTRIBUTE: &str = "data-ticket-watcher-match";

const MARK_XPATH_MATCHES_JS: &str = r#"
function(query, mark) {
    const found = document.evaluate(
        query, this, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
    for (let i = 0; i < found.snapshotLength; i++) {
        const node = found.snapshotItem(i);
        if (node.nodeType === Node.ELEMENT_NODE) {
            node.setAttribute('data-ticket-watcher-match', mark);
        }
    }
    return found.snapshotLength;
}
"#;

/// How to find an element on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locator {
    XPath(String),
    Css(String),
}

impl Locator {
    /// Selector strings are XPath unless prefixed with `css:`.
    pub fn parse(selector: &str) -> Self {
        if let Some(css) = selector.strip_prefix("css:") {
            Locator::Css(css.trim().to_string())
        } else if let Some(xpath) = selector.strip_prefix("xpath:") {
            Locator::XPath(xpath.trim().to_string())
        } else {
            Locator::XPath(selector.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Locator::XPath(s) | Locator::Css(s) => s,
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::XPath(s) => write!(f, "xpath:{}", s),
            Locator::Css(s) => write!(f, "css:{}", s),
        }
    }
}

/// Opaque reference to a node the driver has located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(u64);

impl ElementHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// The browser-automation collaborator.
///
/// Every wait takes an explicit timeout; a timed-out wait is `Ok(false)` /
/// `Ok(None)`, while `Err` is reserved for driver failures.
#[async_trait]
pub trait BrowserDriver: Send {
    async fn navigate(&mut self, url: &str) -> Result<()>;

    async fn wait_until_url_equals(&mut self, url: &str, timeout: Duration) -> Result<bool>;

    async fn wait_until_visible(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<ElementHandle>>;

    async fn find_all(
        &mut self,
        locator: &Locator,
        scope: Option<ElementHandle>,
    ) -> Result<Vec<ElementHandle>>;

    async fn find(
        &mut self,
        locator: &Locator,
        scope: Option<ElementHandle>,
    ) -> Result<Option<ElementHandle>>;

    async fn text(&mut self, element: ElementHandle) -> Result<String>;

    /// Script-dispatched click; overlays can swallow a synthetic mouse event.
    async fn click(&mut self, element: ElementHandle) -> Result<()>;

    async fn refresh(&mut self) -> Result<()>;

    async fn quit(&mut self) -> Result<()>;
}

/// `BrowserDriver` over a single headless_chrome tab.
///
/// Node ids handed out as `ElementHandle`s stay valid until the next
/// document-level lookup, which is how the navigator and scanner use them:
/// one unscoped lookup, then scoped lookups beneath it.
pub struct ChromeDriver {
    browser: Option<Browser>,
    tab: Arc<Tab>,
    next_mark: AtomicU64,
}

impl ChromeDriver {
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(false) // Often needed in containerized environments
            .window_size(config.window_size)
            .idle_browser_timeout(Duration::from_secs(24 * 60 * 60))
            .args(vec![
                std::ffi::OsStr::new("--no-sandbox"),
                std::ffi::OsStr::new("--disable-dev-shm-usage"),
                std::ffi::OsStr::new("--disable-gpu"),
                std::ffi::OsStr::new("--disable-extensions"),
                std::ffi::OsStr::new("--disable-background-timer-throttling"),
                std::ffi::OsStr::new("--disable-backgrounding-occluded-windows"),
                std::ffi::OsStr::new("--disable-renderer-backgrounding"),
            ])
            .build()
            .map_err(|e| AppError::browser("Failed to create launch options", e))?;

        if let Some(chrome_path) = &config.chrome_path {
            launch_options.path = Some(std::path::PathBuf::from(chrome_path));
        }

        let browser =
            Browser::new(launch_options).map_err(|e| AppError::browser("Failed to launch browser", e))?;

        let tab = browser
            .new_tab()
            .map_err(|e| AppError::browser("Failed to create tab", e))?;

        if let Some(user_agent) = &config.user_agent {
            tab.set_user_agent(user_agent, None, None)
                .map_err(|e| AppError::browser("Failed to set user agent", e))?;
        }

        tracing::info!(headless = config.headless, "Browser launched");

        Ok(Self {
            browser: Some(browser),
            tab,
            next_mark: AtomicU64::new(0),
        })
    }

    fn element(&self, handle: ElementHandle) -> anyhow::Result<Element<'_>> {
        let node_id = u32::try_from(handle.id())
            .map_err(|_| anyhow::anyhow!("Invalid node id {}", handle.id()))?;
        Element::new(&self.tab, node_id)
    }

    /// Evaluates `query` relative to `parent` and returns the element
    /// results in document order.
    ///
    /// headless_chrome's element-level XPath search runs against the whole
    /// document, so matches are tagged in the page and collected again with a
    /// scoped CSS query. Only descendants of `parent` are returned.
    fn scoped_xpath(&self, parent: &Element<'_>, query: &str) -> anyhow::Result<Vec<ElementHandle>> {
        let mark = format!("m{}", self.next_mark.fetch_add(1, Ordering::Relaxed));
        parent.call_js_fn(MARK_XPATH_MATCHES_JS, vec![json!(query), json!(mark)], false)?;
        Ok(handles(&parent.find_elements(&mark_selector(&mark))?))
    }

    fn locate_all(&self, locator: &Locator, scope: Option<ElementHandle>) -> Result<Vec<ElementHandle>> {
        let found = match scope {
            Some(scope) => self.element(scope).and_then(|parent| match locator {
                Locator::XPath(q) => self.scoped_xpath(&parent, q),
                Locator::Css(q) => parent.find_elements(q).map(|found| handles(&found)),
            }),
            None => match locator {
                Locator::XPath(q) => self.tab.find_elements_by_xpath(q).map(|found| handles(&found)),
                Locator::Css(q) => self.tab.find_elements(q).map(|found| handles(&found)),
            },
        };

        absent_if_not_found(found, "Element lookup failed")
    }

    fn locate_one(&self, locator: &Locator, scope: Option<ElementHandle>) -> Result<Option<ElementHandle>> {
        if scope.is_some() {
            return Ok(self.locate_all(locator, scope)?.into_iter().next());
        }

        let found = match locator {
            Locator::XPath(q) => self.tab.find_element_by_xpath(q),
            Locator::Css(q) => self.tab.find_element(q),
        }
        .map(|el| Some(handle(&el)));

        absent_if_not_found(found, "Element lookup failed")
    }

    fn is_visible(&self, handle: ElementHandle) -> bool {
        self.element(handle)
            .and_then(|el| el.call_js_fn(IS_VISIBLE_JS, vec![], false))
            .map(|obj| obj.value == Some(serde_json::Value::Bool(true)))
            .unwrap_or(false)
    }

    fn locate_visible(&self, locator: &Locator) -> Result<Option<ElementHandle>> {
        Ok(self
            .locate_one(locator, None)?
            .filter(|handle| self.is_visible(*handle)))
    }
}

fn handle(element: &Element<'_>) -> ElementHandle {
    ElementHandle::new(u64::from(element.node_id))
}

fn handles(elements: &[Element<'_>]) -> Vec<ElementHandle> {
    elements.iter().map(handle).collect()
}

fn mark_selector(mark: &str) -> String {
    format!("[{}=\"{}\"]", MATCH_ATTRIBUTE, mark)
}

/// headless_chrome reports "no match" (and nodes detached mid-reload) as
/// `NoElementFound`.
fn is_no_match(err: &anyhow::Error) -> bool {
    err.downcast_ref::<NoElementFound>().is_some()
}

/// Maps "no match" to an empty result; any other failure is a driver error.
fn absent_if_not_found<T: Default>(found: anyhow::Result<T>, context: &str) -> Result<T> {
    match found {
        Ok(value) => Ok(value),
        Err(e) if is_no_match(&e) => Ok(T::default()),
        Err(e) => Err(AppError::browser(context, e)),
    }
}

#[async_trait]
impl BrowserDriver for ChromeDriver {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        tokio::task::block_in_place(|| self.tab.navigate_to(url).map(|_| ()))
            .map_err(|e| AppError::browser("Navigation failed", e))
    }

    async fn wait_until_url_equals(&mut self, url: &str, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if tokio::task::block_in_place(|| self.tab.get_url()) == url {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Lookup failures while the page settles are retried until the deadline;
    /// if the final poll still fails, that error is returned instead of a
    /// timeout.
    async fn wait_until_visible(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<ElementHandle>> {
        let deadline = Instant::now() + timeout;
        loop {
            let last_error = match tokio::task::block_in_place(|| self.locate_visible(locator)) {
                Ok(Some(handle)) => return Ok(Some(handle)),
                Ok(None) => None,
                Err(e) => {
                    tracing::debug!(selector = %locator, "Lookup failed while waiting: {}", e);
                    Some(e)
                }
            };
            if Instant::now() >= deadline {
                return match last_error {
                    Some(e) => Err(e),
                    None => Ok(None),
                };
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn find_all(
        &mut self,
        locator: &Locator,
        scope: Option<ElementHandle>,
    ) -> Result<Vec<ElementHandle>> {
        tokio::task::block_in_place(|| self.locate_all(locator, scope))
    }

    async fn find(
        &mut self,
        locator: &Locator,
        scope: Option<ElementHandle>,
    ) -> Result<Option<ElementHandle>> {
        tokio::task::block_in_place(|| self.locate_one(locator, scope))
    }

    async fn text(&mut self, element: ElementHandle) -> Result<String> {
        tokio::task::block_in_place(|| {
            self.element(element)
                .and_then(|el| el.get_inner_text())
                .map_err(|e| AppError::browser("Failed to read element text", e))
        })
    }

    async fn click(&mut self, element: ElementHandle) -> Result<()> {
        tokio::task::block_in_place(|| {
            self.element(element)
                .and_then(|el| el.call_js_fn(CLICK_JS, vec![], false))
                .map(|_| ())
                .map_err(|e| AppError::browser("Click failed", e))
        })
    }

    async fn refresh(&mut self) -> Result<()> {
        tokio::task::block_in_place(|| self.tab.reload(false, None).map(|_| ()))
            .map_err(|e| AppError::browser("Refresh failed", e))
    }

    async fn quit(&mut self) -> Result<()> {
        if let Some(browser) = self.browser.take() {
            if let Err(e) = tokio::task::block_in_place(|| self.tab.close(true)) {
                tracing::warn!("Failed to close tab: {}", e);
            }
            // Dropping the browser kills the Chrome process
            drop(browser);
            tracing::info!("Browser closed");
        }
        Ok(())
    }
}
