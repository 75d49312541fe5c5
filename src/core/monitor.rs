use std::future::Future;
use std::time::Duration;

use crate::browser::BrowserDriver;
use crate::config::AppConfig;
use crate::core::navigator::PageNavigator;
use crate::core::pacing::RefreshPacer;
use crate::core::price_parser::PriceParser;
use crate::core::scanner::PriceScanner;
use crate::core::session::Session;
use crate::models::Alert;
use crate::plugins::NotifierPlugin;
use crate::utils::error::{AppError, Fatal};

/// Why the monitor stopped.
#[derive(Debug)]
pub enum Termination {
    Fatal(Fatal),
    /// Operator asked us to stop.
    Shutdown,
    Error(AppError),
}

impl Termination {
    pub fn exit_code(&self) -> u8 {
        match self {
            Termination::Shutdown => 0,
            Termination::Fatal(_) | Termination::Error(_) => 1,
        }
    }
}

impl From<AppError> for Termination {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Fatal(fatal) => Termination::Fatal(fatal),
            other => Termination::Error(other),
        }
    }
}

#[derive(Debug)]
pub enum MonitorState {
    Starting,
    Navigating,
    Scanning,
    Notifying(Alert),
    Sleeping,
    Refreshing,
    Terminated(Termination),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub scans: u64,
    pub alerts_sent: u64,
    pub delivery_failures: u64,
}

/// Owns the browser session and runs load → scan → sleep → refresh forever,
/// until a fatal condition or shutdown.
pub struct MonitorLoop<D: BrowserDriver> {
    event_label: String,
    settle_delay: Duration,
    session: Session<D>,
    navigator: PageNavigator,
    scanner: PriceScanner,
    parser: PriceParser,
    notifier: Box<dyn NotifierPlugin>,
    pacer: RefreshPacer,
    stats: MonitorStats,
}

impl<D: BrowserDriver> MonitorLoop<D> {
    pub fn new(config: &AppConfig, driver: D, notifier: Box<dyn NotifierPlugin>) -> Self {
        let pacer = RefreshPacer::from_os_rng(
            config.monitor.refresh_lower_secs,
            config.monitor.refresh_upper_secs,
        );
        Self::with_pacer(config, driver, notifier, pacer)
    }

    pub fn with_pacer(
        config: &AppConfig,
        driver: D,
        notifier: Box<dyn NotifierPlugin>,
        pacer: RefreshPacer,
    ) -> Self {
        let monitor = &config.monitor;
        Self {
            event_label: monitor.event_label.clone(),
            settle_delay: monitor.settle_delay(),
            session: Session::new(driver, monitor.default_wait()),
            navigator: PageNavigator::new(monitor, &config.selectors),
            scanner: PriceScanner::new(&config.selectors),
            parser: PriceParser::new(monitor.price_threshold),
            notifier,
            pacer,
            stats: MonitorStats::default(),
        }
    }

    pub fn stats(&self) -> &MonitorStats {
        &self.stats
    }

    pub fn session(&self) -> &Session<D> {
        &self.session
    }

    /// Run until a fatal condition. The session is closed before returning.
    pub async fn run(&mut self) -> Termination {
        self.run_until(std::future::pending()).await
    }

    /// Run until a fatal condition or until `shutdown` resolves, whichever is
    /// first. The session is closed before returning either way.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Termination
    where
        F: Future<Output = ()>,
    {
        let termination = tokio::select! {
            termination = self.drive() => termination,
            _ = shutdown => {
                tracing::info!("Shutdown requested");
                Termination::Shutdown
            }
        };

        self.session.close().await;
        tracing::info!(
            scans = self.stats.scans,
            alerts_sent = self.stats.alerts_sent,
            delivery_failures = self.stats.delivery_failures,
            "Monitor stopped"
        );
        termination
    }

    async fn drive(&mut self) -> Termination {
        let mut state = MonitorState::Starting;
        loop {
            state = match state {
                MonitorState::Terminated(termination) => return termination,
                other => self.step(other).await,
            };
        }
    }

    /// Perform one transition.
    pub async fn step(&mut self, state: MonitorState) -> MonitorState {
        match state {
            MonitorState::Starting => {
                tracing::info!(event = %self.event_label, "Starting monitor");
                MonitorState::Navigating
            }
            MonitorState::Navigating => {
                match self.navigator.acquire_ready_page(&mut self.session).await {
                    Ok(()) => {
                        tracing::info!("Event page ready");
                        MonitorState::Scanning
                    }
                    Err(e) => terminate(e),
                }
            }
            MonitorState::Scanning => match self.scanner.scan(&mut self.session).await {
                Ok(listings) => {
                    self.stats.scans += 1;
                    let qualifying = self.parser.parse(&listings);
                    match Alert::new(self.event_label.clone(), qualifying) {
                        Some(alert) => {
                            tracing::info!(
                                prices = ?alert.prices,
                                lowest = alert.lowest().map(|p| p.value()),
                                "Tickets matching your criteria"
                            );
                            MonitorState::Notifying(alert)
                        }
                        None => {
                            tracing::info!(listings = listings.len(), "No qualifying tickets this pass");
                            MonitorState::Sleeping
                        }
                    }
                }
                Err(e) => terminate(e),
            },
            MonitorState::Notifying(alert) => {
                match self.notifier.notify(&alert).await {
                    Ok(result) => {
                        self.stats.alerts_sent += 1;
                        tracing::info!(
                            channel = %result.channel,
                            message_id = ?result.message_id,
                            detected_at = %alert.detected_at,
                            "Alert delivered"
                        );
                    }
                    Err(e) => {
                        self.stats.delivery_failures += 1;
                        tracing::error!(
                            detected_at = %alert.detected_at,
                            "Alert delivery failed, will retry next pass: {}",
                            e
                        );
                    }
                }
                MonitorState::Sleeping
            }
            MonitorState::Sleeping => {
                let delay = self.pacer.next_delay();
                tracing::info!("Sleeping for {} second(s)", delay.as_secs());
                tokio::time::sleep(delay).await;
                MonitorState::Refreshing
            }
            MonitorState::Refreshing => {
                tracing::info!("Refreshing current page");
                if let Err(e) = self.session.driver().refresh().await {
                    return terminate(e);
                }
                tokio::time::sleep(self.settle_delay).await;

                // A reload brings the interstitial back; one try only here.
                match self.navigator.dismiss_interstitial(&mut self.session).await {
                    Ok(true) => MonitorState::Scanning,
                    Ok(false) => terminate(Fatal::RefreshInterstitialFailed.into()),
                    Err(e) => terminate(e),
                }
            }
            MonitorState::Terminated(termination) => MonitorState::Terminated(termination),
        }
    }
}

fn terminate(err: AppError) -> MonitorState {
    match &err {
        AppError::Fatal(fatal) => tracing::error!("{}. Exiting...", fatal),
        other => tracing::error!("Unrecoverable error: {}. Exiting...", other),
    }
    MonitorState::Terminated(err.into())
}
