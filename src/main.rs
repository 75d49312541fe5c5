use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use ticket_watcher::browser::ChromeDriver;
use ticket_watcher::config::{LoggingConfig, NotificationChannel};
use ticket_watcher::core::{MonitorLoop, Termination};
use ticket_watcher::plugins::build_notifier;
use ticket_watcher::AppConfig;

const DEFAULT_LOG_DIRECTIVE: &str = "ticket_watcher=info";

/// Watch a resale ticket page and alert when a listing drops under your price.
#[derive(Debug, Parser)]
#[command(name = "ticket-watcher", version, about)]
struct Cli {
    /// Read configuration from this file instead of config/default, config/{RUN_MODE}, config/local
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scan and log matches without sending notifications
    #[arg(long)]
    no_notify: bool,

    /// Show the browser window
    #[arg(long)]
    headful: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::read(cli.config.as_deref()).context("Failed to load configuration")?;
    if cli.no_notify {
        config.notifications.channel = NotificationChannel::None;
    }
    if cli.headful {
        config.browser.headless = false;
    }
    config.validate().context("Invalid configuration")?;

    let _guard = init_tracing(&config.logging)?;

    info!(
        event = %config.monitor.event_label,
        threshold = ?config.monitor.price_threshold,
        "Starting Ticket Watcher..."
    );

    let notifier = build_notifier(&config.notifications, cli.no_notify)?;
    let driver = ChromeDriver::launch(&config.browser)?;

    let mut monitor = MonitorLoop::new(&config, driver, notifier);
    let termination = monitor.run_until(shutdown_signal()).await;

    match &termination {
        Termination::Shutdown => info!("Shutting down..."),
        Termination::Fatal(fatal) => error!("Monitor terminated: {}", fatal),
        Termination::Error(e) => error!("Monitor failed: {}", e),
    }

    Ok(ExitCode::from(termination.exit_code()))
}

fn init_tracing(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let env_filter = log_filter(rust_log.as_deref());

    let (file_layer, guard) = match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "ticket-watcher.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

/// `RUST_LOG` when set and valid, otherwise info for this crate.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVE))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
