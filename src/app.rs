//! Process-level entry points behind the CLI subcommands.
//!
//! `run` drives the scheduler until SIGINT/SIGTERM, `once` performs a single
//! refresh, and `preview` renders a hand-built snapshot without touching the
//! network.

use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::runtime::Runtime;
use tokio::signal;
use tokio::signal::unix::{signal as unix_signal, SignalKind};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::config::{Config, ConfigError};
use crate::detail::DetailView;
use crate::gauge::menu_bar_icon;
use crate::scheduler::{RefreshError, RefreshHandle, RefreshScheduler, RenderSink};
use crate::sink::{FileSink, SinkError};
use crate::snapshot::UsageSnapshot;

/// Errors surfaced to the CLI.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Refresh(#[from] RefreshError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Failed to serialize detail view: {0}")]
    Json(#[from] serde_json::Error),
}

fn runtime() -> Result<Runtime, AppError> {
    Runtime::new().map_err(AppError::Runtime)
}

/// Refresh on a timer, writing the icon after every successful fetch, until
/// SIGINT or SIGTERM. SIGUSR1 forces an immediate refresh.
pub fn run(config: &Config) -> Result<(), AppError> {
    let scheduler_config = config.scheduler_config()?;
    let sink = FileSink::from_config(&config.output);
    info!(icon = %sink.icon_path().display(), "writing menu-bar icon");

    let rt = runtime()?;
    rt.block_on(async move {
        let scheduler = RefreshScheduler::with_claude(Box::new(sink), scheduler_config);
        let handle = scheduler.handle();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let scheduler_task = tokio::spawn(scheduler.run(shutdown_rx));
        let refresh_signal = tokio::spawn(forward_refresh_signal(handle));

        wait_for_shutdown().await;
        // Nobody listening means the scheduler already stopped
        let _ = shutdown_tx.send(());
        refresh_signal.abort();
        if let Err(e) = scheduler_task.await {
            error!(error = %e, "scheduler task ended abnormally");
        }
    });
    Ok(())
}

/// Fetch once, write the icon (and detail files when configured), and return
/// the detail view.
pub fn once(config: &Config) -> Result<DetailView, AppError> {
    let scheduler_config = config.scheduler_config()?;
    let sink = FileSink::from_config(&config.output);

    let rt = runtime()?;
    rt.block_on(async move {
        let mut scheduler = RefreshScheduler::with_claude(Box::new(sink), scheduler_config);
        scheduler.refresh_now().await?;
        Ok(scheduler.detail_view())
    })
}

/// Hand-built usage for `preview`.
#[derive(Debug, Clone, Default)]
pub struct PreviewInput {
    pub five_hour_pct: f64,
    pub seven_day_pct: f64,
    /// Time until the 5-hour window resets.
    pub five_hour_reset: Option<Duration>,
    /// Time until the 7-day window resets.
    pub seven_day_reset: Option<Duration>,
    /// Cumulative overage in cents.
    pub extra_usage_cents: f64,
    /// Overage since the daily baseline shown next to a full gauge.
    pub overage_delta_cents: f64,
}

/// Render `input` through `sink` without any network access.
pub fn preview(input: &PreviewInput, sink: &mut dyn RenderSink) -> Result<DetailView, AppError> {
    let now = Utc::now();
    let after = |d: Duration| {
        chrono::Duration::from_std(d)
            .ok()
            .and_then(|d| now.checked_add_signed(d))
    };
    let snapshot = UsageSnapshot {
        five_hour_pct: input.five_hour_pct.round(),
        seven_day_pct: input.seven_day_pct.round(),
        resets_at: input.five_hour_reset.and_then(after),
        seven_day_resets_at: input.seven_day_reset.and_then(after),
        extra_usage_cents: input.extra_usage_cents,
    };

    let derived = snapshot.derive(now);
    sink.set_tray_image(&menu_bar_icon(Some(&derived), input.overage_delta_cents))?;
    let view = DetailView::build(Some(&snapshot), None, now);
    if sink.is_detail_open() {
        sink.set_detail_view(&view)?;
    }
    Ok(view)
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
///
/// If SIGTERM handler registration fails, falls back to SIGINT only.
async fn wait_for_shutdown() {
    match unix_signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("received SIGINT (Ctrl+C), shutting down");
                },
                _ = sigterm.recv() => {
                    info!("received SIGTERM, shutting down");
                },
            }
        }
        Err(e) => {
            warn!(error = %e, "could not register SIGTERM handler, using SIGINT only");
            if let Err(e) = signal::ctrl_c().await {
                error!(error = %e, "failed waiting for SIGINT");
            } else {
                info!("received SIGINT (Ctrl+C), shutting down");
            }
        }
    }
}

/// Turn every SIGUSR1 into a manual refresh.
async fn forward_refresh_signal(handle: RefreshHandle) {
    let mut sigusr1 = match unix_signal(SignalKind::user_defined1()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "could not register SIGUSR1 handler, manual refresh disabled");
            return;
        }
    };
    while sigusr1.recv().await.is_some() {
        info!("received SIGUSR1, refreshing");
        handle.refresh();
    }
}
