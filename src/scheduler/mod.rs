//! Refresh scheduler: periodic and manual usage fetches, applied on a single
//! owning task.
//!
//! [`RefreshScheduler`] owns the last applied [`UsageSnapshot`] and the
//! [`OverageTracker`]. Fetches run on the blocking pool because credential
//! lookup and the HTTP client are both blocking; their completions are sent
//! back over a channel and applied one at a time by the task driving
//! [`RefreshScheduler::run`].
//!
//! A failed refresh is silent: the previous snapshot and the previously
//! rendered icon stay as they are, and the next tick retries.
//!
//! Every fetch is numbered. With `discard_stale` enabled, a completion older
//! than the last applied one is dropped, so a slow fetch can never overwrite
//! fresher data.

mod sources;

pub use sources::{ClaudeCredentials, ClaudeUsageSource, SystemClock};

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use claude_usage::CredentialError;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::detail::DetailView;
use crate::gauge::{menu_bar_icon, GaugeScene};
use crate::overage::OverageTracker;
use crate::sink::SinkError;
use crate::snapshot::UsageSnapshot;

/// Default refresh cadence.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Why a refresh cycle produced no snapshot.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// No usable bearer token.
    #[error("credentials unavailable: {0}")]
    CredentialUnavailable(#[from] CredentialError),

    /// Network, status or parse failure.
    #[error("usage fetch failed: {0}")]
    FetchFailed(String),
}

/// Supplies the bearer token for the usage API. Called on the blocking pool.
pub trait CredentialProvider: Send + Sync + 'static {
    fn bearer_token(&self) -> Result<String, CredentialError>;
}

/// Fetches and normalises one usage snapshot. Called on the blocking pool.
pub trait UsageSource: Send + Sync + 'static {
    fn fetch(&self, token: &str) -> Result<UsageSnapshot, RefreshError>;
}

/// Presentation layer fed by the scheduler.
pub trait RenderSink: Send {
    /// Replace the menu-bar icon.
    fn set_tray_image(&mut self, scene: &GaugeScene) -> Result<(), SinkError>;

    /// Replace the contents of the detail view.
    fn set_detail_view(&mut self, view: &DetailView) -> Result<(), SinkError>;

    /// Whether the detail view is currently visible and wants updates.
    fn is_detail_open(&self) -> bool;
}

/// Source of the current instant.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Where the scheduler is in its refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefreshPhase {
    /// Nothing fetched yet.
    Idle,
    /// At least one fetch is in flight.
    Fetching,
    /// No fetch in flight; the most recent non-stale completion was applied.
    Applied,
    /// No fetch in flight; the most recent non-stale completion failed and the
    /// previous state was retained.
    FetchFailed,
}

/// Scheduler tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Time between automatic refreshes.
    pub interval: Duration,
    /// Drop completions older than the last applied one.
    pub discard_stale: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            discard_stale: true,
        }
    }
}

/// Cloneable "refresh now" trigger.
#[derive(Debug, Clone)]
pub struct RefreshHandle {
    tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Request an immediate refresh.
    ///
    /// Requests made while one is already pending are coalesced.
    pub fn refresh(&self) {
        match self.tx.try_send(()) {
            Ok(()) => debug!("manual refresh requested"),
            Err(mpsc::error::TrySendError::Full(())) => {
                debug!("manual refresh already pending")
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                debug!("scheduler stopped, ignoring refresh request")
            }
        }
    }
}

struct Completion {
    seq: u64,
    result: Result<UsageSnapshot, RefreshError>,
}

/// Owns the usage state and drives fetches.
pub struct RefreshScheduler {
    credentials: Arc<dyn CredentialProvider>,
    source: Arc<dyn UsageSource>,
    clock: Arc<dyn Clock>,
    sink: Box<dyn RenderSink>,
    config: SchedulerConfig,

    snapshot: Option<UsageSnapshot>,
    overage: OverageTracker,
    phase: RefreshPhase,
    settled: RefreshPhase,
    in_flight: usize,
    next_seq: u64,
    last_applied: Option<u64>,

    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    trigger_tx: mpsc::Sender<()>,
    trigger_rx: mpsc::Receiver<()>,
}

impl RefreshScheduler {
    /// Create a scheduler around its collaborators.
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        source: Arc<dyn UsageSource>,
        clock: Arc<dyn Clock>,
        sink: Box<dyn RenderSink>,
        config: SchedulerConfig,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        Self {
            credentials,
            source,
            clock,
            sink,
            config,
            snapshot: None,
            overage: OverageTracker::new(),
            phase: RefreshPhase::Idle,
            settled: RefreshPhase::Idle,
            in_flight: 0,
            next_seq: 0,
            last_applied: None,
            completion_tx,
            completion_rx,
            trigger_tx,
            trigger_rx,
        }
    }

    /// Scheduler backed by the local Claude credentials, the live usage API
    /// and the system clock.
    pub fn with_claude(sink: Box<dyn RenderSink>, config: SchedulerConfig) -> Self {
        Self::new(
            Arc::new(ClaudeCredentials),
            Arc::new(ClaudeUsageSource),
            Arc::new(SystemClock),
            sink,
            config,
        )
    }

    /// A trigger for manual refreshes.
    pub fn handle(&self) -> RefreshHandle {
        RefreshHandle {
            tx: self.trigger_tx.clone(),
        }
    }

    /// Current phase.
    ///
    /// Stays [`RefreshPhase::Fetching`] while any fetch is outstanding, even
    /// if an overlapping one has already completed. Once the last completes,
    /// reports the outcome of the newest completion that was not discarded as
    /// stale.
    pub fn phase(&self) -> RefreshPhase {
        self.phase
    }

    /// Last applied snapshot.
    pub fn snapshot(&self) -> Option<&UsageSnapshot> {
        self.snapshot.as_ref()
    }

    /// The overage tracker.
    pub fn overage(&self) -> &OverageTracker {
        &self.overage
    }

    /// Detail view for the current state.
    pub fn detail_view(&self) -> DetailView {
        let now = self.clock.now();
        let rate = self.snapshot.as_ref().and_then(|snapshot| {
            self.overage
                .current_hourly_rate(snapshot, now.with_timezone(&Local))
        });
        DetailView::build(self.snapshot.as_ref(), rate, now)
    }

    /// Menu-bar icon for the current state.
    pub fn tray_scene(&self) -> GaugeScene {
        match &self.snapshot {
            Some(snapshot) => {
                let derived = snapshot.derive(self.clock.now());
                menu_bar_icon(Some(&derived), self.overage.current_delta(snapshot))
            }
            None => menu_bar_icon(None, 0.0),
        }
    }

    /// Run until `shutdown_rx` fires: fetch immediately, then on every tick
    /// and manual trigger.
    pub async fn run(mut self, mut shutdown_rx: broadcast::Receiver<()>) {
        // Empty tracks until the first fetch lands
        self.render();

        // tokio rejects a zero period
        let period = self.config.interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval = ?period, "refresh scheduler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.start_fetch();
                }
                Some(()) = self.trigger_rx.recv() => {
                    self.start_fetch();
                }
                Some(completion) = self.completion_rx.recv() => {
                    if let Err(e) = self.apply(completion) {
                        warn!(error = %e, "refresh failed, keeping previous snapshot");
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("refresh scheduler shutting down");
                    break;
                }
            }
        }
    }

    /// Fetch once and wait for that fetch to be applied.
    ///
    /// Completions of earlier fetches that arrive first are applied (or
    /// discarded) on the way.
    pub async fn refresh_now(&mut self) -> Result<(), RefreshError> {
        let seq = self.start_fetch();
        while let Some(completion) = self.completion_rx.recv().await {
            let ours = completion.seq == seq;
            let outcome = self.apply(completion);
            if ours {
                return outcome;
            }
            if let Err(e) = outcome {
                warn!(error = %e, "earlier refresh failed");
            }
        }
        Err(RefreshError::FetchFailed(
            "completion channel closed".to_string(),
        ))
    }

    fn start_fetch(&mut self) -> u64 {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.in_flight += 1;
        self.phase = RefreshPhase::Fetching;
        debug!(seq, in_flight = self.in_flight, "starting usage fetch");

        let credentials = Arc::clone(&self.credentials);
        let source = Arc::clone(&self.source);
        let tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || {
                let token = credentials.bearer_token()?;
                source.fetch(&token)
            })
            .await
            .unwrap_or_else(|e| Err(RefreshError::FetchFailed(format!("fetch task failed: {e}"))));
            // The receiver lives as long as the scheduler
            let _ = tx.send(Completion { seq, result });
        });
        seq
    }

    fn apply(&mut self, completion: Completion) -> Result<(), RefreshError> {
        self.in_flight = self.in_flight.saturating_sub(1);
        let outcome = self.apply_result(completion);
        self.phase = if self.in_flight > 0 {
            RefreshPhase::Fetching
        } else {
            self.settled
        };
        outcome
    }

    fn apply_result(&mut self, completion: Completion) -> Result<(), RefreshError> {
        let Completion { seq, result } = completion;

        if self.config.discard_stale && self.last_applied.is_some_and(|last| seq < last) {
            debug!(seq, last_applied = ?self.last_applied, "discarding stale completion");
            return Ok(());
        }

        match result {
            Ok(snapshot) => {
                let now = self.clock.now();
                self.overage.observe(&snapshot, now.with_timezone(&Local));
                debug!(
                    seq,
                    five_hour_pct = snapshot.five_hour_pct,
                    seven_day_pct = snapshot.seven_day_pct,
                    extra_usage_cents = snapshot.extra_usage_cents,
                    "usage snapshot applied"
                );
                self.snapshot = Some(snapshot);
                self.last_applied = Some(seq);
                self.settled = RefreshPhase::Applied;
                self.render();
                Ok(())
            }
            Err(e) => {
                self.settled = RefreshPhase::FetchFailed;
                Err(e)
            }
        }
    }

    fn render(&mut self) {
        let scene = self.tray_scene();
        if let Err(e) = self.sink.set_tray_image(&scene) {
            warn!(error = %e, "failed to update tray image");
        }
        if self.sink.is_detail_open() {
            let view = self.detail_view();
            if let Err(e) = self.sink.set_detail_view(&view) {
                warn!(error = %e, "failed to update detail view");
            }
        }
    }
}
