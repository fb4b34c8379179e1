//! pacebar: menu-bar pace gauges for Claude usage windows.
//!
//! Polls the Claude usage endpoint, compares how much of each rolling window
//! (5 hours, 7 days) has been used against how much of it has elapsed, and
//! renders two circular gauges plus the overage spent today.
//!
//! Data flows one way:
//!
//! ```text
//! scheduler -> UsageSnapshot -> {pacing, overage} -> gauge scene -> raster -> sink
//!                                                 \-> detail view -------------/
//! ```
//!
//! # Platform Support
//!
//! Unix-like systems only (Linux, macOS): signals drive shutdown and manual
//! refresh.

pub mod app;
pub mod config;
pub mod detail;
pub mod gauge;
pub mod logging;
pub mod overage;
pub mod pacing;
pub mod scheduler;
pub mod sink;
pub mod snapshot;

pub use detail::DetailView;
pub use gauge::{menu_bar_icon, GaugeScene};
pub use overage::OverageTracker;
pub use pacing::{drift_pct, elapsed_pct, Window};
pub use scheduler::{RefreshHandle, RefreshPhase, RefreshScheduler};
pub use snapshot::{DerivedUsage, UsageSnapshot};
