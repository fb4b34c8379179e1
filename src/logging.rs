//! Logging initialization.
//!
//! Configures the `tracing` subscriber with level filtering via the
//! `PACEBAR_LOG` environment variable, falling back to the configured
//! `[log] level`. Output goes to the configured log file, or stderr.
//!
//! ```bash
//! PACEBAR_LOG=debug pacebar run
//! PACEBAR_LOG=pacebar=trace,warn pacebar once
//! ```

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::schema::LogConfig;

/// Environment variable holding filter directives.
pub const LOG_ENV: &str = "PACEBAR_LOG";

/// Errors from [`init`].
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log file could not be opened for appending.
    #[error("Failed to open log file {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A global subscriber is already installed.
    #[error("Failed to install log subscriber: {0}")]
    Install(String),
}

/// Build the filter: `PACEBAR_LOG` when set and valid, otherwise `config.level`.
pub fn filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(config.level.as_directive()))
}

/// Initialize the global tracing subscriber. Call once at startup.
pub fn init(config: &LogConfig) -> Result<(), LoggingError> {
    let filter = filter(config);

    match config.file() {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|source| LoggingError::Open {
                    path: path.clone(),
                    source,
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|source| LoggingError::Open {
                    path: path.clone(),
                    source,
                })?;
            fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| LoggingError::Install(e.to_string()))
        }
        None => fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| LoggingError::Install(e.to_string())),
    }
}
