//! TOML configuration schema types for pacebar.
//!
//! All structs derive `Deserialize` and `Serialize` with defaults via
//! `#[serde(default)]`, so an empty file (or no file) is a valid config.
//!
//! Duration fields use human-readable strings (e.g. `"60s"`, `"2m"`) parsed
//! by the `humantime` crate in [`Config::scheduler_config`].

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::config::xdg;
use crate::gauge::raster::{is_valid_scale, Theme, MAX_SCALE};
use crate::scheduler::SchedulerConfig;

/// Shortest accepted refresh interval.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration encompassing all sections.
///
/// ```toml
/// [refresh]
/// [output]
/// [log]
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Fetch cadence and sequencing.
    pub refresh: RefreshConfig,
    /// Where and how rendered images are written.
    pub output: OutputConfig,
    /// Logging settings.
    pub log: LogConfig,
}

impl Config {
    /// Check every value that TOML typing alone cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scheduler_config()?;
        let scale = self.output.scale;
        if !is_valid_scale(scale) {
            return Err(ConfigError::InvalidValue {
                key: "output.scale",
                value: scale.to_string(),
                message: format!("must be greater than 0 and at most {MAX_SCALE}"),
            });
        }
        Ok(())
    }

    /// Scheduler settings with the interval parsed.
    pub fn scheduler_config(&self) -> Result<SchedulerConfig, ConfigError> {
        let raw = self.refresh.interval.trim();
        let interval =
            humantime::parse_duration(raw).map_err(|e| ConfigError::InvalidValue {
                key: "refresh.interval",
                value: raw.to_string(),
                message: e.to_string(),
            })?;
        if interval < MIN_REFRESH_INTERVAL {
            return Err(ConfigError::InvalidValue {
                key: "refresh.interval",
                value: raw.to_string(),
                message: "must be at least 1s".to_string(),
            });
        }
        Ok(SchedulerConfig {
            interval,
            discard_stale: self.refresh.discard_stale,
        })
    }
}

// ---------------------------------------------------------------------------
// Refresh
// ---------------------------------------------------------------------------

/// `[refresh]` section.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RefreshConfig {
    /// Time between automatic refreshes, e.g. `"60s"`.
    pub interval: String,
    /// Drop fetch results older than the last applied one.
    pub discard_stale: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: "60s".to_string(),
            discard_stale: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// `[output]` section.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Menu-bar icon PNG. Empty means `<runtime dir>/pacebar/icon.png`.
    pub icon_path: String,
    /// Directory for the detail view (popover gauges and text). Empty
    /// disables detail output.
    pub popover_dir: String,
    /// Device pixels per point.
    pub scale: f64,
    /// Menu bar appearance.
    pub theme: Theme,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            icon_path: String::new(),
            popover_dir: String::new(),
            scale: 2.0,
            theme: Theme::Dark,
        }
    }
}

impl OutputConfig {
    /// Resolved icon path.
    pub fn icon_path(&self) -> PathBuf {
        xdg::user_path(&self.icon_path).unwrap_or_else(xdg::default_icon_path)
    }

    /// Resolved popover directory, if enabled.
    pub fn popover_dir(&self) -> Option<PathBuf> {
        xdg::user_path(&self.popover_dir)
    }
}

// ---------------------------------------------------------------------------
// Log
// ---------------------------------------------------------------------------

/// `[log]` section.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// Verbosity when `PACEBAR_LOG` is unset.
    pub level: LogLevel,
    /// Path to log file. Empty string means stderr.
    pub file: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: String::new(),
        }
    }
}

impl LogConfig {
    /// Resolved log file, if any.
    pub fn file(&self) -> Option<PathBuf> {
        xdg::user_path(&self.file)
    }
}

/// Log verbosity levels (kebab-case in TOML).
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LogLevel {
    /// Only errors.
    Error,
    /// Errors and warnings.
    Warn,
    /// Informational messages (default).
    Info,
    /// Debug-level detail.
    Debug,
    /// Full trace output.
    Trace,
}

impl LogLevel {
    /// The `EnvFilter` directive for this level.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_config_all_fields() {
        let toml_str = r#"
[refresh]
interval = "2m"
discard_stale = false

[output]
icon_path = "/tmp/pacebar/icon.png"
popover_dir = "/tmp/pacebar/popover"
scale = 1.0
theme = "light"

[log]
level = "debug"
file = "/var/log/pacebar.log"
"#;
        let config: Config = toml::from_str(toml_str).expect("valid TOML should parse");
        assert_eq!(config.refresh.interval, "2m");
        assert!(!config.refresh.discard_stale);
        assert_eq!(config.output.theme, Theme::Light);
        assert_eq!(config.output.scale, 1.0);
        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(
            config.log.file(),
            Some(PathBuf::from("/var/log/pacebar.log"))
        );
    }

    #[test]
    fn parse_empty_string_uses_all_defaults() {
        let config: Config = toml::from_str("").expect("empty string should parse");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn parse_unknown_fields_are_ignored() {
        let config: Config =
            toml::from_str("[refresh]\njitter = true\n").expect("unknown keys are ignored");
        assert_eq!(config.refresh, RefreshConfig::default());
    }

    #[test]
    fn default_scheduler_config_is_60s_with_guard() {
        let scheduler = Config::default()
            .scheduler_config()
            .expect("defaults are valid");
        assert_eq!(scheduler.interval, Duration::from_secs(60));
        assert!(scheduler.discard_stale);
    }

    #[test]
    fn humantime_intervals_are_accepted() {
        let mut config = Config::default();
        config.refresh.interval = "1m 30s".to_string();
        let scheduler = config.scheduler_config().expect("valid");
        assert_eq!(scheduler.interval, Duration::from_secs(90));
    }

    #[test]
    fn malformed_interval_is_rejected() {
        let mut config = Config::default();
        config.refresh.interval = "soon".to_string();
        match config.validate() {
            Err(ConfigError::InvalidValue { key, value, .. }) => {
                assert_eq!(key, "refresh.interval");
                assert_eq!(value, "soon");
            }
            other => panic!("expected InvalidValue, got: {other:?}"),
        }
    }

    #[test]
    fn sub_second_interval_is_rejected() {
        let mut config = Config::default();
        config.refresh.interval = "250ms".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                key: "refresh.interval",
                ..
            })
        ));
    }

    #[test]
    fn scale_out_of_range_is_rejected() {
        for scale in [0.0, -1.0, 9.0, f64::NAN] {
            let mut config = Config::default();
            config.output.scale = scale;
            assert!(
                matches!(
                    config.validate(),
                    Err(ConfigError::InvalidValue {
                        key: "output.scale",
                        ..
                    })
                ),
                "scale {scale} should be rejected"
            );
        }
    }

    #[test]
    fn invalid_theme_returns_error() {
        let result: Result<Config, _> = toml::from_str("[output]\ntheme = \"sepia\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn log_level_all_variants() {
        let cases = [
            ("error", LogLevel::Error),
            ("warn", LogLevel::Warn),
            ("info", LogLevel::Info),
            ("debug", LogLevel::Debug),
            ("trace", LogLevel::Trace),
        ];
        for (input, expected) in cases {
            let toml_str = format!("[log]\nlevel = \"{input}\"\n");
            let config: Config = toml::from_str(&toml_str).expect("should parse");
            assert_eq!(config.log.level, expected);
            assert_eq!(expected.as_directive(), input);
        }
    }

    #[test]
    fn empty_paths_resolve_to_defaults() {
        let output = OutputConfig::default();
        assert!(output.icon_path().ends_with("pacebar/icon.png"));
        assert_eq!(output.popover_dir(), None);
        assert_eq!(LogConfig::default().file(), None);
    }

    #[test]
    fn roundtrip_serialize_deserialize() {
        let config = Config::default();
        let serialized = toml::to_string(&config).expect("serialize");
        let parsed: Config = toml::from_str(&serialized).expect("deserialize");
        assert_eq!(parsed, config);
    }
}
