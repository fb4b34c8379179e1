//! Default configuration template and file creation utilities.
//!
//! Provides a commented TOML template that matches `Config::default()` and
//! a function to write it to the XDG config path.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::error::ConfigError;
use crate::config::xdg;

// ---------------------------------------------------------------------------
// Default TOML template
// ---------------------------------------------------------------------------

/// A commented TOML template with all default values.
///
/// Every value here must match `Config::default()` from `schema.rs`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# pacebar configuration
#
# All values shown below are the built-in defaults.
#
# Location: $XDG_CONFIG_HOME/pacebar/config.toml

# ==============================================================================
# Refresh
# ==============================================================================

[refresh]

# Time between automatic usage fetches. A refresh can also be forced at any
# time by sending SIGUSR1 to the running process.
# Examples: "60s", "2m", "1m 30s" (minimum "1s")
interval = "60s"

# Ignore a fetch result that arrives after a newer one was already applied.
# Disable to apply results strictly in completion order.
discard_stale = true

# ==============================================================================
# Output
# ==============================================================================

[output]

# Menu-bar icon PNG, rewritten after every successful refresh.
# Empty means $XDG_RUNTIME_DIR/pacebar/icon.png (or /tmp/pacebar/icon.png).
icon_path = ""

# Directory for the detail view: 5h.png, 7d.png and detail.txt.
# Empty disables detail output.
popover_dir = ""

# Device pixels per point. 2.0 suits Retina displays.
scale = 2.0

# Menu bar appearance: "dark" or "light".
theme = "dark"

# ==============================================================================
# Logging
# ==============================================================================

[log]

# Verbosity when PACEBAR_LOG is unset.
# Options: "error", "warn", "info", "debug", "trace"
level = "info"

# Path to log file. Empty string means log to stderr.
file = ""
"#;

// ---------------------------------------------------------------------------
// File creation
// ---------------------------------------------------------------------------

/// Creates (or force-overwrites) the default config file.
///
/// - If the file exists and `force` is `false`, returns `ConfigError::AlreadyExists`.
/// - If the file exists and `force` is `true`, backs it up to `.toml.backup` first.
/// - Returns the path where the config was written.
pub fn create_default_config(force: bool) -> Result<PathBuf, ConfigError> {
    let path = xdg::config_path();

    if path.exists() {
        if !force {
            return Err(ConfigError::AlreadyExists { path });
        }
        let backup_path = path.with_extension("toml.backup");
        fs::rename(&path, &backup_path).map_err(|e| ConfigError::WriteError {
            path: backup_path.clone(),
            source: e,
        })?;
        tracing::info!("Backed up existing config to {}", backup_path.display());
    }

    write_default_config(&path)?;
    Ok(path)
}

/// Writes the default template to `path`, creating parent dirs and setting 0600 permissions.
fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let write_error = |source| ConfigError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    xdg::ensure_config_dir().map_err(write_error)?;
    fs::write(path, DEFAULT_CONFIG_TEMPLATE).map_err(write_error)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(write_error)?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
