//! Where pacebar reads its configuration and writes its icon.
//!
//! `$XDG_CONFIG_HOME` and `$XDG_RUNTIME_DIR` win on every platform. Without
//! them the config lives in `~/.config/pacebar` (Linux) or
//! `~/Library/Application Support/pacebar` (macOS), and the icon goes to the
//! system temp directory.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::PathBuf;

const APP_NAME: &str = "pacebar";

/// Directory holding `config.toml`.
pub fn config_dir() -> PathBuf {
    config_dir_from(env::var_os("XDG_CONFIG_HOME"))
}

/// Path to the configuration file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Where the icon goes when `output.icon_path` is blank.
pub fn default_icon_path() -> PathBuf {
    runtime_base_from(env::var_os("XDG_RUNTIME_DIR"))
        .join(APP_NAME)
        .join("icon.png")
}

/// A path from the config file: trimmed, leading `~` expanded, `None` if blank.
pub fn user_path(raw: &str) -> Option<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let path = match (raw.strip_prefix('~'), dirs::home_dir()) {
        (Some(""), Some(home)) => home,
        (Some(rest), Some(home)) if rest.starts_with('/') => home.join(&rest[1..]),
        _ => PathBuf::from(raw),
    };
    Some(path)
}

/// Create the configuration directory, owner-only on Unix.
pub fn ensure_config_dir() -> io::Result<PathBuf> {
    let dir = config_dir();
    fs::create_dir_all(&dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o700))?;
    }
    Ok(dir)
}

fn config_dir_from(xdg: Option<OsString>) -> PathBuf {
    non_empty(xdg)
        .or_else(platform_config_base)
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join(APP_NAME)
}

fn runtime_base_from(xdg: Option<OsString>) -> PathBuf {
    non_empty(xdg).unwrap_or_else(env::temp_dir)
}

fn non_empty(value: Option<OsString>) -> Option<PathBuf> {
    value.filter(|v| !v.is_empty()).map(PathBuf::from)
}

#[cfg(target_os = "macos")]
fn platform_config_base() -> Option<PathBuf> {
    dirs::config_dir()
}

#[cfg(not(target_os = "macos"))]
fn platform_config_base() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config"))
}
