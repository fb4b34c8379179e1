//! Linux: Claude Code keeps its OAuth payload in `~/.claude/.credentials.json`.

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::LINUX_CREDENTIALS_PATH;
use crate::error::CredentialError;

/// Read the credential file under `$HOME`.
pub(super) fn read_credentials_file() -> Result<String, CredentialError> {
    let path = credentials_path(std::env::var_os("HOME"))?;
    read_payload_at(&path)
}

fn credentials_path(home: Option<OsString>) -> Result<PathBuf, CredentialError> {
    home.filter(|h| !h.is_empty())
        .map(|h| PathBuf::from(h).join(LINUX_CREDENTIALS_PATH))
        .ok_or(CredentialError::NoHomeDir)
}

fn read_payload_at(path: &Path) -> Result<String, CredentialError> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => CredentialError::NotFound,
        ErrorKind::PermissionDenied => CredentialError::Permission(path.display().to_string()),
        _ => CredentialError::Io(e.to_string()),
    })
}
