//! Credential retrieval for Claude Code OAuth tokens.
//!
//! Platform-specific lookup:
//! - macOS: Keychain item `Claude Code-credentials`
//! - Linux: `~/.claude/.credentials.json`
//!
//! The `CLAUDE_CODE_OAUTH_TOKEN` environment variable overrides both.
//!
//! # Security
//!
//! Tokens are retrieved, used for one request, and dropped. They are never
//! logged or cached between refresh cycles.

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "linux")]
mod linux;

use crate::error::CredentialError;

/// Service name used by Claude Code in macOS Keychain.
pub const KEYCHAIN_SERVICE: &str = "Claude Code-credentials";

/// Path to credentials file on Linux (relative to HOME).
pub const LINUX_CREDENTIALS_PATH: &str = ".claude/.credentials.json";

/// Environment variable that can override platform storage.
pub const ENV_VAR_TOKEN: &str = "CLAUDE_CODE_OAUTH_TOKEN";

/// Retrieve the OAuth access token from platform-specific storage.
///
/// The environment variable `CLAUDE_CODE_OAUTH_TOKEN` takes precedence
/// on all platforms if set and non-empty.
///
/// # Errors
///
/// Returns [`CredentialError`] if the credentials are missing, expired,
/// unreadable, or malformed.
pub fn get_token() -> Result<String, CredentialError> {
    if let Some(token) = token_override(std::env::var(ENV_VAR_TOKEN).ok()) {
        return Ok(token);
    }
    let payload = read_stored_payload()?;
    parse_credential_payload(&payload)
}

/// The override token, if the variable holds anything but whitespace.
fn token_override(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Raw credential payload from the platform store, not yet parsed.
fn read_stored_payload() -> Result<String, CredentialError> {
    #[cfg(target_os = "macos")]
    {
        macos::read_keychain_payload()
    }

    #[cfg(target_os = "linux")]
    {
        linux::read_credentials_file()
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        Err(CredentialError::NotFound)
    }
}

/// Extract the access token from a stored credential payload.
///
/// The payload is normally JSON of the form
/// `{"claudeAiOauth": {"accessToken": "...", "expiresAt": <unix ms>}}`.
/// Older installs store the bare token string instead; a payload that is not
/// JSON but is a single non-empty word is accepted as the token itself.
///
/// # Errors
///
/// - [`CredentialError::Parse`] for non-JSON content that is not a bare token
/// - [`CredentialError::MissingField`] if `claudeAiOauth` or `accessToken` is absent
/// - [`CredentialError::Expired`] if `expiresAt` lies in the past
fn parse_credential_payload(content: &str) -> Result<String, CredentialError> {
    let raw = content.trim();

    let json: serde_json::Value = match serde_json::from_str(raw) {
        Ok(json) => json,
        Err(e) => {
            if is_bare_token(raw) {
                return Ok(raw.to_string());
            }
            return Err(CredentialError::Parse(e.to_string()));
        }
    };

    let oauth = json
        .get("claudeAiOauth")
        .ok_or(CredentialError::MissingField("claudeAiOauth"))?;

    if let Some(expires_at) = oauth.get("expiresAt").and_then(|v| v.as_i64()) {
        if chrono::Utc::now().timestamp_millis() > expires_at {
            return Err(CredentialError::Expired);
        }
    }

    let token = oauth
        .get("accessToken")
        .and_then(|v| v.as_str())
        .filter(|t| !t.is_empty())
        .ok_or(CredentialError::MissingField("accessToken"))?;

    Ok(token.to_string())
}

fn is_bare_token(raw: &str) -> bool {
    !raw.is_empty() && !raw.chars().any(char::is_whitespace) && !raw.starts_with('{')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_valid_credentials() {
        let json = r#"{
            "claudeAiOauth": {
                "accessToken": "sk-ant-oat01-test-token",
                "refreshToken": "sk-ant-ort01-refresh",
                "expiresAt": 9999999999999,
                "scopes": ["user:inference", "user:profile"]
            }
        }"#;

        let token = parse_credential_payload(json).expect("should parse valid JSON");
        assert_eq!(token, "sk-ant-oat01-test-token");
    }

    #[test]
    fn test_parse_missing_claude_ai_oauth() {
        let result = parse_credential_payload(r#"{"other": "data"}"#);
        assert!(matches!(
            result,
            Err(CredentialError::MissingField("claudeAiOauth"))
        ));
    }

    #[test]
    fn test_parse_missing_access_token() {
        let json = r#"{"claudeAiOauth": {"refreshToken": "sk-ant-ort01-refresh"}}"#;
        assert!(matches!(
            parse_credential_payload(json),
            Err(CredentialError::MissingField("accessToken"))
        ));
    }

    #[test]
    fn test_parse_empty_access_token_is_missing() {
        let json = r#"{"claudeAiOauth": {"accessToken": ""}}"#;
        assert!(matches!(
            parse_credential_payload(json),
            Err(CredentialError::MissingField("accessToken"))
        ));
    }

    #[test]
    fn test_parse_expired_token() {
        let json = r#"{"claudeAiOauth": {"accessToken": "sk-ant-oat01-x", "expiresAt": 1000}}"#;
        assert!(matches!(
            parse_credential_payload(json),
            Err(CredentialError::Expired)
        ));
    }

    #[test]
    fn test_parse_bare_token_payload() {
        let token = parse_credential_payload("  sk-ant-oat01-bare\n").expect("bare token");
        assert_eq!(token, "sk-ant-oat01-bare");
    }

    #[test]
    fn test_parse_prose_is_rejected() {
        let result = parse_credential_payload("not valid json");
        assert!(matches!(result, Err(CredentialError::Parse(_))));
    }

    #[test]
    fn test_parse_broken_json_object_is_rejected() {
        let result = parse_credential_payload("{\"claudeAiOauth\":");
        assert!(matches!(result, Err(CredentialError::Parse(_))));
    }

    #[test]
    fn test_parse_no_expires_at_is_valid() {
        let json = r#"{"claudeAiOauth": {"accessToken": "sk-ant-oat01-no-expiry"}}"#;
        let token = parse_credential_payload(json).expect("should parse without expiresAt");
        assert_eq!(token, "sk-ant-oat01-no-expiry");
    }

    #[test]
    fn test_override_is_trimmed() {
        assert_eq!(
            token_override(Some("  sk-ant-oat01-env \n".to_string())),
            Some("sk-ant-oat01-env".to_string())
        );
    }

    #[test]
    fn test_blank_override_is_ignored() {
        assert_eq!(token_override(None), None);
        assert_eq!(token_override(Some(String::new())), None);
        assert_eq!(token_override(Some(" \t ".to_string())), None);
    }

    #[test]
    #[serial]
    fn test_env_var_takes_precedence() {
        let token = "test-env-token-value";
        std::env::set_var(ENV_VAR_TOKEN, token);
        let result = get_token();
        std::env::remove_var(ENV_VAR_TOKEN);

        assert_eq!(result.expect("should use env var"), token);
    }
}
