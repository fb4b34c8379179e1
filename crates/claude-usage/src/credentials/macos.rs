//! macOS Keychain credential retrieval.
//!
//! Claude Code stores its OAuth payload as a generic password under the
//! service name `Claude Code-credentials`.

use security_framework::passwords::get_generic_password;

use super::KEYCHAIN_SERVICE;
use crate::error::CredentialError;

/// Read the Keychain item as UTF-8.
///
/// A missing item, or a prompt the user declined, is
/// [`CredentialError::NotFound`].
pub(super) fn read_keychain_payload() -> Result<String, CredentialError> {
    // Claude Code stores the item with an empty account name
    let password =
        get_generic_password(KEYCHAIN_SERVICE, "").map_err(|_| CredentialError::NotFound)?;

    // Never echo the bytes back in the error
    String::from_utf8(password)
        .map_err(|_| CredentialError::Parse("Invalid UTF-8 in credentials".to_string()))
}
