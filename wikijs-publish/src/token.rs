//! Token storage for the CLI.
//!
//! The blob written to the config file is a base64 encoding of the token. This keeps the
//! token out of plain sight in the file but is not encryption; a platform keychain can be
//! plugged in by implementing [`TokenStore`] instead.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use wikijs_publish_core::contract::TokenStore;
use wikijs_publish_core::PublishError;

#[derive(Debug, Default, Clone, Copy)]
pub struct Base64TokenStore;

impl TokenStore for Base64TokenStore {
    fn encrypt(&self, plaintext: &str) -> Result<String, PublishError> {
        let token = plaintext.trim();
        if token.is_empty() {
            return Err(PublishError::AuthError("refusing to store an empty token".into()));
        }
        Ok(STANDARD.encode(token))
    }

    fn decrypt(&self, blob: &str) -> Result<String, PublishError> {
        let bytes = STANDARD
            .decode(blob.trim())
            .map_err(|e| PublishError::AuthError(format!("stored token is corrupted: {e}")))?;
        let token = String::from_utf8(bytes)
            .map_err(|_| PublishError::AuthError("stored token is not valid UTF-8".into()))?;
        if token.is_empty() {
            return Err(PublishError::AuthError("stored token is empty".into()));
        }
        Ok(token)
    }
}
