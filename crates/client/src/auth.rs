//! Bearer-token credentials for the backend session.
//!
//! The token itself is an opaque capability: it is loaded, attached to
//! requests, and never inspected. Acquisition (the OAuth browser flow)
//! happens outside this crate; what lands here is either an environment
//! variable or a cached token file under the user's config directory.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;

use sheetlink_core::{SheetError, SheetResult};

/// Environment variable consulted before any token file.
pub const TOKEN_ENV_VAR: &str = "SHEETLINK_TOKEN";

/// Token file location relative to the home directory.
const DEFAULT_TOKEN_FILE: &str = ".sheetlink/token.json";

/// Opaque bearer token for the backend session.
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token string.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub(crate) fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Load a bearer token.
///
/// `SHEETLINK_TOKEN` wins when set and non-empty. Otherwise the token file
/// at `path` (default `~/.sheetlink/token.json`) is read; it must be a JSON
/// object with a non-empty `access_token` field.
pub fn load_token(path: Option<&Path>) -> SheetResult<AccessToken> {
    if let Ok(secret) = std::env::var(TOKEN_ENV_VAR) {
        if !secret.is_empty() {
            return Ok(AccessToken::new(secret));
        }
    }

    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_token_path()?,
    };
    read_token_file(&path)
}

fn read_token_file(path: &Path) -> SheetResult<AccessToken> {
    let raw = fs::read_to_string(path).map_err(|e| {
        SheetError::Auth(format!("failed to read token file {}: {e}", path.display()))
    })?;
    let parsed: JsonValue = serde_json::from_str(&raw).map_err(|e| {
        SheetError::Auth(format!("invalid token file {}: {e}", path.display()))
    })?;

    match parsed.get("access_token").and_then(JsonValue::as_str) {
        Some(secret) if !secret.is_empty() => Ok(AccessToken::new(secret)),
        _ => Err(SheetError::Auth(format!(
            "token file {} has no access_token",
            path.display()
        ))),
    }
}

fn default_token_path() -> SheetResult<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_TOKEN_FILE))
        .ok_or_else(|| SheetError::Auth("cannot determine home directory".to_string()))
}
