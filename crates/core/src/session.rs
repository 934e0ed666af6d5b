//! Session token pair and its persistence seam.
//!
//! The access/refresh pair is the only credential state the client holds.
//! [`TokenStore`] abstracts where the pair lives between runs; the session
//! manager reads it at startup to decide whether the user is still
//! authenticated.

use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// An access/refresh token pair as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer credential sent on every authenticated call.
    #[serde(rename = "access_token")]
    pub access: String,
    /// Longer-lived credential used solely to mint a new access token.
    #[serde(rename = "refresh_token")]
    pub refresh: String,
}

/// Persistent storage for the token pair.
///
/// Persistence is best-effort: implementations log failures instead of
/// surfacing them, so a broken disk never blocks a login.
pub trait TokenStore: Send + Sync {
    /// Read the stored pair, if any.
    fn load(&self) -> Option<TokenPair>;
    /// Replace the stored pair.
    fn save(&self, tokens: &TokenPair);
    /// Remove the stored pair.
    fn clear(&self);
}

/// In-memory store. State lives only as long as the process.
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<Option<TokenPair>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<TokenPair> {
        self.tokens.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn save(&self, tokens: &TokenPair) {
        *self.tokens.lock().unwrap_or_else(|e| e.into_inner()) = Some(tokens.clone());
    }

    fn clear(&self) {
        *self.tokens.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

/// JSON-file store under a fixed path.
///
/// The file holds `{"access_token": ..., "refresh_token": ...}` and is
/// rewritten atomically enough for a single-user client (full-file write).
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<TokenPair> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(tokens) => Some(tokens),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Stored tokens unreadable");
                None
            }
        }
    }

    fn save(&self, tokens: &TokenPair) {
        let raw = match serde_json::to_string(tokens) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize tokens");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, raw) {
            tracing::error!(path = %self.path.display(), error = %e, "Failed to persist tokens");
        }
    }

    fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "Failed to remove stored tokens");
            }
        }
    }
}
