//! Stored Google credentials and the token store.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Credentials are refreshed this many seconds before they actually expire.
pub const EXPIRY_SKEW_SECS: i64 = 60;

/// OAuth token bundle for the calendar/email provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// `None` means the token does not expire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl Credentials {
    /// Build credentials from a token endpoint answer received at `now`.
    #[must_use]
    pub fn from_token_response(
        access_token: String,
        refresh_token: Option<String>,
        expires_in: Option<u64>,
        scope: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expiry: expires_in
                .and_then(|secs| i64::try_from(secs).ok())
                .and_then(Duration::try_seconds)
                .map(|lifetime| now + lifetime),
            token_type: default_token_type(),
            scopes: scope
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
        }
    }

    /// Whether the access token has expired (or is about to) at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry
            .is_some_and(|expiry| expiry - Duration::seconds(EXPIRY_SKEW_SECS) <= now)
    }

    /// Usable as-is at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.is_empty() && !self.is_expired_at(now)
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    #[must_use]
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Persistence for [`Credentials`] between runs.
pub trait TokenStore: Send + Sync {
    /// Stored credentials, or `None` if nothing usable is stored.
    fn load(&self) -> Result<Option<Credentials>, AuthError>;

    /// Replace the stored credentials.
    fn save(&self, credentials: &Credentials) -> Result<(), AuthError>;
}

/// JSON token file.
///
/// Writes go to a temporary file next to the target and are renamed into
/// place, so a crash mid-write never leaves a truncated token file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<Credentials>, AuthError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AuthError::Store(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };

        match serde_json::from_str(&content) {
            Ok(credentials) => Ok(Some(credentials)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Ignoring unreadable token file"
                );
                Ok(None)
            }
        }
    }

    fn save(&self, credentials: &Credentials) -> Result<(), AuthError> {
        let store_err =
            |e: &dyn std::fmt::Display| AuthError::Store(format!("{}: {e}", self.path.display()));

        let content = serde_json::to_string_pretty(credentials).map_err(|e| store_err(&e))?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| store_err(&e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| store_err(&e))?;
        tmp.write_all(content.as_bytes())
            .map_err(|e| store_err(&e))?;
        tmp.as_file().sync_all().map_err(|e| store_err(&e))?;
        tmp.persist(&self.path).map_err(|e| store_err(&e.error))?;

        tracing::debug!(path = %self.path.display(), "Saved credentials");
        Ok(())
    }
}
