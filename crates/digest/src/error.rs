//! Error types for the digest pipeline.
//!
//! Only [`ConfigError`], [`AuthError`] and [`DeliveryError`] ever end a run.
//! [`FetchError`] and [`ProviderError`] are recovered where they occur: a
//! fetcher turns them into placeholder text, the summary chain moves on to the
//! next backend.

use thiserror::Error;

/// A required setting is missing or malformed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Setting is required for this mode but absent
    #[error("{name} is not set")]
    Missing { name: &'static str },

    /// Setting is present but cannot be used
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Credential acquisition or refresh failed.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No stored token and no client secret to start consent with
    #[error("missing Google client secrets: {path}")]
    MissingClientSecrets { path: String },

    /// Client secret file could not be parsed
    #[error("invalid client secrets file {path}: {reason}")]
    InvalidClientSecrets { path: String, reason: String },

    /// Refresh grant was rejected or unreachable
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    /// Interactive consent did not complete
    #[error("consent flow failed: {0}")]
    ConsentFailed(String),

    /// Token store could not be read or written
    #[error("token store error: {0}")]
    Store(String),
}

/// Coarse classification shared by fetch and provider failures.
///
/// Both kinds still degrade gracefully; the classification exists so logs can
/// tell an outage apart from a provider that answered with garbage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Unreachable,
    Rejected,
    InvalidResponse,
}

impl FailureKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unreachable => "unreachable",
            Self::Rejected => "rejected",
            Self::InvalidResponse => "invalid_response",
        }
    }
}

/// One content fetcher failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure or timeout
    #[error("{0}")]
    Http(reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Body did not have the documented shape
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

// Query strings carry API keys; the URL never reaches the message.
impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}

impl FetchError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Http(e) if e.is_decode() => FailureKind::InvalidResponse,
            Self::Http(_) => FailureKind::Unreachable,
            Self::Status { .. } => FailureKind::Rejected,
            Self::InvalidResponse(_) => FailureKind::InvalidResponse,
        }
    }
}

/// One language-model backend failed.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Request did not complete within the provider timeout
    #[error("{provider} timed out")]
    Timeout { provider: &'static str },

    /// Transport failure
    #[error("{provider} request failed: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Provider answered with a non-success status
    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    /// Provider answered 2xx but the body held no usable completion
    #[error("{provider} returned an unusable response: {reason}")]
    InvalidResponse {
        provider: &'static str,
        reason: String,
    },
}

impl ProviderError {
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Timeout { .. } | Self::Http { .. } => FailureKind::Unreachable,
            Self::Status { .. } => FailureKind::Rejected,
            Self::InvalidResponse { .. } => FailureKind::InvalidResponse,
        }
    }
}

/// The mail transport rejected the digest.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Message could not be assembled (bad address, header)
    #[error("invalid message envelope: {0}")]
    Envelope(String),

    /// Transport failure
    #[error("mail request failed: {0}")]
    Http(reqwest::Error),

    /// Mail API refused the send
    #[error("mail API returned {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

impl From<reqwest::Error> for DeliveryError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}

/// Errors that end a digest run.
#[derive(Debug, Error)]
pub enum DigestError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// Convenience alias for run-level results.
pub type DigestResult<T> = Result<T, DigestError>;
