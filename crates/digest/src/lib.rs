//! Daily digest: a short personalized morning briefing.
//!
//! This crate provides:
//! - Content fetchers for news headlines, weather, calendar events and a quote
//! - Google credential management (token store, refresh, loopback consent)
//! - A language-model summary with a Together → Groq → OpenAI fallback chain
//! - Plain + HTML message composition and delivery through the Gmail API
//! - The pipeline tying these together in interactive and batch modes

pub mod ai;
pub mod auth;
pub mod config;
pub mod digest;
pub mod error;
pub mod fetch;
pub mod pipeline;

// Re-export main types
pub use ai::{ProviderConfig, ProviderKind, Summary, SummaryGenerator};
pub use auth::{
    CredentialManager, Credentials, FileTokenStore, GoogleOAuth, OAuthFlow, TokenStore,
};
pub use config::DigestConfig;
pub use digest::{compose, DeliveryReceipt, DigestInput, DigestMessage, EmailSender};
pub use error::{
    AuthError, ConfigError, DeliveryError, DigestError, DigestResult, FetchError, ProviderError,
};
pub use pipeline::{BatchOutcome, InteractiveDigest, Pipeline};
