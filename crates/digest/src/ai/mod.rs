//! Language-model summarization.
//!
//! This module provides:
//! - Chat-completion backends (Together, Groq, OpenAI) behind one request path
//! - The fallback chain that turns a digest into a short friendly summary

pub mod provider;
pub mod summary;

pub use provider::{ProviderConfig, ProviderKind};
pub use summary::{build_prompt, fallback_digest, Summary, SummaryGenerator};
