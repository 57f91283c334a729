//! Digest summary generation with provider fallback.

use reqwest::Client;
use tracing::{debug, info, warn};

use super::provider::{ProviderConfig, ProviderKind};
use crate::digest::DigestInput;

/// Builds the digest text from the gathered sections.
///
/// Backends are tried in the configured order and the first usable completion
/// wins. When every backend is unconfigured or fails, a fixed plain-text
/// template is rendered instead, so [`generate`](Self::generate) never fails.
pub struct SummaryGenerator {
    client: Client,
    providers: Vec<ProviderConfig>,
}

/// Digest text together with the backend that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub text: String,
    /// `None` when the plain-text template was used.
    pub provider: Option<ProviderKind>,
}

impl SummaryGenerator {
    #[must_use]
    pub fn new(client: Client, providers: Vec<ProviderConfig>) -> Self {
        Self { client, providers }
    }

    /// Produce the digest text. Always returns a usable string.
    pub async fn generate(&self, input: &DigestInput) -> String {
        self.summarize(input).await.text
    }

    /// Like [`generate`](Self::generate), but also reports which backend won.
    pub async fn summarize(&self, input: &DigestInput) -> Summary {
        let prompt = build_prompt(input);

        for provider in &self.providers {
            if !provider.is_configured() {
                debug!(provider = provider.kind.name(), "Skipping unconfigured provider");
                continue;
            }

            match provider.attempt(&self.client, &prompt).await {
                Ok(text) => {
                    info!(
                        provider = provider.kind.name(),
                        model = %provider.model,
                        "Summary generated"
                    );
                    return Summary {
                        text,
                        provider: Some(provider.kind),
                    };
                }
                Err(e) => {
                    warn!(
                        provider = provider.kind.name(),
                        kind = e.kind().as_str(),
                        error = %e,
                        "Summary provider failed, trying next"
                    );
                }
            }
        }

        info!("No summary provider succeeded, using plain-text digest");
        Summary {
            text: fallback_digest(input),
            provider: None,
        }
    }
}

/// Prompt sent to every backend.
#[must_use]
pub fn build_prompt(input: &DigestInput) -> String {
    format!(
        "Create a short, friendly daily digest for {name}.\n\n\
         News Headlines:\n{news}\n\n\
         Weather:\n{weather}\n\n\
         Calendar Events:\n{calendar}\n\n\
         Motivational Quote:\n{quote}\n\n\
         Keep it concise, warm, and easy to read (3-6 short sentences).",
        name = input.recipient_name,
        news = input.news_text(),
        weather = input.weather,
        calendar = input.calendar_text(),
        quote = input.quote,
    )
}

/// Plain-text digest used when no backend produced a summary. Pure.
#[must_use]
pub fn fallback_digest(input: &DigestInput) -> String {
    format!(
        "Hello {name}, here's your quick digest:\n\n\
         News:\n{news}\n\n\
         Weather:\n{weather}\n\n\
         Events:\n{calendar}\n\n\
         Quote:\n{quote}",
        name = input.recipient_name,
        news = input.news_text(),
        weather = input.weather,
        calendar = input.calendar_text(),
        quote = input.quote,
    )
}
