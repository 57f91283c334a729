//! Quote of the day from ZenQuotes.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use super::get_json;
use crate::config::DigestConfig;
use crate::error::FetchError;

/// Used whenever no quote could be fetched.
pub const FALLBACK_QUOTE: &str = "Stay positive and keep moving forward!";

#[derive(Debug, Clone)]
pub struct QuoteFetcher {
    client: Client,
    url: String,
    timeout: Duration,
}

impl QuoteFetcher {
    #[must_use]
    pub fn new(client: Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
        }
    }

    #[must_use]
    pub fn from_config(client: Client, config: &DigestConfig) -> Self {
        Self::new(
            client,
            config.endpoints.quote_url.clone(),
            config.timeouts.quote,
        )
    }

    /// `"“{quote}” — {author}"`, or [`FALLBACK_QUOTE`].
    pub async fn fetch(&self) -> String {
        match self.try_fetch().await {
            Ok(Some(quote)) => quote,
            Ok(None) => FALLBACK_QUOTE.to_string(),
            Err(e) => {
                warn!(kind = e.kind().as_str(), error = %e, "Quote fetch failed");
                FALLBACK_QUOTE.to_string()
            }
        }
    }

    /// `Ok(None)` when the service answered with an empty list.
    pub async fn try_fetch(&self) -> Result<Option<String>, FetchError> {
        let request = self.client.get(&self.url).timeout(self.timeout);
        let data: Value = get_json(request).await?;
        render(&data)
    }
}

fn render(data: &Value) -> Result<Option<String>, FetchError> {
    let Some(first) = data.as_array().and_then(|items| items.first()) else {
        return Ok(None);
    };

    let field = |name: &str| {
        first
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| FetchError::InvalidResponse(format!("missing [0].{name}")))
    };

    Ok(Some(format!("“{}” — {}", field("q")?, field("a")?)))
}
