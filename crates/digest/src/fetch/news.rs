//! Top headlines from NewsAPI.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use super::get_json;
use crate::config::DigestConfig;
use crate::error::FetchError;

#[derive(Debug, Deserialize)]
struct Headlines {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: Option<String>,
}

/// NewsAPI top-headlines client.
#[derive(Debug, Clone)]
pub struct NewsFetcher {
    client: Client,
    url: String,
    api_key: Option<String>,
    country: String,
    limit: usize,
    timeout: Duration,
}

impl NewsFetcher {
    #[must_use]
    pub fn new(
        client: Client,
        url: impl Into<String>,
        api_key: Option<String>,
        country: impl Into<String>,
        limit: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            api_key,
            country: country.into(),
            limit,
            timeout,
        }
    }

    #[must_use]
    pub fn from_config(client: Client, config: &DigestConfig) -> Self {
        Self::new(
            client,
            config.endpoints.news_url.clone(),
            config.news_api_key.clone(),
            config.news_country.clone(),
            config.max_headlines,
            config.timeouts.news,
        )
    }

    /// Headlines rendered as `"• {title}"`, or a single placeholder line.
    pub async fn fetch(&self) -> Vec<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("NEWS_API_KEY not set, skipping headlines");
            return vec!["News API key not configured.".to_string()];
        };

        match self.try_fetch(api_key).await {
            Ok(headlines) => headlines,
            Err(e) => {
                error!(kind = e.kind().as_str(), error = %e, "News fetch failed");
                vec![format!("News unavailable: {e}")]
            }
        }
    }

    pub async fn try_fetch(&self, api_key: &str) -> Result<Vec<String>, FetchError> {
        let request = self
            .client
            .get(&self.url)
            .query(&[("country", self.country.as_str()), ("apiKey", api_key)])
            .timeout(self.timeout);

        let headlines: Headlines = get_json(request).await?;
        Ok(render(headlines.articles, self.limit))
    }
}

/// The first `limit` articles; untitled ones are dropped after the cut.
fn render(articles: Vec<Article>, limit: usize) -> Vec<String> {
    articles
        .into_iter()
        .take(limit)
        .filter_map(|a| a.title.filter(|t| !t.is_empty()))
        .map(|title| format!("• {title}"))
        .collect()
}
