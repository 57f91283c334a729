//! Digest pipeline - orchestrates the gather-summarize-compose-deliver flow.

use std::sync::Arc;

use chrono::Local;
use reqwest::Client;
use tracing::{info, warn};

use crate::ai::{ProviderKind, Summary, SummaryGenerator};
use crate::auth::{CredentialManager, Credentials, FileTokenStore, GoogleOAuth};
use crate::config::DigestConfig;
use crate::digest::{compose, subject_for, DeliveryReceipt, DigestInput, EmailSender};
use crate::error::{AuthError, ConfigError, DigestResult};
use crate::fetch::{CalendarFetcher, NewsFetcher, QuoteFetcher, WeatherFetcher};

const USER_AGENT: &str = concat!("daily-digest/", env!("CARGO_PKG_VERSION"));

/// Result of an interactive run.
#[derive(Debug, Clone)]
pub struct InteractiveDigest {
    pub summary: Summary,
    /// Raw sections the summary was built from.
    pub input: DigestInput,
}

/// Result of a delivered batch run.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub recipient: String,
    pub subject: String,
    pub summary: Summary,
    pub receipt: DeliveryReceipt,
}

/// Digest pipeline orchestrator.
pub struct Pipeline {
    config: DigestConfig,
    credentials: CredentialManager,
    news: NewsFetcher,
    weather: WeatherFetcher,
    calendar: CalendarFetcher,
    quote: QuoteFetcher,
    summary: SummaryGenerator,
    sender: EmailSender,
}

impl Pipeline {
    /// Create a pipeline from explicit parts.
    #[must_use]
    pub fn new(config: DigestConfig, client: Client, credentials: CredentialManager) -> Self {
        Self {
            news: NewsFetcher::from_config(client.clone(), &config),
            weather: WeatherFetcher::from_config(client.clone(), &config),
            calendar: CalendarFetcher::from_config(client.clone(), &config),
            quote: QuoteFetcher::from_config(client.clone(), &config),
            summary: SummaryGenerator::new(client.clone(), config.providers.clone()),
            sender: EmailSender::new(
                client,
                config.endpoints.gmail_api.clone(),
                config.timeouts.mail,
            ),
            credentials,
            config,
        }
    }

    /// Create a pipeline backed by the token file and Google OAuth.
    pub fn from_config(config: DigestConfig) -> DigestResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ConfigError::Invalid {
                name: "HTTP client",
                reason: e.to_string(),
            })?;

        let store = Arc::new(FileTokenStore::new(config.token_file.clone()));
        let flow = Arc::new(GoogleOAuth::new(
            client.clone(),
            config.credentials_file.clone(),
            config.endpoints.google_auth_url.clone(),
            config.endpoints.google_token_url.clone(),
        ));

        Ok(Self::new(config, client, CredentialManager::new(store, flow)))
    }

    #[must_use]
    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    /// Obtain credentials without producing a digest.
    pub async fn authorize(&self) -> DigestResult<Credentials> {
        Ok(self.credentials.acquire().await?)
    }

    /// Build a digest for display. Nothing is delivered.
    ///
    /// A credential failure only costs the calendar section.
    pub async fn run_interactive(&self, recipient_name: &str, city: &str) -> InteractiveDigest {
        info!(recipient_name, city, "Building interactive digest");

        let credentials = self.credentials.acquire().await;
        let input = self
            .gather(recipient_name, city, credentials.as_ref())
            .await;
        let summary = self.summary.summarize(&input).await;

        InteractiveDigest { summary, input }
    }

    /// Build the digest and email it to the configured recipient.
    ///
    /// Fails before any network I/O when the recipient or From address is
    /// missing or malformed.
    pub async fn run_batch(&self) -> DigestResult<BatchOutcome> {
        let (recipient, sender) = self.config.delivery_addresses()?;
        let (recipient, sender) = (recipient.to_string(), sender.to_string());

        info!(recipient = %recipient, "Starting batch digest");

        let credentials = self.credentials.acquire().await?;
        let input = self
            .gather(
                &self.config.recipient_name,
                &self.config.default_city,
                Ok(&credentials),
            )
            .await;
        let summary = self.summary.summarize(&input).await;

        let subject = subject_for(Local::now().date_naive());
        let message = compose(&summary.text, &recipient, &sender, &subject);
        let receipt = self.sender.send(&credentials, &message).await?;

        info!(
            recipient = %recipient,
            id = %receipt.id,
            provider = summary.provider.map_or("template", ProviderKind::name),
            "Digest delivered"
        );

        Ok(BatchOutcome {
            recipient,
            subject,
            summary,
            receipt,
        })
    }

    /// Run the four fetchers concurrently. Never fails.
    pub async fn gather(
        &self,
        recipient_name: &str,
        city: &str,
        credentials: Result<&Credentials, &AuthError>,
    ) -> DigestInput {
        let calendar = async {
            match credentials {
                Ok(creds) => self.calendar.fetch(creds).await,
                Err(e) => {
                    warn!(error = %e, "Calendar skipped, no credentials");
                    CalendarFetcher::unavailable(e)
                }
            }
        };

        let (news, weather, calendar, quote) = tokio::join!(
            self.news.fetch(),
            self.weather.fetch(city),
            calendar,
            self.quote.fetch(),
        );

        DigestInput {
            news,
            weather,
            calendar,
            quote,
            recipient_name: recipient_name.to_string(),
        }
    }
}
