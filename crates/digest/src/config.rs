//! Configuration for the digest pipeline.
//!
//! Built once at startup from environment variables and passed by reference
//! into every component.

use std::path::PathBuf;
use std::time::Duration;

use lettre::message::Mailbox;

use crate::ai::{ProviderConfig, ProviderKind};
use crate::error::ConfigError;

/// Default recipient name used in greetings.
pub const DEFAULT_RECIPIENT_NAME: &str = "Friend";

/// Default weather locality.
pub const DEFAULT_CITY: &str = "Pune";

/// Default news country code.
pub const DEFAULT_NEWS_COUNTRY: &str = "in";

/// Default number of headlines in a digest.
pub const DEFAULT_MAX_HEADLINES: usize = 3;

/// Default number of upcoming calendar events in a digest.
pub const DEFAULT_MAX_EVENTS: usize = 5;

/// Default Google client secret file.
pub const DEFAULT_CREDENTIALS_FILE: &str = "credentials.json";

/// Default token store file.
pub const DEFAULT_TOKEN_FILE: &str = "token.json";

/// Remote endpoints used by the pipeline.
///
/// Production values come from [`Endpoints::default`]; tests point these at a
/// local mock server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub news_url: String,
    pub weather_url: String,
    pub quote_url: String,
    pub google_auth_url: String,
    pub google_token_url: String,
    pub calendar_api: String,
    pub gmail_api: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            news_url: "https://newsapi.org/v2/top-headlines".to_string(),
            weather_url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            quote_url: "https://zenquotes.io/api/random".to_string(),
            google_auth_url: "https://accounts.google.com/o/oauth2/auth".to_string(),
            google_token_url: "https://oauth2.googleapis.com/token".to_string(),
            calendar_api: "https://www.googleapis.com/calendar/v3".to_string(),
            gmail_api: "https://gmail.googleapis.com/gmail/v1".to_string(),
        }
    }
}

/// Per-call timeouts for the content fetchers.
#[derive(Debug, Clone)]
pub struct Timeouts {
    pub news: Duration,
    pub weather: Duration,
    pub quote: Duration,
    pub calendar: Duration,
    pub mail: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            news: Duration::from_secs(10),
            weather: Duration::from_secs(10),
            quote: Duration::from_secs(8),
            calendar: Duration::from_secs(30),
            mail: Duration::from_secs(30),
        }
    }
}

/// Configuration for the digest pipeline.
#[derive(Debug, Clone)]
pub struct DigestConfig {
    /// NewsAPI key.
    pub news_api_key: Option<String>,
    /// OpenWeatherMap key.
    pub weather_api_key: Option<String>,
    /// Summary backends in fallback priority order.
    pub providers: Vec<ProviderConfig>,
    /// Digest recipient (required for batch mode).
    pub recipient_email: Option<String>,
    /// From address; defaults to the recipient.
    pub sender_email: Option<String>,
    /// Name used in the greeting.
    pub recipient_name: String,
    /// Google OAuth client secret file.
    pub credentials_file: PathBuf,
    /// Persisted token file.
    pub token_file: PathBuf,
    /// Weather locality.
    pub default_city: String,
    /// News country code.
    pub news_country: String,
    /// Headline cap.
    pub max_headlines: usize,
    /// Calendar event cap.
    pub max_events: usize,
    pub endpoints: Endpoints,
    pub timeouts: Timeouts,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            news_api_key: None,
            weather_api_key: None,
            providers: ProviderKind::ALL
                .iter()
                .map(|kind| ProviderConfig::new(*kind, None))
                .collect(),
            recipient_email: None,
            sender_email: None,
            recipient_name: DEFAULT_RECIPIENT_NAME.to_string(),
            credentials_file: PathBuf::from(DEFAULT_CREDENTIALS_FILE),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
            default_city: DEFAULT_CITY.to_string(),
            news_country: DEFAULT_NEWS_COUNTRY.to_string(),
            max_headlines: DEFAULT_MAX_HEADLINES,
            max_events: DEFAULT_MAX_EVENTS,
            endpoints: Endpoints::default(),
            timeouts: Timeouts::default(),
        }
    }
}

impl DigestConfig {
    /// Create configuration from environment variables.
    ///
    /// # Optional Environment Variables
    /// - `TOGETHER_API_KEY`, `GROQ_API_KEY`, `OPENAI_API_KEY`: summary backends
    /// - `NEWS_API_KEY`, `WEATHER_API_KEY`: content APIs
    /// - `RECIPIENT_EMAIL`: digest recipient (required by `send`)
    /// - `SENDER_EMAIL`: From address (default: the recipient)
    /// - `DIGEST_RECIPIENT_NAME`: greeting name (default: Friend)
    /// - `GOOGLE_CREDENTIALS_FILE`: client secrets (default: credentials.json)
    /// - `GOOGLE_TOKEN_FILE`: token store (default: token.json)
    /// - `WEATHER_LOCATION`: city (default: Pune)
    /// - `NEWS_COUNTRY`: country code (default: in)
    /// - `DIGEST_MAX_HEADLINES`, `DIGEST_MAX_EVENTS`: list caps (default: 3, 5)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let providers = ProviderKind::ALL
            .iter()
            .map(|kind| ProviderConfig::new(*kind, get(kind.api_key_env_var())))
            .collect();

        let defaults = Self::default();

        Ok(Self {
            news_api_key: get("NEWS_API_KEY"),
            weather_api_key: get("WEATHER_API_KEY"),
            providers,
            recipient_email: get("RECIPIENT_EMAIL"),
            sender_email: get("SENDER_EMAIL"),
            recipient_name: get("DIGEST_RECIPIENT_NAME").unwrap_or(defaults.recipient_name),
            credentials_file: get("GOOGLE_CREDENTIALS_FILE")
                .map_or(defaults.credentials_file, PathBuf::from),
            token_file: get("GOOGLE_TOKEN_FILE").map_or(defaults.token_file, PathBuf::from),
            default_city: get("WEATHER_LOCATION").unwrap_or(defaults.default_city),
            news_country: get("NEWS_COUNTRY").unwrap_or(defaults.news_country),
            max_headlines: parse_limit("DIGEST_MAX_HEADLINES", get("DIGEST_MAX_HEADLINES"))?
                .unwrap_or(DEFAULT_MAX_HEADLINES),
            max_events: parse_limit("DIGEST_MAX_EVENTS", get("DIGEST_MAX_EVENTS"))?
                .unwrap_or(DEFAULT_MAX_EVENTS),
            endpoints: defaults.endpoints,
            timeouts: defaults.timeouts,
        })
    }

    /// Recipient address, required by batch delivery.
    pub fn require_recipient(&self) -> Result<&str, ConfigError> {
        let recipient = self
            .recipient_email
            .as_deref()
            .ok_or(ConfigError::Missing {
                name: "RECIPIENT_EMAIL",
            })?;
        check_mailbox("RECIPIENT_EMAIL", recipient)?;
        Ok(recipient)
    }

    /// Validated `(recipient, from)` pair for batch delivery.
    pub fn delivery_addresses(&self) -> Result<(&str, &str), ConfigError> {
        let recipient = self.require_recipient()?;
        let sender = self.sender_email.as_deref().unwrap_or(recipient);
        check_mailbox("SENDER_EMAIL", sender)?;
        Ok((recipient, sender))
    }

    /// Number of summary backends with a usable key.
    #[must_use]
    pub fn configured_providers(&self) -> usize {
        self.providers.iter().filter(|p| p.is_configured()).count()
    }
}

fn check_mailbox(name: &'static str, address: &str) -> Result<(), ConfigError> {
    address
        .parse::<Mailbox>()
        .map(drop)
        .map_err(|e| ConfigError::Invalid {
            name,
            reason: format!("{address:?}: {e}"),
        })
}

fn parse_limit(name: &'static str, value: Option<String>) -> Result<Option<usize>, ConfigError> {
    value
        .map(|v| {
            v.parse::<usize>().map_err(|e| ConfigError::Invalid {
                name,
                reason: format!("{v:?}: {e}"),
            })
        })
        .transpose()
}
