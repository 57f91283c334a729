//! Current conditions from OpenWeatherMap.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::get_json;
use crate::config::DigestConfig;
use crate::error::FetchError;

const UNAVAILABLE: &str = "Weather data unavailable.";

/// OpenWeatherMap current-weather client (metric units).
#[derive(Debug, Clone)]
pub struct WeatherFetcher {
    client: Client,
    url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl WeatherFetcher {
    #[must_use]
    pub fn new(
        client: Client,
        url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            api_key,
            timeout,
        }
    }

    #[must_use]
    pub fn from_config(client: Client, config: &DigestConfig) -> Self {
        Self::new(
            client,
            config.endpoints.weather_url.clone(),
            config.weather_api_key.clone(),
            config.timeouts.weather,
        )
    }

    /// `"{Description}, {temp}°C"` for `city`, or a placeholder.
    pub async fn fetch(&self, city: &str) -> String {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("WEATHER_API_KEY not set, skipping weather");
            return "Weather API key not configured.".to_string();
        };

        match self.try_fetch(api_key, city).await {
            Ok(weather) => weather,
            Err(e) => {
                error!(kind = e.kind().as_str(), error = %e, city, "Weather fetch failed");
                format!("Weather unavailable: {e}")
            }
        }
    }

    pub async fn try_fetch(&self, api_key: &str, city: &str) -> Result<String, FetchError> {
        let request = self
            .client
            .get(&self.url)
            .query(&[("q", city), ("appid", api_key), ("units", "metric")])
            .timeout(self.timeout);

        let data: Value = get_json(request).await?;
        render(&data)
    }
}

fn render(data: &Value) -> Result<String, FetchError> {
    // `cod` is a number on success and a string on some errors
    let ok = match data.get("cod") {
        Some(Value::Number(n)) => n.as_u64() == Some(200),
        Some(Value::String(s)) => s == "200",
        _ => false,
    };
    if !ok {
        let cod = data.get("cod").unwrap_or(&Value::Null);
        warn!(cod = %cod, "Weather API reported failure");
        return Ok(UNAVAILABLE.to_string());
    }

    let description = data
        .pointer("/weather/0/description")
        .and_then(Value::as_str)
        .ok_or_else(|| FetchError::InvalidResponse("missing weather[0].description".into()))?;
    let temp = data
        .pointer("/main/temp")
        .and_then(|t| match t {
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .ok_or_else(|| FetchError::InvalidResponse("missing main.temp".into()))?;

    Ok(format!("{}, {temp}°C", title_case(description)))
}

/// Upper-case the first letter of every word, lower-case the rest.
///
/// A word starts after any non-alphabetic character, so `"light rain"` becomes
/// `"Light Rain"` and `"o'clock"` becomes `"O'Clock"`.
#[must_use]
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}
