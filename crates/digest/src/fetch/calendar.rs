//! Upcoming events from the primary Google Calendar.

use std::fmt::Display;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::error;

use super::get_json;
use crate::auth::Credentials;
use crate::config::DigestConfig;
use crate::error::FetchError;

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<Event>,
}

#[derive(Debug, Deserialize)]
struct Event {
    summary: Option<String>,
    start: EventStart,
}

/// Timed events carry `dateTime`, all-day events carry `date`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventStart {
    date_time: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CalendarFetcher {
    client: Client,
    api_base: String,
    limit: usize,
    timeout: Duration,
}

impl CalendarFetcher {
    #[must_use]
    pub fn new(
        client: Client,
        api_base: impl Into<String>,
        limit: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            limit,
            timeout,
        }
    }

    #[must_use]
    pub fn from_config(client: Client, config: &DigestConfig) -> Self {
        Self::new(
            client,
            config.endpoints.calendar_api.clone(),
            config.max_events,
            config.timeouts.calendar,
        )
    }

    /// Placeholder used when the calendar could not be read at all.
    #[must_use]
    pub fn unavailable(reason: &dyn Display) -> Vec<String> {
        vec![format!("Calendar unavailable: {reason}")]
    }

    /// Next events as `"{start} — {title}"`, or a placeholder line.
    pub async fn fetch(&self, credentials: &Credentials) -> Vec<String> {
        match self.try_fetch(credentials, Utc::now()).await {
            Ok(events) if events.is_empty() => vec!["No events today.".to_string()],
            Ok(events) => events,
            Err(e) => {
                error!(kind = e.kind().as_str(), error = %e, "Calendar fetch failed");
                Self::unavailable(&e)
            }
        }
    }

    /// Events starting at or after `now`, in start order.
    pub async fn try_fetch(
        &self,
        credentials: &Credentials,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, FetchError> {
        let time_min = now.to_rfc3339_opts(SecondsFormat::Secs, true);
        let max_results = self.limit.to_string();

        let request = self
            .client
            .get(format!("{}/calendars/primary/events", self.api_base))
            .bearer_auth(&credentials.access_token)
            .query(&[
                ("timeMin", time_min.as_str()),
                ("maxResults", max_results.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
            ])
            .timeout(self.timeout);

        let list: EventList = get_json(request).await?;
        Ok(list.items.into_iter().map(render).collect())
    }
}

fn render(event: Event) -> String {
    let start = event.start.date_time.or(event.start.date).unwrap_or_default();
    let title = event.summary.unwrap_or_else(|| "No title".to_string());
    format!("{start} — {title}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(summary: Option<&str>, date_time: Option<&str>, date: Option<&str>) -> Event {
        Event {
            summary: summary.map(Into::into),
            start: EventStart {
                date_time: date_time.map(Into::into),
                date: date.map(Into::into),
            },
        }
    }

    #[test]
    fn test_render_timed_event() {
        let e = event(Some("Standup"), Some("2024-05-01T09:00:00+05:30"), None);
        assert_eq!(render(e), "2024-05-01T09:00:00+05:30 — Standup");
    }

    #[test]
    fn test_render_all_day_untitled() {
        let e = event(None, None, Some("2024-05-01"));
        assert_eq!(render(e), "2024-05-01 — No title");
    }

    #[test]
    fn test_unavailable() {
        assert_eq!(
            CalendarFetcher::unavailable(&"boom"),
            vec!["Calendar unavailable: boom"]
        );
    }

    #[test]
    fn test_event_list_shape() {
        let list: EventList = serde_json::from_str(
            r#"{"items":[{"summary":"Lunch","start":{"dateTime":"2024-05-01T12:00:00Z"}}]}"#,
        )
        .unwrap();
        assert_eq!(list.items.len(), 1);

        let empty: EventList = serde_json::from_str("{}").unwrap();
        assert!(empty.items.is_empty());
    }
}
