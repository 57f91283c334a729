//! Content fetchers for the four digest sections.
//!
//! Every fetcher exposes a `try_fetch` that reports a [`FetchError`] and a
//! `fetch` that never fails: errors are logged with their
//! [`FailureKind`](crate::error::FailureKind) and turned into placeholder text.

mod calendar;
mod news;
mod quote;
mod weather;

pub use calendar::CalendarFetcher;
pub use news::NewsFetcher;
pub use quote::{QuoteFetcher, FALLBACK_QUOTE};
pub use weather::{title_case, WeatherFetcher};

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::error::FetchError;

/// Send `request` and decode a JSON body, classifying every failure.
pub(crate) async fn get_json<T>(request: RequestBuilder) -> Result<T, FetchError>
where
    T: DeserializeOwned,
{
    let response = request.send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::Status { status, body });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| FetchError::InvalidResponse(e.to_string()))
}
