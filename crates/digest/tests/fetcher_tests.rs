//! Content fetchers against mocked upstream APIs.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use daily_digest::fetch::{
    CalendarFetcher, NewsFetcher, QuoteFetcher, WeatherFetcher, FALLBACK_QUOTE,
};
use daily_digest::Credentials;
use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(2);

fn news(server: &MockServer, key: Option<&str>) -> NewsFetcher {
    NewsFetcher::new(
        Client::new(),
        format!("{}/v2/top-headlines", server.uri()),
        key.map(Into::into),
        "in",
        3,
        TIMEOUT,
    )
}

fn weather(server: &MockServer, key: Option<&str>) -> WeatherFetcher {
    WeatherFetcher::new(
        Client::new(),
        format!("{}/data/2.5/weather", server.uri()),
        key.map(Into::into),
        TIMEOUT,
    )
}

fn credentials() -> Credentials {
    Credentials {
        access_token: "ya29.test".to_string(),
        refresh_token: None,
        expiry: None,
        token_type: "Bearer".to_string(),
        scopes: vec![],
    }
}

#[tokio::test]
async fn test_news_headlines() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/top-headlines"))
        .and(query_param("country", "in"))
        .and(query_param("apiKey", "news-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "articles": [
                {"title": "Monsoon arrives early"},
                {"title": null},
                {"title": "Markets rally"},
                {"title": "Fourth story"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let headlines = news(&server, Some("news-key")).fetch().await;

    assert_eq!(headlines, vec!["• Monsoon arrives early", "• Markets rally"]);
}

#[tokio::test]
async fn test_news_failure_is_placeholder() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let headlines = news(&server, Some("news-key")).fetch().await;

    assert_eq!(headlines.len(), 1);
    assert!(headlines[0].starts_with("News unavailable: HTTP 500"));
}

#[tokio::test]
async fn test_news_without_key_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert_eq!(
        news(&server, None).fetch().await,
        vec!["News API key not configured."]
    );
}

#[tokio::test]
async fn test_weather_conditions() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Pune"))
        .and(query_param("appid", "owm-key"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cod": 200,
            "weather": [{"main": "Clouds", "description": "broken clouds"}],
            "main": {"temp": 27.3, "humidity": 70}
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(
        weather(&server, Some("owm-key")).fetch("Pune").await,
        "Broken Clouds, 27.3°C"
    );
}

#[tokio::test]
async fn test_weather_without_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert_eq!(
        weather(&server, None).fetch("Pune").await,
        "Weather API key not configured."
    );
}

#[tokio::test]
async fn test_weather_garbage_is_placeholder() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let text = weather(&server, Some("owm-key")).fetch("Pune").await;
    assert!(text.starts_with("Weather unavailable: "), "{text}");
}

#[tokio::test]
async fn test_slow_upstream_times_out_without_leaking_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"cod": 200}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let slow = Duration::from_millis(200);
    let weather = WeatherFetcher::new(
        Client::new(),
        format!("{}/data/2.5/weather", server.uri()),
        Some("owm-secret".to_string()),
        slow,
    );
    let news = NewsFetcher::new(
        Client::new(),
        format!("{}/v2/top-headlines", server.uri()),
        Some("news-secret".to_string()),
        "in",
        3,
        slow,
    );

    let text = weather.fetch("Pune").await;
    assert!(text.starts_with("Weather unavailable: "), "{text}");
    assert!(!text.contains("owm-secret"), "{text}");
    assert!(!text.contains("appid"), "{text}");

    let headlines = news.fetch().await;
    assert_eq!(headlines.len(), 1);
    assert!(headlines[0].starts_with("News unavailable: "), "{headlines:?}");
    assert!(!headlines[0].contains("news-secret"), "{headlines:?}");
}

#[tokio::test]
async fn test_weather_reported_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"cod": "404", "message": "city not found"})),
        )
        .mount(&server)
        .await;

    assert_eq!(
        weather(&server, Some("owm-key")).fetch("Atlantis").await,
        "Weather data unavailable."
    );
}

#[tokio::test]
async fn test_quote() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/random"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"q": "Be kind", "a": "Anon"}])),
        )
        .mount(&server)
        .await;

    let url = format!("{}/api/random", server.uri());
    let quotes = QuoteFetcher::new(Client::new(), url, TIMEOUT);
    assert_eq!(quotes.fetch().await, "“Be kind” — Anon");
}

#[tokio::test]
async fn test_quote_fallbacks() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/empty"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    for route in ["/empty", "/broken"] {
        let url = format!("{}{route}", server.uri());
        let quotes = QuoteFetcher::new(Client::new(), url, TIMEOUT);
        assert_eq!(quotes.fetch().await, FALLBACK_QUOTE);
    }
}

#[tokio::test]
async fn test_calendar_events() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendar/v3/calendars/primary/events"))
        .and(header("Authorization", "Bearer ya29.test"))
        .and(query_param("timeMin", "2024-05-01T03:30:00Z"))
        .and(query_param("maxResults", "5"))
        .and(query_param("singleEvents", "true"))
        .and(query_param("orderBy", "startTime"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"summary": "Standup", "start": {"dateTime": "2024-05-01T09:30:00+05:30"}},
                {"start": {"date": "2024-05-02"}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let calendar = CalendarFetcher::new(
        Client::new(),
        format!("{}/calendar/v3", server.uri()),
        5,
        TIMEOUT,
    );
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 3, 30, 0).unwrap();

    let events = calendar.try_fetch(&credentials(), now).await.unwrap();

    assert_eq!(
        events,
        vec![
            "2024-05-01T09:30:00+05:30 — Standup",
            "2024-05-02 — No title"
        ]
    );
}

#[tokio::test]
async fn test_calendar_empty_and_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ok/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/denied/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
        .mount(&server)
        .await;

    let empty = CalendarFetcher::new(Client::new(), format!("{}/ok", server.uri()), 5, TIMEOUT);
    assert_eq!(empty.fetch(&credentials()).await, vec!["No events today."]);

    let denied =
        CalendarFetcher::new(Client::new(), format!("{}/denied", server.uri()), 5, TIMEOUT);
    let events = denied.fetch(&credentials()).await;
    assert_eq!(events.len(), 1);
    assert!(events[0].starts_with("Calendar unavailable: HTTP 401"));
}
