//! Gathered digest sections.

use serde::Serialize;

/// Everything the summary is built from. Assembled once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestInput {
    pub news: Vec<String>,
    pub weather: String,
    pub calendar: Vec<String>,
    pub quote: String,
    pub recipient_name: String,
}

impl DigestInput {
    /// Headlines, one per line.
    #[must_use]
    pub fn news_text(&self) -> String {
        self.news.join("\n")
    }

    /// Calendar entries, one per line.
    #[must_use]
    pub fn calendar_text(&self) -> String {
        self.calendar.join("\n")
    }
}
