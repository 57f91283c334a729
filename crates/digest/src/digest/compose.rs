//! Digest message composition.
//!
//! Turns the plain-text digest into a two-part message. The HTML part is a
//! single line: every newline of the digest becomes exactly one `<br>`, and the
//! template itself contributes neither.

use chrono::NaiveDate;

/// Footer shown under every delivered digest.
pub const FOOTER: &str = "Sent automatically by Daily Digest AI — Have a great day!";

/// A composed digest, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub plain_body: String,
    pub html_body: String,
}

/// Compose the plain and HTML parts of a digest. Pure and deterministic.
#[must_use]
pub fn compose(body_text: &str, recipient: &str, sender: &str, subject: &str) -> DigestMessage {
    DigestMessage {
        to: recipient.to_string(),
        from: sender.to_string(),
        subject: subject.to_string(),
        plain_body: body_text.to_string(),
        html_body: render_html(body_text),
    }
}

/// Subject line for the digest of `date`.
#[must_use]
pub fn subject_for(date: NaiveDate) -> String {
    format!("Daily Digest — {}", date.format("%b %d, %Y"))
}

fn render_html(body_text: &str) -> String {
    let body_html = html_escape(body_text)
        .replace("\r\n", "<br>")
        .replace('\n', "<br>")
        .replace('\r', "");

    format!(
        concat!(
            r#"<html><body style="font-family: Arial, sans-serif; line-height: 1.6; background-color: #f8f9fa; padding: 20px;">"#,
            r#"<div style="max-width: 600px; margin: auto;">"#,
            r#"<div style="background: #fff; border-radius: 10px; padding: 20px; box-shadow: 0 2px 8px rgba(0,0,0,0.08);">"#,
            r#"<h2 style="color: #4CAF50; text-align: center;">🌅 Your Daily Digest</h2>"#,
            r#"<div style="margin-top: 12px;">{body}</div>"#,
            r#"<hr style="margin-top: 20px;">"#,
            r#"<p style="font-size: 12px; color: #777; text-align: center;">{footer}</p>"#,
            r#"</div></div></body></html>"#,
        ),
        body = body_html,
        footer = FOOTER,
    )
}

/// Simple HTML escaping for digest content.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
