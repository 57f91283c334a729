//! Digest delivery through the Gmail API.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::Message;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::compose::DigestMessage;
use crate::auth::Credentials;
use crate::error::DeliveryError;

/// Identifiers the mail API assigns to a sent digest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReceipt {
    pub id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct RawMessage {
    raw: String,
}

/// Sends composed digests as the authenticated Google user.
pub struct EmailSender {
    client: Client,
    api_base: String,
    timeout: Duration,
}

impl EmailSender {
    /// Create a sender for the Gmail API rooted at `api_base`.
    #[must_use]
    pub fn new(client: Client, api_base: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            timeout,
        }
    }

    /// Send `message` in a single request. Failures are returned, not retried.
    pub async fn send(
        &self,
        credentials: &Credentials,
        message: &DigestMessage,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let raw = encode_raw(message)?;
        let url = format!(
            "{}/users/me/messages/send",
            self.api_base.trim_end_matches('/')
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(&credentials.access_token)
            .timeout(self.timeout)
            .json(&RawMessage { raw })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected { status, body });
        }

        let receipt: DeliveryReceipt = response.json().await?;

        info!(
            to = %message.to,
            subject = %message.subject,
            id = %receipt.id,
            "Email sent successfully"
        );

        Ok(receipt)
    }
}

/// Build the `multipart/alternative` envelope and base64url-encode it.
pub fn encode_raw(message: &DigestMessage) -> Result<String, DeliveryError> {
    let from: Mailbox = message
        .from
        .parse()
        .map_err(|e| DeliveryError::Envelope(format!("invalid from address: {e}")))?;

    let to: Mailbox = message
        .to
        .parse()
        .map_err(|e| DeliveryError::Envelope(format!("invalid to address: {e}")))?;

    let email = Message::builder()
        .from(from)
        .to(to)
        .subject(&message.subject)
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(message.plain_body.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(message.html_body.clone()),
                ),
        )
        .map_err(|e| DeliveryError::Envelope(e.to_string()))?;

    Ok(URL_SAFE.encode(email.formatted()))
}
