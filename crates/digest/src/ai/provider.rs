//! Chat-completion backends used by the summary chain.
//!
//! All three reference backends speak the OpenAI chat-completions dialect, so
//! a single request path serves every [`ProviderKind`]; the kind only carries
//! defaults (endpoint, model, timeout, key variable).

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Sampling temperature sent with every summary request.
pub const TEMPERATURE: f32 = 0.7;

/// Completion cap sent with every summary request.
pub const MAX_TOKENS: u32 = 250;

/// Known summary backends, in fallback priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Together,
    Groq,
    OpenAi,
}

impl ProviderKind {
    /// Every backend in priority order.
    pub const ALL: [Self; 3] = [Self::Together, Self::Groq, Self::OpenAi];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Together => "together",
            Self::Groq => "groq",
            Self::OpenAi => "openai",
        }
    }

    #[must_use]
    pub const fn api_key_env_var(self) -> &'static str {
        match self {
            Self::Together => "TOGETHER_API_KEY",
            Self::Groq => "GROQ_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }

    #[must_use]
    pub const fn default_endpoint(self) -> &'static str {
        match self {
            Self::Together => "https://api.together.xyz/v1/chat/completions",
            Self::Groq => "https://api.groq.com/openai/v1/chat/completions",
            Self::OpenAi => "https://api.openai.com/v1/chat/completions",
        }
    }

    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::Together => "meta-llama/Meta-Llama-3.1-8B-Instruct-Turbo",
            Self::Groq => "llama3-8b-8192",
            Self::OpenAi => "gpt-4o-mini",
        }
    }

    /// OpenAI has no explicit limit upstream; 30s keeps the run bounded.
    #[must_use]
    pub const fn default_timeout(self) -> Duration {
        match self {
            Self::Together | Self::Groq => Duration::from_secs(15),
            Self::OpenAi => Duration::from_secs(30),
        }
    }
}

/// One candidate backend in the fallback chain.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Backend with the kind's default endpoint, model and timeout.
    #[must_use]
    pub fn new(kind: ProviderKind, api_key: Option<String>) -> Self {
        Self {
            kind,
            api_key,
            endpoint: kind.default_endpoint().to_string(),
            model: kind.default_model().to_string(),
            timeout: kind.default_timeout(),
        }
    }

    /// Point the backend at a different chat-completions URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// A key that is absent or blank means the backend is skipped.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Make exactly one completion request for `prompt`.
    ///
    /// Returns the trimmed text of the first choice. Callers must check
    /// [`is_configured`](Self::is_configured) first; an unconfigured backend
    /// fails without touching the network.
    pub async fn attempt(&self, client: &Client, prompt: &str) -> Result<String, ProviderError> {
        let provider = self.kind.name();
        let api_key = match self.api_key.as_deref() {
            Some(k) if !k.trim().is_empty() => k,
            _ => {
                return Err(ProviderError::InvalidResponse {
                    provider,
                    reason: format!("{} not set", self.kind.api_key_env_var()),
                })
            }
        };

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(provider, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(provider, e))?;

        if !status.is_success() {
            let body = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ProviderError::Status {
                provider,
                status,
                body,
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::InvalidResponse {
                provider,
                reason: e.to_string(),
            })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ProviderError::InvalidResponse {
                provider,
                reason: "empty completion".to_string(),
            });
        }

        Ok(text)
    }
}

fn transport_error(provider: &'static str, source: reqwest::Error) -> ProviderError {
    if source.is_timeout() {
        ProviderError::Timeout { provider }
    } else {
        ProviderError::Http {
            provider,
            source: source.without_url(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_key_is_not_configured() {
        assert!(!ProviderConfig::new(ProviderKind::Groq, None).is_configured());
        assert!(!ProviderConfig::new(ProviderKind::Groq, Some("  ".into())).is_configured());
        assert!(ProviderConfig::new(ProviderKind::Groq, Some("gsk".into())).is_configured());
    }

    #[test]
    fn test_defaults_per_kind() {
        let together = ProviderConfig::new(ProviderKind::Together, None);
        assert_eq!(together.model, "meta-llama/Meta-Llama-3.1-8B-Instruct-Turbo");
        assert_eq!(together.timeout, Duration::from_secs(15));

        let openai = ProviderConfig::new(ProviderKind::OpenAi, None);
        assert_eq!(openai.endpoint, "https://api.openai.com/v1/chat/completions");
        assert_eq!(openai.model, "gpt-4o-mini");
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "llama3-8b-8192",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama3-8b-8192");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
        assert_eq!(json["max_tokens"], 250);
    }

    #[tokio::test]
    async fn test_attempt_without_key_makes_no_request() {
        let provider = ProviderConfig::new(ProviderKind::Groq, None)
            .with_endpoint("http://127.0.0.1:9/never");
        let err = provider.attempt(&Client::new(), "prompt").await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse { .. }));
    }
}
