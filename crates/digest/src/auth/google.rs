//! Google OAuth 2.0 for installed applications.
//!
//! Refresh uses the `refresh_token` grant. First-time consent runs the
//! loopback flow: a listener on `127.0.0.1` receives the redirect carrying the
//! authorization code, which is then exchanged at the token endpoint.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};
use url::Url;

use super::credentials::Credentials;
use crate::error::AuthError;

/// Scopes requested at consent: send mail, read calendar.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.send",
    "https://www.googleapis.com/auth/calendar.readonly",
];

/// How long the consent flow waits for the browser redirect.
const CONSENT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Timeout for token endpoint calls.
const TOKEN_TIMEOUT: Duration = Duration::from_secs(30);

/// Bind the redirect listener and return it with the matching redirect URI.
///
/// The URI names the bound IPv4 address rather than `localhost`, which some
/// browsers resolve to `::1` first.
async fn bind_loopback() -> Result<(TcpListener, String), AuthError> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|e| AuthError::ConsentFailed(format!("failed to bind loopback: {e}")))?;
    let addr = listener
        .local_addr()
        .map_err(|e| AuthError::ConsentFailed(e.to_string()))?;
    Ok((listener, format!("http://{addr}/")))
}

/// Token acquisition steps the credential manager delegates to.
#[async_trait]
pub trait OAuthFlow: Send + Sync {
    /// Exchange the refresh token in `credentials` for a fresh access token.
    async fn refresh(&self, credentials: &Credentials) -> Result<Credentials, AuthError>;

    /// Obtain brand-new credentials through user consent.
    async fn consent(&self) -> Result<Credentials, AuthError>;
}

/// OAuth client identity from the Google Cloud console download.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub auth_uri: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Load an `installed` (or `web`) client from a secrets JSON file.
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AuthError::MissingClientSecrets {
                    path: path.display().to_string(),
                })
            }
            Err(e) => {
                return Err(AuthError::InvalidClientSecrets {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        };

        let file: ClientSecretsFile =
            serde_json::from_str(&content).map_err(|e| AuthError::InvalidClientSecrets {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        file.installed
            .or(file.web)
            .ok_or_else(|| AuthError::InvalidClientSecrets {
                path: path.display().to_string(),
                reason: "expected an \"installed\" or \"web\" client".to_string(),
            })
    }
}

// Raw token response from Google's token endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    scope: Option<String>,
}

/// Google OAuth client backed by a client secrets file.
pub struct GoogleOAuth {
    http: Client,
    secrets_path: PathBuf,
    auth_url: String,
    token_url: String,
}

impl GoogleOAuth {
    #[must_use]
    pub fn new(
        http: Client,
        secrets_path: impl Into<PathBuf>,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            secrets_path: secrets_path.into(),
            auth_url: auth_url.into(),
            token_url: token_url.into(),
        }
    }

    fn secrets(&self) -> Result<ClientSecrets, AuthError> {
        ClientSecrets::load(&self.secrets_path)
    }

    fn token_url_for<'a>(&'a self, secrets: &'a ClientSecrets) -> &'a str {
        secrets.token_uri.as_deref().unwrap_or(&self.token_url)
    }

    async fn token_request(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, String> {
        let response = self
            .http
            .post(url)
            .timeout(TOKEN_TIMEOUT)
            .form(form)
            .send()
            .await
            .map_err(|e| format!("token request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("token endpoint returned {status}: {body}"));
        }

        response
            .json()
            .await
            .map_err(|e| format!("failed to parse token response: {e}"))
    }

    async fn exchange_code(
        &self,
        secrets: &ClientSecrets,
        code: &str,
        redirect_uri: &str,
    ) -> Result<Credentials, AuthError> {
        let token = self
            .token_request(
                self.token_url_for(secrets),
                &[
                    ("code", code),
                    ("client_id", &secrets.client_id),
                    ("client_secret", &secrets.client_secret),
                    ("redirect_uri", redirect_uri),
                    ("grant_type", "authorization_code"),
                ],
            )
            .await
            .map_err(AuthError::ConsentFailed)?;

        Ok(Credentials::from_token_response(
            token.access_token,
            token.refresh_token,
            token.expires_in,
            token.scope.as_deref(),
            Utc::now(),
        ))
    }
}

#[async_trait]
impl OAuthFlow for GoogleOAuth {
    async fn refresh(&self, credentials: &Credentials) -> Result<Credentials, AuthError> {
        let refresh_token = credentials
            .refresh_token
            .as_deref()
            .ok_or_else(|| AuthError::RefreshFailed("no refresh token stored".to_string()))?;
        let secrets = self.secrets()?;

        let token = self
            .token_request(
                self.token_url_for(&secrets),
                &[
                    ("refresh_token", refresh_token),
                    ("client_id", &secrets.client_id),
                    ("client_secret", &secrets.client_secret),
                    ("grant_type", "refresh_token"),
                ],
            )
            .await
            .map_err(AuthError::RefreshFailed)?;

        let mut refreshed = Credentials::from_token_response(
            token.access_token,
            // Google doesn't always return a new refresh token on refresh
            token
                .refresh_token
                .or_else(|| credentials.refresh_token.clone()),
            token.expires_in,
            token.scope.as_deref(),
            Utc::now(),
        );
        if refreshed.scopes.is_empty() {
            refreshed.scopes.clone_from(&credentials.scopes);
        }

        info!("Refreshed Google access token");
        Ok(refreshed)
    }

    async fn consent(&self) -> Result<Credentials, AuthError> {
        let secrets = self.secrets()?;

        let (listener, redirect_uri) = bind_loopback().await?;
        let state = uuid::Uuid::new_v4().simple().to_string();

        let auth_base = secrets.auth_uri.as_deref().unwrap_or(&self.auth_url);
        let url = authorization_url(auth_base, &secrets.client_id, &redirect_uri, &state)?;

        println!("\n🔐 Authorize Daily Digest in your browser:\n\n   {url}\n");
        if let Err(e) = webbrowser::open(url.as_str()) {
            warn!(error = %e, "Could not open a browser; open the URL above manually");
        }

        let code = tokio::time::timeout(CONSENT_TIMEOUT, wait_for_code(&listener, &state))
            .await
            .map_err(|_| AuthError::ConsentFailed("timed out waiting for authorization".into()))??;

        let credentials = self.exchange_code(&secrets, &code, &redirect_uri).await?;
        info!("Google authorization complete");
        Ok(credentials)
    }
}

/// Consent URL requesting offline access for [`SCOPES`].
pub fn authorization_url(
    auth_base: &str,
    client_id: &str,
    redirect_uri: &str,
    state: &str,
) -> Result<Url, AuthError> {
    let scope = SCOPES.join(" ");
    Url::parse_with_params(
        auth_base,
        &[
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("state", state),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )
    .map_err(|e| AuthError::ConsentFailed(format!("invalid authorization URL: {e}")))
}

/// Outcome of one redirect hitting the loopback listener.
#[derive(Debug, PartialEq, Eq)]
enum Redirect {
    Code(String),
    Denied(String),
    StateMismatch,
    /// Unrelated request (favicon and the like)
    Ignored,
}

fn parse_redirect(request_line: &str, expected_state: &str) -> Redirect {
    let Some(target) = request_line.split_whitespace().nth(1) else {
        return Redirect::Ignored;
    };
    let Ok(url) = Url::parse(&format!("http://localhost{target}")) else {
        return Redirect::Ignored;
    };

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Redirect::Denied(error);
    }
    match code {
        Some(_) if state.as_deref() != Some(expected_state) => Redirect::StateMismatch,
        Some(code) => Redirect::Code(code),
        None => Redirect::Ignored,
    }
}

async fn wait_for_code(listener: &TcpListener, expected_state: &str) -> Result<String, AuthError> {
    loop {
        let (stream, peer) = listener
            .accept()
            .await
            .map_err(|e| AuthError::ConsentFailed(format!("loopback accept failed: {e}")))?;
        debug!(%peer, "Received loopback connection");

        let (redirect, stream) = read_redirect(stream, expected_state).await?;
        match redirect {
            Redirect::Code(code) => {
                respond(stream, "200 OK", "Authorization complete. You can close this window.")
                    .await;
                return Ok(code);
            }
            Redirect::Denied(error) => {
                respond(stream, "400 Bad Request", "Authorization was denied.").await;
                return Err(AuthError::ConsentFailed(format!("authorization denied: {error}")));
            }
            Redirect::StateMismatch => {
                respond(stream, "400 Bad Request", "Authorization state mismatch.").await;
                return Err(AuthError::ConsentFailed("state mismatch in redirect".into()));
            }
            Redirect::Ignored => respond(stream, "404 Not Found", "Not found.").await,
        }
    }
}

async fn read_redirect(
    stream: TcpStream,
    expected_state: &str,
) -> Result<(Redirect, TcpStream), AuthError> {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .await
        .map_err(|e| AuthError::ConsentFailed(format!("failed to read redirect: {e}")))?;
    Ok((parse_redirect(&request_line, expected_state), reader.into_inner()))
}

async fn respond(mut stream: TcpStream, status: &str, message: &str) {
    let body = format!("<html><body><h3>{message}</h3></body></html>");
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        debug!(error = %e, "Failed to answer loopback request");
    }
}
