//! Authentication for the calendar/email provider.
//!
//! Provides the token store, the Google OAuth flows and the credential
//! manager that ties them together.

mod credentials;
mod google;
mod manager;

pub use credentials::{Credentials, FileTokenStore, TokenStore, EXPIRY_SKEW_SECS};
pub use google::{authorization_url, ClientSecrets, GoogleOAuth, OAuthFlow, SCOPES};
pub use manager::CredentialManager;
