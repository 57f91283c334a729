//! Credential lifecycle for the calendar/email provider.

use std::sync::Arc;

use tracing::{debug, info};

use super::credentials::{Credentials, TokenStore};
use super::google::OAuthFlow;
use crate::error::AuthError;

/// Loads, refreshes or creates provider credentials.
///
/// The token store is read once per [`acquire`](Self::acquire) and written
/// only when credentials were refreshed or newly granted.
pub struct CredentialManager {
    store: Arc<dyn TokenStore>,
    flow: Arc<dyn OAuthFlow>,
}

impl CredentialManager {
    #[must_use]
    pub fn new(store: Arc<dyn TokenStore>, flow: Arc<dyn OAuthFlow>) -> Self {
        Self { store, flow }
    }

    /// Return usable credentials.
    ///
    /// 1. Stored and valid: returned untouched.
    /// 2. Stored, invalid, refreshable: refreshed once and persisted.
    /// 3. Otherwise: interactive consent, then persisted.
    pub async fn acquire(&self) -> Result<Credentials, AuthError> {
        let stored = self.store.load()?;

        let credentials = match stored {
            Some(creds) if creds.is_valid() => {
                debug!("Using stored credentials");
                return Ok(creds);
            }
            Some(creds) if creds.can_refresh() => {
                info!("Stored credentials expired, refreshing");
                self.flow.refresh(&creds).await?
            }
            Some(_) => {
                info!("Stored credentials unusable and not refreshable, requesting consent");
                self.flow.consent().await?
            }
            None => {
                info!("No stored credentials, requesting consent");
                self.flow.consent().await?
            }
        };

        self.store.save(&credentials)?;
        Ok(credentials)
    }
}
