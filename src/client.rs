use crate::auth::AuthClient;
use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::error::Error;
use crate::http::HttpClient;
use crate::rest::{RestClient, UserInfo};

/// Client for one authenticated principal's org.
///
/// Generic over the credential store (durable identity storage belongs to
/// the embedding application) and the HTTP transport. Construction is
/// cheap; nothing talks to the org until an operation runs.
pub struct RelayClient<'a, S: CredentialStore, H: HttpClient> {
    pub(crate) config: &'a Config,
    pub(crate) store: &'a S,
    pub(crate) http: &'a H,
    pub(crate) auth: AuthClient,
}

impl<'a, S: CredentialStore, H: HttpClient> RelayClient<'a, S, H> {
    pub fn new(config: &'a Config, store: &'a S, http: &'a H) -> Self {
        Self {
            config,
            store,
            http,
            auth: AuthClient::new(config),
        }
    }

    /// OAuth2 client for the login flow (authorization URL, code exchange)
    /// and logout-time revocation.
    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    /// Identity of the connected user together with the org's API URL
    /// templates.
    pub async fn user_info(&self) -> Result<UserInfo, Error> {
        self.execute(|credentials| async move {
            RestClient::new(self.http, &self.config.api_version, credentials)
                .user_info()
                .await
        })
        .await
    }
}

#[cfg(feature = "reqwest-client")]
impl<'a, S: CredentialStore> RelayClient<'a, S, reqwest::Client> {
    /// Client backed by the shared default `reqwest` client.
    pub fn with_default_client(config: &'a Config, store: &'a S) -> Self {
        Self::new(config, store, crate::http::default_client())
    }
}
