use std::env;

use crate::error::Error;

/// Production login host. Sandboxes use `https://test.salesforce.com`.
pub const DEFAULT_LOGIN_URL: &str = "https://login.salesforce.com";

/// REST API version requests are issued against, in `v63.0` form.
pub const DEFAULT_API_VERSION: &str = "v63.0";

/// Connected App settings, built once at startup and shared by reference.
/// Nothing here is re-read from the environment after construction.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the authentication host. OAuth2 endpoints are derived
    /// from it; the data API lives on the per-org instance URL instead.
    pub login_url: String,
    /// Consumer Key of the Connected App.
    pub client_id: String,
    /// Consumer Secret. `None` for public clients, which send their client
    /// id in the request body instead of Basic auth.
    pub client_secret: Option<String>,
    /// Redirect URI registered with the Connected App. Only the login flow
    /// uses it.
    pub redirect_uri: Option<String>,
    /// API version in `v63.0` form.
    pub api_version: String,
}

impl Config {
    /// Minimal configuration for a public client against the production
    /// login host.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            login_url: DEFAULT_LOGIN_URL.to_string(),
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri: None,
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Read settings from `SALESFORCE_*` environment variables.
    ///
    /// `SALESFORCE_CONSUMER_KEY` is required. `SALESFORCE_CONSUMER_SECRET`
    /// and `SALESFORCE_REDIRECT_URI` are optional; `SALESFORCE_LOGIN_URL`
    /// and `SALESFORCE_API_VERSION` fall back to the defaults above.
    pub fn from_env() -> Result<Self, Error> {
        let client_id = env::var("SALESFORCE_CONSUMER_KEY").map_err(|_| Error::Validation {
            field: "SALESFORCE_CONSUMER_KEY",
        })?;

        Ok(Self {
            login_url: env::var("SALESFORCE_LOGIN_URL")
                .unwrap_or_else(|_| DEFAULT_LOGIN_URL.to_string()),
            client_id,
            client_secret: env::var("SALESFORCE_CONSUMER_SECRET").ok(),
            redirect_uri: env::var("SALESFORCE_REDIRECT_URI").ok(),
            api_version: env::var("SALESFORCE_API_VERSION")
                .unwrap_or_else(|_| DEFAULT_API_VERSION.to_string()),
        })
    }

    /// The version with its `v` prefix trimmed, as Apex artifact bodies and
    /// identity URL templates expect (`63.0`).
    pub fn api_version_number(&self) -> &str {
        self.api_version.trim_start_matches('v')
    }

    pub fn authorization_endpoint(&self) -> String {
        format!(
            "{}/services/oauth2/authorize",
            self.login_url.trim_end_matches('/')
        )
    }

    pub fn token_endpoint(&self) -> String {
        format!(
            "{}/services/oauth2/token",
            self.login_url.trim_end_matches('/')
        )
    }

    pub fn revocation_endpoint(&self) -> String {
        format!(
            "{}/services/oauth2/revoke",
            self.login_url.trim_end_matches('/')
        )
    }
}
