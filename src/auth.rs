use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::credentials::Credentials;
use crate::error::Error;
use crate::http::{HttpClient, HttpRequest, Method, USER_AGENT};

/// Generate a cryptographically random CSRF state parameter.
/// 32 random bytes, base64url-encoded without padding (43 chars).
pub fn generate_state() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a cryptographically random PKCE code verifier.
/// 32 random bytes, base64url-encoded without padding (43 chars).
pub fn generate_code_verifier() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// S256 code challenge (RFC 7636): SHA-256 hash of the verifier,
/// base64url-encoded without padding.
fn create_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Successful token-endpoint response.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Present on login-time exchanges when the `refresh_token` scope was
    /// granted; refresh responses usually omit it.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Per-org base URL for the data API.
    #[serde(default)]
    pub instance_url: Option<String>,
    /// Identity URL, `https://login.salesforce.com/id/<org id>/<user id>`.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub issued_at: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"***")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "***"))
            .field("instance_url", &self.instance_url)
            .field("id", &self.id)
            .field("token_type", &self.token_type)
            .finish()
    }
}

impl TokenResponse {
    /// User id: the trailing path segment of the identity URL.
    pub fn user_id(&self) -> Option<&str> {
        self.id
            .as_deref()?
            .rsplit('/')
            .find(|segment| !segment.is_empty())
    }

    /// Build session credentials from a login-time exchange. Requires the
    /// refresh token, instance URL and identity URL to all be present,
    /// which Salesforce guarantees when the `refresh_token` scope was
    /// granted.
    pub fn into_credentials(self) -> Result<Credentials, Error> {
        fn missing(field: &'static str) -> Error {
            Error::Decode {
                context: "token response",
                detail: format!("missing {field}"),
            }
        }

        let user_id = self.user_id().ok_or_else(|| missing("id"))?.to_string();

        Ok(Credentials {
            access_token: self.access_token,
            refresh_token: self.refresh_token.ok_or_else(|| missing("refresh_token"))?,
            instance_url: self.instance_url.ok_or_else(|| missing("instance_url"))?,
            user_id,
        })
    }
}

/// Error JSON the token endpoint returns with 400/401 (RFC 6749 §5.2).
#[derive(Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Build a form-encoded OAuth2 POST request.
/// Sets Content-Type, Accept: application/json and the crate User-Agent.
fn create_oauth2_request(endpoint: &str, body: &[(String, String)]) -> HttpRequest {
    let encoded_body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(body)
        .finish();

    HttpRequest {
        method: Method::Post,
        url: endpoint.to_string(),
        headers: vec![
            (
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            ),
            ("Accept".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), USER_AGENT.to_string()),
        ],
        body: encoded_body.into_bytes(),
    }
}

/// Encode client credentials as HTTP Basic auth header value.
/// Returns `Basic <base64(client_id:client_secret)>`.
fn encode_basic_credentials(client_id: &str, client_secret: &str) -> String {
    let credentials = format!("{client_id}:{client_secret}");
    let encoded = base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());
    format!("Basic {encoded}")
}

/// OAuth2 client for a Connected App's login and token endpoints.
///
/// Owns the endpoint URLs derived from the configured login host; the data
/// API is addressed per org through [`Credentials::instance_url`] instead.
pub struct AuthClient {
    client_id: String,
    /// None for public clients (credentials sent in body).
    /// Some for confidential clients (credentials sent via Basic auth).
    client_secret: Option<String>,
    redirect_uri: Option<String>,
    authorization_endpoint: String,
    token_endpoint: String,
    revocation_endpoint: String,
}

impl AuthClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            authorization_endpoint: config.authorization_endpoint(),
            token_endpoint: config.token_endpoint(),
            revocation_endpoint: config.revocation_endpoint(),
        }
    }

    /// Build the authorization URL the user is redirected to.
    ///
    /// Salesforce requires PKCE with the S256 challenge method. Store
    /// `state` and `code_verifier` in the user's session before
    /// redirecting; both are needed to validate the callback.
    pub fn create_authorization_url(
        &self,
        state: &str,
        code_verifier: &str,
        scopes: &[&str],
    ) -> Url {
        let mut url =
            Url::parse(&self.authorization_endpoint).expect("invalid authorization endpoint URL");

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("state", state);

        if !scopes.is_empty() {
            url.query_pairs_mut()
                .append_pair("scope", &scopes.join(" "));
        }

        if let Some(ref redirect_uri) = self.redirect_uri {
            url.query_pairs_mut()
                .append_pair("redirect_uri", redirect_uri);
        }

        url.query_pairs_mut()
            .append_pair("code_challenge", &create_code_challenge(code_verifier))
            .append_pair("code_challenge_method", "S256");

        url
    }

    /// Exchange an authorization code for tokens (login-time federation).
    pub async fn validate_authorization_code(
        &self,
        http_client: &impl HttpClient,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, Error> {
        let mut body = vec![
            ("grant_type".to_string(), "authorization_code".to_string()),
            ("code".to_string(), code.to_string()),
            ("code_verifier".to_string(), code_verifier.to_string()),
        ];

        if let Some(ref redirect_uri) = self.redirect_uri {
            body.push(("redirect_uri".to_string(), redirect_uri.clone()));
        }

        self.send_token_request(http_client, body, |code, description| {
            Error::OAuthRequest { code, description }
        })
        .await
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// A rejection here is fatal for the session: the refresh token itself
    /// is invalid or revoked and the user has to log in again.
    pub async fn refresh_access_token(
        &self,
        http_client: &impl HttpClient,
        refresh_token: &str,
    ) -> Result<TokenResponse, Error> {
        debug!("exchanging refresh token for a new access token");

        let body = vec![
            ("grant_type".to_string(), "refresh_token".to_string()),
            ("refresh_token".to_string(), refresh_token.to_string()),
        ];

        self.send_token_request(http_client, body, |code, description| Error::AuthRefresh {
            code,
            description,
        })
        .await
    }

    /// Revoke an access or refresh token (RFC 7009). Used at logout.
    pub async fn revoke_token(
        &self,
        http_client: &impl HttpClient,
        token: &str,
    ) -> Result<(), Error> {
        let mut body = vec![("token".to_string(), token.to_string())];

        if self.client_secret.is_none() {
            body.push(("client_id".to_string(), self.client_id.clone()));
        }

        let mut request = create_oauth2_request(&self.revocation_endpoint, &body);

        if let Some(ref secret) = self.client_secret {
            request.headers.push((
                "Authorization".to_string(),
                encode_basic_credentials(&self.client_id, secret),
            ));
        }

        let response = http_client.send(request).await?;

        match response.status {
            200 => Ok(()),
            status => Err(Error::UnexpectedResponse {
                status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            }),
        }
    }

    /// Send a token request and interpret the response.
    /// - 200 -> Ok(TokenResponse)
    /// - 400/401 with valid error JSON -> Err(reject(code, description))
    /// - Anything else -> Err(Error::UnexpectedResponse { .. })
    async fn send_token_request(
        &self,
        http_client: &impl HttpClient,
        mut body: Vec<(String, String)>,
        reject: fn(String, Option<String>) -> Error,
    ) -> Result<TokenResponse, Error> {
        if self.client_secret.is_none() {
            body.push(("client_id".to_string(), self.client_id.clone()));
        }

        let mut request = create_oauth2_request(&self.token_endpoint, &body);

        if let Some(ref secret) = self.client_secret {
            request.headers.push((
                "Authorization".to_string(),
                encode_basic_credentials(&self.client_id, secret),
            ));
        }

        let response = http_client.send(request).await?;

        match response.status {
            200 => serde_json::from_slice(&response.body).map_err(|e| Error::Decode {
                context: "token response",
                detail: e.to_string(),
            }),
            400 | 401 => match serde_json::from_slice::<OAuthErrorBody>(&response.body) {
                Ok(oauth_error) => Err(reject(oauth_error.error, oauth_error.error_description)),
                Err(_) => Err(Error::UnexpectedResponse {
                    status: response.status,
                    body: String::from_utf8_lossy(&response.body).into_owned(),
                }),
            },
            status => Err(Error::UnexpectedResponse {
                status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            }),
        }
    }
}
