#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The org rejected the current access token (HTTP 401 with the
    /// `INVALID_SESSION_ID` error code). Handled inside the executor with a
    /// single refresh-and-retry; surfaces only when the retried call is
    /// rejected again.
    #[error("session expired or invalid")]
    SessionExpired,

    /// The token endpoint rejected the refresh token itself. Fatal for the
    /// current operation: the user has to go through the login flow again.
    #[error("token refresh rejected: {code}")]
    AuthRefresh {
        code: String,
        description: Option<String>,
    },

    /// The token endpoint rejected a login-time authorization code exchange
    /// (standard OAuth2 error JSON, RFC 6749 Section 5.2).
    #[error("OAuth2 error: {code}")]
    OAuthRequest {
        code: String,
        description: Option<String>,
    },

    /// A query/create/update/delete call came back non-success. Carries the
    /// failed operation name so callers can map it to a user-visible message
    /// without inspecting org-specific text.
    #[error("{operation} failed (HTTP {status})")]
    RemoteCall {
        operation: &'static str,
        status: u16,
        detail: Option<String>,
    },

    /// A required field or setting was missing. Raised before any remote
    /// call is made.
    #[error("missing required field: {field}")]
    Validation { field: &'static str },

    /// Network / transport error from the HTTP client.
    #[error("HTTP request failed: {0}")]
    Http(#[from] Box<dyn std::error::Error + Send + Sync>),

    /// A response that is neither a success nor a recognised error shape.
    #[error("unexpected response (HTTP {status})")]
    UnexpectedResponse { status: u16, body: String },

    /// A response body did not match the expected shape.
    #[error("could not decode {context}: {detail}")]
    Decode {
        context: &'static str,
        detail: String,
    },
}
