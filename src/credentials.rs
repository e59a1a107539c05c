use std::fmt;
use std::future::Future;
use std::sync::{PoisonError, RwLock};

use crate::error::Error;

/// Tokens and org coordinates for one authenticated principal.
///
/// `Clone` is cheap enough to hand a snapshot to every attempt of a unit of
/// work; the store remains the source of truth between attempts.
#[derive(Clone)]
pub struct Credentials {
    /// Short-lived bearer token for the data API.
    pub access_token: String,
    /// Long-lived token exchanged for a new access token on expiry.
    pub refresh_token: String,
    /// Per-org base URL all data API calls go to.
    pub instance_url: String,
    /// Id of the authenticated user.
    pub user_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"***")
            .field("refresh_token", &"***")
            .field("instance_url", &self.instance_url)
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// Durable storage for one principal's credentials.
///
/// The executor reads from the store before every attempt and writes back
/// through [`replace_access_token`](CredentialStore::replace_access_token)
/// after a refresh, so implementations backed by a session or database make
/// the new token visible to later requests too.
pub trait CredentialStore: Send + Sync {
    /// Current credentials for the principal.
    fn get(&self) -> impl Future<Output = Result<Credentials, Error>> + Send;

    /// Install a freshly issued access token. Every subsequent
    /// [`get`](CredentialStore::get) must observe it.
    fn replace_access_token(
        &self,
        new_token: &str,
    ) -> impl Future<Output = Result<(), Error>> + Send;
}

/// Process-local store for single-principal tools and tests.
///
/// Concurrent replacements are last-writer-wins on the access token; either
/// winner is a token the org accepts.
pub struct MemoryCredentialStore {
    inner: RwLock<Credentials>,
}

impl MemoryCredentialStore {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            inner: RwLock::new(credentials),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn get(&self) -> Result<Credentials, Error> {
        Ok(self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn replace_access_token(&self, new_token: &str) -> Result<(), Error> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .access_token = new_token.to_string();
        Ok(())
    }
}
