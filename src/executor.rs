use std::future::Future;

use tracing::{debug, warn};

use crate::client::RelayClient;
use crate::credentials::{CredentialStore, Credentials};
use crate::error::Error;
use crate::http::HttpClient;

impl<S: CredentialStore, H: HttpClient> RelayClient<'_, S, H> {
    /// Run a unit of work with the principal's current credentials.
    ///
    /// The org signals an expired access token only by rejecting a call
    /// ([`Error::SessionExpired`]); there is no proactive expiry tracking.
    /// The first rejection triggers exactly one refresh. The new token is
    /// committed to the store before the unit of work re-runs, so the
    /// retry and every later read observe it. Any other failure, and a
    /// second rejection after the refresh, propagate unchanged.
    pub async fn execute<T, Op, Fut>(&self, operation: Op) -> Result<T, Error>
    where
        Op: Fn(Credentials) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let credentials = self.store.get().await?;
        let refresh_token = credentials.refresh_token.clone();

        match operation(credentials).await {
            Err(Error::SessionExpired) => {
                debug!("access token rejected, refreshing");

                let refreshed = self
                    .auth
                    .refresh_access_token(self.http, &refresh_token)
                    .await
                    .inspect_err(|error| warn!(%error, "token refresh failed"))?;
                self.store
                    .replace_access_token(&refreshed.access_token)
                    .await?;

                debug!("new access token committed, retrying");

                let credentials = self.store.get().await?;
                operation(credentials)
                    .await
                    .inspect_err(|error| warn!(%error, "retry after refresh failed"))
            }
            outcome => outcome,
        }
    }
}
