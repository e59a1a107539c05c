use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::credentials::Credentials;
use crate::error::Error;
use crate::http::{HttpClient, HttpRequest, HttpResponse, Method, USER_AGENT};

/// Error code the org attaches to a 401 when the access token has expired
/// or been revoked.
const INVALID_SESSION_ID: &str = "INVALID_SESSION_ID";

/// One page of SOQL query results.
#[derive(Debug, Deserialize)]
pub struct QueryResponse<T> {
    #[serde(rename = "totalSize")]
    pub total_size: u32,
    /// `false` when the org truncated the page. The `nextRecordsUrl`
    /// continuation is not followed.
    pub done: bool,
    pub records: Vec<T>,
}

/// Result of a create call.
#[derive(Debug, Deserialize)]
pub struct SaveResponse {
    pub id: Option<String>,
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<SaveError>,
}

/// Per-record error detail inside a create response.
#[derive(Debug, Deserialize)]
pub struct SaveError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "statusCode", default)]
    pub status_code: Option<String>,
    #[serde(default)]
    pub fields: Vec<String>,
}

/// Error body entry the data API returns for failed calls; the body is a
/// JSON array of these.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(rename = "errorCode", default)]
    error_code: String,
}

/// Identity of the connected user, from the org's userinfo endpoint.
#[derive(Debug, Deserialize)]
pub struct UserInfo {
    pub user_id: String,
    pub organization_id: String,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub urls: UserInfoUrls,
}

/// API URL templates from the userinfo response. Each carries a literal
/// `{version}` placeholder.
#[derive(Debug, Deserialize)]
pub struct UserInfoUrls {
    pub rest: String,
    pub sobjects: String,
}

impl UserInfoUrls {
    /// Data API root with the placeholder resolved (`63.0` form version).
    pub fn rest_root(&self, version_number: &str) -> String {
        self.rest.replace("{version}", version_number)
    }

    /// SObject API root with the placeholder resolved.
    pub fn sobjects_root(&self, version_number: &str) -> String {
        self.sobjects.replace("{version}", version_number)
    }
}

/// Typed access to the org's data API for one credentialed attempt.
///
/// Cheap and short-lived: construct one per unit of work from the
/// credentials in hand, so a retried attempt picks up a refreshed token.
pub struct RestClient<'a, H: HttpClient> {
    http: &'a H,
    api_version: &'a str,
    credentials: Credentials,
}

impl<'a, H: HttpClient> RestClient<'a, H> {
    pub fn new(http: &'a H, api_version: &'a str, credentials: Credentials) -> Self {
        Self {
            http,
            api_version,
            credentials,
        }
    }

    fn data_url(&self, suffix: &str) -> String {
        format!(
            "{}/services/data/{}/{}",
            self.credentials.instance_url.trim_end_matches('/'),
            self.api_version,
            suffix
        )
    }

    fn request(&self, method: Method, url: String, body: Option<Vec<u8>>) -> HttpRequest {
        let mut headers = vec![
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.credentials.access_token),
            ),
            ("Accept".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), USER_AGENT.to_string()),
        ];

        let body = match body {
            Some(body) => {
                headers.push(("Content-Type".to_string(), "application/json".to_string()));
                body
            }
            None => Vec::new(),
        };

        HttpRequest {
            method,
            url,
            headers,
            body,
        }
    }

    /// Run a SOQL query and decode one page of records.
    pub async fn query<T: DeserializeOwned>(&self, soql: &str) -> Result<QueryResponse<T>, Error> {
        let query_string = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("q", soql)
            .finish();
        let url = self.data_url(&format!("query?{query_string}"));

        let response = self.http.send(self.request(Method::Get, url, None)).await?;

        match response.status {
            200 => decode("query response", &response.body),
            _ => Err(interpret_failure("query", &response)),
        }
    }

    /// Create an sobject record. The org's `success` flag is checked in
    /// addition to the HTTP status.
    pub async fn create(
        &self,
        sobject_type: &str,
        record: &impl Serialize,
    ) -> Result<SaveResponse, Error> {
        let url = self.data_url(&format!("sobjects/{sobject_type}"));
        let body = encode_body(record)?;

        let response = self
            .http
            .send(self.request(Method::Post, url, Some(body)))
            .await?;

        match response.status {
            200 | 201 => {
                let saved: SaveResponse = decode("save response", &response.body)?;
                if saved.success {
                    Ok(saved)
                } else {
                    Err(Error::RemoteCall {
                        operation: "create",
                        status: response.status,
                        detail: saved.errors.first().and_then(|e| e.message.clone()),
                    })
                }
            }
            _ => Err(interpret_failure("create", &response)),
        }
    }

    /// Update fields of an sobject record in place. 204 on success.
    pub async fn update(
        &self,
        sobject_type: &str,
        id: &str,
        record: &impl Serialize,
    ) -> Result<(), Error> {
        let url = self.data_url(&format!("sobjects/{sobject_type}/{id}"));
        let body = encode_body(record)?;

        let response = self
            .http
            .send(self.request(Method::Patch, url, Some(body)))
            .await?;

        match response.status {
            204 => Ok(()),
            _ => Err(interpret_failure("update", &response)),
        }
    }

    /// Delete an sobject record. 204 on success.
    pub async fn delete(&self, sobject_type: &str, id: &str) -> Result<(), Error> {
        let url = self.data_url(&format!("sobjects/{sobject_type}/{id}"));

        let response = self
            .http
            .send(self.request(Method::Delete, url, None))
            .await?;

        match response.status {
            204 => Ok(()),
            _ => Err(interpret_failure("delete", &response)),
        }
    }

    /// Identity of the connected user, including the org's API URL
    /// templates.
    pub async fn user_info(&self) -> Result<UserInfo, Error> {
        let url = format!(
            "{}/services/oauth2/userinfo",
            self.credentials.instance_url.trim_end_matches('/')
        );

        let response = self.http.send(self.request(Method::Get, url, None)).await?;

        match response.status {
            200 => decode("user info", &response.body),
            // The userinfo endpoint reports an expired token as a bare 403
            // instead of the data API's 401 error array.
            403 if response.body == b"Bad_OAuth_Token" => Err(Error::SessionExpired),
            _ => Err(interpret_failure("user info", &response)),
        }
    }
}

fn decode<T: DeserializeOwned>(context: &'static str, body: &[u8]) -> Result<T, Error> {
    serde_json::from_slice(body).map_err(|e| Error::Decode {
        context,
        detail: e.to_string(),
    })
}

fn encode_body(record: &impl Serialize) -> Result<Vec<u8>, Error> {
    serde_json::to_vec(record).map_err(|e| Error::Decode {
        context: "request body",
        detail: e.to_string(),
    })
}

/// Map a non-success data API response onto the error taxonomy. A 401
/// carrying `INVALID_SESSION_ID` is the expired-session signal the executor
/// refreshes and retries on; everything else stays a terminal failure of
/// the named operation.
fn interpret_failure(operation: &'static str, response: &HttpResponse) -> Error {
    match serde_json::from_slice::<Vec<ApiErrorBody>>(&response.body) {
        Ok(errors) => {
            if response.status == 401
                && errors.iter().any(|e| e.error_code == INVALID_SESSION_ID)
            {
                return Error::SessionExpired;
            }
            Error::RemoteCall {
                operation,
                status: response.status,
                detail: errors
                    .into_iter()
                    .map(|e| e.message)
                    .find(|message| !message.is_empty()),
            }
        }
        Err(_) => Error::UnexpectedResponse {
            status: response.status,
            body: String::from_utf8_lossy(&response.body).into_owned(),
        },
    }
}
