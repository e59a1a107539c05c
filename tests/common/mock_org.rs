#![allow(dead_code)]

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use action_relay::{Config, Credentials, MemoryCredentialStore};

pub const API_VERSION: &str = "v63.0";

/// A mock Salesforce org built on `wiremock`. Serves both the OAuth2
/// endpoints derived from the login URL and the per-instance data API;
/// in production those live on different hosts, here they share one.
pub struct MockOrg {
    server: MockServer,
}

impl MockOrg {
    /// Start a new mock org on a random available port.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL, used as both login URL and instance URL in tests.
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Connected App configuration pointing at this org.
    pub fn config(&self) -> Config {
        let mut config = Config::new("test-consumer-key");
        config.login_url = self.url();
        config.redirect_uri = Some("https://relay.example.com/callback".to_string());
        config
    }

    /// A store primed with a token the org may or may not still accept.
    pub fn store_with_token(&self, access_token: &str) -> MemoryCredentialStore {
        MemoryCredentialStore::new(Credentials {
            access_token: access_token.to_string(),
            refresh_token: "refresh-token-1".to_string(),
            instance_url: self.url(),
            user_id: "005xx000001X8Uz".to_string(),
        })
    }

    fn identity_url(&self) -> String {
        format!("{}/id/00Dxx0000001gPL/005xx000001X8Uz", self.url())
    }

    /// Token endpoint answers every request with a refresh-style success
    /// (no refresh token in the body).
    pub async fn mock_token_success(&self, access_token: &str) {
        let body = serde_json::json!({
            "access_token": access_token,
            "instance_url": self.url(),
            "id": self.identity_url(),
            "token_type": "Bearer",
            "issued_at": "1755800000000",
        });
        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&self.server)
            .await;
    }

    /// Token endpoint answers with a login-style success carrying a
    /// refresh token, as an authorization code exchange would.
    pub async fn mock_login_success(&self, access_token: &str) {
        let body = serde_json::json!({
            "access_token": access_token,
            "refresh_token": "refresh-token-1",
            "instance_url": self.url(),
            "id": self.identity_url(),
            "token_type": "Bearer",
            "scope": "api refresh_token id",
            "issued_at": "1755800000000",
        });
        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&self.server)
            .await;
    }

    /// Token endpoint rejects every request with standard OAuth2 error
    /// JSON (HTTP 400).
    pub async fn mock_token_error(&self, error_code: &str, description: &str) {
        let body = serde_json::json!({
            "error": error_code,
            "error_description": description,
        });
        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(&body))
            .mount(&self.server)
            .await;
    }

    /// Revocation endpoint accepts every request.
    pub async fn mock_revocation_success(&self) {
        Mock::given(method("POST"))
            .and(path("/services/oauth2/revoke"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.server)
            .await;
    }

    /// Serve one page of results for the given SOQL statement.
    pub async fn mock_query(&self, soql: &str, page: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/services/data/{API_VERSION}/query")))
            .and(query_param("q", soql))
            .respond_with(ResponseTemplate::new(200).set_body_json(&page))
            .mount(&self.server)
            .await;
    }

    /// Reject the given SOQL statement's first call as an expired session,
    /// then serve the page.
    pub async fn mock_query_expired_once(&self, soql: &str, page: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/services/data/{API_VERSION}/query")))
            .and(query_param("q", soql))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(&session_expired_body()),
            )
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("/services/data/{API_VERSION}/query")))
            .and(query_param("q", soql))
            .respond_with(ResponseTemplate::new(200).set_body_json(&page))
            .with_priority(2)
            .mount(&self.server)
            .await;
    }

    /// Reject every call of the given SOQL statement as an expired session.
    pub async fn mock_query_expired(&self, soql: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/services/data/{API_VERSION}/query")))
            .and(query_param("q", soql))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(&session_expired_body()),
            )
            .mount(&self.server)
            .await;
    }

    /// Accept creates of the given sobject type, answering with the id.
    pub async fn mock_create(&self, sobject: &str, id: &str) {
        let body = serde_json::json!({"id": id, "success": true, "errors": []});
        Mock::given(method("POST"))
            .and(path(format!(
                "/services/data/{API_VERSION}/sobjects/{sobject}"
            )))
            .respond_with(ResponseTemplate::new(201).set_body_json(&body))
            .mount(&self.server)
            .await;
    }

    /// Accept updates of one record (HTTP 204).
    pub async fn mock_update(&self, sobject: &str, id: &str) {
        Mock::given(method("PATCH"))
            .and(path(format!(
                "/services/data/{API_VERSION}/sobjects/{sobject}/{id}"
            )))
            .respond_with(ResponseTemplate::new(204))
            .mount(&self.server)
            .await;
    }

    /// Reject updates of one record with a data API error array.
    pub async fn mock_update_rejected(
        &self,
        sobject: &str,
        id: &str,
        message: &str,
        error_code: &str,
    ) {
        let body = serde_json::json!([{"message": message, "errorCode": error_code}]);
        Mock::given(method("PATCH"))
            .and(path(format!(
                "/services/data/{API_VERSION}/sobjects/{sobject}/{id}"
            )))
            .respond_with(ResponseTemplate::new(400).set_body_json(&body))
            .mount(&self.server)
            .await;
    }

    /// Accept deletes of one record (HTTP 204).
    pub async fn mock_delete(&self, sobject: &str, id: &str) {
        Mock::given(method("DELETE"))
            .and(path(format!(
                "/services/data/{API_VERSION}/sobjects/{sobject}/{id}"
            )))
            .respond_with(ResponseTemplate::new(204))
            .mount(&self.server)
            .await;
    }

    /// Serve the userinfo endpoint with this org's URL templates.
    pub async fn mock_userinfo(&self) {
        let body = serde_json::json!({
            "user_id": "005xx000001X8Uz",
            "organization_id": "00Dxx0000001gPL",
            "preferred_username": "relay@example.com",
            "name": "Relay Integration",
            "urls": {
                "rest": format!("{}/services/data/v{{version}}/", self.url()),
                "sobjects": format!("{}/services/data/v{{version}}/sobjects/", self.url()),
            }
        });
        Mock::given(method("GET"))
            .and(path("/services/oauth2/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&self.server)
            .await;
    }

    /// All received requests whose path starts with `prefix`, in order.
    pub async fn requests_to(&self, prefix: &str) -> Vec<Request> {
        self.server
            .received_requests()
            .await
            .expect("request recording enabled")
            .into_iter()
            .filter(|request| request.url.path().starts_with(prefix))
            .collect()
    }

    /// Bearer tokens presented to paths under `prefix`, in arrival order.
    pub async fn bearer_tokens(&self, prefix: &str) -> Vec<String> {
        self.requests_to(prefix)
            .await
            .iter()
            .filter_map(|request| request.headers.get("authorization"))
            .map(|value| {
                value
                    .to_str()
                    .expect("header should be UTF-8")
                    .trim_start_matches("Bearer ")
                    .to_string()
            })
            .collect()
    }

    /// Assert that the last token-endpoint request contained the expected
    /// form-urlencoded parameters in its body.
    pub async fn verify_token_request(&self, expected_params: &[(&str, &str)]) {
        let requests = self.requests_to("/services/oauth2/token").await;
        let last = requests.last().expect("expected at least one token request");
        let body_str = String::from_utf8(last.body.clone()).expect("body should be UTF-8");
        let parsed: Vec<(String, String)> = url::form_urlencoded::parse(body_str.as_bytes())
            .into_owned()
            .collect();

        for (key, value) in expected_params {
            let found = parsed.iter().any(|(k, v)| k == key && v == value);
            assert!(
                found,
                "expected form param {}={} in token request body, got: {}",
                key, value, body_str
            );
        }
    }

    /// Assert that the last token-endpoint request carried Basic auth with
    /// the expected credentials.
    pub async fn verify_basic_auth(&self, client_id: &str, client_secret: &str) {
        use base64::Engine;
        let requests = self.requests_to("/services/oauth2/token").await;
        let last = requests.last().expect("expected at least one token request");
        let auth_header = last
            .headers
            .get("authorization")
            .expect("expected Authorization header");
        let expected_credentials = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", client_id, client_secret));
        let expected = format!("Basic {}", expected_credentials);
        assert_eq!(
            auth_header.to_str().unwrap(),
            expected,
            "Basic auth credentials mismatch"
        );
    }
}

fn session_expired_body() -> serde_json::Value {
    serde_json::json!([{
        "message": "Session expired or invalid",
        "errorCode": "INVALID_SESSION_ID"
    }])
}
