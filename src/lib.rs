mod apex;
mod auth;
mod client;
mod config;
mod contacts;
mod credentials;
mod error;
mod executor;
mod http;
mod rest;
mod webhooks;

// Core
pub use client::RelayClient;
pub use config::{Config, DEFAULT_API_VERSION, DEFAULT_LOGIN_URL};
pub use credentials::{CredentialStore, Credentials, MemoryCredentialStore};
pub use error::Error;
pub use http::{HttpClient, HttpRequest, HttpResponse, Method};

// Login flow
pub use auth::{AuthClient, TokenResponse, generate_code_verifier, generate_state};

// Domain records
pub use contacts::Contact;
pub use webhooks::Webhook;

// Typed REST surface
pub use rest::{QueryResponse, RestClient, SaveError, SaveResponse, UserInfo, UserInfoUrls};

// Artifact naming conventions
pub use apex::{
    TRIGGER_PREFIX, WEBHOOK_CLASS_NAME, class_body, render_trigger, strip_trigger_prefix,
    target_sobject, trigger_name,
};

// Default HTTP client (behind feature flag)
#[cfg(feature = "reqwest-client")]
pub use http::default_client;
