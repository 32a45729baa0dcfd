//! Per-client configuration.

use serde::Deserialize;

use crate::signer::Credentials;

/// Placeholder endpoint; concrete game clients substitute their own.
pub const DEFAULT_API_ENDPOINT: &str = "http://localhost:9080/<game>/webapi/";

/// Endpoint, credentials and signing switch for one client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_endpoint")]
    pub api_endpoint: String,
    pub credentials: Credentials,
    /// When false, requests go out unsigned (anonymous endpoints, tests).
    #[serde(default = "default_sign_connection")]
    pub sign_connection: bool,
}

fn default_endpoint() -> String {
    DEFAULT_API_ENDPOINT.to_string()
}

fn default_sign_connection() -> bool {
    true
}

impl ClientConfig {
    pub fn new(
        api_endpoint: impl Into<String>,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
    ) -> Self {
        Self {
            api_endpoint: api_endpoint.into(),
            credentials: Credentials::new(consumer_key, consumer_secret),
            sign_connection: true,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>, token_secret: impl Into<String>) -> Self {
        self.credentials = self.credentials.with_token(token, token_secret);
        self
    }

    pub fn with_sign_connection(mut self, sign_connection: bool) -> Self {
        self.sign_connection = sign_connection;
        self
    }

    /// Join `path` onto the endpoint with exactly one `/` between them.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_endpoint.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
