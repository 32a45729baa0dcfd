//! Signed JSON request executor shared by all word-game clients.
//!
//! # Design
//! `WordGameClient` owns the configuration and three collaborators: the
//! `HttpTransport` that does the I/O, the `Signer` that authenticates each
//! request, and the `ErrorRegistry` that rebuilds server errors. Each call
//! is split into a `build_*` method that produces a signed `HttpRequest` and
//! a `parse_*` method that consumes the `HttpResponse`; the `get_*`/`post_*`
//! operations run both halves around one `execute`. Hosts that do their own
//! I/O can call the halves directly.
//!
//! Only status 200 counts as success. Any other status is handed to the
//! error registry, and the rebuilt error is returned. Responses are owned by
//! the parse step and dropped on every path, which releases the connection.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::reconstruct::ErrorRegistry;
use crate::signer::{OAuth1Signer, Signer};
use crate::transport::UreqTransport;

pub const CHARSET: &str = "UTF-8";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Observer for every response body the client buffers, success or error.
pub type ResponseTap = Arc<dyn Fn(u16, &[u8]) + Send + Sync>;

/// Client for a word-game web API.
///
/// Configuration setters take `&mut self`; share a client across threads
/// behind a lock if it must be reconfigured while calls are in flight.
pub struct WordGameClient {
    config: ClientConfig,
    transport: Box<dyn HttpTransport>,
    signer: Box<dyn Signer>,
    errors: ErrorRegistry,
    tap: Option<ResponseTap>,
}

impl WordGameClient {
    /// Client with the ureq transport, OAuth 1.0a signing and the common
    /// server error kinds.
    pub fn new(config: ClientConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: ClientConfig) -> WordGameClientBuilder {
        WordGameClientBuilder {
            config,
            transport: None,
            signer: None,
            errors: None,
            tap: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api_endpoint(&self) -> &str {
        &self.config.api_endpoint
    }

    pub fn set_api_endpoint(&mut self, api_endpoint: impl Into<String>) {
        self.config.api_endpoint = api_endpoint.into();
    }

    pub fn sign_connection(&self) -> bool {
        self.config.sign_connection
    }

    /// When true, every call is signed with the stored credentials.
    pub fn set_sign_connection(&mut self, sign_connection: bool) {
        self.config.sign_connection = sign_connection;
    }

    pub fn endpoint_url(&self, path: &str) -> String {
        self.config.endpoint_url(path)
    }

    pub fn error_registry(&self) -> &ErrorRegistry {
        &self.errors
    }

    pub fn error_registry_mut(&mut self) -> &mut ErrorRegistry {
        &mut self.errors
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// GET `url`, expecting 200 and ignoring the body.
    pub fn get_empty(&self, url: &str) -> Result<()> {
        debug!(url, "GETting url");
        let response = self.execute(self.build_get(url)?)?;
        self.parse_empty(response)
    }

    /// GET `url` and decode the JSON body.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url, "GETting url");
        let response = self.execute(self.build_get(url)?)?;
        self.parse_json(response)
    }

    /// POST to `url` without a body, expecting 200.
    pub fn post_empty(&self, url: &str) -> Result<()> {
        debug!(url, "POSTing url");
        let response = self.execute(self.build_post(url)?)?;
        self.parse_empty(response)
    }

    /// POST `body` as JSON, expecting 200 and ignoring the response body.
    pub fn post_json<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<()> {
        debug!(url, "POSTing object");
        let response = self.execute(self.build_post_json(url, body)?)?;
        self.parse_empty(response)
    }

    /// POST `body` as JSON and decode the JSON response.
    pub fn post_json_read<B, T>(&self, url: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(url, "POSTing object");
        let response = self.execute(self.build_post_json(url, body)?)?;
        self.parse_json(response)
    }

    /// POST to `url` without a body and decode the JSON response.
    pub fn post_read<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url, "POSTing url");
        let response = self.execute(self.build_post_read(url)?)?;
        self.parse_json(response)
    }

    fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.transport.execute(&request)?;
        debug!(status = response.status, "Response code");
        Ok(response)
    }

    // -----------------------------------------------------------------------
    // Request building
    // -----------------------------------------------------------------------

    pub fn build_get(&self, url: &str) -> Result<HttpRequest> {
        self.prepare(HttpRequest::new(HttpMethod::Get, url))
    }

    pub fn build_post(&self, url: &str) -> Result<HttpRequest> {
        self.prepare(HttpRequest::new(HttpMethod::Post, url))
    }

    pub fn build_post_json<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<HttpRequest> {
        let mut request = HttpRequest::new(HttpMethod::Post, url);
        request.set_header("Content-Type", JSON_CONTENT_TYPE);
        request.body = Some(to_json_omitting_nulls(body)?);
        self.prepare(request)
    }

    pub fn build_post_read(&self, url: &str) -> Result<HttpRequest> {
        let mut request = HttpRequest::new(HttpMethod::Post, url);
        request.set_header("Content-Type", JSON_CONTENT_TYPE);
        self.prepare(request)
    }

    /// Add the common headers and sign last, once the body is in place.
    fn prepare(&self, mut request: HttpRequest) -> Result<HttpRequest> {
        request.set_header("Accept-Charset", CHARSET);
        if self.config.sign_connection {
            self.signer.sign(&mut request, &self.config.credentials)?;
        }
        Ok(request)
    }

    // -----------------------------------------------------------------------
    // Response parsing
    // -----------------------------------------------------------------------

    /// Accept a 200 response and discard its body.
    pub fn parse_empty(&self, response: HttpResponse) -> Result<()> {
        if response.status != 200 {
            return Err(self.server_error(response));
        }
        Ok(())
    }

    /// Accept a 200 response and decode its body into `T`.
    pub fn parse_json<T: DeserializeOwned>(&self, mut response: HttpResponse) -> Result<T> {
        if response.status != 200 {
            return Err(self.server_error(response));
        }
        let body = response.read_body()?;
        drop(response);
        self.observe(200, &body);
        serde_json::from_slice(&body).map_err(ClientError::Decode)
    }

    fn server_error(&self, mut response: HttpResponse) -> ClientError {
        debug!(status = response.status, "Processing error...");
        let status = response.status;
        let body = match response.read_body() {
            Ok(body) => body,
            Err(e) => return e,
        };
        drop(response);
        self.observe(status, &body);
        self.errors.reconstruct_body(status, &body)
    }

    fn observe(&self, status: u16, body: &[u8]) {
        debug!(status, body = %String::from_utf8_lossy(body), "Response");
        if let Some(tap) = &self.tap {
            tap(status, body);
        }
    }
}

impl fmt::Debug for WordGameClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordGameClient")
            .field("config", &self.config)
            .field("errors", &self.errors)
            .field("tap", &self.tap.is_some())
            .finish_non_exhaustive()
    }
}

/// Serialize `body`, dropping object members whose value is `null`.
pub fn to_json_omitting_nulls<B: Serialize + ?Sized>(body: &B) -> Result<Vec<u8>> {
    let mut value = serde_json::to_value(body).map_err(ClientError::Encode)?;
    strip_nulls(&mut value);
    serde_json::to_vec(&value).map_err(ClientError::Encode)
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

/// Assembles a `WordGameClient` from its collaborators.
pub struct WordGameClientBuilder {
    config: ClientConfig,
    transport: Option<Box<dyn HttpTransport>>,
    signer: Option<Box<dyn Signer>>,
    errors: Option<ErrorRegistry>,
    tap: Option<ResponseTap>,
}

impl WordGameClientBuilder {
    pub fn transport(mut self, transport: impl HttpTransport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    pub fn signer(mut self, signer: impl Signer + 'static) -> Self {
        self.signer = Some(Box::new(signer));
        self
    }

    pub fn error_registry(mut self, errors: ErrorRegistry) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn response_tap<F>(mut self, tap: F) -> Self
    where
        F: Fn(u16, &[u8]) + Send + Sync + 'static,
    {
        self.tap = Some(Arc::new(tap));
        self
    }

    pub fn build(self) -> WordGameClient {
        WordGameClient {
            config: self.config,
            transport: self
                .transport
                .unwrap_or_else(|| Box::new(UreqTransport::new())),
            signer: self.signer.unwrap_or_else(|| Box::new(OAuth1Signer)),
            errors: self
                .errors
                .unwrap_or_else(ErrorRegistry::with_common_server_kinds),
            tap: self.tap,
        }
    }
}
