//! HTTP transport types and the pluggable transport capability.
//!
//! # Design
//! Requests are plain data built by the `WordGameClient::build_*` methods
//! (`build_get`, `build_post`, `build_post_json`, `build_post_read`). A
//! `HttpTransport` turns one request into one response; the response body
//! stays a reader so the executor decides how much of it to consume.
//! Dropping an `HttpResponse` releases whatever connection backs it, so
//! every exit path of a call cleans up without explicit close calls.

use std::fmt;
use std::io::Read;

use crate::error::ClientError;

/// HTTP method for a request. The service only speaks GET and POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// First header with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }
}

/// An HTTP response whose body has not been read yet.
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Box<dyn Read>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Read + 'static) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Box::new(body),
        }
    }

    /// Response with an in-memory body, handy for hosts that did the I/O
    /// themselves.
    pub fn from_bytes(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::new(status, std::io::Cursor::new(body.into()))
    }

    /// Read the rest of the body into memory.
    pub fn read_body(&mut self) -> Result<Vec<u8>, ClientError> {
        let mut buf = Vec::new();
        self.body
            .read_to_end(&mut buf)
            .map_err(|e| ClientError::transport("failed to read response body", e))?;
        Ok(buf)
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Executes a single HTTP exchange.
///
/// Implementations must return every status code as data; interpreting
/// the status is the executor's job. Only failures to complete the
/// exchange at all are errors.
pub trait HttpTransport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ClientError>;
}
