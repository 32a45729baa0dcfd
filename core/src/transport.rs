//! Default blocking transport on top of `ureq`.

use tracing::trace;

use crate::error::ClientError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};

/// `HttpTransport` backed by a `ureq::Agent`.
///
/// The agent is configured with `http_status_as_error(false)` so 4xx/5xx
/// responses come back as data and the client can rebuild the server's
/// error from the body. Timeouts are ureq's defaults.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Wrap an agent built elsewhere. It must not turn statuses into errors.
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ClientError> {
        trace!(method = %request.method, url = %request.url, "executing request");
        let result = match request.method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Post => {
                let mut builder = self.agent.post(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match &request.body {
                    Some(body) => builder.send(body.as_slice()),
                    None => builder.send_empty(),
                }
            }
        };

        let response = result.map_err(|e| {
            ClientError::transport(format!("{} {} failed", request.method, request.url), e)
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response.into_body().into_reader();

        Ok(HttpResponse {
            status,
            headers,
            body: Box::new(body),
        })
    }
}
