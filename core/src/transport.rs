//! Pluggable HTTP execution for `ApiClient`.
//!
//! # Design
//! The client core only builds `HttpRequest` values and parses
//! `HttpResponse` values; a `Transport` performs the round-trip in between.
//! `UreqTransport` is the production implementation. Tests substitute stubs
//! to observe exactly which requests were attempted.
//!
//! A transport reports every HTTP status as data. Only failures to obtain a
//! response at all become `ClientError`s.

use std::fmt;
use std::io;
use std::time::Duration;

use crate::error::ClientError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP request.
///
/// Implementations must attempt the request at most once and should give up
/// with `ClientError::Timeout` once `request.timeout` has elapsed.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ClientError>;
}

/// Blocking transport backed by a pooled `ureq::Agent`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ClientError> {
        let result = match request.method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder
                    .config()
                    .timeout_global(Some(request.timeout))
                    .build()
                    .call()
            }
            HttpMethod::Post => {
                let mut builder = self.agent.post(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                let builder = builder
                    .config()
                    .timeout_global(Some(request.timeout))
                    .build();
                match &request.body {
                    Some(body) => builder.send(body.as_slice()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(|e| classify(e, request.timeout))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        // ureq caps bodies at 10 MiB by default; a completed transfer of any
        // size is a response, not a connection failure.
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|e| classify(e, request.timeout))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn classify(err: ureq::Error, timeout: Duration) -> ClientError {
    match err {
        ureq::Error::Timeout(_) => ClientError::Timeout { timeout },
        ureq::Error::Io(e) if e.kind() == io::ErrorKind::TimedOut => {
            ClientError::Timeout { timeout }
        }
        ureq::Error::BadUri(msg) => ClientError::InvalidRequest(msg),
        other => ClientError::ConnectionFailed(other.to_string()),
    }
}
