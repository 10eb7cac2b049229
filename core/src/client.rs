//! Authenticated request execution against the configured host.
//!
//! # Design
//! `ApiClient` holds an immutable `ClientConfig` and a `Transport`, both
//! behind `Arc`, and carries no mutable state between calls. Each call is
//! split into `build_request` (resolve URL, merge headers, validate) and
//! `parse_response` (decode the body leniently), with a single transport
//! round-trip in between. Building and parsing are pure, so the interesting
//! behaviour is testable without a network.
//!
//! HTTP error statuses are not errors at this layer; they are returned in
//! `ParsedResponse::status` for the catalog to interpret.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, ParsedResponse, RequestSpec};
use crate::transport::{Transport, UreqTransport};

const API_KEY_HEADER: &str = "x-rapidapi-key";
const API_HOST_HEADER: &str = "x-rapidapi-host";
const DEFAULT_USER_AGENT: &str = concat!("twittapi/", env!("CARGO_PKG_VERSION"));

/// Low-level client: one `request` call is one HTTP exchange.
#[derive(Clone)]
pub struct ApiClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Client using the default `ureq` transport.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, Arc::new(UreqTransport::new()))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Perform one request. Never retries.
    ///
    /// A response that arrives after the effective timeout is reported as
    /// `ClientError::Timeout`, even if the transport did not enforce it.
    #[instrument(skip(self, spec), fields(method = %spec.method, path = %spec.path))]
    pub fn request(&self, spec: RequestSpec) -> Result<ParsedResponse, ClientError> {
        let request = self.build_request(&spec)?;
        debug!(url = %request.url, timeout_ms = request.timeout.as_millis() as u64, "sending request");

        let started = Instant::now();
        let result = self.transport.execute(&request);
        let elapsed = started.elapsed();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, elapsed_ms = elapsed.as_millis() as u64, "request failed");
                return Err(e);
            }
        };
        if elapsed > request.timeout {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                timeout_ms = request.timeout.as_millis() as u64,
                "response arrived after the deadline"
            );
            return Err(ClientError::Timeout {
                timeout: request.timeout,
            });
        }

        debug!(
            status = response.status,
            bytes = response.body.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "response received"
        );
        Ok(Self::parse_response(response))
    }

    /// Resolve a `RequestSpec` into the exact request the transport will send.
    pub fn build_request(&self, spec: &RequestSpec) -> Result<HttpRequest, ClientError> {
        let timeout = spec.timeout.unwrap_or_else(|| self.config.timeout());
        if timeout.is_zero() {
            return Err(ClientError::InvalidRequest(
                "timeout must be greater than zero".to_string(),
            ));
        }
        validate_path(&spec.path)?;
        if spec.method == HttpMethod::Get && spec.body.is_some() {
            return Err(ClientError::InvalidRequest(
                "GET requests cannot carry a body".to_string(),
            ));
        }

        let mut url = format!("{}{}", self.config.base_url(), spec.path);
        if !spec.query.is_empty() {
            url.push('?');
            url.push_str(&encode_query(&spec.query));
        }

        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        headers.insert(API_KEY_HEADER.to_string(), self.config.api_key().to_string());
        headers.insert(API_HOST_HEADER.to_string(), self.config.host().to_string());
        headers.insert("accept".to_string(), "application/json".to_string());
        headers.insert(
            "user-agent".to_string(),
            self.config.user_agent().unwrap_or(DEFAULT_USER_AGENT).to_string(),
        );

        let body = match &spec.body {
            Some(value) => {
                headers.insert("content-type".to_string(), "application/json".to_string());
                let bytes = serde_json::to_vec(value)
                    .map_err(|e| ClientError::InvalidRequest(format!("unserializable body: {e}")))?;
                Some(bytes)
            }
            None => None,
        };

        for (name, value) in &spec.headers {
            validate_header(name, value)?;
            headers.insert(name.to_ascii_lowercase(), value.clone());
        }

        Ok(HttpRequest {
            method: spec.method,
            url,
            headers: headers.into_iter().collect(),
            body,
            timeout,
        })
    }

    /// Decode a raw response. Non-JSON payloads yield `body: None`.
    pub fn parse_response(response: HttpResponse) -> ParsedResponse {
        let raw_text = String::from_utf8_lossy(&response.body).into_owned();
        let body = if raw_text.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&raw_text).ok()
        };
        ParsedResponse {
            status: response.status,
            headers: response.headers,
            body,
            raw_text,
        }
    }
}

/// Percent-encode each key and value; pairs come out sorted by key.
pub(crate) fn encode_query(query: &BTreeMap<String, String>) -> String {
    query
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn validate_path(path: &str) -> Result<(), ClientError> {
    let invalid = |reason: &str| Err(ClientError::InvalidRequest(format!("path {path:?}: {reason}")));

    if path.is_empty() {
        return invalid("must not be empty");
    }
    if !path.starts_with('/') || path.starts_with("//") {
        return invalid("must be relative to the host and start with a single '/'");
    }
    if path.contains("://") {
        return invalid("must not be an absolute URL");
    }
    if path
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || c == '?' || c == '#')
    {
        return invalid("contains characters that must be encoded or passed as query");
    }
    Ok(())
}

fn validate_header(name: &str, value: &str) -> Result<(), ClientError> {
    let token = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c));
    if !token {
        return Err(ClientError::InvalidRequest(format!("invalid header name {name:?}")));
    }
    if value.chars().any(|c| matches!(c, '\r' | '\n' | '\0')) {
        return Err(ClientError::InvalidRequest(format!(
            "invalid value for header {name:?}"
        )));
    }
    Ok(())
}
