//! Error types for the twittapi client core.
//!
//! # Design
//! Errors are split by layer. `ConfigError` and `RegistrationError` are raised
//! while wiring a client together and never during a call. `ClientError`
//! describes transport-level failures of a single request. `CatalogError`
//! is what callers of `TwitterApi::invoke` see: parameter problems detected
//! before any I/O, the uniform HTTP status policy, and wrapped transport
//! failures. Every variant carries structured fields (endpoint name, status,
//! parameter name) so callers can branch without parsing messages.

use std::time::Duration;

use thiserror::Error;

/// Invalid client configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "API key is required; subscribe to https://rapidapi.com/Lundehund/api/twitter-x-api \
         and copy the key from the RapidAPI dashboard"
    )]
    MissingApiKey,

    #[error("invalid host {0:?}")]
    InvalidHost(String),

    #[error("timeout must be greater than zero")]
    InvalidTimeout,
}

/// A descriptor that cannot be added to a `Catalog`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("endpoint {0:?} is already registered")]
    DuplicateEndpoint(String),

    #[error("endpoint {endpoint:?}: placeholder {{{placeholder}}} is not a required parameter")]
    UnboundPlaceholder { endpoint: String, placeholder: String },

    #[error("endpoint {endpoint:?}: invalid path template: {reason}")]
    InvalidTemplate { endpoint: String, reason: String },
}

/// Transport-level failure of a single request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The request did not complete within its timeout.
    #[error("request timed out after {}ms", .timeout.as_millis())]
    Timeout { timeout: Duration },

    /// DNS, TCP, TLS or I/O failure while talking to the host.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Rejected before any network I/O.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Errors returned by `TwitterApi::invoke`.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("unknown endpoint {0:?}")]
    UnknownEndpoint(String),

    #[error("{endpoint}: missing required parameter {name:?}")]
    MissingParameter { endpoint: String, name: String },

    #[error("{endpoint}: unknown parameter {name:?}")]
    UnknownParameter { endpoint: String, name: String },

    /// 401 or 403.
    #[error("{endpoint}: authentication failed (HTTP {status})")]
    AuthFailed { endpoint: String, status: u16 },

    /// 404.
    #[error("{endpoint}: not found (HTTP {status})")]
    NotFound { endpoint: String, status: u16 },

    /// 429. `retry_after` comes from the `Retry-After` header when present.
    #[error("{endpoint}: rate limited (HTTP {status})")]
    RateLimited {
        endpoint: String,
        status: u16,
        retry_after: Option<Duration>,
    },

    /// Any 5xx.
    #[error("{endpoint}: upstream error (HTTP {status}): {body}")]
    UpstreamError {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("{endpoint}: unexpected HTTP status {status}: {body}")]
    UnexpectedStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl CatalogError {
    /// Whether repeating the same call could plausibly succeed.
    ///
    /// Nothing in this crate acts on this; it exists for callers that build
    /// their own retry policy.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::UpstreamError { .. }
                | Self::Client(ClientError::Timeout { .. } | ClientError::ConnectionFailed(_))
        )
    }

    /// HTTP status behind this error, if the upstream answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::AuthFailed { status, .. }
            | Self::NotFound { status, .. }
            | Self::RateLimited { status, .. }
            | Self::UpstreamError { status, .. }
            | Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Suggested delay before retrying, when the upstream supplied one.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}
