//! Client configuration.
//!
//! # Design
//! `ClientConfig` is validated once, at construction, and is immutable
//! afterwards. It can be built in code through `ClientConfig::builder` or
//! deserialized by an embedding application; both paths run the same
//! validation. The API key is wrapped in `SecretString` so it cannot leak
//! through `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::ConfigError;

/// RapidAPI gateway host of the upstream service.
pub const DEFAULT_HOST: &str = "twitter-x-api.p.rapidapi.com";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Immutable settings for one `ApiClient`.
#[derive(Debug, Deserialize)]
#[serde(try_from = "RawClientConfig")]
pub struct ClientConfig {
    scheme: Scheme,
    host: String,
    api_key: SecretString,
    timeout: Duration,
    user_agent: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheme {
    Http,
    Https,
}

impl ClientConfig {
    pub fn builder(api_key: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            host: DEFAULT_HOST.to_string(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }

    /// Defaults for everything except the key.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ConfigError> {
        Self::builder(api_key).build()
    }

    /// Host (and port, if any) without the scheme.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// `scheme://host`, no trailing slash.
    pub fn base_url(&self) -> String {
        let scheme = match self.scheme {
            Scheme::Http => "http",
            Scheme::Https => "https",
        };
        format!("{scheme}://{}", self.host)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Builder returned by `ClientConfig::builder`.
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    host: String,
    api_key: String,
    timeout: Duration,
    user_agent: Option<String>,
}

impl ClientConfigBuilder {
    /// Host name, optionally prefixed with `http://` or `https://`.
    /// Without a prefix the client uses HTTPS.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        let (scheme, host) = split_host(&self.host)?;
        Ok(ClientConfig {
            scheme,
            host,
            api_key: SecretString::from(self.api_key),
            timeout: self.timeout,
            user_agent: self.user_agent,
        })
    }
}

fn split_host(raw: &str) -> Result<(Scheme, String), ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let (scheme, authority) = if let Some(rest) = trimmed.strip_prefix("https://") {
        (Scheme::Https, rest)
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        (Scheme::Http, rest)
    } else if trimmed.contains("://") {
        return Err(ConfigError::InvalidHost(raw.to_string()));
    } else {
        (Scheme::Https, trimmed)
    };

    let malformed = authority.is_empty()
        || authority
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '?' | '#' | '@'));
    if malformed {
        return Err(ConfigError::InvalidHost(raw.to_string()));
    }
    Ok((scheme, authority.to_string()))
}

#[derive(Deserialize)]
struct RawClientConfig {
    #[serde(default = "default_host")]
    host: String,
    api_key: String,
    #[serde(default = "default_timeout_ms")]
    timeout_ms: u64,
    #[serde(default)]
    user_agent: Option<String>,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

impl TryFrom<RawClientConfig> for ClientConfig {
    type Error = ConfigError;

    fn try_from(raw: RawClientConfig) -> Result<Self, Self::Error> {
        let mut builder = ClientConfig::builder(raw.api_key)
            .host(raw.host)
            .timeout(Duration::from_millis(raw.timeout_ms));
        if let Some(user_agent) = raw.user_agent {
            builder = builder.user_agent(user_agent);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_rapidapi_over_https() {
        let config = ClientConfig::new("key").unwrap();
        assert_eq!(config.host(), DEFAULT_HOST);
        assert_eq!(config.base_url(), "https://twitter-x-api.p.rapidapi.com");
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert!(config.user_agent().is_none());
    }

    #[test]
    fn empty_key_is_rejected() {
        assert_eq!(
            ClientConfig::new("  ").unwrap_err(),
            ConfigError::MissingApiKey
        );
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = ClientConfig::builder("key")
            .timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidTimeout);
    }

    #[test]
    fn explicit_http_scheme_is_kept() {
        let config = ClientConfig::builder("key")
            .host("http://127.0.0.1:3000/")
            .build()
            .unwrap();
        assert_eq!(config.host(), "127.0.0.1:3000");
        assert_eq!(config.base_url(), "http://127.0.0.1:3000");
    }

    #[test]
    fn hosts_with_paths_or_foreign_schemes_are_rejected() {
        for bad in ["", "example.com/api", "ftp://example.com", "a b", "user@host"] {
            let err = ClientConfig::builder("key").host(bad).build().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidHost(_)), "{bad:?}");
        }
    }

    #[test]
    fn debug_output_redacts_the_key() {
        let config = ClientConfig::new("super-secret-key").unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret-key"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"api_key":"k","timeout_ms":1500}"#).unwrap();
        assert_eq!(config.host(), DEFAULT_HOST);
        assert_eq!(config.timeout(), Duration::from_millis(1500));
        assert_eq!(config.api_key(), "k");
    }

    #[test]
    fn deserialization_runs_validation() {
        let result: Result<ClientConfig, _> = serde_json::from_str(r#"{"api_key":""}"#);
        assert!(result.is_err());
    }
}
