//! Catalog-driven client for the upstream Twitter data service.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::catalog::{classify_status, Catalog};
use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::endpoints;
use crate::error::{CatalogError, ConfigError};
use crate::http::ParsedResponse;

/// Named operations on top of an `ApiClient`.
///
/// Cheap to clone and safe to share between threads: it holds only the
/// client and an immutable catalog.
#[derive(Debug, Clone)]
pub struct TwitterApi {
    client: ApiClient,
    catalog: Arc<Catalog>,
}

impl TwitterApi {
    /// Client for the default host with the built-in catalog.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self::from_client(ApiClient::new(ClientConfig::new(api_key)?)))
    }

    pub fn from_client(client: ApiClient) -> Self {
        Self::with_catalog(client, endpoints::builtin())
    }

    pub fn with_catalog(client: ApiClient, catalog: Arc<Catalog>) -> Self {
        Self { client, catalog }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Call `endpoint` with named arguments.
    ///
    /// Unknown endpoints and missing or unknown parameters are reported
    /// before any request is sent. Statuses outside 2xx become typed errors;
    /// nothing is retried.
    ///
    /// Arguments are collected into a map: when a key repeats, the last
    /// value wins and only that one is sent.
    #[instrument(skip(self, args))]
    pub fn invoke<I, K, V>(&self, endpoint: &str, args: I) -> Result<ParsedResponse, CatalogError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let args: BTreeMap<String, String> = args
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let (descriptor, spec) = self.catalog.prepare(endpoint, &args)?;
        debug!(path = %spec.path, params = args.len(), "invoking endpoint");

        let response = self.client.request(spec)?;
        classify_status(descriptor.name(), response).inspect_err(|e| {
            warn!(error = %e, "endpoint returned an error status");
        })
    }

    pub fn user_detail(&self, username: &str) -> Result<ParsedResponse, CatalogError> {
        self.invoke(endpoints::GET_USER_DETAIL, [("username", username)])
    }

    /// One page of a user's tweets; pass the cursor from the previous page to
    /// continue.
    pub fn user_tweets(
        &self,
        user_id: &str,
        cursor: Option<&str>,
    ) -> Result<ParsedResponse, CatalogError> {
        let mut args = vec![("user_id", user_id)];
        if let Some(cursor) = cursor {
            args.push(("cursor", cursor));
        }
        self.invoke(endpoints::GET_USER_TWEETS, args)
    }

    /// Numeric id (`rest_id`) of `username`, or `None` if the user does not
    /// exist.
    pub fn user_id_by_username(&self, username: &str) -> Result<Option<String>, CatalogError> {
        let detail = match self.user_detail(username) {
            Ok(detail) => detail,
            Err(CatalogError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        let id = detail
            .body
            .as_ref()
            .and_then(|body| body.pointer("/user/result/rest_id"))
            .and_then(|id| match id {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            });
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::ClientError;
    use crate::http::{HttpRequest, HttpResponse};
    use crate::transport::Transport;

    /// Records every request and answers with a fixed response.
    struct Recorder {
        status: u16,
        body: String,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl Recorder {
        fn new(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                status,
                body: body.to_string(),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl Transport for Recorder {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ClientError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(HttpResponse {
                status: self.status,
                headers: Vec::new(),
                body: self.body.clone().into_bytes(),
            })
        }
    }

    fn api(transport: Arc<Recorder>) -> TwitterApi {
        let config = ClientConfig::new("test-key").unwrap();
        TwitterApi::from_client(ApiClient::with_transport(config, transport))
    }

    #[test]
    fn user_detail_sends_username_query() {
        let recorder = Recorder::new(200, r#"{"user":{"result":{"rest_id":"44196397"}}}"#);
        let response = api(recorder.clone()).user_detail("elonmusk").unwrap();
        assert_eq!(response.status, 200);

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0].url,
            "https://twitter-x-api.p.rapidapi.com/api/user/detail?username=elonmusk"
        );
    }

    #[test]
    fn user_tweets_passes_cursor_through() {
        let recorder = Recorder::new(200, "{}");
        api(recorder.clone())
            .user_tweets("44196397", Some("DAABCgABF"))
            .unwrap();
        let seen = recorder.seen.lock().unwrap();
        assert!(seen[0].url.contains("cursor=DAABCgABF"));
        assert!(seen[0].url.contains("user_id=44196397"));
    }

    #[test]
    fn repeated_argument_keeps_last_value() {
        let recorder = Recorder::new(200, "{}");
        api(recorder.clone())
            .invoke(
                endpoints::GET_USER_DETAIL,
                [("username", "first"), ("username", "second")],
            )
            .unwrap();
        let seen = recorder.seen.lock().unwrap();
        assert_eq!(
            seen[0].url,
            "https://twitter-x-api.p.rapidapi.com/api/user/detail?username=second"
        );
    }

    #[test]
    fn user_id_lookup_reads_rest_id() {
        let recorder = Recorder::new(200, r#"{"user":{"result":{"rest_id":"17919972"}}}"#);
        let id = api(recorder).user_id_by_username("taylorswift13").unwrap();
        assert_eq!(id.as_deref(), Some("17919972"));
    }

    #[test]
    fn user_id_lookup_missing_user_is_none() {
        let id = api(Recorder::new(404, "{}")).user_id_by_username("nobody").unwrap();
        assert!(id.is_none());

        let id = api(Recorder::new(200, r#"{"user":{}}"#))
            .user_id_by_username("suspended")
            .unwrap();
        assert!(id.is_none());
    }

    #[test]
    fn user_id_lookup_propagates_other_errors() {
        let err = api(Recorder::new(401, "")).user_id_by_username("x").unwrap_err();
        assert!(matches!(err, CatalogError::AuthFailed { status: 401, .. }));
    }

    #[test]
    fn invoke_reports_status_with_endpoint_name() {
        let err = api(Recorder::new(500, "oops"))
            .invoke(endpoints::SEARCH_TOP, [("keyword", "rust")])
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::UpstreamError { ref endpoint, status: 500, .. } if endpoint == "search_top"
        ));
    }

    #[test]
    fn unknown_parameter_never_reaches_transport() {
        let recorder = Recorder::new(200, "{}");
        let err = api(recorder.clone())
            .invoke(endpoints::GET_USER_DETAIL, [("username", "a"), ("cursor", "b")])
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownParameter { .. }));
        assert!(recorder.seen.lock().unwrap().is_empty());
    }
}
