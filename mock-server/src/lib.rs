//! Local stand-in for the `twitter-x-api` RapidAPI service.
//!
//! Serves the same `/api/...` routes as the upstream with canned payloads,
//! enforces the `x-rapidapi-key` header the way the gateway does, and adds a
//! few `/api/test/...` routes that produce specific failure modes (arbitrary
//! statuses, stalled responses, non-JSON bodies, oversized bodies).

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{OriginalUri, Path, Query, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{debug, info};

pub const DEFAULT_API_KEY: &str = "test-key";

/// How long `/api/test/stall` waits before answering, unless overridden.
pub const DEFAULT_STALL: Duration = Duration::from_secs(5);

/// Size of the `padding` string served by `/api/test/large`, just over
/// ureq's default 10 MiB body cap.
pub const LARGE_BODY_PADDING: usize = 11 * 1024 * 1024;

const PAGED_ROUTES: &[&str] = &[
    "/user/followers",
    "/user/followers/blue-verified",
    "/user/following",
    "/user/subscriptions",
    "/user/tweets",
    "/user/replies",
    "/user/medias",
    "/tweet/retweeters",
    "/tweet/retweets",
    "/tweet/hidden-replies",
    "/search/top",
    "/search/latest",
    "/search/people",
    "/search/media",
    "/search/lists",
    "/list/tweets",
    "/list/followers",
    "/list/member",
    "/job/search",
];

/// Known accounts: screen name -> rest id.
const USERS: &[(&str, &str)] = &[
    ("elonmusk", "44196397"),
    ("jack", "12"),
    ("taylorswift13", "17919972"),
];

#[derive(Clone, Debug)]
pub struct AppState {
    api_key: Arc<str>,
    stall: Duration,
    hits: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: Arc::from(api_key),
            stall: DEFAULT_STALL,
            hits: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[must_use]
    pub fn with_stall(mut self, stall: Duration) -> Self {
        self.stall = stall;
        self
    }

    /// Authenticated requests that reached a route handler so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_API_KEY)
    }
}

pub fn app() -> Router {
    app_with_state(AppState::default())
}

pub fn app_with_state(state: AppState) -> Router {
    let mut api = Router::new()
        .route("/user/detail", get(user_detail))
        .route("/tweet/detail", get(tweet_detail))
        .route("/job/detail", get(echo_query))
        .route("/job/search/location", get(echo_query))
        .route("/test/status/{code}", get(status).post(status))
        .route("/test/stall", get(stall))
        .route("/test/text", get(text))
        .route("/test/large", get(large))
        .route("/test/echo", get(echo_query).post(echo_body));
    for route in PAGED_ROUTES {
        api = api.route(route, get(paged));
    }

    let api = api.route_layer(middleware::from_fn_with_state(state.clone(), require_key));
    Router::new().nest("/api", api).with_state(state)
}

pub async fn run(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock upstream listening");
    }
    axum::serve(listener, app_with_state(state)).await
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

/// Missing key is 401, a wrong key is 403, matching the gateway.
async fn require_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let supplied = request
        .headers()
        .get("x-rapidapi-key")
        .and_then(|v| v.to_str().ok());
    match supplied {
        None => message(
            StatusCode::UNAUTHORIZED,
            "Invalid API key. Go to https://docs.rapidapi.com/docs/keys for more info.",
        ),
        Some(key) if key != &*state.api_key => {
            message(StatusCode::FORBIDDEN, "You are not subscribed to this API.")
        }
        Some(_) => {
            state.hits.fetch_add(1, Ordering::SeqCst);
            debug!(path = %request.uri().path(), "authorized request");
            next.run(request).await
        }
    }
}

async fn user_detail(Query(params): Query<BTreeMap<String, String>>) -> Response {
    let Some(username) = params.get("username") else {
        return message(StatusCode::BAD_REQUEST, "username is required");
    };
    let Some((screen_name, rest_id)) = USERS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(username))
    else {
        return message(StatusCode::NOT_FOUND, "User not found");
    };
    Json(json!({
        "user": {
            "result": {
                "__typename": "User",
                "rest_id": rest_id,
                "legacy": { "screen_name": screen_name }
            }
        }
    }))
    .into_response()
}

async fn tweet_detail(Query(params): Query<BTreeMap<String, String>>) -> Response {
    match params.get("tweet_id") {
        Some(id) => Json(json!({ "tweet": { "rest_id": id } })).into_response(),
        None => message(StatusCode::BAD_REQUEST, "tweet_id is required"),
    }
}

/// Echoes the request so callers can check exactly what they sent.
async fn paged(
    OriginalUri(uri): OriginalUri,
    Query(params): Query<BTreeMap<String, String>>,
) -> Json<Value> {
    let page = params
        .get("cursor")
        .and_then(|c| c.strip_prefix("page-"))
        .and_then(|n| n.parse::<u32>().ok())
        .unwrap_or(0);
    Json(json!({
        "path": uri.path(),
        "params": params,
        "cursor": { "bottom": format!("page-{}", page + 1) }
    }))
}

async fn echo_query(
    OriginalUri(uri): OriginalUri,
    Query(params): Query<BTreeMap<String, String>>,
) -> Json<Value> {
    Json(json!({ "path": uri.path(), "params": params }))
}

async fn echo_body(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({ "echo": body }))
}

async fn status(Path(code): Path<u16>) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, Json(json!({ "status": code }))).into_response();
    if status == StatusCode::TOO_MANY_REQUESTS {
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from_static("3"));
    }
    response
}

async fn stall(State(state): State<AppState>) -> Json<Value> {
    tokio::time::sleep(state.stall).await;
    Json(json!({ "result": "late" }))
}

async fn large() -> Json<Value> {
    Json(json!({ "padding": "x".repeat(LARGE_BODY_PADDING) }))
}

async fn text() -> &'static str {
    "<html><body>upstream maintenance</body></html>"
}
