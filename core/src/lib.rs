//! Blocking client for the `twitter-x-api` service on RapidAPI.
//!
//! # Overview
//! `ApiClient` performs one authenticated HTTP request per call and returns
//! the response with its JSON body parsed but otherwise untouched.
//! `TwitterApi` layers a catalog of named operations on top: it validates
//! named arguments against each operation's parameter contract, builds the
//! request, and maps HTTP statuses to typed errors.
//!
//! # Design
//! - Configuration is validated once and immutable afterwards; clients are
//!   `Clone + Send + Sync` and share no mutable state between calls.
//! - Network I/O sits behind the `Transport` trait. `UreqTransport` is the
//!   default; tests plug in stubs.
//! - Nothing retries, sleeps or caches. Rate limiting surfaces as
//!   `CatalogError::RateLimited` and the caller decides what to do.
//! - Response payloads are opaque `serde_json::Value`s; use
//!   `ParsedResponse::decode` for typed access.
//!
//! ```no_run
//! use twittapi_core::TwitterApi;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let api = TwitterApi::new("<x-rapidapi-key>")?;
//! if let Some(user_id) = api.user_id_by_username("taylorswift13")? {
//!     let tweets = api.user_tweets(&user_id, None)?;
//!     println!("{}", tweets.raw_text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod catalog;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod transport;

pub use api::TwitterApi;
pub use catalog::{Catalog, EndpointDescriptor};
pub use client::ApiClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{CatalogError, ClientError, ConfigError, RegistrationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, ParsedResponse, RequestSpec};
pub use transport::{Transport, UreqTransport};
