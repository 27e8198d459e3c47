//! Remote data source subsystem.
//!
//! # Data Flow
//! ```text
//! Watcher poll cycle
//!     → DataSource::fetch_health / fetch_stats
//!     → rest.rs (GET /about/health, GET /about/stats under a timeout)
//!     → raw JSON value, or FetchError
//! ```
//!
//! # Design Decisions
//! - Pure transport: no caching, no retries, no logging of failures
//!   (the watcher owns all of that)
//! - A trait seam so the watcher can be driven by any transport

pub mod rest;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub use rest::RestClient;

/// Errors that can occur while fetching a document from the backend.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection or protocol failure.
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// No complete response within the fetch timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Backend answered with something other than 200.
    #[error("unexpected status code {0}")]
    Status(u16),

    /// Backend answered with a non-JSON content type.
    #[error("invalid content-type: expected application/json, got {0:?}")]
    ContentType(String),

    /// Body was not valid JSON.
    #[error("malformed JSON body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Backend address does not form a valid URL.
    #[error("invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Source of the backend's health and stats documents.
///
/// Implementations enforce their own deadline and report it as
/// [`FetchError::Timeout`]; callers never wrap fetches in a timer.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch the health document.
    async fn fetch_health(&self) -> Result<Value, FetchError>;

    /// Fetch the stats document.
    async fn fetch_stats(&self) -> Result<Value, FetchError>;
}

/// Truthiness of a decoded payload.
///
/// `null`, `false`, `0` and `""` are falsy; everything else, including empty
/// objects and arrays, is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
