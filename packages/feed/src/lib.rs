#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Backend feed client and incident normalization.
//!
//! The [`AlertFeed`] trait is the seam every view polls through; the
//! reqwest-backed implementation lives in [`client`], and the pure
//! raw-to-canonical conversion lives in [`normalize`].

pub mod client;
pub mod config;
pub mod normalize;

use async_trait::async_trait;
use disaster_watch_feed_models::{AnalyticsPayload, DashboardPayload, RawIncident};

/// Errors that can occur while talking to the backend.
///
/// A poll failure of any kind keeps the previous snapshot on screen; the
/// next scheduled poll is the retry. Requests are never re-sent immediately,
/// so a degraded backend sees no extra load from its consumers.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Request could not be sent or the transport failed mid-flight.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not valid JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// The status the backend returned.
        status: reqwest::StatusCode,
        /// The request URL, for the error banner and logs.
        url: String,
    },

    /// Response was valid JSON but not the shape the contract promises.
    #[error("contract violation: {message}")]
    Contract {
        /// Description of the mismatch.
        message: String,
    },

    /// Configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// The backend surface every view polls through.
///
/// Splitting this from the concrete HTTP client lets the sync layer be
/// tested against scripted outcomes without sockets.
#[async_trait]
pub trait AlertFeed: Send + Sync {
    /// Fetches the dashboard overview block and today's incidents.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the request or decode fails.
    async fn dashboard(&self) -> Result<DashboardPayload, FeedError>;

    /// Fetches all active incidents from the last 30 days.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the request fails or the body does not
    /// match the configured alerts contract.
    async fn alerts(&self) -> Result<Vec<RawIncident>, FeedError>;

    /// Fetches active incidents positioned for map rendering.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the request or decode fails.
    async fn map_feed(&self) -> Result<Vec<RawIncident>, FeedError>;

    /// Fetches today's aggregates and system health.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the request or decode fails.
    async fn analytics(&self) -> Result<AnalyticsPayload, FeedError>;

    /// Asks the backend to mark one alert resolved.
    ///
    /// Success means the backend has durably recorded the resolution; the
    /// response body carries nothing the client needs beyond that signal.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the request fails or the backend answers
    /// with a non-success status. The alert is NOT resolved in that case.
    async fn resolve(&self, id: &str) -> Result<(), FeedError>;
}
