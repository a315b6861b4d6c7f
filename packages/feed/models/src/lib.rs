#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Wire-format types for the disaster-watch backend API.
//!
//! These structs mirror the JSON the classification backend emits, field for
//! field. Every field except the identifier is tolerated as absent so one
//! malformed record never fails a whole poll. Normalization into the
//! canonical alert shape happens downstream in `disaster_watch_feed`.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A latitude/longitude pair as the backend emits it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// One entry in an incident's `all_locations` list.
///
/// The geocoder backend-side does not always produce coordinates, so
/// `coords` is genuinely optional rather than defaulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationEntry {
    /// Place name as extracted from the report text.
    pub place: String,
    /// Geocoded position, when the backend resolved one.
    pub coords: Option<GeoPoint>,
}

/// An incident record as stored by the backend.
///
/// This is the shape `/api/alerts`, `/api/map`, and the dashboard's
/// `todays_incidents` list all carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawIncident {
    /// Stable document identifier. The one field the contract requires.
    pub id: String,
    /// Classified severity label, typically title-cased (`"Critical"`).
    #[serde(default)]
    pub severity: String,
    /// Classified disaster type (`"flood"`, `"earthquake"`, ...).
    #[serde(default)]
    pub disaster_type: String,
    /// Most confident extracted location.
    #[serde(default)]
    pub primary_location: String,
    /// Every location mention extracted from the report.
    #[serde(default)]
    pub all_locations: Vec<LocationEntry>,
    /// ISO-8601 first-report time.
    #[serde(default)]
    pub timestamp: String,
    /// ISO-8601 time of the most recent corroborating report.
    #[serde(default)]
    pub last_reported_at: String,
    /// ISO-8601 resolution time, set once an operator resolves the incident.
    pub resolved_at: Option<String>,
    /// Number of corroborating reports.
    #[serde(default)]
    pub report_count: u32,
    /// Classifier credibility on a 0-1 scale.
    #[serde(default)]
    pub credibility_score: f64,
    /// Free-text excerpt from the originating report.
    #[serde(default)]
    pub text: String,
    /// Link to the originating post.
    pub source_link: Option<String>,
    /// Whether an operator has resolved the incident.
    #[serde(default)]
    pub resolved: bool,
}

/// The `overview` block of `/api/dashboard`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverviewStats {
    /// Incidents reported today.
    pub total_incidents: u64,
    /// Of those, how many are resolved.
    pub resolved: u64,
    /// Of those, how many are still active.
    pub active_alerts: u64,
    /// Mean report-to-resolution time in hours.
    pub avg_response: f64,
}

/// Response shape of `GET /api/dashboard`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardPayload {
    pub overview: OverviewStats,
    pub todays_incidents: Vec<RawIncident>,
}

/// Response shape of `GET /api/map`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapPayload {
    pub alerts: Vec<RawIncident>,
}

/// One `by_type` row of the analytics payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeCount {
    /// Title-cased disaster type (`"Flood"`).
    #[serde(rename = "type")]
    pub disaster_type: String,
    pub count: u64,
}

/// One `trending_locations` row of the analytics payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendingLocation {
    pub location: String,
    pub count: u64,
}

/// One 3-hour bucket of the 24-hour incident timeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineBucket {
    /// 12-hour clock label (`"12AM"`, `"3AM"`, ..., `"9PM"`).
    pub time: String,
    pub incidents: u64,
}

/// Reported health of one upstream ingestion source.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "PascalCase")]
#[strum(serialize_all = "PascalCase")]
pub enum SourceStatus {
    /// Ingesting normally.
    Operational,
    /// Rate-limited or partially degraded.
    Limited,
    /// Not ingesting.
    Down,
    /// Any status label this client does not recognize.
    #[default]
    #[serde(other)]
    Unknown,
}

/// One `data_sources` row of the system-health block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSourceStatus {
    /// Upstream source name (`"Twitter/X API"`).
    pub name: String,
    pub status: SourceStatus,
}

/// The `system_performance` block of the system-health payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemPerformance {
    pub posts_processed_today: u64,
    pub current_rate_ppm: u64,
    pub response_time_avg_ms: u64,
    pub classification_accuracy: f64,
}

/// The `network_status` block of the system-health payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkStatus {
    pub uptime_percent: f64,
    pub latency_ms: u64,
    pub bandwidth_gb: f64,
}

/// The `system_health` block of the analytics payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemHealth {
    pub system_performance: SystemPerformance,
    pub data_sources: Vec<DataSourceStatus>,
    pub network_status: NetworkStatus,
}

/// Response shape of `GET /api/stats` (or `/api/analytics` on deployments
/// that kept the older path).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsPayload {
    pub by_type: Vec<TypeCount>,
    pub trending_locations: Vec<TrendingLocation>,
    pub timeline: Vec<TimelineBucket>,
    pub system_health: SystemHealth,
}

/// Which response shape `GET /api/alerts` uses.
///
/// Current deployments return a bare incident array; older ones wrap it in
/// an object. A deployment uses exactly one shape, chosen in configuration,
/// never sniffed per response.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlertsContract {
    /// `[RawIncident, ...]`
    #[default]
    Bare,
    /// `{"alerts": [RawIncident, ...]}`
    Wrapped,
}

/// Client configuration, loadable from `disaster-watch.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Backend origin, no trailing slash.
    pub base_url: String,
    /// Response shape of the alerts endpoint for this deployment.
    pub alerts_contract: AlertsContract,
    /// Path of the analytics endpoint.
    pub analytics_path: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:6000".to_string(),
            alerts_contract: AlertsContract::Bare,
            analytics_path: "/api/stats".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl FeedConfig {
    /// Joins an endpoint path onto the configured base URL.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}
