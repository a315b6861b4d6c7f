#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical alert types shared across every view of the disaster-watch
//! client.
//!
//! Backend payloads arrive in several raw shapes; all of them normalize into
//! the single [`Alert`] record defined here. Severity and badge mappings live
//! beside the types so every view renders the same incident the same way.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Severity of an incident as classified by the backend.
///
/// The four known levels order from most to least urgent. Anything else the
/// backend emits is preserved verbatim in [`Severity::Other`] rather than
/// rejected, so a new backend classification never breaks rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    /// Immediate threat to life, widest dispatch.
    Critical,
    /// Significant incident, response underway or required.
    High,
    /// Localized incident, monitor and verify.
    Medium,
    /// Minor or unconfirmed incident.
    Low,
    /// Unrecognized label, carried through untouched.
    Other(String),
}

impl Severity {
    /// Parses a wire severity label, lower-casing and trimming first.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        Self::from(label.trim().to_lowercase())
    }

    /// Returns the badge variant a view should render for this severity.
    #[must_use]
    pub const fn badge(&self) -> BadgeVariant {
        match self {
            Self::Critical => BadgeVariant::Destructive,
            Self::High => BadgeVariant::Secondary,
            Self::Medium => BadgeVariant::Outline,
            Self::Low | Self::Other(_) => BadgeVariant::Default,
        }
    }

    /// Returns the urgency rank, 4 (critical) down to 0 (unrecognized).
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Critical => 4,
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
            Self::Other(_) => 0,
        }
    }

    /// Whether this is one of the four known severity levels.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Returns the known severity levels, most urgent first.
    #[must_use]
    pub const fn known() -> &'static [Self] {
        &[Self::Critical, Self::High, Self::Medium, Self::Low]
    }
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        match value.as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for Severity {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Severity> for String {
    fn from(value: Severity) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
            Self::Other(label) => write!(f, "{label}"),
        }
    }
}

/// Badge style a view applies to a severity label.
#[derive(
    Debug,
    Clone,
    Copy,
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BadgeVariant {
    /// Red emphasis, reserved for critical incidents.
    Destructive,
    /// Muted emphasis for high severity.
    Secondary,
    /// Bordered style for medium severity.
    Outline,
    /// Neutral style for low or unrecognized severity.
    Default,
}

/// A latitude/longitude pair in decimal degrees.
///
/// Incidents without a usable fix carry the (0, 0) placeholder; map
/// rendering skips placeholder markers instead of plotting them in the
/// Gulf of Guinea.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Decimal degrees, positive north.
    pub latitude: f64,
    /// Decimal degrees, positive east.
    pub longitude: f64,
}

impl Coordinates {
    /// Placeholder emitted when no location entry carried coordinates.
    pub const ORIGIN: Self = Self {
        latitude: 0.0,
        longitude: 0.0,
    };

    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether this is the (0, 0) placeholder rather than a real fix.
    #[allow(clippy::float_cmp)]
    #[must_use]
    pub const fn is_placeholder(self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }
}

/// Canonical, client-owned representation of one incident.
///
/// Exactly one `Alert` exists per raw backend record; normalization never
/// drops an identifier. Timestamps stay absolute so relative display strings
/// can be recomputed on every render without refetching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Stable backend identifier, unique across polls.
    pub id: String,
    /// Classified severity level.
    pub severity: Severity,
    /// Upper-cased disaster type, e.g. `FLOOD`.
    pub title: String,
    /// Primary human-readable location.
    pub location: String,
    /// When the incident was first reported. `None` when the backend sent
    /// no timestamp or an unparseable one.
    pub timestamp: Option<DateTime<Utc>>,
    /// Number of corroborating reports seen by the classifier.
    pub reports: u32,
    /// Credibility on a 0-10 scale.
    pub credibility: f64,
    /// Free-text excerpt from the originating report.
    pub description: String,
    /// Best-known position, or [`Coordinates::ORIGIN`] when unknown.
    pub coordinates: Coordinates,
    /// Link to the originating post, when the source exposes one.
    pub source_link: Option<String>,
    /// Whether an operator has marked the incident resolved.
    pub resolved: bool,
}

impl Alert {
    /// Whether the alert still requires attention.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.resolved
    }
}

/// Aggregate counters shown on the dashboard header.
///
/// The backend derives these server-side; [`DashboardSummary::recount`]
/// re-derives the counts client-side so drift between the overview block and
/// the incident list can be detected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// Incidents reported today, resolved or not.
    pub total_incidents: u64,
    /// Incidents marked resolved today.
    pub resolved_count: u64,
    /// Incidents still active.
    pub active_count: u64,
    /// Mean time from report to resolution, in hours.
    pub avg_response_hours: f64,
}

impl DashboardSummary {
    /// Recounts the summary from a batch of alerts. The response-time
    /// average cannot be re-derived client-side and is carried through.
    #[must_use]
    pub fn recount(alerts: &[Alert], avg_response_hours: f64) -> Self {
        let resolved_count = alerts.iter().filter(|alert| alert.resolved).count() as u64;
        let active_count = alerts.len() as u64 - resolved_count;
        Self {
            total_incidents: active_count + resolved_count,
            resolved_count,
            active_count,
            avg_response_hours,
        }
    }

    /// Whether the counters satisfy `total = active + resolved`.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.total_incidents == self.active_count + self.resolved_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(id: &str, resolved: bool) -> Alert {
        Alert {
            id: id.to_string(),
            severity: Severity::High,
            title: "FLOOD".to_string(),
            location: "Chennai".to_string(),
            timestamp: None,
            reports: 3,
            credibility: 7.5,
            description: String::new(),
            coordinates: Coordinates::ORIGIN,
            source_link: None,
            resolved,
        }
    }

    #[test]
    fn severity_labels_parse_case_insensitively() {
        assert_eq!(Severity::from_label("Critical"), Severity::Critical);
        assert_eq!(Severity::from_label("HIGH"), Severity::High);
        assert_eq!(Severity::from_label(" medium "), Severity::Medium);
        assert_eq!(Severity::from_label("low"), Severity::Low);
    }

    #[test]
    fn unknown_severity_is_preserved() {
        let severity = Severity::from_label("Landslide Watch");
        assert_eq!(severity, Severity::Other("landslide watch".to_string()));
        assert_eq!(severity.to_string(), "landslide watch");
        assert!(!severity.is_known());
    }

    #[test]
    fn badge_mapping_matches_severity() {
        assert_eq!(Severity::Critical.badge(), BadgeVariant::Destructive);
        assert_eq!(Severity::High.badge(), BadgeVariant::Secondary);
        assert_eq!(Severity::Medium.badge(), BadgeVariant::Outline);
        assert_eq!(Severity::Low.badge(), BadgeVariant::Default);
        assert_eq!(
            Severity::Other("fog".to_string()).badge(),
            BadgeVariant::Default
        );
    }

    #[test]
    fn rank_orders_known_severities() {
        let ranks: Vec<u8> = Severity::known().iter().map(Severity::rank).collect();
        assert_eq!(ranks, vec![4, 3, 2, 1]);
        assert_eq!(Severity::Other("fog".to_string()).rank(), 0);
    }

    #[test]
    fn origin_is_placeholder() {
        assert!(Coordinates::ORIGIN.is_placeholder());
        assert!(!Coordinates::new(13.08, 80.27).is_placeholder());
        assert!(!Coordinates::new(0.0, 80.27).is_placeholder());
    }

    #[test]
    fn summary_recount_splits_active_and_resolved() {
        let alerts = vec![alert("1", false), alert("2", true), alert("3", false)];
        let summary = DashboardSummary::recount(&alerts, 1.5);
        assert_eq!(summary.total_incidents, 3);
        assert_eq!(summary.active_count, 2);
        assert_eq!(summary.resolved_count, 1);
        assert!(summary.is_consistent());
    }

    #[test]
    fn inconsistent_summary_is_detected() {
        let summary = DashboardSummary {
            total_incidents: 5,
            resolved_count: 1,
            active_count: 3,
            avg_response_hours: 0.0,
        };
        assert!(!summary.is_consistent());
    }
}
