#![allow(clippy::module_name_repetitions)]

//! Conversion from raw backend incidents to canonical alerts.
//!
//! Normalization is total: any [`RawIncident`] the wire types accept maps to
//! an [`Alert`] without panicking. Missing fields take the same defaults the
//! backend's own formatter uses, so the client renders identically to a
//! server-formatted record.

use chrono::{DateTime, NaiveDateTime, Utc};
use disaster_watch_alert_models::{Alert, Coordinates, Severity};
use disaster_watch_feed_models::{AlertsContract, LocationEntry, MapPayload, RawIncident};

use crate::FeedError;

/// Converts one raw incident into the canonical alert shape.
#[must_use]
pub fn normalize(raw: &RawIncident) -> Alert {
    let severity = if raw.severity.trim().is_empty() {
        Severity::Low
    } else {
        Severity::from_label(&raw.severity)
    };

    let title = if raw.disaster_type.is_empty() {
        "UNKNOWN".to_string()
    } else {
        raw.disaster_type.to_uppercase()
    };

    let location = if raw.primary_location.is_empty() {
        "Unknown Location".to_string()
    } else {
        raw.primary_location.clone()
    };

    let description = if raw.text.is_empty() {
        "No description available.".to_string()
    } else {
        raw.text.clone()
    };

    Alert {
        id: raw.id.clone(),
        severity,
        title,
        location,
        timestamp: parse_timestamp(&raw.timestamp),
        reports: raw.report_count,
        credibility: scale_credibility(raw.credibility_score),
        description,
        coordinates: first_coordinates(&raw.all_locations),
        source_link: raw.source_link.clone(),
        resolved: raw.resolved,
    }
}

/// Normalizes a whole poll batch, preserving order.
#[must_use]
pub fn normalize_batch(raw: &[RawIncident]) -> Vec<Alert> {
    raw.iter().map(normalize).collect()
}

/// Decodes an alerts-endpoint body according to the deployment's contract.
///
/// # Errors
///
/// Returns [`FeedError::Contract`] when the body does not match the
/// configured shape.
pub fn decode_alerts(
    contract: AlertsContract,
    value: serde_json::Value,
) -> Result<Vec<RawIncident>, FeedError> {
    match contract {
        AlertsContract::Bare => {
            serde_json::from_value(value).map_err(|e| FeedError::Contract {
                message: format!("expected bare incident array: {e}"),
            })
        }
        AlertsContract::Wrapped => {
            let payload: MapPayload =
                serde_json::from_value(value).map_err(|e| FeedError::Contract {
                    message: format!("expected {{\"alerts\": [...]}} wrapper: {e}"),
                })?;
            Ok(payload.alerts)
        }
    }
}

/// Parses a backend timestamp, tolerating both offset-bearing ISO-8601 and
/// naive datetimes (treated as UTC).
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    None
}

/// Scales the classifier's 0-1 credibility onto the 0-10 display scale.
fn scale_credibility(score: f64) -> f64 {
    (score * 10.0).clamp(0.0, 10.0)
}

/// Takes the coordinates of the first location entry, or the (0, 0)
/// placeholder when the first entry is absent or carries no fix.
fn first_coordinates(locations: &[LocationEntry]) -> Coordinates {
    locations
        .first()
        .and_then(|entry| entry.coords)
        .map_or(Coordinates::ORIGIN, |point| {
            Coordinates::new(point.lat, point.lon)
        })
}
