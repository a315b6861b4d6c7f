#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Stateless display derivations for the terminal client.
//!
//! Everything here recomputes from canonical alert state on every render.
//! Relative times in particular are never stored; a frozen "2m ago" would
//! go quietly stale between polls.

use chrono::{DateTime, Utc};

pub mod marker;
pub mod render;

/// Human relative-time label for an alert timestamp.
///
/// Timestamps at or ahead of `now` (clock skew between backend and client)
/// read as `just now`. A missing timestamp renders a placeholder rather
/// than failing.
#[must_use]
pub fn relative_time(now: DateTime<Utc>, timestamp: Option<DateTime<Utc>>) -> String {
    let Some(timestamp) = timestamp else {
        return "unknown time".to_string();
    };
    let seconds = (now - timestamp).num_seconds();
    if seconds <= 0 {
        "just now".to_string()
    } else if seconds < 60 {
        format!("{seconds}s ago")
    } else if seconds < 3_600 {
        format!("{}m ago", seconds / 60)
    } else if seconds < 86_400 {
        format!("{}h ago", seconds / 3_600)
    } else {
        format!("{}d ago", seconds / 86_400)
    }
}

/// Credibility as shown next to every alert, one decimal out of ten.
#[must_use]
pub fn format_credibility(credibility: f64) -> String {
    format!("{credibility:.1}/10")
}

/// Header wall clock. Always UTC, matching the backend's timestamps.
#[must_use]
pub fn format_clock(now: DateTime<Utc>) -> String {
    now.format("%H:%M:%S UTC").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn relative_time_buckets_by_magnitude() {
        let now = Utc::now();
        assert_eq!(relative_time(now, Some(now - Duration::seconds(45))), "45s ago");
        assert_eq!(relative_time(now, Some(now - Duration::seconds(90))), "1m ago");
        assert_eq!(relative_time(now, Some(now - Duration::seconds(7_200))), "2h ago");
        assert_eq!(
            relative_time(now, Some(now - Duration::seconds(172_800))),
            "2d ago"
        );
    }

    #[test]
    fn relative_time_never_goes_negative() {
        let now = Utc::now();
        assert_eq!(relative_time(now, Some(now)), "just now");
        assert_eq!(relative_time(now, Some(now + Duration::seconds(30))), "just now");
    }

    #[test]
    fn relative_time_tolerates_a_missing_timestamp() {
        assert_eq!(relative_time(Utc::now(), None), "unknown time");
    }

    #[test]
    fn credibility_renders_one_decimal() {
        assert_eq!(format_credibility(9.16), "9.2/10");
        assert_eq!(format_credibility(10.0), "10.0/10");
        assert_eq!(format_credibility(0.0), "0.0/10");
    }

    #[test]
    fn clock_is_utc_wall_time() {
        let epoch = DateTime::from_timestamp(0, 0).unwrap();
        assert_eq!(format_clock(epoch), "00:00:00 UTC");
    }
}
