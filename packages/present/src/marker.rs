#![allow(clippy::module_name_repetitions)]

//! Severity-keyed marker styling for map output.

use disaster_watch_alert_models::{Alert, Severity};

/// Visual marker for one plotted alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerStyle {
    /// Hex color, as used by graphical frontends.
    pub color: &'static str,
    /// Glyph used by the terminal renderer.
    pub glyph: &'static str,
}

/// Neutral marker for resolved alerts and unrecognized severities.
pub const NEUTRAL: MarkerStyle = MarkerStyle {
    color: "#6B7280",
    glyph: "\u{26ab}",
};

/// Marker for an alert. Resolved alerts go neutral regardless of their
/// severity.
#[must_use]
pub const fn for_alert(alert: &Alert) -> MarkerStyle {
    if alert.resolved {
        return NEUTRAL;
    }
    for_severity(&alert.severity)
}

/// Marker for a severity level.
#[must_use]
pub const fn for_severity(severity: &Severity) -> MarkerStyle {
    match severity {
        Severity::Critical => MarkerStyle {
            color: "#DC2626",
            glyph: "\u{1f534}",
        },
        Severity::High => MarkerStyle {
            color: "#EA580C",
            glyph: "\u{1f7e0}",
        },
        Severity::Medium => MarkerStyle {
            color: "#CA8A04",
            glyph: "\u{1f7e1}",
        },
        Severity::Low => MarkerStyle {
            color: "#16A34A",
            glyph: "\u{1f7e2}",
        },
        Severity::Other(_) => NEUTRAL,
    }
}

/// Whether map rendering should plot the alert at all. Placeholder
/// coordinates never get a marker.
#[must_use]
pub const fn plottable(alert: &Alert) -> bool {
    !alert.coordinates.is_placeholder()
}
