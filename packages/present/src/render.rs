//! Plain-text rendering of the four views.
//!
//! Renderers take the latest poll state and produce the full text of one
//! screen. Color and emphasis stay with the caller, which keeps the output
//! assertable.

use chrono::{DateTime, Utc};
use disaster_watch_alert_models::Alert;
use disaster_watch_feed_models::AnalyticsPayload;
use disaster_watch_sync::poller::PollState;
use disaster_watch_sync::store::AlertStore;
use disaster_watch_sync::views::DashboardSnapshot;

use crate::{format_clock, format_credibility, marker, relative_time};

/// Renders the dashboard: header clock, overview counters, today's
/// incidents.
#[must_use]
pub fn dashboard(state: &PollState<DashboardSnapshot>, now: DateTime<Utc>) -> String {
    let mut lines = vec![
        "DISASTER ALERT SYSTEM".to_string(),
        format!("Last Update: {}", format_clock(now)),
    ];
    push_status(&mut lines, state);
    if let Some(snapshot) = &state.data {
        let summary = &snapshot.summary;
        lines.push(format!(
            "Incidents Today: {}   Active: {}   Resolved: {}   Avg Response: {:.1}h",
            summary.total_incidents,
            summary.active_count,
            summary.resolved_count,
            summary.avg_response_hours
        ));
        lines.push(String::new());
        lines.push("Recent Alerts".to_string());
        if snapshot.alerts.is_empty() {
            lines.push("  (none today)".to_string());
        }
        for alert in snapshot.alerts.all() {
            lines.push(alert_line(alert, now));
        }
    } else {
        lines.push("No data yet.".to_string());
    }
    lines.join("\n")
}

/// Renders the alert queue, resolved entries included.
#[must_use]
pub fn alerts(state: &PollState<AlertStore>, now: DateTime<Utc>) -> String {
    let mut lines = vec![state.data.as_ref().map_or_else(
        || "Alert Queue".to_string(),
        |store| {
            format!(
                "Alert Queue ({} active / {} total)",
                store.active().len(),
                store.len()
            )
        },
    )];
    push_status(&mut lines, state);
    if let Some(store) = &state.data {
        for alert in store.all() {
            lines.push(queue_line(alert, now));
        }
    } else {
        lines.push("No data yet.".to_string());
    }
    lines.join("\n")
}

/// Renders the map as a marker list. Alerts without a usable fix are
/// counted in the header but never plotted.
#[must_use]
pub fn map(state: &PollState<AlertStore>, now: DateTime<Utc>) -> String {
    let mut lines = vec![state.data.as_ref().map_or_else(
        || "Live Map".to_string(),
        |store| {
            let plotted = store.all().iter().filter(|a| marker::plottable(a)).count();
            format!(
                "Live Map ({plotted} plotted, {} without coordinates)",
                store.len() - plotted
            )
        },
    )];
    push_status(&mut lines, state);
    if let Some(store) = &state.data {
        for alert in store.all() {
            if !marker::plottable(alert) {
                continue;
            }
            lines.push(format!(
                "{} ({:.4}, {:.4}) {} | {} | {}",
                marker::for_alert(alert).glyph,
                alert.coordinates.latitude,
                alert.coordinates.longitude,
                alert.title,
                alert.location,
                relative_time(now, alert.timestamp)
            ));
        }
    } else {
        lines.push("No data yet.".to_string());
    }
    lines.join("\n")
}

/// Renders the analytics screen section by section, as the backend shaped
/// the payload.
#[must_use]
pub fn analytics(state: &PollState<AnalyticsPayload>) -> String {
    let mut lines = vec!["Analytics".to_string()];
    push_status(&mut lines, state);
    let Some(payload) = &state.data else {
        lines.push("No data yet.".to_string());
        return lines.join("\n");
    };

    lines.push("Incidents by Type".to_string());
    for row in &payload.by_type {
        lines.push(format!("  {:<16} {}", row.disaster_type, row.count));
    }
    lines.push(String::new());
    lines.push("Trending Locations".to_string());
    for row in &payload.trending_locations {
        lines.push(format!("  {:<16} {}", row.location, row.count));
    }
    lines.push(String::new());
    lines.push("24h Timeline".to_string());
    for bucket in &payload.timeline {
        lines.push(format!("  {:<5} {}", bucket.time, bucket.incidents));
    }
    lines.push(String::new());
    lines.push("System Health".to_string());
    let perf = payload.system_health.system_performance;
    lines.push(format!(
        "  {} posts today | {} posts/min | {} ms avg response | {:.1}% accuracy",
        perf.posts_processed_today,
        perf.current_rate_ppm,
        perf.response_time_avg_ms,
        perf.classification_accuracy
    ));
    for source in &payload.system_health.data_sources {
        lines.push(format!("  {:<20} [{}]", source.name, source.status));
    }
    let network = payload.system_health.network_status;
    lines.push(format!(
        "  uptime {:.1}% | latency {} ms | bandwidth {:.1} GB",
        network.uptime_percent, network.latency_ms, network.bandwidth_gb
    ));
    lines.join("\n")
}

fn alert_line(alert: &Alert, now: DateTime<Utc>) -> String {
    let mut line = format!(
        "{} {} | {} | {} | {} | {} reports",
        marker::for_alert(alert).glyph,
        alert.title,
        alert.location,
        relative_time(now, alert.timestamp),
        format_credibility(alert.credibility),
        alert.reports
    );
    if alert.resolved {
        line.push_str(" | RESOLVED");
    }
    line
}

fn queue_line(alert: &Alert, now: DateTime<Utc>) -> String {
    let severity = alert.severity.to_string().to_uppercase();
    let mut line = format!(
        "{} [{severity}] {} | {} | {} | {} | {} reports | id {}",
        marker::for_alert(alert).glyph,
        alert.title,
        alert.location,
        relative_time(now, alert.timestamp),
        format_credibility(alert.credibility),
        alert.reports,
        alert.id
    );
    if alert.resolved {
        line.push_str(" | RESOLVED");
    }
    line
}

fn push_status<T>(lines: &mut Vec<String>, state: &PollState<T>) {
    if let Some(error) = &state.error {
        if state.data.is_some() {
            lines.push(format!("CONNECTION ERROR: {error} (showing last good data)"));
        } else {
            lines.push(format!("CONNECTION ERROR: {error}"));
        }
    } else if state.loading {
        lines.push("Connecting to the alert feed...".to_string());
    }
}
