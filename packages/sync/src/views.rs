//! Wires pollers, stores, and cadences together per view.
//!
//! Each surface keeps its own poll loop and its own collection. Nothing is
//! shared between views, so an aggressive dashboard cadence never burns
//! requests for a view nobody is looking at, and leaving a view tears its
//! poller down without disturbing the others.

use std::sync::Arc;
use std::time::Duration;

use disaster_watch_alert_models::{Alert, DashboardSummary};
use disaster_watch_feed::{AlertFeed, FeedError, normalize};
use disaster_watch_feed_models::{AnalyticsPayload, OverviewStats};

use crate::poller::{self, PollWorker};
use crate::store::{AlertStore, HasAlerts, ResolvedPolicy};

/// The four independently polling surfaces of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Dashboard,
    Alerts,
    Map,
    Analytics,
}

impl View {
    /// Every view, in menu order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Dashboard, Self::Alerts, Self::Map, Self::Analytics]
    }

    /// Menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Alerts => "Alert Management",
            Self::Map => "Live Map",
            Self::Analytics => "Analytics",
        }
    }

    /// Poll cadence while the view is on screen. The dashboard runs hot,
    /// the alert queue barely moves, the rest sit in between.
    #[must_use]
    pub const fn cadence(self) -> Duration {
        match self {
            Self::Dashboard => Duration::from_secs(1),
            Self::Alerts => Duration::from_secs(300),
            Self::Map => Duration::from_secs(60),
            Self::Analytics => Duration::from_secs(10),
        }
    }

    /// What the view does with alerts the backend confirms resolved.
    /// The alert queue keeps them visible for audit; everything else
    /// drops them.
    #[must_use]
    pub const fn resolved_policy(self) -> ResolvedPolicy {
        match self {
            Self::Alerts => ResolvedPolicy::Flag,
            Self::Dashboard | Self::Map | Self::Analytics => ResolvedPolicy::Remove,
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Data behind the dashboard view.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    /// Server-derived counters, cross-checked against the incident list.
    pub summary: DashboardSummary,
    /// Today's incidents, newest first.
    pub alerts: AlertStore,
}

impl HasAlerts for DashboardSnapshot {
    fn alerts(&self) -> &AlertStore {
        &self.alerts
    }

    fn alerts_mut(&mut self) -> &mut AlertStore {
        &mut self.alerts
    }
}

/// Starts the dashboard poller: overview counters plus today's incidents.
#[must_use]
pub fn spawn_dashboard(
    feed: Arc<dyn AlertFeed>,
    cadence: Duration,
) -> PollWorker<DashboardSnapshot> {
    poller::spawn("dashboard", cadence, move || {
        let feed = Arc::clone(&feed);
        async move {
            let payload = feed.dashboard().await?;
            let alerts = normalize::normalize_batch(&payload.todays_incidents);
            let summary = summarize(payload.overview, &alerts);
            Ok::<_, FeedError>(DashboardSnapshot {
                summary,
                alerts: AlertStore::from_batch(View::Dashboard.resolved_policy(), alerts),
            })
        }
    })
}

/// Starts the alert-management poller over the full alert queue.
#[must_use]
pub fn spawn_alerts(feed: Arc<dyn AlertFeed>, cadence: Duration) -> PollWorker<AlertStore> {
    poller::spawn("alerts", cadence, move || {
        let feed = Arc::clone(&feed);
        async move {
            let raw = feed.alerts().await?;
            Ok::<_, FeedError>(AlertStore::from_batch(
                View::Alerts.resolved_policy(),
                normalize::normalize_batch(&raw),
            ))
        }
    })
}

/// Starts the map poller. Placeholder coordinates stay in the store;
/// skipping them is the renderer's call.
#[must_use]
pub fn spawn_map(feed: Arc<dyn AlertFeed>, cadence: Duration) -> PollWorker<AlertStore> {
    poller::spawn("map", cadence, move || {
        let feed = Arc::clone(&feed);
        async move {
            let raw = feed.map_feed().await?;
            Ok::<_, FeedError>(AlertStore::from_batch(
                View::Map.resolved_policy(),
                normalize::normalize_batch(&raw),
            ))
        }
    })
}

/// Starts the analytics poller. The payload passes through as the backend
/// shaped it.
#[must_use]
pub fn spawn_analytics(feed: Arc<dyn AlertFeed>, cadence: Duration) -> PollWorker<AnalyticsPayload> {
    poller::spawn("analytics", cadence, move || {
        let feed = Arc::clone(&feed);
        async move { feed.analytics().await }
    })
}

/// Carries the server's counters through while recounting them from the
/// incident list. Drift is logged, never corrected; the server's numbers
/// stay on screen.
fn summarize(overview: OverviewStats, alerts: &[Alert]) -> DashboardSummary {
    let summary = DashboardSummary {
        total_incidents: overview.total_incidents,
        resolved_count: overview.resolved,
        active_count: overview.active_alerts,
        avg_response_hours: overview.avg_response,
    };
    let recount = DashboardSummary::recount(alerts, overview.avg_response);
    if summary.total_incidents != recount.total_incidents
        || summary.active_count != recount.active_count
        || summary.resolved_count != recount.resolved_count
    {
        log::warn!(
            "dashboard overview drifted from the incident list: server has {} active / {} resolved of {}, recount finds {} active / {} resolved of {}",
            summary.active_count,
            summary.resolved_count,
            summary.total_incidents,
            recount.active_count,
            recount.resolved_count,
            recount.total_incidents
        );
    }
    summary
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use disaster_watch_feed_models::{DashboardPayload, RawIncident};

    use super::*;
    use crate::lifecycle::LifecycleController;
    use crate::poller::SharedPollState;

    struct ScriptedViewFeed {
        dashboard: DashboardPayload,
        steady_alerts: Vec<RawIncident>,
        queued_alerts: Mutex<VecDeque<Vec<RawIncident>>>,
    }

    impl ScriptedViewFeed {
        fn steady(alerts: Vec<RawIncident>) -> Self {
            Self {
                dashboard: DashboardPayload::default(),
                steady_alerts: alerts,
                queued_alerts: Mutex::new(VecDeque::new()),
            }
        }

        fn queued(batches: Vec<Vec<RawIncident>>) -> Self {
            Self {
                dashboard: DashboardPayload::default(),
                steady_alerts: Vec::new(),
                queued_alerts: Mutex::new(batches.into()),
            }
        }

        fn with_dashboard(dashboard: DashboardPayload) -> Self {
            Self {
                dashboard,
                steady_alerts: Vec::new(),
                queued_alerts: Mutex::new(VecDeque::new()),
            }
        }
    }

    #[async_trait]
    impl AlertFeed for ScriptedViewFeed {
        async fn dashboard(&self) -> Result<DashboardPayload, FeedError> {
            Ok(self.dashboard.clone())
        }

        async fn alerts(&self) -> Result<Vec<RawIncident>, FeedError> {
            let mut queued = self.queued_alerts.lock().unwrap();
            Ok(queued
                .pop_front()
                .unwrap_or_else(|| self.steady_alerts.clone()))
        }

        async fn map_feed(&self) -> Result<Vec<RawIncident>, FeedError> {
            Ok(self.steady_alerts.clone())
        }

        async fn analytics(&self) -> Result<AnalyticsPayload, FeedError> {
            Ok(AnalyticsPayload::default())
        }

        async fn resolve(&self, _id: &str) -> Result<(), FeedError> {
            Ok(())
        }
    }

    fn raw_incident(id: &str) -> RawIncident {
        RawIncident {
            id: id.to_string(),
            severity: "critical".to_string(),
            disaster_type: "flood".to_string(),
            primary_location: "Chennai".to_string(),
            ..RawIncident::default()
        }
    }

    #[test]
    fn cadences_and_resolved_policies_are_per_view() {
        assert_eq!(View::Dashboard.cadence(), Duration::from_secs(1));
        assert_eq!(View::Alerts.cadence(), Duration::from_secs(300));
        assert_eq!(View::Map.cadence(), Duration::from_secs(60));
        assert_eq!(View::Analytics.cadence(), Duration::from_secs(10));

        for view in View::all() {
            let expected = if *view == View::Alerts {
                ResolvedPolicy::Flag
            } else {
                ResolvedPolicy::Remove
            };
            assert_eq!(view.resolved_policy(), expected);
        }
    }

    #[test]
    fn summarize_keeps_the_server_counters_despite_drift() {
        let overview = OverviewStats {
            total_incidents: 5,
            resolved: 2,
            active_alerts: 3,
            avg_response: 2.5,
        };
        let summary = summarize(overview, &[]);
        assert_eq!(summary.total_incidents, 5);
        assert_eq!(summary.resolved_count, 2);
        assert_eq!(summary.active_count, 3);
        assert!((summary.avg_response_hours - 2.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn dashboard_poller_publishes_summary_and_incidents() {
        let feed = Arc::new(ScriptedViewFeed::with_dashboard(DashboardPayload {
            overview: OverviewStats {
                total_incidents: 1,
                resolved: 0,
                active_alerts: 1,
                avg_response: 1.25,
            },
            todays_incidents: vec![raw_incident("1")],
        }));
        let worker = spawn_dashboard(feed, Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(120)).await;

        let snapshot = worker.snapshot();
        let data = snapshot.data.expect("dashboard published");
        assert_eq!(data.summary.total_incidents, 1);
        assert_eq!(data.alerts.len(), 1);
        assert_eq!(data.alerts.all()[0].title, "FLOOD");
        worker.cancel();
    }

    #[tokio::test]
    async fn alerts_poller_publishes_the_normalized_queue() {
        let feed = Arc::new(ScriptedViewFeed::steady(vec![raw_incident("1")]));
        let worker = spawn_alerts(feed, Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;

        let snapshot = worker.snapshot();
        assert!(!snapshot.loading);
        let store = snapshot.data.expect("alerts published");
        assert_eq!(store.len(), 1);
        assert!(store.get("1").is_some());
        worker.cancel();
    }

    #[tokio::test]
    async fn resolved_alerts_vanish_once_the_backend_stops_reporting_them() {
        let feed = Arc::new(ScriptedViewFeed::queued(vec![
            vec![raw_incident("1")],
            Vec::new(),
        ]));
        let controller = LifecycleController::new(Arc::clone(&feed) as Arc<dyn AlertFeed>);
        let state = SharedPollState::new();

        let batch = feed.alerts().await.unwrap();
        state.apply_success(
            1,
            AlertStore::from_batch(
                View::Alerts.resolved_policy(),
                normalize::normalize_batch(&batch),
            ),
        );
        state.with(|st| assert_eq!(st.data.as_ref().unwrap().len(), 1));

        controller.resolve(&state, "1").await.unwrap();
        state.with(|st| {
            let store = st.data.as_ref().unwrap();
            assert!(store.get("1").unwrap().resolved);
            assert!(store.active().is_empty());
        });

        let batch = feed.alerts().await.unwrap();
        state.apply_success(
            2,
            AlertStore::from_batch(
                View::Alerts.resolved_policy(),
                normalize::normalize_batch(&batch),
            ),
        );
        state.with(|st| assert!(st.data.as_ref().unwrap().is_empty()));
    }
}
