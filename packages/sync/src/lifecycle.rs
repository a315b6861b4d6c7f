#![allow(clippy::module_name_repetitions)]

//! Dispatch and resolve transitions, reconciled against the backend.
//!
//! Resolve is confirm-then-mutate: the backend acknowledges first and only
//! then does the local collection change, so a rejected request leaves the
//! alert exactly as it was. Dispatch is a notification side effect and
//! never touches alert state at all.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use disaster_watch_alert_models::Alert;
use disaster_watch_feed::{AlertFeed, FeedError};
use thiserror::Error;

use crate::poller::SharedPollState;
use crate::store::HasAlerts;

/// Errors from lifecycle actions.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The alert is not in the view's current collection.
    #[error("no alert with id {id}")]
    NotFound {
        /// The id that was requested.
        id: String,
    },

    /// The backend rejected or never received the mutation.
    #[error(transparent)]
    Feed(#[from] FeedError),
}

/// Where dispatch notifications go.
///
/// Sinks must not mutate alert state; a delivery failure is the sink's to
/// report and never rolls anything back.
#[async_trait]
pub trait DispatchSink: Send + Sync {
    /// Delivers one dispatch notification.
    async fn notify(&self, alert: &Alert);
}

/// Default sink: writes the notification to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDispatch;

#[async_trait]
impl DispatchSink for LogDispatch {
    async fn notify(&self, alert: &Alert) {
        log::info!(
            "dispatching response units for {} at {} (severity {})",
            alert.title,
            alert.location,
            alert.severity
        );
    }
}

/// Outcome of a resolve request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// Backend confirmed; the local collection now reflects it.
    Resolved,
    /// The alert was already resolved; the backend was not contacted.
    AlreadyResolved,
    /// Another resolve for the same id is still awaiting the backend;
    /// this call changed nothing.
    InFlight,
}

/// Outcome of a dispatch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The sink received the notification.
    Notified,
    /// The alert is already resolved, so no units were notified.
    SkippedResolved,
}

/// Runs dispatch and resolve while keeping local state subordinate to
/// backend truth.
pub struct LifecycleController {
    feed: Arc<dyn AlertFeed>,
    sink: Arc<dyn DispatchSink>,
    in_flight: Mutex<HashSet<String>>,
}

impl LifecycleController {
    #[must_use]
    pub fn new(feed: Arc<dyn AlertFeed>) -> Self {
        Self {
            feed,
            sink: Arc::new(LogDispatch),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Replaces the dispatch sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn DispatchSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Resolves an alert: backend first, local second.
    ///
    /// Requests for an alert that is already resolved, or already has a
    /// resolve awaiting the backend, return without contacting the
    /// backend. A backend failure leaves the local collection untouched;
    /// the alert stays actionable for a retry.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotFound`] when the id is not in the
    /// view's collection and [`LifecycleError::Feed`] when the backend
    /// call fails.
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned.
    pub async fn resolve<S: HasAlerts + Send>(
        &self,
        state: &SharedPollState<S>,
        id: &str,
    ) -> Result<ResolveOutcome, LifecycleError> {
        let current = state.with(|st| {
            st.data
                .as_ref()
                .and_then(|snapshot| snapshot.alerts().get(id).map(|alert| alert.resolved))
        });
        let Some(resolved) = current else {
            return Err(LifecycleError::NotFound { id: id.to_string() });
        };
        if resolved {
            return Ok(ResolveOutcome::AlreadyResolved);
        }

        {
            let mut in_flight = self.in_flight.lock().expect("in-flight lock poisoned");
            if !in_flight.insert(id.to_string()) {
                log::debug!("resolve for alert {id} already in flight");
                return Ok(ResolveOutcome::InFlight);
            }
        }

        let result = self.feed.resolve(id).await;

        self.in_flight
            .lock()
            .expect("in-flight lock poisoned")
            .remove(id);

        match result {
            Ok(()) => {
                state.with_mut(|st| {
                    if let Some(snapshot) = st.data.as_mut() {
                        snapshot.alerts_mut().mark_resolved(id);
                    }
                });
                log::info!("alert {id} resolved");
                Ok(ResolveOutcome::Resolved)
            }
            Err(e) => {
                log::error!("resolve failed for alert {id}: {e}");
                Err(LifecycleError::Feed(e))
            }
        }
    }

    /// Sends a dispatch notification for an active alert.
    ///
    /// Resolved alerts are skipped with a warning rather than notified.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotFound`] when the id is not in the
    /// view's collection.
    pub async fn dispatch<S: HasAlerts + Send>(
        &self,
        state: &SharedPollState<S>,
        id: &str,
    ) -> Result<DispatchOutcome, LifecycleError> {
        let alert = state.with(|st| {
            st.data
                .as_ref()
                .and_then(|snapshot| snapshot.alerts().get(id).cloned())
        });
        let Some(alert) = alert else {
            return Err(LifecycleError::NotFound { id: id.to_string() });
        };
        if alert.resolved {
            log::warn!("ignoring dispatch for resolved alert {id}");
            return Ok(DispatchOutcome::SkippedResolved);
        }

        self.sink.notify(&alert).await;
        Ok(DispatchOutcome::Notified)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use disaster_watch_alert_models::{Coordinates, Severity};
    use disaster_watch_feed_models::{AnalyticsPayload, DashboardPayload, RawIncident};
    use tokio::sync::Notify;

    use super::*;
    use crate::store::{AlertStore, ResolvedPolicy};

    struct ScriptedFeed {
        fail_resolve: bool,
        gate: Option<Arc<Notify>>,
        resolve_calls: Mutex<Vec<String>>,
    }

    impl ScriptedFeed {
        fn ok() -> Self {
            Self {
                fail_resolve: false,
                gate: None,
                resolve_calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail_resolve: true,
                ..Self::ok()
            }
        }

        fn gated(gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::ok()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.resolve_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AlertFeed for ScriptedFeed {
        async fn dashboard(&self) -> Result<DashboardPayload, FeedError> {
            Ok(DashboardPayload::default())
        }

        async fn alerts(&self) -> Result<Vec<RawIncident>, FeedError> {
            Ok(Vec::new())
        }

        async fn map_feed(&self) -> Result<Vec<RawIncident>, FeedError> {
            Ok(Vec::new())
        }

        async fn analytics(&self) -> Result<AnalyticsPayload, FeedError> {
            Ok(AnalyticsPayload::default())
        }

        async fn resolve(&self, id: &str) -> Result<(), FeedError> {
            self.resolve_calls.lock().unwrap().push(id.to_string());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail_resolve {
                return Err(FeedError::Contract {
                    message: "backend rejected the resolve".to_string(),
                });
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        notified: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DispatchSink for RecordingSink {
        async fn notify(&self, alert: &Alert) {
            self.notified.lock().unwrap().push(alert.id.clone());
        }
    }

    fn active_alert(id: &str) -> Alert {
        Alert {
            id: id.to_string(),
            severity: Severity::Critical,
            title: "EARTHQUAKE".to_string(),
            location: "Sendai".to_string(),
            timestamp: None,
            reports: 4,
            credibility: 9.0,
            description: "Strong shaking reported.".to_string(),
            coordinates: Coordinates::ORIGIN,
            source_link: None,
            resolved: false,
        }
    }

    fn seeded(policy: ResolvedPolicy, alerts: Vec<Alert>) -> SharedPollState<AlertStore> {
        let state = SharedPollState::new();
        state.apply_success(1, AlertStore::from_batch(policy, alerts));
        state
    }

    #[tokio::test]
    async fn resolve_confirms_with_the_backend_before_mutating() {
        let feed = Arc::new(ScriptedFeed::ok());
        let controller = LifecycleController::new(Arc::clone(&feed) as Arc<dyn AlertFeed>);
        let state = seeded(ResolvedPolicy::Remove, vec![active_alert("1")]);

        let outcome = controller.resolve(&state, "1").await.unwrap();

        assert_eq!(outcome, ResolveOutcome::Resolved);
        assert_eq!(feed.calls(), ["1"]);
        state.with(|st| {
            assert!(st.data.as_ref().unwrap().get("1").is_none());
        });
    }

    #[tokio::test]
    async fn resolve_failure_leaves_local_state_untouched() {
        let feed = Arc::new(ScriptedFeed::failing());
        let controller = LifecycleController::new(Arc::clone(&feed) as Arc<dyn AlertFeed>);
        let state = seeded(ResolvedPolicy::Remove, vec![active_alert("1")]);

        let result = controller.resolve(&state, "1").await;

        assert!(matches!(result, Err(LifecycleError::Feed(_))));
        state.with(|st| {
            let alert = st.data.as_ref().unwrap().get("1").expect("alert kept");
            assert!(alert.is_active());
        });
    }

    #[tokio::test]
    async fn resolving_twice_hits_the_backend_once() {
        let feed = Arc::new(ScriptedFeed::ok());
        let controller = LifecycleController::new(Arc::clone(&feed) as Arc<dyn AlertFeed>);
        let state = seeded(ResolvedPolicy::Flag, vec![active_alert("1")]);

        assert_eq!(
            controller.resolve(&state, "1").await.unwrap(),
            ResolveOutcome::Resolved
        );
        assert_eq!(
            controller.resolve(&state, "1").await.unwrap(),
            ResolveOutcome::AlreadyResolved
        );
        assert_eq!(feed.calls().len(), 1);
    }

    #[tokio::test]
    async fn resolve_of_an_unknown_id_is_not_found() {
        let feed = Arc::new(ScriptedFeed::ok());
        let controller = LifecycleController::new(feed);
        let state = seeded(ResolvedPolicy::Remove, Vec::new());

        let result = controller.resolve(&state, "missing").await;

        assert!(matches!(result, Err(LifecycleError::NotFound { .. })));
    }

    #[tokio::test]
    async fn concurrent_resolves_for_one_id_collapse() {
        let gate = Arc::new(Notify::new());
        let feed = Arc::new(ScriptedFeed::gated(Arc::clone(&gate)));
        let controller = Arc::new(LifecycleController::new(
            Arc::clone(&feed) as Arc<dyn AlertFeed>
        ));
        let state = Arc::new(seeded(ResolvedPolicy::Flag, vec![active_alert("1")]));

        let first = tokio::spawn({
            let controller = Arc::clone(&controller);
            let state = Arc::clone(&state);
            async move { controller.resolve(&*state, "1").await }
        });
        tokio::time::sleep(Duration::from_millis(30)).await;

        let second = controller.resolve(&*state, "1").await.unwrap();
        assert_eq!(second, ResolveOutcome::InFlight);

        gate.notify_one();
        let first = first.await.unwrap().unwrap();
        assert_eq!(first, ResolveOutcome::Resolved);
        assert_eq!(feed.calls().len(), 1);
    }

    #[tokio::test]
    async fn dispatch_notifies_active_alerts_and_skips_resolved_ones() {
        let feed = Arc::new(ScriptedFeed::ok());
        let sink = Arc::new(RecordingSink::default());
        let controller = LifecycleController::new(feed)
            .with_sink(Arc::clone(&sink) as Arc<dyn DispatchSink>);
        let mut resolved = active_alert("2");
        resolved.resolved = true;
        let state = seeded(ResolvedPolicy::Flag, vec![active_alert("1"), resolved]);

        assert_eq!(
            controller.dispatch(&state, "1").await.unwrap(),
            DispatchOutcome::Notified
        );
        assert_eq!(
            controller.dispatch(&state, "2").await.unwrap(),
            DispatchOutcome::SkippedResolved
        );
        assert_eq!(*sink.notified.lock().unwrap(), ["1"]);

        state.with(|st| {
            assert!(st.data.as_ref().unwrap().get("1").unwrap().is_active());
        });
    }
}
