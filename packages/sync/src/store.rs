#![allow(clippy::module_name_repetitions)]

//! Replace-on-success alert collections and their selectors.

use disaster_watch_alert_models::{Alert, Severity};

/// What a view does with an alert once the backend confirms it resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedPolicy {
    /// Drop the alert from the collection. Active-duty surfaces use this.
    Remove,
    /// Keep the alert, flagged resolved. Audit surfaces use this.
    Flag,
}

/// Conjunction of queue filters; unset fields pass everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertFilter {
    /// Keep only these severities.
    pub severities: Option<Vec<Severity>>,
    /// Keep alerts at or above this credibility.
    pub min_credibility: Option<f64>,
    /// Case-insensitive free-text match over title, location, and
    /// description.
    pub query: Option<String>,
    /// Keep only the newest N, applied after the other filters.
    pub top: Option<usize>,
}

/// Alert collection behind one view, newest first.
///
/// Every successful poll replaces the whole collection; there is no
/// merging with the previous snapshot, so an alert the backend stops
/// reporting disappears on the next poll.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertStore {
    alerts: Vec<Alert>,
    policy: ResolvedPolicy,
}

impl AlertStore {
    #[must_use]
    pub const fn new(policy: ResolvedPolicy) -> Self {
        Self {
            alerts: Vec::new(),
            policy,
        }
    }

    /// Builds a store directly from one poll's batch.
    #[must_use]
    pub fn from_batch(policy: ResolvedPolicy, alerts: Vec<Alert>) -> Self {
        let mut store = Self::new(policy);
        store.replace(alerts);
        store
    }

    /// Replaces the whole collection with a fresh poll's batch. Alerts
    /// sort newest first; alerts without a timestamp sink to the end in
    /// their arrival order.
    pub fn replace(&mut self, mut alerts: Vec<Alert>) {
        alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.alerts = alerts;
    }

    /// Applies a backend-confirmed resolution according to the view's
    /// policy. Returns whether the collection changed, so a second call
    /// for the same id reports `false`.
    pub fn mark_resolved(&mut self, id: &str) -> bool {
        match self.policy {
            ResolvedPolicy::Remove => {
                let before = self.alerts.len();
                self.alerts.retain(|alert| alert.id != id);
                self.alerts.len() != before
            }
            ResolvedPolicy::Flag => {
                let mut changed = false;
                for alert in &mut self.alerts {
                    if alert.id == id && !alert.resolved {
                        alert.resolved = true;
                        changed = true;
                    }
                }
                changed
            }
        }
    }

    #[must_use]
    pub const fn policy(&self) -> ResolvedPolicy {
        self.policy
    }

    /// All alerts, newest first.
    #[must_use]
    pub fn all(&self) -> &[Alert] {
        &self.alerts
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Alert> {
        self.alerts.iter().find(|alert| alert.id == id)
    }

    /// The newest `n` alerts.
    #[must_use]
    pub fn top(&self, n: usize) -> &[Alert] {
        &self.alerts[..self.alerts.len().min(n)]
    }

    /// Alerts not yet resolved. Under the `Remove` policy this is every
    /// alert; under `Flag` it filters out the flagged ones.
    #[must_use]
    pub fn active(&self) -> Vec<&Alert> {
        self.alerts.iter().filter(|alert| alert.is_active()).collect()
    }

    /// Alerts whose severity is one of `severities`.
    #[must_use]
    pub fn with_severity(&self, severities: &[Severity]) -> Vec<&Alert> {
        self.alerts
            .iter()
            .filter(|alert| severities.contains(&alert.severity))
            .collect()
    }

    /// Alerts at or above the credibility threshold.
    #[must_use]
    pub fn with_min_credibility(&self, minimum: f64) -> Vec<&Alert> {
        self.alerts
            .iter()
            .filter(|alert| alert.credibility >= minimum)
            .collect()
    }

    /// Case-insensitive free-text match over title, location, and
    /// description.
    #[must_use]
    pub fn matching(&self, query: &str) -> Vec<&Alert> {
        let needle = query.to_lowercase();
        self.alerts
            .iter()
            .filter(|alert| matches_text(alert, &needle))
            .collect()
    }

    /// Alerts passing every set filter, newest first.
    #[must_use]
    pub fn select(&self, filter: &AlertFilter) -> Vec<&Alert> {
        let needle = filter.query.as_ref().map(|query| query.to_lowercase());
        let mut selected: Vec<&Alert> = self
            .alerts
            .iter()
            .filter(|alert| {
                filter
                    .severities
                    .as_ref()
                    .is_none_or(|severities| severities.contains(&alert.severity))
                    && filter
                        .min_credibility
                        .is_none_or(|minimum| alert.credibility >= minimum)
                    && needle.as_ref().is_none_or(|needle| matches_text(alert, needle))
            })
            .collect();
        if let Some(top) = filter.top {
            selected.truncate(top);
        }
        selected
    }
}

fn matches_text(alert: &Alert, needle: &str) -> bool {
    alert.title.to_lowercase().contains(needle)
        || alert.location.to_lowercase().contains(needle)
        || alert.description.to_lowercase().contains(needle)
}

/// View payloads that carry an alert collection.
///
/// Lets the resolve lifecycle reach the store inside composite snapshots
/// without knowing the view's shape.
pub trait HasAlerts {
    fn alerts(&self) -> &AlertStore;
    fn alerts_mut(&mut self) -> &mut AlertStore;
}

impl HasAlerts for AlertStore {
    fn alerts(&self) -> &AlertStore {
        self
    }

    fn alerts_mut(&mut self) -> &mut AlertStore {
        self
    }
}
