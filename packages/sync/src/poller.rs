//! Cadenced background fetching with stale-response protection.
//!
//! A poll loop issues one fetch immediately on start and another on every
//! cadence tick. Calls are stamped with a monotonically increasing issue
//! sequence, and responses only apply while their sequence is newer than
//! the last applied one. A response that loses the race is dropped whole,
//! so consumers never observe an older payload replacing a newer one.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::select;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// What a view can observe about its poll loop at any instant.
#[derive(Debug, Clone)]
pub struct PollState<T> {
    /// Payload from the newest applied fetch, if any has succeeded yet.
    pub data: Option<T>,
    /// `true` until the first fetch settles, one way or the other.
    pub loading: bool,
    /// Message from the newest failed fetch. Cleared by the next success.
    pub error: Option<String>,
    /// When `data` was last replaced.
    pub last_fetched_at: Option<DateTime<Utc>>,
}

impl<T> Default for PollState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
            last_fetched_at: None,
        }
    }
}

/// Poll state shared between a poll task and its consumers.
///
/// Fetches apply through [`apply_success`](Self::apply_success) and
/// [`apply_failure`](Self::apply_failure), both gated on the issue
/// sequence, so a slow response can never clobber the result of a fetch
/// issued after it.
#[derive(Debug)]
pub struct SharedPollState<T> {
    inner: Mutex<Inner<T>>,
}

#[derive(Debug)]
struct Inner<T> {
    state: PollState<T>,
    applied_seq: u64,
}

impl<T> Default for SharedPollState<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SharedPollState<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: PollState::default(),
                applied_seq: 0,
            }),
        }
    }

    /// Runs `f` against the current state under the lock.
    ///
    /// # Panics
    ///
    /// Panics if the `Mutex` is poisoned.
    pub fn with<R>(&self, f: impl FnOnce(&PollState<T>) -> R) -> R {
        f(&self.inner.lock().expect("poll state mutex poisoned").state)
    }

    /// Runs `f` against the mutable state under the lock. Lifecycle
    /// transitions use this to rewrite the last payload in place.
    ///
    /// # Panics
    ///
    /// Panics if the `Mutex` is poisoned.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut PollState<T>) -> R) -> R {
        f(&mut self.inner.lock().expect("poll state mutex poisoned").state)
    }

    /// Applies a successful fetch stamped with the sequence it was issued
    /// under. Returns `false` when a newer fetch has already applied, in
    /// which case the payload is discarded untouched.
    ///
    /// # Panics
    ///
    /// Panics if the `Mutex` is poisoned.
    pub fn apply_success(&self, seq: u64, data: T) -> bool {
        let mut inner = self.inner.lock().expect("poll state mutex poisoned");
        if seq <= inner.applied_seq {
            return false;
        }
        inner.applied_seq = seq;
        inner.state.data = Some(data);
        inner.state.loading = false;
        inner.state.error = None;
        inner.state.last_fetched_at = Some(Utc::now());
        true
    }

    /// Applies a failed fetch. Previously published data stays in place,
    /// only the error message and the loading flag change.
    ///
    /// # Panics
    ///
    /// Panics if the `Mutex` is poisoned.
    pub fn apply_failure(&self, seq: u64, message: String) -> bool {
        let mut inner = self.inner.lock().expect("poll state mutex poisoned");
        if seq <= inner.applied_seq {
            return false;
        }
        inner.applied_seq = seq;
        inner.state.loading = false;
        inner.state.error = Some(message);
        true
    }
}

impl<T: Clone> SharedPollState<T> {
    /// Owned copy of the current state.
    ///
    /// # Panics
    ///
    /// Panics if the `Mutex` is poisoned.
    #[must_use]
    pub fn snapshot(&self) -> PollState<T> {
        self.inner
            .lock()
            .expect("poll state mutex poisoned")
            .state
            .clone()
    }
}

/// Owner's handle to a running poll loop.
///
/// Dropping the handle stops the loop, so keep it alive for as long as the
/// view is on screen.
#[derive(Debug)]
pub struct PollHandle {
    cancelled: Arc<AtomicBool>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stops the poll loop and marks every in-flight fetch as discarded.
    /// Responses that race with the cancellation are dropped unapplied.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let _ = self.shutdown.send(true);
    }

    /// `true` once [`cancel`](Self::cancel) has run.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
        self.task.abort();
    }
}

/// A running poller plus the state it publishes into.
#[derive(Debug)]
pub struct PollWorker<T> {
    state: Arc<SharedPollState<T>>,
    handle: PollHandle,
}

impl<T> PollWorker<T> {
    /// The shared state this worker publishes into.
    #[must_use]
    pub const fn state(&self) -> &Arc<SharedPollState<T>> {
        &self.state
    }

    /// The cancellation handle.
    #[must_use]
    pub const fn handle(&self) -> &PollHandle {
        &self.handle
    }

    /// Stops polling. The last published state stays readable.
    pub fn cancel(&self) {
        self.handle.cancel();
    }
}

impl<T: Clone> PollWorker<T> {
    /// Owned copy of the current state.
    ///
    /// # Panics
    ///
    /// Panics if the state `Mutex` is poisoned.
    #[must_use]
    pub fn snapshot(&self) -> PollState<T> {
        self.state.snapshot()
    }
}

/// Spawns a poll loop that calls `fetch` immediately and then once per
/// `cadence` tick until cancelled.
///
/// Responses apply in issue order. A failed call keeps the previously
/// published data and records the error instead. Ticks that fall behind a
/// slow runtime are delayed rather than bursted.
#[must_use]
pub fn spawn<T, E, F, Fut>(label: &'static str, cadence: Duration, fetch: F) -> PollWorker<T>
where
    T: Send + 'static,
    E: std::fmt::Display + Send + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let state = Arc::new(SharedPollState::new());
    let cancelled = Arc::new(AtomicBool::new(false));
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let task = {
        let state = Arc::clone(&state);
        let cancelled = Arc::clone(&cancelled);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cadence);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut seq: u64 = 0;

            loop {
                select! {
                    _ = ticker.tick() => {}
                    _ = shutdown_rx.changed() => break,
                }

                seq += 1;
                let issue = seq;
                let state = Arc::clone(&state);
                let cancelled = Arc::clone(&cancelled);
                let call = fetch();

                tokio::spawn(async move {
                    let result = call.await;
                    if cancelled.load(Ordering::SeqCst) {
                        log::trace!("{label} poll {issue}: dropped after cancel");
                        return;
                    }
                    match result {
                        Ok(data) => {
                            if state.apply_success(issue, data) {
                                log::trace!("{label} poll {issue}: applied");
                            } else {
                                log::trace!("{label} poll {issue}: superseded, discarded");
                            }
                        }
                        Err(e) => {
                            if state.apply_failure(issue, e.to_string()) {
                                log::warn!("{label} poll {issue} failed: {e}");
                            }
                        }
                    }
                });
            }

            log::debug!("{label} poller stopped");
        })
    };

    PollWorker {
        state,
        handle: PollHandle {
            cancelled,
            shutdown,
            task,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use super::*;

    #[test]
    fn out_of_order_applications_are_rejected() {
        let state = SharedPollState::new();
        assert!(state.apply_success(2, "b"));
        assert!(!state.apply_success(1, "a"));
        assert!(!state.apply_failure(2, "late".to_string()));
        let snap = state.snapshot();
        assert_eq!(snap.data, Some("b"));
        assert!(snap.error.is_none());
    }

    #[test]
    fn failure_before_any_success_reports_the_error() {
        let state = SharedPollState::<u8>::new();
        assert!(state.apply_failure(1, "boom".to_string()));
        let snap = state.snapshot();
        assert!(snap.data.is_none());
        assert!(!snap.loading);
        assert_eq!(snap.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn first_fetch_fires_immediately() {
        let worker = spawn("test", Duration::from_secs(60), || async {
            Ok::<_, String>(7)
        });
        tokio::time::sleep(Duration::from_millis(80)).await;
        let state = worker.snapshot();
        assert_eq!(state.data, Some(7));
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert!(state.last_fetched_at.is_some());
    }

    #[tokio::test]
    async fn failure_keeps_the_previous_payload() {
        let calls = Arc::new(AtomicU32::new(0));
        let worker = spawn("test", Duration::from_millis(30), {
            let calls = Arc::clone(&calls);
            move || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Ok(1)
                    } else {
                        Err("backend unreachable".to_string())
                    }
                }
            }
        });
        tokio::time::sleep(Duration::from_millis(150)).await;
        let state = worker.snapshot();
        assert_eq!(state.data, Some(1));
        assert!(!state.loading);
        let error = state.error.expect("later polls failed");
        assert!(error.contains("backend unreachable"));
    }

    #[tokio::test]
    async fn success_clears_a_previous_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let worker = spawn("test", Duration::from_millis(30), {
            let calls = Arc::clone(&calls);
            move || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err("cold start".to_string())
                    } else {
                        Ok(2)
                    }
                }
            }
        });
        tokio::time::sleep(Duration::from_millis(150)).await;
        let state = worker.snapshot();
        assert_eq!(state.data, Some(2));
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn cancel_discards_the_in_flight_response() {
        let worker = spawn("test", Duration::from_secs(60), || async {
            tokio::time::sleep(Duration::from_millis(80)).await;
            Ok::<_, String>(1)
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        worker.cancel();
        assert!(worker.handle().is_cancelled());
        tokio::time::sleep(Duration::from_millis(150)).await;
        let state = worker.snapshot();
        assert!(state.data.is_none());
        assert!(state.loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn a_stale_response_never_overwrites_a_newer_one() {
        let calls = Arc::new(AtomicU32::new(0));
        let worker = spawn("test", Duration::from_millis(40), {
            let calls = Arc::clone(&calls);
            move || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    match n {
                        0 => {
                            tokio::time::sleep(Duration::from_millis(120)).await;
                            Ok::<_, String>(1)
                        }
                        1 => Ok(2),
                        _ => std::future::pending().await,
                    }
                }
            }
        });
        tokio::time::sleep(Duration::from_millis(250)).await;
        let state = worker.snapshot();
        assert_eq!(state.data, Some(2), "slow first response must be discarded");
    }
}
