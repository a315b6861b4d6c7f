#![allow(clippy::module_name_repetitions)]

//! Interactive menu for the disaster alert client.
//!
//! Provides a menu-driven interface using `dialoguer` for watching views
//! and managing alerts without memorizing CLI flags.

use std::sync::Arc;

use dialoguer::{Confirm, Select};
use disaster_watch_feed::AlertFeed;
use disaster_watch_sync::lifecycle::LifecycleController;
use disaster_watch_sync::poller::SharedPollState;

/// Top-level actions available in the interactive menu.
enum Action {
    WatchDashboard,
    WatchAlerts,
    WatchMap,
    WatchAnalytics,
    ResolveAlert,
    DispatchUnits,
}

impl Action {
    const ALL: &[Self] = &[
        Self::WatchDashboard,
        Self::WatchAlerts,
        Self::WatchMap,
        Self::WatchAnalytics,
        Self::ResolveAlert,
        Self::DispatchUnits,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::WatchDashboard => "Watch the dashboard",
            Self::WatchAlerts => "Watch the alert queue",
            Self::WatchMap => "Watch the live map",
            Self::WatchAnalytics => "Watch analytics",
            Self::ResolveAlert => "Resolve an alert",
            Self::DispatchUnits => "Dispatch response units",
        }
    }
}

/// Runs the interactive menu, prompting the user to pick a view to watch
/// or an alert to act on.
///
/// # Errors
///
/// Returns an error if the backend cannot be reached or a prompt fails.
pub async fn run(feed: Arc<dyn AlertFeed>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Disaster Watch");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::WatchDashboard => crate::watch_dashboard(feed).await?,
        Action::WatchAlerts => crate::watch_alerts(feed).await?,
        Action::WatchMap => crate::watch_map(feed).await?,
        Action::WatchAnalytics => crate::watch_analytics(feed).await?,
        Action::ResolveAlert => resolve_flow(feed).await?,
        Action::DispatchUnits => dispatch_flow(feed).await?,
    }

    Ok(())
}

/// Prompts the user to pick an active alert, confirms, then resolves it
/// through the backend.
async fn resolve_flow(feed: Arc<dyn AlertFeed>) -> Result<(), Box<dyn std::error::Error>> {
    let store = crate::fetch_queue(feed.as_ref()).await?;
    let Some(id) = pick_active_alert(&store, "Which alert is resolved?")? else {
        return Ok(());
    };

    let confirmed = Confirm::new()
        .with_prompt(format!("Mark {id} resolved?"))
        .default(false)
        .interact()?;
    if !confirmed {
        println!("Left alone.");
        return Ok(());
    }

    let state = SharedPollState::new();
    state.apply_success(1, store);
    let controller = LifecycleController::new(feed);
    crate::report_resolve(controller.resolve(&state, &id).await?, &id);
    Ok(())
}

/// Prompts the user to pick an active alert, then notifies response units.
async fn dispatch_flow(feed: Arc<dyn AlertFeed>) -> Result<(), Box<dyn std::error::Error>> {
    let store = crate::fetch_queue(feed.as_ref()).await?;
    let Some(id) = pick_active_alert(&store, "Dispatch units for which alert?")? else {
        return Ok(());
    };

    let state = SharedPollState::new();
    state.apply_success(1, store);
    let controller = LifecycleController::new(feed);
    crate::report_dispatch(controller.dispatch(&state, &id).await?, &id);
    Ok(())
}

/// Selects one active alert by menu. Returns `None` (after printing a
/// notice) when the queue has no active alerts.
fn pick_active_alert(
    store: &disaster_watch_sync::store::AlertStore,
    prompt: &str,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let active = store.active();
    if active.is_empty() {
        println!("No active alerts.");
        return Ok(None);
    }

    let labels: Vec<String> = active
        .iter()
        .map(|alert| format!("{} \u{2014} {} \u{2014} {}", alert.id, alert.title, alert.location))
        .collect();

    let idx = Select::new()
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(Some(active[idx].id.clone()))
}
