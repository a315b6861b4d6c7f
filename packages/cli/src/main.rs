#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal client for the disaster alert system.
//!
//! Each view subcommand opens a live screen that polls the backend on the
//! view's own cadence and repaints once a second, so relative times stay
//! fresh without extra requests. Run with no subcommand for a menu.

mod interactive;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use console::{Term, style};
use dialoguer::Confirm;
use disaster_watch_alert_models::{Alert, BadgeVariant, Severity};
use disaster_watch_feed::client::FeedClient;
use disaster_watch_feed::{AlertFeed, FeedError, config, normalize};
use disaster_watch_present::{format_credibility, marker, relative_time, render};
use disaster_watch_sync::lifecycle::{DispatchOutcome, LifecycleController, ResolveOutcome};
use disaster_watch_sync::poller::SharedPollState;
use disaster_watch_sync::store::{AlertFilter, AlertStore};
use disaster_watch_sync::views::{self, View};

#[derive(Parser)]
#[command(
    name = "disaster_watch_cli",
    about = "Terminal client for the disaster alert system"
)]
struct Cli {
    /// Backend origin, e.g. `http://127.0.0.1:6000`. Overrides the config
    /// file and `DISASTER_WATCH_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,
    /// Path to a `disaster-watch.toml` config file
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the live dashboard (overview counters plus today's incidents)
    Dashboard,
    /// Print the alert queue once, optionally filtered
    Alerts {
        /// Comma-separated severities to keep (e.g. "critical,high")
        #[arg(long)]
        severity: Option<String>,
        /// Keep alerts at or above this credibility (0-10 scale)
        #[arg(long)]
        min_credibility: Option<f64>,
        /// Free-text filter over title, location, and description
        #[arg(long)]
        query: Option<String>,
        /// Keep only the newest N alerts
        #[arg(long)]
        top: Option<usize>,
        /// Keep the queue on screen instead, polling on the queue cadence
        #[arg(long)]
        watch: bool,
    },
    /// Watch the live incident map
    Map,
    /// Watch ingestion analytics and system health
    Analytics,
    /// Mark an alert resolved (the backend confirms before anything
    /// changes locally)
    Resolve {
        /// Alert id, as shown in the queue
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Notify response units about an active alert
    Dispatch {
        /// Alert id, as shown in the queue
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let mut feed_config = config::load(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        feed_config.base_url = base_url;
    }
    let feed: Arc<dyn AlertFeed> = Arc::new(FeedClient::new(feed_config)?);

    let Some(command) = cli.command else {
        return interactive::run(feed).await;
    };

    match command {
        Commands::Dashboard => watch_dashboard(feed).await?,
        Commands::Alerts {
            severity,
            min_credibility,
            query,
            top,
            watch,
        } => {
            if watch {
                watch_alerts(feed).await?;
            } else {
                let filter = AlertFilter {
                    severities: parse_severities(severity.as_deref()),
                    min_credibility,
                    query,
                    top,
                };
                print_alert_queue(feed, &filter).await?;
            }
        }
        Commands::Map => watch_map(feed).await?,
        Commands::Analytics => watch_analytics(feed).await?,
        Commands::Resolve { id, yes } => resolve_alert(feed, &id, yes).await?,
        Commands::Dispatch { id } => dispatch_alert(feed, &id).await?,
    }

    Ok(())
}

async fn watch_dashboard(feed: Arc<dyn AlertFeed>) -> Result<(), Box<dyn std::error::Error>> {
    let worker = views::spawn_dashboard(feed, View::Dashboard.cadence());
    watch_screen(View::Dashboard, || {
        render::dashboard(&worker.snapshot(), Utc::now())
    })
    .await?;
    worker.cancel();
    Ok(())
}

async fn watch_alerts(feed: Arc<dyn AlertFeed>) -> Result<(), Box<dyn std::error::Error>> {
    let worker = views::spawn_alerts(feed, View::Alerts.cadence());
    watch_screen(View::Alerts, || {
        render::alerts(&worker.snapshot(), Utc::now())
    })
    .await?;
    worker.cancel();
    Ok(())
}

async fn watch_map(feed: Arc<dyn AlertFeed>) -> Result<(), Box<dyn std::error::Error>> {
    let worker = views::spawn_map(feed, View::Map.cadence());
    watch_screen(View::Map, || render::map(&worker.snapshot(), Utc::now())).await?;
    worker.cancel();
    Ok(())
}

async fn watch_analytics(feed: Arc<dyn AlertFeed>) -> Result<(), Box<dyn std::error::Error>> {
    let worker = views::spawn_analytics(feed, View::Analytics.cadence());
    watch_screen(View::Analytics, || render::analytics(&worker.snapshot())).await?;
    worker.cancel();
    Ok(())
}

/// Repaints once a second until ctrl-c. Only the view's poller talks to
/// the backend; repaints recompute relative times from the stored
/// absolute timestamps.
#[allow(clippy::future_not_send)]
async fn watch_screen(
    view: View,
    render_screen: impl Fn() -> String,
) -> Result<(), Box<dyn std::error::Error>> {
    let term = Term::stdout();
    log::debug!("watching {view}");
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                term.clear_screen()?;
                term.write_line(&render_screen())?;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    term.write_line("")?;
    log::info!("left {view}");
    Ok(())
}

async fn print_alert_queue(
    feed: Arc<dyn AlertFeed>,
    filter: &AlertFilter,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = fetch_queue(feed.as_ref()).await?;
    let now = Utc::now();
    let selected = store.select(filter);
    println!("{} of {} alerts", selected.len(), store.len());
    println!("{}", "-".repeat(72));
    for alert in selected {
        println!("{}", styled_line(alert, now));
    }
    Ok(())
}

async fn resolve_alert(
    feed: Arc<dyn AlertFeed>,
    id: &str,
    yes: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = fetch_queue(feed.as_ref()).await?;
    let alert = store
        .get(id)
        .ok_or_else(|| format!("no alert with id {id}"))?;
    println!("{}", styled_line(alert, Utc::now()));

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Resolve alert {id}?"))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Left alone.");
            return Ok(());
        }
    }

    let state = SharedPollState::new();
    state.apply_success(1, store);
    let controller = LifecycleController::new(feed);
    report_resolve(controller.resolve(&state, id).await?, id);
    Ok(())
}

async fn dispatch_alert(
    feed: Arc<dyn AlertFeed>,
    id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = fetch_queue(feed.as_ref()).await?;
    let state = SharedPollState::new();
    state.apply_success(1, store);
    let controller = LifecycleController::new(feed);
    report_dispatch(controller.dispatch(&state, id).await?, id);
    Ok(())
}

/// One fresh pull of the alert queue, normalized and sorted.
async fn fetch_queue(feed: &dyn AlertFeed) -> Result<AlertStore, FeedError> {
    let raw = feed.alerts().await?;
    Ok(AlertStore::from_batch(
        View::Alerts.resolved_policy(),
        normalize::normalize_batch(&raw),
    ))
}

fn report_resolve(outcome: ResolveOutcome, id: &str) {
    match outcome {
        ResolveOutcome::Resolved => println!("Alert {id} resolved."),
        ResolveOutcome::AlreadyResolved => println!("Alert {id} was already resolved."),
        ResolveOutcome::InFlight => println!("A resolve for {id} is already in flight."),
    }
}

fn report_dispatch(outcome: DispatchOutcome, id: &str) {
    match outcome {
        DispatchOutcome::Notified => println!("Response units notified for alert {id}."),
        DispatchOutcome::SkippedResolved => {
            println!("Alert {id} is already resolved; nothing dispatched.");
        }
    }
}

fn parse_severities(raw: Option<&str>) -> Option<Vec<Severity>> {
    raw.map(|list| list.split(',').map(Severity::from_label).collect())
}

fn styled_line(alert: &Alert, now: DateTime<Utc>) -> String {
    let mut line = format!(
        "{} {} {} | {} | {} | {} | {} reports | id {}",
        marker::for_alert(alert).glyph,
        severity_cell(&alert.severity),
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

/// Badge-driven terminal styling for a severity label.
fn severity_cell(severity: &Severity) -> String {
    let label = format!("[{}]", severity.to_string().to_uppercase());
    match severity.badge() {
        BadgeVariant::Destructive => style(label).red().bold().to_string(),
        BadgeVariant::Secondary => style(label).yellow().to_string(),
        BadgeVariant::Outline => style(label).cyan().to_string(),
        BadgeVariant::Default => style(label).dim().to_string(),
    }
}
