#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Keeps each surface of the client fed with fresh backend data.
//!
//! Every view owns an independent [`poller`] task that refetches on its own
//! cadence and publishes whole snapshots, never incremental merges. The
//! [`store`] module holds the resulting alert collections and their
//! selectors, [`lifecycle`] runs the dispatch and resolve transitions
//! against the backend, and [`views`] wires the three together with the
//! per-view cadence and resolved-alert policies.

pub mod lifecycle;
pub mod poller;
pub mod store;
pub mod views;
