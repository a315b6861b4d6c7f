#![allow(clippy::module_name_repetitions)]

//! Reqwest-backed implementation of the backend feed.
//!
//! One request per poll, no immediate retry: the per-view cadence is the
//! retry policy, so a failed request simply reports its error and the next
//! scheduled tick tries again.

use std::time::Duration;

use async_trait::async_trait;
use disaster_watch_feed_models::{
    AnalyticsPayload, DashboardPayload, FeedConfig, MapPayload, RawIncident,
};

use crate::{AlertFeed, FeedError, normalize};

/// Path of the dashboard endpoint.
pub const DASHBOARD_PATH: &str = "/api/dashboard";
/// Path of the alerts list endpoint; also the prefix of the resolve path.
pub const ALERTS_PATH: &str = "/api/alerts";
/// Path of the map feed endpoint.
pub const MAP_PATH: &str = "/api/map";

/// HTTP client bound to one backend deployment.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    config: FeedConfig,
}

impl FeedClient {
    /// Builds a client from the deployment configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .user_agent("disaster-watch/1.0")
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Returns the configuration this client was built from.
    #[must_use]
    pub const fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Single-shot GET returning the raw JSON body.
    ///
    /// The body is read as text and parsed separately so a garbled payload
    /// surfaces as [`FeedError::Json`] rather than a transport error.
    async fn get_json(&self, path: &str) -> Result<serde_json::Value, FeedError> {
        let url = self.config.endpoint(path);
        log::trace!("GET {url}");
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status { status, url });
        }
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl AlertFeed for FeedClient {
    async fn dashboard(&self) -> Result<DashboardPayload, FeedError> {
        let value = self.get_json(DASHBOARD_PATH).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn alerts(&self) -> Result<Vec<RawIncident>, FeedError> {
        let value = self.get_json(ALERTS_PATH).await?;
        normalize::decode_alerts(self.config.alerts_contract, value)
    }

    async fn map_feed(&self) -> Result<Vec<RawIncident>, FeedError> {
        let value = self.get_json(MAP_PATH).await?;
        let payload: MapPayload = serde_json::from_value(value)?;
        Ok(payload.alerts)
    }

    async fn analytics(&self) -> Result<AnalyticsPayload, FeedError> {
        let value = self.get_json(&self.config.analytics_path).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn resolve(&self, id: &str) -> Result<(), FeedError> {
        let url = self.config.endpoint(&format!("{ALERTS_PATH}/{id}/resolve"));
        log::debug!("POST {url}");
        let response = self.client.post(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status { status, url });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds_from_default_config() {
        let client = FeedClient::new(FeedConfig::default()).unwrap();
        assert_eq!(client.config().base_url, "http://127.0.0.1:6000");
    }

    #[test]
    fn resolve_url_is_path_scoped() {
        let config = FeedConfig::default();
        let url = config.endpoint(&format!("{ALERTS_PATH}/inc-7/resolve"));
        assert_eq!(url, "http://127.0.0.1:6000/api/alerts/inc-7/resolve");
    }
}
