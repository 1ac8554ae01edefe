use chrono::NaiveDateTime;

use crate::config::Config;
use crate::error::WeatherError;
use crate::gateway::ProviderGateway;
use crate::model::WeatherData;
use crate::reconcile::reconcile;
use crate::{grid, schedule};

/// Thin orchestrator over the whole pipeline: projection, bulletin
/// selection, fan-out fetch, reconciliation.
#[derive(Debug, Clone)]
pub struct WeatherService {
    gateway: ProviderGateway,
}

impl WeatherService {
    /// Build a service around a KMA service key. An empty key is a
    /// configuration error, detected here rather than on first request.
    pub fn new(service_key: String) -> Result<Self, WeatherError> {
        if service_key.trim().is_empty() {
            return Err(WeatherError::Configuration);
        }
        Ok(Self {
            gateway: ProviderGateway::new(service_key),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, WeatherError> {
        let key = config
            .resolved_service_key()
            .ok_or(WeatherError::Configuration)?;
        Self::new(key)
    }

    /// Point the underlying gateway at a different host, e.g. a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.gateway = self.gateway.with_base_url(base_url);
        self
    }

    /// Resolve the current weather snapshot for a coordinate.
    pub async fn get_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherData, WeatherError> {
        self.get_weather_at(latitude, longitude, schedule::now_kst())
            .await
    }

    /// Clock-explicit variant of [`Self::get_weather`]. Aside from the
    /// network round, the pipeline is a pure function of its inputs, so
    /// fixing `now` makes the whole call deterministic.
    pub async fn get_weather_at(
        &self,
        latitude: f64,
        longitude: f64,
        now: NaiveDateTime,
    ) -> Result<WeatherData, WeatherError> {
        let cell = grid::to_grid(latitude, longitude);
        let ultra = schedule::ultra_short_base_time(now);
        let daily = schedule::daily_base_time(now);
        let today = schedule::date_string(now, 0);
        let supplement = schedule::should_fetch_0200(now).then_some(today.as_str());

        tracing::debug!(latitude, longitude, nx = cell.nx, ny = cell.ny, "resolving weather");

        let feeds = self
            .gateway
            .fetch_raw(cell, &ultra, &daily, supplement)
            .await
            .inspect_err(|err| tracing::error!(latitude, longitude, "feed fetch failed: {err}"))?;

        reconcile(&feeds, now, &ultra, &daily)
            .inspect_err(|err| tracing::error!(latitude, longitude, "reconciliation failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_service_key_is_a_configuration_error() {
        let err = WeatherService::new("  ".into()).unwrap_err();
        assert!(matches!(err, WeatherError::Configuration));
    }

    #[test]
    fn unconfigured_config_is_a_configuration_error() {
        let cfg = Config::default();
        if cfg.resolved_service_key().is_some() {
            // Environment override present on this machine; nothing to assert.
            return;
        }
        let err = WeatherService::from_config(&cfg).unwrap_err();
        assert!(matches!(err, WeatherError::Configuration));
    }

    #[test]
    fn configured_key_builds_a_service() {
        assert!(WeatherService::new("SOME_KEY".into()).is_ok());
    }
}
