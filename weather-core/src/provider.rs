use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::HttpError,
    model::{CurrentConditionsResponse, ForecastResponse, LocationSuggestion},
};

pub mod weatherapi;

pub use weatherapi::WeatherApiClient;

/// Number of forecast days requested when the caller does not say otherwise.
pub const DEFAULT_FORECAST_DAYS: u8 = 7;

/// Read-only access to a weather data provider.
///
/// `Ok(None)` means the provider answered successfully with an empty body.
#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    async fn fetch_current(
        &self,
        city: &str,
    ) -> Result<Option<CurrentConditionsResponse>, HttpError>;

    async fn fetch_forecast(
        &self,
        city: &str,
        days: u8,
    ) -> Result<Option<ForecastResponse>, HttpError>;

    /// Locations whose name starts with `prefix`.
    async fn search_locations(&self, prefix: &str) -> Result<Vec<LocationSuggestion>, HttpError>;
}
