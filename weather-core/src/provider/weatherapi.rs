use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{
    error::HttpError,
    model::{CurrentConditionsResponse, ForecastResponse, LocationSuggestion},
};

use super::WeatherApi;

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";

/// WeatherAPI.com client. One instance per owner; there is no shared global client.
#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    /// Point the client at another host, e.g. a local test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}.json", self.base_url, endpoint)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, HttpError> {
        let url = self.endpoint_url(endpoint);
        debug!(endpoint, %url, "requesting WeatherAPI");

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(|source| HttpError::Transport { endpoint, source })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| HttpError::Transport { endpoint, source })?;

        if !status.is_success() {
            let message = error_message(status, &body);
            warn!(endpoint, status = status.as_u16(), %message, "WeatherAPI request failed");
            return Err(HttpError::Status { endpoint, status: status.as_u16(), message });
        }

        if body.trim().is_empty() {
            debug!(endpoint, "WeatherAPI returned an empty body");
            return Ok(None);
        }

        serde_json::from_str::<Option<T>>(&body)
            .map_err(|source| HttpError::Decode { endpoint, source })
    }
}

#[derive(Debug, Deserialize)]
struct WaErrorBody {
    error: WaErrorDetail,
}

#[derive(Debug, Deserialize)]
struct WaErrorDetail {
    message: String,
}

/// Prefer the provider's own explanation, then the reason phrase, then the raw body.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<WaErrorBody>(body) {
        return parsed.error.message;
    }

    match status.canonical_reason() {
        Some(reason) => reason.to_string(),
        None => truncate_body(body),
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[async_trait]
impl WeatherApi for WeatherApiClient {
    async fn fetch_current(
        &self,
        city: &str,
    ) -> Result<Option<CurrentConditionsResponse>, HttpError> {
        self.get_json("current", &[("q", city)]).await
    }

    async fn fetch_forecast(
        &self,
        city: &str,
        days: u8,
    ) -> Result<Option<ForecastResponse>, HttpError> {
        let days = days.to_string();
        self.get_json("forecast", &[("q", city), ("days", days.as_str())]).await
    }

    async fn search_locations(&self, prefix: &str) -> Result<Vec<LocationSuggestion>, HttpError> {
        let found: Option<Vec<LocationSuggestion>> =
            self.get_json("search", &[("q", prefix)]).await?;
        Ok(found.unwrap_or_default())
    }
}
