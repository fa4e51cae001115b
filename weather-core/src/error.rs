use thiserror::Error;

/// A single provider request that did not yield a usable body.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Failed to send request to WeatherAPI.com ({endpoint}): {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("WeatherAPI {endpoint} request failed with status {status}: {message}")]
    Status { endpoint: &'static str, status: u16, message: String },

    #[error("Failed to parse WeatherAPI {endpoint} JSON: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl HttpError {
    /// HTTP status, when the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            HttpError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            HttpError::Decode { .. } => None,
        }
    }
}

/// Why a search produced no snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("API error: {} - {message}", status_label(.status))]
    ApiError { status: Option<u16>, message: String },

    #[error("No data available")]
    NoData,

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

fn status_label(status: &Option<u16>) -> String {
    status.map(|s| s.to_string()).unwrap_or_else(|| "no response".to_string())
}

impl From<HttpError> for MergeError {
    fn from(err: HttpError) -> Self {
        let status = err.status();
        match err {
            HttpError::Status { message, .. } => MergeError::ApiError { status, message },
            HttpError::Transport { .. } => {
                MergeError::ApiError { status, message: err.to_string() }
            }
            HttpError::Decode { .. } => MergeError::Unexpected(err.to_string()),
        }
    }
}

/// Input rejected before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a city.")]
    EmptyCity,
}
