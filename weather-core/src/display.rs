//! Pure derivations from a snapshot and the view toggles to what gets shown.

use serde::{Deserialize, Serialize};

use crate::{
    error::MergeError,
    model::{ForecastDay, HourlyConditions, WeatherSnapshot},
};

pub const HOURS_COLLAPSED: usize = 12;
pub const HOURS_EXPANDED: usize = 24;
pub const DAYS_COLLAPSED: usize = 3;
pub const DAYS_EXPANDED: usize = 7;

pub const PLACEHOLDER: &str = "N/A";
pub const GENERIC_ERROR: &str = "Unable to fetch weather data. Try again later.";

/// How much of a failed search is shown to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorDetail {
    /// The merger's own message, e.g. "API error: 400 - No matching location found.".
    #[default]
    Detailed,
    /// Always the same static message.
    Generic,
}

/// Today's hours, 12 or 24 of them.
pub fn visible_hours(snapshot: &WeatherSnapshot, show_more: bool) -> &[HourlyConditions] {
    let hours = snapshot.today().map(|day| day.hour.as_slice()).unwrap_or_default();
    let limit = if show_more { HOURS_EXPANDED } else { HOURS_COLLAPSED };
    &hours[..hours.len().min(limit)]
}

/// Forecast days, 3 or 7 of them.
pub fn visible_days(snapshot: &WeatherSnapshot, show_more: bool) -> &[ForecastDay] {
    let days = snapshot.forecast_days();
    let limit = if show_more { DAYS_EXPANDED } else { DAYS_COLLAPSED };
    &days[..days.len().min(limit)]
}

pub fn error_message(err: &MergeError, detail: ErrorDetail) -> String {
    match detail {
        ErrorDetail::Detailed => err.to_string(),
        ErrorDetail::Generic => GENERIC_ERROR.to_string(),
    }
}

pub fn or_placeholder(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => PLACEHOLDER,
    }
}

/// Celsius with one decimal, e.g. `20.0°C`.
pub fn temperature(value: Option<f64>) -> String {
    match value {
        Some(t) => format!("{t:.1}°C"),
        None => PLACEHOLDER.to_string(),
    }
}

/// Appends a unit only when there is a value to attach it to.
pub fn with_unit(value: Option<&str>, unit: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => format!("{v}{unit}"),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Untyped provider fields such as `rain` and `snow`.
pub fn opaque(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => PLACEHOLDER.to_string(),
        Some(serde_json::Value::String(s)) => or_placeholder(Some(s)).to_string(),
        Some(other) => other.to_string(),
    }
}
