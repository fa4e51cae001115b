//! Wire and domain model for WeatherAPI.com responses.
//!
//! Almost every field is optional: the provider omits or nulls fields freely and a
//! missing value must render as a placeholder, never fail the whole response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-text location the user searched for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationQuery {
    pub city: String,
    /// Accepted from callers that pass coordinates; never sent to the provider.
    pub latitude: Option<String>,
    /// See [`LocationQuery::latitude`].
    pub longitude: Option<String>,
}

impl LocationQuery {
    pub fn new(city: impl Into<String>) -> Self {
        Self { city: city.into(), latitude: None, longitude: None }
    }

    pub fn with_coordinates(
        mut self,
        latitude: impl Into<String>,
        longitude: impl Into<String>,
    ) -> Self {
        self.latitude = Some(latitude.into());
        self.longitude = Some(longitude.into());
        self
    }

    /// City with surrounding whitespace removed.
    pub fn city(&self) -> &str {
        self.city.trim()
    }
}

impl From<&str> for LocationQuery {
    fn from(city: &str) -> Self {
        Self::new(city)
    }
}

impl From<String> for LocationQuery {
    fn from(city: String) -> Self {
        Self::new(city)
    }
}

/// Merged, render-ready weather for one city.
///
/// Both `current.json` and `forecast.json` return this shape, so it doubles as the
/// body type of either endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub current: Option<CurrentConditions>,
    #[serde(default)]
    pub forecast: Option<Forecast>,
}

/// Body of `current.json`.
pub type CurrentConditionsResponse = WeatherSnapshot;

/// Body of `forecast.json`.
pub type ForecastResponse = WeatherSnapshot;

impl WeatherSnapshot {
    /// A snapshot is only worth rendering once current conditions are present.
    pub fn is_complete(&self) -> bool {
        self.current.is_some()
    }

    /// Forecast days in provider order, day 0 being today.
    pub fn forecast_days(&self) -> &[ForecastDay] {
        self.forecast.as_ref().map(|f| f.forecastday.as_slice()).unwrap_or_default()
    }

    pub fn today(&self) -> Option<&ForecastDay> {
        self.forecast_days().first()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, deserialize_with = "opaque::string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub lat: Option<String>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub lon: Option<String>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub tz_id: Option<String>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub localtime: Option<String>,
}

/// Current conditions. Only the temperatures are numeric; everything else is a
/// display string exactly as the provider sent it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    #[serde(default)]
    pub temp_c: Option<f64>,
    #[serde(default)]
    pub feelslike_c: Option<f64>,
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub uv: Option<String>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub vis_km: Option<String>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub pressure_mb: Option<String>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub humidity: Option<String>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub wind_kph: Option<String>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub wind_dir: Option<String>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub precip_mm: Option<String>,
    #[serde(default)]
    pub rain: Option<Value>,
    #[serde(default)]
    pub snow: Option<Value>,
    #[serde(default)]
    pub last_updated: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default, deserialize_with = "opaque::string")]
    pub text: Option<String>,
    /// Provider icon URL, usually protocol-relative.
    #[serde(default, deserialize_with = "opaque::string")]
    pub icon: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    #[serde(default, deserialize_with = "opaque::list")]
    pub forecastday: Vec<ForecastDay>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// Provider-formatted date label (`YYYY-MM-DD`), never parsed.
    #[serde(default, deserialize_with = "opaque::string")]
    pub date: Option<String>,
    #[serde(default)]
    pub day: Option<DayDetails>,
    /// 24 entries starting at midnight.
    #[serde(default, deserialize_with = "opaque::list")]
    pub hour: Vec<HourlyConditions>,
    #[serde(default)]
    pub astro: Option<Astro>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayDetails {
    #[serde(default)]
    pub avgtemp_c: Option<f64>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub maxtemp_c: Option<String>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub mintemp_c: Option<String>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub avgvis_km: Option<String>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub avghumidity: Option<String>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub maxwind_kph: Option<String>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub totalprecip_mm: Option<String>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub uv: Option<String>,
    #[serde(default)]
    pub condition: Option<Condition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyConditions {
    #[serde(default, deserialize_with = "opaque::string")]
    pub time: Option<String>,
    #[serde(default)]
    pub temp_c: Option<f64>,
    #[serde(default)]
    pub condition: Option<Condition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Astro {
    #[serde(default, deserialize_with = "opaque::string")]
    pub sunrise: Option<String>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub sunset: Option<String>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub moon_phase: Option<String>,
}

/// One entry of `search.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationSuggestion {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "opaque::string")]
    pub country: Option<String>,
}

impl LocationSuggestion {
    /// "Name, Region, Country" with blank parts left out.
    pub fn label(&self) -> String {
        [&self.name, &self.region, &self.country]
            .into_iter()
            .filter_map(|part| part.as_deref().map(str::trim))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Lenient field decoders for provider values whose type drifts between
/// string, number and null.
mod opaque {
    use serde::{Deserialize, Deserializer, de::DeserializeOwned};
    use serde_json::Value;

    pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        })
    }

    /// `null` lists decode as empty.
    pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
    }
}
