use crate::{
    error::{HttpError, MergeError},
    model::{CurrentConditionsResponse, ForecastResponse, WeatherSnapshot},
};

/// Combine the two endpoint results into one snapshot.
///
/// The forecast body is the base; only its `current` is replaced by the one from
/// `current.json`. A failed request wins over an empty body, and the current-weather
/// failure is reported when both requests failed.
pub fn merge(
    current: Result<Option<CurrentConditionsResponse>, HttpError>,
    forecast: Result<Option<ForecastResponse>, HttpError>,
) -> Result<WeatherSnapshot, MergeError> {
    let (current, forecast) = match (current, forecast) {
        (Ok(current), Ok(forecast)) => (current, forecast),
        (Err(err), _) | (_, Err(err)) => return Err(err.into()),
    };

    let (Some(current), Some(forecast)) = (current, forecast) else {
        return Err(MergeError::NoData);
    };

    Ok(WeatherSnapshot { current: current.current, ..forecast })
}
