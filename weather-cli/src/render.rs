//! Plain-text rendering of a search outcome.
//!
//! Everything here reads controller state; nothing mutates it.

use std::fmt::Write;

use cityweather_core::{
    ErrorDetail, FetchOutcome, ForecastDay, HourlyConditions, IconStrategy, ViewState,
    WeatherSnapshot, display,
};

/// Rendering settings taken from the config.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub icons: IconStrategy,
    pub errors: ErrorDetail,
}

pub fn render(
    outcome: &FetchOutcome,
    view: &ViewState,
    hours: &[HourlyConditions],
    days: &[ForecastDay],
    opts: RenderOptions,
) -> String {
    let mut out = String::new();

    if let Some(message) = &view.validation_message {
        let _ = writeln!(out, "{message}");
    }

    match outcome {
        FetchOutcome::NotStarted => {
            let _ = writeln!(out, "Enter a city to see the weather");
        }
        FetchOutcome::Loading => {
            let _ = writeln!(out, "Loading...");
        }
        FetchOutcome::Error(err) => {
            let _ = writeln!(out, "{}", display::error_message(err, opts.errors));
        }
        FetchOutcome::Success(snapshot) if !snapshot.is_complete() => {
            let _ = writeln!(out, "Current conditions not available");
        }
        FetchOutcome::Success(snapshot) => {
            current_section(&mut out, snapshot, opts.icons);
            details_section(&mut out, snapshot);
            hourly_section(&mut out, hours, view.show_more_hourly);
            weekly_section(&mut out, days, view.show_more_weekly);
            if let Some(day) = &view.selected_day {
                day_details(&mut out, day);
            }
        }
    }

    out
}

fn current_section(out: &mut String, snapshot: &WeatherSnapshot, icons: IconStrategy) {
    let Some(current) = &snapshot.current else { return };
    let condition = current.condition.as_ref();

    if let Some(name) = snapshot.location.as_ref().and_then(|l| l.name.as_deref()) {
        let country = snapshot.location.as_ref().and_then(|l| l.country.as_deref());
        match country {
            Some(country) => {
                let _ = writeln!(out, "{name}, {country}");
            }
            None => {
                let _ = writeln!(out, "{name}");
            }
        }
    }

    let _ = writeln!(out, "{}", display::temperature(current.temp_c));
    let _ = writeln!(out, "Feels like {}", display::temperature(current.feelslike_c));
    let text = condition.and_then(|c| c.text.as_deref());
    let _ = writeln!(
        out,
        "{}",
        text.filter(|t| !t.trim().is_empty()).unwrap_or("Condition not available")
    );
    if let Some(url) = icons.icon_url(condition) {
        let _ = writeln!(out, "Icon: {url}");
    }
    out.push('\n');
}

fn details_section(out: &mut String, snapshot: &WeatherSnapshot) {
    let Some(current) = &snapshot.current else { return };
    let astro = snapshot.today().and_then(|d| d.astro.as_ref());

    let _ = writeln!(out, "Additional Weather Details");
    let rows = [
        ("Temperature", display::temperature(current.temp_c)),
        ("Feels Like", display::temperature(current.feelslike_c)),
        (
            "Condition",
            display::or_placeholder(current.condition.as_ref().and_then(|c| c.text.as_deref()))
                .to_string(),
        ),
        ("Humidity", display::with_unit(current.humidity.as_deref(), "%")),
        ("Pressure", display::with_unit(current.pressure_mb.as_deref(), " hPa")),
        ("Visibility", display::with_unit(current.vis_km.as_deref(), " km")),
        ("UV Index", display::or_placeholder(current.uv.as_deref()).to_string()),
        ("Wind Speed", display::with_unit(current.wind_kph.as_deref(), " km/h")),
        ("Wind Direction", display::or_placeholder(current.wind_dir.as_deref()).to_string()),
        ("Precipitation", display::with_unit(current.precip_mm.as_deref(), " mm")),
        ("Rain", display::opaque(current.rain.as_ref())),
        ("Snow", display::opaque(current.snow.as_ref())),
        ("Sunrise", display::or_placeholder(astro.and_then(|a| a.sunrise.as_deref())).to_string()),
        ("Sunset", display::or_placeholder(astro.and_then(|a| a.sunset.as_deref())).to_string()),
        (
            "Moon Phase",
            display::or_placeholder(astro.and_then(|a| a.moon_phase.as_deref())).to_string(),
        ),
    ];
    for (label, value) in rows {
        let _ = writeln!(out, "  {label}: {value}");
    }
    out.push('\n');
}

fn toggle_hint(show_more: bool) -> &'static str {
    if show_more { "Show Less" } else { "View More" }
}

fn hourly_section(out: &mut String, hours: &[HourlyConditions], show_more: bool) {
    let _ = writeln!(out, "Hourly Forecast");
    for hour in hours {
        let _ = writeln!(
            out,
            "  {:<18} {:>8}  {}",
            display::or_placeholder(hour.time.as_deref()),
            display::temperature(hour.temp_c),
            display::or_placeholder(hour.condition.as_ref().and_then(|c| c.text.as_deref())),
        );
    }
    let _ = writeln!(out, "  [{}]", toggle_hint(show_more));
    out.push('\n');
}

fn weekly_section(out: &mut String, days: &[ForecastDay], show_more: bool) {
    let _ = writeln!(out, "Weekly Forecast");
    for (index, day) in days.iter().enumerate() {
        let details = day.day.as_ref();
        let _ = writeln!(
            out,
            "  {}. {:<12} {:>8}  {}",
            index + 1,
            display::or_placeholder(day.date.as_deref()),
            display::temperature(details.and_then(|d| d.avgtemp_c)),
            display::or_placeholder(
                details.and_then(|d| d.condition.as_ref()).and_then(|c| c.text.as_deref())
            ),
        );
    }
    let _ = writeln!(out, "  [{}]", toggle_hint(show_more));
    out.push('\n');
}

fn day_details(out: &mut String, day: &ForecastDay) {
    let details = day.day.as_ref();
    let _ = writeln!(out, "Details for {}", display::or_placeholder(day.date.as_deref()));
    let rows = [
        ("Max Temp", display::with_unit(details.and_then(|d| d.maxtemp_c.as_deref()), "°C")),
        ("Min Temp", display::with_unit(details.and_then(|d| d.mintemp_c.as_deref()), "°C")),
        ("Avg Temp", display::temperature(details.and_then(|d| d.avgtemp_c))),
        (
            "Condition",
            display::or_placeholder(
                details.and_then(|d| d.condition.as_ref()).and_then(|c| c.text.as_deref()),
            )
            .to_string(),
        ),
        ("Humidity", display::with_unit(details.and_then(|d| d.avghumidity.as_deref()), "%")),
        (
            "Precipitation",
            display::with_unit(details.and_then(|d| d.totalprecip_mm.as_deref()), " mm"),
        ),
    ];
    for (label, value) in rows {
        let _ = writeln!(out, "  {label}: {value}");
    }
}
