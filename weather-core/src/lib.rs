//! Core library for the `cityweather` app.
//!
//! This crate defines:
//! - The WeatherAPI.com client and the trait it implements
//! - Merging of the current-weather and forecast responses into one snapshot
//! - The search controller: fetch outcome, generation tracking, view toggles
//! - Display derivations, icon resolution and configuration
//!
//! It is used by `cityweather-cli`, but the controller can drive any front end.

pub mod config;
pub mod controller;
pub mod display;
pub mod error;
pub mod icon;
pub mod merge;
pub mod model;
pub mod provider;

pub use config::Config;
pub use controller::{FetchOutcome, Search, ViewState, WeatherController};
pub use display::ErrorDetail;
pub use error::{HttpError, MergeError, ValidationError};
pub use icon::IconStrategy;
pub use merge::merge;
pub use model::{
    Astro, Condition, CurrentConditions, DayDetails, Forecast, ForecastDay, HourlyConditions,
    Location, LocationQuery, LocationSuggestion, WeatherSnapshot,
};
pub use provider::{WeatherApi, WeatherApiClient};
