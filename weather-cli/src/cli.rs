use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::{CustomType, InquireError, Password, PasswordDisplayMode, Select, Text};
use tracing::{debug, info};

use cityweather_core::{
    Config, ErrorDetail, FetchOutcome, IconStrategy, WeatherApiClient, WeatherController,
};

use crate::render::{self, RenderOptions};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "Current and forecast weather for a city")]
pub struct Cli {
    /// WeatherAPI.com key; overrides the configured one.
    #[arg(long, env = "WEATHERAPI_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key and display preferences.
    Configure,

    /// Show weather for a city.
    Show {
        /// City name; falls back to the configured default city.
        city: Option<String>,

        /// Show all 24 hours instead of the first 12.
        #[arg(long)]
        all_hours: bool,

        /// Show 7 days instead of 3.
        #[arg(long)]
        all_days: bool,

        /// Show details for this day of the weekly list (1-based).
        #[arg(long, value_name = "N")]
        day: Option<usize>,
    },

    /// List locations matching a prefix.
    Suggest {
        prefix: String,
    },

    /// Interactive session: search, toggle lists and pick days.
    Browse {
        /// City to search first.
        city: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let Cli { api_key, command } = self;

        match command {
            Command::Configure => configure(),
            Command::Show { city, all_hours, all_days, day } => {
                let cfg = Config::load()?;
                let mut controller = build_controller(&cfg, api_key.as_deref())?;
                let city = city.or_else(|| cfg.default_city.clone()).unwrap_or_default();

                search(&mut controller, &city).await;
                if all_hours {
                    controller.toggle_hourly();
                }
                if all_days {
                    controller.toggle_weekly();
                }
                if let Some(n) = day {
                    if n == 0 || controller.select_day(n - 1).is_none() {
                        println!("Day {n} is not in the weekly list.");
                    }
                }

                print_screen(&controller, render_options(&cfg));
                Ok(())
            }
            Command::Suggest { prefix } => {
                let cfg = Config::load()?;
                let mut controller = build_controller(&cfg, api_key.as_deref())?;
                let suggestions = controller
                    .refresh_suggestions(&prefix)
                    .await
                    .context("Failed to fetch location suggestions")?;

                if suggestions.is_empty() {
                    println!("No suggestions for '{}'.", prefix.trim());
                }
                for (i, label) in suggestions.iter().enumerate() {
                    println!("{}. {label}", i + 1);
                }
                Ok(())
            }
            Command::Browse { city } => {
                let cfg = Config::load()?;
                let controller = build_controller(&cfg, api_key.as_deref())?;
                browse(controller, city.or_else(|| cfg.default_city.clone()), render_options(&cfg))
                    .await
            }
        }
    }
}

fn render_options(cfg: &Config) -> RenderOptions {
    RenderOptions { icons: cfg.icons, errors: cfg.errors }
}

fn build_controller(cfg: &Config, api_key: Option<&str>) -> anyhow::Result<WeatherController> {
    let key = match api_key.map(str::trim) {
        Some(key) if !key.is_empty() => key,
        _ => cfg.api_key()?,
    };

    let mut client = WeatherApiClient::new(key);
    if let Some(base_url) = &cfg.base_url {
        client = client.with_base_url(base_url.as_str());
    }
    debug!(base_url = client.base_url(), days = cfg.forecast_days, "client ready");

    Ok(WeatherController::new(Arc::new(client)).with_forecast_days(cfg.forecast_days))
}

/// Run one search to completion. Rejected input only updates the view.
async fn search(controller: &mut WeatherController, city: &str) {
    if let Ok(search) = controller.submit_search(city) {
        search.finished().await;
    }
}

fn print_screen(controller: &WeatherController, opts: RenderOptions) {
    let outcome = controller.outcome();
    let text = render::render(
        &outcome,
        controller.view(),
        &controller.visible_hours(),
        &controller.visible_days(),
        opts,
    );
    print!("{text}");

    if matches!(outcome, FetchOutcome::Success(_)) {
        println!("\nUpdated {}", Local::now().format("%H:%M"));
    }
}

/// What a line typed in the browse session asks for.
#[derive(Debug, PartialEq, Eq)]
enum BrowseInput {
    Quit,
    ToggleHourly,
    ToggleWeekly,
    SelectDay(usize),
    Suggest(String),
    Search(String),
}

impl BrowseInput {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        match line {
            "q" | ":q" => BrowseInput::Quit,
            "h" => BrowseInput::ToggleHourly,
            "w" => BrowseInput::ToggleWeekly,
            _ => {
                if let Some(prefix) = line.strip_prefix('?') {
                    BrowseInput::Suggest(prefix.trim().to_string())
                } else if let Ok(n) = line.parse::<usize>() {
                    BrowseInput::SelectDay(n)
                } else {
                    BrowseInput::Search(line.to_string())
                }
            }
        }
    }
}

async fn browse(
    mut controller: WeatherController,
    city: Option<String>,
    opts: RenderOptions,
) -> anyhow::Result<()> {
    if let Some(city) = city {
        search(&mut controller, &city).await;
        print_screen(&controller, opts);
    }

    loop {
        let prompt = Text::new("City (h/w toggle lists, 1-7 pick day, ?prefix suggest, q quit):");
        let line = match prompt.prompt() {
            Ok(line) => line,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err.into()),
        };

        match BrowseInput::parse(&line) {
            BrowseInput::Quit => break,
            BrowseInput::ToggleHourly => controller.toggle_hourly(),
            BrowseInput::ToggleWeekly => controller.toggle_weekly(),
            BrowseInput::SelectDay(n) => {
                if n == 0 || controller.select_day(n - 1).is_none() {
                    println!("Day {n} is not in the weekly list.");
                    continue;
                }
            }
            BrowseInput::Suggest(prefix) => {
                let suggestions = controller.refresh_suggestions(&prefix).await?.to_vec();
                if suggestions.is_empty() {
                    println!("No suggestions for '{prefix}'.");
                    continue;
                }
                match Select::new("Pick a location:", suggestions).prompt() {
                    Ok(choice) => search(&mut controller, &choice).await,
                    Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                        continue;
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            BrowseInput::Search(city) => search(&mut controller, &city).await,
        }

        print_screen(&controller, opts);
    }

    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let key = Password::new("WeatherAPI.com API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()?;
    if !key.trim().is_empty() {
        cfg.set_api_key(key.trim());
    }

    let city = Text::new("Default city (optional):")
        .with_default(cfg.default_city.as_deref().unwrap_or(""))
        .prompt()?;
    cfg.default_city = Some(city.trim().to_string()).filter(|c| !c.is_empty());

    cfg.forecast_days =
        CustomType::<u8>::new("Forecast days:").with_default(cfg.forecast_days).prompt()?;

    let icons =
        Select::new("Condition icons from:", vec!["provider-url", "lookup-table"]).prompt()?;
    cfg.icons = parse_icon_strategy(icons);

    let errors = Select::new("Error messages:", vec!["detailed", "generic"]).prompt()?;
    cfg.errors = parse_error_detail(errors);

    let path = cfg.save()?;
    info!(path = %path.display(), "configuration saved");
    println!("Saved configuration to {}", path.display());

    Ok(())
}

fn parse_icon_strategy(value: &str) -> IconStrategy {
    match value {
        "lookup-table" => IconStrategy::LookupTable,
        _ => IconStrategy::ProviderUrl,
    }
}

fn parse_error_detail(value: &str) -> ErrorDetail {
    match value {
        "generic" => ErrorDetail::Generic,
        _ => ErrorDetail::Detailed,
    }
}
