//! Search lifecycle and view state for one weather screen.
//!
//! The controller is the only writer of [`FetchOutcome`]. Each search gets a
//! generation id; a resolution is published only while its generation is still the
//! latest, so a slow earlier search can never overwrite a newer one.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    error::{HttpError, MergeError, ValidationError},
    display,
    merge::merge,
    model::{ForecastDay, HourlyConditions, LocationQuery, LocationSuggestion, WeatherSnapshot},
    provider::{DEFAULT_FORECAST_DAYS, WeatherApi},
};

/// Prefixes shorter than this never hit the search endpoint.
pub const MIN_SUGGESTION_PREFIX: usize = 3;

/// Message of the [`MergeError::Unexpected`] published for a cancelled search.
pub const CANCELLED: &str = "search cancelled";

#[derive(Debug, Clone, Default, PartialEq)]
pub enum FetchOutcome {
    #[default]
    NotStarted,
    Loading,
    Success(WeatherSnapshot),
    Error(MergeError),
}

impl FetchOutcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchOutcome::Success(_) | FetchOutcome::Error(_))
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        match self {
            FetchOutcome::Success(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

/// UI-only state. None of it affects what is fetched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub show_more_hourly: bool,
    pub show_more_weekly: bool,
    pub selected_day: Option<ForecastDay>,
    pub suggestions: Vec<String>,
    /// Set when a search was rejected locally; never part of [`FetchOutcome`].
    pub validation_message: Option<String>,
}

/// Handle to one submitted search.
#[derive(Debug)]
pub struct Search {
    id: u64,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl Search {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stop waiting for this search.
    ///
    /// If it is still the latest search, the outcome ends as
    /// `Error(Unexpected("search cancelled"))` instead of staying `Loading`.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until the search has published its result or given up.
    pub async fn finished(self) {
        if let Err(err) = self.task.await {
            warn!(search = self.id, %err, "search task ended abnormally");
        }
    }
}

#[derive(Debug)]
pub struct WeatherController {
    api: Arc<dyn WeatherApi>,
    forecast_days: u8,
    outcome: Arc<watch::Sender<FetchOutcome>>,
    generation: Arc<AtomicU64>,
    in_flight: Option<CancellationToken>,
    view: ViewState,
}

impl WeatherController {
    pub fn new(api: Arc<dyn WeatherApi>) -> Self {
        let (outcome, _) = watch::channel(FetchOutcome::NotStarted);
        Self {
            api,
            forecast_days: DEFAULT_FORECAST_DAYS,
            outcome: Arc::new(outcome),
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: None,
            view: ViewState::default(),
        }
    }

    pub fn with_forecast_days(mut self, days: u8) -> Self {
        self.forecast_days = days;
        self
    }

    /// Receiver that sees every published outcome from now on.
    pub fn subscribe(&self) -> watch::Receiver<FetchOutcome> {
        self.outcome.subscribe()
    }

    pub fn outcome(&self) -> FetchOutcome {
        self.outcome.borrow().clone()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Id of the most recent search, 0 before the first one.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Start a search, superseding any search still in flight.
    ///
    /// An empty city is rejected locally and leaves the outcome untouched.
    /// Must be called from within a Tokio runtime.
    pub fn submit_search(
        &mut self,
        query: impl Into<LocationQuery>,
    ) -> Result<Search, ValidationError> {
        let query = query.into();
        let city = query.city().to_string();

        if city.is_empty() {
            let err = ValidationError::EmptyCity;
            self.view.validation_message = Some(err.to_string());
            return Err(err);
        }

        self.view.validation_message = None;
        self.view.selected_day = None;

        let token = CancellationToken::new();
        let previous = self.in_flight.replace(token.clone());

        let mut id = 0;
        self.outcome.send_modify(|slot| {
            id = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *slot = FetchOutcome::Loading;
        });
        // Superseded only after the bump, so the old search sees a stale generation.
        if let Some(previous) = previous {
            previous.cancel();
        }
        debug!(search = id, %city, "search started");

        let task = tokio::spawn(run_search(
            id,
            city,
            self.forecast_days,
            Arc::clone(&self.api),
            Arc::clone(&self.outcome),
            Arc::clone(&self.generation),
            token.clone(),
        ));

        Ok(Search { id, token, task })
    }

    /// Cancel the search in flight, if any. See [`Search::cancel`].
    pub fn cancel(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }

    pub fn toggle_hourly(&mut self) {
        self.view.show_more_hourly = !self.view.show_more_hourly;
    }

    pub fn toggle_weekly(&mut self) {
        self.view.show_more_weekly = !self.view.show_more_weekly;
    }

    /// Select a day from the weekly list as currently shown.
    ///
    /// Out-of-range indices leave the selection unchanged.
    pub fn select_day(&mut self, index: usize) -> Option<&ForecastDay> {
        let picked = {
            let outcome = self.outcome.borrow();
            outcome.snapshot().and_then(|s| {
                display::visible_days(s, self.view.show_more_weekly).get(index).cloned()
            })
        };

        if let Some(day) = picked {
            self.view.selected_day = Some(day);
            self.view.selected_day.as_ref()
        } else {
            None
        }
    }

    pub fn clear_selected_day(&mut self) {
        self.view.selected_day = None;
    }

    pub fn visible_hours(&self) -> Vec<HourlyConditions> {
        self.outcome
            .borrow()
            .snapshot()
            .map(|s| display::visible_hours(s, self.view.show_more_hourly).to_vec())
            .unwrap_or_default()
    }

    pub fn visible_days(&self) -> Vec<ForecastDay> {
        self.outcome
            .borrow()
            .snapshot()
            .map(|s| display::visible_days(s, self.view.show_more_weekly).to_vec())
            .unwrap_or_default()
    }

    /// Replace the suggestion list with matches for `prefix`.
    pub async fn refresh_suggestions(&mut self, prefix: &str) -> Result<&[String], HttpError> {
        let prefix = prefix.trim();
        if prefix.chars().count() < MIN_SUGGESTION_PREFIX {
            self.view.suggestions.clear();
            return Ok(self.view.suggestions.as_slice());
        }

        let found = self.api.search_locations(prefix).await?;
        self.view.suggestions = found
            .iter()
            .map(LocationSuggestion::label)
            .filter(|label| !label.is_empty())
            .collect();
        debug!(%prefix, count = self.view.suggestions.len(), "suggestions refreshed");

        Ok(self.view.suggestions.as_slice())
    }

    pub fn choose_suggestion(&self, index: usize) -> Option<&str> {
        self.view.suggestions.get(index).map(String::as_str)
    }
}

impl Drop for WeatherController {
    /// Nobody is left to show a cancellation, so the search is retired silently.
    fn drop(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cancel();
    }
}

async fn fetch_snapshot(
    api: Arc<dyn WeatherApi>,
    city: String,
    days: u8,
) -> Result<WeatherSnapshot, MergeError> {
    let (current, forecast) =
        tokio::join!(api.fetch_current(&city), api.fetch_forecast(&city, days));
    merge(current, forecast)
}

async fn run_search(
    id: u64,
    city: String,
    days: u8,
    api: Arc<dyn WeatherApi>,
    outcome: Arc<watch::Sender<FetchOutcome>>,
    generation: Arc<AtomicU64>,
    token: CancellationToken,
) {
    let mut work = tokio::spawn(fetch_snapshot(api, city, days));

    let resolved = tokio::select! {
        _ = token.cancelled() => {
            work.abort();
            debug!(search = id, "search cancelled");
            cancelled()
        }
        joined = &mut work => match joined {
            Ok(Ok(snapshot)) => FetchOutcome::Success(snapshot),
            Ok(Err(err)) => FetchOutcome::Error(err),
            Err(err) => FetchOutcome::Error(MergeError::Unexpected(err.to_string())),
        },
    };

    match &resolved {
        FetchOutcome::Error(err) if !token.is_cancelled() => {
            warn!(search = id, %err, "search failed");
        }
        _ => {}
    }

    let published = outcome.send_if_modified(|slot| {
        if generation.load(Ordering::SeqCst) != id {
            return false;
        }
        // A cancel racing a finished fetch still wins.
        *slot = if token.is_cancelled() { cancelled() } else { resolved };
        true
    });

    if published {
        debug!(search = id, "search resolved");
    } else {
        warn!(search = id, "discarding stale search result");
    }
}

fn cancelled() -> FetchOutcome {
    FetchOutcome::Error(MergeError::Unexpected(CANCELLED.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Condition, CurrentConditions, DayDetails, Forecast};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    #[derive(Debug, Clone)]
    enum Reply {
        Body(WeatherSnapshot),
        Empty,
        Status(u16),
        Panic,
    }

    impl Reply {
        fn into_result(
            self,
            endpoint: &'static str,
        ) -> Result<Option<WeatherSnapshot>, HttpError> {
            match self {
                Reply::Body(body) => Ok(Some(body)),
                Reply::Empty => Ok(None),
                Reply::Status(status) => {
                    Err(HttpError::Status { endpoint, status, message: "Bad Request".into() })
                }
                Reply::Panic => panic!("{endpoint} handler crashed"),
            }
        }
    }

    /// Answers from canned replies; cities listed in `gated` wait for `gate`.
    #[derive(Debug)]
    struct FakeApi {
        current: Reply,
        forecast: Reply,
        gated: Vec<String>,
        gate: Notify,
        requests: AtomicUsize,
        days_seen: Mutex<Vec<u8>>,
        suggestions: Vec<LocationSuggestion>,
    }

    impl FakeApi {
        fn new(current: Reply, forecast: Reply) -> Self {
            Self {
                current,
                forecast,
                gated: Vec::new(),
                gate: Notify::new(),
                requests: AtomicUsize::new(0),
                days_seen: Mutex::new(Vec::new()),
                suggestions: Vec::new(),
            }
        }

        fn gated(mut self, city: &str) -> Self {
            self.gated.push(city.to_string());
            self
        }

        async fn wait_if_gated(&self, city: &str) {
            if self.gated.iter().any(|c| c == city) {
                self.gate.notified().await;
            }
        }

        fn body_for(reply: &Reply, city: &str) -> Reply {
            match reply {
                Reply::Body(body) => {
                    let mut body = body.clone();
                    if let Some(current) = body.current.as_mut() {
                        current.condition =
                            Some(Condition { text: Some(city.to_string()), ..Default::default() });
                    }
                    Reply::Body(body)
                }
                other => other.clone(),
            }
        }
    }

    #[async_trait]
    impl WeatherApi for FakeApi {
        async fn fetch_current(&self, city: &str) -> Result<Option<WeatherSnapshot>, HttpError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            self.wait_if_gated(city).await;
            Self::body_for(&self.current, city).into_result("current")
        }

        async fn fetch_forecast(
            &self,
            _city: &str,
            days: u8,
        ) -> Result<Option<WeatherSnapshot>, HttpError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            self.days_seen.lock().unwrap().push(days);
            self.forecast.clone().into_result("forecast")
        }

        async fn search_locations(
            &self,
            _prefix: &str,
        ) -> Result<Vec<LocationSuggestion>, HttpError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            Ok(self.suggestions.clone())
        }
    }

    fn current_body() -> WeatherSnapshot {
        WeatherSnapshot {
            current: Some(CurrentConditions { temp_c: Some(21.5), ..Default::default() }),
            ..Default::default()
        }
    }

    fn forecast_body(days: usize) -> WeatherSnapshot {
        let forecastday = (0..days)
            .map(|d| ForecastDay {
                date: Some(format!("2024-06-{:02}", d + 1)),
                day: Some(DayDetails { avgtemp_c: Some(20.0 + d as f64), ..Default::default() }),
                hour: (0..24)
                    .map(|h| HourlyConditions { temp_c: Some(h as f64), ..Default::default() })
                    .collect(),
                astro: None,
            })
            .collect();
        WeatherSnapshot { forecast: Some(Forecast { forecastday }), ..Default::default() }
    }

    fn happy_api() -> FakeApi {
        FakeApi::new(Reply::Body(current_body()), Reply::Body(forecast_body(7)))
    }

    #[tokio::test]
    async fn starts_not_started_with_default_view() {
        let controller = WeatherController::new(Arc::new(happy_api()));
        assert_eq!(controller.outcome(), FetchOutcome::NotStarted);
        assert_eq!(controller.view(), &ViewState::default());
        assert_eq!(controller.generation(), 0);
    }

    #[tokio::test]
    async fn empty_city_is_rejected_without_transition() {
        let api = Arc::new(happy_api());
        let mut controller = WeatherController::new(api.clone());
        let mut rx = controller.subscribe();

        for city in ["", "   "] {
            let err = controller.submit_search(city).unwrap_err();
            assert_eq!(err, ValidationError::EmptyCity);
        }

        assert_eq!(controller.view().validation_message.as_deref(), Some("Please enter a city."));
        assert_eq!(controller.outcome(), FetchOutcome::NotStarted);
        assert!(!rx.has_changed().unwrap());
        assert_eq!(api.requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn subscriber_sees_loading_then_success() {
        let api = Arc::new(happy_api().gated("Paris"));
        let mut controller = WeatherController::new(api.clone());
        let mut rx = controller.subscribe();
        assert_eq!(*rx.borrow(), FetchOutcome::NotStarted);

        let search = controller.submit_search("Paris").expect("valid city");

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), FetchOutcome::Loading);

        api.gate.notify_one();
        rx.changed().await.unwrap();
        let outcome = rx.borrow_and_update().clone();
        search.finished().await;

        let snapshot = outcome.snapshot().expect("success");
        assert_eq!(snapshot.current.as_ref().and_then(|c| c.temp_c), Some(21.5));
        assert_eq!(snapshot.forecast_days()[0].day.as_ref().and_then(|d| d.avgtemp_c), Some(20.0));
    }

    #[tokio::test]
    async fn successful_search_clears_validation_message() {
        let mut controller = WeatherController::new(Arc::new(happy_api()));
        let _ = controller.submit_search("");
        controller.submit_search("Paris").unwrap().finished().await;

        assert!(controller.view().validation_message.is_none());
        assert!(matches!(controller.outcome(), FetchOutcome::Success(_)));
    }

    #[tokio::test]
    async fn requests_the_configured_day_count() {
        let api = Arc::new(happy_api());
        let mut controller = WeatherController::new(api.clone()).with_forecast_days(3);
        controller.submit_search("Oslo").unwrap().finished().await;
        assert_eq!(*api.days_seen.lock().unwrap(), vec![3u8]);

        let mut controller = WeatherController::new(api.clone());
        controller.submit_search("Oslo").unwrap().finished().await;
        assert_eq!(api.days_seen.lock().unwrap().last(), Some(&7u8));
    }

    #[tokio::test]
    async fn http_failure_publishes_error() {
        let api = FakeApi::new(Reply::Status(400), Reply::Body(forecast_body(7)));
        let mut controller = WeatherController::new(Arc::new(api));
        controller.submit_search("Nowhere").unwrap().finished().await;

        assert_eq!(
            controller.outcome(),
            FetchOutcome::Error(MergeError::ApiError {
                status: Some(400),
                message: "Bad Request".into()
            })
        );
    }

    #[tokio::test]
    async fn empty_body_publishes_no_data() {
        let api = FakeApi::new(Reply::Body(current_body()), Reply::Empty);
        let mut controller = WeatherController::new(Arc::new(api));
        controller.submit_search("Paris").unwrap().finished().await;

        assert_eq!(controller.outcome(), FetchOutcome::Error(MergeError::NoData));
    }

    #[tokio::test]
    async fn newer_search_wins_over_slow_older_one() {
        let api = Arc::new(happy_api().gated("Slowtown"));
        let mut controller = WeatherController::new(api.clone());

        let first = controller.submit_search("Slowtown").unwrap();
        let second = controller.submit_search("Fastville").unwrap();
        let second_id = second.id();
        assert!(second_id > first.id());
        assert!(first.is_cancelled());

        second.finished().await;
        api.gate.notify_one();
        first.finished().await;

        let outcome = controller.outcome();
        let text = outcome
            .snapshot()
            .and_then(|s| s.current.as_ref())
            .and_then(|c| c.condition.as_ref())
            .and_then(|c| c.text.clone());
        assert_eq!(text.as_deref(), Some("Fastville"));
        assert_eq!(controller.generation(), second_id);
    }

    #[tokio::test]
    async fn panicking_fetch_publishes_unexpected_error() {
        let api = FakeApi::new(Reply::Panic, Reply::Body(forecast_body(7)));
        let mut controller = WeatherController::new(Arc::new(api));
        let mut rx = controller.subscribe();

        let search = controller.submit_search("Paris").unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), FetchOutcome::Loading);

        rx.changed().await.unwrap();
        let outcome = rx.borrow_and_update().clone();
        search.finished().await;

        match outcome {
            FetchOutcome::Error(MergeError::Unexpected(msg)) => {
                assert!(msg.contains("panicked"), "got {msg}");
            }
            other => panic!("expected Unexpected, got {other:?}"),
        }
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn cancelled_search_ends_in_error() {
        let api = Arc::new(happy_api().gated("Paris"));
        let mut controller = WeatherController::new(api.clone());
        let mut rx = controller.subscribe();

        let search = controller.submit_search("Paris").unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), FetchOutcome::Loading);

        search.cancel();
        search.finished().await;

        assert_eq!(
            controller.outcome(),
            FetchOutcome::Error(MergeError::Unexpected(CANCELLED.to_string()))
        );
        assert!(controller.outcome().is_terminal());
    }

    #[tokio::test]
    async fn controller_cancel_ends_in_error() {
        let api = Arc::new(happy_api().gated("Paris"));
        let mut controller = WeatherController::new(api.clone());
        let search = controller.submit_search("Paris").unwrap();

        controller.cancel();
        assert!(search.is_cancelled());
        search.finished().await;

        assert_eq!(
            controller.outcome(),
            FetchOutcome::Error(MergeError::Unexpected(CANCELLED.to_string()))
        );
    }

    #[tokio::test]
    async fn cancel_after_success_keeps_snapshot() {
        let mut controller = WeatherController::new(Arc::new(happy_api()));
        let search = controller.submit_search("Paris").unwrap();
        let id = search.id();
        search.finished().await;

        controller.cancel();
        assert!(matches!(controller.outcome(), FetchOutcome::Success(_)));
        assert_eq!(controller.generation(), id);
    }

    #[tokio::test]
    async fn dropping_controller_cancels_in_flight_search() {
        let api = Arc::new(happy_api().gated("Paris"));
        let mut controller = WeatherController::new(api.clone());
        let rx = controller.subscribe();
        let search = controller.submit_search("Paris").unwrap();

        drop(controller);
        assert!(search.is_cancelled());
        search.finished().await;

        assert_eq!(*rx.borrow(), FetchOutcome::Loading);
    }

    #[tokio::test]
    async fn toggles_drive_visible_lists() {
        let mut controller = WeatherController::new(Arc::new(happy_api()));
        assert!(controller.visible_hours().is_empty());

        controller.submit_search("Paris").unwrap().finished().await;
        assert_eq!(controller.visible_hours().len(), 12);
        assert_eq!(controller.visible_days().len(), 3);

        controller.toggle_hourly();
        controller.toggle_weekly();
        assert_eq!(controller.visible_hours().len(), 24);
        assert_eq!(controller.visible_days().len(), 7);

        controller.toggle_hourly();
        assert_eq!(controller.visible_hours().len(), 12);
    }

    #[tokio::test]
    async fn select_day_uses_visible_weekly_list() {
        let mut controller = WeatherController::new(Arc::new(happy_api()));
        assert!(controller.select_day(0).is_none());

        controller.submit_search("Paris").unwrap().finished().await;

        let picked = controller.select_day(2).and_then(|d| d.date.clone());
        assert_eq!(picked.as_deref(), Some("2024-06-03"));

        assert!(controller.select_day(5).is_none());
        assert_eq!(
            controller.view().selected_day.as_ref().and_then(|d| d.date.as_deref()),
            Some("2024-06-03")
        );

        controller.toggle_weekly();
        let picked = controller.select_day(5).and_then(|d| d.date.clone());
        assert_eq!(picked.as_deref(), Some("2024-06-06"));

        controller.clear_selected_day();
        assert!(controller.view().selected_day.is_none());
    }

    #[tokio::test]
    async fn new_search_clears_selected_day_but_keeps_toggles() {
        let mut controller = WeatherController::new(Arc::new(happy_api()));
        controller.submit_search("Paris").unwrap().finished().await;
        controller.toggle_weekly();
        controller.select_day(1);

        controller.submit_search("Rome").unwrap().finished().await;
        assert!(controller.view().selected_day.is_none());
        assert!(controller.view().show_more_weekly);
    }

    #[tokio::test]
    async fn short_prefix_clears_suggestions_without_request() {
        let mut api = happy_api();
        api.suggestions = vec![LocationSuggestion {
            name: Some("Paris".into()),
            country: Some("France".into()),
            ..Default::default()
        }];
        let api = Arc::new(api);
        let mut controller = WeatherController::new(api.clone());

        let found = controller.refresh_suggestions("Par").await.unwrap().to_vec();
        assert_eq!(found, vec!["Paris, France".to_string()]);
        assert_eq!(controller.choose_suggestion(0), Some("Paris, France"));

        let before = api.requests.load(Ordering::SeqCst);
        assert!(controller.refresh_suggestions("Pa").await.unwrap().is_empty());
        assert_eq!(api.requests.load(Ordering::SeqCst), before);
        assert!(controller.choose_suggestion(0).is_none());
    }
}
