// browsing_core: Rust/WASM core of the browsing tracker extension.
// Trackers and scoring live here; JS forwards DOM events and owns messaging.

mod background;
mod browsing;
mod clock;
mod error;
mod host;
mod idle;
mod js_host;
pub mod logging;
mod messages;
mod navigation;
mod recorder;
mod scoring;
mod scroll;
mod store;
mod time_tracker;
mod types;
mod visibility;

use std::rc::Rc;

use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

pub use background::{sort_by_last_visit, BackgroundService, BrowserApi};
pub use browsing::BrowsingTracker;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{StoreError, TrackerError};
pub use host::{ActivitySink, PageHost};
pub use idle::{IdleSignal, IdleTracker};
pub use js_host::{BrowserPage, JsActivitySink, JsActivityStore, JsBrowserApi};
pub use messages::*;
pub use navigation::{LocationProvider, Navigation, NavigationHandler, NavigationSignal};
pub use recorder::ActivityRecorder;
pub use scoring::{
    compute_metrics, normalize_weights, score_domain, score_records, weighted_score, DomainMetrics,
};
pub use scroll::{ScrollTracker, ScrollUpdate};
pub use store::{ActivityQuery, ActivityStore, MemoryStore};
pub use time_tracker::TimeTracker;
pub use types::*;
pub use visibility::{VisibilityEdge, VisibilitySignal, VisibilityTracker};

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn parse_config<T: DeserializeOwned>(config_json: &str) -> Result<T, TrackerError> {
    serde_json::from_str(config_json).map_err(|e| TrackerError::InvalidConfig(e.to_string()))
}

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Content-script entry point. JS forwards DOM events as JSON and arms one
/// timer for `next_wakeup`, calling `tick` when it fires.
#[wasm_bindgen]
pub struct ContentEngine {
    tracker: BrowsingTracker<BrowserPage, JsActivitySink, SystemClock>,
}

#[wasm_bindgen]
impl ContentEngine {
    /// `send_message(json)` receives each flushed record as a `save-activity`
    /// request and may return a Promise.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, send_message: js_sys::Function) -> Result<ContentEngine, JsValue> {
        let config: TrackerConfig = parse_config(config_json).map_err(to_js_error)?;
        logging::init(&config.log_level);

        Ok(ContentEngine {
            tracker: BrowsingTracker::new(
                config,
                BrowserPage::from_global(),
                JsActivitySink::new(send_message),
                SystemClock,
            ),
        })
    }

    pub fn start(&mut self) -> Result<(), JsValue> {
        self.tracker.start().map_err(to_js_error)
    }

    /// Routes one page event, e.g. `{"type":"visibilityChange","hidden":true}`.
    pub fn dispatch(&mut self, event_json: &str) -> Result<(), JsValue> {
        let event: PageEvent = serde_json::from_str(event_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid event: {}", e)))?;
        self.tracker.dispatch(event);
        Ok(())
    }

    pub fn tick(&mut self) {
        self.tracker.tick();
    }

    /// Epoch milliseconds of the next timer deadline, if any.
    pub fn next_wakeup(&self) -> Option<f64> {
        self.tracker.next_wakeup().map(|at| at.as_millis() as f64)
    }

    /// Current page view as JSON, or `null` when stopped.
    pub fn snapshot(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.tracker.current_record())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn stop(&mut self) {
        self.tracker.stop();
    }
}

/// Background entry point. `backend` is a JS object implementing the store
/// methods (`saveActivity`, `upsertScore`, `queryActivities`, `listScores`)
/// and the browser methods (`activeTab`, `searchHistory`).
#[wasm_bindgen]
pub struct BackgroundEngine {
    service: Rc<BackgroundService<JsActivityStore, JsBrowserApi, SystemClock>>,
}

#[wasm_bindgen]
impl BackgroundEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, backend: JsValue) -> Result<BackgroundEngine, JsValue> {
        let config: BackgroundConfig = parse_config(config_json).map_err(to_js_error)?;
        logging::init(&config.log_level);

        Ok(BackgroundEngine {
            service: Rc::new(BackgroundService::new(
                config,
                JsActivityStore::new(backend.clone()),
                JsBrowserApi::new(backend),
                SystemClock,
            )),
        })
    }

    /// Handles one request JSON and resolves with the response JSON.
    pub fn handle(&self, request_json: String) -> js_sys::Promise {
        let service = Rc::clone(&self.service);
        future_to_promise(async move {
            let response = handle_request_json(&service, &request_json).await;
            serde_json::to_string(&response)
                .map(|json| JsValue::from_str(&json))
                .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
        })
    }
}

async fn handle_request_json<S, B, C>(
    service: &BackgroundService<S, B, C>,
    request_json: &str,
) -> Response
where
    S: ActivityStore,
    B: BrowserApi,
    C: Clock,
{
    match serde_json::from_str::<Request>(request_json) {
        Ok(request) => service.handle(request).await,
        Err(err) => {
            tracing::warn!(error = %err, "rejected malformed request");
            Response::error("Invalid request format")
        }
    }
}

/// Scores a domain from a JSON array of activity records with default weights.
#[wasm_bindgen]
pub fn score_activities(domain: &str, records_json: &str, now_ms: f64) -> Result<String, JsValue> {
    let records: Vec<ActivityRecord> = serde_json::from_str(records_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid records: {}", e)))?;
    let score = score_domain(
        domain,
        &records,
        &ScoringConfig::default(),
        Timestamp::from_millis(now_ms as u64),
    );
    serde_json::to_string(&score).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[derive(Default)]
    struct NoBrowser;

    #[async_trait::async_trait(?Send)]
    impl BrowserApi for NoBrowser {
        async fn active_tab(&self) -> Result<Option<TabInfo>, StoreError> {
            Ok(None)
        }

        async fn search_history(
            &self,
            _start_time: Timestamp,
            _end_time: Timestamp,
            _max_results: u32,
        ) -> Result<Vec<HistoryItem>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn background() -> BackgroundService<MemoryStore, NoBrowser, ManualClock> {
        BackgroundService::new(
            BackgroundConfig::default(),
            MemoryStore::new(),
            NoBrowser,
            ManualClock::new(1_000_000),
        )
    }

    #[test]
    fn config_parsing_applies_defaults() {
        let config: TrackerConfig = parse_config("{}").unwrap();
        assert_eq!(config.idle_threshold_ms, 30_000);
        assert_eq!(config.flush_interval_ms, 30_000);
        assert_eq!(config.navigation_check_delay_ms, 0);

        let config: BackgroundConfig =
            parse_config(r#"{"history_max_results":25,"scoring":{"time_cap_ms":60000}}"#).unwrap();
        assert_eq!(config.history_max_results, 25);
        assert_eq!(config.scoring.time_cap_ms, 60_000);
        assert_eq!(config.scoring.multiplier, 100.0);
    }

    #[test]
    fn config_parsing_reports_invalid_json() {
        let err = parse_config::<TrackerConfig>("not json").unwrap_err();
        assert!(matches!(err, TrackerError::InvalidConfig(_)));
        assert!(err.to_string().starts_with("Invalid configuration"));
    }

    #[test]
    fn malformed_requests_get_error_response() {
        let service = background();
        for body in ["not json", r#"{"invalid":"request"}"#, r#"{"action":"unknown"}"#] {
            let response = block_on(handle_request_json(&service, body));
            assert_eq!(
                serde_json::to_value(&response).unwrap(),
                serde_json::json!({"error": "Invalid request format"})
            );
        }
    }

    #[test]
    fn request_json_round_trip() {
        let service = background();
        let save = r#"{"action":"save-activity","record":{
            "viewId":"https://example.com/@990000","url":"https://example.com/",
            "title":"Example","domain":"example.com","startTime":990000,
            "scrollDepth":50,"maxScrollDepth":50,"totalScrollDistance":400.0,
            "focusTime":60000,"idleTime":0}}"#;
        let response = block_on(handle_request_json(&service, save));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({"success": true, "id": 1})
        );

        let response = block_on(handle_request_json(&service, r#"{"action":"query-scores"}"#));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["scores"][0]["domain"], "example.com");
        assert_eq!(value["scores"][0]["score"], 66);
    }

    #[test]
    fn score_activities_uses_default_weights() {
        let records = r#"[{"url":"https://example.com/","title":"Example","domain":"example.com",
            "startTime":0,"scrollDepth":50,"maxScrollDepth":50,"totalScrollDistance":0.0,
            "focusTime":60000,"idleTime":0}]"#;
        let json = score_activities("example.com", records, 5_000.0).unwrap();
        let score: InterestScore = serde_json::from_str(&json).unwrap();
        assert_eq!(score.score, 66);
        assert_eq!(score.last_updated, Timestamp::from_millis(5_000));
    }
}
