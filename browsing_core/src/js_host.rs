// Browser-side implementations of the host, sink, store and browser-API seams.
// Everything crosses the boundary as plain properties or JSON strings.

use async_trait::async_trait;
use js_sys::{Array, Function, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};

use crate::background::BrowserApi;
use crate::error::{StoreError, TrackerError};
use crate::host::{ActivitySink, PageHost};
use crate::messages::{HistoryItem, HistoryQuery, Request, SaveActivityResponse, TabInfo};
use crate::navigation::LocationProvider;
use crate::store::{ActivityQuery, ActivityStore};
use crate::types::{ActivityRecord, InterestScore, ReadyState, ScrollGeometry, Timestamp};

/// Best-effort text for a thrown JS value.
fn js_error_message(err: &JsValue) -> String {
    if let Some(text) = err.as_string() {
        return text;
    }
    Reflect::get(err, &JsValue::from_str("message"))
        .ok()
        .and_then(|message| message.as_string())
        .unwrap_or_else(|| format!("{:?}", err))
}

/// Walks a dotted property path from `root`.
fn property(root: &JsValue, path: &str) -> Result<JsValue, TrackerError> {
    path.split('.').try_fold(root.clone(), |value, key| {
        if value.is_undefined() || value.is_null() {
            return Err(TrackerError::HostAccess {
                property: path.to_string(),
                message: format!("{} is unreachable", key),
            });
        }
        Reflect::get(&value, &JsValue::from_str(key)).map_err(|err| TrackerError::HostAccess {
            property: path.to_string(),
            message: js_error_message(&err),
        })
    })
}

fn string_property(root: &JsValue, path: &str) -> Result<String, TrackerError> {
    property(root, path)?
        .as_string()
        .ok_or_else(|| TrackerError::HostAccess {
            property: path.to_string(),
            message: "not a string".to_string(),
        })
}

fn number_property(root: &JsValue, path: &str) -> Result<f64, TrackerError> {
    property(root, path)?
        .as_f64()
        .ok_or_else(|| TrackerError::HostAccess {
            property: path.to_string(),
            message: "not a number".to_string(),
        })
}

/// The live page, read through the global `window`.
#[derive(Debug, Clone)]
pub struct BrowserPage {
    window: JsValue,
}

impl BrowserPage {
    pub fn from_global() -> Self {
        BrowserPage {
            window: js_sys::global().into(),
        }
    }

    fn text(&self, path: &str) -> String {
        string_property(&self.window, path).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "page read failed");
            String::new()
        })
    }

    // Missing elements (e.g. no `<body>` yet) are normal; read them as zero.
    fn number(&self, path: &str) -> f64 {
        number_property(&self.window, path).unwrap_or_else(|err| {
            tracing::trace!(error = %err, "page metric unavailable");
            0.0
        })
    }
}

impl LocationProvider for BrowserPage {
    fn href(&self) -> String {
        self.text("location.href")
    }

    fn ready_state(&self) -> ReadyState {
        ReadyState::parse(&self.text("document.readyState"))
    }
}

impl PageHost for BrowserPage {
    fn hostname(&self) -> String {
        self.text("location.hostname")
    }

    fn title(&self) -> String {
        self.text("document.title")
    }

    fn scroll_geometry(&self) -> ScrollGeometry {
        ScrollGeometry {
            scroll_y: self.number("scrollY"),
            viewport_height: self.number("innerHeight"),
            body_scroll_height: self.number("document.body.scrollHeight"),
            body_offset_height: self.number("document.body.offsetHeight"),
            document_client_height: self.number("document.documentElement.clientHeight"),
            document_scroll_height: self.number("document.documentElement.scrollHeight"),
            document_offset_height: self.number("document.documentElement.offsetHeight"),
        }
    }
}

/// Forwards flushed records to a JS `sendMessage`-style function as a
/// `save-activity` request. Failures are logged and otherwise ignored.
pub struct JsActivitySink {
    send: Function,
}

impl JsActivitySink {
    pub fn new(send: Function) -> Self {
        JsActivitySink { send }
    }
}

impl ActivitySink for JsActivitySink {
    fn submit(&mut self, record: &ActivityRecord) {
        let request = Request::SaveActivity {
            record: record.clone(),
        };
        let payload = match serde_json::to_string(&request) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, "could not serialize activity");
                return;
            }
        };

        let returned = match self.send.call1(&JsValue::NULL, &JsValue::from_str(&payload)) {
            Ok(returned) => returned,
            Err(err) => {
                tracing::warn!(error = %js_error_message(&err), "send message threw");
                return;
            }
        };

        let Ok(promise) = returned.dyn_into::<Promise>() else {
            return;
        };
        let url = record.url.clone();
        spawn_local(async move {
            match JsFuture::from(promise).await {
                Ok(reply) => {
                    let failed = save_reply(&reply).filter(|response| !response.success);
                    if let Some(response) = failed {
                        tracing::warn!(%url, error = ?response.error, "activity was not saved");
                    }
                }
                Err(err) => {
                    tracing::warn!(%url, error = %js_error_message(&err), "failed to send activity");
                }
            }
        });
    }
}

/// Reads a `save-activity` reply delivered either as JSON text or as the
/// plain object `chrome.runtime.sendMessage` resolves with.
fn save_reply(reply: &JsValue) -> Option<SaveActivityResponse> {
    if let Some(text) = reply.as_string() {
        return serde_json::from_str(&text).ok();
    }
    if !reply.is_object() {
        return None;
    }
    let field = |name: &str| Reflect::get(reply, &JsValue::from_str(name)).ok();
    Some(SaveActivityResponse {
        success: field("success")?.as_bool()?,
        id: field("id").and_then(|id| id.as_f64()).map(|id| id as u64),
        error: field("error").and_then(|error| error.as_string()),
    })
}

/// Calls `target[name](...args)` and awaits the result when it is a Promise.
async fn call_method(target: &JsValue, name: &str, args: &[JsValue]) -> Result<JsValue, StoreError> {
    let method = Reflect::get(target, &JsValue::from_str(name))
        .map_err(|err| StoreError::Backend(js_error_message(&err)))?
        .dyn_into::<Function>()
        .map_err(|_| StoreError::Backend(format!("{} is not a function", name)))?;

    let args: Array = args.iter().collect();
    let returned = method
        .apply(target, &args)
        .map_err(|err| StoreError::Backend(js_error_message(&err)))?;

    match returned.dyn_into::<Promise>() {
        Ok(promise) => JsFuture::from(promise)
            .await
            .map_err(|err| StoreError::Backend(js_error_message(&err))),
        Err(value) => Ok(value),
    }
}

fn parse_reply<T: serde::de::DeserializeOwned>(name: &str, reply: JsValue) -> Result<T, StoreError> {
    let text = reply
        .as_string()
        .ok_or_else(|| StoreError::Serialization(format!("{} did not return a JSON string", name)))?;
    Ok(serde_json::from_str(&text)?)
}

/// Record store backed by a JS object exposing `saveActivity`, `upsertScore`,
/// `queryActivities` and `listScores`, each taking and returning JSON strings.
#[derive(Debug, Clone)]
pub struct JsActivityStore {
    backend: JsValue,
}

impl JsActivityStore {
    pub fn new(backend: JsValue) -> Self {
        JsActivityStore { backend }
    }
}

#[async_trait(?Send)]
impl ActivityStore for JsActivityStore {
    async fn save_activity(&self, record: &ActivityRecord) -> Result<u64, StoreError> {
        let payload = JsValue::from_str(&serde_json::to_string(record)?);
        let reply = call_method(&self.backend, "saveActivity", &[payload]).await?;
        reply
            .as_f64()
            .map(|id| id as u64)
            .ok_or_else(|| StoreError::Serialization("saveActivity did not return an id".to_string()))
    }

    async fn upsert_score(&self, score: &InterestScore) -> Result<(), StoreError> {
        let payload = JsValue::from_str(&serde_json::to_string(score)?);
        call_method(&self.backend, "upsertScore", &[payload]).await?;
        Ok(())
    }

    async fn query_activities(&self, query: &ActivityQuery) -> Result<Vec<ActivityRecord>, StoreError> {
        let query = query.normalized();
        let payload = JsValue::from_str(&serde_json::to_string(&query)?);
        let reply = call_method(&self.backend, "queryActivities", &[payload]).await?;
        let rows: Vec<ActivityRecord> = parse_reply("queryActivities", reply)?;
        // Backends may ignore parts of the filter; normalize here.
        Ok(query.apply(&rows))
    }

    async fn list_scores(&self) -> Result<Vec<InterestScore>, StoreError> {
        let reply = call_method(&self.backend, "listScores", &[]).await?;
        let mut scores: Vec<InterestScore> = parse_reply("listScores", reply)?;
        scores.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(scores)
    }
}

/// Tab and history access through a JS object exposing `activeTab()` and
/// `searchHistory(json)`.
#[derive(Debug, Clone)]
pub struct JsBrowserApi {
    backend: JsValue,
}

impl JsBrowserApi {
    pub fn new(backend: JsValue) -> Self {
        JsBrowserApi { backend }
    }
}

#[async_trait(?Send)]
impl BrowserApi for JsBrowserApi {
    async fn active_tab(&self) -> Result<Option<TabInfo>, StoreError> {
        let reply = call_method(&self.backend, "activeTab", &[]).await?;
        if reply.is_null() || reply.is_undefined() {
            return Ok(None);
        }
        parse_reply("activeTab", reply)
    }

    async fn search_history(
        &self,
        start_time: Timestamp,
        end_time: Timestamp,
        max_results: u32,
    ) -> Result<Vec<HistoryItem>, StoreError> {
        let query = HistoryQuery {
            start_time: Some(start_time),
            end_time: Some(end_time),
            max_results: Some(max_results),
        };
        let payload = JsValue::from_str(&serde_json::to_string(&query)?);
        let reply = call_method(&self.backend, "searchHistory", &[payload]).await?;
        parse_reply("searchHistory", reply)
    }
}
