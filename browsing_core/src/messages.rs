// Request/response shapes exchanged between the content script, the popup and
// the background process. Framing and transport live in JS.

use serde::{Deserialize, Serialize};

use crate::store::ActivityQuery;
use crate::types::{ActivityRecord, InterestScore, Timestamp};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Request {
    SaveActivity { record: ActivityRecord },
    QueryActivities(ActivityQuery),
    QueryScores,
    GetTabInfo,
    GetBrowserHistory(HistoryQuery),
}

impl Request {
    pub fn action(&self) -> &'static str {
        match self {
            Request::SaveActivity { .. } => "save-activity",
            Request::QueryActivities(_) => "query-activities",
            Request::QueryScores => "query-scores",
            Request::GetTabInfo => "get-tab-info",
            Request::GetBrowserHistory(_) => "get-browser-history",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}

/// Subset of `chrome.tabs.Tab` the extension reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TabInfo {
    pub id: Option<i64>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub active: bool,
    pub window_id: Option<i64>,
}

/// Subset of `chrome.history.HistoryItem`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryItem {
    pub id: String,
    pub url: Option<String>,
    pub title: Option<String>,
    /// Epoch milliseconds, fractional as the browser reports it.
    pub last_visit_time: Option<f64>,
    pub visit_count: Option<u32>,
    pub typed_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveActivityResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Empty list plus `error` means the read failed; empty alone means no data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitiesResponse {
    pub activities: Vec<ActivityRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoresResponse {
    pub scores: Vec<InterestScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabInfoResponse {
    pub tab: Option<TabInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    SaveActivity(SaveActivityResponse),
    Activities(ActivitiesResponse),
    Scores(ScoresResponse),
    TabInfo(TabInfoResponse),
    History(HistoryResponse),
    Error(ErrorResponse),
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error(ErrorResponse {
            error: message.into(),
        })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Response::SaveActivity(r) => r.error.as_deref(),
            Response::Activities(r) => r.error.as_deref(),
            Response::Scores(r) => r.error.as_deref(),
            Response::Error(r) => Some(&r.error),
            Response::TabInfo(_) | Response::History(_) => None,
        }
    }
}
