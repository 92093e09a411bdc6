// Background request handling: persistence, score recomputation, and the
// browser-API passthroughs the popup needs.

use async_trait::async_trait;

use crate::clock::Clock;
use crate::error::StoreError;
use crate::messages::{
    ActivitiesResponse, HistoryItem, HistoryQuery, HistoryResponse, Request, Response,
    SaveActivityResponse, ScoresResponse, TabInfo, TabInfoResponse,
};
use crate::scoring::score_domain;
use crate::store::{ActivityQuery, ActivityStore};
use crate::types::{ActivityRecord, BackgroundConfig, Timestamp};

/// Browser APIs only the background context can reach.
#[async_trait(?Send)]
pub trait BrowserApi {
    async fn active_tab(&self) -> Result<Option<TabInfo>, StoreError>;

    async fn search_history(
        &self,
        start_time: Timestamp,
        end_time: Timestamp,
        max_results: u32,
    ) -> Result<Vec<HistoryItem>, StoreError>;
}

pub struct BackgroundService<S, B, C> {
    config: BackgroundConfig,
    store: S,
    browser: B,
    clock: C,
}

impl<S: ActivityStore, B: BrowserApi, C: Clock> BackgroundService<S, B, C> {
    pub fn new(config: BackgroundConfig, store: S, browser: B, clock: C) -> Self {
        BackgroundService {
            config,
            store,
            browser,
            clock,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn handle(&self, request: Request) -> Response {
        tracing::debug!(action = request.action(), "handling request");
        match request {
            Request::SaveActivity { record } => self.save_activity(&record).await,
            Request::QueryActivities(query) => self.query_activities(&query).await,
            Request::QueryScores => self.query_scores().await,
            Request::GetTabInfo => self.tab_info().await,
            Request::GetBrowserHistory(query) => self.browser_history(&query).await,
        }
    }

    async fn save_activity(&self, record: &ActivityRecord) -> Response {
        let response = match self.persist_and_score(record).await {
            Ok(id) => SaveActivityResponse {
                success: true,
                id: Some(id),
                error: None,
            },
            Err(err) => {
                tracing::warn!(url = %record.url, error = %err, "failed to save activity");
                SaveActivityResponse {
                    success: false,
                    id: None,
                    error: Some(err.to_string()),
                }
            }
        };
        Response::SaveActivity(response)
    }

    /// Saves the record, then fully recomputes its domain's score from the
    /// records inside the lookback window.
    async fn persist_and_score(&self, record: &ActivityRecord) -> Result<u64, StoreError> {
        let id = self.store.save_activity(record).await?;

        let now = self.clock.now();
        let since = now.sub_millis(self.config.scoring.lookback_ms);
        let query = ActivityQuery::for_domain(&record.domain, since);
        let recent = self.store.query_activities(&query).await?;

        let score = score_domain(&record.domain, &recent, &self.config.scoring, now);
        self.store.upsert_score(&score).await?;
        tracing::info!(
            domain = %score.domain,
            score = score.score,
            records = recent.len(),
            "interest score updated"
        );
        Ok(id)
    }

    async fn query_activities(&self, query: &ActivityQuery) -> Response {
        let response = match self.store.query_activities(query).await {
            Ok(activities) => ActivitiesResponse {
                activities,
                error: None,
            },
            Err(err) => {
                tracing::warn!(error = %err, "failed to query activities");
                ActivitiesResponse {
                    activities: Vec::new(),
                    error: Some(err.to_string()),
                }
            }
        };
        Response::Activities(response)
    }

    async fn query_scores(&self) -> Response {
        let response = match self.store.list_scores().await {
            Ok(scores) => ScoresResponse { scores, error: None },
            Err(err) => {
                tracing::warn!(error = %err, "failed to query interest scores");
                ScoresResponse {
                    scores: Vec::new(),
                    error: Some(err.to_string()),
                }
            }
        };
        Response::Scores(response)
    }

    async fn tab_info(&self) -> Response {
        match self.browser.active_tab().await {
            Ok(tab) => Response::TabInfo(TabInfoResponse { tab }),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read active tab");
                Response::error(err.to_string())
            }
        }
    }

    async fn browser_history(&self, query: &HistoryQuery) -> Response {
        let now = self.clock.now();
        // A zero bound means unset, like an absent one.
        let start = query
            .start_time
            .filter(|time| time.as_millis() > 0)
            .unwrap_or_else(|| now.sub_millis(self.config.history_window_ms));
        let end = query
            .end_time
            .filter(|time| time.as_millis() > 0)
            .unwrap_or(now);
        let max_results = query.max_results.unwrap_or(self.config.history_max_results);

        match self.browser.search_history(start, end, max_results).await {
            Ok(mut history) => {
                sort_by_last_visit(&mut history);
                Response::History(HistoryResponse { history })
            }
            Err(err) => {
                tracing::warn!(error = %err, "history search failed");
                Response::error(err.to_string())
            }
        }
    }
}

/// Most recent first; items without a visit time sort as epoch zero.
pub fn sort_by_last_visit(history: &mut [HistoryItem]) {
    history.sort_by(|a, b| {
        let a = a.last_visit_time.unwrap_or(0.0);
        let b = b.last_visit_time.unwrap_or(0.0);
        b.total_cmp(&a)
    });
}
