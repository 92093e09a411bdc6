// Keyed record store consumed by the background service.
// Backends are async at the edge; `MemoryStore` is the in-process one.

use std::cell::RefCell;
use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::types::{ActivityRecord, InterestScore, Timestamp};

/// Filter for activity queries. Bounds apply to `start_time` and are inclusive.
/// An empty domain, a zero bound or a zero limit means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl ActivityQuery {
    pub fn for_domain(domain: &str, since: Timestamp) -> Self {
        ActivityQuery {
            domain: Some(domain.to_string()),
            start_time: Some(since),
            ..Default::default()
        }
    }

    /// Same query with unset-equivalent values dropped.
    pub fn normalized(&self) -> ActivityQuery {
        ActivityQuery {
            domain: self.domain.clone().filter(|domain| !domain.is_empty()),
            start_time: nonzero(self.start_time),
            end_time: nonzero(self.end_time),
            limit: self.limit.filter(|&limit| limit > 0),
        }
    }

    pub fn matches(&self, record: &ActivityRecord) -> bool {
        if let Some(domain) = self.domain.as_deref().filter(|domain| !domain.is_empty()) {
            if record.domain != domain {
                return false;
            }
        }
        if let Some(start) = nonzero(self.start_time) {
            if record.start_time < start {
                return false;
            }
        }
        if let Some(end) = nonzero(self.end_time) {
            if record.start_time > end {
                return false;
            }
        }
        true
    }

    /// Filters, sorts newest first, then truncates to `limit`.
    pub fn apply<'a>(&self, records: impl IntoIterator<Item = &'a ActivityRecord>) -> Vec<ActivityRecord> {
        let query = self.normalized();
        let mut results: Vec<ActivityRecord> = records
            .into_iter()
            .filter(|record| query.matches(record))
            .cloned()
            .collect();
        results.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        if let Some(limit) = query.limit {
            results.truncate(limit);
        }
        results
    }
}

fn nonzero(time: Option<Timestamp>) -> Option<Timestamp> {
    time.filter(|time| time.as_millis() > 0)
}

#[async_trait(?Send)]
pub trait ActivityStore {
    /// Inserts a record, or replaces the row with the same non-empty `view_id`.
    async fn save_activity(&self, record: &ActivityRecord) -> Result<u64, StoreError>;

    /// Replaces the score row for the domain, or inserts one.
    async fn upsert_score(&self, score: &InterestScore) -> Result<(), StoreError>;

    async fn query_activities(&self, query: &ActivityQuery) -> Result<Vec<ActivityRecord>, StoreError>;

    /// All scores, highest first.
    async fn list_scores(&self) -> Result<Vec<InterestScore>, StoreError>;
}

#[derive(Debug, Default)]
struct MemoryTables {
    next_id: u64,
    activities: BTreeMap<u64, ActivityRecord>,
    scores: BTreeMap<String, InterestScore>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RefCell<MemoryTables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activity_count(&self) -> usize {
        self.tables.borrow().activities.len()
    }
}

#[async_trait(?Send)]
impl ActivityStore for MemoryStore {
    async fn save_activity(&self, record: &ActivityRecord) -> Result<u64, StoreError> {
        let mut tables = self.tables.borrow_mut();
        let existing = if record.view_id.is_empty() {
            None
        } else {
            tables
                .activities
                .iter()
                .find(|(_, row)| row.view_id == record.view_id)
                .map(|(id, _)| *id)
        };

        let id = match existing {
            Some(id) => id,
            None => {
                tables.next_id += 1;
                tables.next_id
            }
        };
        tables.activities.insert(id, record.clone());
        Ok(id)
    }

    async fn upsert_score(&self, score: &InterestScore) -> Result<(), StoreError> {
        self.tables
            .borrow_mut()
            .scores
            .insert(score.domain.clone(), score.clone());
        Ok(())
    }

    async fn query_activities(&self, query: &ActivityQuery) -> Result<Vec<ActivityRecord>, StoreError> {
        Ok(query.apply(self.tables.borrow().activities.values()))
    }

    async fn list_scores(&self) -> Result<Vec<InterestScore>, StoreError> {
        let mut scores: Vec<InterestScore> = self.tables.borrow().scores.values().cloned().collect();
        scores.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(scores)
    }
}
