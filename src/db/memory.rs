use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::AppResult,
    models::{
        ContentType, StatusSelection, UpsertOutcome, WatchStatus, WatchStatusKey,
        WatchStatusRecord, WatchStatusUpdate,
    },
};

use super::WatchStatusStore;

/// In-process watch-status store
///
/// Records live in insertion order behind a single write lock, so the
/// one-record-per-key rule holds under concurrent upserts. Selected with
/// `STORE_BACKEND=memory`; contents are lost on restart.
#[derive(Clone, Default)]
pub struct MemoryWatchStatusStore {
    records: Arc<RwLock<Vec<WatchStatusRecord>>>,
}

impl MemoryWatchStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records across all users
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl WatchStatusStore for MemoryWatchStatusStore {
    async fn get(&self, key: &WatchStatusKey) -> AppResult<Option<WatchStatusRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.matches(key)).cloned())
    }

    async fn find_many(
        &self,
        user_id: &str,
        content_ids: &[String],
        content_type: ContentType,
    ) -> AppResult<Vec<WatchStatusRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| {
                r.user_id == user_id
                    && r.content_type == content_type
                    && content_ids.contains(&r.content_id)
            })
            .cloned()
            .collect())
    }

    async fn upsert(
        &self,
        key: &WatchStatusKey,
        update: WatchStatusUpdate,
    ) -> AppResult<UpsertOutcome> {
        let mut records = self.records.write().await;
        let position = records.iter().position(|r| r.matches(key));

        let outcome = match (update.status, position) {
            (StatusSelection::None, Some(index)) => {
                records.remove(index);
                UpsertOutcome::Removed
            }
            (StatusSelection::None, None) => UpsertOutcome::Unchanged,
            (StatusSelection::Active(status), Some(index)) => {
                let record = &mut records[index];
                record.status = status;
                if update.last_season.is_some() {
                    record.last_season = update.last_season;
                }
                if update.last_episode.is_some() {
                    record.last_episode = update.last_episode;
                }
                record.updated_at = Utc::now();
                UpsertOutcome::Updated
            }
            (StatusSelection::Active(status), None) => {
                let now = Utc::now();
                records.push(WatchStatusRecord {
                    user_id: key.user_id.clone(),
                    content_id: key.content_id.clone(),
                    content_type: key.content_type,
                    status,
                    last_season: update.last_season,
                    last_episode: update.last_episode,
                    created_at: now,
                    updated_at: now,
                });
                UpsertOutcome::Created
            }
        };

        Ok(outcome)
    }

    async fn list_by_status(
        &self,
        user_id: &str,
        content_type: ContentType,
        status: WatchStatus,
    ) -> AppResult<Vec<String>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| {
                r.user_id == user_id && r.content_type == content_type && r.status == status
            })
            .map(|r| r.content_id.clone())
            .collect())
    }

    async fn list_all(&self, user_id: &str) -> AppResult<Vec<WatchStatusRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
