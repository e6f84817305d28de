use std::collections::BTreeMap;

use crate::{
    error::AppResult,
    models::{
        ContentType, StatusSelection, UpsertOutcome, WatchStatus, WatchStatusKey,
        WatchStatusRecord, WatchStatusUpdate,
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryWatchStatusStore;
pub use postgres::{create_pool, run_migrations, PgWatchStatusStore};

/// Persistence for watch-status records
///
/// At most one record exists per (user, content id, content type). Absence of a
/// record is the `none` status; implementations never store it.
#[async_trait::async_trait]
pub trait WatchStatusStore: Send + Sync {
    /// Point lookup. `Ok(None)` when the key has no record.
    async fn get(&self, key: &WatchStatusKey) -> AppResult<Option<WatchStatusRecord>>;

    /// Records for the requested ids that exist, in storage order
    async fn find_many(
        &self,
        user_id: &str,
        content_ids: &[String],
        content_type: ContentType,
    ) -> AppResult<Vec<WatchStatusRecord>>;

    /// Creates, updates or deletes the record for `key`
    ///
    /// `none` deletes (a no-op when nothing is stored). Any other status creates the
    /// record or overwrites its status, touching season/episode only when provided.
    async fn upsert(
        &self,
        key: &WatchStatusKey,
        update: WatchStatusUpdate,
    ) -> AppResult<UpsertOutcome>;

    /// Content ids with exactly this status
    async fn list_by_status(
        &self,
        user_id: &str,
        content_type: ContentType,
        status: WatchStatus,
    ) -> AppResult<Vec<String>>;

    /// Every record the user owns
    async fn list_all(&self, user_id: &str) -> AppResult<Vec<WatchStatusRecord>>;

    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Status for each requested id; ids without a record map to `none`
    async fn batch_get(
        &self,
        user_id: &str,
        content_ids: &[String],
        content_type: ContentType,
    ) -> AppResult<BTreeMap<String, StatusSelection>> {
        let mut statuses: BTreeMap<String, StatusSelection> = content_ids
            .iter()
            .map(|id| (id.clone(), StatusSelection::None))
            .collect();

        for record in self.find_many(user_id, content_ids, content_type).await? {
            statuses.insert(record.content_id, record.status.into());
        }

        Ok(statuses)
    }
}
