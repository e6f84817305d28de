use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    error::{AppError, AppResult},
    models::{
        ContentType, StatusSelection, UpsertOutcome, WatchStatus, WatchStatusKey,
        WatchStatusRecord, WatchStatusUpdate,
    },
};

use super::WatchStatusStore;

const RECORD_COLUMNS: &str = "user_id, content_id, content_type, status, last_season, \
                              last_episode, created_at, updated_at";

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded migrations in `./migrations`
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(Debug, sqlx::FromRow)]
struct WatchStatusRow {
    user_id: String,
    content_id: String,
    content_type: String,
    status: String,
    last_season: Option<i32>,
    last_episode: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WatchStatusRow> for WatchStatusRecord {
    type Error = AppError;

    fn try_from(row: WatchStatusRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, value: &str| {
            AppError::Internal(format!(
                "Stored {} '{}' for user {} content {} is not recognised",
                field, value, row.user_id, row.content_id
            ))
        };

        let content_type = row
            .content_type
            .parse::<ContentType>()
            .map_err(|_| corrupt("contentType", &row.content_type))?;
        let status = row
            .status
            .parse::<WatchStatus>()
            .map_err(|_| corrupt("status", &row.status))?;

        Ok(WatchStatusRecord {
            user_id: row.user_id,
            content_id: row.content_id,
            content_type,
            status,
            last_season: row.last_season,
            last_episode: row.last_episode,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_records(rows: Vec<WatchStatusRow>) -> AppResult<Vec<WatchStatusRecord>> {
    rows.into_iter().map(WatchStatusRecord::try_from).collect()
}

/// Watch-status store backed by the `watch_status` table
///
/// The composite primary key enforces one record per key; upserts go through
/// `INSERT ... ON CONFLICT` so concurrent writers for a key never duplicate it.
#[derive(Clone)]
pub struct PgWatchStatusStore {
    pool: PgPool,
}

impl PgWatchStatusStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn delete(&self, key: &WatchStatusKey) -> AppResult<UpsertOutcome> {
        let result = sqlx::query(
            "DELETE FROM watch_status \
             WHERE user_id = $1 AND content_id = $2 AND content_type = $3",
        )
        .bind(&key.user_id)
        .bind(&key.content_id)
        .bind(key.content_type.as_str())
        .execute(&self.pool)
        .await?;

        Ok(if result.rows_affected() > 0 {
            UpsertOutcome::Removed
        } else {
            UpsertOutcome::Unchanged
        })
    }
}

#[async_trait::async_trait]
impl WatchStatusStore for PgWatchStatusStore {
    async fn get(&self, key: &WatchStatusKey) -> AppResult<Option<WatchStatusRecord>> {
        let query = format!(
            "SELECT {} FROM watch_status \
             WHERE user_id = $1 AND content_id = $2 AND content_type = $3",
            RECORD_COLUMNS
        );

        let row = sqlx::query_as::<_, WatchStatusRow>(&query)
            .bind(&key.user_id)
            .bind(&key.content_id)
            .bind(key.content_type.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(WatchStatusRecord::try_from).transpose()
    }

    async fn find_many(
        &self,
        user_id: &str,
        content_ids: &[String],
        content_type: ContentType,
    ) -> AppResult<Vec<WatchStatusRecord>> {
        if content_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT {} FROM watch_status \
             WHERE user_id = $1 AND content_id = ANY($2) AND content_type = $3 \
             ORDER BY created_at, content_id",
            RECORD_COLUMNS
        );

        let rows = sqlx::query_as::<_, WatchStatusRow>(&query)
            .bind(user_id)
            .bind(content_ids)
            .bind(content_type.as_str())
            .fetch_all(&self.pool)
            .await?;

        into_records(rows)
    }

    async fn upsert(
        &self,
        key: &WatchStatusKey,
        update: WatchStatusUpdate,
    ) -> AppResult<UpsertOutcome> {
        let status = match update.status {
            StatusSelection::None => return self.delete(key).await,
            StatusSelection::Active(status) => status,
        };

        // xmax is zero only for a freshly inserted tuple
        let inserted = sqlx::query_scalar::<_, bool>(
            r#"
            INSERT INTO watch_status
                (user_id, content_id, content_type, status, last_season, last_episode)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, content_id, content_type) DO UPDATE SET
                status = EXCLUDED.status,
                last_season = COALESCE(EXCLUDED.last_season, watch_status.last_season),
                last_episode = COALESCE(EXCLUDED.last_episode, watch_status.last_episode),
                updated_at = NOW()
            RETURNING (xmax = 0)
            "#,
        )
        .bind(&key.user_id)
        .bind(&key.content_id)
        .bind(key.content_type.as_str())
        .bind(status.as_str())
        .bind(update.last_season)
        .bind(update.last_episode)
        .fetch_one(&self.pool)
        .await?;

        Ok(if inserted {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Updated
        })
    }

    async fn list_by_status(
        &self,
        user_id: &str,
        content_type: ContentType,
        status: WatchStatus,
    ) -> AppResult<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT content_id FROM watch_status \
             WHERE user_id = $1 AND content_type = $2 AND status = $3 \
             ORDER BY created_at, content_id",
        )
        .bind(user_id)
        .bind(content_type.as_str())
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn list_all(&self, user_id: &str) -> AppResult<Vec<WatchStatusRecord>> {
        let query = format!(
            "SELECT {} FROM watch_status WHERE user_id = $1 ORDER BY created_at, content_id",
            RECORD_COLUMNS
        );

        let rows = sqlx::query_as::<_, WatchStatusRow>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        into_records(rows)
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
