use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    db::WatchStatusStore,
    error::AppResult,
    models::{ContentSummary, ContentType, WatchStatus, WatchStatusRecord},
    services::CatalogAdapter,
};

/// Content of one type, bucketed by watch status
///
/// Every bucket is always present. `none` is kept for client compatibility and
/// stays empty since unset statuses have no record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatusBuckets {
    pub currently_watching: Vec<ContentSummary>,
    pub watch_later: Vec<ContentSummary>,
    pub watched: Vec<ContentSummary>,
    pub rewatch: Vec<ContentSummary>,
    pub none: Vec<ContentSummary>,
}

impl StatusBuckets {
    pub fn get_mut(&mut self, status: WatchStatus) -> &mut Vec<ContentSummary> {
        match status {
            WatchStatus::CurrentlyWatching => &mut self.currently_watching,
            WatchStatus::WatchLater => &mut self.watch_later,
            WatchStatus::Watched => &mut self.watched,
            WatchStatus::Rewatch => &mut self.rewatch,
        }
    }
}

/// Everything a user tracks, grouped by content type then status
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AllContent {
    pub movies: StatusBuckets,
    pub shows: StatusBuckets,
    pub anime: StatusBuckets,
}

impl AllContent {
    pub fn buckets_mut(&mut self, content_type: ContentType) -> &mut StatusBuckets {
        match content_type {
            ContentType::Movie => &mut self.movies,
            ContentType::Show => &mut self.shows,
            ContentType::Anime => &mut self.anime,
        }
    }
}

/// Content ids sharing a (type, status) pair, in record order
#[derive(Debug, Clone, PartialEq)]
struct ContentGroup {
    content_type: ContentType,
    status: WatchStatus,
    content_ids: Vec<String>,
}

fn group_records(records: Vec<WatchStatusRecord>) -> Vec<ContentGroup> {
    let mut groups: Vec<ContentGroup> = Vec::new();

    for record in records {
        match groups
            .iter_mut()
            .find(|g| g.content_type == record.content_type && g.status == record.status)
        {
            Some(group) => group.content_ids.push(record.content_id),
            None => groups.push(ContentGroup {
                content_type: record.content_type,
                status: record.status,
                content_ids: vec![record.content_id],
            }),
        }
    }

    groups
}

/// Joins stored watch statuses with live catalog data
///
/// Items are resolved one at a time. An item that fails to resolve is logged
/// and left out; it never fails the request.
#[derive(Clone)]
pub struct AggregationService {
    store: Arc<dyn WatchStatusStore>,
    catalog: Arc<CatalogAdapter>,
}

impl AggregationService {
    pub fn new(store: Arc<dyn WatchStatusStore>, catalog: Arc<CatalogAdapter>) -> Self {
        Self { store, catalog }
    }

    /// All tracked content for a user
    pub async fn get_all_content(&self, user_id: &str) -> AppResult<AllContent> {
        let records = self.store.list_all(user_id).await?;
        tracing::info!(user_id = %user_id, records = records.len(), "Fetching all content");

        let mut content = AllContent::default();

        for group in group_records(records) {
            tracing::info!(
                content_type = %group.content_type,
                status = %group.status,
                count = group.content_ids.len(),
                "Resolving content group"
            );

            let with_seasons = group.content_type == ContentType::Show;
            let mut resolved = Vec::with_capacity(group.content_ids.len());
            for content_id in &group.content_ids {
                if let Some(summary) = self
                    .resolve(content_id, group.content_type, with_seasons)
                    .await
                {
                    resolved.push(summary);
                }
            }

            content
                .buckets_mut(group.content_type)
                .get_mut(group.status)
                .extend(resolved);
        }

        Ok(content)
    }

    /// Content of one type with exactly this status. Seasons are not attached.
    pub async fn content_by_status(
        &self,
        user_id: &str,
        content_type: ContentType,
        status: WatchStatus,
    ) -> AppResult<Vec<ContentSummary>> {
        let content_ids = self
            .store
            .list_by_status(user_id, content_type, status)
            .await?;

        tracing::info!(
            user_id = %user_id,
            content_type = %content_type,
            status = %status,
            count = content_ids.len(),
            "Found entries with status"
        );

        let mut content = Vec::with_capacity(content_ids.len());
        for content_id in &content_ids {
            if let Some(summary) = self.resolve(content_id, content_type, false).await {
                content.push(summary);
            }
        }

        Ok(content)
    }

    async fn resolve(
        &self,
        content_id: &str,
        content_type: ContentType,
        with_seasons: bool,
    ) -> Option<ContentSummary> {
        match self.catalog.fetch_content(content_id, content_type).await {
            Ok(Some(mut summary)) => {
                // Show details may already carry seasons
                if !with_seasons {
                    summary.seasons = None;
                } else if summary.seasons.is_none() {
                    self.catalog.attach_seasons(&mut summary).await;
                }
                Some(summary)
            }
            Ok(None) => {
                tracing::warn!(
                    content_id = %content_id,
                    content_type = %content_type,
                    "Content no longer exists upstream, skipping"
                );
                None
            }
            Err(e) => {
                tracing::warn!(
                    content_id = %content_id,
                    content_type = %content_type,
                    error = %e,
                    "Error fetching content, skipping"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryWatchStatusStore,
        error::AppError,
        models::{Season, StatusSelection, WatchStatusKey, WatchStatusUpdate},
        services::providers::MockCatalogProvider,
    };

    fn named(name: &'static str) -> MockCatalogProvider {
        let mut provider = MockCatalogProvider::new();
        provider.expect_name().return_const(name);
        provider
    }

    fn echo_fetch(provider: &mut MockCatalogProvider) {
        provider
            .expect_fetch()
            .returning(|id, content_type| Ok(Some(ContentSummary::empty(id, content_type))));
    }

    async fn seed(
        store: &MemoryWatchStatusStore,
        content_id: &str,
        content_type: ContentType,
        status: WatchStatus,
    ) {
        store
            .upsert(
                &WatchStatusKey::new("user-1", content_id, content_type),
                WatchStatusUpdate::status(StatusSelection::Active(status)),
            )
            .await
            .unwrap();
    }

    fn service(
        store: MemoryWatchStatusStore,
        tmdb: MockCatalogProvider,
        mal: MockCatalogProvider,
    ) -> AggregationService {
        let catalog =
            CatalogAdapter::new(Arc::new(tmdb), Arc::new(named("tvmaze")), Arc::new(mal));
        AggregationService::new(Arc::new(store), Arc::new(catalog))
    }

    #[tokio::test]
    async fn test_all_buckets_present_without_records() {
        let mut tmdb = named("tmdb");
        tmdb.expect_fetch().never();

        let content = service(MemoryWatchStatusStore::new(), tmdb, named("mal"))
            .get_all_content("nobody")
            .await
            .unwrap();

        let value = serde_json::to_value(&content).unwrap();
        for content_type in ["movies", "shows", "anime"] {
            for status in ["currently_watching", "watch_later", "watched", "rewatch", "none"] {
                assert_eq!(value[content_type][status], serde_json::json!([]));
            }
        }
    }

    #[tokio::test]
    async fn test_groups_by_type_and_status() {
        let store = MemoryWatchStatusStore::new();
        seed(&store, "603", ContentType::Movie, WatchStatus::Watched).await;
        seed(&store, "1399", ContentType::Show, WatchStatus::CurrentlyWatching).await;
        seed(&store, "5114", ContentType::Anime, WatchStatus::WatchLater).await;
        seed(&store, "680", ContentType::Movie, WatchStatus::Watched).await;

        let mut tmdb = named("tmdb");
        echo_fetch(&mut tmdb);
        tmdb.expect_seasons().returning(|_| Ok(Vec::new()));
        let mut mal = named("mal");
        echo_fetch(&mut mal);

        let content = service(store, tmdb, mal).get_all_content("user-1").await.unwrap();

        let watched: Vec<&str> = content.movies.watched.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(watched, vec!["603", "680"]);
        assert_eq!(content.shows.currently_watching.len(), 1);
        assert_eq!(content.shows.currently_watching[0].seasons, Some(Vec::new()));
        assert_eq!(content.anime.watch_later[0].content_type, ContentType::Anime);
    }

    #[tokio::test]
    async fn test_failed_items_are_skipped() {
        let store = MemoryWatchStatusStore::new();
        seed(&store, "1", ContentType::Movie, WatchStatus::Watched).await;
        seed(&store, "2", ContentType::Movie, WatchStatus::Watched).await;
        seed(&store, "3", ContentType::Movie, WatchStatus::Watched).await;

        let mut tmdb = named("tmdb");
        tmdb.expect_fetch().returning(|id, content_type| match id {
            "2" => Err(AppError::ExternalApi("TMDB API returned status 500".to_string())),
            "3" => Ok(None),
            _ => Ok(Some(ContentSummary::empty(id, content_type))),
        });

        let content = service(store, tmdb, named("mal")).get_all_content("user-1").await.unwrap();

        assert_eq!(content.movies.watched.len(), 1);
        assert_eq!(content.movies.watched[0].id, "1");
    }

    #[tokio::test]
    async fn test_season_failure_keeps_show() {
        let store = MemoryWatchStatusStore::new();
        seed(&store, "10", ContentType::Show, WatchStatus::Rewatch).await;
        seed(&store, "11", ContentType::Show, WatchStatus::Rewatch).await;

        let mut tmdb = named("tmdb");
        echo_fetch(&mut tmdb);
        tmdb.expect_seasons().returning(|id| match id {
            "10" => Err(AppError::ExternalApi("TMDB API returned status 502".to_string())),
            _ => Ok(vec![Season {
                season_number: 1,
                episode_count: 6,
                name: "Season 1".to_string(),
            }]),
        });

        let content = service(store, tmdb, named("mal")).get_all_content("user-1").await.unwrap();

        assert_eq!(content.shows.rewatch.len(), 2);
        assert!(content.shows.rewatch[0].seasons.is_none());
        assert_eq!(content.shows.rewatch[1].seasons.as_ref().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_content_by_status_skips_seasons() {
        let store = MemoryWatchStatusStore::new();
        seed(&store, "10", ContentType::Show, WatchStatus::Watched).await;
        seed(&store, "11", ContentType::Show, WatchStatus::WatchLater).await;

        let mut tmdb = named("tmdb");
        echo_fetch(&mut tmdb);
        tmdb.expect_seasons().never();

        let shows = service(store, tmdb, named("mal"))
            .content_by_status("user-1", ContentType::Show, WatchStatus::Watched)
            .await
            .unwrap();

        assert_eq!(shows.len(), 1);
        assert_eq!(shows[0].id, "10");
    }

    fn with_seasons(id: &str, content_type: ContentType) -> ContentSummary {
        ContentSummary {
            seasons: Some(vec![Season {
                season_number: 1,
                episode_count: 13,
                name: "Season 1".to_string(),
            }]),
            ..ContentSummary::empty(id, content_type)
        }
    }

    #[tokio::test]
    async fn test_fetched_seasons_are_reused() {
        let store = MemoryWatchStatusStore::new();
        seed(&store, "1399", ContentType::Show, WatchStatus::Watched).await;

        let mut tmdb = named("tmdb");
        tmdb.expect_fetch()
            .times(1)
            .returning(|id, content_type| Ok(Some(with_seasons(id, content_type))));
        tmdb.expect_seasons().never();

        let content = service(store, tmdb, named("mal")).get_all_content("user-1").await.unwrap();

        let seasons = content.shows.watched[0].seasons.as_ref().unwrap();
        assert_eq!(seasons[0].episode_count, 13);
    }

    #[tokio::test]
    async fn test_content_by_status_drops_fetched_seasons() {
        let store = MemoryWatchStatusStore::new();
        seed(&store, "1399", ContentType::Show, WatchStatus::Watched).await;

        let mut tmdb = named("tmdb");
        tmdb.expect_fetch()
            .returning(|id, content_type| Ok(Some(with_seasons(id, content_type))));
        tmdb.expect_seasons().never();

        let shows = service(store, tmdb, named("mal"))
            .content_by_status("user-1", ContentType::Show, WatchStatus::Watched)
            .await
            .unwrap();

        assert!(shows[0].seasons.is_none());
    }

    #[test]
    fn test_group_records_preserves_order() {
        let now = chrono::Utc::now();
        let record = |id: &str, content_type, status| WatchStatusRecord {
            user_id: "u".to_string(),
            content_id: id.to_string(),
            content_type,
            status,
            last_season: None,
            last_episode: None,
            created_at: now,
            updated_at: now,
        };

        let groups = group_records(vec![
            record("a", ContentType::Movie, WatchStatus::Watched),
            record("b", ContentType::Show, WatchStatus::Watched),
            record("c", ContentType::Movie, WatchStatus::Watched),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].content_ids, vec!["a".to_string(), "c".to_string()]);
        assert_eq!(groups[1].content_type, ContentType::Show);
    }
}
