use std::sync::Arc;

use reqwest::Client as HttpClient;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{ContentSummary, ContentType},
    services::providers::{CatalogProvider, MalProvider, TmdbProvider, TvMazeProvider},
};

/// Uniform content lookup over the three upstream catalogs
///
/// Routing:
/// - movie / show details → TMDB
/// - anime details, search and ranking → MyAnimeList
/// - show search and show listings → TVmaze, with TMDB seasons attached
/// - movie search → TMDB
///
/// Season enrichment is best effort: a failure is logged and the show is
/// returned without `seasons`.
#[derive(Clone)]
pub struct CatalogAdapter {
    tmdb: Arc<dyn CatalogProvider>,
    tvmaze: Arc<dyn CatalogProvider>,
    mal: Arc<dyn CatalogProvider>,
}

impl CatalogAdapter {
    pub fn new(
        tmdb: Arc<dyn CatalogProvider>,
        tvmaze: Arc<dyn CatalogProvider>,
        mal: Arc<dyn CatalogProvider>,
    ) -> Self {
        Self { tmdb, tvmaze, mal }
    }

    /// Builds the live providers, sharing one HTTP client
    pub fn from_config(config: &Config) -> Self {
        let http_client = HttpClient::new();

        Self::new(
            Arc::new(TmdbProvider::new(
                http_client.clone(),
                config.tmdb_api_key.clone(),
                config.tmdb_api_url.clone(),
            )),
            Arc::new(TvMazeProvider::new(
                http_client.clone(),
                config.tvmaze_api_url.clone(),
            )),
            Arc::new(MalProvider::new(
                http_client,
                config.mal_client_id.clone(),
                config.mal_api_url.clone(),
            )),
        )
    }

    fn details_provider(&self, content_type: ContentType) -> &dyn CatalogProvider {
        match content_type {
            ContentType::Movie | ContentType::Show => self.tmdb.as_ref(),
            ContentType::Anime => self.mal.as_ref(),
        }
    }

    /// One item by id. `Ok(None)` when the catalog does not know it.
    pub async fn fetch_content(
        &self,
        content_id: &str,
        content_type: ContentType,
    ) -> AppResult<Option<ContentSummary>> {
        self.details_provider(content_type)
            .fetch(content_id, content_type)
            .await
    }

    /// Free-text search; shows when no type is given
    ///
    /// Rejects a blank query before any upstream call.
    pub async fn search(
        &self,
        query: &str,
        content_type: Option<ContentType>,
    ) -> AppResult<Vec<ContentSummary>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Query parameter 'q' is required".to_string(),
            ));
        }

        match content_type.unwrap_or(ContentType::Show) {
            ContentType::Show => {
                let mut shows = self.tvmaze.search(query, ContentType::Show).await?;
                for show in shows.iter_mut() {
                    self.attach_seasons(show).await;
                }
                Ok(shows)
            }
            ContentType::Movie => self.tmdb.search(query, ContentType::Movie).await,
            ContentType::Anime => self.mal.search(query, ContentType::Anime).await,
        }
    }

    /// Show listing from TVmaze, with TMDB seasons attached
    pub async fn show_listing(&self, show_id: &str) -> AppResult<Option<ContentSummary>> {
        let Some(mut show) = self.tvmaze.fetch(show_id, ContentType::Show).await? else {
            return Ok(None);
        };

        self.attach_seasons(&mut show).await;
        Ok(Some(show))
    }

    /// Top-ranked anime
    pub async fn popular_anime(&self) -> AppResult<Vec<ContentSummary>> {
        self.mal.popular(ContentType::Anime).await
    }

    /// Sets `seasons` from TMDB, leaving the show untouched on failure
    pub async fn attach_seasons(&self, show: &mut ContentSummary) {
        if show.id.is_empty() {
            return;
        }

        match self.tmdb.seasons(&show.id).await {
            Ok(seasons) => show.seasons = Some(seasons),
            Err(e) => {
                tracing::warn!(
                    show_id = %show.id,
                    error = %e,
                    "Error fetching seasons for show"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::Season, services::providers::MockCatalogProvider};

    fn named(name: &'static str) -> MockCatalogProvider {
        let mut provider = MockCatalogProvider::new();
        provider.expect_name().return_const(name);
        provider
    }

    fn show(id: &str) -> ContentSummary {
        ContentSummary::empty(id, ContentType::Show)
    }

    fn adapter(
        tmdb: MockCatalogProvider,
        tvmaze: MockCatalogProvider,
        mal: MockCatalogProvider,
    ) -> CatalogAdapter {
        CatalogAdapter::new(Arc::new(tmdb), Arc::new(tvmaze), Arc::new(mal))
    }

    #[tokio::test]
    async fn test_empty_query_rejected_before_upstream() {
        let mut tvmaze = named("tvmaze");
        tvmaze.expect_search().never();

        let catalog = adapter(named("tmdb"), tvmaze, named("mal"));
        let result = catalog.search("   ", None).await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_show_search_attaches_seasons_best_effort() {
        let mut tvmaze = named("tvmaze");
        tvmaze
            .expect_search()
            .returning(|_, _| Ok(vec![show("1"), show("2"), show("3")]));

        let mut tmdb = named("tmdb");
        tmdb.expect_seasons().returning(|id| match id {
            "2" => Err(AppError::ExternalApi("TMDB API returned status 500".to_string())),
            _ => Ok(vec![Season {
                season_number: 1,
                episode_count: 8,
                name: "Season 1".to_string(),
            }]),
        });

        let catalog = adapter(tmdb, tvmaze, named("mal"));
        let results = catalog.search("dome", None).await.unwrap();

        assert_eq!(results.len(), 3);
        assert!(results[0].seasons.is_some());
        assert!(results[1].seasons.is_none());
        assert!(results[2].seasons.is_some());
    }

    #[tokio::test]
    async fn test_search_failure_fails_request() {
        let mut mal = named("mal");
        mal.expect_search().returning(|_, _| {
            Err(AppError::ExternalApi(
                "MyAnimeList API returned status 503".to_string(),
            ))
        });

        let catalog = adapter(named("tmdb"), named("tvmaze"), mal);
        let result = catalog.search("naruto", Some(ContentType::Anime)).await;

        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }

    #[tokio::test]
    async fn test_fetch_routes_by_content_type() {
        let mut tmdb = named("tmdb");
        tmdb.expect_fetch()
            .withf(|_, content_type| *content_type != ContentType::Anime)
            .returning(|id, content_type| Ok(Some(ContentSummary::empty(id, content_type))));

        let mut mal = named("mal");
        mal.expect_fetch()
            .withf(|_, content_type| *content_type == ContentType::Anime)
            .times(1)
            .returning(|id, content_type| Ok(Some(ContentSummary::empty(id, content_type))));

        let catalog = adapter(tmdb, named("tvmaze"), mal);

        let movie = catalog.fetch_content("603", ContentType::Movie).await.unwrap();
        let anime = catalog.fetch_content("5114", ContentType::Anime).await.unwrap();

        assert_eq!(movie.map(|m| m.content_type), Some(ContentType::Movie));
        assert_eq!(anime.map(|a| a.id), Some("5114".to_string()));
    }

    #[tokio::test]
    async fn test_show_listing_missing_show() {
        let mut tvmaze = named("tvmaze");
        tvmaze.expect_fetch().returning(|_, _| Ok(None));
        let mut tmdb = named("tmdb");
        tmdb.expect_seasons().never();

        let catalog = adapter(tmdb, tvmaze, named("mal"));
        assert!(catalog.show_listing("999999").await.unwrap().is_none());
    }
}
