/// TMDB API provider
///
/// Serves movie and TV details, movie search, and the season breakdown used
/// to enrich shows found through other catalogs.
///
/// API Flow:
/// 1. Details: /movie/{id} or /tv/{id} (shows carry their `seasons`)
/// 2. Search: /search/movie
/// 3. Seasons: /tv/{id} → `seasons` array
use crate::{
    error::{AppError, AppResult},
    models::{ContentSummary, ContentType, Season, TmdbMovie, TmdbSearchResponse, TmdbShow},
    services::providers::{endpoint, ensure_found, ensure_success, unsupported, CatalogProvider},
};
use reqwest::Client as HttpClient;

const LANGUAGE: &str = "en-US";

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl TmdbProvider {
    pub fn new(http_client: HttpClient, api_key: String, api_url: String) -> Self {
        Self {
            http_client,
            api_key,
            api_url,
        }
    }

    /// Path segment TMDB uses for a content type
    fn media_segment(content_type: ContentType) -> Option<&'static str> {
        match content_type {
            ContentType::Movie => Some("movie"),
            ContentType::Show => Some("tv"),
            ContentType::Anime => None,
        }
    }

    async fn get_details(&self, segment: &str, id: &str) -> AppResult<Option<reqwest::Response>> {
        let url = endpoint(&self.api_url, &[segment, id])?;

        let response = self
            .http_client
            .get(url)
            .query(&[("api_key", self.api_key.as_str()), ("language", LANGUAGE)])
            .send()
            .await?;

        ensure_found(self.name(), response).await
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbProvider {
    async fn fetch(
        &self,
        content_id: &str,
        content_type: ContentType,
    ) -> AppResult<Option<ContentSummary>> {
        let segment = Self::media_segment(content_type)
            .ok_or_else(|| unsupported(self.name(), content_type))?;

        let Some(response) = self.get_details(segment, content_id).await? else {
            tracing::info!(
                content_id = %content_id,
                content_type = %content_type,
                provider = "tmdb",
                "Content not found"
            );
            return Ok(None);
        };

        let summary = match content_type {
            ContentType::Movie => ContentSummary::from(response.json::<TmdbMovie>().await?),
            _ => {
                let show = response.json::<TmdbShow>().await?;
                let seasons = show.seasons.iter().cloned().map(Season::from).collect();
                ContentSummary {
                    seasons: Some(seasons),
                    ..ContentSummary::from(show)
                }
            }
        };

        tracing::info!(
            content_id = %content_id,
            content_type = %content_type,
            provider = "tmdb",
            "Content fetched"
        );

        Ok(Some(summary))
    }

    /// Movie search only; shows are searched on TVmaze
    async fn search(
        &self,
        query: &str,
        content_type: ContentType,
    ) -> AppResult<Vec<ContentSummary>> {
        if content_type != ContentType::Movie {
            return Err(unsupported(self.name(), content_type));
        }
        let url = endpoint(&self.api_url, &["search", "movie"])?;

        let response = self
            .http_client
            .get(url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", LANGUAGE),
                ("query", query),
            ])
            .send()
            .await?;
        let response = ensure_success(self.name(), response).await?;

        let results: Vec<ContentSummary> = response
            .json::<TmdbSearchResponse>()
            .await?
            .results
            .into_iter()
            .map(ContentSummary::from)
            .collect();

        tracing::info!(
            query = %query,
            results = results.len(),
            provider = "tmdb",
            "Search completed"
        );

        Ok(results)
    }

    async fn seasons(&self, show_id: &str) -> AppResult<Vec<Season>> {
        let response = self
            .get_details("tv", show_id)
            .await?
            .ok_or_else(|| AppError::ExternalApi(format!("TMDB has no show {}", show_id)))?;

        let seasons = response.json::<TmdbShow>().await?.into_seasons();

        tracing::debug!(show_id = %show_id, seasons = seasons.len(), "Seasons fetched");

        Ok(seasons)
    }

    fn name(&self) -> &'static str {
        "TMDB"
    }
}
