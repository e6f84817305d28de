/// TVmaze API provider
///
/// Primary source for free-text show search and show listings. No API key.
use crate::{
    error::AppResult,
    models::{ContentSummary, ContentType, TvMazeSearchResult, TvMazeShow},
    services::providers::{endpoint, ensure_found, ensure_success, unsupported, CatalogProvider},
};
use reqwest::Client as HttpClient;

#[derive(Clone)]
pub struct TvMazeProvider {
    http_client: HttpClient,
    api_url: String,
}

impl TvMazeProvider {
    pub fn new(http_client: HttpClient, api_url: String) -> Self {
        Self {
            http_client,
            api_url,
        }
    }

    fn require_show(&self, content_type: ContentType) -> AppResult<()> {
        match content_type {
            ContentType::Show => Ok(()),
            other => Err(unsupported(self.name(), other)),
        }
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TvMazeProvider {
    async fn fetch(
        &self,
        content_id: &str,
        content_type: ContentType,
    ) -> AppResult<Option<ContentSummary>> {
        self.require_show(content_type)?;
        let url = endpoint(&self.api_url, &["shows", content_id])?;

        let response = self.http_client.get(url).send().await?;
        let Some(response) = ensure_found(self.name(), response).await? else {
            return Ok(None);
        };

        let show: TvMazeShow = response.json().await?;

        tracing::info!(show_id = %content_id, provider = "tvmaze", "Show fetched");

        Ok(Some(ContentSummary::from(show)))
    }

    async fn search(
        &self,
        query: &str,
        content_type: ContentType,
    ) -> AppResult<Vec<ContentSummary>> {
        self.require_show(content_type)?;
        let url = endpoint(&self.api_url, &["search", "shows"])?;

        let response = self
            .http_client
            .get(url)
            .query(&[("q", query)])
            .send()
            .await?;
        let response = ensure_success(self.name(), response).await?;

        let results: Vec<TvMazeSearchResult> = response.json().await?;
        let shows: Vec<ContentSummary> = results
            .into_iter()
            .map(|result| ContentSummary::from(result.show))
            .collect();

        tracing::info!(
            query = %query,
            results = shows.len(),
            provider = "tvmaze",
            "Show search completed"
        );

        Ok(shows)
    }

    fn name(&self) -> &'static str {
        "TVmaze"
    }
}
