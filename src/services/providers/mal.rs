/// MyAnimeList API provider
///
/// Serves anime details, search and the overall ranking. Authenticates with a
/// client id header rather than OAuth since only public data is read.
use crate::{
    error::AppResult,
    models::{ContentSummary, ContentType, MalAnime, MalListResponse},
    services::providers::{endpoint, ensure_found, ensure_success, unsupported, CatalogProvider},
};
use reqwest::Client as HttpClient;

const CLIENT_ID_HEADER: &str = "X-MAL-CLIENT-ID";

/// Page size for search and ranking
const LIST_LIMIT: &str = "24";

/// Fields requested for search and ranking entries
const LIST_FIELDS: &str =
    "id,title,main_picture,mean,start_date,synopsis,genres,num_episodes,status";

/// Fields requested for a single anime
const DETAIL_FIELDS: &str = "id,title,main_picture,alternative_titles,start_date,end_date,\
synopsis,mean,rank,popularity,nsfw,status,genres,num_episodes,start_season,broadcast,source,\
average_episode_duration,rating,studios";

#[derive(Clone)]
pub struct MalProvider {
    http_client: HttpClient,
    client_id: String,
    api_url: String,
}

impl MalProvider {
    pub fn new(http_client: HttpClient, client_id: String, api_url: String) -> Self {
        Self {
            http_client,
            client_id,
            api_url,
        }
    }

    fn require_anime(&self, content_type: ContentType) -> AppResult<()> {
        match content_type {
            ContentType::Anime => Ok(()),
            other => Err(unsupported(self.name(), other)),
        }
    }

    async fn fetch_list(
        &self,
        segments: &[&str],
        params: &[(&str, &str)],
    ) -> AppResult<Vec<ContentSummary>> {
        let url = endpoint(&self.api_url, segments)?;

        let response = self
            .http_client
            .get(url)
            .header(CLIENT_ID_HEADER, &self.client_id)
            .query(params)
            .query(&[("limit", LIST_LIMIT), ("fields", LIST_FIELDS)])
            .send()
            .await?;
        let response = ensure_success(self.name(), response).await?;

        let list: MalListResponse = response.json().await?;
        Ok(list
            .data
            .into_iter()
            .map(|entry| ContentSummary::from(entry.node))
            .collect())
    }
}

#[async_trait::async_trait]
impl CatalogProvider for MalProvider {
    async fn fetch(
        &self,
        content_id: &str,
        content_type: ContentType,
    ) -> AppResult<Option<ContentSummary>> {
        self.require_anime(content_type)?;
        let url = endpoint(&self.api_url, &["anime", content_id])?;

        let response = self
            .http_client
            .get(url)
            .header(CLIENT_ID_HEADER, &self.client_id)
            .query(&[("fields", DETAIL_FIELDS)])
            .send()
            .await?;
        let Some(response) = ensure_found(self.name(), response).await? else {
            return Ok(None);
        };

        let anime: MalAnime = response.json().await?;

        tracing::info!(anime_id = %content_id, provider = "mal", "Anime fetched");

        Ok(Some(ContentSummary::from(anime)))
    }

    async fn search(
        &self,
        query: &str,
        content_type: ContentType,
    ) -> AppResult<Vec<ContentSummary>> {
        self.require_anime(content_type)?;

        let results = self.fetch_list(&["anime"], &[("q", query)]).await?;

        tracing::info!(
            query = %query,
            results = results.len(),
            provider = "mal",
            "Anime search completed"
        );

        Ok(results)
    }

    async fn popular(&self, content_type: ContentType) -> AppResult<Vec<ContentSummary>> {
        self.require_anime(content_type)?;

        let results = self
            .fetch_list(&["anime", "ranking"], &[("ranking_type", "all")])
            .await?;

        tracing::info!(results = results.len(), provider = "mal", "Anime ranking fetched");

        Ok(results)
    }

    fn name(&self) -> &'static str {
        "MyAnimeList"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_response_deserialization() {
        let json = r#"{
            "data": [
                {"node": {"id": 5114, "title": "Fullmetal Alchemist: Brotherhood", "mean": 9.1, "num_episodes": 64}},
                {"node": {"id": 9253, "title": "Steins;Gate", "main_picture": null, "mean": null}}
            ],
            "paging": {"next": "https://api.myanimelist.net/v2/anime/ranking?offset=2"}
        }"#;

        let list: MalListResponse = serde_json::from_str(json).unwrap();
        let anime: Vec<ContentSummary> = list.data.into_iter().map(|n| n.node.into()).collect();

        assert_eq!(anime.len(), 2);
        assert_eq!(anime[0].episodes, Some(64));
        assert_eq!(anime[1].rating, crate::models::DEFAULT_RATING);
        assert_eq!(anime[1].episodes, Some(0));
        assert_eq!(anime[1].poster_url, crate::models::PLACEHOLDER_POSTER_URL);
    }

    #[tokio::test]
    async fn test_shows_are_unsupported() {
        let provider = MalProvider::new(
            HttpClient::new(),
            "client".to_string(),
            "http://test.local".to_string(),
        );
        assert!(provider.fetch("1", ContentType::Show).await.is_err());
        assert!(provider.popular(ContentType::Movie).await.is_err());
    }
}
