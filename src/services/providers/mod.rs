/// Upstream catalog abstraction
///
/// Each external metadata source (TMDB, TVmaze, MyAnimeList) implements
/// `CatalogProvider` and maps its own payloads into `ContentSummary`. Routing
/// between providers lives in `CatalogAdapter`.
use reqwest::{Response, StatusCode, Url};

use crate::{
    error::{AppError, AppResult},
    models::{ContentSummary, ContentType, Season},
};

pub mod mal;
pub mod tmdb;
pub mod tvmaze;

pub use mal::MalProvider;
pub use tmdb::TmdbProvider;
pub use tvmaze::TvMazeProvider;

/// Trait for upstream content catalogs
///
/// Every call is a live round trip: no caching, no retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetch one item by the catalog's own id. `Ok(None)` when the catalog has no such item.
    async fn fetch(
        &self,
        content_id: &str,
        content_type: ContentType,
    ) -> AppResult<Option<ContentSummary>>;

    /// Free-text search
    async fn search(&self, query: &str, content_type: ContentType)
        -> AppResult<Vec<ContentSummary>>;

    /// Ordered season list for a show
    async fn seasons(&self, show_id: &str) -> AppResult<Vec<Season>> {
        Err(AppError::Internal(format!(
            "{} does not provide season data (show {})",
            self.name(),
            show_id
        )))
    }

    /// Top-ranked items of one content type
    async fn popular(&self, content_type: ContentType) -> AppResult<Vec<ContentSummary>> {
        Err(AppError::Internal(format!(
            "{} does not provide a popular {} listing",
            self.name(),
            content_type
        )))
    }

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Error for a content type this provider does not serve
pub(crate) fn unsupported(provider: &str, content_type: ContentType) -> AppError {
    AppError::Internal(format!("{} does not serve {} content", provider, content_type))
}

/// Builds `{base}/{segments...}`, percent-encoding each segment
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> AppResult<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| AppError::Internal(format!("Invalid catalog base URL '{}': {}", base, e)))?;

    url.path_segments_mut()
        .map_err(|_| AppError::Internal(format!("Catalog base URL '{}' cannot be a base", base)))?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}

/// Passes 2xx responses through, turns anything else into `ExternalApi`
pub(crate) async fn ensure_success(provider: &str, response: Response) -> AppResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(AppError::ExternalApi(format!(
        "{} API returned status {}: {}",
        provider, status, body
    )))
}

/// Like `ensure_success`, but a 404 means the item does not exist
pub(crate) async fn ensure_found(
    provider: &str,
    response: Response,
) -> AppResult<Option<Response>> {
    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }

    ensure_success(provider, response).await.map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_appends_segments() {
        let url = endpoint("https://api.themoviedb.org/3", &["tv", "1399"]).unwrap();
        assert_eq!(url.as_str(), "https://api.themoviedb.org/3/tv/1399");
    }

    #[test]
    fn test_endpoint_handles_trailing_slash() {
        let url = endpoint("https://api.tvmaze.com/", &["shows", "169"]).unwrap();
        assert_eq!(url.as_str(), "https://api.tvmaze.com/shows/169");
    }

    #[test]
    fn test_endpoint_escapes_ids() {
        let url = endpoint("https://api.tvmaze.com", &["shows", "../search"]).unwrap();
        assert_eq!(url.path(), "/shows/..%2Fsearch");
    }

    #[test]
    fn test_endpoint_rejects_bad_base() {
        assert!(matches!(
            endpoint("not a url", &["x"]),
            Err(AppError::Internal(_))
        ));
    }
}
