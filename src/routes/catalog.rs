use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{ContentSummary, ContentType},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<ContentSummary>,
}

async fn run_search(
    state: &AppState,
    request_id: RequestId,
    query: &str,
    content_type: ContentType,
) -> AppResult<Json<SearchResponse>> {
    tracing::info!(
        request_id = %request_id,
        query = %query,
        content_type = %content_type,
        "Processing search request"
    );

    let results = state.catalog.search(query, Some(content_type)).await?;
    Ok(Json(SearchResponse { results }))
}

fn found(
    summary: Option<ContentSummary>,
    content_type: ContentType,
    id: &str,
) -> AppResult<Json<ContentSummary>> {
    summary
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("{} {} not found", content_type, id)))
}

/// Handler for show search (TVmaze, TMDB seasons attached)
pub async fn search_shows(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<SearchResponse>> {
    run_search(&state, request_id, &params.q, ContentType::Show).await
}

/// Handler for a single show listing
pub async fn get_show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<ContentSummary>> {
    let show = state.catalog.show_listing(&id).await?;
    found(show, ContentType::Show, &id)
}

/// Handler for movie search
pub async fn search_movies(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<SearchResponse>> {
    run_search(&state, request_id, &params.q, ContentType::Movie).await
}

/// Handler for a single movie
pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<ContentSummary>> {
    let movie = state.catalog.fetch_content(&id, ContentType::Movie).await?;
    found(movie, ContentType::Movie, &id)
}

/// Handler for the anime ranking
pub async fn popular_anime(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<SearchResponse>> {
    let results = state.catalog.popular_anime().await?;
    Ok(Json(SearchResponse { results }))
}

/// Handler for anime search
pub async fn search_anime(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<SearchResponse>> {
    run_search(&state, request_id, &params.q, ContentType::Anime).await
}

/// Handler for anime details
pub async fn get_anime(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<ContentSummary>> {
    let anime = state.catalog.fetch_content(&id, ContentType::Anime).await?;
    found(anime, ContentType::Anime, &id)
}
