use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{
        ContentSummary, ContentType, StatusSelection, UpsertOutcome, WatchStatus,
        WatchStatusKey, WatchStatusRecord, WatchStatusUpdate,
    },
    routes::{
        watch_status::{present, MessageResponse},
        AppState,
    },
    services::AllContent,
};

/// Status with progress, or `{"status": "none"}` when unset
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum UserStatusResponse {
    #[serde(rename_all = "camelCase")]
    Found {
        status: WatchStatus,
        last_season: Option<i32>,
        last_episode: Option<i32>,
    },
    Missing {
        status: StatusSelection,
    },
}

impl From<Option<WatchStatusRecord>> for UserStatusResponse {
    fn from(record: Option<WatchStatusRecord>) -> Self {
        match record {
            Some(record) => UserStatusResponse::Found {
                status: record.status,
                last_season: record.last_season,
                last_episode: record.last_episode,
            },
            None => UserStatusResponse::Missing {
                status: StatusSelection::None,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    status: Option<String>,
    last_season: Option<i32>,
    last_episode: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ByStatusQuery {
    status: Option<String>,
}

/// Handler for CORS preflight on per-user routes
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Handler for GET /users/{userId}/watch-status/{contentType}/{contentId}
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path((user_id, content_type, content_id)): Path<(String, String, String)>,
) -> AppResult<Json<UserStatusResponse>> {
    let key = WatchStatusKey::new(user_id, content_id, content_type.parse::<ContentType>()?);
    let record = state.store.get(&key).await?;

    Ok(Json(record.into()))
}

/// Handler for PUT /users/{userId}/watch-status/{contentType}/{contentId}
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path((user_id, content_type, content_id)): Path<(String, String, String)>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Json(request) = payload?;

    let status = present(request.status)
        .ok_or_else(|| AppError::InvalidInput("Status is required".to_string()))?
        .parse::<StatusSelection>()?;
    let key = WatchStatusKey::new(user_id, content_id, content_type.parse::<ContentType>()?);

    let outcome = state
        .store
        .upsert(
            &key,
            WatchStatusUpdate {
                status,
                last_season: request.last_season,
                last_episode: request.last_episode,
            },
        )
        .await?;

    tracing::info!(
        request_id = %request_id,
        user_id = %key.user_id,
        content_id = %key.content_id,
        content_type = %key.content_type,
        status = %status,
        outcome = ?outcome,
        "Watch status written"
    );

    Ok(MessageResponse::new(match outcome {
        UpsertOutcome::Created | UpsertOutcome::Updated => "Status updated successfully",
        UpsertOutcome::Removed => "Status removed successfully",
        UpsertOutcome::Unchanged => "No status to remove",
    }))
}

/// Handler for GET /users/{userId}/watch-status/batch
///
/// Returns `contentId -> status` with every requested id present.
pub async fn batch_status(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> AppResult<Json<BTreeMap<String, StatusSelection>>> {
    let mut content_type = None;
    let mut content_ids = Vec::new();

    for (name, value) in pairs {
        match name.as_str() {
            "contentType" => content_type = Some(value),
            "contentIds" if !value.is_empty() => content_ids.push(value),
            _ => {}
        }
    }

    let content_type = match present(content_type) {
        Some(content_type) if !content_ids.is_empty() => content_type.parse::<ContentType>()?,
        _ => {
            return Err(AppError::InvalidInput(
                "contentIds and contentType are required".to_string(),
            ))
        }
    };

    let statuses = state
        .store
        .batch_get(&user_id, &content_ids, content_type)
        .await?;

    Ok(Json(statuses))
}

/// Handler for GET /users/{userId}/watch-status/{contentType}?status=
///
/// Responds with `{"<contentType>s": [...]}`.
pub async fn content_by_status(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path((user_id, content_type)): Path<(String, String)>,
    Query(params): Query<ByStatusQuery>,
) -> AppResult<Json<BTreeMap<String, Vec<ContentSummary>>>> {
    let status = present(params.status)
        .ok_or_else(|| AppError::InvalidInput("status parameter is required".to_string()))?
        .parse::<WatchStatus>()?;
    let content_type = content_type.parse::<ContentType>()?;

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        content_type = %content_type,
        status = %status,
        "Fetching content by status"
    );

    let content = state
        .aggregation
        .content_by_status(&user_id, content_type, status)
        .await?;

    tracing::info!(
        request_id = %request_id,
        returned = content.len(),
        "Content by status resolved"
    );

    Ok(Json(BTreeMap::from([(content_type.listing_key(), content)])))
}

/// Handler for GET /users/{userId}/watch-status/all
pub async fn all_content(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<String>,
) -> AppResult<Json<AllContent>> {
    tracing::info!(request_id = %request_id, user_id = %user_id, "Fetching all content");

    let content = state.aggregation.get_all_content(&user_id).await?;
    Ok(Json(content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_found_response_keeps_null_progress() {
        let now = Utc::now();
        let response = UserStatusResponse::from(Some(WatchStatusRecord {
            user_id: "u".to_string(),
            content_id: "1".to_string(),
            content_type: ContentType::Movie,
            status: WatchStatus::Watched,
            last_season: None,
            last_episode: None,
            created_at: now,
            updated_at: now,
        }));

        let value = serde_json::to_value(response).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "status": "watched", "lastSeason": null, "lastEpisode": null })
        );
    }

    #[test]
    fn test_missing_response_is_status_none() {
        let value = serde_json::to_value(UserStatusResponse::from(None)).unwrap();
        assert_eq!(value, serde_json::json!({ "status": "none" }));
    }
}
