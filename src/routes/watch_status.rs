use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{
        ContentType, StatusSelection, UpsertOutcome, WatchStatusKey, WatchStatusRecord,
        WatchStatusUpdate,
    },
    routes::AppState,
};

const BATCH_PARAMS_REQUIRED: &str = "userId, contentIds, and contentType are required";

/// Treats an empty parameter the same as a missing one
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Json<Self> {
        Json(Self { message })
    }
}

/// Stored record, or `{"status": "none"}` when there is none
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum StatusLookup {
    Found(WatchStatusRecord),
    Missing { status: StatusSelection },
}

impl From<Option<WatchStatusRecord>> for StatusLookup {
    fn from(record: Option<WatchStatusRecord>) -> Self {
        match record {
            Some(record) => StatusLookup::Found(record),
            None => StatusLookup::Missing {
                status: StatusSelection::None,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    user_id: Option<String>,
    content_id: Option<String>,
    content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    user_id: Option<String>,
    content_id: Option<String>,
    content_type: Option<String>,
    status: Option<String>,
    last_season: Option<i32>,
    last_episode: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct BatchStatusResponse {
    pub statuses: Vec<WatchStatusRecord>,
}

/// Handler for GET /api/watch-status
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatusQuery>,
) -> AppResult<Json<StatusLookup>> {
    let (Some(user_id), Some(content_id), Some(content_type)) = (
        present(params.user_id),
        present(params.content_id),
        present(params.content_type),
    ) else {
        return Err(AppError::InvalidInput(
            "userId, contentId, and contentType are required".to_string(),
        ));
    };

    let key = WatchStatusKey::new(user_id, content_id, content_type.parse::<ContentType>()?);
    let record = state.store.get(&key).await?;

    Ok(Json(record.into()))
}

/// Handler for POST /api/watch-status
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Json(request) = payload?;

    let (Some(user_id), Some(content_id), Some(content_type), Some(status)) = (
        present(request.user_id),
        present(request.content_id),
        present(request.content_type),
        present(request.status),
    ) else {
        return Err(AppError::InvalidInput(
            "userId, contentId, contentType, and status are required".to_string(),
        ));
    };

    let status = status.parse::<StatusSelection>()?;
    let key = WatchStatusKey::new(user_id, content_id, content_type.parse::<ContentType>()?);
    let update = WatchStatusUpdate {
        status,
        last_season: request.last_season,
        last_episode: request.last_episode,
    };

    let outcome = state.store.upsert(&key, update).await?;

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
        UpsertOutcome::Created => "Status created successfully",
        UpsertOutcome::Updated => "Status updated successfully",
        UpsertOutcome::Removed => "Status removed successfully",
        UpsertOutcome::Unchanged => "No action needed",
    }))
}

/// Handler for GET /api/watch-status/batch
///
/// `contentIds` repeats once per id, so the raw pairs are read instead of a struct.
pub async fn batch_status(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> AppResult<Json<BatchStatusResponse>> {
    let mut user_id = None;
    let mut content_type = None;
    let mut content_ids = Vec::new();

    for (name, value) in pairs {
        match name.as_str() {
            "userId" => user_id = Some(value),
            "contentType" => content_type = Some(value),
            "contentIds" if !value.is_empty() => content_ids.push(value),
            _ => {}
        }
    }

    let (Some(user_id), Some(content_type)) = (present(user_id), present(content_type)) else {
        return Err(AppError::InvalidInput(BATCH_PARAMS_REQUIRED.to_string()));
    };
    if content_ids.is_empty() {
        return Err(AppError::InvalidInput(BATCH_PARAMS_REQUIRED.to_string()));
    }

    let statuses = state
        .store
        .find_many(&user_id, &content_ids, content_type.parse::<ContentType>()?)
        .await?;

    Ok(Json(BatchStatusResponse { statuses }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_filters_blank() {
        assert_eq!(present(Some("u1".to_string())), Some("u1".to_string()));
        assert_eq!(present(Some("  ".to_string())), None);
        assert_eq!(present(None), None);
    }

    #[test]
    fn test_missing_lookup_serializes_none() {
        let value = serde_json::to_value(StatusLookup::from(None)).unwrap();
        assert_eq!(value, serde_json::json!({ "status": "none" }));
    }
}
