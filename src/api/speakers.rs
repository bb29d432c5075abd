//! Speaker API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{ApiResult, SuccessResponse};
use crate::errors::AppError;
use crate::models::{CreateSpeakerRequest, Speaker, UpdateSpeakerRequest};
use crate::AppState;

/// GET /api/speakers - List all speakers, newest first.
pub async fn list_speakers(State(state): State<AppState>) -> ApiResult<Json<Vec<Speaker>>> {
    Ok(Json(state.store.list_speakers().await?))
}

/// GET /api/speakers/:id - Get a single speaker.
pub async fn get_speaker(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Speaker>> {
    match state.store.get_speaker(&id).await? {
        Some(speaker) => Ok(Json(speaker)),
        None => Err(AppError::NotFound(format!("Speaker {} not found", id))),
    }
}

/// POST /api/speakers - Create a new speaker.
pub async fn create_speaker(
    State(state): State<AppState>,
    Json(request): Json<CreateSpeakerRequest>,
) -> ApiResult<(StatusCode, Json<Speaker>)> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }

    let speaker = state.store.create_speaker(&request).await?;
    Ok((StatusCode::CREATED, Json(speaker)))
}

/// PUT /api/speakers/:id - Update a speaker (no-op for unknown ids).
pub async fn update_speaker(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateSpeakerRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    state.store.update_speaker(&id, &request).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// DELETE /api/speakers/:id - Delete a speaker and scrub session references.
pub async fn delete_speaker(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    state.store.delete_speaker(&id).await?;
    Ok(Json(SuccessResponse::ok()))
}
