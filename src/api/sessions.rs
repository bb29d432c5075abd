//! Session API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{ApiResult, SuccessResponse};
use crate::errors::AppError;
use crate::models::{CreateSessionRequest, Session, UpdateSessionRequest};
use crate::AppState;

/// GET /api/sessions - List all sessions in schedule order.
pub async fn list_sessions(State(state): State<AppState>) -> ApiResult<Json<Vec<Session>>> {
    Ok(Json(state.store.list_sessions().await?))
}

/// GET /api/sessions/:id - Get a single session.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Session>> {
    match state.store.get_session(&id).await? {
        Some(session) => Ok(Json(session)),
        None => Err(AppError::NotFound(format!("Session {} not found", id))),
    }
}

/// POST /api/sessions - Create a new session.
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> ApiResult<(StatusCode, Json<Session>)> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }

    let session = state.store.create_session(&request).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// PUT /api/sessions/:id - Update a session (no-op for unknown ids).
pub async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateSessionRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    state.store.update_session(&id, &request).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// DELETE /api/sessions/:id - Delete a session.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    state.store.delete_session(&id).await?;
    Ok(Json(SuccessResponse::ok()))
}
