//! Event API endpoints (singleton record).

use axum::{extract::State, Json};

use super::{ApiResult, SuccessResponse};
use crate::errors::AppError;
use crate::models::{Event, UpdateEventRequest};
use crate::AppState;

/// GET /api/events - Get the singleton event.
pub async fn get_event(State(state): State<AppState>) -> ApiResult<Json<Event>> {
    match state.store.get_event().await? {
        Some(event) => Ok(Json(event)),
        None => Err(AppError::NotFound("Event not found".to_string())),
    }
}

/// PUT /api/events - Update the singleton event; 404 when none exists yet.
pub async fn update_event(
    State(state): State<AppState>,
    Json(request): Json<UpdateEventRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    let Some(current) = state.store.get_event().await? else {
        return Err(AppError::NotFound("Event not found".to_string()));
    };

    state.store.update_event(&current.id, &request).await?;
    Ok(Json(SuccessResponse::ok()))
}
