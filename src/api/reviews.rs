//! Review API endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::{ApiResult, SuccessResponse};
use crate::errors::AppError;
use crate::models::{CreateReviewRequest, Review, ReviewFilter};
use crate::AppState;

/// GET /api/reviews - List reviews, newest first. Accepts optional
/// `speakerId`/`sessionId` query filters.
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(filter): Query<ReviewFilter>,
) -> ApiResult<Json<Vec<Review>>> {
    Ok(Json(state.store.list_reviews(&filter).await?))
}

/// POST /api/reviews - Create a review targeting exactly one of a speaker or
/// a session.
pub async fn create_review(
    State(state): State<AppState>,
    Json(request): Json<CreateReviewRequest>,
) -> ApiResult<(StatusCode, Json<Review>)> {
    let has_speaker = request
        .speaker_id
        .as_deref()
        .is_some_and(|s| !s.trim().is_empty());
    let has_session = request
        .session_id
        .as_deref()
        .is_some_and(|s| !s.trim().is_empty());

    match (has_speaker, has_session) {
        (false, false) => {
            return Err(AppError::Validation(
                "Either speakerId or sessionId must be provided".to_string(),
            ))
        }
        (true, true) => {
            return Err(AppError::Validation(
                "A review targets either a speaker or a session, not both".to_string(),
            ))
        }
        _ => {}
    }

    if !(1..=5).contains(&request.rating) {
        return Err(AppError::Validation(
            "Rating must be an integer between 1 and 5".to_string(),
        ));
    }

    let review = state.store.create_review(&request).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// DELETE /api/reviews/:id - Delete a review; re-derives the speaker rating
/// when the review targeted a speaker.
pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    state.store.delete_review(&id).await?;
    Ok(Json(SuccessResponse::ok()))
}
