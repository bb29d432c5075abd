//! Data migration endpoint.
//!
//! Imports the flat-file JSON document into the active store, so a
//! deployment can move from the file backend to the relational one without
//! hand-copying records. Guarded by a shared secret header; disabled when no
//! secret is configured.

use axum::{extract::State, http::HeaderMap, Json};

use super::ApiResult;
use crate::auth::{constant_time_compare, MIGRATE_SECRET_HEADER};
use crate::errors::AppError;
use crate::models::MigrationReport;
use crate::store::FileStore;
use crate::AppState;

/// POST /api/migrate - Import the configured data file into the active store.
pub async fn run_migration(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<MigrationReport>> {
    let Some(expected) = &state.config.migrate_secret else {
        return Err(AppError::Unauthorized(
            "Migration is not configured".to_string(),
        ));
    };

    let provided = headers
        .get(MIGRATE_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !constant_time_compare(provided, expected) {
        return Err(AppError::Unauthorized(
            "Missing or invalid migration secret".to_string(),
        ));
    }

    let source = FileStore::new(state.config.data_path.clone());
    let document = source.load().await?;
    let report = state.store.import(&document).await?;

    tracing::info!(
        speakers = report.speakers,
        sessions = report.sessions,
        events = report.events,
        reviews = report.reviews,
        admins = report.admins,
        "Migration complete"
    );

    Ok(Json(report))
}
