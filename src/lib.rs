//! DevFest Event Backend
//!
//! REST backend for a conference companion app. Serves the public schedule,
//! speaker roster and review feed, plus the admin CRUD surface, over one of
//! two interchangeable persistence backends (flat JSON file or SQLite).

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod models;
pub mod store;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use store::Store;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        // Speakers
        .route("/speakers", get(api::list_speakers))
        .route("/speakers", post(api::create_speaker))
        .route("/speakers/{id}", get(api::get_speaker))
        .route("/speakers/{id}", put(api::update_speaker))
        .route("/speakers/{id}", delete(api::delete_speaker))
        // Sessions
        .route("/sessions", get(api::list_sessions))
        .route("/sessions", post(api::create_session))
        .route("/sessions/{id}", get(api::get_session))
        .route("/sessions/{id}", put(api::update_session))
        .route("/sessions/{id}", delete(api::delete_session))
        // Events (singleton)
        .route("/events", get(api::get_event))
        .route("/events", put(api::update_event))
        // Reviews
        .route("/reviews", get(api::list_reviews))
        .route("/reviews", post(api::create_review))
        .route("/reviews/{id}", delete(api::delete_review))
        // Migration
        .route("/migrate", post(api::run_migration));

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
