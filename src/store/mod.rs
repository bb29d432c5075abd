//! Persistence layer with two interchangeable backends.
//!
//! The [`Store`] trait is the uniform query contract; [`FileStore`] keeps the
//! whole datastore as one JSON document and [`SqliteStore`] maps each entity
//! to a table. The backend is picked at construction time from configuration
//! and handlers only ever see an `Arc<dyn Store>`.

mod file;
pub mod rating;
mod sql;

pub use file::FileStore;
pub use sql::{init_database, SqliteStore};

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};

use crate::config::{Config, StorageBackend};
use crate::errors::AppError;
use crate::models::{
    Admin, CreateEventRequest, CreateReviewRequest, CreateSessionRequest, CreateSpeakerRequest,
    Datastore, Event, MigrationReport, Review, ReviewFilter, Session, Speaker,
    UpdateEventRequest, UpdateSessionRequest, UpdateSpeakerRequest,
};

/// Uniform CRUD contract satisfied by both backends.
///
/// `update_*` and `delete_*` are idempotent no-ops for unknown ids; they only
/// fail on storage-layer errors.
#[async_trait]
pub trait Store: Send + Sync {
    // Speakers
    async fn list_speakers(&self) -> Result<Vec<Speaker>, AppError>;
    async fn get_speaker(&self, id: &str) -> Result<Option<Speaker>, AppError>;
    async fn create_speaker(&self, request: &CreateSpeakerRequest) -> Result<Speaker, AppError>;
    async fn update_speaker(
        &self,
        id: &str,
        request: &UpdateSpeakerRequest,
    ) -> Result<(), AppError>;
    /// Deletes the speaker and scrubs its id from every session's speaker list.
    async fn delete_speaker(&self, id: &str) -> Result<(), AppError>;

    // Sessions
    async fn list_sessions(&self) -> Result<Vec<Session>, AppError>;
    async fn get_session(&self, id: &str) -> Result<Option<Session>, AppError>;
    async fn create_session(&self, request: &CreateSessionRequest) -> Result<Session, AppError>;
    async fn update_session(
        &self,
        id: &str,
        request: &UpdateSessionRequest,
    ) -> Result<(), AppError>;
    async fn delete_session(&self, id: &str) -> Result<(), AppError>;

    // Event (singleton)
    async fn get_event(&self) -> Result<Option<Event>, AppError>;
    /// Replaces the current event record, if any.
    async fn create_event(&self, request: &CreateEventRequest) -> Result<Event, AppError>;
    async fn update_event(&self, id: &str, request: &UpdateEventRequest) -> Result<(), AppError>;

    // Reviews
    async fn list_reviews(&self, filter: &ReviewFilter) -> Result<Vec<Review>, AppError>;
    /// Persists the review and, for speaker reviews, re-derives the speaker's
    /// rating fields before returning.
    async fn create_review(&self, request: &CreateReviewRequest) -> Result<Review, AppError>;
    async fn delete_review(&self, id: &str) -> Result<(), AppError>;

    // Admins
    async fn get_admin_by_username(&self, username: &str) -> Result<Option<Admin>, AppError>;
    async fn create_admin(&self, username: &str, password_hash: &str) -> Result<Admin, AppError>;

    /// Imports a whole-store document, skipping records whose id already
    /// exists. Returns per-collection counts of inserted records.
    async fn import(&self, data: &Datastore) -> Result<MigrationReport, AppError>;
}

/// Construct the configured backend.
pub async fn from_config(config: &Config) -> Result<Arc<dyn Store>, AppError> {
    match config.storage {
        StorageBackend::File => Ok(Arc::new(FileStore::new(config.data_path.clone()))),
        StorageBackend::Sqlite => {
            let pool = init_database(&config.db_path).await?;
            Ok(Arc::new(SqliteStore::new(pool)))
        }
    }
}

/// Generate a record identifier: millisecond timestamp plus a short random
/// suffix, matching the ids already present in existing data files.
pub fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}", millis, &hex[..9])
}

/// Current time as an RFC 3339 UTC string with millisecond precision.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Normalize an optional text field: empty or whitespace-only becomes absent.
/// Both backends apply this so serialized records are field-for-field equal.
pub(crate) fn clean_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Drop duplicate ids, preserving first occurrence.
pub(crate) fn dedup_ids(ids: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}
