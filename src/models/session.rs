//! Session model matching the frontend Session interface.

use serde::{Deserialize, Serialize};

/// A talk or workshop on the conference schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Wall-clock start, e.g. "09:00"
    pub start_time: String,
    pub end_time: String,
    pub track: String,
    /// References to speakers; duplicate-free
    #[serde(default)]
    pub speaker_ids: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a new session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub track: String,
    #[serde(default)]
    pub speaker_ids: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Request body for updating an existing session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub track: Option<String>,
    #[serde(default)]
    pub speaker_ids: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}
