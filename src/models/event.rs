//! Event model matching the frontend Event interface.
//!
//! Exactly one event record is meaningful at a time: creating a new one
//! replaces the current record under the file backend and upserts under the
//! relational backend.

use serde::{Deserialize, Serialize};

/// The conference event itself (name, date, venue).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    pub description: String,
    pub date: String,
    pub location: String,
    pub image: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating the event record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub image: String,
}

/// Request body for updating the singleton event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}
