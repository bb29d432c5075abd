//! Whole-store document model.
//!
//! This is both the on-disk layout of the file backend and the payload moved
//! by the migration endpoint.

use serde::{Deserialize, Serialize};

use super::{Admin, Event, Review, Session, Speaker};

/// The root document containing all persisted collections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datastore {
    #[serde(default)]
    pub speakers: Vec<Speaker>,
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub admins: Vec<Admin>,
}

/// Per-collection record counts reported by a migration run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub speakers: usize,
    pub sessions: usize,
    pub events: usize,
    pub reviews: usize,
    pub admins: usize,
}
