//! Review model matching the frontend Review interface.

use serde::{Deserialize, Serialize};

/// A visitor review targeting either a speaker or a session, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_avatar: String,
    /// Integer 1-5
    pub rating: i64,
    pub comment: String,
    /// Display date as entered by the reviewer
    pub date: String,
    pub created_at: String,
}

/// Request body for creating a review.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    #[serde(default)]
    pub speaker_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    pub user_name: String,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_avatar: String,
    pub rating: i64,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub date: String,
}

/// Query filters for listing reviews.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewFilter {
    #[serde(default)]
    pub speaker_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}
