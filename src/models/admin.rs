//! Admin credential record.

use serde::{Deserialize, Serialize};

/// An admin account. The password is stored as a bcrypt hash only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: String,
}
