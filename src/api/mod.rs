//! REST API module.
//!
//! Contains all API routes and handlers following the frontend contract.

mod events;
mod migrate;
mod reviews;
mod sessions;
mod speakers;

pub use events::*;
pub use migrate::*;
pub use reviews::*;
pub use sessions::*;
pub use speakers::*;

use serde::Serialize;

/// Response body for mutations that only report success (PUT/DELETE).
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Handler result; errors map to status codes in `errors::AppError`.
pub type ApiResult<T> = Result<T, crate::errors::AppError>;
