//! Data models for the DevFest conference site.
//!
//! These models match the frontend TypeScript interfaces exactly for seamless interoperability.

mod admin;
mod datastore;
mod event;
mod review;
mod session;
mod speaker;

pub use admin::*;
pub use datastore::*;
pub use event::*;
pub use review::*;
pub use session::*;
pub use speaker::*;
