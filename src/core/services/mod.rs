//! Request builders for the LangConnect resources
//!
//! Each concrete command is expressed as a [`RequestSpec`](crate::api::request::RequestSpec)
//! and sent through the session manager. Only operations that need more than
//! one exchange carry their own async logic here.

pub mod collection_service;
pub mod document_service;

/// Unauthenticated liveness endpoint
pub const HEALTH_PATH: &str = "health";

/// Every path except the health endpoint needs a credential.
pub fn requires_auth(path: &str) -> bool {
    path.trim_matches('/') != HEALTH_PATH
}
