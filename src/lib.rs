//! langconnect-cli - command line client for the LangConnect API
//!
//! Session handling (sign in, refresh, sign out) lives in [`core::session`];
//! every outbound call is a [`api::request::RequestSpec`] sent through the
//! session manager.

pub use error::AppError;

/// Main architecture layers (dependency flow: CLI → Core → Storage)
pub mod cli; // Command-line interface
pub mod core; // Session lifecycle and resource operations
pub mod storage; // Configuration and credential persistence

/// Support modules (used across layers)
pub mod api; // LangConnect API client
pub mod error; // Error handling
pub mod utils; // Shared utilities and helpers

pub type Result<T> = std::result::Result<T, AppError>;
