//! Core layer - session lifecycle and resource operations

pub mod auth;
pub mod clock;
pub mod services;
pub mod session;
