//! Utils module - Shared utilities and helpers
//!
//! This module provides utility functions and helpers that are used across
//! multiple layers of the application architecture.

/// CSV splitting into per-row documents
pub mod csv_split;

/// reqwest and status code error conversion
pub mod error_helpers;

/// Logger installation
pub mod logging;

/// Transport retry with exponential backoff
pub mod retry;

/// Input validation and parsing utilities
pub mod validation;
