//! Storage layer
//!
//! Handles configuration loading and credential persistence.
//! Configuration comes from TOML plus the environment; credentials are cached
//! as JSON next to the configuration file.

use crate::error::StorageError;

pub mod config;
pub mod credentials;

type Result<T> = std::result::Result<T, StorageError>;
