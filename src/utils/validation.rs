//! Input validation and parsing utilities
//!
//! Turns raw command-line values (`KEY=VALUE` pairs, JSON strings, URLs,
//! emails) into typed values or classified errors.

use crate::error::{CliError, ValidationError};
use serde_json::Value;

/// Validate that a URL is properly formatted
pub fn validate_url(url: &str) -> crate::Result<()> {
    if url.is_empty() {
        return Err(CliError::InvalidArguments("URL cannot be empty".to_string()).into());
    }

    // Basic URL validation - must start with http:// or https://
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(CliError::InvalidArguments(format!(
            "Invalid URL '{}': URL must start with http:// or https://",
            url
        ))
        .into());
    }

    Ok(())
}

/// Validate email format
pub fn validate_email(email: &str) -> crate::Result<()> {
    if email.is_empty() {
        return Err(CliError::InvalidArguments("Email cannot be empty".to_string()).into());
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(CliError::InvalidArguments(format!(
            "Invalid email '{}': Email must have username and domain parts",
            email
        ))
        .into());
    }

    Ok(())
}

/// Split `KEY=VALUE` strings on the first `=`, keeping order and duplicates.
pub fn parse_key_value_pairs(pairs: &[String]) -> Result<Vec<(String, String)>, CliError> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(CliError::InvalidKeyValue(pair.clone())),
        })
        .collect()
}

/// Parse a raw JSON argument.
pub fn parse_json(raw: &str) -> Result<Value, ValidationError> {
    serde_json::from_str(raw).map_err(|e| ValidationError::MalformedJson(e.to_string()))
}

/// Parse an optional JSON argument that must be an object, e.g. `--metadata`.
pub fn parse_json_object(raw: Option<&str>, field: &str) -> Result<Option<Value>, ValidationError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    match parse_json(raw)? {
        value @ Value::Object(_) => Ok(Some(value)),
        other => Err(ValidationError::MalformedJson(format!(
            "{} must be a JSON object, got {}",
            field, other
        ))),
    }
}
