use crate::error::{AuthError, NotFoundError, TransportError, ValidationError};
use crate::AppError;
use serde_json::Value;
use std::error::Error as _;

/// Helper functions for standardizing error conversions across the codebase.
/// Convert reqwest errors to a classified transport error with endpoint context
pub fn convert_request_error(error: reqwest::Error, endpoint: &str, timeout_secs: u64) -> TransportError {
    if error.is_timeout() {
        return convert_timeout_error(endpoint, timeout_secs);
    }

    let message = error_chain_message(&error);
    if error.is_connect() && is_dns_failure(&message) {
        TransportError::DnsFailure {
            endpoint: endpoint.to_string(),
            message,
        }
    } else {
        TransportError::ConnectionFailed {
            endpoint: endpoint.to_string(),
            message,
        }
    }
}

/// Convert timeout errors to TransportError with endpoint context
pub fn convert_timeout_error(endpoint: &str, timeout_secs: u64) -> TransportError {
    TransportError::Timeout {
        timeout_secs,
        endpoint: endpoint.to_string(),
    }
}

/// Map a non-success HTTP status to its error class.
pub fn convert_status_error(status: u16, endpoint: &str, body: &str, timeout_secs: u64) -> AppError {
    let message = server_message(body);
    match status {
        401 | 403 => AuthError::Rejected {
            status,
            endpoint: endpoint.to_string(),
            server_message: message,
        }
        .into(),
        404 => NotFoundError {
            endpoint: endpoint.to_string(),
            server_message: message,
        }
        .into(),
        408 | 504 => convert_timeout_error(endpoint, timeout_secs).into(),
        500..=599 => TransportError::ServerError {
            status,
            endpoint: endpoint.to_string(),
            message,
        }
        .into(),
        _ => ValidationError::Server {
            status,
            endpoint: endpoint.to_string(),
            message,
        }
        .into(),
    }
}

/// Pull a human-readable message out of an error body.
/// FastAPI puts it in `detail`; other services use `message` or `error`.
pub fn server_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "Unknown error".to_string();
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        for key in ["detail", "message", "error"] {
            match map.get(key) {
                Some(Value::String(s)) => return s.clone(),
                Some(other) if !other.is_null() => return other.to_string(),
                _ => {}
            }
        }
    }

    trimmed.to_string()
}

fn error_chain_message(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

fn is_dns_failure(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("dns error")
        || lower.contains("failed to lookup address")
        || lower.contains("name or service not known")
        || lower.contains("no such host")
}
