//! Outbound request description
//!
//! A `RequestSpec` is built once per command and handed to the dispatcher,
//! which resolves the staged body fields into a single [`Body`].

use crate::error::ValidationError;
use reqwest::Method;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    /// GET and DELETE can be repeated without duplicating side effects.
    pub fn is_idempotent(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Delete)
    }

    pub fn as_reqwest(&self) -> Method {
        match self {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// A file attached to a multipart upload
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub path: PathBuf,
}

/// Resolved request body
#[derive(Debug, Clone, PartialEq)]
pub enum Body<'a> {
    Empty,
    Json(&'a Value),
    Form(&'a [(String, String)]),
    Multipart {
        fields: &'a [(String, String)],
        files: &'a [FilePart],
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub json: Option<Value>,
    pub form: Option<Vec<(String, String)>>,
    pub files: Vec<FilePart>,
}

impl RequestSpec {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            json: None,
            form: None,
            files: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Append a query pair. Repeated keys are kept in insertion order.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.form = Some(fields);
        self
    }

    pub fn file(mut self, field: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.files.push(FilePart {
            field: field.into(),
            path: path.into(),
        });
        self
    }

    /// Path without a leading slash, as used for URLs and error context.
    pub fn endpoint(&self) -> &str {
        self.path.trim_start_matches('/')
    }

    /// Resolve the staged body fields into exactly one body kind.
    pub fn body(&self) -> Result<Body<'_>, ValidationError> {
        const NO_FIELDS: &[(String, String)] = &[];

        match (&self.json, &self.form, self.files.is_empty()) {
            (Some(_), Some(_), _) | (Some(_), None, false) => Err(ValidationError::ConflictingBody),
            (Some(value), None, true) => Ok(Body::Json(value)),
            (None, form, false) => Ok(Body::Multipart {
                fields: form.as_deref().unwrap_or(NO_FIELDS),
                files: &self.files,
            }),
            (None, Some(fields), true) => Ok(Body::Form(fields)),
            (None, None, true) => Ok(Body::Empty),
        }
    }
}
