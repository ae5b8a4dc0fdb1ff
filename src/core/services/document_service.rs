use crate::AppError;
use crate::api::request::RequestSpec;
use crate::api::response::Payload;
use crate::core::clock::Clock;
use crate::core::services::collection_service::collection_path;
use crate::core::session::SessionManager;
use crate::error::CliError;
use crate::storage::credentials::CredentialStore;
use crate::utils::retry::RetryExecutor;
use crate::utils::validation::parse_json;
use clap::ValueEnum;
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LIST_LIMIT: u32 = 10;
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;
pub const DEFAULT_CHUNK_SIZE: u32 = 1000;
pub const DEFAULT_CHUNK_OVERLAP: u32 = 200;
pub const DEFAULT_BATCH_SIZE: usize = 50;
/// Pause between upload batches
pub const BATCH_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    Semantic,
    Keyword,
    Hybrid,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Semantic => "semantic",
            SearchType::Keyword => "keyword",
            SearchType::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How `delete-document` interprets its identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DeleteBy {
    #[default]
    #[value(name = "document_id")]
    DocumentId,
    #[value(name = "file_id")]
    FileId,
}

impl DeleteBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeleteBy::DocumentId => "document_id",
            DeleteBy::FileId => "file_id",
        }
    }
}

impl fmt::Display for DeleteBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadOptions {
    pub chunk_size: u32,
    pub chunk_overlap: u32,
    pub metadatas_json: Option<String>,
    pub batch_size: usize,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            metadatas_json: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

pub fn documents_path(collection_id: &str) -> String {
    format!("{}/documents", collection_path(collection_id))
}

pub fn list(collection_id: &str, limit: u32, offset: u32) -> RequestSpec {
    RequestSpec::get(documents_path(collection_id))
        .query("limit", limit)
        .query("offset", offset)
}

/// One multipart upload carrying `files` plus the chunking fields.
pub fn upload(collection_id: &str, files: &[PathBuf], options: &UploadOptions) -> RequestSpec {
    let mut fields = vec![
        ("chunk_size".to_string(), options.chunk_size.to_string()),
        ("chunk_overlap".to_string(), options.chunk_overlap.to_string()),
    ];
    if let Some(metadatas) = &options.metadatas_json {
        fields.push(("metadatas_json".to_string(), metadatas.clone()));
    }

    files.iter().fold(
        RequestSpec::post(documents_path(collection_id)).form(fields),
        |spec, file| spec.file("files", file.clone()),
    )
}

pub fn search(
    collection_id: &str,
    query: &str,
    limit: u32,
    search_type: SearchType,
    filter: Option<Value>,
) -> RequestSpec {
    let mut body = json!({
        "query": query,
        "limit": limit,
        "search_type": search_type.as_str(),
    });
    if let Some(filter) = filter {
        body["filter"] = filter;
    }
    RequestSpec::post(format!("{}/search", documents_path(collection_id))).json(body)
}

pub fn delete(collection_id: &str, document_id: &str, delete_by: DeleteBy) -> RequestSpec {
    RequestSpec::delete(format!("{}/{}", documents_path(collection_id), document_id))
        .query("delete_by", delete_by.as_str())
}

/// Bulk delete by document and/or file ids; at least one id is required.
pub fn bulk_delete(
    collection_id: &str,
    document_ids: &[String],
    file_ids: &[String],
) -> Result<RequestSpec, CliError> {
    if document_ids.is_empty() && file_ids.is_empty() {
        return Err(CliError::InvalidArguments(
            "delete-documents needs at least one --document-id or --file-id".to_string(),
        ));
    }

    let mut body = serde_json::Map::new();
    if !document_ids.is_empty() {
        body.insert("document_ids".to_string(), json!(document_ids));
    }
    if !file_ids.is_empty() {
        body.insert("file_ids".to_string(), json!(file_ids));
    }
    Ok(RequestSpec::delete(documents_path(collection_id)).json(Value::Object(body)))
}

/// Split `--metadatas-json` into one value per batch.
///
/// An array must hold exactly one entry per file and is sliced along the
/// batch boundaries; any other JSON value is sent unchanged with every batch.
pub fn batch_metadatas(
    raw: Option<&str>,
    file_count: usize,
    batch_size: usize,
) -> Result<Vec<Option<String>>, AppError> {
    let batches = file_count.div_ceil(batch_size.max(1));
    let Some(raw) = raw else {
        return Ok(vec![None; batches]);
    };

    let entries = match parse_json(raw)? {
        Value::Array(entries) => entries,
        _ => return Ok(vec![Some(raw.to_string()); batches]),
    };
    if entries.len() != file_count {
        return Err(CliError::InvalidArguments(format!(
            "--metadatas-json has {} entries for {} files",
            entries.len(),
            file_count
        ))
        .into());
    }

    Ok(entries
        .chunks(batch_size.max(1))
        .map(|chunk| Some(Value::Array(chunk.to_vec()).to_string()))
        .collect())
}

/// Upload `files` in batches of `options.batch_size`, pausing `delay`
/// between batches. Each batch goes through `retry`; the first batch that
/// still fails stops the upload.
///
/// A single batch returns its payload as is; several batches return a JSON
/// array of the batch payloads.
pub async fn upload_in_batches<S, C>(
    session: &mut SessionManager<S, C>,
    retry: &RetryExecutor,
    collection_id: &str,
    files: &[PathBuf],
    options: &UploadOptions,
    delay: Duration,
) -> Result<Payload, AppError>
where
    S: CredentialStore,
    C: Clock,
{
    if files.is_empty() {
        return Err(CliError::InvalidArguments("No files to upload".to_string()).into());
    }

    let batch_size = options.batch_size.max(1);
    let metadatas = batch_metadatas(options.metadatas_json.as_deref(), files.len(), batch_size)?;
    let total = metadatas.len();
    let mut results = Vec::with_capacity(total);

    for (index, (batch, metadatas_json)) in files.chunks(batch_size).zip(metadatas).enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        log::info!(
            "Uploading batch {}/{} ({} files)",
            index + 1,
            total,
            batch.len()
        );
        let batch_options = UploadOptions {
            metadatas_json,
            ..options.clone()
        };
        let envelope = retry
            .send(session, &upload(collection_id, batch, &batch_options), true)
            .await
            .inspect_err(|e| log::error!("Batch {}/{} failed: {}", index + 1, total, e))?;
        results.push(envelope.payload);
    }

    if results.len() == 1 {
        return Ok(results.remove(0));
    }

    let merged = results
        .into_iter()
        .map(|payload| match payload {
            Payload::Json(value) => value,
            Payload::Text(text) => Value::String(text),
            Payload::Empty => Value::Null,
        })
        .collect();
    Ok(Payload::Json(Value::Array(merged)))
}
