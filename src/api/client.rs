use crate::api::request::{Body, FilePart, RequestSpec};
use crate::api::response::{Payload, ResponseEnvelope};
use crate::error::{StorageError, TransportError};
use crate::storage::credentials::Credential;
use crate::utils::error_helpers::*;
use crate::AppError;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 90;
const USER_AGENT: &str = concat!("langconnect-cli/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    pub base_url: String,
    pub api_key: Option<String>,
    timeout_secs: u64,
}

impl ApiClient {
    /// Client with the default request timeout
    pub fn new(base_url: String) -> Result<Self, TransportError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: String, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| convert_request_error(e, "client_init", timeout.as_secs()))?;

        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
            timeout_secs: timeout.as_secs(),
        })
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.is_empty());
        self
    }

    pub fn url_for(&self, path: &str) -> String {
        let endpoint = path.trim_start_matches('/');
        if endpoint.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    pub fn build_request(
        &self,
        method: Method,
        path: &str,
        credential: Option<&Credential>,
    ) -> RequestBuilder {
        let mut request = self.client.request(method, self.url_for(path));

        if let Some(api_key) = &self.api_key {
            request = request.header("x-api-key", api_key);
        }
        if let Some(credential) = credential {
            request = request.bearer_auth(&credential.access_token);
        }

        request
    }

    /// Perform one HTTP exchange and classify the outcome.
    ///
    /// The body is validated before anything touches the network, so a
    /// conflicting body never produces a request. This function does not
    /// retry; callers decide based on [`AppError::is_retryable`].
    pub async fn dispatch(
        &self,
        spec: &RequestSpec,
        credential: Option<&Credential>,
    ) -> Result<ResponseEnvelope, AppError> {
        let body = spec.body()?;
        let endpoint = spec.endpoint();

        let mut request = self.build_request(spec.method.as_reqwest(), endpoint, credential);
        if !spec.query.is_empty() {
            request = request.query(&spec.query);
        }

        request = match body {
            Body::Empty => request,
            Body::Json(value) => request.json(value),
            Body::Form(fields) => request.form(fields),
            Body::Multipart { fields, files } => {
                request.multipart(build_multipart(fields, files).await?)
            }
        };

        log::debug!(
            "{} {} (authenticated: {}, query pairs: {})",
            spec.method,
            self.url_for(endpoint),
            credential.is_some(),
            spec.query.len()
        );

        let response = request
            .send()
            .await
            .map_err(|e| convert_request_error(e, endpoint, self.timeout_secs))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| convert_request_error(e, endpoint, self.timeout_secs))?;

        log::debug!("{} {} -> {}", spec.method, endpoint, status);

        if (200..300).contains(&status) {
            Ok(ResponseEnvelope::new(status, Payload::decode(&text)))
        } else {
            log::info!("{} {} failed: {} - {}", spec.method, endpoint, status, text);
            Err(convert_status_error(status, endpoint, &text, self.timeout_secs))
        }
    }
}

async fn build_multipart(fields: &[(String, String)], files: &[FilePart]) -> Result<Form, AppError> {
    let mut form = Form::new();
    for (key, value) in fields {
        form = form.text(key.clone(), value.clone());
    }

    for file in files {
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|source| StorageError::FileIo {
                path: file.path.to_string_lossy().to_string(),
                source,
            })?;
        let file_name = file
            .path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| file.path.to_string_lossy().to_string());
        form = form.part(file.field.clone(), Part::bytes(bytes).file_name(file_name));
    }

    Ok(form)
}
