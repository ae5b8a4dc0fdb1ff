use crate::api::request::RequestSpec;
use crate::api::response::Payload;
use crate::cli::output::print_payload;
use crate::core::auth::LoginInput;
use crate::core::clock::Clock;
use crate::core::services::document_service::{self, BATCH_DELAY, DeleteBy, SearchType, UploadOptions};
use crate::core::services::{HEALTH_PATH, collection_service, requires_auth};
use crate::core::session::{SessionManager, SignUpOutcome};
use crate::error::{AppError, CliError, ValidationError};
use crate::storage::config::Settings;
use crate::storage::credentials::CredentialStore;
use crate::utils::csv_split;
use crate::utils::retry::RetryExecutor;
use crate::utils::validation::{parse_json, parse_json_object, parse_key_value_pairs};
use std::path::{Path, PathBuf};

#[derive(Default)]
pub struct AuthHandler;

impl AuthHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn signin<S: CredentialStore, C: Clock>(
        &self,
        session: &mut SessionManager<S, C>,
        settings: &Settings,
        email: Option<String>,
        password: Option<String>,
    ) -> Result<(), AppError> {
        let configured = settings.admin_credentials();
        let input = LoginInput::collect(
            email,
            password,
            configured.as_ref(),
            settings.admin_email.as_deref(),
        )?;
        input.validate()?;

        session.sign_in(&input.email, input.password.expose()).await?;
        println!("Successfully authenticated with LangConnect as {}", input.email);
        Ok(())
    }

    pub async fn signup<S: CredentialStore, C: Clock>(
        &self,
        session: &mut SessionManager<S, C>,
        email: String,
        password: Option<String>,
    ) -> Result<(), AppError> {
        let input = LoginInput::collect(Some(email), password, None, None)?;
        input.validate()?;

        match session.sign_up(&input.email, input.password.expose()).await? {
            SignUpOutcome::Authenticated { payload, .. } => {
                println!("Successfully signed up and authenticated.");
                print_payload(&Payload::Json(payload));
            }
            SignUpOutcome::PendingVerification { payload } => {
                println!("Signed up. Confirm your email address, then run 'langconnect-cli signin'.");
                print_payload(&Payload::Json(payload));
            }
        }
        Ok(())
    }

    pub async fn signout<S: CredentialStore, C: Clock>(
        &self,
        session: &mut SessionManager<S, C>,
    ) -> Result<(), AppError> {
        match session.sign_out().await {
            Ok(()) => {
                println!("Successfully signed out.");
                Ok(())
            }
            Err(e) => {
                println!("Local session cleared, but the server did not confirm sign out.");
                Err(e)
            }
        }
    }

    pub async fn refresh_token<S: CredentialStore, C: Clock>(
        &self,
        session: &mut SessionManager<S, C>,
        settings: &Settings,
    ) -> Result<(), AppError> {
        if !session.has_credential() {
            if let Some(admin) = settings.admin_credentials() {
                log::info!("No stored session; signing in before refresh");
                session.sign_in(&admin.email, admin.password.expose()).await?;
            }
        }

        session.refresh().await?;
        println!("Access token refreshed successfully.");
        Ok(())
    }

    pub async fn me<S: CredentialStore, C: Clock>(
        &self,
        session: &mut SessionManager<S, C>,
    ) -> Result<(), AppError> {
        let user = session.whoami().await?;
        let value = serde_json::to_value(user)
            .map_err(|e| ValidationError::MalformedJson(e.to_string()))?;
        print_payload(&Payload::Json(value));
        Ok(())
    }
}

pub struct CollectionHandler<'a> {
    retry: &'a RetryExecutor,
}

impl<'a> CollectionHandler<'a> {
    pub fn new(retry: &'a RetryExecutor) -> Self {
        Self { retry }
    }

    pub async fn list<S: CredentialStore, C: Clock>(
        &self,
        session: &mut SessionManager<S, C>,
    ) -> Result<(), AppError> {
        let envelope = self
            .retry
            .send(session, &collection_service::list(), true)
            .await?;
        print_payload(&envelope.payload);
        Ok(())
    }

    pub async fn create<S: CredentialStore, C: Clock>(
        &self,
        session: &mut SessionManager<S, C>,
        name: &str,
        metadata: Option<&str>,
    ) -> Result<(), AppError> {
        let metadata = parse_json_object(metadata, "metadata")?;
        let envelope = self
            .retry
            .send(session, &collection_service::create(name, metadata), true)
            .await?;
        print_payload(&envelope.payload);
        Ok(())
    }

    pub async fn get<S: CredentialStore, C: Clock>(
        &self,
        session: &mut SessionManager<S, C>,
        collection_id: &str,
    ) -> Result<(), AppError> {
        let payload = collection_service::get_with_counts(session, collection_id).await?;
        print_payload(&payload);
        Ok(())
    }

    pub async fn update<S: CredentialStore, C: Clock>(
        &self,
        session: &mut SessionManager<S, C>,
        collection_id: &str,
        name: Option<&str>,
        metadata: Option<&str>,
    ) -> Result<(), AppError> {
        let metadata = parse_json_object(metadata, "metadata")?;
        let spec = collection_service::update(collection_id, name, metadata)?;
        let envelope = self.retry.send(session, &spec, true).await?;
        print_payload(&envelope.payload);
        Ok(())
    }

    pub async fn delete<S: CredentialStore, C: Clock>(
        &self,
        session: &mut SessionManager<S, C>,
        collection_id: &str,
    ) -> Result<(), AppError> {
        let envelope = self
            .retry
            .send(session, &collection_service::delete(collection_id), true)
            .await?;
        match envelope.payload {
            Payload::Empty => println!("Collection deleted successfully."),
            payload => print_payload(&payload),
        }
        Ok(())
    }
}

pub struct DocumentHandler<'a> {
    retry: &'a RetryExecutor,
}

impl<'a> DocumentHandler<'a> {
    pub fn new(retry: &'a RetryExecutor) -> Self {
        Self { retry }
    }

    pub async fn list<S: CredentialStore, C: Clock>(
        &self,
        session: &mut SessionManager<S, C>,
        collection_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<(), AppError> {
        let spec = document_service::list(collection_id, limit, offset);
        let envelope = self.retry.send(session, &spec, true).await?;
        print_payload(&envelope.payload);
        Ok(())
    }

    pub async fn upload<S: CredentialStore, C: Clock>(
        &self,
        session: &mut SessionManager<S, C>,
        collection_id: &str,
        files: &[PathBuf],
        options: &UploadOptions,
    ) -> Result<(), AppError> {
        let payload = document_service::upload_in_batches(
            session,
            self.retry,
            collection_id,
            files,
            options,
            BATCH_DELAY,
        )
        .await?;
        print_payload(&payload);
        Ok(())
    }

    pub async fn delete<S: CredentialStore, C: Clock>(
        &self,
        session: &mut SessionManager<S, C>,
        collection_id: &str,
        document_id: &str,
        delete_by: DeleteBy,
    ) -> Result<(), AppError> {
        let spec = document_service::delete(collection_id, document_id, delete_by);
        let envelope = self.retry.send(session, &spec, true).await?;
        print_payload(&envelope.payload);
        Ok(())
    }

    pub async fn bulk_delete<S: CredentialStore, C: Clock>(
        &self,
        session: &mut SessionManager<S, C>,
        collection_id: &str,
        document_ids: &[String],
        file_ids: &[String],
    ) -> Result<(), AppError> {
        let spec = document_service::bulk_delete(collection_id, document_ids, file_ids)?;
        let envelope = self.retry.send(session, &spec, true).await?;
        print_payload(&envelope.payload);
        Ok(())
    }

    pub async fn search<S: CredentialStore, C: Clock>(
        &self,
        session: &mut SessionManager<S, C>,
        collection_id: &str,
        query: &str,
        limit: u32,
        search_type: SearchType,
        filter: Option<&str>,
    ) -> Result<(), AppError> {
        let filter = parse_json_object(filter, "filter")?;
        let spec = document_service::search(collection_id, query, limit, search_type, filter);
        let envelope = self.retry.send(session, &spec, true).await?;
        print_payload(&envelope.payload);
        Ok(())
    }
}

/// Raw `get`, `post` and `delete` against any path
pub struct RequestHandler<'a> {
    retry: &'a RetryExecutor,
}

impl<'a> RequestHandler<'a> {
    pub fn new(retry: &'a RetryExecutor) -> Self {
        Self { retry }
    }

    /// Build the request from CLI values. JSON and form data are both staged
    /// so the request layer can reject the combination.
    pub fn build(
        spec: RequestSpec,
        params: &[String],
        json: Option<&str>,
        data: &[String],
    ) -> Result<RequestSpec, AppError> {
        let mut spec = spec.query_pairs(parse_key_value_pairs(params)?);
        if let Some(raw) = json {
            spec = spec.json(parse_json(raw)?);
        }
        if !data.is_empty() {
            spec = spec.form(parse_key_value_pairs(data)?);
        }
        Ok(spec)
    }

    pub async fn handle<S: CredentialStore, C: Clock>(
        &self,
        session: &mut SessionManager<S, C>,
        spec: RequestSpec,
    ) -> Result<(), AppError> {
        let require_auth = requires_auth(&spec.path);
        let envelope = self.retry.send(session, &spec, require_auth).await?;
        print_payload(&envelope.payload);
        Ok(())
    }
}

#[derive(Default)]
pub struct HealthHandler;

impl HealthHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle<S: CredentialStore, C: Clock>(
        &self,
        session: &mut SessionManager<S, C>,
        retry: &RetryExecutor,
    ) -> Result<(), AppError> {
        let envelope = retry
            .send(session, &RequestSpec::get(HEALTH_PATH), false)
            .await?;
        print_payload(&envelope.payload);
        Ok(())
    }
}

#[derive(Default)]
pub struct SplitHandler;

impl SplitHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, input: &Path, output: &Path, pattern: &str) -> Result<(), AppError> {
        let report = csv_split::split_path(input, output, pattern)?;

        for (file, count) in &report.files {
            println!("Created {} documents from '{}'", count, file.display());
        }
        for (file, reason) in &report.failed {
            eprintln!("Error processing '{}': {}", file.display(), reason);
        }

        if report.files.is_empty() {
            return Err(CliError::InvalidArguments(format!(
                "No documents created; {} file(s) failed",
                report.failed.len()
            ))
            .into());
        }

        println!(
            "Successfully created {} documents in '{}'",
            report.total_documents(),
            report.output_dir.display()
        );
        Ok(())
    }
}
