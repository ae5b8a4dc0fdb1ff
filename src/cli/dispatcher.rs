use crate::api::client::ApiClient;
use crate::api::request::RequestSpec;
use crate::cli::command_handlers::{
    AuthHandler, CollectionHandler, DocumentHandler, HealthHandler, RequestHandler, SplitHandler,
};
use crate::cli::main_types::Commands;
use crate::core::clock::SystemClock;
use crate::core::services::document_service::UploadOptions;
use crate::core::session::SessionManager;
use crate::error::AppError;
use crate::storage::config::Settings;
use crate::storage::credentials::{
    CREDENTIALS_FILE_NAME, CredentialStore, FileCredentialStore, MemoryCredentialStore,
};
use crate::utils::retry::{RetryConfig, RetryExecutor};
use std::path::PathBuf;

pub struct Dispatcher {
    settings: Settings,
    config_dir: PathBuf,
    persist: bool,
    retry: RetryConfig,
}

impl Dispatcher {
    pub fn new(settings: Settings, config_dir: PathBuf, persist: bool, retry: RetryConfig) -> Self {
        Self {
            settings,
            config_dir,
            persist,
            retry,
        }
    }

    pub async fn dispatch(&self, command: Commands) -> Result<(), AppError> {
        if let Commands::Split {
            input,
            output,
            pattern,
        } = &command
        {
            return SplitHandler::new().handle(input, output, pattern);
        }

        let base_url = self.settings.require_base_url()?;
        let client = ApiClient::with_timeout(base_url.to_string(), self.settings.timeout)?
            .with_api_key(self.settings.api_key.clone());

        if self.persist {
            let path = self.config_dir.join(CREDENTIALS_FILE_NAME);
            log::debug!("Using credential file {}", path.display());
            let store = FileCredentialStore::open(path)?;
            self.run(command, SessionManager::new(client, store)).await
        } else {
            log::debug!("Session will not be persisted");
            self.run(command, SessionManager::new(client, MemoryCredentialStore::new()))
                .await
        }
    }

    async fn run<S: CredentialStore>(
        &self,
        command: Commands,
        session: SessionManager<S, SystemClock>,
    ) -> Result<(), AppError> {
        let mut session = session.with_auto_sign_in(self.settings.admin_credentials());
        let retry = RetryExecutor::new(self.retry.clone());
        let auth = AuthHandler::new();
        let collections = CollectionHandler::new(&retry);
        let documents = DocumentHandler::new(&retry);
        let requests = RequestHandler::new(&retry);

        match command {
            Commands::Signin { email, password } => {
                log::info!("Attempting signin command");
                auth.signin(&mut session, &self.settings, email, password)
                    .await
            }
            Commands::Signup { email, password } => {
                auth.signup(&mut session, email, password).await
            }
            Commands::Signout => auth.signout(&mut session).await,
            Commands::RefreshToken => auth.refresh_token(&mut session, &self.settings).await,
            Commands::Me => auth.me(&mut session).await,
            Commands::Health => HealthHandler::new().handle(&mut session, &retry).await,

            Commands::ListCollections => collections.list(&mut session).await,
            Commands::CreateCollection { name, metadata } => {
                collections
                    .create(&mut session, &name, metadata.as_deref())
                    .await
            }
            Commands::GetCollection { collection_id } => {
                collections.get(&mut session, &collection_id).await
            }
            Commands::UpdateCollection {
                collection_id,
                name,
                metadata,
            } => {
                collections
                    .update(
                        &mut session,
                        &collection_id,
                        name.as_deref(),
                        metadata.as_deref(),
                    )
                    .await
            }
            Commands::DeleteCollection { collection_id } => {
                collections.delete(&mut session, &collection_id).await
            }

            Commands::ListDocuments {
                collection_id,
                limit,
                offset,
            } => {
                documents
                    .list(&mut session, &collection_id, limit, offset)
                    .await
            }
            Commands::UploadDocuments {
                collection_id,
                files,
                batch_size,
                chunk_size,
                chunk_overlap,
                metadatas_json,
            } => {
                let options = UploadOptions {
                    chunk_size,
                    chunk_overlap,
                    metadatas_json,
                    batch_size,
                };
                documents
                    .upload(&mut session, &collection_id, &files, &options)
                    .await
            }
            Commands::DeleteDocument {
                collection_id,
                document_id,
                delete_by,
            } => {
                documents
                    .delete(&mut session, &collection_id, &document_id, delete_by)
                    .await
            }
            Commands::DeleteDocuments {
                collection_id,
                document_ids,
                file_ids,
            } => {
                documents
                    .bulk_delete(&mut session, &collection_id, &document_ids, &file_ids)
                    .await
            }
            Commands::SearchDocuments {
                collection_id,
                query,
                limit,
                search_type,
                filter,
            } => {
                documents
                    .search(
                        &mut session,
                        &collection_id,
                        &query,
                        limit,
                        search_type,
                        filter.as_deref(),
                    )
                    .await
            }

            Commands::Get { path, params } => {
                let spec = RequestHandler::build(RequestSpec::get(path), &params, None, &[])?;
                requests.handle(&mut session, spec).await
            }
            Commands::Post {
                path,
                json,
                data,
                params,
            } => {
                let spec =
                    RequestHandler::build(RequestSpec::post(path), &params, json.as_deref(), &data)?;
                requests.handle(&mut session, spec).await
            }
            Commands::Delete { path, params } => {
                let spec = RequestHandler::build(RequestSpec::delete(path), &params, None, &[])?;
                requests.handle(&mut session, spec).await
            }

            Commands::Split {
                input,
                output,
                pattern,
            } => SplitHandler::new().handle(&input, &output, &pattern),
        }
    }
}
