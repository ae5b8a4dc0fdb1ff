use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("CliError: {0}")]
    Cli(#[from] CliError),
    #[error("AuthError: {0}")]
    Auth(#[from] AuthError),
    #[error("ValidationError: {0}")]
    Validation(#[from] ValidationError),
    #[error("NotFoundError: {0}")]
    NotFound(#[from] NotFoundError),
    #[error("TransportError: {0}")]
    Transport(#[from] TransportError),
    #[error("ConfigError: {0}")]
    Config(#[from] ConfigError),
    #[error("StorageError: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("Expected KEY=VALUE format, received '{0}'")]
    InvalidKeyValue(String),
    #[error("Input processing error: {0}")]
    Input(String),
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Sign in failed: invalid credentials")]
    InvalidCredentials,
    #[error("No refresh token available")]
    NoRefreshToken,
    #[error("Refresh token was rejected by the server")]
    RefreshRejected,
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("Request rejected with status {status}")]
    Rejected {
        status: u16,
        endpoint: String,
        server_message: String,
    },
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Use either a JSON body or form data, not both")]
    ConflictingBody,
    #[error("Invalid JSON payload: {0}")]
    MalformedJson(String),
    #[error("HTTP error: {status} {message}")]
    Server {
        status: u16,
        endpoint: String,
        message: String,
    },
    #[error("Unexpected response from {endpoint}: {message}")]
    UnexpectedResponse { endpoint: String, message: String },
}

#[derive(Error, Debug)]
#[error("Resource not found: {endpoint}")]
pub struct NotFoundError {
    pub endpoint: String,
    pub server_message: String,
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64, endpoint: String },
    #[error("Connection failed: {message}")]
    ConnectionFailed { endpoint: String, message: String },
    #[error("DNS lookup failed: {message}")]
    DnsFailure { endpoint: String, message: String },
    #[error("Server error: {status} {message}")]
    ServerError {
        status: u16,
        endpoint: String,
        message: String,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration field '{field}' is missing")]
    MissingField { field: String, hint: String },
    #[error("Invalid configuration value for '{field}': {value}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("File I/O error at {path}: {source}")]
    FileIo {
        path: String,
        source: std::io::Error,
    },
    #[error("Configuration parse error: {message}")]
    ConfigParseError { message: String },
    #[error("Credential cache is corrupt: {message}")]
    CredentialParseError { message: String },
    #[error("Configuration directory not found")]
    ConfigDirNotFound,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl ErrorSeverity {
    pub fn emoji(&self) -> &'static str {
        match self {
            ErrorSeverity::Critical => "🚨",
            ErrorSeverity::High => "❌",
            ErrorSeverity::Medium => "⚠️",
            ErrorSeverity::Low => "ℹ️",
        }
    }
}

impl AppError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::Cli(_) => ErrorSeverity::Medium,
            AppError::Auth(_) => ErrorSeverity::High,
            AppError::Validation(_) => ErrorSeverity::Medium,
            AppError::NotFound(_) => ErrorSeverity::Medium,
            AppError::Transport(transport_error) => match transport_error {
                TransportError::ServerError { .. } => ErrorSeverity::High,
                _ => ErrorSeverity::Medium,
            },
            AppError::Config(_) => ErrorSeverity::High,
            AppError::Storage(_) => ErrorSeverity::Critical,
        }
    }

    /// Only transport failures may be retried by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Transport(_))
    }

    pub fn display_friendly(&self) -> String {
        match self {
            AppError::Auth(AuthError::InvalidCredentials) => "Invalid credentials".to_string(),
            AppError::Auth(AuthError::Unauthenticated) => "Not authenticated".to_string(),
            AppError::Auth(AuthError::Rejected {
                status,
                endpoint,
                server_message,
            }) => format!(
                "Request to '{}' was rejected ({}): {}",
                endpoint, status, server_message
            ),
            AppError::NotFound(NotFoundError { endpoint, .. }) => {
                format!("'{}' not found", endpoint)
            }
            AppError::Validation(ValidationError::Server {
                status, message, ..
            }) => format!("Request failed ({}): {}", status, message),
            _ => format!("{}", self),
        }
    }

    pub fn troubleshooting_hint(&self) -> Option<String> {
        match self {
            AppError::Auth(
                AuthError::InvalidCredentials
                | AuthError::NoRefreshToken
                | AuthError::RefreshRejected
                | AuthError::Unauthenticated
                | AuthError::Rejected { .. },
            ) => Some("Run 'langconnect-cli signin' and try again".to_string()),
            AppError::Config(ConfigError::MissingField { hint, .. }) => Some(hint.clone()),
            AppError::Transport(TransportError::Timeout { .. }) => {
                Some("Check your network or LangConnect server and try again".to_string())
            }
            AppError::Transport(
                TransportError::ConnectionFailed { .. } | TransportError::DnsFailure { .. },
            ) => Some("Check LANGCONNECT_API_URL and that the server is reachable".to_string()),
            AppError::Validation(ValidationError::ConflictingBody) => {
                Some("Pass either --json or --data".to_string())
            }
            _ => None,
        }
    }
}
