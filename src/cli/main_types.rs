use crate::core::services::document_service::{
    DEFAULT_BATCH_SIZE, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_LIST_LIMIT,
    DEFAULT_SEARCH_LIMIT, DeleteBy, SearchType,
};
use crate::utils::csv_split::{DEFAULT_OUTPUT_DIR, DEFAULT_PATTERN};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "langconnect-cli")]
#[command(about = "Interact with the LangConnect API from the command line")]
#[command(version)]
#[command(after_help = "Examples:
  langconnect-cli signin                                 # Sign in with the configured account
  langconnect-cli list-collections                       # List all collections
  langconnect-cli create-collection docs -m '{\"team\":\"search\"}'
  langconnect-cli upload-documents <collection> ./out/*.txt
  langconnect-cli search-documents <collection> \"cholera\" --type hybrid --limit 5
  langconnect-cli get collections -p limit=50            # Raw GET with query parameters
  langconnect-cli split data.csv --output ./out          # One document per CSV row

Environment Variables:
  LANGCONNECT_API_URL          LangConnect server URL (required)
  LANGCONNECT_API_KEY          Optional API key sent as x-api-key
  LANGCONNECT_ADMIN_EMAIL      Account used by signin and automatic sign in
  LANGCONNECT_ADMIN_PASSWORD   Password for that account")]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Custom configuration directory path
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// LangConnect server URL
    #[arg(long, global = true, env = "LANGCONNECT_API_URL")]
    pub api_url: Option<String>,

    /// API key sent as x-api-key
    #[arg(long, global = true, env = "LANGCONNECT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Keep the session in memory only for this invocation
    #[arg(long, global = true)]
    pub no_persist: bool,

    /// Retry transport failures on GET and DELETE this many times
    #[arg(long, global = true, default_value_t = 0)]
    pub retries: u32,

    /// Also retry POST and PATCH requests
    #[arg(long, global = true)]
    pub retry_unsafe: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the session
    Signin {
        /// Account email (defaults to LANGCONNECT_ADMIN_EMAIL)
        #[arg(short, long)]
        email: Option<String>,
        /// Account password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Sign up a new user
    Signup {
        /// Email address for signup
        #[arg(short, long)]
        email: String,
        /// Password for signup (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Sign out and clear the stored session
    Signout,
    /// Refresh the access token with the stored refresh token
    RefreshToken,
    /// Show the user bound to the current session
    Me,
    /// Check API health status
    Health,

    /// List all collections
    ListCollections,
    /// Create a new collection
    CreateCollection {
        /// Name of the collection to create
        name: String,
        /// JSON metadata for the collection
        #[arg(short, long)]
        metadata: Option<String>,
    },
    /// Get details of a collection, including document and chunk counts
    GetCollection {
        /// UUID of the collection
        collection_id: String,
    },
    /// Rename a collection or replace its metadata
    UpdateCollection {
        /// UUID of the collection
        collection_id: String,
        /// New collection name
        #[arg(short, long)]
        name: Option<String>,
        /// New JSON metadata
        #[arg(short, long)]
        metadata: Option<String>,
    },
    /// Delete a collection
    DeleteCollection {
        /// UUID of the collection to delete
        collection_id: String,
    },

    /// List documents in a collection
    ListDocuments {
        /// UUID of the collection
        collection_id: String,
        #[arg(short, long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: u32,
        #[arg(short, long, default_value_t = 0)]
        offset: u32,
    },
    /// Upload files to a collection
    #[command(after_help = "Examples:
  langconnect-cli upload-documents <collection> a.txt b.pdf
  langconnect-cli upload-documents <collection> split_documents/*.txt --batch-size 25")]
    UploadDocuments {
        /// UUID of the collection
        collection_id: String,
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Files per request
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: u32,
        #[arg(long, default_value_t = DEFAULT_CHUNK_OVERLAP)]
        chunk_overlap: u32,
        /// JSON array of per-file metadata, passed through as is
        #[arg(long)]
        metadatas_json: Option<String>,
    },
    /// Delete one document from a collection
    DeleteDocument {
        /// UUID of the collection
        collection_id: String,
        /// Document or file id
        document_id: String,
        #[arg(long, value_enum, default_value_t = DeleteBy::DocumentId)]
        delete_by: DeleteBy,
    },
    /// Delete several documents from a collection
    DeleteDocuments {
        /// UUID of the collection
        collection_id: String,
        #[arg(long = "document-id", action = ArgAction::Append)]
        document_ids: Vec<String>,
        #[arg(long = "file-id", action = ArgAction::Append)]
        file_ids: Vec<String>,
    },
    /// Search documents in a collection
    SearchDocuments {
        /// UUID of the collection to search in
        collection_id: String,
        /// Search query
        query: String,
        /// Maximum number of results
        #[arg(short, long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: u32,
        /// Search type
        #[arg(short = 't', long = "type", value_enum, default_value_t = SearchType::Semantic)]
        search_type: SearchType,
        /// JSON metadata filter
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Perform a GET request against any endpoint
    Get {
        /// API endpoint, e.g. 'collections' or 'auth/me'
        path: String,
        /// Query parameters as KEY=VALUE
        #[arg(short = 'p', long = "param", action = ArgAction::Append)]
        params: Vec<String>,
    },
    /// Perform a POST request against any endpoint
    Post {
        /// API endpoint, e.g. 'collections'
        path: String,
        /// Raw JSON payload
        #[arg(short, long)]
        json: Option<String>,
        /// Form data as KEY=VALUE
        #[arg(short, long, action = ArgAction::Append)]
        data: Vec<String>,
        /// Query parameters as KEY=VALUE
        #[arg(short = 'p', long = "param", action = ArgAction::Append)]
        params: Vec<String>,
    },
    /// Perform a DELETE request against any endpoint
    Delete {
        /// API endpoint, e.g. 'collections/<id>'
        path: String,
        /// Query parameters as KEY=VALUE
        #[arg(short = 'p', long = "param", action = ArgAction::Append)]
        params: Vec<String>,
    },

    /// Split CSV file(s) into one document per row
    Split {
        /// CSV file or folder containing CSV files
        input: PathBuf,
        /// Output directory for the documents
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,
        /// File pattern used when the input is a folder
        #[arg(short, long, default_value = DEFAULT_PATTERN)]
        pattern: String,
    },
}
