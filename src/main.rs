use clap::Parser;
use langconnect_cli::cli::dispatcher::Dispatcher;
use langconnect_cli::cli::main_types::Cli;
use langconnect_cli::storage::config::{CONFIG_FILE_NAME, Config, Settings, default_config_dir};
use langconnect_cli::utils::logging;
use langconnect_cli::utils::retry::RetryConfig;
use langconnect_cli::AppError;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // A missing .env file is fine
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }
    if let Ok(path) = dotenv {
        log::debug!("Loaded environment from {}", path.display());
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let severity = e.severity();
            log::debug!("{} {:?} failure: {:?}", severity.emoji(), severity, e);
            eprintln!("Error: {}", e.display_friendly());
            if let Some(hint) = e.troubleshooting_hint() {
                eprintln!("Hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => default_config_dir()?,
    };
    log::debug!("Using config directory: {}", config_dir.display());

    let config = Config::load(Some(config_dir.join(CONFIG_FILE_NAME)))?;
    let settings = Settings::resolve(&config, cli.api_url, cli.api_key, |key| {
        std::env::var(key).ok()
    });

    let retry = RetryConfig::with_retries(cli.retries, cli.retry_unsafe);
    let dispatcher = Dispatcher::new(settings, config_dir, !cli.no_persist, retry);
    dispatcher.dispatch(cli.command).await
}
