//! CodeChat - code and chat workspace in the terminal
//!
#![doc = "CodeChat - code and chat workspace in the terminal"]
#![doc = "Main entry point for the CodeChat application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use codechat::catalog::LanguageCatalog;
use codechat::cli::{Cli, Commands};
use codechat::commands;
use codechat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Start => {
            commands::shell::run_shell(config).await?;
            Ok(())
        }
        Commands::Languages { json } => {
            tracing::info!("Listing languages");
            commands::languages::list_languages(&LanguageCatalog::builtin(), json)?;
            Ok(())
        }
        Commands::Run {
            language,
            file,
            json,
        } => {
            tracing::info!("Starting one-shot run");
            if let Some(path) = &file {
                tracing::debug!("Loading source from: {}", path.display());
            }
            let result =
                commands::run::run_once(&config, &language, file.as_deref(), json).await?;
            if !result.status.is_success() {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so they do not interleave with workspace output.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "codechat=debug"
    } else {
        "codechat=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
