//! Chatline - terminal chat client
//!
//! Main entry point for the Chatline application.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chatline::cli::{Cli, Commands};
use chatline::commands;
use chatline::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load configuration; warnings wait until logging is set up
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let (config, warnings) = Config::load_with_warnings(config_path, &cli)?;

    init_tracing(cli.verbose, config.logging.json);
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    // Validate configuration
    config.validate()?;

    match cli.command {
        Commands::Chat { no_prompts } => {
            commands::chat::run_chat(config, !no_prompts).await?;
            Ok(())
        }
        Commands::Ask { message, json } => {
            tracing::info!("Sending one-shot message");
            commands::ask::run_ask(config, message, json).await?;
            Ok(())
        }
        Commands::Prompts { json } => {
            tracing::info!("Fetching suggested prompts");
            commands::prompts::list_prompts(&config, json).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose { "chatline=debug" } else { "chatline=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
