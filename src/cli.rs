//! Command-line interface definition for Chatline
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, one-shot questions and
//! suggested-prompt listing.

use clap::{Parser, Subcommand};

/// Chatline - terminal chat client for assistant backends
///
/// Exchange turns with a conversational backend, rate replies and pick
/// from suggested follow-up prompts.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatline")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the backend base URL from config
    #[arg(long, env = "CHATLINE_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Chatline
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Skip the suggested-prompt fetch at startup
        #[arg(long)]
        no_prompts: bool,
    },

    /// Send a single message and print the reply
    Ask {
        /// Message to send
        message: String,

        /// Print the resulting session snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch and print the current suggested prompts
    Prompts {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            backend_url: None,
            command: Commands::Chat { no_prompts: false },
        }
    }
}
