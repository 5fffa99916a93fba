//! Configuration management for Chatline
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{ChatlineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Chatline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Conversational backend connection
    #[serde(default)]
    pub backend: BackendConfig,
    /// Chat session behavior
    #[serde(default)]
    pub session: SessionConfig,
    /// Terminal presentation
    #[serde(default)]
    pub ui: UiConfig,
    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL; `/chat` and `/suggested_prompts` are resolved against it
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_user_agent() -> String {
    format!("chatline/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

/// Chat session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Fetch suggested prompts when a session starts
    #[serde(default = "default_fetch_prompts_on_start")]
    pub fetch_prompts_on_start: bool,

    /// Prompts shown until the first successful fetch
    #[serde(default)]
    pub initial_prompts: Vec<String>,
}

fn default_fetch_prompts_on_start() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fetch_prompts_on_start: default_fetch_prompts_on_start(),
            initial_prompts: Vec::new(),
        }
    }
}

/// Terminal presentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Static link opened by `/feedback`
    #[serde(default = "default_feedback_form_url")]
    pub feedback_form_url: String,

    /// Label printed above assistant turns
    #[serde(default = "default_assistant_label")]
    pub assistant_label: String,

    /// Label printed above user turns
    #[serde(default = "default_user_label")]
    pub user_label: String,
}

fn default_feedback_form_url() -> String {
    "https://your-feedback-form-link.com".to_string()
}

fn default_assistant_label() -> String {
    "Copilot".to_string()
}

fn default_user_label() -> String {
    "You".to_string()
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            feedback_form_url: default_feedback_form_url(),
            assistant_label: default_assistant_label(),
            user_label: default_user_label(),
        }
    }
}

/// Log output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human readable logs
    #[serde(default)]
    pub json: bool,
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let (config, warnings) = Self::load_with_warnings(path, cli)?;
        for warning in &warnings {
            tracing::warn!("{}", warning);
        }
        Ok(config)
    }

    /// Like [`Config::load`], but hands back the warnings instead of logging them
    ///
    /// Used at startup, before a tracing subscriber exists. Warnings cover a
    /// missing file and environment overrides that could not be parsed.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load_with_warnings(path: &str, cli: &crate::cli::Cli) -> Result<(Self, Vec<String>)> {
        let mut warnings = Vec::new();
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            warnings.push(format!("Config file not found at {}, using defaults", path));
            Self::default()
        };

        config.apply_env_vars(&mut warnings);
        config.apply_cli_overrides(cli);

        Ok((config, warnings))
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChatlineError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ChatlineError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self, warnings: &mut Vec<String>) {
        if let Ok(base_url) = std::env::var("CHATLINE_BACKEND_URL") {
            tracing::debug!(base_url = %base_url, "Env override: CHATLINE_BACKEND_URL");
            self.backend.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("CHATLINE_TIMEOUT_SECONDS") {
            match timeout.parse::<u64>() {
                Ok(v) => self.backend.timeout_seconds = v,
                Err(_) => warnings.push(format!("Invalid CHATLINE_TIMEOUT_SECONDS: {}", timeout)),
            }
        }

        if let Ok(url) = std::env::var("CHATLINE_FEEDBACK_FORM_URL") {
            self.ui.feedback_form_url = url;
        }

        if let Ok(json_logs) = std::env::var("CHATLINE_JSON_LOGS") {
            match json_logs.parse::<bool>() {
                Ok(v) => self.logging.json = v,
                Err(_) => {
                    warnings.push(format!("Invalid value for CHATLINE_JSON_LOGS: {}", json_logs))
                }
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(base_url) = &cli.backend_url {
            tracing::debug!(base_url = %base_url, "CLI override: --backend-url");
            self.backend.base_url = base_url.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if a URL is empty, unparseable or not http(s), or if
    /// the request timeout is zero
    pub fn validate(&self) -> Result<()> {
        validate_http_url("backend.base_url", &self.backend.base_url)?;
        validate_http_url("ui.feedback_form_url", &self.ui.feedback_form_url)?;

        if self.backend.timeout_seconds == 0 {
            return Err(ChatlineError::Config(
                "backend.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.session.initial_prompts.iter().any(|p| p.trim().is_empty()) {
            return Err(ChatlineError::Config(
                "session.initial_prompts must not contain blank entries".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ChatlineError::Config(format!("{} cannot be empty", field)).into());
    }
    let parsed = url::Url::parse(value)
        .map_err(|e| ChatlineError::Config(format!("{} is not a valid URL: {}", field, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ChatlineError::Config(format!(
            "{} must use http or https, got {}",
            field, other
        ))
        .into()),
    }
}
