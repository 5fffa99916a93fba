//! Chatline - terminal chat-session client library
//!
//! This library provides the conversation session controller for a chat
//! client talking to an assistant backend, plus the backend client,
//! configuration and terminal front end built around it.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: Message model, message store, feedback, suggested prompts and
//!   the `ChatSession` controller
//! - `backend`: Backend trait, HTTP implementation and an in-process fake
//! - `diagnostics`: Failure reporting (logs and metrics)
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`, `commands`, `render`: Command-line front end
//!
//! # Example
//!
//! ```no_run
//! use chatline::{ChatSession, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let session = ChatSession::from_config(&config)?;
//!     session.initialize().await;
//!     if let Some(ticket) = session.send("Hello") {
//!         ticket.outcome().await;
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod render;
pub mod session;

// Re-export commonly used types
pub use backend::{Backend, HttpBackend};
pub use config::Config;
pub use diagnostics::{DiagnosticEvent, Diagnostics, TracingDiagnostics};
pub use error::{ChatlineError, Result};
pub use session::{ChatSession, Feedback, Message, Rating, SessionSnapshot, TurnOutcome};
