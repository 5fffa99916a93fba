//! Conversational backend abstraction
//!
//! The session controller only sees the [`Backend`] trait. [`HttpBackend`]
//! talks to a real server over HTTP; [`fake::FakeBackend`] is an in-process
//! double with scripted replies and latency for tests.

pub mod fake;
pub mod http;
pub mod types;

pub use http::HttpBackend;
pub use types::{ChatRequest, ChatResponse, HistoryEntry, SuggestedPromptsResponse, WireSender};

use async_trait::async_trait;

use crate::error::Result;

/// A service that produces assistant replies and suggested prompts
#[async_trait]
pub trait Backend: Send + Sync {
    /// Submit one turn (`POST /chat`)
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unreachable, answers with a failure
    /// status, or returns a body without reply text.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;

    /// Fetch the current suggested prompts (`GET /suggested_prompts`)
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unreachable or the body is malformed.
    async fn suggested_prompts(&self) -> Result<Vec<String>>;
}
