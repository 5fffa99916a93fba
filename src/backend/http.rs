//! HTTP implementation of the conversational backend
//!
//! Talks JSON to a server exposing `POST /chat` and
//! `GET /suggested_prompts`. No authentication, paging or streaming.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::backend::{Backend, ChatRequest, ChatResponse, SuggestedPromptsResponse};
use crate::config::BackendConfig;
use crate::error::{ChatlineError, Result};

/// Backend reached over HTTP
///
/// # Examples
///
/// ```
/// use chatline::backend::HttpBackend;
/// use chatline::config::BackendConfig;
///
/// let backend = HttpBackend::new(&BackendConfig::default()).unwrap();
/// assert_eq!(backend.chat_url(), "http://localhost:8000/chat");
/// ```
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a new HTTP backend
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ChatlineError::Backend(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        tracing::info!("Initialized HTTP backend: base_url={}", base_url);

        Ok(Self { client, base_url })
    }

    /// Endpoint used for chat turns
    pub fn chat_url(&self) -> String {
        format!("{}/chat", self.base_url)
    }

    /// Endpoint used for suggested prompts
    pub fn prompts_url(&self) -> String {
        format!("{}/suggested_prompts", self.base_url)
    }

    /// Turn a non-success status into a typed error
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::error!("Backend returned error {}: {}", status, body);
        Err(ChatlineError::BackendStatus {
            status: status.as_u16(),
            body,
        }
        .into())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = self.chat_url();
        tracing::debug!(
            "Sending chat request: {} history entries, {} chars",
            request.history.len(),
            request.message.len()
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Failed to reach backend at {}: {}", url, e);
                ChatlineError::Backend(format!("Failed to reach {}: {}", url, e))
            })?;

        let response = Self::check_status(response).await?;

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse chat response: {}", e);
            ChatlineError::InvalidResponse(format!("Failed to parse chat response: {}", e))
        })?;

        tracing::debug!(
            images = chat_response.image_list.as_ref().map_or(0, Vec::len),
            references = chat_response.references.as_ref().map_or(0, Vec::len),
            prompts = chat_response.suggested_prompts.is_some(),
            "Received chat response"
        );

        Ok(chat_response)
    }

    async fn suggested_prompts(&self) -> Result<Vec<String>> {
        let url = self.prompts_url();
        tracing::debug!("Fetching suggested prompts from {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::warn!("Failed to fetch suggested prompts: {}", e);
            ChatlineError::Backend(format!("Failed to reach {}: {}", url, e))
        })?;

        let response = Self::check_status(response).await?;

        let body: SuggestedPromptsResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse suggested prompts response: {}", e);
            ChatlineError::InvalidResponse(format!("Failed to parse suggested prompts: {}", e))
        })?;

        tracing::debug!("Fetched {} suggested prompts", body.suggested_prompts.len());
        Ok(body.suggested_prompts)
    }
}
