//! In-process fake backend for unit and integration tests
//!
//! [`FakeBackend`] answers chat turns from a script of queued replies and
//! falls back to echoing the message when the script is empty. Replies can
//! be delayed, held until released, or turned into failures, and prompt
//! fetches can be held too, which is what the ordering and cancellation
//! tests need.
//!
//! # Example
//!
//! ```
//! use chatline::backend::fake::FakeBackend;
//! use chatline::backend::{Backend, ChatRequest, ChatResponse};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let backend = FakeBackend::new();
//! backend.push_reply(ChatResponse::text("Hi there"));
//!
//! let reply = backend.chat(&ChatRequest::new("Hello", &[])).await.unwrap();
//! assert_eq!(reply.text, "Hi there");
//!
//! // Script exhausted: the fake echoes
//! let reply = backend.chat(&ChatRequest::new("Again", &[])).await.unwrap();
//! assert_eq!(reply.text, "echo: Again");
//! assert_eq!(backend.chat_calls(), 2);
//! # }
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::backend::{Backend, ChatRequest, ChatResponse};
use crate::error::{ChatlineError, Result};

/// Releases a reply queued with [`FakeBackend::push_held_reply`]
#[derive(Debug, Clone)]
pub struct ReplyGate {
    notify: Arc<Notify>,
}

impl ReplyGate {
    /// Let the held reply resolve
    pub fn release(&self) {
        self.notify.notify_one();
    }
}

#[derive(Debug)]
struct ScriptedReply {
    delay: Duration,
    gate: Option<Arc<Notify>>,
    result: std::result::Result<ChatResponse, String>,
}

#[derive(Debug, Default)]
struct FakeState {
    replies: VecDeque<ScriptedReply>,
    latency: HashMap<String, Duration>,
    prompts: Vec<String>,
    prompt_failures: usize,
    prompt_gate: Option<Arc<Notify>>,
    requests: Vec<ChatRequest>,
}

/// Scripted in-memory [`Backend`]
#[derive(Debug, Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
    chat_calls: AtomicUsize,
    prompt_calls: AtomicUsize,
    call_started: Notify,
    prompt_started: Notify,
}

impl FakeBackend {
    /// Creates a fake with an empty script and no prompts
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fake whose prompt endpoint returns `prompts`
    pub fn with_prompts(prompts: Vec<String>) -> Self {
        let backend = Self::new();
        backend.set_prompts(prompts);
        backend
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a reply for the next unscripted chat call
    pub fn push_reply(&self, response: ChatResponse) {
        self.push_delayed_reply(response, Duration::ZERO);
    }

    /// Queue a reply that resolves after `delay`
    pub fn push_delayed_reply(&self, response: ChatResponse, delay: Duration) {
        self.state().replies.push_back(ScriptedReply {
            delay,
            gate: None,
            result: Ok(response),
        });
    }

    /// Queue a reply that stays pending until the returned gate is released
    pub fn push_held_reply(&self, response: ChatResponse) -> ReplyGate {
        let notify = Arc::new(Notify::new());
        self.state().replies.push_back(ScriptedReply {
            delay: Duration::ZERO,
            gate: Some(Arc::clone(&notify)),
            result: Ok(response),
        });
        ReplyGate { notify }
    }

    /// Queue a failed chat call
    pub fn push_failure(&self, message: impl Into<String>) {
        self.state().replies.push_back(ScriptedReply {
            delay: Duration::ZERO,
            gate: None,
            result: Err(message.into()),
        });
    }

    /// Delay every echo reply for `message` by `delay`
    pub fn set_latency(&self, message: impl Into<String>, delay: Duration) {
        self.state().latency.insert(message.into(), delay);
    }

    /// Replace what the prompt endpoint returns
    pub fn set_prompts(&self, prompts: Vec<String>) {
        self.state().prompts = prompts;
    }

    /// Make the next `count` prompt fetches fail
    pub fn fail_prompt_fetches(&self, count: usize) {
        self.state().prompt_failures = count;
    }

    /// Keep the next prompt fetch pending until the returned gate is released
    pub fn hold_prompt_fetch(&self) -> ReplyGate {
        let notify = Arc::new(Notify::new());
        self.state().prompt_gate = Some(Arc::clone(&notify));
        ReplyGate { notify }
    }

    /// Number of chat calls received so far
    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    /// Number of prompt fetches received so far
    pub fn prompt_calls(&self) -> usize {
        self.prompt_calls.load(Ordering::SeqCst)
    }

    /// Every chat request received, in arrival order
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.state().requests.clone()
    }

    /// Wait until at least `count` chat calls have started
    pub async fn wait_for_chat_calls(&self, count: usize) {
        loop {
            let started = self.call_started.notified();
            if self.chat_calls() >= count {
                return;
            }
            started.await;
        }
    }

    /// Wait until at least `count` prompt fetches have started
    pub async fn wait_for_prompt_calls(&self, count: usize) {
        loop {
            let started = self.prompt_started.notified();
            if self.prompt_calls() >= count {
                return;
            }
            started.await;
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let scripted = {
            let mut state = self.state();
            state.requests.push(request.clone());
            match state.replies.pop_front() {
                Some(reply) => reply,
                None => ScriptedReply {
                    delay: state
                        .latency
                        .get(&request.message)
                        .copied()
                        .unwrap_or_default(),
                    gate: None,
                    result: Ok(ChatResponse::text(format!("echo: {}", request.message))),
                },
            }
        };
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        self.call_started.notify_waiters();

        if let Some(gate) = scripted.gate {
            gate.notified().await;
        }
        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }

        scripted
            .result
            .map_err(|message| ChatlineError::Backend(message).into())
    }

    async fn suggested_prompts(&self) -> Result<Vec<String>> {
        let gate = self.state().prompt_gate.take();
        self.prompt_calls.fetch_add(1, Ordering::SeqCst);
        self.prompt_started.notify_waiters();

        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut state = self.state();
        if state.prompt_failures > 0 {
            state.prompt_failures -= 1;
            return Err(ChatlineError::Backend("prompt fetch failed".to_string()).into());
        }
        Ok(state.prompts.clone())
    }
}
