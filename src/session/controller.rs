//! Conversation session controller
//!
//! [`ChatSession`] owns the message store and the suggested prompts for one
//! chat session and orchestrates turns with the backend.
//!
//! # Ordering
//!
//! Turns run through a FIFO queue drained by a single worker task. A turn's
//! backend call does not start until the previous turn's result (reply or
//! failure) has been applied, so replies are appended in the same order the
//! user messages were sent, whatever the backend latency.
//!
//! # Generations
//!
//! Every turn is stamped with the conversation generation it was sent in.
//! Starting a new topic (or clearing the chat) bumps the generation and
//! cancels the in-flight call. Queued turns from an older generation are
//! skipped and any late result is dropped, so a stale reply never shows up
//! in a fresh conversation. The generation check and the append happen under
//! the same lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::backend::{Backend, ChatRequest, ChatResponse, HttpBackend};
use crate::config::Config;
use crate::diagnostics::{DiagnosticEvent, Diagnostics, TracingDiagnostics};
use crate::error::{ChatlineError, Result};
use crate::session::feedback;
use crate::session::message::{Attachments, Feedback, Message, Rating};
use crate::session::prompts::SuggestedPrompts;
use crate::session::store::MessageStore;

/// Whether the session is waiting on the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No turn of the current topic is pending
    Idle,
    /// At least one turn of the current topic is queued or in flight
    AwaitingResponse,
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The reply was appended at `index`
    Replied {
        /// Position of the assistant message
        index: usize,
    },
    /// The backend call failed; no reply was appended
    Failed {
        /// Rendered error chain
        error: String,
    },
    /// The conversation was reset before the reply could be applied
    Discarded,
}

/// Result of a suggested-prompt fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptRefresh {
    /// The fetched list replaced the current prompts
    Updated,
    /// The fetch failed; the previous prompts are kept
    Failed,
    /// A reset happened while fetching; the result was dropped
    Superseded,
}

/// Handle to one submitted turn
///
/// Dropping the ticket does not cancel the turn.
#[derive(Debug)]
pub struct TurnTicket {
    turn: u64,
    user_index: usize,
    outcome: oneshot::Receiver<TurnOutcome>,
}

impl TurnTicket {
    /// Monotonic turn identifier
    pub fn turn(&self) -> u64 {
        self.turn
    }

    /// Position of the user message appended for this turn
    pub fn user_index(&self) -> usize {
        self.user_index
    }

    /// Wait for the turn to be applied, failed or discarded
    pub async fn outcome(self) -> TurnOutcome {
        self.outcome.await.unwrap_or(TurnOutcome::Discarded)
    }
}

/// Read-only view handed to renderers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Conversation in append order
    pub messages: Vec<Message>,
    /// Current suggested prompts
    pub prompts: Vec<String>,
    /// Idle or awaiting a reply
    pub status: SessionStatus,
    /// Current conversation generation
    pub generation: u64,
}

struct SessionState {
    store: MessageStore,
    prompts: SuggestedPrompts,
    generation: u64,
    cancel: CancellationToken,
    pending: usize,
}

impl SessionState {
    fn status(&self) -> SessionStatus {
        if self.pending == 0 {
            SessionStatus::Idle
        } else {
            SessionStatus::AwaitingResponse
        }
    }
}

struct Turn {
    id: u64,
    generation: u64,
    cancel: CancellationToken,
    request: ChatRequest,
    done: oneshot::Sender<TurnOutcome>,
}

struct Shared {
    state: RwLock<SessionState>,
    backend: Arc<dyn Backend>,
    diagnostics: Arc<dyn Diagnostics>,
    revision: watch::Sender<u64>,
    next_turn: AtomicU64,
}

impl Shared {
    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    fn is_current(&self, generation: u64) -> bool {
        self.read().generation == generation
    }

    async fn process(&self, turn: Turn) {
        let Turn {
            id,
            generation,
            cancel,
            request,
            done,
        } = turn;

        if cancel.is_cancelled() || !self.is_current(generation) {
            self.report_discard(id, generation);
            let _ = done.send(TurnOutcome::Discarded);
            return;
        }

        tracing::debug!(turn = id, generation, "Submitting turn");
        let started = Instant::now();
        let result = tokio::select! {
            _ = cancel.cancelled() => None,
            result = self.backend.chat(&request) => Some(result),
        };

        let outcome = match result {
            None => {
                self.report_discard(id, generation);
                TurnOutcome::Discarded
            }
            Some(Ok(response)) => self.apply_reply(id, generation, response, started.elapsed()),
            Some(Err(err)) => self.apply_failure(id, generation, err),
        };
        let _ = done.send(outcome);
    }

    fn apply_reply(
        &self,
        id: u64,
        generation: u64,
        response: ChatResponse,
        elapsed: Duration,
    ) -> TurnOutcome {
        let ChatResponse {
            text,
            image_list,
            references,
            suggested_prompts,
        } = response;

        let appended = {
            let mut state = self.write();
            if state.generation == generation {
                let attachments = Attachments::from_parts(
                    image_list.unwrap_or_default(),
                    references.unwrap_or_default(),
                );
                let index = state.store.append(Message::assistant(text, attachments));
                state.prompts.update(suggested_prompts);
                state.pending = state.pending.saturating_sub(1);
                Some(index)
            } else {
                None
            }
        };

        match appended {
            Some(index) => {
                self.notify();
                self.diagnostics
                    .report(DiagnosticEvent::TurnCompleted { turn: id, elapsed });
                TurnOutcome::Replied { index }
            }
            None => {
                self.report_discard(id, generation);
                TurnOutcome::Discarded
            }
        }
    }

    fn apply_failure(&self, id: u64, generation: u64, err: anyhow::Error) -> TurnOutcome {
        let error = format!("{:#}", err);
        self.diagnostics.report(DiagnosticEvent::TurnFailed {
            turn: id,
            error: error.clone(),
        });

        let current = {
            let mut state = self.write();
            let current = state.generation == generation;
            if current {
                state.pending = state.pending.saturating_sub(1);
            }
            current
        };

        if current {
            self.notify();
            TurnOutcome::Failed { error }
        } else {
            TurnOutcome::Discarded
        }
    }

    fn report_discard(&self, turn: u64, generation: u64) {
        self.diagnostics
            .report(DiagnosticEvent::TurnDiscarded { turn, generation });
    }
}

async fn run_worker(shared: Arc<Shared>, mut queue: mpsc::UnboundedReceiver<Turn>) {
    while let Some(turn) = queue.recv().await {
        shared.process(turn).await;
    }
    tracing::debug!("Turn queue closed");
}

/// Controller for one chat session
///
/// All mutations of the conversation and the suggested prompts go through
/// this type. Readers take snapshots; each mutation is applied under a
/// single write lock and is never observed half done.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use chatline::backend::fake::FakeBackend;
/// use chatline::backend::ChatResponse;
/// use chatline::diagnostics::TracingDiagnostics;
/// use chatline::session::{ChatSession, TurnOutcome};
///
/// # #[tokio::main]
/// # async fn main() {
/// let backend = Arc::new(FakeBackend::new());
/// backend.push_reply(ChatResponse::text("Hi there"));
///
/// let session = ChatSession::new(backend, Arc::new(TracingDiagnostics));
/// let ticket = session.send("  Hello ").unwrap();
/// assert_eq!(session.messages()[0].text(), "Hello");
///
/// assert_eq!(ticket.outcome().await, TurnOutcome::Replied { index: 1 });
/// assert_eq!(session.messages()[1].text(), "Hi there");
/// # }
/// ```
pub struct ChatSession {
    id: Uuid,
    shared: Arc<Shared>,
    queue: mpsc::UnboundedSender<Turn>,
    worker: JoinHandle<()>,
}

impl ChatSession {
    /// Start a session and its turn worker
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime
    pub fn new(backend: Arc<dyn Backend>, diagnostics: Arc<dyn Diagnostics>) -> Self {
        let id = Uuid::new_v4();
        let (revision, _) = watch::channel(0);
        let shared = Arc::new(Shared {
            state: RwLock::new(SessionState {
                store: MessageStore::new(),
                prompts: SuggestedPrompts::default(),
                generation: 0,
                cancel: CancellationToken::new(),
                pending: 0,
            }),
            backend,
            diagnostics,
            revision,
            next_turn: AtomicU64::new(1),
        });

        let (queue, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(
            run_worker(Arc::clone(&shared), rx)
                .instrument(tracing::info_span!("chat_session", session = %id)),
        );

        tracing::info!(session = %id, "Started chat session");
        Self {
            id,
            shared,
            queue,
            worker,
        }
    }

    /// Seed the suggested prompts shown before the first fetch
    pub fn with_initial_prompts(self, prompts: Vec<String>) -> Self {
        self.shared.write().prompts.replace(prompts);
        self
    }

    /// Build a session talking HTTP to the configured backend
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = HttpBackend::new(&config.backend)?;
        Ok(Self::new(Arc::new(backend), Arc::new(TracingDiagnostics))
            .with_initial_prompts(config.session.initial_prompts.clone()))
    }

    /// Session identifier used in logs
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Send a user turn
    ///
    /// Blank input is ignored and returns `None`. Otherwise the trimmed text
    /// is appended as a user message before this call returns, and the turn
    /// is queued behind any earlier turns. The request carries the history as
    /// it stood before the user message was appended.
    pub fn send(&self, raw_text: &str) -> Option<TurnTicket> {
        let text = raw_text.trim();
        if text.is_empty() {
            tracing::debug!(session = %self.id, "Ignoring blank input");
            return None;
        }

        let id = self.shared.next_turn.fetch_add(1, Ordering::SeqCst);
        let (done, outcome) = oneshot::channel();

        let (user_index, rejected) = {
            let mut state = self.shared.write();
            let request = ChatRequest::new(text, state.store.messages());
            let user_index = state.store.append(Message::user(text));
            state.pending += 1;
            let turn = Turn {
                id,
                generation: state.generation,
                cancel: state.cancel.clone(),
                request,
                done,
            };
            // enqueued under the lock so queue order equals append order
            let rejected = self.queue.send(turn).err().map(|err| err.0);
            if rejected.is_some() {
                state.pending = state.pending.saturating_sub(1);
            }
            (user_index, rejected)
        };
        self.shared.notify();

        if let Some(turn) = rejected {
            let error = ChatlineError::SessionClosed.to_string();
            self.shared.diagnostics.report(DiagnosticEvent::TurnFailed {
                turn: id,
                error: error.clone(),
            });
            let _ = turn.done.send(TurnOutcome::Failed { error });
        } else {
            tracing::debug!(session = %self.id, turn = id, user_index, "Queued turn");
        }

        Some(TurnTicket {
            turn: id,
            user_index,
            outcome,
        })
    }

    /// Send a suggested prompt exactly as if the user had typed it
    pub fn select_prompt(&self, prompt: &str) -> Option<TurnTicket> {
        self.send(prompt)
    }

    /// Toggle the rating of the assistant message at `index`
    ///
    /// Returns the new rating, or `None` when nothing changed because the
    /// position is unknown or holds a user message.
    pub fn toggle_feedback(&self, index: usize, requested: Rating) -> Option<Feedback> {
        let next = {
            let mut state = self.shared.write();
            feedback::toggle_feedback(&mut state.store, index, requested)
        };
        if next.is_some() {
            self.shared.notify();
        }
        next
    }

    /// Fetch suggested prompts from the backend
    ///
    /// Failures are reported to diagnostics and leave the current prompts in
    /// place. A result that arrives after a reset is dropped.
    pub async fn initialize(&self) -> PromptRefresh {
        let generation = self.shared.read().generation;

        match self.shared.backend.suggested_prompts().await {
            Ok(prompts) => {
                let applied = {
                    let mut state = self.shared.write();
                    let current = state.generation == generation;
                    if current {
                        state.prompts.replace(prompts);
                    }
                    current
                };
                if applied {
                    self.shared.notify();
                    PromptRefresh::Updated
                } else {
                    tracing::debug!(session = %self.id, "Dropped prompts fetched for a previous topic");
                    PromptRefresh::Superseded
                }
            }
            Err(err) => {
                self.shared
                    .diagnostics
                    .report(DiagnosticEvent::PromptRefreshFailed {
                        error: format!("{:#}", err),
                    });
                PromptRefresh::Failed
            }
        }
    }

    /// Start a new topic
    ///
    /// Empties the conversation, invalidates every pending turn, then fetches
    /// fresh suggested prompts.
    pub async fn reset_topic(&self) -> PromptRefresh {
        let generation = self.invalidate();
        tracing::info!(session = %self.id, generation, "Started new topic");
        self.initialize().await
    }

    /// Empty the conversation without refreshing prompts
    ///
    /// Pending turns are invalidated just like on a topic reset.
    pub fn clear_conversation(&self) {
        let generation = self.invalidate();
        tracing::info!(session = %self.id, generation, "Cleared conversation");
    }

    fn invalidate(&self) -> u64 {
        let generation = {
            let mut state = self.shared.write();
            state.cancel.cancel();
            state.cancel = CancellationToken::new();
            state.generation += 1;
            state.pending = 0;
            state.store.reset();
            state.generation
        };
        self.shared.notify();
        generation
    }

    /// Consistent copy of the conversation, prompts and status
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.shared.read();
        SessionSnapshot {
            messages: state.store.messages().to_vec(),
            prompts: state.prompts.as_slice().to_vec(),
            status: state.status(),
            generation: state.generation,
        }
    }

    /// Copy of the conversation
    pub fn messages(&self) -> Vec<Message> {
        self.shared.read().store.messages().to_vec()
    }

    /// Copy of the suggested prompts
    pub fn prompts(&self) -> Vec<String> {
        self.shared.read().prompts.as_slice().to_vec()
    }

    /// Idle or awaiting a reply
    pub fn status(&self) -> SessionStatus {
        self.shared.read().status()
    }

    /// Current conversation generation
    pub fn generation(&self) -> u64 {
        self.shared.read().generation
    }

    /// Revision counter bumped after every mutation
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.shared.write().cancel.cancel();
        self.worker.abort();
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.read();
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("messages", &state.store.len())
            .field("generation", &state.generation)
            .field("status", &state.status())
            .finish()
    }
}
