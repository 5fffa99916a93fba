//! Failure reporting for chat sessions
//!
//! Backend failures never reach the message store; the session controller
//! hands them to a [`Diagnostics`] sink instead. The default sink writes
//! them to the log and bumps counters through the `metrics` facade.
//!
//! # Metrics
//!
//! - `chatline_turns_total`: Counter of turns handed to the backend
//! - `chatline_turn_failures_total`: Counter of failed chat calls
//! - `chatline_turns_discarded_total`: Counter of replies dropped after a reset
//! - `chatline_prompt_refresh_failures_total`: Counter of failed prompt fetches
//! - `chatline_turn_duration_seconds`: Histogram of backend latency per turn

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use metrics::{histogram, increment_counter};

/// Something worth reporting about a session
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticEvent {
    /// A chat call failed; the user message stays without a reply
    TurnFailed {
        /// Turn identifier
        turn: u64,
        /// Rendered error chain
        error: String,
    },
    /// A reply arrived for a conversation that has since been reset
    TurnDiscarded {
        /// Turn identifier
        turn: u64,
        /// Generation the turn belonged to
        generation: u64,
    },
    /// A reply was appended
    TurnCompleted {
        /// Turn identifier
        turn: u64,
        /// Time spent waiting on the backend
        elapsed: Duration,
    },
    /// Fetching suggested prompts failed; the previous list is kept
    PromptRefreshFailed {
        /// Rendered error chain
        error: String,
    },
}

/// Receives session diagnostics
pub trait Diagnostics: Send + Sync {
    /// Record one event
    fn report(&self, event: DiagnosticEvent);
}

/// Logs events with `tracing` and records metrics
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, event: DiagnosticEvent) {
        match event {
            DiagnosticEvent::TurnFailed { turn, error } => {
                increment_counter!("chatline_turn_failures_total");
                tracing::warn!(turn, "Chat request failed: {}", error);
            }
            DiagnosticEvent::TurnDiscarded { turn, generation } => {
                increment_counter!("chatline_turns_discarded_total");
                tracing::debug!(turn, generation, "Discarded reply from a previous topic");
            }
            DiagnosticEvent::TurnCompleted { turn, elapsed } => {
                increment_counter!("chatline_turns_total");
                histogram!("chatline_turn_duration_seconds", elapsed.as_secs_f64());
                tracing::debug!(turn, elapsed_ms = elapsed.as_millis() as u64, "Turn completed");
            }
            DiagnosticEvent::PromptRefreshFailed { error } => {
                increment_counter!("chatline_prompt_refresh_failures_total");
                tracing::warn!("Failed to refresh suggested prompts: {}", error);
            }
        }
    }
}

/// Keeps every event in memory, for tests and debugging
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl RecordingDiagnostics {
    /// Creates an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of failed turns recorded
    pub fn failures(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, DiagnosticEvent::TurnFailed { .. }))
            .count()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn report(&self, event: DiagnosticEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
