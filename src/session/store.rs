//! Ordered conversation log
//!
//! The store is the single source of truth for rendering. It is not
//! synchronised on its own; the session controller keeps it behind a lock so
//! every operation here is observed as one indivisible step.

use crate::session::message::{Feedback, Message};

/// Append-only (until reset) sequence of conversation turns
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message and returns its 0-based position
    ///
    /// # Examples
    ///
    /// ```
    /// use chatline::session::{Message, MessageStore};
    ///
    /// let mut store = MessageStore::new();
    /// assert_eq!(store.append(Message::user("Hello")), 0);
    /// assert_eq!(store.append(Message::user("Again")), 1);
    /// ```
    pub fn append(&mut self, message: Message) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    /// Overwrites the rating of the assistant message at `index`
    ///
    /// Out-of-range positions and user messages are ignored. Returns whether
    /// the value was written.
    pub fn set_feedback(&mut self, index: usize, value: Feedback) -> bool {
        match self.messages.get_mut(index) {
            Some(message) => message.set_feedback(value),
            None => {
                tracing::debug!(index, "Ignoring feedback for unknown message");
                false
            }
        }
    }

    /// Removes every message
    pub fn reset(&mut self) {
        self.messages.clear();
    }

    /// Message at `index`, if any
    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    /// All messages in append order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of stored messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when no messages are stored
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
