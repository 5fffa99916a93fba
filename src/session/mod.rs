//! Conversation session core
//!
//! This module contains the message model, the message store, feedback
//! toggling, the suggested-prompt slot and the [`ChatSession`] controller
//! that ties them to a backend.

pub mod controller;
pub mod feedback;
pub mod message;
pub mod prompts;
pub mod store;

pub use controller::{
    ChatSession, PromptRefresh, SessionSnapshot, SessionStatus, TurnOutcome, TurnTicket,
};
pub use feedback::{toggle_feedback, toggled};
pub use message::{Attachments, Feedback, Image, Message, Rating, Reference, ReferenceLink, Sender};
pub use prompts::SuggestedPrompts;
pub use store::MessageStore;
