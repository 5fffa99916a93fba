//! Suggested follow-up prompts
//!
//! A single global slot. Every refresh replaces the whole list; lists are
//! never merged and no per-turn history is kept.

use serde::Serialize;

/// Current set of suggested prompts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SuggestedPrompts {
    prompts: Vec<String>,
}

impl SuggestedPrompts {
    /// Creates a slot seeded with `prompts`
    pub fn new(prompts: Vec<String>) -> Self {
        Self { prompts }
    }

    /// Replaces the whole list
    pub fn replace(&mut self, prompts: Vec<String>) {
        self.prompts = prompts;
    }

    /// Replaces the list only when a chat response carried one
    ///
    /// Returns whether the slot changed.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatline::session::SuggestedPrompts;
    ///
    /// let mut prompts = SuggestedPrompts::new(vec!["Hello".to_string()]);
    /// assert!(!prompts.update(None));
    /// assert_eq!(prompts.as_slice(), ["Hello"]);
    ///
    /// assert!(prompts.update(Some(vec!["Tell me more".to_string()])));
    /// assert_eq!(prompts.as_slice(), ["Tell me more"]);
    /// ```
    pub fn update(&mut self, from_response: Option<Vec<String>>) -> bool {
        match from_response {
            Some(prompts) => {
                self.replace(prompts);
                true
            }
            None => false,
        }
    }

    /// Prompt at `index`, if any
    pub fn get(&self, index: usize) -> Option<&str> {
        self.prompts.get(index).map(String::as_str)
    }

    /// All prompts in display order
    pub fn as_slice(&self) -> &[String] {
        &self.prompts
    }

    /// Number of prompts
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    /// True when there is nothing to suggest
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}
