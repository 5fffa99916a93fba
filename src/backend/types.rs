//! Wire format of the conversational backend
//!
//! Field names follow the backend's JSON (`imageList`, `documentUrl`,
//! `suggestedPrompts`). History entries use the `user` / `ai` sender values
//! the backend expects.

use serde::{Deserialize, Serialize};

use crate::session::{Feedback, Image, Message, Reference};

/// Body of `POST /chat`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Trimmed user input for this turn
    pub message: String,
    /// Conversation as it stood before this turn's user message
    pub history: Vec<HistoryEntry>,
}

impl ChatRequest {
    /// Build a request from the turn text and the pre-turn history
    ///
    /// # Examples
    ///
    /// ```
    /// use chatline::backend::ChatRequest;
    /// use chatline::session::Message;
    ///
    /// let request = ChatRequest::new("Again", &[Message::user("Hello")]);
    /// assert_eq!(request.message, "Again");
    /// assert_eq!(request.history.len(), 1);
    /// ```
    pub fn new(message: impl Into<String>, history: &[Message]) -> Self {
        Self {
            message: message.into(),
            history: history.iter().map(HistoryEntry::from).collect(),
        }
    }
}

/// Sender values understood by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireSender {
    /// User turn
    #[serde(rename = "user")]
    User,
    /// Assistant turn
    #[serde(rename = "ai")]
    Ai,
}

/// One prior turn as sent to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Who wrote the turn
    pub sender: WireSender,
    /// Turn text
    pub text: String,
    /// Images attached to an assistant turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_list: Vec<Image>,
    /// References attached to an assistant turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,
    /// Local rating, `up` or `down`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl From<&Message> for HistoryEntry {
    fn from(message: &Message) -> Self {
        let sender = match message {
            Message::User { .. } => WireSender::User,
            Message::Assistant { .. } => WireSender::Ai,
        };
        let feedback = match message.feedback() {
            Feedback::None => None,
            Feedback::Up => Some("up".to_string()),
            Feedback::Down => Some("down".to_string()),
        };
        Self {
            sender,
            text: message.text().to_string(),
            image_list: message.images().to_vec(),
            references: message.references().to_vec(),
            feedback,
        }
    }
}

/// Body returned by `POST /chat`
///
/// Only `text` is required. Missing or `null` lists are treated as empty;
/// `suggested_prompts` keeps its absence so the caller can leave the
/// current prompts in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    /// Reply text
    pub text: String,
    /// Attached images
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_list: Option<Vec<Image>>,
    /// Attached references
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<Reference>>,
    /// Replacement follow-up prompts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_prompts: Option<Vec<String>>,
}

impl ChatResponse {
    /// A plain text reply
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Attach images
    pub fn with_images(mut self, images: Vec<Image>) -> Self {
        self.image_list = Some(images);
        self
    }

    /// Attach references
    pub fn with_references(mut self, references: Vec<Reference>) -> Self {
        self.references = Some(references);
        self
    }

    /// Carry replacement prompts
    pub fn with_suggested_prompts(mut self, prompts: Vec<String>) -> Self {
        self.suggested_prompts = Some(prompts);
        self
    }
}

/// Body returned by `GET /suggested_prompts`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedPromptsResponse {
    /// Current prompts
    #[serde(default)]
    pub suggested_prompts: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Attachments;

    #[test]
    fn test_request_serializes_history_with_wire_names() {
        let history = vec![
            Message::user("Hello"),
            Message::assistant(
                "Hi",
                Attachments::from_parts(
                    vec![Image {
                        url: "https://img/1.jpg".into(),
                        source: "example1.com".into(),
                    }],
                    vec![],
                ),
            ),
        ];
        let json = serde_json::to_value(ChatRequest::new("Again", &history)).unwrap();
        assert_eq!(json["message"], "Again");
        assert_eq!(json["history"][0]["sender"], "user");
        assert!(json["history"][0].get("imageList").is_none());
        assert_eq!(json["history"][1]["sender"], "ai");
        assert_eq!(json["history"][1]["imageList"][0]["source"], "example1.com");
        assert!(json["history"][1].get("feedback").is_none());
    }

    #[test]
    fn test_history_entry_carries_feedback() {
        let mut message = Message::assistant("Hi", Attachments::None);
        message.set_feedback(Feedback::Down);
        let entry = HistoryEntry::from(&message);
        assert_eq!(entry.feedback.as_deref(), Some("down"));
    }

    #[test]
    fn test_response_with_all_fields() {
        let body = r#"{
            "text": "This is a sample response",
            "imageList": [{"url": "https://img/1.jpg", "source": "example1.com"}],
            "references": [{"title": "Reference 1", "documentUrl": "https://arxiv.org/pdf/2401.00002"}],
            "suggestedPrompts": ["How can I help you with this topic?"]
        }"#;
        let response: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.image_list.unwrap().len(), 1);
        assert_eq!(response.references.unwrap()[0].title, "Reference 1");
        assert_eq!(response.suggested_prompts.unwrap().len(), 1);
    }

    #[test]
    fn test_response_missing_and_null_optionals() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"text": "Hi there", "imageList": null}"#).unwrap();
        assert_eq!(response.text, "Hi there");
        assert!(response.image_list.is_none());
        assert!(response.references.is_none());
        assert!(response.suggested_prompts.is_none());
    }

    #[test]
    fn test_response_without_text_is_rejected() {
        assert!(serde_json::from_str::<ChatResponse>(r#"{"imageList": []}"#).is_err());
    }
}
