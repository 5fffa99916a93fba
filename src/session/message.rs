//! Conversation turn types
//!
//! A [`Message`] is either a user turn or an assistant turn. Only assistant
//! turns carry attachments and a feedback rating, so a user message can never
//! be rated. Attachments are a sum type rather than a pair of optional lists.

use serde::{Deserialize, Serialize};

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The person typing into the client
    User,
    /// The conversational backend
    Assistant,
}

/// Tri-state rating stored on an assistant turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    /// Not rated
    #[default]
    None,
    /// Thumbs up
    Up,
    /// Thumbs down
    Down,
}

/// A rating the user can request; clearing is expressed by toggling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    /// Thumbs up
    Up,
    /// Thumbs down
    Down,
}

impl From<Rating> for Feedback {
    fn from(rating: Rating) -> Self {
        match rating {
            Rating::Up => Feedback::Up,
            Rating::Down => Feedback::Down,
        }
    }
}

/// An image attached to an assistant reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Location of the image
    pub url: String,
    /// Where the image came from (usually a domain name)
    #[serde(default)]
    pub source: String,
}

/// A citation attached to an assistant reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// Human readable title
    pub title: String,
    /// Web link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Document link, typically a PDF
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
}

/// The link a reference resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceLink<'a> {
    /// Opens in a browser
    Web(&'a str),
    /// Opens in a document viewer
    Document(&'a str),
}

impl Reference {
    /// Create a reference pointing at a web page
    pub fn web(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: Some(url.into()),
            document_url: None,
        }
    }

    /// Create a reference pointing at a document
    pub fn document(title: impl Into<String>, document_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: None,
            document_url: Some(document_url.into()),
        }
    }

    /// The link to open for this reference
    ///
    /// A document link wins when both kinds are populated.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatline::session::{Reference, ReferenceLink};
    ///
    /// let reference = Reference::document("Paper", "https://arxiv.org/pdf/2401.00002");
    /// assert_eq!(
    ///     reference.link(),
    ///     Some(ReferenceLink::Document("https://arxiv.org/pdf/2401.00002"))
    /// );
    /// ```
    pub fn link(&self) -> Option<ReferenceLink<'_>> {
        match (&self.document_url, &self.url) {
            (Some(doc), _) => Some(ReferenceLink::Document(doc)),
            (None, Some(url)) => Some(ReferenceLink::Web(url)),
            (None, None) => None,
        }
    }
}

/// What an assistant reply carries besides its text
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum Attachments {
    /// Plain text reply
    #[default]
    None,
    /// Images only
    Images(Vec<Image>),
    /// References only
    References(Vec<Reference>),
    /// Images and references
    Both {
        /// Attached images
        images: Vec<Image>,
        /// Attached references
        references: Vec<Reference>,
    },
}

impl Attachments {
    /// Build attachments from two possibly empty lists
    ///
    /// # Examples
    ///
    /// ```
    /// use chatline::session::{Attachments, Image};
    ///
    /// assert_eq!(Attachments::from_parts(vec![], vec![]), Attachments::None);
    ///
    /// let image = Image { url: "https://x/1.png".into(), source: "x".into() };
    /// let attachments = Attachments::from_parts(vec![image.clone()], vec![]);
    /// assert_eq!(attachments, Attachments::Images(vec![image]));
    /// ```
    pub fn from_parts(images: Vec<Image>, references: Vec<Reference>) -> Self {
        match (images.is_empty(), references.is_empty()) {
            (true, true) => Attachments::None,
            (false, true) => Attachments::Images(images),
            (true, false) => Attachments::References(references),
            (false, false) => Attachments::Both { images, references },
        }
    }

    /// Attached images, empty when there are none
    pub fn images(&self) -> &[Image] {
        match self {
            Attachments::Images(images) | Attachments::Both { images, .. } => images.as_slice(),
            _ => &[],
        }
    }

    /// Attached references, empty when there are none
    pub fn references(&self) -> &[Reference] {
        match self {
            Attachments::References(references) | Attachments::Both { references, .. } => {
                references.as_slice()
            }
            _ => &[],
        }
    }

    /// True for a plain text reply
    pub fn is_empty(&self) -> bool {
        matches!(self, Attachments::None)
    }
}

/// One turn of the conversation
///
/// Text and sender are fixed at construction. The only mutable part is the
/// feedback on an assistant turn, which is changed through the message store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "sender", rename_all = "lowercase")]
pub enum Message {
    /// A turn typed (or selected) by the user
    User {
        /// Trimmed input text
        text: String,
    },
    /// A reply from the backend
    Assistant {
        /// Reply text
        text: String,
        /// Images and references
        #[serde(default)]
        attachments: Attachments,
        /// Local rating
        #[serde(default)]
        feedback: Feedback,
    },
}

impl Message {
    /// Creates a user message
    ///
    /// # Examples
    ///
    /// ```
    /// use chatline::session::{Message, Sender};
    ///
    /// let msg = Message::user("Hello");
    /// assert_eq!(msg.sender(), Sender::User);
    /// assert_eq!(msg.text(), "Hello");
    /// ```
    pub fn user(text: impl Into<String>) -> Self {
        Message::User { text: text.into() }
    }

    /// Creates an unrated assistant message
    pub fn assistant(text: impl Into<String>, attachments: Attachments) -> Self {
        Message::Assistant {
            text: text.into(),
            attachments,
            feedback: Feedback::None,
        }
    }

    /// Author of the turn
    pub fn sender(&self) -> Sender {
        match self {
            Message::User { .. } => Sender::User,
            Message::Assistant { .. } => Sender::Assistant,
        }
    }

    /// Turn text
    pub fn text(&self) -> &str {
        match self {
            Message::User { text } | Message::Assistant { text, .. } => text.as_str(),
        }
    }

    /// Attached images (always empty for user turns)
    pub fn images(&self) -> &[Image] {
        match self {
            Message::Assistant { attachments, .. } => attachments.images(),
            Message::User { .. } => &[],
        }
    }

    /// Attached references (always empty for user turns)
    pub fn references(&self) -> &[Reference] {
        match self {
            Message::Assistant { attachments, .. } => attachments.references(),
            Message::User { .. } => &[],
        }
    }

    /// Current rating; user turns always report `Feedback::None`
    pub fn feedback(&self) -> Feedback {
        match self {
            Message::Assistant { feedback, .. } => *feedback,
            Message::User { .. } => Feedback::None,
        }
    }

    /// Overwrite the rating of an assistant turn
    ///
    /// Returns false for user turns, which are left untouched.
    pub(crate) fn set_feedback(&mut self, value: Feedback) -> bool {
        match self {
            Message::Assistant { feedback, .. } => {
                *feedback = value;
                true
            }
            Message::User { .. } => false,
        }
    }
}
