use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a message, unique within its store and stable for the record's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The local user
    #[serde(rename = "self")]
    Own,
    /// The assistant on the other end of the transport
    Remote,
}

/// Payload kind of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Audio,
    Image,
    File,
}

/// Opaque handle to a binary payload held by the media library
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(pub String);

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub kind: MessageKind,

    /// Complete text payload once known (empty for a placeholder)
    pub final_text: String,

    /// Prefix of `final_text` currently shown
    pub displayed_text: String,

    /// True while `displayed_text` is still growing
    pub revealing: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_ref: Option<MediaRef>,

    /// Original filename (File kind)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_name: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(id: MessageId, sender: Sender, kind: MessageKind, text: String) -> Self {
        Self {
            id,
            sender,
            kind,
            displayed_text: text.clone(),
            final_text: text,
            revealing: false,
            media_ref: None,
            media_name: None,
            created_at: Utc::now(),
        }
    }

    /// Text typed by the local user
    pub fn own_text(id: MessageId, text: impl Into<String>) -> Self {
        Self::new(id, Sender::Own, MessageKind::Text, text.into())
    }

    /// Remote text shown in full immediately (greetings, failure notices)
    pub fn remote_text(id: MessageId, text: impl Into<String>) -> Self {
        Self::new(id, Sender::Remote, MessageKind::Text, text.into())
    }

    /// Empty remote text awaiting a reveal
    pub fn remote_placeholder(id: MessageId) -> Self {
        let mut message = Self::new(id, Sender::Remote, MessageKind::Text, String::new());
        message.revealing = true;
        message
    }

    /// Audio, image or file sent by the local user
    pub fn own_media(
        id: MessageId,
        kind: MessageKind,
        media_ref: MediaRef,
        media_name: Option<String>,
    ) -> Self {
        let label = match kind {
            MessageKind::Audio => "Audio message",
            MessageKind::Image => "Image attachment",
            MessageKind::File | MessageKind::Text => "File attachment",
        };
        let mut message = Self::new(id, Sender::Own, kind, label.to_string());
        message.media_ref = Some(media_ref);
        message.media_name = media_name;
        message
    }

    /// Whether `displayed_text` is a prefix of `final_text`
    pub fn is_consistent(&self) -> bool {
        self.final_text.starts_with(&self.displayed_text)
    }
}

/// Partial update merged into an existing message by id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePatch {
    pub final_text: Option<String>,
    pub displayed_text: Option<String>,
    pub revealing: Option<bool>,
    pub media_ref: Option<MediaRef>,
    pub media_name: Option<String>,
}

impl MessagePatch {
    pub fn displayed(text: impl Into<String>) -> Self {
        Self {
            displayed_text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_final(mut self, text: impl Into<String>) -> Self {
        self.final_text = Some(text.into());
        self
    }

    pub fn with_revealing(mut self, revealing: bool) -> Self {
        self.revealing = Some(revealing);
        self
    }

    /// Apply onto a copy of `message`, returning None if the result would break
    /// a message invariant.
    pub(crate) fn apply(&self, message: &Message) -> Option<Message> {
        // a settled message never starts revealing again
        if self.revealing == Some(true) && !message.revealing {
            return None;
        }

        let mut next = message.clone();
        if let Some(text) = &self.final_text {
            next.final_text = text.clone();
        }
        if let Some(text) = &self.displayed_text {
            next.displayed_text = text.clone();
        }
        if let Some(revealing) = self.revealing {
            next.revealing = revealing;
        }
        if let Some(media_ref) = &self.media_ref {
            next.media_ref = Some(media_ref.clone());
        }
        if let Some(name) = &self.media_name {
            next.media_name = Some(name.clone());
        }

        next.is_consistent().then_some(next)
    }
}
