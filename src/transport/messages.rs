use base64::Engine;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Text,
    Audio,
}

/// Frame exchanged over NATS
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatFrame {
    pub session_id: String,
    pub kind: FrameKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Base64-encoded audio bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    pub timestamp: String, // RFC3339 timestamp
}

impl ChatFrame {
    pub fn text(session_id: &str, text: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            kind: FrameKind::Text,
            text: Some(text.to_string()),
            audio: None,
            media_type: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn audio(session_id: &str, data: &[u8], media_type: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            kind: FrameKind::Audio,
            text: None,
            audio: Some(base64::engine::general_purpose::STANDARD.encode(data)),
            media_type: Some(media_type.to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
