use crate::conversation::Conversation;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The conversation this service exposes
    pub conversation: Conversation,
}

impl AppState {
    pub fn new(conversation: Conversation) -> Self {
        Self { conversation }
    }
}
