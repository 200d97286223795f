use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

use super::message::{Message, MessageId, MessagePatch};
use crate::error::StoreError;

/// Change notification emitted after every successful write
#[derive(Debug, Clone)]
pub enum StoreEvent {
    Appended(MessageId),
    Patched(Message),
}

#[derive(Default)]
struct StoreInner {
    /// Insertion order is display order
    messages: Vec<Message>,
    /// id -> position in `messages`
    index: HashMap<MessageId, usize>,
}

/// Append-only, insertion-ordered registry of messages
///
/// Cloning yields another handle onto the same store.
#[derive(Clone)]
pub struct ConversationStore {
    inner: Arc<RwLock<StoreInner>>,
    next_id: Arc<AtomicU64>,
    events: broadcast::Sender<StoreEvent>,
}

impl ConversationStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(RwLock::new(StoreInner::default())),
            next_id: Arc::new(AtomicU64::new(1)),
            events,
        }
    }

    /// Allocate a fresh id in monotonic creation order
    pub fn next_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Insert at the end. Existing entries are never moved or removed.
    pub async fn append(&self, message: Message) -> Result<(), StoreError> {
        let id = message.id;
        {
            let mut inner = self.inner.write().await;
            if inner.index.contains_key(&id) {
                warn!("Rejected append of duplicate message id {}", id);
                return Err(StoreError::DuplicateId(id));
            }
            let position = inner.messages.len();
            inner.messages.push(message);
            inner.index.insert(id, position);
        }

        debug!("Appended message {}", id);
        // no subscribers is fine
        let _ = self.events.send(StoreEvent::Appended(id));
        Ok(())
    }

    /// Merge fields into the message with `id`.
    ///
    /// Absent ids and patches that would break a message invariant are
    /// ignored. Returns whether the patch was applied.
    pub async fn patch(&self, id: MessageId, patch: MessagePatch) -> bool {
        let updated = {
            let mut inner = self.inner.write().await;
            let Some(&position) = inner.index.get(&id) else {
                debug!("Ignoring patch for unknown message {}", id);
                return false;
            };
            let current = &mut inner.messages[position];
            match patch.apply(current) {
                Some(next) => {
                    *current = next.clone();
                    next
                }
                None => {
                    warn!("Ignoring patch that would break invariants of message {}", id);
                    return false;
                }
            }
        };

        let _ = self.events.send(StoreEvent::Patched(updated));
        true
    }

    /// Snapshot of all messages in display order
    pub async fn all(&self) -> Vec<Message> {
        self.inner.read().await.messages.clone()
    }

    pub async fn get(&self, id: MessageId) -> Option<Message> {
        let inner = self.inner.read().await;
        inner.index.get(&id).map(|&position| inner.messages[position].clone())
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.messages.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}
