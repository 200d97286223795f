//! Conversation state
//!
//! - `message` - message records and partial updates
//! - `store` - append-only, insertion-ordered message registry
//! - `media` - opaque handles for audio, image and file payloads
//! - `controller` - `Conversation`, which routes user actions, inbound
//!   frames and upload results into the store

mod controller;
mod media;
mod message;
mod store;

pub use controller::{AudioDelivery, Conversation, ConversationConfig, ConversationParts};
pub use media::{Media, MediaLibrary};
pub use message::{MediaRef, Message, MessageId, MessageKind, MessagePatch, Sender};
pub use store::{ConversationStore, StoreEvent};
