//! Real-time message transport
//!
//! The conversation talks to the assistant backend through a `Transport`
//! capability: connect once, send text (and optionally binary audio) frames,
//! receive text frames, close. Implementations:
//! - `WebSocketTransport` - one WebSocket connection (text in/out, binary out)
//! - `NatsTransport` - JSON frames over NATS subjects scoped to a session
//! - `MemoryTransport` - in-process pair for tests and offline runs

pub mod memory;
pub mod messages;
pub mod nats;
pub mod websocket;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::TransportError;

pub use memory::{MemoryPeer, MemoryTransport, OutboundFrame};
pub use messages::{ChatFrame, FrameKind};
pub use nats::NatsTransport;
pub use websocket::WebSocketTransport;

/// Something the remote end did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// One UTF-8 text frame
    Text(String),
    /// The connection closed or errored; no further events follow
    Closed(Option<String>),
}

/// Message-oriented connection to the assistant backend
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the connection. Inbound events arrive on the returned channel.
    async fn connect(&self) -> Result<mpsc::Receiver<InboundEvent>, TransportError>;

    /// Send one text frame. Fails with `TransportError::Closed` when not open.
    async fn send_text(&self, text: &str) -> Result<(), TransportError>;

    /// Send one binary frame (recorded audio)
    async fn send_binary(&self, data: Vec<u8>, media_type: &str) -> Result<(), TransportError>;

    /// Whether frames can currently be sent
    fn is_open(&self) -> bool;

    /// Close the connection
    async fn close(&self) -> Result<(), TransportError>;

    /// Transport name for logging
    fn name(&self) -> &str;
}
