use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::info;

use super::{InboundEvent, Transport};
use crate::error::TransportError;

/// Frame captured by a `MemoryTransport`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Text(String),
    Binary { data: Vec<u8>, media_type: String },
}

#[derive(Default)]
struct Shared {
    open: AtomicBool,
    inbound: Mutex<Option<mpsc::Sender<InboundEvent>>>,
    sent: Mutex<Vec<OutboundFrame>>,
}

/// In-process transport; the paired `MemoryPeer` plays the remote end
pub struct MemoryTransport {
    shared: Arc<Shared>,
}

/// Remote end of a `MemoryTransport`
#[derive(Clone)]
pub struct MemoryPeer {
    shared: Arc<Shared>,
}

impl MemoryTransport {
    pub fn pair() -> (MemoryTransport, MemoryPeer) {
        let shared = Arc::new(Shared::default());
        (
            MemoryTransport {
                shared: Arc::clone(&shared),
            },
            MemoryPeer { shared },
        )
    }
}

impl MemoryPeer {
    /// Deliver one inbound text frame. Returns false if nobody is connected.
    pub async fn push_text(&self, text: impl Into<String>) -> bool {
        let inbound = self.shared.inbound.lock().await;
        match inbound.as_ref() {
            Some(tx) => tx.send(InboundEvent::Text(text.into())).await.is_ok(),
            None => false,
        }
    }

    /// Close the connection from the remote side
    pub async fn disconnect(&self, reason: impl Into<String>) {
        self.shared.open.store(false, Ordering::SeqCst);
        if let Some(tx) = self.shared.inbound.lock().await.take() {
            let _ = tx.send(InboundEvent::Closed(Some(reason.into()))).await;
        }
    }

    /// Everything sent through the transport so far
    pub async fn sent(&self) -> Vec<OutboundFrame> {
        self.shared.sent.lock().await.clone()
    }

    pub fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn connect(&self) -> Result<mpsc::Receiver<InboundEvent>, TransportError> {
        let (tx, rx) = mpsc::channel(64);
        *self.shared.inbound.lock().await = Some(tx);
        self.shared.open.store(true, Ordering::SeqCst);
        info!("Connected in-memory transport");
        Ok(rx)
    }

    async fn send_text(&self, text: &str) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }
        self.shared
            .sent
            .lock()
            .await
            .push(OutboundFrame::Text(text.to_string()));
        Ok(())
    }

    async fn send_binary(&self, data: Vec<u8>, media_type: &str) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }
        self.shared.sent.lock().await.push(OutboundFrame::Binary {
            data,
            media_type: media_type.to_string(),
        });
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.shared.open.store(false, Ordering::SeqCst);
        self.shared.inbound.lock().await.take();
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
