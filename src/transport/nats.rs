use async_nats::Client;
use async_trait::async_trait;
use futures::stream::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::messages::{ChatFrame, FrameKind};
use super::{InboundEvent, Transport};
use crate::error::TransportError;

/// Conversation transport over NATS
///
/// Outbound frames are published on `chat.<session>.outbound`; replies are
/// read from `chat.<session>.inbound` and filtered by `session_id`.
pub struct NatsTransport {
    url: String,
    session_id: String,
    client: Mutex<Option<Client>>,
    open: Arc<AtomicBool>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl NatsTransport {
    pub fn new(url: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            session_id: session_id.into(),
            client: Mutex::new(None),
            open: Arc::new(AtomicBool::new(false)),
            reader: Mutex::new(None),
        }
    }

    pub fn outbound_subject(&self) -> String {
        format!("chat.{}.outbound", self.session_id)
    }

    pub fn inbound_subject(&self) -> String {
        format!("chat.{}.inbound", self.session_id)
    }

    async fn publish(&self, frame: ChatFrame) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }

        let client = self.client.lock().await;
        let Some(client) = client.as_ref() else {
            return Err(TransportError::Closed);
        };

        let payload = serde_json::to_vec(&frame)?;
        let subject = self.outbound_subject();

        client
            .publish(subject.clone(), payload.into())
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;

        debug!("Published {:?} frame to {}", frame.kind, subject);
        Ok(())
    }
}

#[async_trait]
impl Transport for NatsTransport {
    async fn connect(&self) -> Result<mpsc::Receiver<InboundEvent>, TransportError> {
        info!("Connecting to NATS at {}", self.url);

        let client = async_nats::connect(self.url.as_str())
            .await
            .map_err(|e| TransportError::Connect {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        let subject = self.inbound_subject();
        let mut subscriber = client
            .subscribe(subject.clone())
            .await
            .map_err(|e| TransportError::Connect {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        info!("Subscribed to {}", subject);

        *self.client.lock().await = Some(client);
        self.open.store(true, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(64);
        let open = Arc::clone(&self.open);
        let session_id = self.session_id.clone();

        let reader = tokio::spawn(async move {
            while let Some(msg) = subscriber.next().await {
                match serde_json::from_slice::<ChatFrame>(&msg.payload) {
                    Ok(frame) => {
                        if frame.session_id != session_id || frame.kind != FrameKind::Text {
                            continue;
                        }
                        let Some(text) = frame.text else {
                            continue;
                        };
                        if tx.send(InboundEvent::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to parse chat frame: {}", e);
                    }
                }
            }

            open.store(false, Ordering::SeqCst);
            info!("NATS subscription ended");
            let _ = tx
                .send(InboundEvent::Closed(Some("subscription ended".to_string())))
                .await;
        });

        *self.reader.lock().await = Some(reader);
        Ok(rx)
    }

    async fn send_text(&self, text: &str) -> Result<(), TransportError> {
        self.publish(ChatFrame::text(&self.session_id, text)).await
    }

    async fn send_binary(&self, data: Vec<u8>, media_type: &str) -> Result<(), TransportError> {
        self.publish(ChatFrame::audio(&self.session_id, &data, media_type))
            .await
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<(), TransportError> {
        info!("Closing NATS connection");
        self.open.store(false, Ordering::SeqCst);

        if let Some(reader) = self.reader.lock().await.take() {
            reader.abort();
        }
        if let Some(client) = self.client.lock().await.take() {
            if let Err(e) = client.flush().await {
                debug!("NATS flush on close failed: {}", e);
            }
            // async-nats handles cleanup on drop
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "nats"
    }
}
