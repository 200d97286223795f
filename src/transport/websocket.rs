use async_trait::async_trait;
use futures::stream::{SplitSink, StreamExt};
use futures::SinkExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::{InboundEvent, Transport};
use crate::error::TransportError;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// One WebSocket connection to the assistant backend
pub struct WebSocketTransport {
    url: String,
    sink: Mutex<Option<WsSink>>,
    open: Arc<AtomicBool>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl WebSocketTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            sink: Mutex::new(None),
            open: Arc::new(AtomicBool::new(false)),
            reader: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send_message(&self, message: Message) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }

        let mut sink = self.sink.lock().await;
        let Some(sink) = sink.as_mut() else {
            return Err(TransportError::Closed);
        };

        sink.send(message).await.map_err(|e| {
            warn!("WebSocket send failed: {}", e);
            self.open.store(false, Ordering::SeqCst);
            TransportError::Send(e.to_string())
        })
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&self) -> Result<mpsc::Receiver<InboundEvent>, TransportError> {
        if self.is_open() {
            return Err(TransportError::Connect {
                url: self.url.clone(),
                reason: "already connected".to_string(),
            });
        }

        info!("Connecting to WebSocket at {}", self.url);

        let (stream, _) =
            connect_async(self.url.as_str())
                .await
                .map_err(|e| TransportError::Connect {
                    url: self.url.clone(),
                    reason: e.to_string(),
                })?;

        let (sink, mut source) = stream.split();
        *self.sink.lock().await = Some(sink);
        self.open.store(true, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(64);
        let open = Arc::clone(&self.open);

        let reader = tokio::spawn(async move {
            let mut reason = None;

            while let Some(message) = source.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        if tx.send(InboundEvent::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        reason = frame.map(|f| f.reason.to_string());
                        break;
                    }
                    Ok(Message::Binary(data)) => {
                        debug!("Ignoring inbound binary frame ({} bytes)", data.len());
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("WebSocket error: {}", e);
                        reason = Some(e.to_string());
                        break;
                    }
                }
            }

            open.store(false, Ordering::SeqCst);
            info!("Disconnected from WebSocket");
            let _ = tx.send(InboundEvent::Closed(reason)).await;
        });

        *self.reader.lock().await = Some(reader);

        info!("Connected to WebSocket successfully");
        Ok(rx)
    }

    async fn send_text(&self, text: &str) -> Result<(), TransportError> {
        self.send_message(Message::Text(text.to_string())).await
    }

    async fn send_binary(&self, data: Vec<u8>, _media_type: &str) -> Result<(), TransportError> {
        self.send_message(Message::Binary(data)).await
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<(), TransportError> {
        info!("Closing WebSocket connection");
        self.open.store(false, Ordering::SeqCst);

        if let Some(mut sink) = self.sink.lock().await.take() {
            if let Err(e) = sink.close().await {
                debug!("WebSocket close handshake failed: {}", e);
            }
        }
        if let Some(reader) = self.reader.lock().await.take() {
            reader.abort();
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "websocket"
    }
}
