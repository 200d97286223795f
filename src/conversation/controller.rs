use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::media::{Media, MediaLibrary};
use super::message::{MediaRef, Message, MessageId, MessageKind, MessagePatch};
use super::store::{ConversationStore, StoreEvent};
use crate::audio::{Artifact, DeviceProvider};
use crate::error::{ChatError, Result, TransportError};
use crate::recorder::{RecorderConfig, RecorderSession, RecorderStatus};
use crate::transport::{InboundEvent, Transport};
use crate::typing::{TypingConfig, TypingRenderer};
use crate::upload::{ImageUpload, Uploader};

/// How a finished recording leaves the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioDelivery {
    /// POST to the transcription endpoint; the transcript is shown as a reply
    Upload,
    /// Send as one binary frame on the transport
    Socket,
}

/// Conversation behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Settled remote message shown before anything else
    pub greeting: Option<String>,
    pub audio_delivery: AudioDelivery,
    /// Shown as a remote message whenever an upload fails
    pub upload_failure_message: String,
    /// Shown as a remote message when audio cannot be sent on a closed transport
    pub not_connected_message: String,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            greeting: None,
            audio_delivery: AudioDelivery::Upload,
            upload_failure_message:
                "Sorry, I couldn't process that upload. Please try again.".to_string(),
            not_connected_message: "Not connected. Your message could not be sent.".to_string(),
        }
    }
}

/// Everything a conversation needs from the outside world
pub struct ConversationParts {
    pub transport: Arc<dyn Transport>,
    pub uploader: Arc<dyn Uploader>,
    pub devices: Arc<dyn DeviceProvider>,
    pub config: ConversationConfig,
    pub typing: TypingConfig,
    pub recorder: RecorderConfig,
}

struct Inner {
    store: ConversationStore,
    media: MediaLibrary,
    renderer: TypingRenderer,
    recorder: Mutex<RecorderSession>,
    transport: Arc<dyn Transport>,
    uploader: Arc<dyn Uploader>,
    config: ConversationConfig,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.get_mut().take() {
            pump.abort();
        }
    }
}

/// One conversation view: the message store plus the wiring that feeds it
///
/// Local actions and inbound frames are appended in the order they are
/// processed. Remote text is revealed through the typing renderer. Cloning
/// yields another handle onto the same conversation.
#[derive(Clone)]
pub struct Conversation {
    inner: Arc<Inner>,
}

impl Conversation {
    /// Build the conversation. Must be called inside a tokio runtime; the
    /// transport is not connected until `connect`.
    pub async fn new(parts: ConversationParts) -> Self {
        let store = ConversationStore::new();

        if let Some(greeting) = &parts.config.greeting {
            let id = store.next_id();
            if let Err(e) = store.append(Message::remote_text(id, greeting.clone())).await {
                warn!("Failed to append greeting: {}", e);
            }
        }

        let renderer = TypingRenderer::new(store.clone(), parts.typing);
        let recorder = RecorderSession::new(parts.devices, parts.recorder);

        Self {
            inner: Arc::new(Inner {
                store,
                media: MediaLibrary::new(),
                renderer,
                recorder: Mutex::new(recorder),
                transport: parts.transport,
                uploader: parts.uploader,
                config: parts.config,
                pump: Mutex::new(None),
            }),
        }
    }

    /// Open the transport and start feeding inbound frames into the store
    pub async fn connect(&self) -> Result<()> {
        let transport = &self.inner.transport;
        info!("Connecting conversation over {}", transport.name());

        let inbound = transport.connect().await.map_err(|e| {
            error!("Failed to connect {} transport: {}", transport.name(), e);
            ChatError::TransportClosed(e)
        })?;

        let pump = tokio::spawn(pump_inbound(Arc::downgrade(&self.inner), inbound));
        if let Some(previous) = self.inner.pump.lock().await.replace(pump) {
            previous.abort();
        }
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.inner.transport.is_open()
    }

    pub fn store(&self) -> &ConversationStore {
        &self.inner.store
    }

    pub fn renderer(&self) -> &TypingRenderer {
        &self.inner.renderer
    }

    /// Snapshot of all messages in display order
    pub async fn messages(&self) -> Vec<Message> {
        self.inner.store.all().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.store.subscribe()
    }

    pub async fn media(&self, media_ref: &MediaRef) -> Option<Media> {
        self.inner.media.get(media_ref).await
    }

    /// Send user text. Blank input is ignored (`Ok(None)`). The message is
    /// appended only once the transport accepted it, so a rejected send
    /// leaves the store untouched.
    pub async fn send_text(&self, text: &str) -> Result<Option<MessageId>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        if !self.is_connected() {
            warn!("Rejected outbound text: transport closed");
            return Err(ChatError::TransportClosed(TransportError::Closed));
        }

        self.inner.transport.send_text(text).await.map_err(|e| {
            error!("Failed to send message: {}", e);
            ChatError::TransportClosed(e)
        })?;

        let store = &self.inner.store;
        let id = store.next_id();
        store.append(Message::own_text(id, text)).await?;

        Ok(Some(id))
    }

    /// Inbound text frame: append a placeholder and reveal the text into it
    pub async fn receive_text(&self, text: String) -> Result<MessageId> {
        receive_into(&self.inner, text).await
    }

    pub async fn recorder_status(&self) -> RecorderStatus {
        self.inner.recorder.lock().await.status()
    }

    pub async fn start_recording(&self) -> Result<RecorderStatus> {
        let mut recorder = self.inner.recorder.lock().await;
        recorder.start().await?;
        Ok(recorder.status())
    }

    pub async fn pause_recording(&self) -> RecorderStatus {
        let mut recorder = self.inner.recorder.lock().await;
        recorder.pause();
        recorder.status()
    }

    pub async fn resume_recording(&self) -> RecorderStatus {
        let mut recorder = self.inner.recorder.lock().await;
        recorder.resume();
        recorder.status()
    }

    /// Stop the recorder and append the recording as a Self/Audio message.
    ///
    /// Returns `None` when nothing was recording. The artifact still has to
    /// go through `deliver_audio`.
    pub async fn finish_recording(&self) -> Result<Option<(MessageId, Artifact)>> {
        let artifact = {
            let mut recorder = self.inner.recorder.lock().await;
            recorder.stop().await
        };
        let Some(artifact) = artifact else {
            return Ok(None);
        };

        let encoded = artifact.encode().map_err(|e| {
            error!("Failed to encode recording: {}", e);
            ChatError::UploadFailed(e.into())
        })?;
        let media_ref = self
            .inner
            .media
            .register(encoded, artifact.media_type(), None)
            .await;

        let store = &self.inner.store;
        let id = store.next_id();
        store
            .append(Message::own_media(id, MessageKind::Audio, media_ref, None))
            .await?;

        Ok(Some((id, artifact)))
    }

    /// Hand a finished recording to the configured delivery path.
    ///
    /// Upload failures become a visible remote message and are not returned
    /// as errors. A closed transport is both shown and returned.
    pub async fn deliver_audio(&self, artifact: Artifact) -> Result<()> {
        match self.inner.config.audio_delivery {
            AudioDelivery::Upload => {
                match self.inner.uploader.upload_audio(&artifact).await {
                    Ok(transcript) => {
                        receive_into(&self.inner, transcript).await?;
                    }
                    Err(e) => {
                        error!("Audio upload failed: {}", e);
                        self.append_notice(&self.inner.config.upload_failure_message)
                            .await?;
                    }
                }
                Ok(())
            }
            AudioDelivery::Socket => {
                let sent = match artifact.encode() {
                    Ok(bytes) => {
                        self.inner
                            .transport
                            .send_binary(bytes, artifact.media_type())
                            .await
                    }
                    Err(e) => {
                        error!("Failed to encode recording: {}", e);
                        self.append_notice(&self.inner.config.upload_failure_message)
                            .await?;
                        return Ok(());
                    }
                };

                if let Err(e) = sent {
                    error!("Failed to send audio frame: {}", e);
                    self.append_notice(&self.inner.config.not_connected_message)
                        .await?;
                    return Err(ChatError::TransportClosed(e));
                }
                Ok(())
            }
        }
    }

    /// `finish_recording` followed by `deliver_audio`
    pub async fn stop_recording(&self) -> Result<Option<MessageId>> {
        let Some((id, artifact)) = self.finish_recording().await? else {
            return Ok(None);
        };
        self.deliver_audio(artifact).await?;
        Ok(Some(id))
    }

    /// Append a Self/File attachment. Files are not uploaded.
    pub async fn attach_file(
        &self,
        name: &str,
        bytes: Vec<u8>,
        media_type: &str,
    ) -> Result<MessageId> {
        let media_ref = self
            .inner
            .media
            .register(bytes, media_type, Some(name.to_string()))
            .await;

        let store = &self.inner.store;
        let id = store.next_id();
        store
            .append(Message::own_media(
                id,
                MessageKind::File,
                media_ref,
                Some(name.to_string()),
            ))
            .await?;

        info!("Attached file {} as message {}", name, id);
        Ok(id)
    }

    /// Append a Self/Image attachment and upload it for analysis.
    ///
    /// `append_image` followed by `analyse_image`.
    pub async fn attach_image(
        &self,
        name: &str,
        bytes: Vec<u8>,
        media_type: &str,
    ) -> Result<MessageId> {
        let (id, image) = self.append_image(name, bytes, media_type).await?;
        self.analyse_image(image).await?;
        Ok(id)
    }

    /// Append a Self/Image message now. The returned upload still has to go
    /// through `analyse_image`.
    pub async fn append_image(
        &self,
        name: &str,
        bytes: Vec<u8>,
        media_type: &str,
    ) -> Result<(MessageId, ImageUpload)> {
        let image = ImageUpload {
            name: name.to_string(),
            media_type: media_type.to_string(),
            bytes,
        };

        let media_ref = self
            .inner
            .media
            .register(image.bytes.clone(), media_type, Some(name.to_string()))
            .await;

        let store = &self.inner.store;
        let id = store.next_id();
        store
            .append(Message::own_media(
                id,
                MessageKind::Image,
                media_ref,
                Some(name.to_string()),
            ))
            .await?;

        info!("Attached image {} as message {}", name, id);
        Ok((id, image))
    }

    /// Upload an image for analysis.
    ///
    /// The analysis is revealed as a remote reply; an upload failure appends
    /// one settled remote message carrying the configured failure text.
    pub async fn analyse_image(&self, image: ImageUpload) -> Result<()> {
        match self.inner.uploader.upload_image(&image).await {
            Ok(analysis) => {
                receive_into(&self.inner, analysis).await?;
            }
            Err(e) => {
                error!("Image upload failed for {}: {}", image.name, e);
                self.append_notice(&self.inner.config.upload_failure_message)
                    .await?;
            }
        }
        Ok(())
    }

    /// Tear the view down: stop inbound processing and pending reveals,
    /// release any capture device and close the transport.
    pub async fn shutdown(&self) {
        info!("Shutting down conversation");

        if let Some(pump) = self.inner.pump.lock().await.take() {
            pump.abort();
        }
        self.inner.renderer.shutdown();

        if let Some(artifact) = self.inner.recorder.lock().await.stop().await {
            warn!(
                "Discarding unfinished recording ({} bytes)",
                artifact.data.len()
            );
        }

        if let Err(e) = self.inner.transport.close().await {
            warn!("Failed to close transport: {}", e);
        }
    }

    async fn append_notice(&self, text: &str) -> Result<MessageId> {
        let store = &self.inner.store;
        let id = store.next_id();
        store.append(Message::remote_text(id, text)).await?;
        Ok(id)
    }
}

async fn receive_into(inner: &Inner, text: String) -> Result<MessageId> {
    let id = inner.store.next_id();
    inner.store.append(Message::remote_placeholder(id)).await?;

    if !inner.renderer.reveal(id, text.clone()).await {
        // renderer is gone; show the text in full rather than leave it revealing
        let settled = MessagePatch::displayed(text.clone())
            .with_final(text)
            .with_revealing(false);
        inner.store.patch(id, settled).await;
    }
    Ok(id)
}

/// Feed inbound transport events into the conversation until the
/// connection closes or the conversation is dropped
async fn pump_inbound(inner: Weak<Inner>, mut inbound: mpsc::Receiver<InboundEvent>) {
    while let Some(event) = inbound.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };

        match event {
            InboundEvent::Text(text) => {
                if let Err(e) = receive_into(&inner, text).await {
                    error!("Failed to append inbound message: {}", e);
                }
            }
            InboundEvent::Closed(reason) => {
                warn!(
                    "Transport {} closed: {}",
                    inner.transport.name(),
                    reason.as_deref().unwrap_or("no reason given")
                );
                break;
            }
        }
    }
}
