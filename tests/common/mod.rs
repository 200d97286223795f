// Shared fakes for integration tests: a scripted capture device the test
// feeds by hand, and an uploader with canned answers.

#![allow(dead_code)]

use async_trait::async_trait;
use plant_chat::audio::{AudioChunk, AudioFormat, CaptureDevice, DeviceProvider};
use plant_chat::{
    Artifact, Conversation, ConversationConfig, ConversationParts, ImageUpload, MemoryPeer,
    MemoryTransport, RecorderConfig, RecorderError, TypingConfig, UploadError, Uploader,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Default)]
pub struct DeviceProbe {
    pub sender: Mutex<Option<mpsc::UnboundedSender<AudioChunk>>>,
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
    pub paused: AtomicBool,
}

/// Provider whose devices only produce what the test pushes
pub struct ScriptedProvider {
    pub probe: Arc<DeviceProbe>,
    pub fail_acquire: bool,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            probe: Arc::new(DeviceProbe::default()),
            fail_acquire: false,
        })
    }

    pub fn denied() -> Arc<Self> {
        Arc::new(Self {
            probe: Arc::new(DeviceProbe::default()),
            fail_acquire: true,
        })
    }

    /// Emit one chunk from the currently held device
    pub fn push(&self, data: &[u8]) -> bool {
        let sender = self.probe.sender.lock().unwrap();
        match sender.as_ref() {
            Some(tx) => tx
                .send(AudioChunk {
                    data: data.to_vec(),
                    timestamp_ms: 0,
                })
                .is_ok(),
            None => false,
        }
    }

    pub fn acquired(&self) -> usize {
        self.probe.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.probe.released.load(Ordering::SeqCst)
    }

    pub fn is_held(&self) -> bool {
        self.probe.sender.lock().unwrap().is_some()
    }
}

#[async_trait]
impl DeviceProvider for ScriptedProvider {
    async fn acquire(&self) -> Result<Box<dyn CaptureDevice>, RecorderError> {
        if self.fail_acquire {
            return Err(RecorderError::DeviceUnavailable(
                "permission denied".to_string(),
            ));
        }
        self.probe.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedDevice {
            probe: Arc::clone(&self.probe),
        }))
    }
}

pub struct ScriptedDevice {
    probe: Arc<DeviceProbe>,
}

#[async_trait]
impl CaptureDevice for ScriptedDevice {
    async fn start(&mut self) -> Result<mpsc::UnboundedReceiver<AudioChunk>, RecorderError> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.probe.sender.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    fn pause(&mut self) {
        self.probe.paused.store(true, Ordering::SeqCst);
    }

    fn resume(&mut self) {
        self.probe.paused.store(false, Ordering::SeqCst);
    }

    async fn stop(&mut self) -> Result<(), RecorderError> {
        self.probe.sender.lock().unwrap().take();
        self.probe.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn format(&self) -> AudioFormat {
        AudioFormat::Encoded {
            media_type: "audio/webm".to_string(),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Uploader answering every call with a fixed result
pub struct CannedUploader {
    pub transcript: Result<String, String>,
    pub analysis: Result<String, String>,
    pub audio_calls: AtomicUsize,
    pub image_calls: AtomicUsize,
}

impl CannedUploader {
    pub fn new(transcript: Result<&str, &str>, analysis: Result<&str, &str>) -> Arc<Self> {
        Arc::new(Self {
            transcript: transcript.map(str::to_string).map_err(str::to_string),
            analysis: analysis.map(str::to_string).map_err(str::to_string),
            audio_calls: AtomicUsize::new(0),
            image_calls: AtomicUsize::new(0),
        })
    }

    pub fn ok() -> Arc<Self> {
        Self::new(Ok("transcribed"), Ok("analysed"))
    }
}

#[async_trait]
impl Uploader for CannedUploader {
    async fn upload_audio(&self, _artifact: &Artifact) -> Result<String, UploadError> {
        self.audio_calls.fetch_add(1, Ordering::SeqCst);
        self.transcript.clone().map_err(UploadError::Rejected)
    }

    async fn upload_image(&self, _image: &ImageUpload) -> Result<String, UploadError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        self.analysis.clone().map_err(UploadError::Rejected)
    }

    fn name(&self) -> &str {
        "canned"
    }
}

pub struct Harness {
    pub conversation: Conversation,
    pub peer: MemoryPeer,
    pub devices: Arc<ScriptedProvider>,
    pub uploader: Arc<CannedUploader>,
}

/// Conversation over an in-memory transport, connected
pub async fn harness(config: ConversationConfig, uploader: Arc<CannedUploader>) -> Harness {
    harness_with(config, uploader, ScriptedProvider::new()).await
}

pub async fn harness_with(
    config: ConversationConfig,
    uploader: Arc<CannedUploader>,
    devices: Arc<ScriptedProvider>,
) -> Harness {
    let (transport, peer) = MemoryTransport::pair();

    let conversation = Conversation::new(ConversationParts {
        transport: Arc::new(transport),
        uploader: uploader.clone(),
        devices: devices.clone(),
        config,
        typing: TypingConfig {
            cadence: Duration::from_millis(25),
        },
        recorder: RecorderConfig::default(),
    })
    .await;

    conversation.connect().await.unwrap();

    Harness {
        conversation,
        peer,
        devices,
        uploader,
    }
}
