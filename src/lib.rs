pub mod audio;
pub mod config;
pub mod conversation;
pub mod error;
pub mod http;
pub mod recorder;
pub mod transport;
pub mod typing;
pub mod upload;

pub use audio::{
    Artifact, AudioChunk, AudioFile, AudioFormat, AudioSource, CaptureDevice, DeviceProvider,
    DeviceProviderFactory, FileDeviceProvider,
};
pub use config::Config;
pub use conversation::{
    AudioDelivery, Conversation, ConversationConfig, ConversationParts, ConversationStore,
    MediaRef, Message, MessageId, MessageKind, MessagePatch, Sender, StoreEvent,
};
pub use error::{ChatError, RecorderError, StoreError, TransportError, UploadError};
pub use http::{create_router, AppState};
pub use recorder::{RecorderConfig, RecorderSession, RecorderState, RecorderStatus};
pub use transport::{
    InboundEvent, MemoryPeer, MemoryTransport, NatsTransport, Transport, WebSocketTransport,
};
pub use typing::{TypingConfig, TypingRenderer};
pub use upload::{HttpUploader, ImageUpload, UploadEndpoints, Uploader};
