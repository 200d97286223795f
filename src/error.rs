//! Error taxonomy
//!
//! Each subsystem reports its own error type. `ChatError` folds them into the
//! three conditions a conversation surfaces to its user: the capture device
//! could not be acquired, the real-time connection is closed, or an upload
//! failed. None of them is retried and none of them ends the conversation.

use thiserror::Error;

use crate::conversation::MessageId;

/// Errors raised while acquiring or driving a capture device
#[derive(Debug, Error)]
pub enum RecorderError {
    /// Permission denied, no hardware, or the device refused to start
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The device failed after it was acquired
    #[error("capture device error: {0}")]
    Device(String),
}

/// Errors raised by a real-time transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection is not open (never opened, closed by the peer, or errored)
    #[error("transport closed")]
    Closed,

    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("failed to send frame: {0}")]
    Send(String),

    #[error("failed to encode frame: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Errors raised by the upload boundary
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint answered with an error payload or a non-success status
    #[error("upload rejected: {0}")]
    Rejected(String),

    #[error("unexpected upload response: {0}")]
    Decode(String),

    #[error("failed to encode audio: {0}")]
    Encode(#[from] hound::Error),
}

/// Errors raised by the conversation store
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("message {0} already exists")]
    DuplicateId(MessageId),
}

/// Conditions surfaced to the user of a conversation
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    DeviceUnavailable(RecorderError),

    #[error("not connected")]
    TransportClosed(#[source] TransportError),

    #[error(transparent)]
    UploadFailed(#[from] UploadError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<RecorderError> for ChatError {
    fn from(err: RecorderError) -> Self {
        ChatError::DeviceUnavailable(err)
    }
}

impl From<TransportError> for ChatError {
    fn from(err: TransportError) -> Self {
        ChatError::TransportClosed(err)
    }
}

pub type Result<T, E = ChatError> = std::result::Result<T, E>;
