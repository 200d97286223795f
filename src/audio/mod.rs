pub mod artifact;
pub mod backend;
pub mod file;

#[cfg(feature = "microphone")]
pub mod microphone;

pub use artifact::Artifact;
pub use backend::{
    AudioChunk, AudioFormat, AudioSource, CaptureDevice, DeviceProvider, DeviceProviderFactory,
};
pub use file::{AudioFile, FileDeviceProvider};
