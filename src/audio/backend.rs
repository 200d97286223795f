use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::error::RecorderError;

/// Encoding of the bytes a capture device produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioFormat {
    /// Raw 16-bit little-endian PCM, interleaved
    Pcm16 { sample_rate: u32, channels: u16 },
    /// Already-encoded container (e.g. "audio/webm")
    Encoded { media_type: String },
}

/// Raw binary fragment produced by a capture device
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub data: Vec<u8>,
    /// Milliseconds since the device started producing
    pub timestamp_ms: u64,
}

/// An acquired capture device
///
/// The device is held exclusively by one recorder session from `start` until
/// `stop`. Chunks are delivered on the returned channel; a paused device
/// produces nothing.
#[async_trait]
pub trait CaptureDevice: Send {
    /// Begin producing chunks
    async fn start(&mut self) -> Result<mpsc::UnboundedReceiver<AudioChunk>, RecorderError>;

    /// Suspend chunk production, keeping the device
    fn pause(&mut self);

    /// Resume chunk production after `pause`
    fn resume(&mut self);

    /// Flush any final chunk and release the device
    async fn stop(&mut self) -> Result<(), RecorderError>;

    /// Encoding of the produced bytes
    fn format(&self) -> AudioFormat;

    /// Device name for logging
    fn name(&self) -> &str;
}

/// Hands out capture devices on demand
///
/// Acquisition failures (permission denied, no hardware) surface as
/// `RecorderError::DeviceUnavailable`.
#[async_trait]
pub trait DeviceProvider: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn CaptureDevice>, RecorderError>;
}

/// Where audio comes from
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// Default input device (cargo feature `microphone`)
    Microphone,
    /// Replay of a 16-bit WAV file
    File(PathBuf),
}

/// Builds the provider for a configured source
pub struct DeviceProviderFactory;

impl DeviceProviderFactory {
    pub fn create(source: AudioSource) -> anyhow::Result<Box<dyn DeviceProvider>> {
        match source {
            AudioSource::File(path) => Ok(Box::new(super::file::FileDeviceProvider::new(path))),

            AudioSource::Microphone => {
                #[cfg(feature = "microphone")]
                {
                    Ok(Box::new(super::microphone::MicrophoneProvider::new()))
                }

                #[cfg(not(feature = "microphone"))]
                {
                    anyhow::bail!("Microphone capture requires the `microphone` feature")
                }
            }
        }
    }
}
