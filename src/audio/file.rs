use anyhow::{Context, Result};
use async_trait::async_trait;
use hound::WavReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::backend::{AudioChunk, AudioFormat, CaptureDevice, DeviceProvider};
use crate::error::RecorderError;

/// 16-bit WAV file loaded into memory
pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path).context("Failed to open WAV file")?;

        let spec = reader.spec();
        if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
            anyhow::bail!(
                "Expected 16-bit integer PCM, got {}-bit {:?}",
                spec.bits_per_sample,
                spec.sample_format
            );
        }

        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds =
            samples.len() as f64 / (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Number of interleaved samples covering `ms` milliseconds
    fn samples_per(&self, ms: u64) -> usize {
        let per_second = self.sample_rate as u64 * self.channels as u64;
        ((per_second * ms) / 1000).max(self.channels as u64) as usize
    }
}

/// Provides devices that replay a WAV file as if it were being captured live
pub struct FileDeviceProvider {
    path: PathBuf,
    chunk_duration: Duration,
}

impl FileDeviceProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            chunk_duration: Duration::from_millis(100),
        }
    }

    pub fn with_chunk_duration(mut self, chunk_duration: Duration) -> Self {
        self.chunk_duration = chunk_duration;
        self
    }
}

#[async_trait]
impl DeviceProvider for FileDeviceProvider {
    async fn acquire(&self) -> Result<Box<dyn CaptureDevice>, RecorderError> {
        let audio = AudioFile::open(&self.path)
            .map_err(|e| RecorderError::DeviceUnavailable(format!("{:#}", e)))?;

        Ok(Box::new(FileDevice {
            name: format!("file:{}", audio.path),
            audio: Arc::new(audio),
            chunk_duration: self.chunk_duration,
            paused: watch::channel(false).0,
            task: None,
        }))
    }
}

/// Replays a loaded WAV file in real time, one chunk per `chunk_duration`
pub struct FileDevice {
    name: String,
    audio: Arc<AudioFile>,
    chunk_duration: Duration,
    paused: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

#[async_trait]
impl CaptureDevice for FileDevice {
    async fn start(&mut self) -> Result<mpsc::UnboundedReceiver<AudioChunk>, RecorderError> {
        if self.task.is_some() {
            return Err(RecorderError::Device("file device already started".to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let audio = Arc::clone(&self.audio);
        let mut paused = self.paused.subscribe();
        let chunk_duration = self.chunk_duration;

        self.task = Some(tokio::spawn(async move {
            let step = audio.samples_per(chunk_duration.as_millis() as u64);
            let mut timestamp_ms = 0u64;

            for samples in audio.samples.chunks(step) {
                // parked until resumed; a dropped device ends the replay
                if paused.wait_for(|paused| !*paused).await.is_err() {
                    break;
                }

                let data: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
                if tx.send(AudioChunk { data, timestamp_ms }).is_err() {
                    break;
                }

                timestamp_ms += chunk_duration.as_millis() as u64;
                tokio::time::sleep(chunk_duration).await;
            }

            debug!("File replay finished at {}ms", timestamp_ms);
        }));

        Ok(rx)
    }

    fn pause(&mut self) {
        self.paused.send_replace(true);
    }

    fn resume(&mut self) {
        self.paused.send_replace(false);
    }

    async fn stop(&mut self) -> Result<(), RecorderError> {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        Ok(())
    }

    fn format(&self) -> AudioFormat {
        AudioFormat::Pcm16 {
            sample_rate: self.audio.sample_rate,
            channels: self.audio.channels,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for FileDevice {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
