use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{error, info, warn};

use super::config::RecorderConfig;
use super::stats::{RecorderState, RecorderStatus};
use crate::audio::{Artifact, AudioChunk, AudioFormat, CaptureDevice, DeviceProvider};
use crate::error::RecorderError;

/// Device and buffers held between `start` and `stop`
struct ActiveCapture {
    device: Box<dyn CaptureDevice>,
    incoming: mpsc::UnboundedReceiver<AudioChunk>,
    /// Chunks produced while recording, in arrival order
    kept: Vec<AudioChunk>,
    format: AudioFormat,
}

impl ActiveCapture {
    /// Move everything the device has produced so far into `kept`
    fn collect_pending(&mut self) {
        while let Ok(chunk) = self.incoming.try_recv() {
            self.kept.push(chunk);
        }
    }

    /// Drop everything the device produced while paused
    fn discard_pending(&mut self) -> usize {
        let mut dropped = 0;
        while self.incoming.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }
}

/// A single capture lifecycle: Idle → Recording ⇄ Paused → Idle
///
/// At most one device is held at a time; a second `start` while active is
/// ignored.
pub struct RecorderSession {
    provider: Arc<dyn DeviceProvider>,
    config: RecorderConfig,
    state: RecorderState,
    active: Option<ActiveCapture>,
    elapsed: Arc<AtomicU64>,
    ticker: Option<JoinHandle<()>>,
}

impl RecorderSession {
    pub fn new(provider: Arc<dyn DeviceProvider>, config: RecorderConfig) -> Self {
        Self {
            provider,
            config,
            state: RecorderState::Idle,
            active: None,
            elapsed: Arc::new(AtomicU64::new(0)),
            ticker: None,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> RecorderStatus {
        RecorderStatus {
            state: self.state,
            elapsed_secs: self.elapsed_secs(),
            chunks_count: self.active.as_ref().map_or(0, |a| a.kept.len()),
            device: self.active.as_ref().map(|a| a.device.name().to_string()),
        }
    }

    /// Acquire a device and begin recording.
    ///
    /// Returns `Ok(false)` if a session is already active. On failure the
    /// session stays Idle with no device held and no ticker running.
    pub async fn start(&mut self) -> Result<bool, RecorderError> {
        if self.state != RecorderState::Idle {
            warn!("Recording already started");
            return Ok(false);
        }

        let mut device = self.provider.acquire().await.map_err(|e| {
            error!("Failed to acquire capture device: {}", e);
            as_unavailable(e)
        })?;

        let incoming = match device.start().await {
            Ok(rx) => rx,
            Err(e) => {
                error!("Failed to start capture on {}: {}", device.name(), e);
                if let Err(stop_err) = device.stop().await {
                    warn!("Failed to release device after start failure: {}", stop_err);
                }
                return Err(as_unavailable(e));
            }
        };

        info!("Starting recording session on {}", device.name());

        self.active = Some(ActiveCapture {
            format: device.format(),
            device,
            incoming,
            kept: Vec::new(),
        });
        self.elapsed.store(0, Ordering::SeqCst);
        self.start_ticker();
        self.state = RecorderState::Recording;

        Ok(true)
    }

    /// Suspend recording, keeping the device. No-op unless Recording.
    pub fn pause(&mut self) -> bool {
        if self.state != RecorderState::Recording {
            return false;
        }
        let Some(active) = self.active.as_mut() else {
            return false;
        };

        active.collect_pending();
        active.device.pause();
        self.stop_ticker();
        self.state = RecorderState::Paused;

        info!("Recording paused at {}s", self.elapsed_secs());
        true
    }

    /// Continue recording after `pause`. No-op unless Paused.
    pub fn resume(&mut self) -> bool {
        if self.state != RecorderState::Paused {
            return false;
        }
        let Some(active) = self.active.as_mut() else {
            return false;
        };

        let dropped = active.discard_pending();
        if dropped > 0 {
            warn!("Discarded {} chunks produced while paused", dropped);
        }
        active.device.resume();
        self.start_ticker();
        self.state = RecorderState::Recording;

        info!("Recording resumed at {}s", self.elapsed_secs());
        true
    }

    /// Finish the session: flush chunks into one artifact and release the
    /// device. Returns `None` when Idle.
    pub async fn stop(&mut self) -> Option<Artifact> {
        if self.state == RecorderState::Idle {
            return None;
        }
        let was_paused = self.state == RecorderState::Paused;

        self.stop_ticker();
        let elapsed = self.elapsed.swap(0, Ordering::SeqCst);
        self.state = RecorderState::Idle;

        let mut active = self.active.take()?;

        if was_paused {
            active.discard_pending();
        }
        // released unconditionally; a failing device still yields what it produced
        if let Err(e) = active.device.stop().await {
            error!("Failed to stop capture device {}: {}", active.device.name(), e);
        }
        active.collect_pending();

        let ActiveCapture {
            device,
            kept,
            format,
            ..
        } = active;
        let device_name = device.name().to_string();
        drop(device);

        let artifact = Artifact::from_chunks(kept, format, Duration::from_secs(elapsed));

        info!(
            "Recording session stopped on {}: {} chunks, {} bytes, {}s",
            device_name,
            artifact.chunk_count,
            artifact.data.len(),
            elapsed
        );

        Some(artifact)
    }

    fn start_ticker(&mut self) {
        self.stop_ticker();

        let elapsed = Arc::clone(&self.elapsed);
        let period = self.config.tick;
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                elapsed.fetch_add(1, Ordering::SeqCst);
            }
        }));
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl Drop for RecorderSession {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

fn as_unavailable(err: RecorderError) -> RecorderError {
    match err {
        RecorderError::Device(reason) => RecorderError::DeviceUnavailable(reason),
        unavailable => unavailable,
    }
}
