//! Default input device capture via cpal.
//!
//! A cpal stream is not `Send` on every platform, so each acquired device
//! owns a dedicated thread that builds the stream and obeys play/pause/stop
//! commands. Dropping the stream at the end of that thread releases the
//! hardware.

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use std::sync::mpsc as std_mpsc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use super::backend::{AudioChunk, AudioFormat, CaptureDevice, DeviceProvider};
use crate::error::RecorderError;

enum Command {
    Play,
    Pause,
    Stop,
}

pub struct MicrophoneProvider;

impl MicrophoneProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MicrophoneProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceProvider for MicrophoneProvider {
    async fn acquire(&self) -> Result<Box<dyn CaptureDevice>, RecorderError> {
        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = std_mpsc::channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        std::thread::spawn(move || run_stream_thread(chunk_tx, cmd_rx, ready_tx));

        let (name, format) = ready_rx
            .await
            .map_err(|_| RecorderError::DeviceUnavailable("capture thread exited".to_string()))??;

        info!("Acquired input device: {}", name);

        Ok(Box::new(MicrophoneDevice {
            name,
            format,
            commands: cmd_tx,
            chunks: Some(chunk_rx),
        }))
    }
}

type Ready = Result<(String, AudioFormat), RecorderError>;

fn run_stream_thread(
    chunk_tx: mpsc::UnboundedSender<AudioChunk>,
    commands: std_mpsc::Receiver<Command>,
    ready: oneshot::Sender<Ready>,
) {
    let stream = match open_stream(chunk_tx) {
        Ok((stream, name, format)) => {
            let _ = ready.send(Ok((name, format)));
            stream
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    for command in commands {
        let result = match command {
            Command::Play => stream.play().map_err(|e| e.to_string()),
            Command::Pause => stream.pause().map_err(|e| e.to_string()),
            Command::Stop => break,
        };
        if let Err(e) = result {
            warn!("Input stream command failed: {}", e);
        }
    }

    drop(stream);
    info!("Released input device");
}

fn open_stream(
    chunk_tx: mpsc::UnboundedSender<AudioChunk>,
) -> Result<(cpal::Stream, String, AudioFormat), RecorderError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| RecorderError::DeviceUnavailable("no input device available".to_string()))?;
    let supported = device
        .default_input_config()
        .map_err(|e| RecorderError::DeviceUnavailable(e.to_string()))?;

    let name = device.name().unwrap_or_else(|_| "default input".to_string());
    let format = AudioFormat::Pcm16 {
        sample_rate: supported.sample_rate().0,
        channels: supported.channels(),
    };

    let sample_format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();

    let stream = match sample_format {
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, chunk_tx),
        cpal::SampleFormat::I32 => build_stream::<i32>(&device, &config, chunk_tx),
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, chunk_tx),
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, chunk_tx),
        other => {
            return Err(RecorderError::DeviceUnavailable(format!(
                "sample format not supported: {:?}",
                other
            )))
        }
    }
    .map_err(|e| RecorderError::DeviceUnavailable(e.to_string()))?;

    Ok((stream, name, format))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    chunk_tx: mpsc::UnboundedSender<AudioChunk>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample,
    i16: FromSample<T>,
{
    let started = Instant::now();
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let bytes: Vec<u8> = data
                .iter()
                .flat_map(|&s| <i16 as Sample>::from_sample(s).to_le_bytes())
                .collect();
            let _ = chunk_tx.send(AudioChunk {
                data: bytes,
                timestamp_ms: started.elapsed().as_millis() as u64,
            });
        },
        |err| error!("an error occurred on stream: {}", err),
        None,
    )
}

/// Handle onto the stream thread
pub struct MicrophoneDevice {
    name: String,
    format: AudioFormat,
    commands: std_mpsc::Sender<Command>,
    chunks: Option<mpsc::UnboundedReceiver<AudioChunk>>,
}

#[async_trait]
impl CaptureDevice for MicrophoneDevice {
    async fn start(&mut self) -> Result<mpsc::UnboundedReceiver<AudioChunk>, RecorderError> {
        let chunks = self
            .chunks
            .take()
            .ok_or_else(|| RecorderError::Device("microphone already started".to_string()))?;
        self.commands
            .send(Command::Play)
            .map_err(|_| RecorderError::DeviceUnavailable("capture thread exited".to_string()))?;
        Ok(chunks)
    }

    fn pause(&mut self) {
        let _ = self.commands.send(Command::Pause);
    }

    fn resume(&mut self) {
        let _ = self.commands.send(Command::Play);
    }

    async fn stop(&mut self) -> Result<(), RecorderError> {
        self.commands
            .send(Command::Stop)
            .map_err(|_| RecorderError::Device("capture thread already exited".to_string()))
    }

    fn format(&self) -> AudioFormat {
        self.format.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for MicrophoneDevice {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Stop);
    }
}
