use std::io::Cursor;
use std::time::Duration;

use super::backend::{AudioChunk, AudioFormat};

/// The finalized payload of one recording session
#[derive(Debug, Clone)]
pub struct Artifact {
    pub data: Vec<u8>,
    pub format: AudioFormat,
    /// Number of chunks concatenated into `data`
    pub chunk_count: usize,
    /// Elapsed recording time at stop
    pub elapsed: Duration,
}

impl Artifact {
    /// Concatenate chunks in arrival order
    pub fn from_chunks(chunks: Vec<AudioChunk>, format: AudioFormat, elapsed: Duration) -> Self {
        let chunk_count = chunks.len();
        let mut data = Vec::with_capacity(chunks.iter().map(|c| c.data.len()).sum());
        for chunk in chunks {
            data.extend_from_slice(&chunk.data);
        }

        Self {
            data,
            format,
            chunk_count,
            elapsed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Media type of the bytes `encode` returns
    pub fn media_type(&self) -> &str {
        match &self.format {
            AudioFormat::Pcm16 { .. } => "audio/wav",
            AudioFormat::Encoded { media_type } => media_type,
        }
    }

    /// File extension matching `media_type`
    pub fn file_extension(&self) -> &str {
        match self.media_type() {
            "audio/wav" | "audio/x-wav" => "wav",
            "audio/webm" => "webm",
            "audio/ogg" => "ogg",
            "audio/mpeg" | "audio/mp3" => "mp3",
            "audio/mp4" => "m4a",
            _ => "bin",
        }
    }

    /// Bytes ready to leave the process: raw PCM is wrapped in a WAV
    /// container, encoded audio passes through unchanged.
    pub fn encode(&self) -> Result<Vec<u8>, hound::Error> {
        match &self.format {
            AudioFormat::Encoded { .. } => Ok(self.data.clone()),
            AudioFormat::Pcm16 {
                sample_rate,
                channels,
            } => {
                let spec = hound::WavSpec {
                    channels: *channels,
                    sample_rate: *sample_rate,
                    bits_per_sample: 16,
                    sample_format: hound::SampleFormat::Int,
                };

                let mut buffer = Cursor::new(Vec::with_capacity(self.data.len() + 44));
                {
                    let mut writer = hound::WavWriter::new(&mut buffer, spec)?;
                    // a trailing odd byte cannot form a sample
                    for pair in self.data.chunks_exact(2) {
                        writer.write_sample(i16::from_le_bytes([pair[0], pair[1]]))?;
                    }
                    writer.finalize()?;
                }
                Ok(buffer.into_inner())
            }
        }
    }
}
