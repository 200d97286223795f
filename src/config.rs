use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::audio::AudioSource;
use crate::conversation::ConversationConfig;
use crate::recorder::RecorderConfig;
use crate::typing::TypingConfig;
use crate::upload::UploadEndpoints;

/// Environment variables overriding file settings, e.g. `PLANT_CHAT__TRANSPORT__URL`
pub const ENV_PREFIX: &str = "PLANT_CHAT";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub transport: TransportConfig,
    pub uploads: UploadsConfig,
    #[serde(default)]
    pub typing: TypingSection,
    pub recorder: RecorderSection,
    #[serde(default)]
    pub conversation: ConversationConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Websocket,
    Nats,
    /// No remote end; useful for offline runs
    Memory,
}

#[derive(Debug, Deserialize)]
pub struct TransportConfig {
    pub kind: TransportKind,
    #[serde(default)]
    pub url: String,
    /// NATS subject scope; generated when absent
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadsConfig {
    pub audio_url: String,
    pub image_url: String,
}

#[derive(Debug, Deserialize)]
pub struct TypingSection {
    #[serde(default = "default_cadence_ms")]
    pub cadence_ms: u64,
}

fn default_cadence_ms() -> u64 {
    25
}

impl Default for TypingSection {
    fn default() -> Self {
        Self {
            cadence_ms: default_cadence_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    File,
    Microphone,
}

#[derive(Debug, Deserialize)]
pub struct RecorderSection {
    pub source: SourceKind,
    /// WAV file replayed by the `file` source (supports `~`)
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
}

fn default_tick_secs() -> u64 {
    1
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let mut cfg: Config = settings.try_deserialize()?;
        if cfg.transport.session_id.is_none() {
            cfg.transport.session_id = Some(format!("chat-{}", uuid::Uuid::new_v4()));
        }
        Ok(cfg)
    }

    pub fn typing_config(&self) -> TypingConfig {
        TypingConfig {
            cadence: Duration::from_millis(self.typing.cadence_ms),
        }
    }

    pub fn recorder_config(&self) -> RecorderConfig {
        RecorderConfig {
            tick: Duration::from_secs(self.recorder.tick_secs.max(1)),
        }
    }

    pub fn audio_source(&self) -> Result<AudioSource> {
        match self.recorder.source {
            SourceKind::Microphone => Ok(AudioSource::Microphone),
            SourceKind::File => {
                let file = self
                    .recorder
                    .file
                    .as_deref()
                    .context("recorder.file is required when recorder.source = \"file\"")?;
                let expanded = shellexpand::tilde(file);
                Ok(AudioSource::File(PathBuf::from(expanded.as_ref())))
            }
        }
    }

    pub fn upload_endpoints(&self) -> UploadEndpoints {
        UploadEndpoints {
            audio_url: self.uploads.audio_url.clone(),
            image_url: self.uploads.image_url.clone(),
        }
    }

    /// Session id from the file, or the one minted when it was loaded
    pub fn session_id(&self) -> &str {
        self.transport.session_id.as_deref().unwrap_or_default()
    }
}
