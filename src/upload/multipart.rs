use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info};

use super::{ImageUpload, Uploader};
use crate::audio::Artifact;
use crate::error::UploadError;

/// Where uploads are posted
#[derive(Debug, Clone)]
pub struct UploadEndpoints {
    pub audio_url: String,
    pub image_url: String,
}

/// Body answered by both upload endpoints
#[derive(Debug, Default, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    transcript: Option<String>,
    #[serde(default)]
    analysis: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Multipart HTTP uploader
#[derive(Debug, Clone)]
pub struct HttpUploader {
    client: reqwest::Client,
    endpoints: UploadEndpoints,
}

impl HttpUploader {
    pub fn new(endpoints: UploadEndpoints) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoints,
        }
    }

    async fn post(&self, url: &str, part: Part) -> Result<UploadResponse, UploadError> {
        let form = Form::new().part("file", part);

        let response = self.client.post(url).multipart(form).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let parsed = serde_json::from_str::<UploadResponse>(&body);

        if !status.is_success() {
            let detail = parsed
                .ok()
                .and_then(|r| r.error)
                .unwrap_or_else(|| body.trim().to_string());
            return Err(UploadError::Rejected(format!("{}: {}", status, detail)));
        }

        let parsed = parsed.map_err(|e| UploadError::Decode(e.to_string()))?;
        if let Some(error) = parsed.error {
            return Err(UploadError::Rejected(error));
        }
        Ok(parsed)
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn upload_audio(&self, artifact: &Artifact) -> Result<String, UploadError> {
        let bytes = artifact.encode()?;
        debug!(
            "Uploading audio to {} ({} bytes, {})",
            self.endpoints.audio_url,
            bytes.len(),
            artifact.media_type()
        );

        let part = Part::bytes(bytes)
            .file_name(format!("recording.{}", artifact.file_extension()))
            .mime_str(artifact.media_type())?;

        let response = self.post(&self.endpoints.audio_url, part).await?;
        let transcript = response
            .transcript
            .ok_or_else(|| UploadError::Decode("missing `transcript` field".to_string()))?;

        info!("Received transcript ({} chars)", transcript.chars().count());
        Ok(transcript)
    }

    async fn upload_image(&self, image: &ImageUpload) -> Result<String, UploadError> {
        debug!(
            "Uploading image {} to {} ({} bytes)",
            image.name,
            self.endpoints.image_url,
            image.bytes.len()
        );

        let part = Part::bytes(image.bytes.clone())
            .file_name(image.name.clone())
            .mime_str(&image.media_type)?;

        let response = self.post(&self.endpoints.image_url, part).await?;
        let analysis = response
            .analysis
            .ok_or_else(|| UploadError::Decode("missing `analysis` field".to_string()))?;

        info!("Received image analysis ({} chars)", analysis.chars().count());
        Ok(analysis)
    }

    fn name(&self) -> &str {
        "http"
    }
}
