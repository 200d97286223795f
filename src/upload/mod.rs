//! Upload boundary
//!
//! Request/response uploads of recorded audio (answered with a transcript)
//! and images (answered with an analysis). Endpoints answer either
//! `{ "transcript": ... }` / `{ "analysis": ... }` or `{ "error": ... }`.

mod multipart;

use async_trait::async_trait;

use crate::audio::Artifact;
use crate::error::UploadError;

pub use multipart::{HttpUploader, UploadEndpoints};

/// Image picked by the user
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload a recording, returning its transcript
    async fn upload_audio(&self, artifact: &Artifact) -> Result<String, UploadError>;

    /// Upload an image, returning its analysis
    async fn upload_image(&self, image: &ImageUpload) -> Result<String, UploadError>;

    /// Uploader name for logging
    fn name(&self) -> &str;
}
