use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::message::MediaRef;

/// Binary payload referenced by a message
#[derive(Debug, Clone)]
pub struct Media {
    pub bytes: Arc<Vec<u8>>,
    pub media_type: String,
    pub name: Option<String>,
}

/// Registry that hands out opaque `MediaRef` handles for binary payloads
#[derive(Clone, Default)]
pub struct MediaLibrary {
    entries: Arc<RwLock<HashMap<MediaRef, Media>>>,
    counter: Arc<AtomicU64>,
}

impl MediaLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(
        &self,
        bytes: Vec<u8>,
        media_type: impl Into<String>,
        name: Option<String>,
    ) -> MediaRef {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let media_ref = MediaRef(format!("media-{}", n));
        let media = Media {
            bytes: Arc::new(bytes),
            media_type: media_type.into(),
            name,
        };
        self.entries.write().await.insert(media_ref.clone(), media);
        media_ref
    }

    pub async fn get(&self, media_ref: &MediaRef) -> Option<Media> {
        self.entries.read().await.get(media_ref).cloned()
    }
}
