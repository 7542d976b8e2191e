//! Raw media access for upload-style publication protocols
//!
//! LinkedIn and TikTok receive media as raw bytes rather than as a URL the
//! platform fetches itself. The [`MediaStore`] trait hides where those bytes
//! live; [`LocalMediaStore`] resolves local filesystem paths and falls back
//! to an HTTP fetch for public URLs.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::PublishError;
use crate::http::{HttpRequest, HttpTransport};

/// Byte-level access to generated media, keyed by its location string.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Fetch the raw bytes of the media at `location`
    async fn read(&self, location: &str) -> Result<Vec<u8>, PublishError>;
}

/// Media store backed by the local filesystem, with HTTP(S) locations
/// fetched through the shared transport.
pub struct LocalMediaStore {
    transport: Arc<dyn HttpTransport>,
}

impl LocalMediaStore {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn read(&self, location: &str) -> Result<Vec<u8>, PublishError> {
        if location.starts_with("http://") || location.starts_with("https://") {
            debug!(url = %location, "Fetching media over HTTP");
            let response = self.transport.execute(HttpRequest::get(location)).await?;
            if !response.is_success() {
                return Err(PublishError::Transport(format!(
                    "Media fetch from {} returned {}",
                    location, response.status
                )));
            }
            return Ok(response.body);
        }

        let path = shellexpand::tilde(location);
        debug!(path = %path, "Reading media from disk");
        tokio::fs::read(path.as_ref())
            .await
            .map_err(|e| PublishError::Transport(format!("Failed to read media file {}: {}", location, e)))
    }
}
