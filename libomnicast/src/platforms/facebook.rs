//! Facebook platform implementation
//!
//! Publishes to a Facebook Page through the Graph API: a text-only feed post,
//! or a photo post when the content carries a media URL. Single-shot protocol
//! with no retries.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use crate::error::PublishError;
use crate::http::{HttpRequest, HttpTransport};
use crate::platforms::Publisher;
use crate::types::{PlatformId, PublicationContent, PublishResult};

const GRAPH_BASE_URL: &str = "https://graph.facebook.com/v24.0";

/// Facebook Page publisher
pub struct FacebookPublisher {
    page_id: String,
    access_token: String,
    transport: Arc<dyn HttpTransport>,
}

impl FacebookPublisher {
    pub fn new(
        page_id: impl Into<String>,
        access_token: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            page_id: page_id.into(),
            access_token: access_token.into(),
            transport,
        }
    }

    async fn try_publish(
        &self,
        content: &PublicationContent,
    ) -> Result<Option<String>, PublishError> {
        match content.media_url.as_deref() {
            Some(media_url) => self.post_photo(&content.text, media_url).await,
            None => self.post_feed(&content.text).await,
        }
    }

    /// Text-only post to the page feed
    async fn post_feed(&self, text: &str) -> Result<Option<String>, PublishError> {
        let url = format!("{}/{}/feed?fields=id,permalink_url", GRAPH_BASE_URL, self.page_id);
        let request = HttpRequest::post(url)
            .bearer(&self.access_token)
            .json(json!({ "message": text }));

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(PublishError::Transport(format!(
                "Facebook API returned {}: {}",
                response.status,
                response.text()
            )));
        }

        let body: serde_json::Value = response.json()?;
        let permalink = body["permalink_url"]
            .as_str()
            .map(String::from)
            .or_else(|| {
                body["id"]
                    .as_str()
                    .map(|id| format!("https://www.facebook.com/{}", id))
            });
        Ok(permalink)
    }

    /// Photo post; the Graph API fetches the image from the given URL itself
    async fn post_photo(&self, caption: &str, media_url: &str) -> Result<Option<String>, PublishError> {
        let url = format!("{}/{}/photos", GRAPH_BASE_URL, self.page_id);
        let request = HttpRequest::post(url)
            .bearer(&self.access_token)
            .json(json!({ "url": media_url, "caption": caption }));

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(PublishError::Transport(format!(
                "Facebook API returned {}: {}",
                response.status,
                response.text()
            )));
        }

        let body: serde_json::Value = response.json()?;
        let permalink = body["post_id"]
            .as_str()
            .or_else(|| body["id"].as_str())
            .map(|id| format!("https://www.facebook.com/{}", id));
        Ok(permalink)
    }
}

#[async_trait]
impl Publisher for FacebookPublisher {
    fn platform(&self) -> PlatformId {
        PlatformId::Facebook
    }

    async fn publish(&self, content: &PublicationContent) -> PublishResult {
        info!(page_id = %self.page_id, "Publishing to Facebook");
        match self.try_publish(content).await {
            Ok(url) => PublishResult::ok(PlatformId::Facebook, url),
            Err(e) => {
                warn!(error = %e, "Facebook publication failed");
                PublishResult::failed(PlatformId::Facebook, e.to_string())
            }
        }
    }
}
