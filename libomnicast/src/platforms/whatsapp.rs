//! WhatsApp platform implementation
//!
//! Publishes a story through a self-hosted WhatsApp gateway. Stories are
//! media-first: the gateway rejects text-only submissions, so content
//! without a media URL is refused before any network call. The gateway
//! exposes no public story URL, so a successful publication carries none.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use crate::error::PublishError;
use crate::http::{HttpRequest, HttpTransport};
use crate::platforms::Publisher;
use crate::types::{PlatformId, PublicationContent, PublishResult};

/// WhatsApp story publisher backed by a gateway instance
pub struct WhatsappPublisher {
    gateway_url: String,
    access_token: String,
    transport: Arc<dyn HttpTransport>,
}

impl WhatsappPublisher {
    pub fn new(
        gateway_url: impl Into<String>,
        access_token: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            gateway_url: gateway_url.into(),
            access_token: access_token.into(),
            transport,
        }
    }

    async fn try_publish(
        &self,
        content: &PublicationContent,
    ) -> Result<Option<String>, PublishError> {
        let media_url = content.media_url.as_deref().ok_or_else(|| {
            PublishError::Validation("WhatsApp stories require a media URL".to_string())
        })?;

        let url = format!(
            "{}/stories/send/media",
            self.gateway_url.trim_end_matches('/')
        );
        let request = HttpRequest::post(url).bearer(&self.access_token).json(json!({
            "media": media_url,
            "caption": content.text,
        }));

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(PublishError::Transport(format!(
                "WhatsApp gateway returned {}: {}",
                response.status,
                response.text()
            )));
        }

        // The gateway accepts the story but has no permalink to hand back
        Ok(None)
    }
}

#[async_trait]
impl Publisher for WhatsappPublisher {
    fn platform(&self) -> PlatformId {
        PlatformId::Whatsapp
    }

    async fn publish(&self, content: &PublicationContent) -> PublishResult {
        info!(gateway = %self.gateway_url, "Publishing story to WhatsApp");
        match self.try_publish(content).await {
            Ok(url) => PublishResult::ok(PlatformId::Whatsapp, url),
            Err(e) => {
                warn!(error = %e, "WhatsApp publication failed");
                PublishResult::failed(PlatformId::Whatsapp, e.to_string())
            }
        }
    }
}
