//! Instagram platform implementation
//!
//! Publishes an image post through the Instagram Graph API container
//! lifecycle: create a media container, poll its processing status until the
//! platform reports `FINISHED`, then publish the container. A container that
//! never reaches `FINISHED` within the polling budget is reported as not
//! accepted, carrying the last status observed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::PublishError;
use crate::http::{HttpRequest, HttpTransport};
use crate::platforms::Publisher;
use crate::poll::{Poll, PollOutcome, PollPolicy};
use crate::types::{PlatformId, PublicationContent, PublishResult};

const GRAPH_BASE_URL: &str = "https://graph.instagram.com/v24.0";
const STATUS_FINISHED: &str = "FINISHED";

/// Instagram account publisher
pub struct InstagramPublisher {
    account_id: String,
    access_token: String,
    transport: Arc<dyn HttpTransport>,
    poll: PollPolicy,
}

impl InstagramPublisher {
    /// Container processing is checked up to 5 times, 3 seconds apart.
    pub const DEFAULT_POLL: PollPolicy = PollPolicy::new(5, Duration::from_millis(3000));

    pub fn new(
        account_id: impl Into<String>,
        access_token: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            access_token: access_token.into(),
            transport,
            poll: Self::DEFAULT_POLL,
        }
    }

    /// Override the polling budget (tests use a zero delay)
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    async fn try_publish(
        &self,
        content: &PublicationContent,
    ) -> Result<Option<String>, PublishError> {
        let image_url = content.media_url.as_deref().ok_or_else(|| {
            PublishError::Validation("Instagram requires an image URL".to_string())
        })?;

        let container_id = self.create_container(&content.text, image_url).await?;
        debug!(container_id = %container_id, "Container created, waiting for processing");

        self.await_container(&container_id).await?;
        self.publish_container(&container_id).await
    }

    /// Step 1: stage caption and image in a server-side container
    async fn create_container(
        &self,
        caption: &str,
        image_url: &str,
    ) -> Result<String, PublishError> {
        let url = format!("{}/{}/media", GRAPH_BASE_URL, self.account_id);
        let request = HttpRequest::post(url)
            .bearer(&self.access_token)
            .json(json!({ "caption": caption, "image_url": image_url }));

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(PublishError::Transport(format!(
                "Instagram API returned {}: {}",
                response.status,
                response.text()
            )));
        }

        let body: serde_json::Value = response.json()?;
        body["id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| {
                PublishError::Protocol("Container creation response carried no id".to_string())
            })
    }

    /// Step 2: poll the container status until `FINISHED` or the budget runs
    /// out. Non-terminal and error statuses alike just keep the loop going;
    /// only exhaustion converts the last observed status into a failure.
    async fn await_container(&self, container_id: &str) -> Result<(), PublishError> {
        let outcome = self
            .poll
            .run(move |attempt| async move {
                let status = self.fetch_container_status(container_id).await?;
                debug!(attempt, container_id = %container_id, status = %status, "Container status");
                if status == STATUS_FINISHED {
                    Ok(Poll::Ready(()))
                } else {
                    Ok(Poll::Pending(status))
                }
            })
            .await?;

        match outcome {
            PollOutcome::Completed(()) => Ok(()),
            PollOutcome::Exhausted { last } => Err(PublishError::Protocol(format!(
                "Container {} not accepted for publication (last status: {})",
                container_id, last
            ))),
        }
    }

    async fn fetch_container_status(&self, container_id: &str) -> Result<String, PublishError> {
        let url = format!("{}/{}?fields=status_code", GRAPH_BASE_URL, container_id);
        let request = HttpRequest::get(url).bearer(&self.access_token);

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(PublishError::Transport(format!(
                "Instagram status check returned {}: {}",
                response.status,
                response.text()
            )));
        }

        let body: serde_json::Value = response.json()?;
        body["status_code"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| {
                PublishError::Protocol("Status response carried no status_code".to_string())
            })
    }

    /// Step 3: publish the finished container and extract the permalink
    async fn publish_container(&self, container_id: &str) -> Result<Option<String>, PublishError> {
        let url = format!("{}/{}/media_publish", GRAPH_BASE_URL, self.account_id);
        let request = HttpRequest::post(url)
            .bearer(&self.access_token)
            .json(json!({ "creation_id": container_id }));

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(PublishError::Transport(format!(
                "Instagram publish returned {}: {}",
                response.status,
                response.text()
            )));
        }

        let body: serde_json::Value = response.json()?;
        let permalink = body["permalink"]
            .as_str()
            .map(String::from)
            .or_else(|| {
                body["id"]
                    .as_str()
                    .map(|id| format!("https://www.instagram.com/p/{}/", id))
            });
        Ok(permalink)
    }
}

#[async_trait]
impl Publisher for InstagramPublisher {
    fn platform(&self) -> PlatformId {
        PlatformId::Instagram
    }

    async fn publish(&self, content: &PublicationContent) -> PublishResult {
        info!(account_id = %self.account_id, "Publishing to Instagram");
        match self.try_publish(content).await {
            Ok(url) => PublishResult::ok(PlatformId::Instagram, url),
            Err(e) => {
                warn!(error = %e, "Instagram publication failed");
                PublishResult::failed(PlatformId::Instagram, e.to_string())
            }
        }
    }
}
