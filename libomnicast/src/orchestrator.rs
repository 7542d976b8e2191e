//! Concurrent publication orchestration
//!
//! This module fans a batch of per-platform content out to the registered
//! publishers concurrently and collects every outcome. One slow or failing
//! platform never interrupts the others: each publisher reports through its
//! own [`PublishResult`], and the orchestrator waits for all of them.

use futures::future::join_all;
use tracing::{info, warn};

use crate::generator::GeneratedContent;
use crate::registry::PublisherRegistry;
use crate::types::{MediaReference, PlatformId, PublicationContent, PublishResult};

/// Orchestrates one publication run across every registered platform
pub struct PublishOrchestrator {
    registry: PublisherRegistry,
}

impl PublishOrchestrator {
    pub fn new(registry: PublisherRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &PublisherRegistry {
        &self.registry
    }

    /// Publish every content item concurrently.
    ///
    /// Items targeting a platform with no registered publisher are skipped
    /// with a warning. Results come back in dispatch order, one per item
    /// that had a publisher, whether it succeeded or failed.
    pub async fn publish_all(&self, contents: &[PublicationContent]) -> Vec<PublishResult> {
        let mut futures = Vec::new();
        for content in contents {
            match self.registry.get(content.platform) {
                Some(publisher) => {
                    let content = content.clone();
                    futures.push(async move {
                        info!("Publishing to platform: {}", content.platform);
                        publisher.publish(&content).await
                    });
                }
                None => {
                    warn!("No publisher registered for platform: {}", content.platform);
                }
            }
        }

        join_all(futures).await
    }
}

/// Assemble per-platform publication content from generated text and media.
///
/// Platforms missing from the generated posts are left out. Media routing
/// follows what each platform can ingest: TikTok takes the video by its
/// upload source, LinkedIn takes the image by its upload source (the bytes
/// are re-uploaded to LinkedIn), and the remaining platforms take the image
/// by public link only.
pub fn assemble_contents(
    generated: &GeneratedContent,
    image: Option<&MediaReference>,
    video: Option<&MediaReference>,
) -> Vec<PublicationContent> {
    PlatformId::ALL
        .into_iter()
        .filter_map(|platform| {
            let text = generated.posts.get(&platform)?;
            let media_url = match platform {
                PlatformId::Tiktok => video.and_then(|m| m.upload_source()),
                PlatformId::Linkedin => image.and_then(|m| m.upload_source()),
                _ => image.and_then(|m| m.link_source()),
            };
            Some(PublicationContent::new(
                platform,
                text,
                media_url.map(String::from),
            ))
        })
        .collect()
}
