//! Platform publisher abstraction and implementations
//!
//! This module provides a unified trait for publishing content to different
//! social media platforms. Each implementation runs that platform's own
//! publication protocol: a single API call for Facebook and WhatsApp, a
//! three-step container lifecycle for Instagram, an upload-and-poll flow with
//! transparent token refresh for TikTok, and a one-or-three-step flow for
//! LinkedIn depending on whether media is attached.
//!
//! # Examples
//!
//! ```no_run
//! use libomnicast::platforms::{Publisher, mock::MockPublisher};
//! use libomnicast::types::{PlatformId, PublicationContent};
//!
//! # async fn example() {
//! let publisher = MockPublisher::success(PlatformId::Facebook);
//!
//! let content = PublicationContent::new(PlatformId::Facebook, "Hello, world!", None);
//! let result = publisher.publish(&content).await;
//!
//! if result.success {
//!     println!("Published: {}", result.url.unwrap_or_default());
//! } else {
//!     eprintln!("Failed: {}", result.error.unwrap_or_default());
//! }
//! # }
//! ```

use async_trait::async_trait;

use crate::types::{PlatformId, PublicationContent, PublishResult};

pub mod facebook;
pub mod instagram;
pub mod linkedin;
pub mod tiktok;
pub mod whatsapp;

// Mock publisher is available for all builds (not just tests) to support integration tests
pub mod mock;

/// Publisher trait for unified platform publication
///
/// This trait defines the single capability every platform implementation
/// must provide. Implementations fully contain their own failures: `publish`
/// always returns a `PublishResult`, with `success=false` and a
/// human-readable `error` when anything in the protocol goes wrong. Nothing
/// escapes to the caller as an error value, which lets the orchestrator
/// dispatch platforms concurrently without one failure aborting the rest.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// The platform this publisher speaks for
    ///
    /// Every result returned by `publish` carries this same identifier.
    fn platform(&self) -> PlatformId;

    /// Run the platform's full publication protocol for one piece of content
    ///
    /// Multi-step protocols (Instagram, TikTok) perform all of their steps,
    /// including status polling, within this one call. The call terminates in
    /// bounded time: polling is capped by a fixed attempt budget, never
    /// unbounded. Calling `publish` twice with identical content performs two
    /// independent protocol runs; no memoization takes place.
    async fn publish(&self, content: &PublicationContent) -> PublishResult;
}
