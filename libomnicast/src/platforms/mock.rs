//! Mock platform implementation for testing
//!
//! This module provides a configurable mock publisher that can simulate
//! successes, failures, and delays. It's designed for use in integration
//! tests to verify orchestration logic without requiring actual platform
//! credentials or network access.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::platforms::Publisher;
use crate::types::{PlatformId, PublicationContent, PublishResult};

/// Configuration for mock publisher behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Platform this mock stands in for
    pub platform: PlatformId,

    /// Whether publishing should succeed
    pub succeeds: bool,

    /// Error to return on publication failure
    pub error: Option<String>,

    /// URL to return on success (a mock URL is generated when absent)
    pub url: Option<String>,

    /// Delay before completing the publication (simulates network latency)
    pub delay: Duration,

    /// Number of times publish has been called
    pub call_count: Arc<Mutex<usize>>,

    /// Content that has been published (for verification)
    pub published: Arc<Mutex<Vec<PublicationContent>>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            platform: PlatformId::Facebook,
            succeeds: true,
            error: None,
            url: None,
            delay: Duration::from_millis(0),
            call_count: Arc::new(Mutex::new(0)),
            published: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Mock publisher for testing
pub struct MockPublisher {
    config: MockConfig,
}

impl MockPublisher {
    /// Create a new mock publisher with the given configuration
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    /// Create a mock publisher that always succeeds
    pub fn success(platform: PlatformId) -> Self {
        Self::new(MockConfig {
            platform,
            ..Default::default()
        })
    }

    /// Create a mock publisher that fails every publication
    pub fn failure(platform: PlatformId, error: &str) -> Self {
        Self::new(MockConfig {
            platform,
            succeeds: false,
            error: Some(error.to_string()),
            ..Default::default()
        })
    }

    /// Create a mock publisher with a delay
    pub fn with_delay(platform: PlatformId, delay: Duration) -> Self {
        Self::new(MockConfig {
            platform,
            delay,
            ..Default::default()
        })
    }

    /// Create a mock publisher that returns a fixed URL
    pub fn with_url(platform: PlatformId, url: &str) -> Self {
        Self::new(MockConfig {
            platform,
            url: Some(url.to_string()),
            ..Default::default()
        })
    }

    /// Get the number of times publish was called
    pub fn call_count(&self) -> usize {
        *self.config.call_count.lock().unwrap()
    }

    /// Get all content that was published
    pub fn published(&self) -> Vec<PublicationContent> {
        self.config.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    fn platform(&self) -> PlatformId {
        self.config.platform
    }

    async fn publish(&self, content: &PublicationContent) -> PublishResult {
        // Increment call count
        *self.config.call_count.lock().unwrap() += 1;

        // Simulate delay
        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }

        if self.config.succeeds {
            // Store published content
            self.config.published.lock().unwrap().push(content.clone());

            let url = self.config.url.clone().unwrap_or_else(|| {
                format!(
                    "https://{}.example/mock-{}",
                    self.config.platform,
                    uuid::Uuid::new_v4()
                )
            });
            PublishResult::ok(self.config.platform, Some(url))
        } else {
            let error_msg = self
                .config
                .error
                .clone()
                .unwrap_or_else(|| "Mock publication failed".to_string());
            PublishResult::failed(self.config.platform, error_msg)
        }
    }
}
