//! Omnicast - One message, every platform
//!
//! This library provides core functionality for fanning a single piece of
//! generated content out to multiple social media platforms, each behind
//! its own publication protocol.

pub mod config;
pub mod error;
pub mod generator;
pub mod http;
pub mod logging;
pub mod media;
pub mod orchestrator;
pub mod platforms;
pub mod poll;
pub mod registry;
pub mod service;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{OmnicastError, Result};
pub use orchestrator::PublishOrchestrator;
pub use registry::PublisherRegistry;
pub use types::{PlatformId, PublicationContent, PublishResult};
