//! Publisher registry
//!
//! Maps each platform to the publisher responsible for it. A full registry
//! covers every known platform and refuses to build otherwise, so dispatch
//! can never land on a hole. A partial registry covers an explicit subset,
//! which is what the CLI builds when the user narrows the platform list.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::http::HttpTransport;
use crate::media::MediaStore;
use crate::platforms::facebook::FacebookPublisher;
use crate::platforms::instagram::InstagramPublisher;
use crate::platforms::linkedin::LinkedinPublisher;
use crate::platforms::tiktok::TiktokPublisher;
use crate::platforms::whatsapp::WhatsappPublisher;
use crate::platforms::Publisher;
use crate::types::PlatformId;

/// Registry of publishers keyed by platform
pub struct PublisherRegistry {
    publishers: HashMap<PlatformId, Arc<dyn Publisher>>,
}

// Manual impl: `dyn Publisher` is not `Debug`, so the derive is unavailable.
impl std::fmt::Debug for PublisherRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublisherRegistry")
            .field("platforms", &self.platforms())
            .finish()
    }
}

impl PublisherRegistry {
    /// Build a registry covering every known platform.
    ///
    /// Fails with [`ConfigError::MissingPublisher`] when any platform has no
    /// publisher, and with [`ConfigError::DuplicatePublisher`] when two
    /// publishers claim the same platform.
    pub fn new(publishers: Vec<Arc<dyn Publisher>>) -> Result<Self> {
        let registry = Self::build(publishers)?;
        for platform in PlatformId::ALL {
            if !registry.publishers.contains_key(&platform) {
                return Err(ConfigError::MissingPublisher(platform.to_string()).into());
            }
        }
        Ok(registry)
    }

    /// Build a registry covering only the platforms the given publishers
    /// claim. Duplicates are still rejected.
    pub fn partial(publishers: Vec<Arc<dyn Publisher>>) -> Result<Self> {
        Self::build(publishers)
    }

    fn build(publishers: Vec<Arc<dyn Publisher>>) -> Result<Self> {
        let mut map: HashMap<PlatformId, Arc<dyn Publisher>> = HashMap::new();
        for publisher in publishers {
            let platform = publisher.platform();
            if map.insert(platform, publisher).is_some() {
                return Err(ConfigError::DuplicatePublisher(platform.to_string()).into());
            }
        }
        Ok(Self { publishers: map })
    }

    /// Look up the publisher for a platform
    pub fn get(&self, platform: PlatformId) -> Option<Arc<dyn Publisher>> {
        self.publishers.get(&platform).cloned()
    }

    /// Platforms with a registered publisher, in canonical order
    pub fn platforms(&self) -> Vec<PlatformId> {
        PlatformId::ALL
            .into_iter()
            .filter(|platform| self.publishers.contains_key(platform))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.publishers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.publishers.is_empty()
    }
}

/// Create publisher instances from configuration
///
/// This function reads the configuration and creates a publisher for every
/// enabled platform. Platforms that are absent from the configuration or
/// disabled are skipped.
pub fn create_publishers(
    config: &Config,
    transport: Arc<dyn HttpTransport>,
    media_store: Arc<dyn MediaStore>,
) -> Vec<Arc<dyn Publisher>> {
    let mut publishers: Vec<Arc<dyn Publisher>> = Vec::new();

    if let Some(facebook) = &config.facebook {
        if facebook.enabled {
            info!("Creating Facebook publisher");
            publishers.push(Arc::new(FacebookPublisher::new(
                &facebook.page_id,
                &facebook.access_token,
                transport.clone(),
            )));
        }
    }

    if let Some(instagram) = &config.instagram {
        if instagram.enabled {
            info!("Creating Instagram publisher");
            publishers.push(Arc::new(InstagramPublisher::new(
                &instagram.account_id,
                &instagram.access_token,
                transport.clone(),
            )));
        }
    }

    if let Some(linkedin) = &config.linkedin {
        if linkedin.enabled {
            info!("Creating LinkedIn publisher");
            publishers.push(Arc::new(LinkedinPublisher::new(
                &linkedin.profile_id,
                &linkedin.access_token,
                transport.clone(),
                media_store.clone(),
            )));
        }
    }

    if let Some(tiktok) = &config.tiktok {
        if tiktok.enabled {
            info!("Creating TikTok publisher");
            publishers.push(Arc::new(TiktokPublisher::new(
                &tiktok.client_key,
                &tiktok.client_secret,
                &tiktok.access_token,
                &tiktok.refresh_token,
                transport.clone(),
                media_store.clone(),
            )));
        }
    }

    if let Some(whatsapp) = &config.whatsapp {
        if whatsapp.enabled {
            info!("Creating WhatsApp publisher");
            publishers.push(Arc::new(WhatsappPublisher::new(
                &whatsapp.gateway_url,
                &whatsapp.access_token,
                transport.clone(),
            )));
        }
    }

    if publishers.is_empty() {
        warn!("No platforms are enabled in configuration");
    } else {
        info!("Created {} publisher(s)", publishers.len());
    }

    publishers
}
