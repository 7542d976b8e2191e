//! Content and media generation contracts
//!
//! The engine never calls a text or media provider directly. It consumes
//! these narrow traits and works with [`GeneratedContent`], the decoded form
//! of a provider's platform-keyed JSON output. Implementations live with the
//! caller; tests substitute their own.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::warn;

use crate::error::GeneratorError;
use crate::types::{MediaReference, PlatformId};

/// Provider output decoded into per-platform texts plus media prompts.
///
/// The provider answers with one JSON object whose keys are platform names
/// (`"facebook"`, `"tiktok"`, ...) plus optional `image_prompt` and
/// `video_prompt` entries. Unknown keys are ignored with a warning; an
/// object naming no known platform is a malformed response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedContent {
    /// Tailored text per platform
    pub posts: HashMap<PlatformId, String>,
    /// Prompt for the image provider, when the content calls for an image
    pub image_prompt: Option<String>,
    /// Prompt for the video provider, when the content calls for a video
    pub video_prompt: Option<String>,
}

impl GeneratedContent {
    /// Decode a provider's raw JSON answer.
    pub fn from_provider_json(raw: &str) -> Result<Self, GeneratorError> {
        let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| {
            GeneratorError::MalformedResponse(format!("Provider output is not valid JSON: {}", e))
        })?;
        let object = value.as_object().ok_or_else(|| {
            GeneratorError::MalformedResponse("Provider output is not a JSON object".to_string())
        })?;

        let mut content = GeneratedContent::default();
        for (key, value) in object {
            let text = match value.as_str() {
                Some(text) => text,
                None => {
                    warn!("Ignoring non-string value for key '{}'", key);
                    continue;
                }
            };

            match key.as_str() {
                // Prompt keys kept under both their generic and their
                // provider-specific historical names
                "image_prompt" | "dalle_prompt" => content.image_prompt = Some(text.to_string()),
                "video_prompt" | "sora_prompt" => content.video_prompt = Some(text.to_string()),
                other => match other.parse::<PlatformId>() {
                    Ok(platform) => {
                        content.posts.insert(platform, text.to_string());
                    }
                    Err(_) => {
                        warn!("Ignoring unknown platform in generated content: {}", other);
                    }
                },
            }
        }

        if content.posts.is_empty() {
            return Err(GeneratorError::MalformedResponse(
                "Provider output named no known platform".to_string(),
            ));
        }
        Ok(content)
    }
}

/// Turns one user message into per-platform content
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, message: &str) -> Result<GeneratedContent, GeneratorError>;
}

/// Produces media from the prompts carried in [`GeneratedContent`]
#[async_trait]
pub trait MediaGenerator: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<MediaReference, GeneratorError>;
    async fn generate_video(&self, prompt: &str) -> Result<MediaReference, GeneratorError>;
}
