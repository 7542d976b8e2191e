//! End-to-end publishing pipeline
//!
//! Wires the generation seams to the orchestrator: one user message goes in,
//! the content generator produces per-platform texts and media prompts, the
//! media generator turns prompts into references, and the orchestrator
//! publishes everything concurrently. Generation failures abort the run
//! before any platform is touched; platform failures never abort the run.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{OmnicastError, Result};
use crate::generator::{ContentGenerator, MediaGenerator};
use crate::orchestrator::{assemble_contents, PublishOrchestrator};
use crate::types::PublishResult;

/// Message-to-publications pipeline
pub struct PublishingService {
    generator: Arc<dyn ContentGenerator>,
    media: Arc<dyn MediaGenerator>,
    orchestrator: PublishOrchestrator,
}

impl PublishingService {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        media: Arc<dyn MediaGenerator>,
        orchestrator: PublishOrchestrator,
    ) -> Self {
        Self {
            generator,
            media,
            orchestrator,
        }
    }

    /// Run the full pipeline for one message.
    ///
    /// Returns one [`PublishResult`] per platform the generator produced
    /// content for (and that has a registered publisher). Errors out before
    /// dispatch when the message is empty or any generation step fails.
    pub async fn publish_message(&self, message: &str) -> Result<Vec<PublishResult>> {
        if message.trim().is_empty() {
            return Err(OmnicastError::InvalidInput(
                "Message cannot be empty".to_string(),
            ));
        }

        info!("Generating platform content");
        let generated = self.generator.generate(message).await?;
        debug!(platforms = generated.posts.len(), "Generator answered");

        let image = match &generated.image_prompt {
            Some(prompt) => {
                info!("Generating image");
                Some(self.media.generate_image(prompt).await?)
            }
            None => None,
        };
        let video = match &generated.video_prompt {
            Some(prompt) => {
                info!("Generating video");
                Some(self.media.generate_video(prompt).await?)
            }
            None => None,
        };

        let contents = assemble_contents(&generated, image.as_ref(), video.as_ref());
        info!("Publishing to {} platform(s)", contents.len());
        Ok(self.orchestrator.publish_all(&contents).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeneratorError;
    use crate::generator::GeneratedContent;
    use crate::platforms::mock::MockPublisher;
    use crate::platforms::Publisher;
    use crate::registry::PublisherRegistry;
    use crate::types::{MediaReference, PlatformId};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct StubGenerator {
        content: GeneratedContent,
        calls: Arc<Mutex<usize>>,
    }

    impl StubGenerator {
        fn new(content: GeneratedContent) -> Arc<Self> {
            Arc::new(Self {
                content,
                calls: Arc::new(Mutex::new(0)),
            })
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ContentGenerator for StubGenerator {
        async fn generate(
            &self,
            _message: &str,
        ) -> std::result::Result<GeneratedContent, GeneratorError> {
            *self.calls.lock().unwrap() += 1;
            Ok(self.content.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl ContentGenerator for FailingGenerator {
        async fn generate(
            &self,
            _message: &str,
        ) -> std::result::Result<GeneratedContent, GeneratorError> {
            Err(GeneratorError::Provider("model unavailable".to_string()))
        }
    }

    struct StubMedia {
        image: Option<MediaReference>,
        video: Option<MediaReference>,
        image_prompts: Arc<Mutex<Vec<String>>>,
        video_prompts: Arc<Mutex<Vec<String>>>,
    }

    impl StubMedia {
        fn new(image: Option<MediaReference>, video: Option<MediaReference>) -> Arc<Self> {
            Arc::new(Self {
                image,
                video,
                image_prompts: Arc::new(Mutex::new(Vec::new())),
                video_prompts: Arc::new(Mutex::new(Vec::new())),
            })
        }

        fn image_prompts(&self) -> Vec<String> {
            self.image_prompts.lock().unwrap().clone()
        }

        fn video_prompts(&self) -> Vec<String> {
            self.video_prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MediaGenerator for StubMedia {
        async fn generate_image(
            &self,
            prompt: &str,
        ) -> std::result::Result<MediaReference, GeneratorError> {
            self.image_prompts.lock().unwrap().push(prompt.to_string());
            self.image
                .clone()
                .ok_or_else(|| GeneratorError::Provider("image provider down".to_string()))
        }

        async fn generate_video(
            &self,
            prompt: &str,
        ) -> std::result::Result<MediaReference, GeneratorError> {
            self.video_prompts.lock().unwrap().push(prompt.to_string());
            self.video
                .clone()
                .ok_or_else(|| GeneratorError::Provider("video provider down".to_string()))
        }
    }

    fn posts_for(platforms: &[PlatformId]) -> HashMap<PlatformId, String> {
        platforms
            .iter()
            .map(|&p| (p, format!("Post for {}", p)))
            .collect()
    }

    fn service_with(
        generator: Arc<dyn ContentGenerator>,
        media: Arc<dyn MediaGenerator>,
        publishers: Vec<Arc<dyn Publisher>>,
    ) -> PublishingService {
        let registry = PublisherRegistry::partial(publishers).unwrap();
        PublishingService::new(generator, media, PublishOrchestrator::new(registry))
    }

    #[tokio::test]
    async fn test_pipeline_publishes_generated_content() {
        let generator = StubGenerator::new(GeneratedContent {
            posts: posts_for(&[PlatformId::Facebook, PlatformId::Whatsapp]),
            image_prompt: None,
            video_prompt: None,
        });
        let media = StubMedia::new(None, None);
        let facebook = Arc::new(MockPublisher::success(PlatformId::Facebook));
        let whatsapp = Arc::new(MockPublisher::success(PlatformId::Whatsapp));

        let service = service_with(
            generator.clone(),
            media.clone(),
            vec![facebook.clone(), whatsapp.clone()],
        );
        let results = service.publish_message("Launch day!").await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.success));
        assert_eq!(generator.call_count(), 1);
        assert_eq!(facebook.call_count(), 1);
        assert_eq!(whatsapp.call_count(), 1);
        // No prompts, so the media generator is never consulted
        assert!(media.image_prompts().is_empty());
        assert!(media.video_prompts().is_empty());
    }

    #[tokio::test]
    async fn test_image_prompt_feeds_the_image_into_content() {
        let generator = StubGenerator::new(GeneratedContent {
            posts: posts_for(&[PlatformId::Facebook]),
            image_prompt: Some("a lighthouse at dawn".to_string()),
            video_prompt: None,
        });
        let media = StubMedia::new(
            Some(MediaReference {
                local_path: None,
                public_url: Some("https://cdn.example/img.png".to_string()),
            }),
            None,
        );
        let facebook = Arc::new(MockPublisher::success(PlatformId::Facebook));

        let service = service_with(generator, media.clone(), vec![facebook.clone()]);
        let results = service.publish_message("Launch day!").await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(media.image_prompts(), vec!["a lighthouse at dawn"]);

        let published = facebook.published();
        assert_eq!(published.len(), 1);
        assert_eq!(
            published[0].media_url,
            Some("https://cdn.example/img.png".to_string())
        );
    }

    #[tokio::test]
    async fn test_generator_failure_aborts_before_dispatch() {
        let media = StubMedia::new(None, None);
        let facebook = Arc::new(MockPublisher::success(PlatformId::Facebook));

        let service = service_with(Arc::new(FailingGenerator), media, vec![facebook.clone()]);
        let err = service.publish_message("Launch day!").await.unwrap_err();

        assert!(matches!(err, OmnicastError::Generator(_)));
        assert_eq!(facebook.call_count(), 0);
    }

    #[tokio::test]
    async fn test_media_failure_aborts_before_dispatch() {
        let generator = StubGenerator::new(GeneratedContent {
            posts: posts_for(&[PlatformId::Facebook]),
            image_prompt: Some("a lighthouse".to_string()),
            video_prompt: None,
        });
        // No image configured, so the prompt hits a provider error
        let media = StubMedia::new(None, None);
        let facebook = Arc::new(MockPublisher::success(PlatformId::Facebook));

        let service = service_with(generator, media, vec![facebook.clone()]);
        let err = service.publish_message("Launch day!").await.unwrap_err();

        assert!(matches!(err, OmnicastError::Generator(_)));
        assert_eq!(facebook.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let generator = StubGenerator::new(GeneratedContent::default());
        let media = StubMedia::new(None, None);

        let service = service_with(generator.clone(), media, Vec::new());
        let err = service.publish_message("   ").await.unwrap_err();

        assert!(matches!(err, OmnicastError::InvalidInput(_)));
        assert_eq!(generator.call_count(), 0);
    }
}
