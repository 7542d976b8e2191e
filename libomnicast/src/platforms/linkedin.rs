//! LinkedIn platform implementation
//!
//! Publishes a UGC share through the LinkedIn REST API. Text-only content is
//! a single call; content with media runs a three-step flow: register an
//! upload session, PUT the image bytes to the returned upload URL, then
//! create the share referencing the registered asset. Any step failing
//! aborts the remaining steps.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::PublishError;
use crate::http::{HttpRequest, HttpTransport};
use crate::media::MediaStore;
use crate::platforms::Publisher;
use crate::types::{PlatformId, PublicationContent, PublishResult};

const API_BASE_URL: &str = "https://api.linkedin.com/v2";
const UPLOAD_MECHANISM: &str = "com.linkedin.digitalmedia.uploading.MediaUploadHttpRequest";

/// LinkedIn member profile publisher
pub struct LinkedinPublisher {
    profile_id: String,
    access_token: String,
    transport: Arc<dyn HttpTransport>,
    media_store: Arc<dyn MediaStore>,
}

/// Upload slot handed out by asset registration; lives for one publish only.
struct RegisteredUpload {
    upload_url: String,
    asset: String,
}

impl LinkedinPublisher {
    pub fn new(
        profile_id: impl Into<String>,
        access_token: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        media_store: Arc<dyn MediaStore>,
    ) -> Self {
        Self {
            profile_id: profile_id.into(),
            access_token: access_token.into(),
            transport,
            media_store,
        }
    }

    fn person_urn(&self) -> String {
        format!("urn:li:person:{}", self.profile_id)
    }

    async fn try_publish(
        &self,
        content: &PublicationContent,
    ) -> Result<Option<String>, PublishError> {
        match content.media_url.as_deref() {
            Some(location) => {
                let upload = self.register_upload().await?;
                debug!(asset = %upload.asset, "Upload slot registered");

                let image = self.media_store.read(location).await?;
                self.upload_image(&upload.upload_url, image).await?;
                self.create_share(&content.text, Some(&upload.asset)).await
            }
            None => self.create_share(&content.text, None).await,
        }
    }

    /// Step 1 of the media flow: register a feed-share image upload
    async fn register_upload(&self) -> Result<RegisteredUpload, PublishError> {
        let url = format!("{}/assets?action=registerUpload", API_BASE_URL);
        let request = HttpRequest::post(url)
            .bearer(&self.access_token)
            .json(json!({
                "registerUploadRequest": {
                    "recipes": ["urn:li:digitalmediaRecipe:feedshare-image"],
                    "owner": self.person_urn(),
                    "serviceRelationships": [{
                        "relationshipType": "OWNER",
                        "identifier": "urn:li:userGeneratedContent"
                    }]
                }
            }));

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(PublishError::Transport(format!(
                "LinkedIn upload registration returned {}: {}",
                response.status,
                response.text()
            )));
        }

        let body: serde_json::Value = response.json()?;
        let upload_url = body["value"]["uploadMechanism"][UPLOAD_MECHANISM]["uploadUrl"]
            .as_str()
            .ok_or_else(|| {
                PublishError::Protocol("Upload registration carried no uploadUrl".to_string())
            })?
            .to_string();
        let asset = body["value"]["asset"]
            .as_str()
            .ok_or_else(|| {
                PublishError::Protocol("Upload registration carried no asset".to_string())
            })?
            .to_string();

        Ok(RegisteredUpload { upload_url, asset })
    }

    /// Step 2 of the media flow: PUT the raw image bytes to the upload URL
    async fn upload_image(&self, upload_url: &str, image: Vec<u8>) -> Result<(), PublishError> {
        let request = HttpRequest::put(upload_url)
            .bearer(&self.access_token)
            .header("Content-Type", "application/octet-stream")
            .bytes(image);

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(PublishError::Transport(format!(
                "LinkedIn image upload returned {}: {}",
                response.status,
                response.text()
            )));
        }
        Ok(())
    }

    /// Create the share itself, referencing the uploaded asset when present
    async fn create_share(
        &self,
        text: &str,
        asset: Option<&str>,
    ) -> Result<Option<String>, PublishError> {
        let category = if asset.is_some() { "IMAGE" } else { "NONE" };
        let mut share_content = json!({
            "shareCommentary": { "text": text },
            "shareMediaCategory": category,
        });
        if let Some(asset) = asset {
            share_content["media"] = json!([{ "status": "READY", "media": asset }]);
        }

        let payload = json!({
            "author": self.person_urn(),
            "lifecycleState": "PUBLISHED",
            "specificContent": { "com.linkedin.ugc.ShareContent": share_content },
            "visibility": { "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC" }
        });
        let request = HttpRequest::post(format!("{}/ugcPosts", API_BASE_URL))
            .bearer(&self.access_token)
            .json(payload);

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(PublishError::Transport(format!(
                "LinkedIn API returned {}: {}",
                response.status,
                response.text()
            )));
        }

        // Share id normally lives in the body; the x-restli-id header is the fallback
        let share_id = response
            .json::<serde_json::Value>()
            .ok()
            .and_then(|body| body["id"].as_str().map(String::from))
            .or_else(|| response.header("x-restli-id").map(String::from));
        Ok(share_id.map(|id| format!("https://www.linkedin.com/feed/update/{}", id)))
    }
}

#[async_trait]
impl Publisher for LinkedinPublisher {
    fn platform(&self) -> PlatformId {
        PlatformId::Linkedin
    }

    async fn publish(&self, content: &PublicationContent) -> PublishResult {
        info!(profile_id = %self.profile_id, "Publishing to LinkedIn");
        match self.try_publish(content).await {
            Ok(url) => PublishResult::ok(PlatformId::Linkedin, url),
            Err(e) => {
                warn!(error = %e, "LinkedIn publication failed");
                PublishResult::failed(PlatformId::Linkedin, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpBody, HttpMethod, ScriptedTransport};
    use serde_json::json;

    struct StaticMediaStore {
        bytes: Vec<u8>,
        reads: std::sync::Mutex<Vec<String>>,
    }

    impl StaticMediaStore {
        fn new(bytes: &[u8]) -> Arc<Self> {
            Arc::new(Self {
                bytes: bytes.to_vec(),
                reads: std::sync::Mutex::new(Vec::new()),
            })
        }

        fn read_count(&self) -> usize {
            self.reads.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl MediaStore for StaticMediaStore {
        async fn read(&self, location: &str) -> Result<Vec<u8>, PublishError> {
            self.reads.lock().unwrap().push(location.to_string());
            Ok(self.bytes.clone())
        }
    }

    fn publisher(
        transport: Arc<ScriptedTransport>,
        media_store: Arc<StaticMediaStore>,
    ) -> LinkedinPublisher {
        LinkedinPublisher::new("profile-1", "li-token", transport, media_store)
    }

    fn register_upload_ok() -> serde_json::Value {
        json!({
            "value": {
                "uploadMechanism": {
                    "com.linkedin.digitalmedia.uploading.MediaUploadHttpRequest": {
                        "uploadUrl": "https://upload.linkedin.example/slot-1"
                    }
                },
                "asset": "urn:li:digitalmediaAsset:123"
            }
        })
    }

    #[tokio::test]
    async fn test_text_only_share_is_single_call() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(201, json!({ "id": "share:123" }));

        let media_store = StaticMediaStore::new(b"unused");
        let content = PublicationContent::new(PlatformId::Linkedin, "Hello LinkedIn", None);
        let result = publisher(transport.clone(), media_store.clone())
            .publish(&content)
            .await;

        assert!(result.success);
        assert_eq!(
            result.url,
            Some("https://www.linkedin.com/feed/update/share:123".to_string())
        );
        assert_eq!(media_store.read_count(), 0);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].url.ends_with("/ugcPosts"));
        match &requests[0].body {
            Some(HttpBody::Json(body)) => {
                assert_eq!(body["author"], "urn:li:person:profile-1");
                assert_eq!(body["lifecycleState"], "PUBLISHED");
                let share = &body["specificContent"]["com.linkedin.ugc.ShareContent"];
                assert_eq!(share["shareCommentary"]["text"], "Hello LinkedIn");
                assert_eq!(share["shareMediaCategory"], "NONE");
                assert_eq!(
                    body["visibility"]["com.linkedin.ugc.MemberNetworkVisibility"],
                    "PUBLIC"
                );
            }
            other => panic!("Expected JSON body, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_share_id_from_restli_header_when_body_empty() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_with_headers(
            201,
            vec![("x-restli-id".to_string(), "urn:li:share:999".to_string())],
            "",
        );

        let media_store = StaticMediaStore::new(b"unused");
        let content = PublicationContent::new(PlatformId::Linkedin, "Hello", None);
        let result = publisher(transport, media_store).publish(&content).await;

        assert!(result.success);
        assert_eq!(
            result.url,
            Some("https://www.linkedin.com/feed/update/urn:li:share:999".to_string())
        );
    }

    #[tokio::test]
    async fn test_media_share_runs_three_steps() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, register_upload_ok());
        transport.push_status(201, "");
        transport.push_json(201, json!({ "id": "share:999" }));

        let media_store = StaticMediaStore::new(b"fake-image");
        let content = PublicationContent::new(
            PlatformId::Linkedin,
            "With a photo",
            Some("/tmp/img.png".to_string()),
        );
        let result = publisher(transport.clone(), media_store.clone())
            .publish(&content)
            .await;

        assert!(result.success);
        assert_eq!(media_store.read_count(), 1);

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);

        assert!(requests[0].url.contains("/assets?action=registerUpload"));
        match &requests[0].body {
            Some(HttpBody::Json(body)) => {
                assert_eq!(
                    body["registerUploadRequest"]["recipes"][0],
                    "urn:li:digitalmediaRecipe:feedshare-image"
                );
                assert_eq!(
                    body["registerUploadRequest"]["owner"],
                    "urn:li:person:profile-1"
                );
            }
            other => panic!("Expected JSON body, got {:?}", other),
        }

        assert_eq!(requests[1].method, HttpMethod::Put);
        assert_eq!(requests[1].url, "https://upload.linkedin.example/slot-1");
        assert_eq!(
            requests[1].header_value("content-type"),
            Some("application/octet-stream")
        );
        match &requests[1].body {
            Some(HttpBody::Bytes(bytes)) => assert_eq!(bytes, b"fake-image"),
            other => panic!("Expected bytes body, got {:?}", other),
        }

        match &requests[2].body {
            Some(HttpBody::Json(body)) => {
                let share = &body["specificContent"]["com.linkedin.ugc.ShareContent"];
                assert_eq!(share["shareMediaCategory"], "IMAGE");
                assert_eq!(share["media"][0]["status"], "READY");
                assert_eq!(share["media"][0]["media"], "urn:li:digitalmediaAsset:123");
            }
            other => panic!("Expected JSON body, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_registration_without_upload_url_aborts() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, json!({ "value": { "asset": "urn:li:digitalmediaAsset:123" } }));

        let media_store = StaticMediaStore::new(b"fake-image");
        let content = PublicationContent::new(
            PlatformId::Linkedin,
            "With a photo",
            Some("/tmp/img.png".to_string()),
        );
        let result = publisher(transport.clone(), media_store.clone())
            .publish(&content)
            .await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("uploadUrl"));
        // Registration failed, nothing was read or uploaded
        assert_eq!(transport.request_count(), 1);
        assert_eq!(media_store.read_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_failure_skips_share_creation() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, register_upload_ok());
        transport.push_status(500, "storage unavailable");

        let media_store = StaticMediaStore::new(b"fake-image");
        let content = PublicationContent::new(
            PlatformId::Linkedin,
            "With a photo",
            Some("/tmp/img.png".to_string()),
        );
        let result = publisher(transport.clone(), media_store)
            .publish(&content)
            .await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("500"));
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_api_error_captured_in_result() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(401, json!({ "message": "Expired token" }));

        let media_store = StaticMediaStore::new(b"unused");
        let content = PublicationContent::new(PlatformId::Linkedin, "Hello", None);
        let result = publisher(transport, media_store).publish(&content).await;

        assert!(!result.success);
        let error = result.error.unwrap();
        assert!(error.contains("401"));
        assert!(error.contains("Expired token"));
    }
}
