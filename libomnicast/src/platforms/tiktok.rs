//! TikTok platform implementation
//!
//! Publishes a video through the TikTok Content Posting API: initialise an
//! upload session, PUT the raw bytes to the pre-signed upload URL, then poll
//! the publish status until a terminal state. Every call to the API host
//! carries the current access token; a 401 triggers exactly one
//! refresh-token exchange and one retry of the original call. The pre-signed
//! upload endpoint is a storage host, not the API, and gets no bearer token.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::PublishError;
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::media::MediaStore;
use crate::platforms::Publisher;
use crate::poll::{Poll, PollOutcome, PollPolicy};
use crate::types::{PlatformId, PublicationContent, PublishResult};

const API_BASE_URL: &str = "https://open.tiktokapis.com/v2";
const STATUS_COMPLETE: &str = "PUBLISH_COMPLETE";
const STATUS_FAILED: &str = "FAILED";

/// In-memory OAuth credential pair.
///
/// Shared by every publish call made through the same publisher instance and
/// swapped in place by the refresh exchange. Nothing is persisted.
#[derive(Debug, Clone)]
pub struct TokenStore {
    pub access_token: String,
    pub refresh_token: String,
}

/// Upload session handed out by the init call; lives for one publish only.
struct UploadSession {
    publish_id: String,
    upload_url: String,
}

/// TikTok account publisher
pub struct TiktokPublisher {
    client_key: String,
    client_secret: String,
    tokens: Mutex<TokenStore>,
    transport: Arc<dyn HttpTransport>,
    media_store: Arc<dyn MediaStore>,
    poll: PollPolicy,
}

impl TiktokPublisher {
    /// Processing status is checked up to 10 times, 5 seconds apart.
    pub const DEFAULT_POLL: PollPolicy = PollPolicy::new(10, Duration::from_millis(5000));

    pub fn new(
        client_key: impl Into<String>,
        client_secret: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        media_store: Arc<dyn MediaStore>,
    ) -> Self {
        Self {
            client_key: client_key.into(),
            client_secret: client_secret.into(),
            tokens: Mutex::new(TokenStore {
                access_token: access_token.into(),
                refresh_token: refresh_token.into(),
            }),
            transport,
            media_store,
            poll: Self::DEFAULT_POLL,
        }
    }

    /// Override the polling budget (tests use a zero delay)
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Current credential pair, cloned out of the store
    pub async fn tokens(&self) -> TokenStore {
        self.tokens.lock().await.clone()
    }

    async fn try_publish(
        &self,
        content: &PublicationContent,
    ) -> Result<Option<String>, PublishError> {
        let location = content.media_url.as_deref().ok_or_else(|| {
            PublishError::Validation("TikTok requires a video reference".to_string())
        })?;

        let video = self.media_store.read(location).await?;
        if video.is_empty() {
            return Err(PublishError::Validation(format!(
                "Video reference {} resolved to zero bytes",
                location
            )));
        }

        let session = self.init_upload(&content.text, video.len()).await?;
        debug!(publish_id = %session.publish_id, "Upload session opened");

        self.upload_video(&session.upload_url, video).await?;
        let post_id = self.await_processing(&session.publish_id).await?;

        Ok(Some(format!("https://www.tiktok.com/video/{}", post_id)))
    }

    /// Step 1: register the upload intent. The whole video goes up as a
    /// single chunk; the post stays self-only with duets, comments and
    /// stitching disabled.
    async fn init_upload(
        &self,
        title: &str,
        video_size: usize,
    ) -> Result<UploadSession, PublishError> {
        let request = HttpRequest::post(format!("{}/post/publish/video/init/", API_BASE_URL))
            .json(json!({
                "post_info": {
                    "title": title,
                    "privacy_level": "SELF_ONLY",
                    "disable_duet": true,
                    "disable_comment": true,
                    "disable_stitch": true,
                    "video_cover_timestamp_ms": 1000,
                },
                "source_info": {
                    "source": "FILE_UPLOAD",
                    "video_size": video_size,
                    "chunk_size": video_size,
                    "total_chunk_count": 1,
                }
            }));

        let response = self.api_call(request).await?;
        if !response.is_success() {
            return Err(PublishError::Transport(format!(
                "TikTok init returned {}: {}",
                response.status,
                response.text()
            )));
        }

        let body: serde_json::Value = response.json()?;
        let error_code = body["error"]["code"].as_str().unwrap_or("ok");
        if error_code != "ok" {
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("TikTok rejected the upload initialisation");
            return Err(PublishError::Protocol(format!(
                "{} (code: {})",
                message, error_code
            )));
        }

        let publish_id = body["data"]["publish_id"]
            .as_str()
            .ok_or_else(|| {
                PublishError::Protocol("Init response carried no publish_id".to_string())
            })?
            .to_string();
        let upload_url = body["data"]["upload_url"]
            .as_str()
            .ok_or_else(|| {
                PublishError::Protocol("Init response carried no upload_url".to_string())
            })?
            .to_string();

        Ok(UploadSession {
            publish_id,
            upload_url,
        })
    }

    /// Step 2: PUT the raw bytes to the pre-signed storage URL. No bearer
    /// token here, the URL itself authorizes the upload.
    async fn upload_video(&self, upload_url: &str, video: Vec<u8>) -> Result<(), PublishError> {
        let size = video.len();
        let request = HttpRequest::put(upload_url)
            .header("Content-Type", "video/mp4")
            .header("Content-Length", size.to_string())
            .header("Content-Range", format!("bytes 0-{}/{}", size - 1, size))
            .bytes(video);

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(PublishError::Transport(format!(
                "TikTok upload returned {}: {}",
                response.status,
                response.text()
            )));
        }
        Ok(())
    }

    /// Step 3: poll the publish status until `PUBLISH_COMPLETE` or `FAILED`.
    /// Exhausting the budget without a terminal status is a timeout.
    async fn await_processing(&self, publish_id: &str) -> Result<String, PublishError> {
        let outcome = self
            .poll
            .run(move |attempt| async move {
                let body = self.fetch_status(publish_id).await?;
                let status = body["data"]["status"].as_str().unwrap_or("UNKNOWN").to_string();
                debug!(attempt, publish_id = %publish_id, status = %status, "Publish status");

                match status.as_str() {
                    STATUS_COMPLETE => Ok(Poll::Ready(extract_post_id(&body))),
                    STATUS_FAILED => {
                        let reason = body["data"]["fail_reason"].as_str().unwrap_or("unspecified");
                        Err(PublishError::Protocol(format!(
                            "TikTok reported a failed publication: {}",
                            reason
                        )))
                    }
                    _ => Ok(Poll::Pending(status)),
                }
            })
            .await?;

        match outcome {
            PollOutcome::Completed(post_id) => Ok(post_id),
            PollOutcome::Exhausted { last } => Err(PublishError::Timeout(format!(
                "TikTok processing did not finish after {} attempts (last status: {})",
                self.poll.max_attempts, last
            ))),
        }
    }

    async fn fetch_status(&self, publish_id: &str) -> Result<serde_json::Value, PublishError> {
        let request = HttpRequest::post(format!("{}/post/publish/status/fetch/", API_BASE_URL))
            .json(json!({ "publish_id": publish_id }));

        let response = self.api_call(request).await?;
        if !response.is_success() {
            return Err(PublishError::Transport(format!(
                "TikTok status fetch returned {}: {}",
                response.status,
                response.text()
            )));
        }
        response.json()
    }

    /// Execute one API-host call with the current access token. A 401
    /// triggers one refresh exchange and one retry of the original request;
    /// a second 401 escalates, never a second refresh.
    async fn api_call(&self, request: HttpRequest) -> Result<HttpResponse, PublishError> {
        let access_token = self.tokens.lock().await.access_token.clone();
        let response = self
            .transport
            .execute(request.clone().bearer(&access_token))
            .await?;
        if response.status != 401 {
            return Ok(response);
        }

        info!("TikTok access token rejected, refreshing credentials");
        self.refresh_tokens().await?;

        let access_token = self.tokens.lock().await.access_token.clone();
        let response = self.transport.execute(request.bearer(&access_token)).await?;
        if response.status == 401 {
            return Err(PublishError::Authorization(
                "TikTok rejected the refreshed access token".to_string(),
            ));
        }
        Ok(response)
    }

    /// Exchange the refresh token for a new credential pair and swap it into
    /// the store. The token endpoint itself takes no bearer header.
    async fn refresh_tokens(&self) -> Result<(), PublishError> {
        let refresh_token = self.tokens.lock().await.refresh_token.clone();
        let request = HttpRequest::post(format!("{}/oauth/token/", API_BASE_URL)).form(vec![
            ("client_key".to_string(), self.client_key.clone()),
            ("client_secret".to_string(), self.client_secret.clone()),
            ("grant_type".to_string(), "refresh_token".to_string()),
            ("refresh_token".to_string(), refresh_token),
        ]);

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(PublishError::Authorization(format!(
                "Token refresh failed with status {}: {}",
                response.status,
                response.text()
            )));
        }

        let body: serde_json::Value = response.json().map_err(|_| {
            PublishError::Authorization("Token refresh response was not valid JSON".to_string())
        })?;
        let access_token = body["access_token"].as_str().ok_or_else(|| {
            PublishError::Authorization(
                "Token refresh response carried no access_token".to_string(),
            )
        })?;

        // TODO: persist the refreshed pair so a restart does not reuse the stale tokens
        let mut tokens = self.tokens.lock().await;
        tokens.access_token = access_token.to_string();
        if let Some(refresh_token) = body["refresh_token"].as_str() {
            tokens.refresh_token = refresh_token.to_string();
        }
        debug!("TikTok credentials refreshed");
        Ok(())
    }
}

/// First entry of the published post id list, tolerating both string and
/// numeric ids, with a sentinel when the platform returns none.
fn extract_post_id(body: &serde_json::Value) -> String {
    match &body["data"]["publicly_available_post_id"][0] {
        serde_json::Value::String(id) => id.clone(),
        serde_json::Value::Number(id) => id.to_string(),
        _ => "unknown".to_string(),
    }
}

#[async_trait]
impl Publisher for TiktokPublisher {
    fn platform(&self) -> PlatformId {
        PlatformId::Tiktok
    }

    async fn publish(&self, content: &PublicationContent) -> PublishResult {
        info!("Publishing to TikTok");
        match self.try_publish(content).await {
            Ok(url) => PublishResult::ok(PlatformId::Tiktok, url),
            Err(e) => {
                warn!(error = %e, "TikTok publication failed");
                PublishResult::failed(PlatformId::Tiktok, e.to_string())
            }
        }
    }
}
