//! Core types for Omnicast

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of platforms Omnicast can publish to.
///
/// Used as the join key between generated content, registered publishers,
/// and publication results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformId {
    Facebook,
    Instagram,
    Linkedin,
    Tiktok,
    Whatsapp,
}

impl PlatformId {
    /// Every platform, in canonical order.
    pub const ALL: [PlatformId; 5] = [
        PlatformId::Facebook,
        PlatformId::Instagram,
        PlatformId::Linkedin,
        PlatformId::Tiktok,
        PlatformId::Whatsapp,
    ];

    /// Get the wire-format name for this platform
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformId::Facebook => "facebook",
            PlatformId::Instagram => "instagram",
            PlatformId::Linkedin => "linkedin",
            PlatformId::Tiktok => "tiktok",
            PlatformId::Whatsapp => "whatsapp",
        }
    }
}

impl FromStr for PlatformId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "facebook" => Ok(PlatformId::Facebook),
            "instagram" => Ok(PlatformId::Instagram),
            "linkedin" => Ok(PlatformId::Linkedin),
            "tiktok" => Ok(PlatformId::Tiktok),
            "whatsapp" => Ok(PlatformId::Whatsapp),
            _ => Err(format!(
                "Unknown platform: '{}'. Valid options: facebook, instagram, linkedin, tiktok, whatsapp",
                s
            )),
        }
    }
}

impl std::fmt::Display for PlatformId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One platform's share of a generation run.
///
/// Produced once per platform per run, then consumed exactly once by the
/// matching publisher. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationContent {
    pub platform: PlatformId,
    pub text: String,
    /// Location of the media the publisher should attach, if any. Either a
    /// publicly reachable URL (platforms that fetch media themselves) or a
    /// local path (platforms that receive raw bytes).
    pub media_url: Option<String>,
}

impl PublicationContent {
    pub fn new(platform: PlatformId, text: impl Into<String>, media_url: Option<String>) -> Self {
        Self {
            platform,
            text: text.into(),
            media_url,
        }
    }
}

/// Terminal record of one publication attempt.
///
/// Exactly one is produced per dispatched platform; never mutated after
/// creation. Failure lives in `error`, never as a propagated error value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResult {
    pub platform: PlatformId,
    pub success: bool,
    /// Public permalink of the published post, when the platform exposes one.
    pub url: Option<String>,
    pub error: Option<String>,
}

impl PublishResult {
    /// Successful attempt, with the permalink if the platform returned one.
    pub fn ok(platform: PlatformId, url: Option<String>) -> Self {
        Self {
            platform,
            success: true,
            url,
            error: None,
        }
    }

    /// Failed attempt with a human-readable reason.
    pub fn failed(platform: PlatformId, error: impl Into<String>) -> Self {
        Self {
            platform,
            success: false,
            url: None,
            error: Some(error.into()),
        }
    }
}

/// Where a piece of generated media lives.
///
/// Produced by the media-generation collaborator; read-only to publishers.
/// A reference may carry a local path, a public URL, or both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaReference {
    pub local_path: Option<String>,
    pub public_url: Option<String>,
}

impl MediaReference {
    /// Build a reference from a single location string. Anything that looks
    /// like an HTTP(S) URL is treated as public; everything else as a local
    /// filesystem path.
    pub fn from_location(location: impl Into<String>) -> Self {
        let location = location.into();
        if location.starts_with("http://") || location.starts_with("https://") {
            Self {
                local_path: None,
                public_url: Some(location),
            }
        } else {
            Self {
                local_path: Some(location),
                public_url: None,
            }
        }
    }

    /// Location to read raw bytes from, for platforms that take an upload.
    /// Prefers the local copy; a public URL still works since the byte store
    /// can fetch it.
    pub fn upload_source(&self) -> Option<&str> {
        self.local_path.as_deref().or(self.public_url.as_deref())
    }

    /// Publicly reachable URL, for platforms that fetch media themselves.
    /// A local path is useless to those platforms, so there is no fallback.
    pub fn link_source(&self) -> Option<&str> {
        self.public_url.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_id_from_str() {
        assert_eq!("facebook".parse::<PlatformId>().unwrap(), PlatformId::Facebook);
        assert_eq!("instagram".parse::<PlatformId>().unwrap(), PlatformId::Instagram);
        assert_eq!("linkedin".parse::<PlatformId>().unwrap(), PlatformId::Linkedin);
        assert_eq!("tiktok".parse::<PlatformId>().unwrap(), PlatformId::Tiktok);
        assert_eq!("whatsapp".parse::<PlatformId>().unwrap(), PlatformId::Whatsapp);

        // Case insensitive
        assert_eq!("Facebook".parse::<PlatformId>().unwrap(), PlatformId::Facebook);
        assert_eq!("TIKTOK".parse::<PlatformId>().unwrap(), PlatformId::Tiktok);
    }

    #[test]
    fn test_platform_id_from_str_invalid() {
        let result = "myspace".parse::<PlatformId>();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Unknown platform: 'myspace'"));
    }

    #[test]
    fn test_platform_id_display_matches_wire_name() {
        assert_eq!(PlatformId::Facebook.to_string(), "facebook");
        assert_eq!(PlatformId::Instagram.to_string(), "instagram");
        assert_eq!(PlatformId::Linkedin.to_string(), "linkedin");
        assert_eq!(PlatformId::Tiktok.to_string(), "tiktok");
        assert_eq!(PlatformId::Whatsapp.to_string(), "whatsapp");
    }

    #[test]
    fn test_platform_id_serde_lowercase() {
        let json = serde_json::to_string(&PlatformId::Linkedin).unwrap();
        assert_eq!(json, r#""linkedin""#);

        let parsed: PlatformId = serde_json::from_str(r#""tiktok""#).unwrap();
        assert_eq!(parsed, PlatformId::Tiktok);
    }

    #[test]
    fn test_platform_id_all_covers_every_variant() {
        assert_eq!(PlatformId::ALL.len(), 5);
        for platform in PlatformId::ALL {
            // Round-trips through the wire name
            assert_eq!(platform.as_str().parse::<PlatformId>().unwrap(), platform);
        }
    }

    #[test]
    fn test_publication_content_new() {
        let content = PublicationContent::new(
            PlatformId::Facebook,
            "Hello world",
            Some("https://example.com/image.png".to_string()),
        );

        assert_eq!(content.platform, PlatformId::Facebook);
        assert_eq!(content.text, "Hello world");
        assert_eq!(
            content.media_url,
            Some("https://example.com/image.png".to_string())
        );
    }

    #[test]
    fn test_publish_result_ok() {
        let result = PublishResult::ok(
            PlatformId::Instagram,
            Some("https://www.instagram.com/p/abc/".to_string()),
        );

        assert_eq!(result.platform, PlatformId::Instagram);
        assert!(result.success);
        assert_eq!(result.url, Some("https://www.instagram.com/p/abc/".to_string()));
        assert_eq!(result.error, None);
    }

    #[test]
    fn test_publish_result_failed() {
        let result = PublishResult::failed(PlatformId::Tiktok, "upload rejected");

        assert_eq!(result.platform, PlatformId::Tiktok);
        assert!(!result.success);
        assert_eq!(result.url, None);
        assert_eq!(result.error, Some("upload rejected".to_string()));
    }

    #[test]
    fn test_media_reference_from_location_url() {
        let media = MediaReference::from_location("https://cdn.example.com/video.mp4");
        assert_eq!(media.local_path, None);
        assert_eq!(
            media.public_url,
            Some("https://cdn.example.com/video.mp4".to_string())
        );
    }

    #[test]
    fn test_media_reference_from_location_path() {
        let media = MediaReference::from_location("/tmp/video.mp4");
        assert_eq!(media.local_path, Some("/tmp/video.mp4".to_string()));
        assert_eq!(media.public_url, None);
    }

    #[test]
    fn test_media_reference_upload_source_prefers_local() {
        let media = MediaReference {
            local_path: Some("/tmp/video.mp4".to_string()),
            public_url: Some("https://cdn.example.com/video.mp4".to_string()),
        };
        assert_eq!(media.upload_source(), Some("/tmp/video.mp4"));
    }

    #[test]
    fn test_media_reference_upload_source_falls_back_to_url() {
        let media = MediaReference {
            local_path: None,
            public_url: Some("https://cdn.example.com/video.mp4".to_string()),
        };
        assert_eq!(media.upload_source(), Some("https://cdn.example.com/video.mp4"));
    }

    #[test]
    fn test_media_reference_link_source_requires_public_url() {
        let media = MediaReference {
            local_path: Some("/tmp/image.png".to_string()),
            public_url: None,
        };
        assert_eq!(media.link_source(), None);

        let media = MediaReference {
            local_path: None,
            public_url: Some("https://cdn.example.com/image.png".to_string()),
        };
        assert_eq!(media.link_source(), Some("https://cdn.example.com/image.png"));
    }
}
