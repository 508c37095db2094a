use serde::Serialize;
use std::fmt;

use crate::downloader::engine::Engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ContentCategory {
    Post,
    Reel,
    Story,
    Unknown,
}

impl ContentCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Post => "Instagram Post",
            Self::Reel => "Instagram Reel",
            Self::Story => "Instagram Story",
            Self::Unknown => "Instagram Content",
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MediaKind {
    Photo,
    Video,
    Unknown,
}

impl MediaKind {
    /// Reels are the only shape known to be video; posts and stories report
    /// Photo even when they carry a clip.
    pub fn for_category(category: ContentCategory) -> Self {
        match category {
            ContentCategory::Reel => Self::Video,
            ContentCategory::Post | ContentCategory::Story => Self::Photo,
            ContentCategory::Unknown => Self::Unknown,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Photo => write!(f, "Image Content"),
            Self::Video => write!(f, "Video Content"),
            Self::Unknown => write!(f, "Unknown Content"),
        }
    }
}

/// Result of running the classifier over one input string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContentClassification {
    pub category: ContentCategory,
    pub media_kind: MediaKind,
}

impl ContentClassification {
    pub fn new(category: ContentCategory) -> Self {
        Self {
            category,
            media_kind: MediaKind::for_category(category),
        }
    }

    pub fn unknown() -> Self {
        Self::new(ContentCategory::Unknown)
    }

    pub fn is_valid(&self) -> bool {
        self.category != ContentCategory::Unknown
    }

    // photos -> instaloader, videos -> yt-dlp
    pub fn recommended_engine(&self) -> Engine {
        match self.media_kind {
            MediaKind::Video => Engine::YtDlp,
            MediaKind::Photo | MediaKind::Unknown => Engine::InstaLoader,
        }
    }

    /// One-line detection message shown while the user is typing a URL.
    pub fn summary(&self) -> String {
        if self.is_valid() {
            format!(
                "{} detected - {} ready to download",
                self.category, self.media_kind
            )
        } else {
            "Waiting for URL...".to_string()
        }
    }
}

/// A trimmed URL that matched one of the supported Instagram link shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstagramLink {
    url: String,
    classification: ContentClassification,
}

impl InstagramLink {
    pub(crate) fn new_unchecked(url: String, classification: ContentClassification) -> Self {
        Self {
            url,
            classification,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn classification(&self) -> ContentClassification {
        self.classification
    }

    pub fn category(&self) -> ContentCategory {
        self.classification.category
    }
}

impl fmt::Display for InstagramLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl AsRef<str> for InstagramLink {
    fn as_ref(&self) -> &str {
        &self.url
    }
}
