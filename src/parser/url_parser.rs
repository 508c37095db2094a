use super::errors::ParseError;
use super::models::{ContentCategory, ContentClassification, InstagramLink};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // order matters only for readability, the path shapes are disjoint
    static ref LINK_PATTERNS: Vec<(Regex, ContentCategory)> = vec![
        (
            Regex::new(r"^https?://(www\.)?instagram\.com/p/[^/]+/?$").unwrap(),
            ContentCategory::Post,
        ),
        (
            Regex::new(r"^https?://(www\.)?instagram\.com/reel/[^/]+/?$").unwrap(),
            ContentCategory::Reel,
        ),
        (
            Regex::new(r"^https?://(www\.)?instagram\.com/stories/[^/]+/[^/]+/?$").unwrap(),
            ContentCategory::Story,
        ),
    ];
    static ref SHORTCODE_PATTERN: Regex = Regex::new(r"/(?:p|reel)/([^/]+)/").unwrap();
}

/// Classifies raw user input. Cheap enough to call on every keystroke.
pub fn classify(input: &str) -> ContentClassification {
    let url = input.trim();

    for (pattern, category) in LINK_PATTERNS.iter() {
        if pattern.is_match(url) {
            return ContentClassification::new(*category);
        }
    }

    ContentClassification::unknown()
}

/// Pulls the post/reel identifier out of a URL.
///
/// The identifier must be followed by a `/`, so `instagram.com/p/ABC` without
/// a trailing slash has no extractable shortcode. Story links never do.
pub fn extract_shortcode(url: &str) -> Result<String, ParseError> {
    let url = url.trim();
    if classify(url).category == ContentCategory::Story {
        return Err(ParseError::ShortcodeNotFound(url.to_string()));
    }

    SHORTCODE_PATTERN
        .captures(url)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| ParseError::ShortcodeNotFound(url.to_string()))
}

impl InstagramLink {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let url = input.trim();
        let classification = classify(url);
        if !classification.is_valid() {
            return Err(ParseError::InvalidUrl(url.to_string()));
        }
        Ok(Self::new_unchecked(url.to_string(), classification))
    }
}

impl std::str::FromStr for InstagramLink {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
