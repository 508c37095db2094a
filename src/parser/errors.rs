use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("not a supported Instagram URL: {0:?} (expected instagram.com/p/..., /reel/... or /stories/...)")]
    InvalidUrl(String),
    #[error("could not extract content ID from URL: {0}")]
    ShortcodeNotFound(String),
}
