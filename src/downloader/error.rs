use std::path::PathBuf;
use thiserror::Error;

use super::engine::Engine;
use super::runner::RunError;
use crate::parser::errors::ParseError;

/// Coarse category of a failed job, independent of the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidInput,
    EngineMissing,
    ExtractionFailure,
    ProcessFailure,
    Timeout,
    Filesystem,
    Spawn,
    Cancelled,
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    InvalidInput(#[from] ParseError),

    #[error("{engine} is not installed. Please run: {}", .engine.install_hint())]
    EngineMissing { engine: Engine },

    #[error("could not extract content ID from URL {url} ({engine} only supports posts and reels)")]
    ExtractionFailure { engine: Engine, url: String },

    #[error("{engine} failed: {reason}")]
    ProcessFailure { engine: Engine, reason: String },

    #[error("{engine} timed out after {secs}s")]
    Timeout { engine: Engine, secs: u64 },

    #[error("output folder {} is not usable: {reason}", .path.display())]
    Filesystem { path: PathBuf, reason: String },

    #[error("could not run {engine}: {message}")]
    Spawn { engine: Engine, message: String },

    #[error("{engine} download was cancelled")]
    Cancelled { engine: Engine },
}

impl DownloadError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidInput(_) => FailureKind::InvalidInput,
            Self::EngineMissing { .. } => FailureKind::EngineMissing,
            Self::ExtractionFailure { .. } => FailureKind::ExtractionFailure,
            Self::ProcessFailure { .. } => FailureKind::ProcessFailure,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Filesystem { .. } => FailureKind::Filesystem,
            Self::Spawn { .. } => FailureKind::Spawn,
            Self::Cancelled { .. } => FailureKind::Cancelled,
        }
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, err: impl ToString) -> Self {
        Self::Filesystem {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    /// Maps a failure of the download run itself (the engine check already passed).
    pub(crate) fn from_run(engine: Engine, err: RunError) -> Self {
        match err {
            RunError::TimedOut(limit) => Self::Timeout {
                engine,
                secs: limit.as_secs(),
            },
            RunError::Cancelled => Self::Cancelled { engine },
            RunError::NotFound(_) => Self::EngineMissing { engine },
            RunError::Io(e) => Self::Spawn {
                engine,
                message: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_messages() {
        let err = DownloadError::EngineMissing {
            engine: Engine::InstaLoader,
        };
        assert_eq!(
            err.to_string(),
            "instaloader is not installed. Please run: pip install instaloader"
        );

        let err = DownloadError::ProcessFailure {
            engine: Engine::YtDlp,
            reason: "rate limited".into(),
        };
        assert_eq!(err.to_string(), "yt-dlp failed: rate limited");
    }

    #[test]
    fn test_from_run() {
        let err = DownloadError::from_run(Engine::GalleryDl, RunError::TimedOut(Duration::from_secs(300)));
        assert_eq!(err.kind(), FailureKind::Timeout);
        assert_eq!(err.to_string(), "gallery-dl timed out after 300s");

        let err = DownloadError::from_run(
            Engine::GalleryDl,
            RunError::Io(std::io::Error::other("broken pipe")),
        );
        assert_eq!(err.kind(), FailureKind::Spawn);
        assert!(err.to_string().ends_with("broken pipe"));
    }
}
