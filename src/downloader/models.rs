use std::path::PathBuf;

use super::engine::Engine;
use super::error::{DownloadError, FailureKind};
use crate::parser::models::InstagramLink;

/// One download request. Built right before dispatch and dropped after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub link: InstagramLink,
    pub engine: Engine,
    pub output_dir: PathBuf,
}

impl DownloadJob {
    pub fn new(link: InstagramLink, engine: Engine, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            link,
            engine,
            output_dir: output_dir.into(),
        }
    }

    /// Validates raw input first, so an unsupported URL never becomes a job.
    pub fn from_input(
        input: &str,
        engine: Engine,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, DownloadError> {
        let link = InstagramLink::parse(input)?;
        Ok(Self::new(link, engine, output_dir))
    }
}

#[derive(Debug)]
pub enum DownloadOutcome {
    Success,
    Failure(DownloadError),
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success => None,
            Self::Failure(e) => Some(e.kind()),
        }
    }

    /// Human-readable reason of a failure.
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Success => None,
            Self::Failure(e) => Some(e.to_string()),
        }
    }
}
