use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::common::utils::excerpt;
use crate::downloader::engine::{Engine, Invocation};
use crate::downloader::progress::{JobState, ProgressReporter, ProgressUpdate};
use crate::downloader::runner::{ProcessRunner, RunError};

pub const UPDATE_TIMEOUT: Duration = Duration::from_secs(120);
const ISSUE_MAX_CHARS: usize = 100;

/// yt-dlp first: it breaks most often when Instagram changes.
pub const UPDATE_ORDER: [Engine; 3] = [Engine::YtDlp, Engine::InstaLoader, Engine::GalleryDl];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    Updated,
    /// pip exited non-zero; holds the start of its stderr
    Issues(String),
    TimedOut,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResult {
    pub package: String,
    pub status: UpdateStatus,
}

impl fmt::Display for UpdateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            UpdateStatus::Updated => write!(f, "✅ {} updated successfully", self.package),
            UpdateStatus::Issues(msg) => {
                write!(f, "⚠️ {} update had issues: {}", self.package, msg)
            }
            UpdateStatus::TimedOut => write!(f, "⏰ {} update timed out", self.package),
            UpdateStatus::Failed(msg) => write!(f, "❌ {} update failed: {}", self.package, msg),
        }
    }
}

pub fn upgrade_command(python: &str, package: &str) -> Invocation {
    Invocation::new(python).args(["-m", "pip", "install", "--upgrade", package])
}

/// Upgrades every engine package one after another. A failing package never
/// stops the ones after it.
pub async fn update_engines(
    runner: &dyn ProcessRunner,
    python: &str,
    reporter: &dyn ProgressReporter,
    cancel: &CancellationToken,
) -> Vec<UpdateResult> {
    let packages: Vec<&str> = UPDATE_ORDER.iter().map(|e| e.pip_package()).collect();
    let total = packages.len();
    let mut results = Vec::with_capacity(total);

    for (i, package) in packages.into_iter().enumerate() {
        reporter.report(ProgressUpdate::new(
            JobState::Running,
            percent_of(2 * i + 1, 2 * total),
            format!("Updating {}...", package),
        ));

        let status = match runner
            .run(&upgrade_command(python, package), UPDATE_TIMEOUT, cancel)
            .await
        {
            Ok(out) if out.success() => UpdateStatus::Updated,
            Ok(out) => UpdateStatus::Issues(excerpt(&out.stderr, ISSUE_MAX_CHARS)),
            Err(RunError::TimedOut(_)) => UpdateStatus::TimedOut,
            Err(e) => UpdateStatus::Failed(excerpt(&e.to_string(), ISSUE_MAX_CHARS)),
        };

        let result = UpdateResult {
            package: package.to_string(),
            status,
        };
        match result.status {
            UpdateStatus::Updated => info!("{}", result),
            _ => warn!("{}", result),
        }

        let last = i + 1 == total;
        reporter.report(ProgressUpdate::new(
            if last { JobState::Completed } else { JobState::Running },
            percent_of(i + 1, total),
            result.to_string(),
        ));
        results.push(result);

        if cancel.is_cancelled() {
            warn!("library update cancelled");
            break;
        }
    }

    results
}

fn percent_of(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done * 100) / total).min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::runner::ProcessOutput;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct PipRunner {
        calls: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl ProcessRunner for PipRunner {
        async fn run(
            &self,
            invocation: &Invocation,
            _timeout: Duration,
            _cancel: &CancellationToken,
        ) -> Result<ProcessOutput, RunError> {
            self.calls.lock().unwrap().push(invocation.argv());
            match invocation.args.last().map(String::as_str) {
                Some("instaloader") => Err(RunError::TimedOut(UPDATE_TIMEOUT)),
                Some("gallery-dl") => Ok(ProcessOutput {
                    code: Some(1),
                    stdout: String::new(),
                    stderr: "ERROR: ".to_string() + &"x".repeat(300),
                }),
                _ => Ok(ProcessOutput {
                    code: Some(0),
                    ..Default::default()
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_update_continues_after_failures() {
        let runner = PipRunner {
            calls: Mutex::new(Vec::new()),
        };
        let percents = Mutex::new(Vec::new());
        let reporter = |u: ProgressUpdate| percents.lock().unwrap().push(u.percent);

        let results =
            update_engines(&runner, "python3", &reporter, &CancellationToken::new()).await;

        let order: Vec<&str> = results.iter().map(|r| r.package.as_str()).collect();
        assert_eq!(order, ["yt-dlp", "instaloader", "gallery-dl"]);
        assert_eq!(results[0].status, UpdateStatus::Updated);
        assert_eq!(results[1].status, UpdateStatus::TimedOut);
        match &results[2].status {
            UpdateStatus::Issues(msg) => assert!(msg.starts_with("ERROR: ") && msg.len() <= 103),
            other => panic!("unexpected status {:?}", other),
        }

        let calls = runner.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            vec!["python3", "-m", "pip", "install", "--upgrade", "yt-dlp"]
        );
        assert_eq!(*percents.lock().unwrap(), vec![16, 33, 50, 66, 83, 100]);
    }
}
