use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::engine::Engine;
use super::error::DownloadError;
use super::models::{DownloadJob, DownloadOutcome};
use super::progress::{JobState, ProgressReporter, ProgressUpdate};
use super::runner::{ProcessOutput, ProcessRunner, RunError, TokioProcessRunner};
use crate::common::utils::excerpt;

const REASON_MAX_CHARS: usize = 500;
const WRITE_PROBE_NAME: &str = ".hikari-write-test";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    pub version_check_timeout: Duration,
    pub download_timeout: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            version_check_timeout: Duration::from_secs(5),
            download_timeout: Duration::from_secs(300),
        }
    }
}

/// Turns a [`DownloadJob`] into one external tool run.
///
/// Order of work: output folder, command construction, engine check, run.
/// Everything before the run is cheap and fails without touching the network.
#[derive(Clone)]
pub struct Dispatcher {
    runner: Arc<dyn ProcessRunner>,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            runner,
            settings: DispatchSettings::default(),
        }
    }

    /// Dispatcher backed by real child processes.
    pub fn system() -> Self {
        Self::new(Arc::new(TokioProcessRunner))
    }

    pub fn with_settings(mut self, settings: DispatchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Runs the job on a background task and hands back its handle.
    pub fn spawn(
        &self,
        job: DownloadJob,
        reporter: Arc<dyn ProgressReporter>,
        cancel: CancellationToken,
    ) -> JoinHandle<DownloadOutcome> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.dispatch(&job, reporter.as_ref(), &cancel).await })
    }

    pub async fn dispatch(
        &self,
        job: &DownloadJob,
        reporter: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> DownloadOutcome {
        info!(
            "dispatching {} ({}) with {} into {:?}",
            job.link,
            job.link.category(),
            job.engine,
            job.output_dir
        );

        let mut stage = Stage {
            reporter,
            percent: 0,
        };

        match self.execute(job, &mut stage, cancel).await {
            Ok(()) => {
                info!("download completed: {}", job.link);
                stage.enter(JobState::Completed, 100, "Download completed successfully!");
                DownloadOutcome::Success
            }
            Err(e) => {
                error!("Download failed: {}", e);
                let percent = stage.percent;
                stage.enter(JobState::Failed, percent, format!("Download failed: {}", e));
                DownloadOutcome::Failure(e)
            }
        }
    }

    async fn execute(
        &self,
        job: &DownloadJob,
        stage: &mut Stage<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), DownloadError> {
        let engine = job.engine;

        stage.enter(JobState::Preparing, 10, "Preparing download...");
        prepare_output_dir(&job.output_dir).await?;
        let command = engine.build_command(job.link.as_str(), &job.output_dir)?;

        stage.enter(
            JobState::EngineCheck,
            20,
            format!("Preparing {} download...", engine),
        );
        let version = self.check_engine(engine, cancel).await?;
        debug!("{} version {}", engine, version);

        stage.enter(JobState::Running, 60, format!("Downloading with {}...", engine));
        let output = self
            .runner
            .run(&command, self.settings.download_timeout, cancel)
            .await
            .map_err(|e| DownloadError::from_run(engine, e))?;

        if !output.success() {
            warn!("{} exited with {:?}", engine, output.code);
            return Err(DownloadError::ProcessFailure {
                engine,
                reason: failure_reason(&output),
            });
        }

        stage.enter(JobState::Running, 90, "Finishing up...");
        Ok(())
    }

    /// Runs `<engine> --version`; the first stdout line is returned.
    pub async fn check_engine(
        &self,
        engine: Engine,
        cancel: &CancellationToken,
    ) -> Result<String, DownloadError> {
        let result = self
            .runner
            .run(
                &engine.version_check(),
                self.settings.version_check_timeout,
                cancel,
            )
            .await;

        match result {
            Ok(output) if output.success() => {
                Ok(output.first_line().unwrap_or("unknown").to_string())
            }
            Ok(output) => {
                warn!("{} --version exited with {:?}", engine, output.code);
                Err(DownloadError::EngineMissing { engine })
            }
            Err(RunError::Cancelled) => Err(DownloadError::Cancelled { engine }),
            Err(e) => {
                warn!("{} --version failed: {}", engine, e);
                Err(DownloadError::EngineMissing { engine })
            }
        }
    }
}

// remembers the last checkpoint so a failure is reported where it happened
struct Stage<'a> {
    reporter: &'a dyn ProgressReporter,
    percent: u8,
}

impl Stage<'_> {
    fn enter(&mut self, state: JobState, percent: u8, message: impl Into<String>) {
        self.percent = percent;
        self.reporter
            .report(ProgressUpdate::new(state, percent, message));
    }
}

/// Creates the folder (with parents) and checks that files can be created in it.
pub async fn prepare_output_dir(dir: &Path) -> Result<(), DownloadError> {
    if dir.exists() && !dir.is_dir() {
        return Err(DownloadError::filesystem(dir, "not a directory"));
    }

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| DownloadError::filesystem(dir, format!("cannot create folder: {}", e)))?;

    check_writable(dir)
        .map_err(|e| DownloadError::filesystem(dir, format!("folder is not writable: {}", e)))
}

/// Creates and removes a probe file in an existing folder.
///
/// Permission bits alone give the wrong answer for root and on ACL
/// filesystems, so this actually tries the write.
pub fn check_writable(dir: &Path) -> std::io::Result<()> {
    let probe = dir.join(WRITE_PROBE_NAME);
    std::fs::write(&probe, b"")?;
    if let Err(e) = std::fs::remove_file(&probe) {
        warn!("could not remove {:?}: {}", probe, e);
    }
    Ok(())
}

fn failure_reason(output: &ProcessOutput) -> String {
    excerpt(
        output.diagnostic().unwrap_or("Unknown error occurred"),
        REASON_MAX_CHARS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_reason_fallbacks() {
        let mut out = ProcessOutput {
            code: Some(1),
            stdout: "from stdout".into(),
            stderr: "rate limited\n".into(),
        };
        assert_eq!(failure_reason(&out), "rate limited");
        out.stderr.clear();
        assert_eq!(failure_reason(&out), "from stdout");
        out.stdout.clear();
        assert_eq!(failure_reason(&out), "Unknown error occurred");
    }

    #[test]
    fn test_failure_reason_is_truncated() {
        let out = ProcessOutput {
            code: Some(1),
            stdout: String::new(),
            stderr: "x".repeat(2000),
        };
        assert!(failure_reason(&out).chars().count() <= REASON_MAX_CHARS + 3);
    }

    #[tokio::test]
    async fn test_prepare_output_dir_creates_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a").join("b");
        prepare_output_dir(&dir).await.unwrap();
        assert!(dir.is_dir());
        assert!(!dir.join(WRITE_PROBE_NAME).exists());
    }

    #[test]
    fn test_check_writable_leaves_nothing_behind() {
        let tmp = tempfile::tempdir().unwrap();
        check_writable(tmp.path()).unwrap();
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
        assert!(check_writable(&tmp.path().join("missing")).is_err());
    }

    #[tokio::test]
    async fn test_prepare_output_dir_rejects_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();
        let err = prepare_output_dir(&file).await.unwrap_err();
        assert_eq!(err.kind(), crate::downloader::error::FailureKind::Filesystem);
    }
}
