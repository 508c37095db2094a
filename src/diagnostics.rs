//! System diagnostics: are the engines installed, is the output folder
//! usable, and can Instagram be reached at all.

use chrono::{DateTime, Local};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::downloader::core::check_writable;
use crate::downloader::engine::Engine;
use crate::downloader::runner::{ProcessRunner, RunError};

pub const INSTAGRAM_PROBE_URL: &str = "https://www.instagram.com";
pub const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    Available(String),
    NotWorking,
    NotInstalled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderStatus {
    pub path: PathBuf,
    pub exists: bool,
    pub writable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkStatus {
    Reachable,
    Status(u16),
    Unreachable(String),
}

#[derive(Debug, Clone)]
pub struct DiagnosticsReport {
    pub timestamp: DateTime<Local>,
    pub app_version: String,
    pub engines: Vec<(Engine, EngineStatus)>,
    pub output_folder: FolderStatus,
    pub network: NetworkStatus,
}

pub async fn check_engine(runner: &dyn ProcessRunner, engine: Engine) -> EngineStatus {
    let res = runner
        .run(&engine.version_check(), CHECK_TIMEOUT, &CancellationToken::new())
        .await;
    match res {
        Ok(out) if out.success() => {
            EngineStatus::Available(out.first_line().unwrap_or_default().to_string())
        }
        Ok(_) => EngineStatus::NotWorking,
        Err(RunError::NotFound(_)) | Err(RunError::TimedOut(_)) => EngineStatus::NotInstalled,
        Err(e) => {
            debug!("{} check failed: {}", engine, e);
            EngineStatus::NotWorking
        }
    }
}

pub async fn check_engines(runner: &dyn ProcessRunner) -> Vec<(Engine, EngineStatus)> {
    let mut statuses = Vec::with_capacity(Engine::ALL.len());
    for engine in Engine::ALL {
        statuses.push((engine, check_engine(runner, engine).await));
    }
    statuses
}

/// Looks at the folder without creating it.
pub fn check_output_folder(path: &Path) -> FolderStatus {
    let exists = path.is_dir();
    let writable = exists && check_writable(path).is_ok();
    FolderStatus {
        path: path.to_path_buf(),
        exists,
        writable,
    }
}

pub async fn probe_network(client: &reqwest::Client, url: &str) -> NetworkStatus {
    match client.get(url).timeout(CHECK_TIMEOUT).send().await {
        Ok(resp) if resp.status() == reqwest::StatusCode::OK => NetworkStatus::Reachable,
        Ok(resp) => NetworkStatus::Status(resp.status().as_u16()),
        Err(e) => NetworkStatus::Unreachable(e.to_string()),
    }
}

pub async fn run(
    runner: &dyn ProcessRunner,
    output_dir: &Path,
    probe_url: &str,
) -> DiagnosticsReport {
    info!("running diagnostics");
    let client = reqwest::Client::new();
    let engines = check_engines(runner).await;
    let network = probe_network(&client, probe_url).await;

    DiagnosticsReport {
        timestamp: Local::now(),
        app_version: env!("CARGO_PKG_VERSION").to_string(),
        engines,
        output_folder: check_output_folder(output_dir),
        network,
    }
}

impl fmt::Display for DiagnosticsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== HIKARI DOWNLOADER DIAGNOSTICS ===")?;
        writeln!(f, "Timestamp: {}", self.timestamp.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "Version: {}", self.app_version)?;

        writeln!(f, "\n=== DEPENDENCY CHECK ===")?;
        for (engine, status) in &self.engines {
            match status {
                EngineStatus::Available(v) if !v.is_empty() => {
                    writeln!(f, "✅ {}: Available ({})", engine, v)?
                }
                EngineStatus::Available(_) => writeln!(f, "✅ {}: Available", engine)?,
                EngineStatus::NotWorking => writeln!(f, "❌ {}: Not working properly", engine)?,
                EngineStatus::NotInstalled => writeln!(f, "❌ {}: Not installed", engine)?,
            }
        }

        writeln!(f, "\n=== OUTPUT FOLDER ===")?;
        let folder = &self.output_folder;
        if folder.exists {
            writeln!(f, "✅ Output folder exists: {}", folder.path.display())?;
            if folder.writable {
                writeln!(f, "✅ Output folder is writable")?;
            } else {
                writeln!(f, "❌ Output folder is not writable")?;
            }
        } else {
            writeln!(f, "❌ Output folder does not exist: {}", folder.path.display())?;
        }

        writeln!(f, "\n=== NETWORK CHECK ===")?;
        match &self.network {
            NetworkStatus::Reachable => writeln!(f, "✅ Instagram is accessible"),
            NetworkStatus::Status(code) => {
                writeln!(f, "⚠️ Instagram returned status code: {}", code)
            }
            NetworkStatus::Unreachable(e) => writeln!(f, "❌ Cannot reach Instagram: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::engine::Invocation;
    use crate::downloader::runner::ProcessOutput;
    use async_trait::async_trait;

    struct FixedRunner;

    #[async_trait]
    impl ProcessRunner for FixedRunner {
        async fn run(
            &self,
            invocation: &Invocation,
            _timeout: Duration,
            _cancel: &CancellationToken,
        ) -> Result<ProcessOutput, RunError> {
            match invocation.program.as_str() {
                "yt-dlp" => Ok(ProcessOutput {
                    code: Some(0),
                    stdout: "2025.10.22\n".into(),
                    stderr: String::new(),
                }),
                "gallery-dl" => Ok(ProcessOutput {
                    code: Some(2),
                    ..Default::default()
                }),
                other => Err(RunError::NotFound(other.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_check_engines() {
        let statuses = check_engines(&FixedRunner).await;
        assert_eq!(
            statuses,
            vec![
                (Engine::InstaLoader, EngineStatus::NotInstalled),
                (Engine::YtDlp, EngineStatus::Available("2025.10.22".into())),
                (Engine::GalleryDl, EngineStatus::NotWorking),
            ]
        );
    }

    #[test]
    fn test_check_output_folder() {
        let tmp = tempfile::tempdir().unwrap();
        let status = check_output_folder(tmp.path());
        assert!(status.exists);
        assert!(status.writable);

        let status = check_output_folder(&tmp.path().join("missing"));
        assert!(!status.exists);
        assert!(!status.writable);
    }

    // the report must agree with what a download would actually hit
    #[cfg(unix)]
    #[tokio::test]
    async fn test_folder_check_agrees_with_dispatcher() {
        use crate::downloader::core::prepare_output_dir;
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("locked");
        std::fs::create_dir(&dir).unwrap();

        for mode in [0o755, 0o555] {
            std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(mode)).unwrap();
            let status = check_output_folder(&dir);
            let prepared = prepare_output_dir(&dir).await.is_ok();
            assert!(status.exists);
            assert_eq!(status.writable, prepared, "mode {:o}", mode);
        }
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_report_rendering() {
        let report = DiagnosticsReport {
            timestamp: Local::now(),
            app_version: "0.1.0".into(),
            engines: vec![
                (Engine::InstaLoader, EngineStatus::Available("4.14".into())),
                (Engine::YtDlp, EngineStatus::NotInstalled),
            ],
            output_folder: FolderStatus {
                path: PathBuf::from("/tmp/out"),
                exists: false,
                writable: false,
            },
            network: NetworkStatus::Status(429),
        };
        let text = report.to_string();
        assert!(text.contains("✅ instaloader: Available (4.14)"));
        assert!(text.contains("❌ yt-dlp: Not installed"));
        assert!(text.contains("❌ Output folder does not exist: /tmp/out"));
        assert!(text.contains("status code: 429"));
    }
}
