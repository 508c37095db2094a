use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Level, debug, info, warn};

use hikari_dl::common::config::AppConfig;
use hikari_dl::common::logger::{self, PrettyLogger};
use hikari_dl::downloader::progress::{ConsoleProgress, NoProgress, ProgressReporter};
use hikari_dl::downloader::{DispatchSettings, Dispatcher, DownloadJob, DownloadOutcome, TokioProcessRunner};
use hikari_dl::{Engine, classify, diagnostics, log_error, log_info, log_step, log_success, log_warning, updater};

mod cli;

use cli::{Cli, Command};

/// Cancels `token` on Ctrl-C so a running child gets killed.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping the running tool");
            token.cancel();
        }
    });
}

fn print_detection(url: &str) -> bool {
    let classification = classify(url);
    PrettyLogger::detection(classification.is_valid(), classification.summary());
    classification.is_valid()
}

async fn run_download(
    config: &AppConfig,
    url: &str,
    engine: Engine,
    output_dir: PathBuf,
) -> anyhow::Result<ExitCode> {
    print_detection(url);

    let job = match DownloadJob::from_input(url, engine, output_dir) {
        Ok(job) => job,
        Err(e) => {
            log_error!("{}", e);
            log_info!(
                "Supported formats:\n  • Posts: instagram.com/p/...\n  • Reels: instagram.com/reel/...\n  • Stories: instagram.com/stories/..."
            );
            return Ok(ExitCode::from(2));
        }
    };

    let recommended = job.link.classification().recommended_engine();
    if recommended != engine {
        log_info!("Tip: {} usually works best for this kind of content", recommended);
    }

    let dispatcher = Dispatcher::system().with_settings(DispatchSettings {
        version_check_timeout: config.version_check_timeout(),
        download_timeout: config.download_timeout(),
    });

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    log_step!("Downloading {} with {}", job.link, engine);
    let output_dir = job.output_dir.clone();
    let reporter: Arc<dyn ProgressReporter> = Arc::new(ConsoleProgress::new());
    let outcome = dispatcher.spawn(job, reporter, cancel).await?;

    match outcome {
        DownloadOutcome::Success => {
            log_success!("{}", "Download completed successfully!".green());
            PrettyLogger::file_info("Saved to", output_dir.display().to_string());
            Ok(ExitCode::SUCCESS)
        }
        DownloadOutcome::Failure(e) => {
            log_error!("Download failed: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn show_engines(config: &AppConfig) {
    PrettyLogger::title("Download Engines");
    for (key, info) in config.engine_infos() {
        let name = if info.name.is_empty() { key } else { info.name };
        if info.recommended {
            println!("🔹 {} {}", name.bold(), "(Recommended)".green());
        } else {
            println!("🔹 {}", name.bold());
        }
        if !info.description.is_empty() {
            println!("  • {}", info.description);
        }
        for advantage in &info.advantages {
            println!("  • {}", advantage);
        }
        println!();
    }
    PrettyLogger::separator();
    println!("💡 Tips:");
    println!("📸 Use instaloader for photos and image posts");
    println!("🎥 Use yt-dlp for videos and reels");
    println!("🌐 Use gallery-dl for multi-platform downloads");
}

async fn run_diagnostics(output_dir: &Path) {
    let report = diagnostics::run(
        &TokioProcessRunner,
        output_dir,
        diagnostics::INSTAGRAM_PROBE_URL,
    )
    .await;
    println!("{}", report);
}

async fn run_update(config: &AppConfig) -> anyhow::Result<ExitCode> {
    log_step!("Starting library updates...");
    let python = config.default_settings.python.clone();
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let results = tokio::spawn(async move {
        updater::update_engines(&TokioProcessRunner, &python, &NoProgress, &cancel).await
    })
    .await?;

    let mut all_ok = true;
    for result in &results {
        match result.status {
            updater::UpdateStatus::Updated => log_success!("{}", result),
            _ => {
                all_ok = false;
                log_warning!("{}", result)
            }
        }
    }
    log_info!("Library update process completed. New versions are used on the next download.");
    Ok(if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Cli::parse();

    let (config, config_err) = AppConfig::load_or_default(&args.config);
    let level = if args.verbose {
        Level::DEBUG
    } else {
        logger::parse_level(&config.default_settings.log_level)
    };
    logger::init_tracing(level, Some(Path::new(logger::LOG_FILE)));
    if let Some(e) = config_err {
        warn!("{}, using defaults", e);
    }
    debug!("config: {:?}", config);
    info!("{} {}", config.app_info.name, config.app_info.version);

    let default_dir = config.default_settings.output_dir.clone();
    match args.command {
        Command::Detect { url } => {
            let valid = print_detection(&url);
            if valid {
                let classification = classify(&url);
                log_info!("Recommended engine: {}", classification.recommended_engine());
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(2))
            }
        }
        Command::Download {
            url,
            engine,
            output_dir,
        } => {
            let engine = engine.unwrap_or(config.default_settings.default_engine);
            run_download(&config, &url, engine, output_dir.unwrap_or(default_dir)).await
        }
        Command::Engines => {
            show_engines(&config);
            Ok(ExitCode::SUCCESS)
        }
        Command::Diagnose { output_dir } => {
            run_diagnostics(&output_dir.unwrap_or(default_dir)).await;
            Ok(ExitCode::SUCCESS)
        }
        Command::Update => run_update(&config).await,
    }
}
