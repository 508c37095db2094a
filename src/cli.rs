use clap::{Parser, Subcommand};
use hikari_dl::Engine;
use std::path::PathBuf;

/// Instagram content downloader
#[derive(Parser, Debug)]
#[command(name = "hikari")]
#[command(version)]
#[command(about = "Download Instagram posts, reels and stories with instaloader, yt-dlp or gallery-dl", long_about = None)]
pub struct Cli {
    /// Config file
    #[arg(long, global = true, value_name = "FILE")]
    #[arg(default_value = hikari_dl::common::config::DEFAULT_CONFIG_FILE)]
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Log at DEBUG level regardless of the config
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show what kind of content a URL points to
    Detect {
        #[arg(value_name = "URL")]
        #[arg(value_hint = clap::ValueHint::Url)]
        url: String,
    },

    /// Download a post, reel or story
    Download {
        /// Instagram link (instagram.com/p/..., /reel/... or /stories/...)
        #[arg(long, value_name = "URL")]
        #[arg(value_hint = clap::ValueHint::Url)]
        url: String,

        /// Download engine, defaults to the configured one
        #[arg(long, short, value_enum)]
        engine: Option<Engine>,

        /// Destination folder, defaults to the configured one
        #[arg(long, value_name = "DIR")]
        #[arg(value_hint = clap::ValueHint::DirPath)]
        output_dir: Option<PathBuf>,
    },

    /// Describe the available download engines
    Engines,

    /// Check engines, the output folder and the network
    Diagnose {
        #[arg(long, value_name = "DIR")]
        #[arg(value_hint = clap::ValueHint::DirPath)]
        output_dir: Option<PathBuf>,
    },

    /// Upgrade instaloader, yt-dlp and gallery-dl through pip
    Update,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_download() {
        let cli = Cli::try_parse_from([
            "hikari",
            "download",
            "--url",
            "https://instagram.com/reel/XYZ/",
            "--engine",
            "yt-dlp",
            "--output-dir",
            "/tmp/out",
        ])
        .unwrap();
        match cli.command {
            Command::Download {
                engine, output_dir, ..
            } => {
                assert_eq!(engine, Some(Engine::YtDlp));
                assert_eq!(output_dir, Some(PathBuf::from("/tmp/out")));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.config, PathBuf::from("config.json"));
    }
}
