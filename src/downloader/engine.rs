use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use super::error::DownloadError;
use crate::parser::url_parser::extract_shortcode;

/// The external downloader tools this application can drive.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum Engine {
    #[default]
    #[serde(rename = "instaloader")]
    #[value(name = "instaloader")]
    InstaLoader,
    #[serde(rename = "yt-dlp")]
    #[value(name = "yt-dlp")]
    YtDlp,
    #[serde(rename = "gallery-dl")]
    #[value(name = "gallery-dl")]
    GalleryDl,
}

impl Engine {
    pub const ALL: [Engine; 3] = [Engine::InstaLoader, Engine::YtDlp, Engine::GalleryDl];

    /// Executable name, also used as the engine's identifier in config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InstaLoader => "instaloader",
            Self::YtDlp => "yt-dlp",
            Self::GalleryDl => "gallery-dl",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::InstaLoader => "Instaloader",
            Self::YtDlp => "yt-dlp",
            Self::GalleryDl => "gallery-dl",
        }
    }

    pub fn pip_package(&self) -> &'static str {
        self.as_str()
    }

    pub fn install_hint(&self) -> String {
        format!("pip install {}", self.pip_package())
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::InstaLoader => "Instagram specialized downloader",
            Self::YtDlp => "General purpose media downloader",
            Self::GalleryDl => "Multi-platform image and gallery downloader",
        }
    }

    pub fn advantages(&self) -> &'static [&'static str] {
        match self {
            Self::InstaLoader => &["Best for photos and image posts", "Fetches posts by shortcode"],
            Self::YtDlp => &[
                "Best for videos and reels",
                "Saves an info JSON and the thumbnail",
            ],
            Self::GalleryDl => &["Works with carousels and many other sites"],
        }
    }

    pub fn version_check(&self) -> Invocation {
        Invocation::new(self.as_str()).arg("--version")
    }

    /// Builds the download invocation for `url` into `output_dir`.
    ///
    /// Pure: the same inputs always give the same argv. Paths that are not
    /// valid UTF-8 are passed through lossily.
    pub fn build_command(&self, url: &str, output_dir: &Path) -> Result<Invocation, DownloadError> {
        let dir = output_dir.to_string_lossy();
        let invocation = match self {
            Self::InstaLoader => {
                let shortcode =
                    extract_shortcode(url).map_err(|_| DownloadError::ExtractionFailure {
                        engine: *self,
                        url: url.to_string(),
                    })?;
                // `-<shortcode>` is instaloader's own syntax for a single post
                Invocation::new(self.as_str())
                    .arg("--dirname-pattern")
                    .arg(dir)
                    .arg("--no-metadata-json")
                    .arg("--")
                    .arg(format!("-{}", shortcode))
            }
            Self::YtDlp => Invocation::new(self.as_str())
                .arg("--output")
                .arg(format!("{}/%(uploader)s_%(title)s.%(ext)s", dir))
                .arg("--write-info-json")
                .arg("--write-thumbnail")
                .arg("--no-warnings")
                .arg(url),
            Self::GalleryDl => Invocation::new(self.as_str())
                .arg("--destination")
                .arg(dir)
                .arg("--quiet")
                .arg(url),
        };
        Ok(invocation)
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Engine::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown engine: {}", s))
    }
}

/// A program plus its arguments, ready to hand to a [`super::runner::ProcessRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Program name followed by the arguments.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::error::FailureKind;

    #[test]
    fn test_instaloader_command() {
        let cmd = Engine::InstaLoader
            .build_command("https://www.instagram.com/p/ABC123/", Path::new("/tmp/out"))
            .unwrap();
        assert_eq!(
            cmd.argv(),
            vec![
                "instaloader",
                "--dirname-pattern",
                "/tmp/out",
                "--no-metadata-json",
                "--",
                "-ABC123"
            ]
        );
    }

    #[test]
    fn test_instaloader_rejects_story() {
        let err = Engine::InstaLoader
            .build_command("https://instagram.com/stories/alice/999/", Path::new("/tmp/out"))
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::ExtractionFailure);
        assert!(err.to_string().contains("could not extract content ID"));
    }

    #[test]
    fn test_ytdlp_command() {
        let url = "https://instagram.com/reel/XYZ/";
        let cmd = Engine::YtDlp.build_command(url, Path::new("/tmp/out")).unwrap();
        let argv = cmd.argv();
        assert_eq!(argv[0], "yt-dlp");
        let pos = argv.iter().position(|a| a == "--output").unwrap();
        assert_eq!(argv[pos + 1], "/tmp/out/%(uploader)s_%(title)s.%(ext)s");
        assert!(argv.contains(&"--write-info-json".to_string()));
        assert!(argv.contains(&"--write-thumbnail".to_string()));
        assert!(argv.contains(&"--no-warnings".to_string()));
        assert_eq!(argv.last().unwrap(), url);
    }

    #[test]
    fn test_gallerydl_command() {
        let url = "https://instagram.com/stories/alice/999/";
        let cmd = Engine::GalleryDl.build_command(url, Path::new("/tmp/out")).unwrap();
        assert_eq!(
            cmd.argv(),
            vec!["gallery-dl", "--destination", "/tmp/out", "--quiet", url]
        );
    }

    #[test]
    fn test_builders_are_pure() {
        let url = "https://instagram.com/p/ABC/";
        for engine in Engine::ALL {
            let a = engine.build_command(url, Path::new("/data/x")).unwrap();
            let b = engine.build_command(url, Path::new("/data/x")).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_version_check_and_names() {
        assert_eq!(Engine::YtDlp.version_check().argv(), vec!["yt-dlp", "--version"]);
        assert_eq!(Engine::GalleryDl.install_hint(), "pip install gallery-dl");
        assert_eq!("YT-DLP".parse::<Engine>().unwrap(), Engine::YtDlp);
        assert!("wget".parse::<Engine>().is_err());
        assert_eq!(Engine::default(), Engine::InstaLoader);
    }

    #[test]
    fn test_engine_serde_names() {
        let json = serde_json::to_string(&Engine::GalleryDl).unwrap();
        assert_eq!(json, "\"gallery-dl\"");
        let engine: Engine = serde_json::from_str("\"instaloader\"").unwrap();
        assert_eq!(engine, Engine::InstaLoader);
    }
}
