use colored::*;
use std::fs::OpenOptions;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, registry};

/// Log file written next to the binary's working directory.
pub const LOG_FILE: &str = "hikari_downloader.log";

/// Parses `DEBUG` / `info` / `Warning`-style names, falling back to INFO.
pub fn parse_level(name: &str) -> Level {
    match name.trim().to_ascii_uppercase().as_str() {
        "WARNING" => Level::WARN,
        "CRITICAL" => Level::ERROR,
        other => Level::from_str(other).unwrap_or(Level::INFO),
    }
}

/// Installs the global tracing subscriber. Output goes to stderr and, when
/// the file can be opened, is appended to `log_file` as well. Only the
/// terminal gets colours.
pub fn init_tracing(level: Level, log_file: Option<&Path>) {
    let file_layer = log_file
        .and_then(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| eprintln!("cannot open log file {:?}: {}", path, e))
                .ok()
        })
        .map(|file| {
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
        });

    let res = registry()
        .with(LevelFilter::from_level(level))
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .try_init();
    if let Err(e) = res {
        eprintln!("logger already initialised: {}", e);
    }
}

/// Colored status lines for the terminal.
pub struct PrettyLogger;

impl PrettyLogger {
    pub fn success(message: impl AsRef<str>) {
        println!("{} {}", "✓".green().bold(), message.as_ref());
    }

    pub fn info(message: impl AsRef<str>) {
        println!("{} {}", "ℹ".blue().bold(), message.as_ref());
    }

    pub fn warning(message: impl AsRef<str>) {
        println!("{} {}", "⚠".yellow().bold(), message.as_ref());
    }

    pub fn error(message: impl AsRef<str>) {
        eprintln!("{} {}", "✗".red().bold(), message.as_ref());
    }

    pub fn step_start(step: impl AsRef<str>) {
        println!("\n{} {}", "▶".cyan().bold(), step.as_ref().bold());
    }

    pub fn file_info(label: impl AsRef<str>, path: impl AsRef<str>) {
        println!("{} {}: {}", "📁".blue().bold(), label.as_ref().bold(), path.as_ref());
    }

    pub fn separator() {
        println!("{}", "─".repeat(50).bright_black());
    }

    pub fn title(text: impl AsRef<str>) {
        let text = text.as_ref();
        let width = text.chars().count().min(48);
        let padding = (48 - width) / 2;
        println!(
            "{} {} {}",
            "─".repeat(padding).bright_black(),
            text.bold(),
            "─".repeat(48 - padding - width).bright_black()
        );
    }

    /// Shows the detection strip for a URL: green when supported.
    pub fn detection(supported: bool, message: impl AsRef<str>) {
        if supported {
            println!("{} {}", "✅".green(), message.as_ref().green());
        } else {
            println!("{} {}", "⏳".yellow(), message.as_ref().bright_black());
        }
    }
}

#[macro_export]
macro_rules! log_success {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::success(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::info(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::warning(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::error(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_step {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::step_start(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("INFO"), Level::INFO);
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("WARNING"), Level::WARN);
        assert_eq!(parse_level("CRITICAL"), Level::ERROR);
        assert_eq!(parse_level("nonsense"), Level::INFO);
    }

    #[test]
    fn test_log_file_is_plain_text() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(LOG_FILE);
        init_tracing(Level::INFO, Some(&path));

        tracing::warn!("engine check slow");
        tracing::debug!("below the level");

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("engine check slow"));
        assert!(text.contains("WARN"));
        assert!(!text.contains("below the level"));
        assert!(!text.contains('\x1b'), "ANSI codes in {:?}", text);
    }
}
