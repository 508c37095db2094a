pub mod common;
pub mod diagnostics;
pub mod downloader;
pub mod parser;
pub mod updater;

pub use downloader::{Dispatcher, DownloadJob, DownloadOutcome, Engine};
pub use parser::{ContentClassification, InstagramLink, classify, extract_shortcode};
