pub mod core;
pub mod engine;
pub mod error;
pub mod models;
pub mod progress;
pub mod runner;

pub use self::core::{DispatchSettings, Dispatcher, check_writable, prepare_output_dir};
pub use engine::{Engine, Invocation};
pub use error::{DownloadError, FailureKind};
pub use models::{DownloadJob, DownloadOutcome};
pub use progress::{JobState, ProgressReporter, ProgressUpdate};
pub use runner::{ProcessOutput, ProcessRunner, RunError, TokioProcessRunner};
