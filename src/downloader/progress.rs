use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use tokio::sync::mpsc::UnboundedSender;

/// Lifecycle of a single download job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Preparing,
    EngineCheck,
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Preparing => "preparing",
            Self::EngineCheck => "checking engine",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub state: JobState,
    /// 0..=100, only for display
    pub percent: u8,
    pub message: String,
}

impl ProgressUpdate {
    pub fn new(state: JobState, percent: u8, message: impl Into<String>) -> Self {
        Self {
            state,
            percent: percent.min(100),
            message: message.into(),
        }
    }
}

/// Receives coarse progress from the dispatcher and the updater.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

impl<F> ProgressReporter for F
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        self(update)
    }
}

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _update: ProgressUpdate) {}
}

/// Forwards updates into a channel; a closed receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelReporter(pub UnboundedSender<ProgressUpdate>);

impl ProgressReporter for ChannelReporter {
    fn report(&self, update: ProgressUpdate) {
        let _ = self.0.send(update);
    }
}

/// Terminal progress bar for the CLI.
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] {bar:30} {pos:>3}% {msg}")
        {
            bar.set_style(style);
        }
        bar.enable_steady_tick(std::time::Duration::from_millis(120));
        Self { bar }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, update: ProgressUpdate) {
        self.bar.set_position(update.percent as u64);
        self.bar.set_message(update.message);
        if update.state.is_terminal() {
            self.bar.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_reporter() {
        let seen = Mutex::new(Vec::new());
        let reporter = |u: ProgressUpdate| seen.lock().unwrap().push(u.percent);
        reporter.report(ProgressUpdate::new(JobState::Preparing, 10, "a"));
        reporter.report(ProgressUpdate::new(JobState::Completed, 250, "b"));
        assert_eq!(*seen.lock().unwrap(), vec![10, 100]);
    }

    #[tokio::test]
    async fn test_channel_reporter() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let reporter = ChannelReporter(tx);
        reporter.report(ProgressUpdate::new(JobState::Running, 60, "downloading"));
        let update = rx.recv().await.unwrap();
        assert_eq!(update.state, JobState::Running);
        assert_eq!(update.message, "downloading");

        drop(rx);
        reporter.report(ProgressUpdate::new(JobState::Failed, 60, "ignored"));
    }
}
