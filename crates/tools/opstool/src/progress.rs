//! Console progress and diagnostics surfaces

use cubedit_ops::{DiagnosticSink, ProgressUi, ProgressView, RenderBridge, PROGRESS_DONE};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// Progress surface backed by an indicatif bar.
///
/// `cancel_after` simulates a user pressing cancel that long after the
/// operation started.
pub struct ConsoleProgress {
    cancel_after: Option<Duration>,
}

impl ConsoleProgress {
    pub fn new(cancel_after: Option<Duration>) -> Self {
        Self { cancel_after }
    }
}

impl ProgressUi for ConsoleProgress {
    fn begin(&self, title: &str, message: &str, cancelable: bool) -> Box<dyn ProgressView> {
        let bar = ProgressBar::new(PROGRESS_DONE as u64);
        bar.set_style(
            ProgressStyle::with_template("{prefix:.bold} [{bar:40}] {percent:>3}% {msg}")
                .expect("static template")
                .progress_chars("=> "),
        );
        bar.set_prefix(title.to_string());
        bar.set_message(message.to_string());
        Box::new(ConsoleProgressView {
            bar,
            cancel_deadline: self
                .cancel_after
                .filter(|_| cancelable)
                .map(|d| Instant::now() + d),
        })
    }
}

struct ConsoleProgressView {
    bar: ProgressBar,
    cancel_deadline: Option<Instant>,
}

impl ProgressView for ConsoleProgressView {
    fn update(&mut self, progress: u32, message: &str) {
        self.bar.set_position(progress as u64);
        self.bar.set_message(message.to_string());
    }

    fn cancel_requested(&self) -> bool {
        self.cancel_deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    fn finish(&mut self) {
        self.bar.set_position(PROGRESS_DONE as u64);
        self.bar.finish_and_clear();
    }
}

/// Diagnostics printed to stderr, standing in for dialogs
pub struct ConsoleDiagnostics;

impl DiagnosticSink for ConsoleDiagnostics {
    fn show_error(&self, message: &str) {
        eprintln!("{message}");
    }

    fn show_unexpected(&self, message: &str, trace: &str) {
        eprintln!("Exception while running operation: {message}");
        eprintln!("{trace}");
    }
}

/// Render bridge that just logs the suspend/resume cycle
pub struct LoggingRenderer;

impl RenderBridge for LoggingRenderer {
    fn disable_threads(&self) {
        tracing::debug!("renderer threads paused");
    }

    fn enable_threads(&self) {
        tracing::debug!("renderer threads resumed");
    }

    fn rebuild_changed(&self) {
        tracing::debug!("rebuilding changed chunks");
    }
}
