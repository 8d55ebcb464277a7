//! Seams to the renderer and to whatever front-end hosts the runner
//!
//! The original subsystem drove a modal progress dialog and message
//! boxes directly; here those are injected traits so the runner works
//! headless, under test, or behind any toolkit.

use crate::progress::PROGRESS_SCALE;

/// Renderer coordination during an edit.
///
/// Background chunk streaming must not observe a world mid-mutation,
/// so the runner suspends it for the duration of every operation and
/// resumes it on every exit path.
pub trait RenderBridge: Send + Sync {
    /// Pause background mesh/streaming work
    fn disable_threads(&self);

    /// Resume background mesh/streaming work
    fn enable_threads(&self);

    /// Re-mesh chunks whose content changed during the edit
    fn rebuild_changed(&self);
}

/// Factory for per-operation progress surfaces
pub trait ProgressUi: Send + Sync {
    /// Open a progress surface for one operation
    fn begin(&self, title: &str, message: &str, cancelable: bool) -> Box<dyn ProgressView>;
}

/// One operation's progress surface.
///
/// `progress` is on the 0..=10_000 scale; the runner always drives the
/// view to the full scale via [`finish`](Self::finish) before teardown,
/// whatever the outcome.
pub trait ProgressView: Send {
    /// Push the latest progress snapshot
    fn update(&mut self, progress: u32, message: &str);

    /// Whether the user asked to cancel since the last poll
    fn cancel_requested(&self) -> bool;

    /// Drive the view to 100% and tear it down
    fn finish(&mut self);
}

/// Failure presentation
pub trait DiagnosticSink: Send + Sync {
    /// Show an expected, user-facing failure (message only)
    fn show_error(&self, message: &str);

    /// Show a defect: message plus the captured trace
    fn show_unexpected(&self, message: &str, trace: &str);
}

/// Progress surface that discards updates and never cancels.
/// Useful headless and in tests.
pub struct NullProgressUi;

impl ProgressUi for NullProgressUi {
    fn begin(&self, _title: &str, _message: &str, _cancelable: bool) -> Box<dyn ProgressView> {
        Box::new(NullProgressView)
    }
}

struct NullProgressView;

impl ProgressView for NullProgressView {
    fn update(&mut self, _progress: u32, _message: &str) {}

    fn cancel_requested(&self) -> bool {
        false
    }

    fn finish(&mut self) {}
}

/// Diagnostic sink that only logs, for headless use
pub struct LogDiagnostics;

impl DiagnosticSink for LogDiagnostics {
    fn show_error(&self, message: &str) {
        tracing::warn!("{message}");
    }

    fn show_unexpected(&self, message: &str, trace: &str) {
        tracing::error!("{message}\n{trace}");
    }
}

/// Render bridge for hosts with no renderer attached
pub struct NullRenderBridge;

impl RenderBridge for NullRenderBridge {
    fn disable_threads(&self) {}

    fn enable_threads(&self) {}

    fn rebuild_changed(&self) {}
}

/// The full-scale value views are driven to on finish
pub const PROGRESS_DONE: u32 = PROGRESS_SCALE;
