//! Operation lifecycle coordination
//!
//! [`OperationRunner`] is the mutual-exclusion gate around world edits:
//! it admits one operation at a time, drives its progress surface by
//! polling the background worker, relays cancellation, and on
//! completion either commits a fresh undo checkpoint or rolls the
//! world back to the last one.

use crate::config::RunnerConfig;
use crate::error::{OpError, OpResult, RunError};
use crate::progress::OpContext;
use crate::surface::{DiagnosticSink, ProgressUi, RenderBridge};
use crate::task::OperationTask;
use crate::world::{SnapshotScope, WorldModel};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Per-run options, builder style
#[derive(Debug, Clone)]
pub struct RunOptions {
    title: String,
    message: String,
    cancelable: bool,
    checkpoint: bool,
}

impl RunOptions {
    /// Options with the given progress-surface title. Defaults:
    /// cancelable, with an implicit checkpoint after success.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: "Running operation".to_string(),
            cancelable: true,
            checkpoint: true,
        }
    }

    /// Initial status message shown before the operation reports
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Whether the progress surface offers cancellation
    pub fn cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = cancelable;
        self
    }

    /// Whether a fresh undo checkpoint is created after success
    pub fn checkpoint(mut self, checkpoint: bool) -> Self {
        self.checkpoint = checkpoint;
        self
    }
}

/// Clears the in-flight flag when the run exits, on every path
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Suspends renderer background work for a phase; resumption happens
/// on drop so no exit path can leave the renderer paused.
struct RenderPause<'a> {
    renderer: &'a dyn RenderBridge,
}

impl<'a> RenderPause<'a> {
    fn new(renderer: &'a dyn RenderBridge) -> Self {
        renderer.disable_threads();
        Self { renderer }
    }
}

impl Drop for RenderPause<'_> {
    fn drop(&mut self) {
        self.renderer.enable_threads();
    }
}

/// The mutual-exclusion gate and lifecycle driver for world edits
pub struct OperationRunner {
    config: RunnerConfig,
    world: Arc<dyn WorldModel>,
    renderer: Arc<dyn RenderBridge>,
    progress_ui: Arc<dyn ProgressUi>,
    diagnostics: Arc<dyn DiagnosticSink>,
    edit_lock: tokio::sync::Mutex<()>,
    in_flight: AtomicBool,
}

impl OperationRunner {
    /// Build a runner over its collaborator seams
    pub fn new(
        config: RunnerConfig,
        world: Arc<dyn WorldModel>,
        renderer: Arc<dyn RenderBridge>,
        progress_ui: Arc<dyn ProgressUi>,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            config,
            world,
            renderer,
            progress_ui,
            diagnostics,
            edit_lock: tokio::sync::Mutex::new(()),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether an operation is currently in flight
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one editing operation to completion.
    ///
    /// Fails fast with [`RunError::Reentrant`] if an operation is
    /// already in flight, before any worker is spawned. Otherwise the
    /// operation runs on the blocking pool while this call polls it,
    /// relaying progress and cancellation. On success (and unless
    /// disabled in `options`) a fresh undo checkpoint is created
    /// through the same phase machinery, with the edit lock held
    /// across both phases. On any failure the world is rolled back to
    /// its last checkpoint, the appropriate dialog has been shown, and
    /// the failure is returned.
    pub async fn run<T, F>(&self, options: RunOptions, op: F) -> Result<T, RunError>
    where
        T: Send + 'static,
        F: FnOnce(&OpContext) -> OpResult<T> + Send + 'static,
    {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(RunError::Reentrant);
        }
        let _in_flight = InFlightGuard(&self.in_flight);
        let _edit = self.edit_lock.lock().await;

        let value = self
            .run_phase(&options.title, &options.message, options.cancelable, op)
            .await?;

        if options.checkpoint {
            // Implicit second phase: a successful edit always leaves a
            // fresh checkpoint behind. Not cancelable, same lock.
            let world = Arc::clone(&self.world);
            self.run_phase(&options.title, &options.message, false, move |ctx| {
                ctx.update(0.0, "Creating undo point");
                world.create_undo_point_iter(ctx, SnapshotScope::ALL)?;
                Ok(())
            })
            .await?;
        }

        Ok(value)
    }

    /// One operation phase: spawn, poll, settle, commit or roll back.
    async fn run_phase<T, F>(
        &self,
        title: &str,
        message: &str,
        cancelable: bool,
        op: F,
    ) -> OpResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&OpContext) -> OpResult<T> + Send + 'static,
    {
        let started = Instant::now();
        let pause = RenderPause::new(self.renderer.as_ref());
        let mut view = self.progress_ui.begin(title, message, cancelable);

        let mut task = OperationTask::spawn(message, self.config.min_duration(), op);
        let poll = self.config.poll_interval();
        let outcome = loop {
            match task.join_timeout(poll).await {
                Some(outcome) => break outcome,
                None => {
                    let progress = task.progress();
                    view.update(progress.scaled(), &progress.message);
                    if cancelable && view.cancel_requested() {
                        task.cancel();
                    }
                }
            }
        };

        // The foreground's own smoothing floor, independent of the
        // worker-side one.
        if let Some(remainder) = self.config.min_duration().checked_sub(started.elapsed()) {
            tokio::time::sleep(remainder).await;
        }
        let last = task.progress();
        view.update(last.scaled(), &last.message);
        view.finish();

        match outcome {
            Ok(value) => {
                drop(pause);
                self.renderer.rebuild_changed();
                Ok(value)
            }
            Err(err) => {
                // Partial mutation may precede the failure (including a
                // cancellation observed mid-edit), so roll back on
                // every failure kind.
                self.world.restore_last_undo_point();
                match &err {
                    OpError::Aborted => {
                        debug!("operation aborted by user");
                    }
                    OpError::Operation(msg) => {
                        let text = format!("Error running operation: {msg}");
                        info!("{text}");
                        self.diagnostics.show_error(&text);
                    }
                    OpError::Unexpected { message, trace } => {
                        error!("exception while running operation: {message}\n{trace}");
                        self.diagnostics.show_unexpected(message, trace);
                    }
                }
                drop(pause);
                self.renderer.rebuild_changed();
                Err(err)
            }
        }
    }
}
