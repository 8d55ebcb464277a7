//! Operation execution and undo coordination for Cubedit
//!
//! This crate runs long-lived, cancelable world-editing operations on a
//! background worker while the foreground polls progress, and keeps the
//! undo history consistent around them:
//!
//! - **Background execution**: one worker per operation, spawned on the
//!   blocking pool, panics captured rather than propagated
//! - **Progress + cancellation**: operations report [`Progress`]
//!   snapshots through an [`OpContext`] and observe cancellation
//!   cooperatively at their own step points
//! - **Mutual exclusion**: an [`OperationRunner`] admits one edit at a
//!   time and fails fast on re-entrant calls
//! - **Commit or roll back**: success leaves a fresh undo checkpoint
//!   behind; any failure (including silent user cancellation) restores
//!   the last one
//!
//! # Example
//!
//! ```rust,ignore
//! use cubedit_ops::{OperationRunner, RunOptions, RunnerConfig};
//!
//! let runner = OperationRunner::new(RunnerConfig::load(), world, renderer, progress_ui, diagnostics);
//! let placed = runner
//!     .run(RunOptions::new("Fill selection"), |ctx| {
//!         for (i, chunk) in chunks.iter().enumerate() {
//!             ctx.step(i as f32 / chunks.len() as f32, "Filling chunks")?;
//!             fill(chunk)?;
//!         }
//!         Ok(chunks.len())
//!     })
//!     .await?;
//! ```
//!
//! # Modules
//!
//! - [`config`]: runner cadence configuration
//! - [`error`]: operation and runner error taxonomy
//! - [`progress`]: progress snapshots and the operation context
//! - [`runner`]: the mutual-exclusion gate and lifecycle driver
//! - [`session`]: edit session façade (save, undo, redo, events)
//! - [`surface`]: renderer / progress / diagnostic seams
//! - [`task`]: background execution of a single operation
//! - [`world`]: the world model and checkpoint seam

pub mod config;
pub mod error;
pub mod progress;
pub mod runner;
pub mod session;
pub mod surface;
pub mod task;
pub mod world;

// Re-export commonly used types
pub use config::RunnerConfig;
pub use error::{OpError, OpResult, RunError};
pub use progress::{OpContext, Progress, PROGRESS_SCALE};
pub use runner::{OperationRunner, RunOptions};
pub use session::{EditEvent, EditSession};
pub use surface::{
    DiagnosticSink, LogDiagnostics, NullProgressUi, NullRenderBridge, ProgressUi, ProgressView,
    RenderBridge, PROGRESS_DONE,
};
pub use task::OperationTask;
pub use world::{SnapshotScope, WorldModel};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::RunnerConfig;
    pub use crate::error::{OpError, OpResult, RunError};
    pub use crate::progress::{OpContext, Progress};
    pub use crate::runner::{OperationRunner, RunOptions};
    pub use crate::session::{EditEvent, EditSession};
    pub use crate::surface::{DiagnosticSink, ProgressUi, ProgressView, RenderBridge};
    pub use crate::world::{SnapshotScope, WorldModel};
}
