//! Progress reporting and cooperative cancellation
//!
//! Operations publish [`Progress`] snapshots through an [`OpContext`].
//! The foreground polls the latest snapshot; updates are eventually
//! consistent and staleness of one poll interval is expected.

use crate::error::{OpError, OpResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Scale used when presenting progress to a UI surface (0..=10_000)
pub const PROGRESS_SCALE: u32 = 10_000;

/// A snapshot of an operation's progress
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// Completion fraction in [0, 1], expected to advance monotonically
    pub fraction: f32,
    /// Human-readable status line
    pub message: String,
}

impl Progress {
    /// Create a new snapshot
    pub fn new(fraction: f32, message: impl Into<String>) -> Self {
        Self {
            fraction,
            message: message.into(),
        }
    }

    /// Presentation value on the 0..=10_000 scale.
    ///
    /// In-flight updates clamp to 9_999; only finalization reaches the
    /// full scale.
    pub fn scaled(&self) -> u32 {
        let raw = (self.fraction * PROGRESS_SCALE as f32) as i64;
        raw.clamp(0, PROGRESS_SCALE as i64 - 1) as u32
    }
}

/// Context handed to every operation body.
///
/// Carries the cooperative cancellation flag and the progress channel.
/// Operations that never touch the context behave as direct-result
/// operations; progress-reporting operations call [`step`](Self::step)
/// at each unit of work.
#[derive(Clone)]
pub struct OpContext {
    cancel: Arc<AtomicBool>,
    progress: watch::Sender<Progress>,
}

impl OpContext {
    /// Create a context plus the receiving end the foreground polls
    pub(crate) fn channel(initial_message: &str) -> (Self, Arc<AtomicBool>, watch::Receiver<Progress>) {
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = watch::channel(Progress::new(0.0, initial_message));
        let ctx = Self {
            cancel: cancel.clone(),
            progress: tx,
        };
        (ctx, cancel, rx)
    }

    /// Check whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Fail with [`OpError::Aborted`] if cancellation was requested
    pub fn check_cancelled(&self) -> OpResult<()> {
        if self.is_cancelled() {
            Err(OpError::Aborted)
        } else {
            Ok(())
        }
    }

    /// Publish a fraction and message together
    pub fn update(&self, fraction: f32, message: impl Into<String>) {
        let message = message.into();
        self.progress.send_modify(|p| {
            p.fraction = fraction;
            p.message = message;
        });
    }

    /// Publish only the fraction, keeping the current message
    pub fn fraction(&self, fraction: f32) {
        self.progress.send_modify(|p| p.fraction = fraction);
    }

    /// Publish only the message, keeping the current fraction
    pub fn message(&self, message: impl Into<String>) {
        let message = message.into();
        self.progress.send_modify(|p| p.message = message);
    }

    /// One unit of work: check for cancellation, then publish progress.
    ///
    /// The cancellation check happens before the update, so a cancelled
    /// operation stops at its next step without publishing further.
    pub fn step(&self, fraction: f32, message: impl Into<String>) -> OpResult<()> {
        self.check_cancelled()?;
        self.update(fraction, message);
        Ok(())
    }
}
