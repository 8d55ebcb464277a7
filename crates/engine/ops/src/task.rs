//! Background execution of a single editing operation
//!
//! An [`OperationTask`] wraps one caller-supplied operation and runs it
//! on the blocking thread pool. The launching side keeps a handle for
//! polling progress, requesting cancellation, and joining the result.
//! Tasks are created fresh per run and never reused.

use crate::error::{OpError, OpResult};
use crate::progress::{OpContext, Progress};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle to one in-flight operation
pub struct OperationTask<T> {
    cancel: Arc<AtomicBool>,
    progress: watch::Receiver<Progress>,
    handle: Option<JoinHandle<OpResult<T>>>,
}

impl<T: Send + 'static> OperationTask<T> {
    /// Launch `op` on the blocking pool and return immediately.
    ///
    /// `min_duration` is the smoothing floor: once the operation body
    /// has finished (on any outcome), the worker sleeps out the
    /// remainder so near-instant operations do not flicker through the
    /// progress surface.
    pub fn spawn<F>(initial_message: &str, min_duration: Duration, op: F) -> Self
    where
        F: FnOnce(&OpContext) -> OpResult<T> + Send + 'static,
    {
        let (ctx, cancel, progress) = OpContext::channel(initial_message);

        let handle = tokio::task::spawn_blocking(move || {
            let started = Instant::now();
            let result = match catch_unwind(AssertUnwindSafe(|| op(&ctx))) {
                Ok(result) => result,
                Err(payload) => Err(OpError::unexpected(panic_message(payload.as_ref()))),
            };
            if let Some(remainder) = min_duration.checked_sub(started.elapsed()) {
                std::thread::sleep(remainder);
            }
            result
        });

        Self {
            cancel,
            progress,
            handle: Some(handle),
        }
    }

    /// Request cooperative cancellation.
    ///
    /// The operation observes this at its next cancellation check; an
    /// operation that never checks cannot be cancelled.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Latest progress snapshot
    pub fn progress(&self) -> Progress {
        self.progress.borrow().clone()
    }

    /// Whether the worker has terminated
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Wait up to `timeout` for the worker to terminate.
    ///
    /// Returns `Some(outcome)` once the worker has been joined, `None`
    /// if it is still running when the timeout elapses. After `Some`
    /// the handle is consumed and further calls return `None`.
    pub async fn join_timeout(&mut self, timeout: Duration) -> Option<OpResult<T>> {
        let handle = self.handle.as_mut()?;
        match tokio::time::timeout(timeout, handle).await {
            Ok(joined) => {
                self.handle = None;
                Some(flatten_join(joined))
            }
            Err(_elapsed) => None,
        }
    }

    /// Wait for the worker to terminate and return its outcome
    pub async fn join(mut self) -> OpResult<T> {
        match self.handle.take() {
            Some(handle) => flatten_join(handle.await),
            None => Err(OpError::unexpected("task result already consumed")),
        }
    }
}

fn flatten_join<T>(joined: Result<OpResult<T>, tokio::task::JoinError>) -> OpResult<T> {
    match joined {
        Ok(result) => result,
        // Panics are caught inside the worker; a join error here means
        // the runtime tore the task down underneath us.
        Err(err) => Err(OpError::unexpected(format!("worker lost: {err}"))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unhandled panic in operation".to_string()
    }
}
