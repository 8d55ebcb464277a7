//! Error types for operation execution

use std::backtrace::Backtrace;

/// Errors produced by an operation while it runs
#[derive(Debug, thiserror::Error)]
pub enum OpError {
    /// The operation observed a cancellation request and stopped.
    /// This is a silent outcome: no dialog is shown, but the world is
    /// still rolled back because partial edits may already exist.
    #[error("operation aborted")]
    Aborted,

    /// An expected, user-facing failure. The message is shown in a
    /// plain dialog without a trace.
    #[error("{0}")]
    Operation(String),

    /// A defect: a panic or an error no operation should produce.
    /// Both the message and the captured trace are surfaced.
    #[error("{message}")]
    Unexpected { message: String, trace: String },
}

impl OpError {
    /// Build a loud, user-facing operation failure
    pub fn operation(message: impl Into<String>) -> Self {
        OpError::Operation(message.into())
    }

    /// Build an unexpected failure, capturing a backtrace at the call site
    pub fn unexpected(message: impl Into<String>) -> Self {
        OpError::Unexpected {
            message: message.into(),
            trace: Backtrace::force_capture().to_string(),
        }
    }

    /// True for outcomes that must not surface an error dialog
    pub fn is_silent(&self) -> bool {
        matches!(self, OpError::Aborted)
    }
}

impl From<std::io::Error> for OpError {
    fn from(err: std::io::Error) -> Self {
        OpError::unexpected(err.to_string())
    }
}

/// Errors returned by [`OperationRunner::run`](crate::runner::OperationRunner::run)
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// `run` was called while another operation was in flight on the
    /// same runner. Detected before any worker is spawned.
    #[error("an operation is already running on this runner")]
    Reentrant,

    /// The operation (or the implicit checkpoint phase) failed. The
    /// runner has already rolled back and shown the appropriate dialog;
    /// this re-surfaces the failure to the caller.
    #[error(transparent)]
    Op(#[from] OpError),
}

/// Result type for operation bodies
pub type OpResult<T> = std::result::Result<T, OpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_error_display() {
        let err = OpError::operation("bad input");
        assert_eq!(err.to_string(), "bad input");
        assert!(!err.is_silent());
    }

    #[test]
    fn test_aborted_is_silent() {
        assert!(OpError::Aborted.is_silent());
    }

    #[test]
    fn test_unexpected_captures_trace() {
        let err = OpError::unexpected("boom");
        match err {
            OpError::Unexpected { message, trace } => {
                assert_eq!(message, "boom");
                assert!(!trace.is_empty());
            }
            other => panic!("wrong kind: {other:?}"),
        }
    }

    #[test]
    fn test_io_error_maps_to_unexpected() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing chunk");
        let err: OpError = io.into();
        assert!(matches!(err, OpError::Unexpected { .. }));
    }
}
