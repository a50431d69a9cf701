//! Handle to a started run.

use std::sync::mpsc::{self, Receiver};

use thiserror::Error;

use crate::report::{ExecutionMode, RunResult};

use super::cancel::{CancelToken, ProgressEvent};

/// Errors from [`RunHandle::wait`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// The background worker ended without delivering a result.
    #[error("geocoding worker stopped without reporting a result")]
    WorkerLost,
}

enum Completion {
    Ready(Box<RunResult>),
    Pending(Receiver<RunResult>),
}

/// A run that has been started.
///
/// Direct, synchronous and refused runs are already finished when the
/// handle is returned. Asynchronous runs report progress through
/// [`progress`](Self::progress) and deliver their result through
/// [`wait`](Self::wait).
pub struct RunHandle {
    mode: Option<ExecutionMode>,
    cancel: CancelToken,
    progress: Receiver<ProgressEvent>,
    completion: Completion,
}

impl std::fmt::Debug for RunHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.completion {
            Completion::Ready(_) => "ready",
            Completion::Pending(_) => "pending",
        };
        f.debug_struct("RunHandle")
            .field("mode", &self.mode)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("completion", &state)
            .finish_non_exhaustive()
    }
}

impl RunHandle {
    pub(crate) fn ready(cancel: CancelToken, result: RunResult) -> Self {
        let (_, progress) = mpsc::channel();
        Self {
            mode: result.report.mode,
            cancel,
            progress,
            completion: Completion::Ready(Box::new(result)),
        }
    }

    pub(crate) const fn pending(
        cancel: CancelToken,
        progress: Receiver<ProgressEvent>,
        completion: Receiver<RunResult>,
    ) -> Self {
        Self {
            mode: Some(ExecutionMode::Asynchronous),
            cancel,
            progress,
            completion: Completion::Pending(completion),
        }
    }

    /// Mode the run uses, or `None` when it was refused.
    #[must_use]
    pub const fn mode(&self) -> Option<ExecutionMode> {
        self.mode
    }

    /// Token that cancels this run.
    #[must_use]
    pub const fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Ask the run to stop before its next row.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Blocking iterator over progress events, ending when the worker is
    /// done. Finished runs yield nothing.
    pub fn progress(&self) -> impl Iterator<Item = ProgressEvent> + '_ {
        self.progress.iter()
    }

    /// Next progress event if one is already queued.
    #[must_use]
    pub fn try_progress(&self) -> Option<ProgressEvent> {
        self.progress.try_recv().ok()
    }

    /// Whether the result is available without blocking.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.completion, Completion::Ready(_))
    }

    /// Block until the run finishes.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::WorkerLost`] when the background worker exited
    /// without sending its result.
    pub fn wait(self) -> Result<RunResult, RunError> {
        match self.completion {
            Completion::Ready(result) => Ok(*result),
            Completion::Pending(receiver) => receiver.recv().map_err(|_| RunError::WorkerLost),
        }
    }
}
