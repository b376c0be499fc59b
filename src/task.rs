//! External completion-observation handle for tuple-style frames.
//!
//! A [`Task`] lets code outside any coroutine observe when a suspended
//! computation finishes. It holds only a weak reference to the frame control
//! block — the block's lifetime is the computation's, never a handle's — so
//! registering on a finished computation fails with a defined error instead
//! of being undefined behavior.

use crate::frame::Frame;
use crate::value::Value;
use std::fmt;
use std::sync::{Mutex, Weak};
use thiserror::Error;

/// Error returned when registering on a task that already finished.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TaskError {
    /// The frame reached its terminal state; the control block no longer
    /// accepts registrations.
    #[error("task already completed")]
    Completed,
}

/// Copyable handle to a tuple-style computation.
///
/// The handle carries no value. It supports registering completion callbacks
/// that fire exactly once, in registration order, when the frame reaches its
/// terminal state, each receiving the final error snapshot (`None` when no
/// rejection occurred). Registering the same callback twice fires it twice.
#[derive(Clone)]
pub struct Task {
    inner: Weak<Mutex<Frame>>,
}

impl Task {
    pub(crate) fn new(inner: Weak<Mutex<Frame>>) -> Self {
        Self { inner }
    }

    /// Registers a completion callback on the frame control block.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Completed`] once the frame has reached its
    /// terminal state, whether or not the block is already gone.
    pub fn on_complete(
        &self,
        callback: impl FnOnce(Option<Value>) + Send + 'static,
    ) -> Result<(), TaskError> {
        let Some(frame) = self.inner.upgrade() else {
            return Err(TaskError::Completed);
        };
        let mut guard = frame.lock().expect("frame lock poisoned");
        guard.push_callback(Box::new(callback))
    }

    /// True once the computation has reached its terminal state.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        match self.inner.upgrade() {
            None => true,
            Some(frame) => frame.lock().expect("frame lock poisoned").is_completed(),
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task(finished={})", self.is_finished())
    }
}
