//! The coroutine trait and its spawn surfaces.
//!
//! A computation is an explicit state machine: [`Coroutine::resume`] runs the
//! code between two suspension points and says what happens next — await a
//! value or return one. Raising is the `Err` arm of `resume`: `?` at an await
//! point is the in-frame unwind, and an error that escapes `resume` becomes
//! the frame's terminal rejection.
//!
//! Two composition styles share the machinery:
//!
//! - **Throwing** ([`spawn_throwing`], [`spawn_entry`]): rejection of an
//!   awaited promise raises at the await point; the spawn returns a
//!   [`Promise`] carrying the frame's own settlement.
//! - **Tuple** ([`spawn_task`]): rejection is delivered as data via
//!   [`Resumption::into_settlement`] and recorded on the frame for completion
//!   callbacks; the spawn returns a [`Task`] handle that only ever reports
//!   completion.

use crate::error::BridgeError;
use crate::frame::{self, Style};
use crate::lab::JobQueue;
use crate::promise::Promise;
use crate::task::Task;
use crate::value::Value;
use std::sync::Arc;

/// Input delivered to a frame when it resumes.
#[derive(Debug, Clone)]
pub enum Resumption {
    /// First resumption after spawn; nothing has been awaited yet.
    Start,
    /// The awaited value fulfilled.
    Fulfilled(Value),
    /// The awaited value rejected; throwing-style code raises this.
    Rejected(Value),
}

impl Resumption {
    /// Throwing extraction: `?` at the await point raises the rejection
    /// reason, unwinding out of the frame like a thrown exception.
    pub fn into_result(self) -> Result<Value, Value> {
        match self {
            Self::Start => Ok(Value::Undefined),
            Self::Fulfilled(value) => Ok(value),
            Self::Rejected(reason) => Err(reason),
        }
    }

    /// Tuple extraction: exactly one side is meaningful, nothing raises.
    #[must_use]
    pub fn into_settlement(self) -> (Value, Option<Value>) {
        match self {
            Self::Start => (Value::Undefined, None),
            Self::Fulfilled(value) => (value, None),
            Self::Rejected(reason) => (Value::Undefined, Some(reason)),
        }
    }
}

/// What one step of a frame decided to do next.
#[derive(Debug)]
pub enum Step {
    /// Suspend until the value settles. Awaiting a non-promise value is
    /// legal and resumes immediately with that value.
    Await(Value),
    /// Terminal: the computation produced a value.
    Return(Value),
}

/// One suspendable computation, written as an explicit state machine.
///
/// `resume` is called once with [`Resumption::Start`] and then once per
/// settled await. It must not be re-entered while running; the adapter's
/// frame guard enforces this.
pub trait Coroutine {
    /// Runs up to the next suspension point or to completion.
    fn resume(&mut self, input: Resumption) -> Result<Step, Value>;
}

/// Starts a throwing-style computation.
///
/// The frame's prologue — everything before its first suspension — runs
/// synchronously before this returns. The returned promise carries the
/// frame's eventual settlement: its return value, or the reason of an
/// unhandled raise.
pub fn spawn_throwing(queue: &JobQueue, coroutine: impl Coroutine + Send + 'static) -> Promise {
    let (promise, settler) = Promise::pending(queue);
    let frame = frame::new(Style::Throwing, Box::new(coroutine), Some(settler));
    frame::start(&frame);
    promise
}

/// Starts a tuple-style computation and returns its completion handle.
///
/// The handle carries no value; it reports completion with the frame's final
/// error snapshot. A rejected await is recorded on the frame before the
/// coroutine resumes, so the reason is visible both to the awaiting code and
/// to completion callbacks.
pub fn spawn_task(coroutine: impl Coroutine + Send + 'static) -> Task {
    let frame = frame::new(Style::Tuple, Box::new(coroutine), None);
    let task = Task::new(Arc::downgrade(&frame));
    frame::start(&frame);
    task
}

/// Starts a throwing-style computation from a host entry function.
///
/// A non-callable entry fails here, synchronously, and never reaches the
/// asynchronous path. Otherwise the entry is called once and its result is
/// awaited twice in sequence: once for the value it returns, once more for
/// whatever that value produces (chained awaiting, for entries that resolve
/// to another awaitable).
pub fn spawn_entry(queue: &JobQueue, entry: Value) -> Result<Promise, BridgeError> {
    if !entry.is_callable() {
        return Err(BridgeError::NotCallable);
    }
    Ok(spawn_throwing(queue, EntryFrame::new(entry)))
}

/// Adapter frame behind [`spawn_entry`].
struct EntryFrame {
    entry: Value,
    stage: EntryStage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryStage {
    Call,
    AwaitReturned,
    AwaitProduced,
}

impl EntryFrame {
    fn new(entry: Value) -> Self {
        Self {
            entry,
            stage: EntryStage::Call,
        }
    }
}

impl Coroutine for EntryFrame {
    fn resume(&mut self, input: Resumption) -> Result<Step, Value> {
        match self.stage {
            EntryStage::Call => {
                self.stage = EntryStage::AwaitReturned;
                let returned = self.entry.call(Value::Undefined)?;
                Ok(Step::Await(returned))
            }
            EntryStage::AwaitReturned => {
                self.stage = EntryStage::AwaitProduced;
                Ok(Step::Await(input.into_result()?))
            }
            EntryStage::AwaitProduced => Ok(Step::Return(input.into_result()?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_resumes_with_undefined() {
        assert_eq!(Resumption::Start.into_result(), Ok(Value::Undefined));
        assert_eq!(
            Resumption::Start.into_settlement(),
            (Value::Undefined, None)
        );
    }

    #[test]
    fn throwing_extraction_raises_the_reason() {
        let input = Resumption::Rejected(Value::text("bad"));
        assert_eq!(input.into_result(), Err(Value::text("bad")));
    }

    #[test]
    fn tuple_extraction_delivers_rejection_as_data() {
        let (value, error) = Resumption::Rejected(Value::text("bad")).into_settlement();
        assert_eq!(value, Value::Undefined);
        assert_eq!(error, Some(Value::text("bad")));

        let (value, error) = Resumption::Fulfilled(Value::number(3.0)).into_settlement();
        assert_eq!(value, Value::number(3.0));
        assert_eq!(error, None);
    }

    #[test]
    fn spawn_entry_rejects_non_callable_synchronously() {
        let queue = JobQueue::new();
        assert_eq!(
            spawn_entry(&queue, Value::number(1.0)).unwrap_err(),
            BridgeError::NotCallable
        );
        assert!(queue.is_idle(), "misuse must not touch the event loop");
    }
}
