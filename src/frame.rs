//! The frame control block and its driver.
//!
//! One [`Frame`] exists per suspended computation. It is the only shared
//! mutable state in the adapter, and it is owned by being in flight: the
//! spawn call holds the sole strong reference during the synchronous
//! prologue, a pending promise subscription holds it across each suspension,
//! and teardown releases the last one. External observers ([`crate::Task`])
//! get only a weak reference.
//!
//! The status field is the explicit suspend/resume state machine:
//!
//! ```text
//!   Created ──start──► Running ──await──► Suspended{awaiter}
//!                        │  ▲                   │
//!                        │  └──── settle ───────┘
//!                        └─return/raise──► Completed (teardown, once)
//! ```
//!
//! `Running` doubles as the single-resume-at-a-time guard, and the awaiter id
//! stored in `Suspended` rejects stale settlements: a resumption that does
//! not match the suspension the frame is parked at is logged and dropped.

use crate::awaiter::Awaiter;
use crate::coroutine::{Coroutine, Resumption, Step};
use crate::promise::Settler;
use crate::task::TaskError;
use crate::value::Value;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, trace};

/// Identifies one suspension point within a frame.
pub(crate) type AwaiterId = u64;

/// Callback fired once at teardown with the final error snapshot.
pub(crate) type CompletionCallback = Box<dyn FnOnce(Option<Value>) + Send>;

/// Which composition style the frame delivers rejections in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Style {
    /// Rejection raises at the await point.
    Throwing,
    /// Rejection is delivered as data and recorded in `last_error`.
    Tuple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameStatus {
    Created,
    Running,
    Suspended { awaiter: AwaiterId },
    Completed,
}

/// Per-computation control block.
pub(crate) struct Frame {
    status: FrameStatus,
    style: Style,
    /// Taken while the coroutine is being stepped, restored on suspension.
    coroutine: Option<Box<dyn Coroutine + Send>>,
    /// Last rejection delivered to a tuple-style frame, or the terminal
    /// raise reason; the snapshot completion callbacks receive.
    last_error: Option<Value>,
    /// FIFO completion list; drained exactly once at teardown.
    callbacks: Vec<CompletionCallback>,
    /// Result sink for throwing-style frames.
    settler: Option<Settler>,
    next_awaiter: AwaiterId,
}

pub(crate) type FrameRef = Arc<Mutex<Frame>>;

impl Frame {
    pub(crate) const fn is_completed(&self) -> bool {
        matches!(self.status, FrameStatus::Completed)
    }

    /// Appends a completion callback; refused once the frame is terminal.
    pub(crate) fn push_callback(&mut self, callback: CompletionCallback) -> Result<(), TaskError> {
        if self.is_completed() {
            return Err(TaskError::Completed);
        }
        self.callbacks.push(callback);
        Ok(())
    }
}

/// Builds a fresh control block around a coroutine.
pub(crate) fn new(
    style: Style,
    coroutine: Box<dyn Coroutine + Send>,
    settler: Option<Settler>,
) -> FrameRef {
    Arc::new(Mutex::new(Frame {
        status: FrameStatus::Created,
        style,
        coroutine: Some(coroutine),
        last_error: None,
        callbacks: Vec::new(),
        settler,
        next_awaiter: 0,
    }))
}

/// Runs the synchronous prologue: everything up to the frame's first real
/// suspension executes before this returns.
pub(crate) fn start(frame: &FrameRef) {
    trace!("starting frame");
    drive(frame, None, Resumption::Start);
}

/// Resumption path, called from an awaiter continuation when the awaited
/// promise settles.
pub(crate) fn resume(frame: &FrameRef, id: AwaiterId, input: Resumption) {
    drive(frame, Some(id), input);
}

/// Steps the coroutine until it suspends on a promise or completes.
///
/// Non-promise awaits loop in place without a round trip through the event
/// loop; promise awaits always park, even when already settled, so delivery
/// order does not depend on when the host settled them.
fn drive(frame: &FrameRef, expected: Option<AwaiterId>, mut input: Resumption) {
    let Some(mut coroutine) = acquire(frame, expected) else {
        return;
    };
    loop {
        if let Resumption::Rejected(reason) = &input {
            record_rejection(frame, reason);
        }
        match coroutine.resume(input) {
            Ok(Step::Await(target)) => {
                let mut awaiter = Awaiter::new(target);
                if awaiter.try_ready() {
                    input = awaiter.take_resumption();
                    continue;
                }
                let id = park(frame, coroutine);
                trace!(awaiter = id, "frame suspended");
                awaiter.subscribe(Arc::clone(frame), id);
                return;
            }
            Ok(Step::Return(value)) => {
                complete(frame, Ok(value));
                return;
            }
            Err(reason) => {
                complete(frame, Err(reason));
                return;
            }
        }
    }
}

/// Claims the frame for execution, enforcing the state machine.
///
/// Returns the coroutine to step, or `None` when the resumption does not
/// match what the frame is waiting for (already running, already completed,
/// or a stale awaiter id).
fn acquire(frame: &FrameRef, expected: Option<AwaiterId>) -> Option<Box<dyn Coroutine + Send>> {
    let mut guard = frame.lock().expect("frame lock poisoned");
    let matches_wait = match (guard.status, expected) {
        (FrameStatus::Created, None) => true,
        (FrameStatus::Suspended { awaiter }, Some(id)) => awaiter == id,
        _ => false,
    };
    if !matches_wait {
        error!(status = ?guard.status, ?expected, "dropping resumption the frame is not waiting for");
        return None;
    }
    guard.status = FrameStatus::Running;
    let Some(coroutine) = guard.coroutine.take() else {
        error!("frame has no coroutine to resume");
        return None;
    };
    Some(coroutine)
}

/// Tuple-style frames see the rejection in `last_error` before they resume;
/// throwing-style frames get it as a raise instead.
fn record_rejection(frame: &FrameRef, reason: &Value) {
    let mut guard = frame.lock().expect("frame lock poisoned");
    if guard.style == Style::Tuple {
        guard.last_error = Some(reason.clone());
    }
}

/// Parks the frame at a new suspension point and returns its id.
fn park(frame: &FrameRef, coroutine: Box<dyn Coroutine + Send>) -> AwaiterId {
    let mut guard = frame.lock().expect("frame lock poisoned");
    let id = guard.next_awaiter;
    guard.next_awaiter += 1;
    guard.coroutine = Some(coroutine);
    guard.status = FrameStatus::Suspended { awaiter: id };
    id
}

/// Terminal transition; runs at most once per frame.
///
/// Settles the result promise (throwing style), then fires every completion
/// callback in registration order with the final error snapshot. The caller
/// drops the last strong reference right after, destroying the block.
fn complete(frame: &FrameRef, outcome: Result<Value, Value>) {
    let (settler, callbacks, snapshot) = {
        let mut guard = frame.lock().expect("frame lock poisoned");
        guard.status = FrameStatus::Completed;
        if let Err(reason) = &outcome {
            guard.last_error = Some(reason.clone());
        }
        (
            guard.settler.take(),
            std::mem::take(&mut guard.callbacks),
            guard.last_error.clone(),
        )
    };
    debug!(
        rejected = snapshot.is_some(),
        callbacks = callbacks.len(),
        "frame completed"
    );
    match (settler, outcome) {
        (Some(settler), Ok(value)) => settler.fulfill(value),
        (Some(settler), Err(reason)) => settler.reject(reason),
        (None, _) => {}
    }
    for callback in callbacks {
        callback(snapshot.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lab::JobQueue;
    use crate::promise::{Promise, Settlement};

    /// Awaits its target once, then returns whatever the await produced.
    struct AwaitOnce {
        target: Option<Value>,
    }

    impl Coroutine for AwaitOnce {
        fn resume(&mut self, input: Resumption) -> Result<Step, Value> {
            match self.target.take() {
                Some(target) => Ok(Step::Await(target)),
                None => Ok(Step::Return(input.into_result()?)),
            }
        }
    }

    fn suspended_frame(queue: &JobQueue) -> (FrameRef, crate::promise::Settler, Promise) {
        let (awaited, settler) = Promise::pending(queue);
        let (result, result_settler) = Promise::pending(queue);
        let frame = new(
            Style::Throwing,
            Box::new(AwaitOnce {
                target: Some(Value::Promise(awaited)),
            }),
            Some(result_settler),
        );
        start(&frame);
        (frame, settler, result)
    }

    #[test]
    fn prologue_suspends_at_first_pending_await() {
        let queue = JobQueue::new();
        let (frame, _settler, result) = suspended_frame(&queue);
        assert_eq!(
            frame.lock().unwrap().status,
            FrameStatus::Suspended { awaiter: 0 }
        );
        assert_eq!(result.settlement(), Settlement::Pending);
    }

    #[test]
    fn stale_resumption_is_dropped() {
        let queue = JobQueue::new();
        let (frame, settler, result) = suspended_frame(&queue);

        // Wrong awaiter id: must not move the frame.
        resume(&frame, 7, Resumption::Fulfilled(Value::number(1.0)));
        assert_eq!(
            frame.lock().unwrap().status,
            FrameStatus::Suspended { awaiter: 0 }
        );

        settler.fulfill(Value::number(2.0));
        queue.run_until_idle();
        assert_eq!(result.settlement(), Settlement::Fulfilled(Value::number(2.0)));
    }

    #[test]
    fn resumption_after_completion_is_dropped() {
        let queue = JobQueue::new();
        let (frame, settler, result) = suspended_frame(&queue);
        settler.fulfill(Value::number(3.0));
        queue.run_until_idle();
        assert!(frame.lock().unwrap().is_completed());

        resume(&frame, 0, Resumption::Fulfilled(Value::number(9.0)));
        assert_eq!(result.settlement(), Settlement::Fulfilled(Value::number(3.0)));
    }

    #[test]
    fn callback_registration_after_teardown_is_refused() {
        let queue = JobQueue::new();
        let (frame, settler, _result) = suspended_frame(&queue);
        assert!(frame
            .lock()
            .unwrap()
            .push_callback(Box::new(|_| {}))
            .is_ok());

        settler.fulfill(Value::Undefined);
        queue.run_until_idle();
        assert_eq!(
            frame.lock().unwrap().push_callback(Box::new(|_| {})),
            Err(TaskError::Completed)
        );
    }

    #[test]
    fn terminal_raise_is_the_callback_snapshot() {
        let queue = JobQueue::new();
        let (frame, settler, result) = suspended_frame(&queue);
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            frame
                .lock()
                .unwrap()
                .push_callback(Box::new(move |snapshot| {
                    seen.lock().unwrap().push(snapshot);
                }))
                .unwrap();
        }

        settler.reject(Value::text("bad"));
        queue.run_until_idle();
        assert_eq!(result.settlement(), Settlement::Rejected(Value::text("bad")));
        assert_eq!(*seen.lock().unwrap(), vec![Some(Value::text("bad"))]);
    }
}
