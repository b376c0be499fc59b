//! The suspension primitive.
//!
//! An [`Awaiter`] wraps the one value a frame is about to await, plus a
//! three-way result slot. It is created fresh for every suspension point and
//! never reused: a non-promise target fills the slot on the spot (no
//! suspend/resume round trip), while a promise target moves the awaiter into
//! the promise's continuations, which fill the slot when the host settles it
//! and resume the owning frame exactly once.

use crate::coroutine::Resumption;
use crate::frame::{self, AwaiterId, FrameRef};
use crate::value::Value;
use std::sync::{Arc, Mutex};
use tracing::trace;

/// Result slot for one suspension point.
#[derive(Debug)]
enum AwaitSlot {
    Unset,
    Fulfilled(Value),
    Rejected(Value),
}

/// One suspension point: one awaited value, one slot, used once.
#[derive(Debug)]
pub(crate) struct Awaiter {
    target: Value,
    slot: AwaitSlot,
}

impl Awaiter {
    pub(crate) const fn new(target: Value) -> Self {
        Self {
            target,
            slot: AwaitSlot::Unset,
        }
    }

    /// Fast path: fills the slot without suspending when the target is not a
    /// promise at all.
    ///
    /// Promise targets always suspend, even when already settled; delivery
    /// then goes through the host queue, so the observable effect order is
    /// the same whether settlement happened before or after the await.
    pub(crate) fn try_ready(&mut self) -> bool {
        match &self.target {
            Value::Promise(_) => false,
            other => {
                self.slot = AwaitSlot::Fulfilled(other.clone());
                true
            }
        }
    }

    /// Extracts the resumption input from the filled slot.
    pub(crate) fn take_resumption(&mut self) -> Resumption {
        match std::mem::replace(&mut self.slot, AwaitSlot::Unset) {
            AwaitSlot::Unset => unreachable!("awaiter slot read before settlement"),
            AwaitSlot::Fulfilled(value) => Resumption::Fulfilled(value),
            AwaitSlot::Rejected(reason) => Resumption::Rejected(reason),
        }
    }

    /// Suspend path: hands the awaiter to the promise's continuations.
    ///
    /// On settlement the winning continuation stores the outcome in the slot,
    /// then resumes the owning frame under this suspension's id. Exactly one
    /// continuation runs, so the slot is written once. An already-settled
    /// promise still goes through here; its continuation is scheduled on the
    /// queue right away.
    pub(crate) fn subscribe(self, owner: FrameRef, id: AwaiterId) {
        let Value::Promise(promise) = self.target.clone() else {
            unreachable!("only promises suspend");
        };
        let shared = Arc::new(Mutex::new(self));

        let fulfilled = {
            let shared = Arc::clone(&shared);
            let owner = owner.clone();
            move |value: Value| {
                let input = {
                    let mut awaiter = shared.lock().expect("awaiter lock poisoned");
                    awaiter.slot = AwaitSlot::Fulfilled(value);
                    awaiter.take_resumption()
                };
                trace!(awaiter = id, "awaited promise fulfilled");
                frame::resume(&owner, id, input);
            }
        };
        let rejected = move |reason: Value| {
            let input = {
                let mut awaiter = shared.lock().expect("awaiter lock poisoned");
                awaiter.slot = AwaitSlot::Rejected(reason);
                awaiter.take_resumption()
            };
            trace!(awaiter = id, "awaited promise rejected");
            frame::resume(&owner, id, input);
        };
        promise.subscribe(fulfilled, rejected);
    }
}
