//! The external future value.
//!
//! A [`Promise`] is pending, fulfilled with a value, or rejected with a
//! reason, and moves out of pending exactly once. The adapter never settles a
//! promise it is awaiting — settlement belongs to whoever holds the
//! [`Settler`], typically the host event loop. Making the settler a by-move
//! handle turns "settle exactly once" from a convention into a type: double
//! settlement is unrepresentable.
//!
//! Continuations registered with [`Promise::subscribe`] never run inline;
//! they are scheduled on the queue the promise was created against, also when
//! the promise is already settled at subscription time. That keeps the
//! resumption path asynchronous and serialized per frame.

use crate::lab::JobQueue;
use crate::value::Value;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::trace;

/// Current settlement of a promise.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// Not yet settled.
    Pending,
    /// Settled with a value.
    Fulfilled(Value),
    /// Settled with a rejection reason.
    Rejected(Value),
}

impl Settlement {
    /// True once the promise has left the pending state.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub(crate) const fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fulfilled(_) => "fulfilled",
            Self::Rejected(_) => "rejected",
        }
    }
}

type Continuation = Box<dyn FnOnce(Value) + Send>;

/// One subscription: a fulfillment continuation and a rejection continuation,
/// of which exactly one will run.
struct Reaction {
    on_fulfilled: Continuation,
    on_rejected: Continuation,
}

struct PromiseInner {
    state: Settlement,
    reactions: Vec<Reaction>,
    queue: JobQueue,
}

/// A future value settled by the host event loop.
///
/// Cloning yields another handle to the same underlying state.
#[derive(Clone)]
pub struct Promise {
    inner: Arc<Mutex<PromiseInner>>,
}

impl Promise {
    /// Creates a pending promise on the given queue, together with the
    /// one-shot handle that will settle it.
    #[must_use]
    pub fn pending(queue: &JobQueue) -> (Self, Settler) {
        let inner = Arc::new(Mutex::new(PromiseInner {
            state: Settlement::Pending,
            reactions: Vec::new(),
            queue: queue.clone(),
        }));
        (
            Self {
                inner: Arc::clone(&inner),
            },
            Settler { inner },
        )
    }

    /// Queries the current settlement.
    #[must_use]
    pub fn settlement(&self) -> Settlement {
        self.inner.lock().expect("promise lock poisoned").state.clone()
    }

    /// Registers a fulfillment continuation and a rejection continuation.
    ///
    /// Exactly one of the pair runs, at most once, on the promise's queue.
    /// Subscribing to an already-settled promise schedules the matching
    /// continuation immediately; it still runs asynchronously. Reactions run
    /// in registration order.
    pub fn subscribe(
        &self,
        on_fulfilled: impl FnOnce(Value) + Send + 'static,
        on_rejected: impl FnOnce(Value) + Send + 'static,
    ) {
        let mut inner = self.inner.lock().expect("promise lock poisoned");
        match inner.state.clone() {
            Settlement::Pending => inner.reactions.push(Reaction {
                on_fulfilled: Box::new(on_fulfilled),
                on_rejected: Box::new(on_rejected),
            }),
            Settlement::Fulfilled(value) => {
                inner.queue.schedule(move || on_fulfilled(value));
            }
            Settlement::Rejected(reason) => {
                inner.queue.schedule(move || on_rejected(reason));
            }
        }
    }

    /// True when `self` and `other` are handles to the same promise.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_lock() {
            Ok(inner) => write!(f, "Promise({})", inner.state.name()),
            Err(_) => write!(f, "Promise(<locked>)"),
        }
    }
}

/// One-shot handle that settles a promise.
///
/// Consumed by [`Settler::fulfill`] or [`Settler::reject`]. Dropping it
/// unsettled leaves the promise pending forever; there is no cancellation.
pub struct Settler {
    inner: Arc<Mutex<PromiseInner>>,
}

impl Settler {
    /// Fulfills the promise with a value.
    pub fn fulfill(self, value: Value) {
        Self::settle(&self.inner, Settlement::Fulfilled(value));
    }

    /// Rejects the promise with a reason.
    pub fn reject(self, reason: Value) {
        Self::settle(&self.inner, Settlement::Rejected(reason));
    }

    fn settle(inner: &Arc<Mutex<PromiseInner>>, state: Settlement) {
        let (queue, reactions) = {
            let mut inner = inner.lock().expect("promise lock poisoned");
            debug_assert!(
                !inner.state.is_settled(),
                "settler used on a settled promise"
            );
            inner.state = state.clone();
            (inner.queue.clone(), std::mem::take(&mut inner.reactions))
        };
        trace!(state = state.name(), waiters = reactions.len(), "promise settled");
        for reaction in reactions {
            match state.clone() {
                Settlement::Fulfilled(value) => {
                    queue.schedule(move || (reaction.on_fulfilled)(value));
                }
                Settlement::Rejected(reason) => {
                    queue.schedule(move || (reaction.on_rejected)(reason));
                }
                Settlement::Pending => unreachable!("settled to pending"),
            }
        }
    }
}

impl fmt::Debug for Settler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Settler")
    }
}
