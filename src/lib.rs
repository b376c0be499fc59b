//! Corobridge: a suspension/resumption adapter between explicit coroutine
//! frames and host-settled promises.
//!
//! # Overview
//!
//! Corobridge lets sequential-looking code await externally-produced
//! asynchronous values without manual callback chaining. A computation is an
//! explicit state machine (a [`Coroutine`]) stepped by the adapter; each step
//! either awaits a [`Value`] or returns one. The promise side is settled by a
//! host event loop the adapter does not control — the adapter only observes
//! settlement and subscribes continuations.
//!
//! # Core Guarantees
//!
//! - **Exactly-once resumption**: each suspension point is resumed at most
//!   once; stale or duplicate settlements are dropped, never replayed
//! - **Rejection as a local raise**: a rejected promise awaited in throwing
//!   style raises at the await point and unwinds out of the frame
//! - **Deterministic prologue**: everything before a frame's first suspension
//!   runs synchronously, before the spawn call returns
//! - **Single teardown**: a frame's completion callbacks fire exactly once,
//!   in registration order, with the final error snapshot
//!
//! # Module Structure
//!
//! - [`value`]: Tagged host value model (the narrow capability set the
//!   adapter needs: callability, numbers, settlement queries)
//! - [`promise`]: The external future value and its settle-exactly-once handle
//! - [`coroutine`]: The [`Coroutine`] trait, resumption inputs, and the
//!   throwing/tuple spawn surfaces
//! - [`task`]: External completion-observation handle for tuple-style frames
//! - [`error`]: Typed adapter errors
//! - [`lab`]: Deterministic job queue standing in for the host event loop in
//!   tests and demos

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

mod awaiter;
pub mod coroutine;
pub mod error;
mod frame;
pub mod lab;
pub mod promise;
pub mod task;
pub mod value;

pub use coroutine::{spawn_entry, spawn_task, spawn_throwing, Coroutine, Resumption, Step};
pub use error::BridgeError;
pub use lab::JobQueue;
pub use promise::{Promise, Settlement, Settler};
pub use task::{Task, TaskError};
pub use value::{HostFn, Value};
