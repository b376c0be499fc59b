//! Deterministic stand-in for the host event loop.
//!
//! The adapter never schedules anything itself; promise continuations are
//! invoked asynchronously by whatever loop owns the promise. In tests and
//! demos that loop is a [`JobQueue`]: a plain FIFO of boxed jobs drained by
//! [`JobQueue::run_until_idle`]. Draining is single-threaded, so frames are
//! resumed serially and runs are reproducible.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::trace;

/// A unit of work scheduled by a promise settlement.
pub type Job = Box<dyn FnOnce() + Send>;

/// FIFO job queue playing the role of the host event loop.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone, Default)]
pub struct JobQueue {
    jobs: Arc<Mutex<VecDeque<Job>>>,
}

impl JobQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a job to the back of the queue.
    pub fn schedule(&self, job: impl FnOnce() + Send + 'static) {
        let mut jobs = self.jobs.lock().expect("job queue lock poisoned");
        jobs.push_back(Box::new(job));
        trace!(depth = jobs.len(), "job scheduled");
    }

    /// Runs jobs in order until the queue is empty, returning how many ran.
    ///
    /// Jobs scheduled while draining run in the same call; the queue lock is
    /// not held while a job executes, so jobs may schedule freely.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            let job = {
                let mut jobs = self.jobs.lock().expect("job queue lock poisoned");
                jobs.pop_front()
            };
            let Some(job) = job else { return ran };
            job();
            ran += 1;
        }
    }

    /// Returns true when no jobs are waiting.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.jobs.lock().expect("job queue lock poisoned").is_empty()
    }
}

impl fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.jobs.try_lock() {
            Ok(jobs) => write!(f, "JobQueue(depth={})", jobs.len()),
            Err(_) => write!(f, "JobQueue(<locked>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_jobs_in_fifo_order() {
        let queue = JobQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for label in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            queue.schedule(move || log.lock().unwrap().push(label));
        }
        assert_eq!(queue.run_until_idle(), 3);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn jobs_scheduled_while_draining_run_in_same_pass() {
        let queue = JobQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let inner_log = Arc::clone(&log);
        let requeue = queue.clone();
        queue.schedule(move || {
            inner_log.lock().unwrap().push("outer");
            let inner_log = Arc::clone(&inner_log);
            requeue.schedule(move || inner_log.lock().unwrap().push("inner"));
        });
        assert_eq!(queue.run_until_idle(), 2);
        assert_eq!(*log.lock().unwrap(), vec!["outer", "inner"]);
    }

    #[test]
    fn idle_queue_reports_idle() {
        let queue = JobQueue::new();
        assert!(queue.is_idle());
        queue.schedule(|| {});
        assert!(!queue.is_idle());
        queue.run_until_idle();
        assert!(queue.is_idle());
    }
}
