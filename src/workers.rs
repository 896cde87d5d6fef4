//! Bounded worker pool for the network-bound stages.
//!
//! Lookups and route requests are independent per item. They run on a small
//! dedicated rayon pool, are spaced out through a shared [`Throttle`], and
//! stop being issued once the phase [`Deadline`] passes.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::warn;

/// Enforces a minimum gap between consecutive request starts across all
/// workers sharing it.
#[derive(Debug)]
pub struct Throttle {
    spacing: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(spacing: Duration) -> Self {
        Self {
            spacing,
            next_slot: Mutex::new(None),
        }
    }

    /// Blocks until the caller may issue its request.
    pub fn wait(&self) {
        if self.spacing.is_zero() {
            return;
        }
        let slot = {
            let mut next = self.next_slot.lock().unwrap_or_else(PoisonError::into_inner);
            let now = Instant::now();
            let slot = next.map_or(now, |at| at.max(now));
            *next = Some(slot + self.spacing);
            slot
        };
        let now = Instant::now();
        if slot > now {
            std::thread::sleep(slot - now);
        }
    }
}

/// Point in time after which no new requests are started.
///
/// Only request starts are gated; work already running finishes on its own
/// timeout.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    pub fn after(timeout: Option<Duration>) -> Self {
        Self(timeout.map(|timeout| Instant::now() + timeout))
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn expired(&self) -> bool {
        self.0.is_some_and(|at| Instant::now() >= at)
    }
}

/// Outcome of one unit of work.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt<T> {
    Done(T),
    /// The deadline passed before the request was issued.
    Skipped,
}

/// Runs `work` over `items` on at most `concurrency` threads, preserving
/// input order in the output.
///
/// Items not yet started when `deadline` passes come back as
/// [`Attempt::Skipped`].
pub fn run_bounded<I, T, F>(
    items: &[I],
    concurrency: usize,
    throttle: &Throttle,
    deadline: Deadline,
    work: F,
) -> Vec<Attempt<T>>
where
    I: Sync,
    T: Send,
    F: Fn(&I) -> T + Sync,
{
    let attempt = |item: &I| {
        if deadline.expired() {
            return Attempt::Skipped;
        }
        throttle.wait();
        if deadline.expired() {
            return Attempt::Skipped;
        }
        Attempt::Done(work(item))
    };

    if concurrency <= 1 || items.len() <= 1 {
        return items.iter().map(attempt).collect();
    }

    match rayon::ThreadPoolBuilder::new()
        .num_threads(concurrency)
        .thread_name(|i| format!("facility-tour-worker-{i}"))
        .build()
    {
        Ok(pool) => pool.install(|| items.par_iter().map(attempt).collect()),
        Err(err) => {
            warn!(error = %err, "worker pool unavailable, running sequentially");
            items.iter().map(attempt).collect()
        }
    }
}
