//! Fan-out/fan-in completion for concurrent child operations
//!
//! Every recursive tree operation starts one child operation per directory
//! entry, waits for all of them, and reports either the aggregate result or
//! the first error. [`FanOutCoordinator`] is the bookkeeping for that, and
//! [`fan_out`] drives a set of child futures through it.
//!
//! Two properties matter:
//!
//! - A failed child never cancels its siblings. Everything already started
//!   runs to completion; only the first error is reported.
//! - Zero children complete immediately, so empty directories cannot stall
//!   an operation.

use crate::error::{FileError, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use tracing::trace;

/// Completion counter for a known number of concurrent units of work
///
/// The coordinator is complete exactly when `completed == expected`. Failed
/// units count toward completion so an operation terminates instead of
/// hanging; the first failure is kept and later ones are dropped.
///
/// [`finish`](Self::finish) consumes the coordinator, so the outcome can be
/// taken only once.
#[derive(Debug)]
pub struct FanOutCoordinator {
    expected: usize,
    completed: usize,
    failed: Option<FileError>,
}

impl FanOutCoordinator {
    /// Start tracking `expected` units of work
    #[must_use]
    pub const fn start(expected: usize) -> Self {
        Self {
            expected,
            completed: 0,
            failed: None,
        }
    }

    /// Record a unit that finished successfully
    ///
    /// Returns `true` if this completed the whole set.
    pub fn unit_succeeded(&mut self) -> bool {
        self.completed += 1;
        debug_assert!(
            self.completed <= self.expected,
            "more units completed than were started"
        );
        self.is_complete()
    }

    /// Record a unit that failed
    ///
    /// Only the first error is kept. Returns `true` if this completed the
    /// whole set.
    pub fn unit_failed(&mut self, error: FileError) -> bool {
        if self.failed.is_none() {
            self.failed = Some(error);
        } else {
            trace!("Dropping sibling error after first failure: {}", error);
        }
        self.unit_succeeded()
    }

    /// Whether every expected unit has reported
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.completed >= self.expected
    }

    /// Whether any unit has failed so far
    #[must_use]
    pub const fn has_failed(&self) -> bool {
        self.failed.is_some()
    }

    /// Number of units started
    #[must_use]
    pub const fn expected(&self) -> usize {
        self.expected
    }

    /// Number of units that have reported
    #[must_use]
    pub const fn completed(&self) -> usize {
        self.completed
    }

    /// Take the outcome: the first error, or `Ok(())`
    ///
    /// # Errors
    ///
    /// Returns the first error recorded by [`unit_failed`](Self::unit_failed).
    pub fn finish(self) -> Result<()> {
        debug_assert!(self.is_complete(), "finished before all units reported");
        match self.failed {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Run every unit concurrently and gather their results
///
/// Units are polled together on the current task; they may complete in any
/// order and the returned values are in completion order. With no units the
/// call returns immediately without polling anything.
///
/// # Errors
///
/// Returns the first error any unit produced, after all units have finished.
pub async fn fan_out<T, Fut, I>(units: I) -> Result<Vec<T>>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = Result<T>>,
{
    let mut pending: FuturesUnordered<Fut> = units.into_iter().collect();
    let mut coordinator = FanOutCoordinator::start(pending.len());
    if coordinator.is_complete() {
        return coordinator.finish().map(|()| Vec::new());
    }

    let mut values = Vec::with_capacity(coordinator.expected());
    while let Some(outcome) = pending.next().await {
        let done = match outcome {
            Ok(value) => {
                values.push(value);
                coordinator.unit_succeeded()
            }
            Err(error) => coordinator.unit_failed(error),
        };
        trace!(
            "Fan-out progress: {}/{} (failed: {})",
            coordinator.completed(),
            coordinator.expected(),
            coordinator.has_failed()
        );
        if done {
            break;
        }
    }

    coordinator.finish().map(|()| values)
}
