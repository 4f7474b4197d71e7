//! Last-writer-wins sequencing for one logical query.
//!
//! Concurrent calls resolve in any order. When only the most recently
//! issued call matters (re-fetching as the user switches farms), each call
//! takes a ticket and a response is applied only if its ticket is still the
//! latest.

#[cfg(test)]
#[path = "sequence_test.rs"]
mod sequence_test;

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
pub struct QueryGeneration {
    latest: AtomicU64,
}

impl QueryGeneration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new ticket, superseding every earlier one.
    pub fn begin(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }

    /// Await `call` under a fresh ticket. Yields `None` if a later call began
    /// before this one finished.
    pub async fn run_latest<F, T>(&self, call: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let ticket = self.begin();
        let output = call.await;
        if self.is_current(ticket) {
            Some(output)
        } else {
            tracing::debug!(ticket = ticket.0, "discarding stale response");
            None
        }
    }
}
