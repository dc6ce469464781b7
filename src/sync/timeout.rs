/*!
 * Timeout Scheduler
 *
 * Process-wide timer facility for asynchronous waiters: a single worker
 * thread sleeping on a deadline min-heap. On expiry it races the
 * notifier through the registry's critical section; losing the claim is
 * the defined no-op, so entries are never cancelled, just left to fire
 * stale.
 *
 * Synchronous waiters never come through here - their own parked thread
 * owns the deadline.
 */

use super::registry::WaiterRegistry;
use super::types::{WaitLocation, WaitOutcome};
use crate::core::types::SequenceId;
use log::debug;
use parking_lot::{Condvar, Mutex};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct TimerEntry {
    deadline: Instant,
    seq: SequenceId,
    location: WaitLocation,
}

struct TimerState {
    heap: BinaryHeap<Reverse<TimerEntry>>,
    shutdown: bool,
}

struct TimerShared {
    state: Mutex<TimerState>,
    condvar: Condvar,
}

/// Process-wide deadline facility
pub struct TimerThread {
    shared: Arc<TimerShared>,
    handle: Option<JoinHandle<()>>,
}

impl TimerThread {
    /// Spawn the worker; it holds its own registry handle for claims
    pub fn spawn(registry: Arc<WaiterRegistry>) -> Self {
        let shared = Arc::new(TimerShared {
            state: Mutex::new(TimerState {
                heap: BinaryHeap::new(),
                shutdown: false,
            }),
            condvar: Condvar::new(),
        });

        let worker = Arc::clone(&shared);
        let handle = thread::spawn(move || Self::run(worker, registry));

        Self {
            shared,
            handle: Some(handle),
        }
    }

    /// Register a deadline; wakes the worker in case it became the earliest
    pub fn schedule(&self, deadline: Instant, location: WaitLocation, seq: SequenceId) {
        let mut state = self.shared.state.lock();
        state.heap.push(Reverse(TimerEntry {
            deadline,
            seq,
            location,
        }));
        self.shared.condvar.notify_one();
    }

    /// Number of entries currently queued, fired or not
    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.shared.state.lock().heap.len()
    }

    fn run(shared: Arc<TimerShared>, registry: Arc<WaiterRegistry>) {
        loop {
            let due = {
                let mut state = shared.state.lock();
                loop {
                    if state.shutdown {
                        return;
                    }
                    match state.heap.peek() {
                        Some(Reverse(entry)) if entry.deadline <= Instant::now() => {
                            break state.heap.pop();
                        }
                        Some(Reverse(entry)) => {
                            let when = entry.deadline;
                            shared.condvar.wait_until(&mut state, when);
                        }
                        None => shared.condvar.wait(&mut state),
                    }
                }
            };

            let Some(Reverse(entry)) = due else { continue };

            // Claim under the registry's critical section, resume outside it
            if let Some(waiter) = registry.claim_timed_out(entry.location, entry.seq) {
                debug!(
                    "Waiter {} at {:?} timed out",
                    entry.seq, entry.location
                );
                waiter.resume(WaitOutcome::TimedOut);
            }
            // Otherwise the notifier already claimed it; stale entry, no-op
        }
    }
}

impl Drop for TimerThread {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
        }
        self.shared.condvar.notify_one();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
