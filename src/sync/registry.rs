/*!
 * Waiter List Registry
 *
 * Process-wide table mapping each wait location to its FIFO list of
 * pending waiters. Every mutation of any list - enqueue, dequeue for
 * wake, dequeue for timeout - happens under one mutex. That single
 * critical section is what makes arrival order total and the
 * notify/timeout race resolve exactly once.
 *
 * Lists are created on the first wait at a location and evicted by every
 * operation that leaves them empty; stale empty lists never accumulate.
 */

use super::types::{RegistryStats, WaitLocation};
use super::waiter::{ClaimKind, Waiter};
use crate::core::types::SequenceId;
use ahash::RandomState;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// FIFO list of pending waiters at one location
struct WaiterList {
    queue: VecDeque<Arc<Waiter>>,
}

impl WaiterList {
    fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }
}

/// Outcome of an enqueue attempt
pub enum EnqueueResult {
    /// Current value differed from the expected value; no waiter exists
    NotEqual,
    /// Waiter appended in arrival order
    Enqueued(Arc<Waiter>),
}

/// Process-wide table of waiter lists
///
/// Passed explicitly into the engines, the notifier, and the timer
/// thread; there is no ambient global registry.
pub struct WaiterRegistry {
    lists: Mutex<HashMap<WaitLocation, WaiterList, RandomState>>,
    /// Registry-wide sequence source. Never reset, so a sequence number
    /// identifies one waiter for the life of the process even after its
    /// list has been evicted and recreated; a stale timer entry carrying
    /// an old sequence can never match a later waiter.
    next_seq: AtomicU64,
}

impl WaiterRegistry {
    pub fn new() -> Self {
        Self {
            lists: Mutex::new(HashMap::with_hasher(RandomState::new())),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Check the expected value and enqueue a waiter in one critical section
    ///
    /// `load` runs under the lock with the same atomicity an ordinary
    /// atomic load on that memory gets, so a concurrent store-then-notify
    /// cannot slip between the equality check and the enqueue.
    pub fn enqueue_if_eq<L, M>(
        &self,
        location: WaitLocation,
        load: L,
        expected: i64,
        make: M,
    ) -> EnqueueResult
    where
        L: FnOnce() -> i64,
        M: FnOnce(SequenceId) -> Waiter,
    {
        let mut lists = self.lists.lock();

        if load() != expected {
            return EnqueueResult::NotEqual;
        }

        let list = lists.entry(location).or_insert_with(WaiterList::new);
        // Assigned under the lock, so sequences stay monotonic per location
        let seq: SequenceId = self.next_seq.fetch_add(1, Ordering::Relaxed);

        let waiter = Arc::new(make(seq));
        debug_assert_eq!(waiter.seq, seq);
        debug_assert!(waiter.state.is_waiting());
        list.queue.push_back(Arc::clone(&waiter));

        EnqueueResult::Enqueued(waiter)
    }

    /// Remove up to `limit` waiters from the front, claiming each as woken
    ///
    /// Returns the claimed waiters in arrival order; resuming them is the
    /// caller's job, outside the critical section.
    pub fn dequeue_for_notify(&self, location: WaitLocation, limit: usize) -> Vec<Arc<Waiter>> {
        let mut lists = self.lists.lock();
        let Some(list) = lists.get_mut(&location) else {
            // Notify at an idle location never creates a list
            return Vec::new();
        };

        let take = limit.min(list.queue.len());
        let mut claimed = Vec::with_capacity(take);
        for _ in 0..take {
            if let Some(waiter) = list.queue.pop_front() {
                let won = waiter.state.claim(ClaimKind::Woken);
                debug_assert!(won, "queued waiter was already resolved");
                claimed.push(waiter);
            }
        }

        if list.queue.is_empty() {
            lists.remove(&location);
        }
        claimed
    }

    /// Claim one waiter for timeout; `None` means a notify won the race
    ///
    /// Used by the timer thread for asynchronous waiters and by a
    /// synchronous waiter's own thread when its deadline elapses.
    pub fn claim_timed_out(
        &self,
        location: WaitLocation,
        seq: SequenceId,
    ) -> Option<Arc<Waiter>> {
        let mut lists = self.lists.lock();
        let list = lists.get_mut(&location)?;

        let pos = list.queue.iter().position(|w| w.seq == seq)?;
        let waiter = list.queue.remove(pos)?;
        let won = waiter.state.claim(ClaimKind::TimedOut);
        debug_assert!(won, "queued waiter was already resolved");

        if list.queue.is_empty() {
            lists.remove(&location);
        }
        Some(waiter)
    }

    /// Number of waiters currently queued at a location
    pub fn waiter_count(&self, location: WaitLocation) -> usize {
        self.lists
            .lock()
            .get(&location)
            .map(|list| list.queue.len())
            .unwrap_or(0)
    }

    /// Registry-wide diagnostics
    pub fn stats(&self) -> RegistryStats {
        let lists = self.lists.lock();
        RegistryStats {
            locations: lists.len(),
            waiters: lists.values().map(|list| list.queue.len()).sum(),
        }
    }
}

impl Default for WaiterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
