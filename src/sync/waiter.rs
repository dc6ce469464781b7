/*!
 * Waiter Records
 *
 * One pending wait: arrival order, deadline, resumption mechanism, and a
 * claim state that can be resolved at most once. The notifier and the
 * timeout scheduler both go through [`Waiter::resume`], pattern-matching
 * on the resumption variant instead of running parallel code paths.
 */

use super::future::FutureShared;
use super::types::{WaitLocation, WaitOutcome};
use crate::core::types::SequenceId;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

const STATE_WAITING: u8 = 0;
const STATE_WOKEN: u8 = 1;
const STATE_TIMED_OUT: u8 = 2;

/// Terminal states a waiter can be claimed into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimKind {
    Woken,
    TimedOut,
}

/// Tri-state lifecycle of a waiter: Waiting, then exactly one of
/// Woken/TimedOut
///
/// Claims happen while holding the registry's critical section; the
/// compare-exchange makes double resolution impossible even so.
pub struct WaiterState(AtomicU8);

impl WaiterState {
    pub fn new() -> Self {
        Self(AtomicU8::new(STATE_WAITING))
    }

    /// Claim the waiter out of `Waiting`; only one claimer can succeed
    pub fn claim(&self, target: ClaimKind) -> bool {
        let next = match target {
            ClaimKind::Woken => STATE_WOKEN,
            ClaimKind::TimedOut => STATE_TIMED_OUT,
        };
        self.0
            .compare_exchange(STATE_WAITING, next, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn is_waiting(&self) -> bool {
        self.0.load(Ordering::SeqCst) == STATE_WAITING
    }
}

impl Default for WaiterState {
    fn default() -> Self {
        Self::new()
    }
}

/// Blocking resumption handle for synchronous waiters
///
/// The parked thread loops on the condvar until an outcome lands, so a
/// spurious condvar wakeup never leaks out as a spurious wait result.
pub struct BlockingHandle {
    outcome: Mutex<Option<WaitOutcome>>,
    condvar: Condvar,
}

impl BlockingHandle {
    pub fn new() -> Self {
        Self {
            outcome: Mutex::new(None),
            condvar: Condvar::new(),
        }
    }

    /// Deliver the outcome and release the parked thread
    pub fn complete(&self, outcome: WaitOutcome) {
        let mut slot = self.outcome.lock();
        debug_assert!(slot.is_none(), "blocking handle completed twice");
        *slot = Some(outcome);
        self.condvar.notify_one();
    }

    /// Park until completed or the deadline passes
    ///
    /// Returns `None` only when the deadline elapsed with no completion;
    /// the caller then races the notifier for the timeout claim.
    pub fn block(&self, deadline: Option<Instant>) -> Option<WaitOutcome> {
        let mut slot = self.outcome.lock();
        loop {
            if slot.is_some() {
                return *slot;
            }
            match deadline {
                Some(when) => {
                    if self.condvar.wait_until(&mut slot, when).timed_out() {
                        // A completion may have landed right at the boundary
                        return *slot;
                    }
                }
                None => self.condvar.wait(&mut slot),
            }
        }
    }

    /// Park with no deadline for an in-flight completion
    pub fn block_for_completion(&self) -> WaitOutcome {
        let mut slot = self.outcome.lock();
        loop {
            if let Some(outcome) = *slot {
                return outcome;
            }
            self.condvar.wait(&mut slot);
        }
    }
}

impl Default for BlockingHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Resumption mechanism, tagged so one resume path serves both engines
pub enum Resumption {
    /// Synchronous waiter parked on a condvar
    Blocking(Arc<BlockingHandle>),
    /// Asynchronous waiter holding future state to complete
    Async(Arc<FutureShared>),
}

/// One pending wait at a location
pub struct Waiter {
    pub seq: SequenceId,
    pub location: WaitLocation,
    pub deadline: Option<Instant>,
    pub state: WaiterState,
    pub resumption: Resumption,
}

impl Waiter {
    /// Deliver the terminal outcome; called outside the critical section
    pub fn resume(&self, outcome: WaitOutcome) {
        match &self.resumption {
            Resumption::Blocking(handle) => handle.complete(outcome),
            Resumption::Async(shared) => shared.complete(outcome),
        }
    }
}
