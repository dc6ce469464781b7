/*!
 * Futex Manager
 *
 * The host-facing surface: synchronous wait, asynchronous wait, notify,
 * and the waiter-list diagnostic. Owns the waiter registry and the timer
 * thread; cloning shares both, so one manager serves every agent in the
 * process.
 */

use super::future::{FutureShared, WaitFuture};
use super::registry::{EnqueueResult, WaiterRegistry};
use super::timeout::TimerThread;
use super::types::{RegistryStats, WaitLocation, WaitOutcome};
use super::waiter::{BlockingHandle, Resumption, Waiter, WaiterState};
use crate::core::errors::WaitError;
use crate::core::types::WaitqResult;
use crate::memory::SharedView;
use log::{debug, info};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result of an asynchronous wait
pub enum AsyncWait {
    /// Resolved synchronously; no waiter was created
    Immediate(WaitOutcome),
    /// Waiter enqueued; the future settles on notify or timeout
    Pending(WaitFuture),
}

impl AsyncWait {
    /// Whether resolution was deferred to a future
    pub fn is_async(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

/// Shared-memory wait/notify manager
pub struct FutexManager {
    registry: Arc<WaiterRegistry>,
    timer: Arc<TimerThread>,
}

impl FutexManager {
    pub fn new() -> Self {
        let registry = Arc::new(WaiterRegistry::new());
        let timer = Arc::new(TimerThread::spawn(Arc::clone(&registry)));
        info!("Futex manager initialized (single critical section, FIFO wake order)");
        Self { registry, timer }
    }

    /// Validate a target element and resolve its location
    ///
    /// Kind is checked before bounds, matching the host runtime's
    /// TypeError-before-RangeError ordering.
    fn resolve(view: &SharedView, index: usize) -> WaitqResult<WaitLocation> {
        if !view.kind().is_waitable() {
            return Err(WaitError::NotWaitable(view.kind()));
        }
        view.location_of(index)
    }

    fn resolve_shared(view: &SharedView, index: usize) -> WaitqResult<WaitLocation> {
        let location = Self::resolve(view, index)?;
        if !view.block().is_shared() {
            return Err(WaitError::NotShared);
        }
        Ok(location)
    }

    /// Block the calling thread until woken, timed out, or value mismatch
    ///
    /// `timeout` of `None` waits forever. A zero timeout still performs
    /// the equality check first: a matching value blocks for zero time
    /// and reports `TimedOut`, never `NotEqual`.
    pub fn wait(
        &self,
        view: &SharedView,
        index: usize,
        expected: i64,
        timeout: Option<Duration>,
    ) -> WaitqResult<WaitOutcome> {
        let location = Self::resolve_shared(view, index)?;
        let deadline = timeout.map(|t| Instant::now() + t);

        let handle = Arc::new(BlockingHandle::new());
        let resumption = Resumption::Blocking(Arc::clone(&handle));
        let waiter = match self.registry.enqueue_if_eq(
            location,
            || view.atomic_load(index),
            expected,
            |seq| Waiter {
                seq,
                location,
                deadline,
                state: WaiterState::new(),
                resumption,
            },
        ) {
            EnqueueResult::NotEqual => return Ok(WaitOutcome::NotEqual),
            EnqueueResult::Enqueued(waiter) => waiter,
        };

        // Park outside the critical section
        if let Some(outcome) = handle.block(deadline) {
            return Ok(outcome);
        }

        // Deadline elapsed; race the notifier for the claim
        if self
            .registry
            .claim_timed_out(location, waiter.seq)
            .is_some()
        {
            debug!("Waiter {} at {:?} timed out", waiter.seq, location);
            return Ok(WaitOutcome::TimedOut);
        }

        // A notify claimed this waiter between the deadline and the claim
        // attempt; its completion is already in flight
        Ok(handle.block_for_completion())
    }

    /// Register an asynchronous waiter; never blocks the calling thread
    pub fn wait_async(
        &self,
        view: &SharedView,
        index: usize,
        expected: i64,
        timeout: Option<Duration>,
    ) -> WaitqResult<AsyncWait> {
        let location = Self::resolve_shared(view, index)?;
        let deadline = timeout.map(|t| Instant::now() + t);

        let shared = Arc::new(FutureShared::new());
        let resumption = Resumption::Async(Arc::clone(&shared));
        let waiter = match self.registry.enqueue_if_eq(
            location,
            || view.atomic_load(index),
            expected,
            |seq| Waiter {
                seq,
                location,
                deadline,
                state: WaiterState::new(),
                resumption,
            },
        ) {
            EnqueueResult::NotEqual => return Ok(AsyncWait::Immediate(WaitOutcome::NotEqual)),
            EnqueueResult::Enqueued(waiter) => waiter,
        };

        // Scheduled after the enqueue, outside the registry lock; the
        // entry cannot fire before the waiter is queued
        if let Some(when) = deadline {
            self.timer.schedule(when, location, waiter.seq);
        }

        Ok(AsyncWait::Pending(WaitFuture::new(shared)))
    }

    /// Wake up to `count` waiters at a location in arrival order
    ///
    /// Returns the number actually woken; never blocks. Waking on a
    /// non-shared view is a defined no-op since nothing can wait there.
    pub fn notify(
        &self,
        view: &SharedView,
        index: usize,
        count: usize,
    ) -> WaitqResult<usize> {
        let location = Self::resolve(view, index)?;
        if !view.block().is_shared() {
            return Ok(0);
        }

        let claimed = self.registry.dequeue_for_notify(location, count);
        for waiter in &claimed {
            waiter.resume(WaitOutcome::Ok);
        }

        if !claimed.is_empty() {
            debug!("Notified {} waiter(s) at {:?}", claimed.len(), location);
        }
        Ok(claimed.len())
    }

    /// Wake every queued waiter at a location (unbounded notify)
    pub fn notify_all(&self, view: &SharedView, index: usize) -> WaitqResult<usize> {
        self.notify(view, index, usize::MAX)
    }

    /// Number of currently queued waiters at an element (diagnostics)
    pub fn waiter_list_size(&self, view: &SharedView, index: usize) -> WaitqResult<usize> {
        let location = Self::resolve(view, index)?;
        if !view.block().is_shared() {
            return Ok(0);
        }
        Ok(self.registry.waiter_count(location))
    }

    /// Registry-wide diagnostics
    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }
}

impl Default for FutexManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for FutexManager {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            timer: Arc::clone(&self.timer),
        }
    }
}
