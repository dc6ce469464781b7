/*!
 * Asynchronous Wait Futures
 *
 * Waker-based futures completed by whichever of the notifier and the
 * timer thread wins the claim. The shared state is runtime-agnostic:
 * every clone of a [`WaitFuture`], polled from any task on any thread,
 * observes the same outcome.
 */

use super::types::WaitOutcome;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

#[derive(Default)]
struct FutureInner {
    outcome: Option<WaitOutcome>,
    wakers: Vec<Waker>,
}

/// Completion state shared by every clone of a `WaitFuture`
pub struct FutureShared {
    inner: Mutex<FutureInner>,
}

impl FutureShared {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(FutureInner::default()),
        }
    }

    /// Deliver the outcome and wake every registered task
    pub fn complete(&self, outcome: WaitOutcome) {
        let wakers = {
            let mut inner = self.inner.lock();
            debug_assert!(inner.outcome.is_none(), "wait future completed twice");
            inner.outcome = Some(outcome);
            std::mem::take(&mut inner.wakers)
        };
        // Wake outside the lock
        for waker in wakers {
            waker.wake();
        }
    }

    /// Outcome if already settled
    pub fn peek(&self) -> Option<WaitOutcome> {
        self.inner.lock().outcome
    }

    fn poll(&self, cx: &mut Context<'_>) -> Poll<WaitOutcome> {
        let mut inner = self.inner.lock();
        if let Some(outcome) = inner.outcome {
            return Poll::Ready(outcome);
        }
        if !inner.wakers.iter().any(|w| w.will_wake(cx.waker())) {
            inner.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}

impl Default for FutureShared {
    fn default() -> Self {
        Self::new()
    }
}

/// Pending result of an asynchronous wait
///
/// Cloneable; clones may be handed to other agents and awaited anywhere.
#[derive(Clone)]
pub struct WaitFuture {
    shared: Arc<FutureShared>,
}

impl WaitFuture {
    pub(crate) fn new(shared: Arc<FutureShared>) -> Self {
        Self { shared }
    }

    /// Outcome if already settled, without polling (test synchronization)
    pub fn peek(&self) -> Option<WaitOutcome> {
        self.shared.peek()
    }
}

impl Future for WaitFuture {
    type Output = WaitOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.shared.poll(cx)
    }
}
