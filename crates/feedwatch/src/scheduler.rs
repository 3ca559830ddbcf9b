//! One-shot, cancellable deadline timers.
//!
//! A [`DeadlineScheduler`] runs a callback once after a delay unless the
//! returned [`DeadlineHandle`] is cancelled first. Cancellation is best effort:
//! a callback that already started keeps running, so callbacks must re-check
//! whatever state they act on.

use std::fmt;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;

use crate::error::Error;

/// Work to run when a deadline passes.
pub type DeadlineCallback = Box<dyn FnOnce() + Send + 'static>;

/// Something that can stop a pending timer.
pub trait Cancel: Send + Sync {
    /// Prevent the timer from firing. Must be a no-op when it already fired
    /// or was already cancelled.
    fn cancel(&self);

    /// Whether the timer fired or was cancelled.
    fn is_finished(&self) -> bool;
}

impl Cancel for AbortHandle {
    fn cancel(&self) {
        self.abort();
    }

    fn is_finished(&self) -> bool {
        AbortHandle::is_finished(self)
    }
}

/// Opaque handle to an armed deadline.
pub struct DeadlineHandle {
    inner: Box<dyn Cancel>,
}

impl DeadlineHandle {
    pub fn new(inner: impl Cancel + 'static) -> Self {
        Self { inner: Box::new(inner) }
    }

    pub fn cancel(&self) {
        self.inner.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

impl fmt::Debug for DeadlineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeadlineHandle").field("finished", &self.is_finished()).finish()
    }
}

/// Arms one-shot timers.
pub trait DeadlineScheduler: Send + Sync {
    /// Run `callback` once `delay` has elapsed, unless cancelled first.
    fn arm(&self, delay: Duration, callback: DeadlineCallback) -> DeadlineHandle;
}

/// Scheduler backed by tokio tasks: each deadline is a task sleeping on the
/// runtime captured at construction.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    runtime: Handle,
}

impl TokioScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Use the runtime the caller is running on.
    pub fn current() -> Result<Self, Error> {
        Ok(Self::new(Handle::try_current()?))
    }
}

impl DeadlineScheduler for TokioScheduler {
    fn arm(&self, delay: Duration, callback: DeadlineCallback) -> DeadlineHandle {
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            // No await points past this line, so an abort can no longer
            // interrupt the callback halfway.
            callback();
        });

        DeadlineHandle::new(task.abort_handle())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting_callback(counter: &Arc<AtomicUsize>) -> DeadlineCallback {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_after_delay() {
        let scheduler = TokioScheduler::current().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));

        let handle = scheduler.arm(Duration::from_secs(6), counting_callback(&fired));

        tokio::time::sleep(Duration::from_millis(5_999)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!handle.is_finished());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing() {
        let scheduler = TokioScheduler::current().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));

        let handle = scheduler.arm(Duration::from_secs(1), counting_callback(&fired));
        handle.cancel();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_fire_is_noop() {
        let scheduler = TokioScheduler::current().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));

        let handle = scheduler.arm(Duration::ZERO, counting_callback(&fired));
        tokio::time::sleep(Duration::from_millis(10)).await;

        handle.cancel();
        handle.cancel();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
