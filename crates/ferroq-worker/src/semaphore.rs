//! Bounded-capacity admission semaphore.

use parking_lot::RwLock;
use std::time::Duration;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;

/// Fixed-capacity admission primitive with an observable active count and
/// a drain-wait.
///
/// Tokens flow through a bounded channel pre-filled to capacity, which
/// gives FIFO fairness under contention; the active count lives behind its
/// own lock. `release` without a paired `acquire` is a no-op: the count
/// never goes negative and no phantom token is returned.
pub struct Semaphore {
    capacity: usize,
    take: Mutex<Receiver<()>>,
    put: Sender<()>,
    active: RwLock<usize>,
    drained: Notify,
}

impl Semaphore {
    /// Creates a semaphore. Non-positive capacity is clamped to 1.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (put, take) = mpsc::channel(capacity);
        for _ in 0..capacity {
            put.try_send(()).expect("fresh channel holds capacity tokens");
        }

        Self {
            capacity,
            take: Mutex::new(take),
            put,
            active: RwLock::new(0),
            drained: Notify::new(),
        }
    }

    /// Blocks until a token is available. Returns `false` immediately if
    /// `cancel` is triggered before entry or while waiting.
    pub async fn acquire(&self, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }

        let mut take = tokio::select! {
            guard = self.take.lock() => guard,
            () = cancel.cancelled() => return false,
        };

        tokio::select! {
            token = take.recv() => match token {
                Some(()) => {
                    *self.active.write() += 1;
                    true
                }
                None => false,
            },
            () = cancel.cancelled() => false,
        }
    }

    /// Non-blocking acquire; never waits.
    #[must_use]
    pub fn try_acquire(&self) -> bool {
        let Ok(mut take) = self.take.try_lock() else {
            return false;
        };

        if take.try_recv().is_ok() {
            *self.active.write() += 1;
            true
        } else {
            false
        }
    }

    /// Returns one token and decrements the active count.
    pub fn release(&self) {
        let went_idle = {
            let mut active = self.active.write();
            if *active == 0 {
                return;
            }
            *active -= 1;
            *active == 0
        };

        let _ = self.put.try_send(());

        if went_idle {
            self.drained.notify_waiters();
        }
    }

    /// Number of tokens currently held.
    #[must_use]
    pub fn active(&self) -> usize {
        *self.active.read()
    }

    /// Configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Blocks until the active count reaches zero. Observes every
    /// acquisition that completed before the call.
    pub async fn wait(&self) {
        loop {
            if *self.active.read() == 0 {
                return;
            }

            let notified = self.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            // Re-check after registering interest: a release racing with
            // the first check would otherwise be missed.
            if *self.active.read() == 0 {
                return;
            }

            notified.await;
        }
    }

    /// Like [`Self::wait`] but bounded; returns whether the drain completed
    /// before the deadline.
    pub async fn wait_with_timeout(&self, deadline: Duration) -> bool {
        tokio::time::timeout(deadline, self.wait()).await.is_ok()
    }
}
