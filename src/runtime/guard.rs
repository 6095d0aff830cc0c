//! Staleness guard.
//!
//! One guard per issued operation. While valid, `wrap` is transparent; once
//! invalidated, a wrapped future that has not yet produced its output never
//! will, whatever that output was. The underlying work still runs to
//! completion, its result is just unobservable.

use futures::future;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct StaleGuard {
    generation: u64,
    valid: Arc<AtomicBool>,
}

impl StaleGuard {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            valid: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    pub fn invalidate(&self) {
        self.valid.store(false, Ordering::Release);
    }

    /// Pass `inner` through while valid; park it forever once invalidated.
    pub fn wrap<F: Future>(&self, inner: F) -> impl Future<Output = F::Output> {
        let valid = Arc::clone(&self.valid);
        async move {
            let output = inner.await;
            if valid.load(Ordering::Acquire) {
                output
            } else {
                future::pending::<F::Output>().await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use futures::FutureExt;

    #[test]
    fn test_valid_guard_is_transparent() {
        let guard = StaleGuard::new(1);
        assert_eq!(block_on(guard.wrap(async { Ok::<_, ()>(7) })), Ok(7));
        assert_eq!(block_on(guard.wrap(async { Err::<(), _>("no") })), Err("no"));
    }

    #[test]
    fn test_invalidated_guard_never_settles() {
        let guard = StaleGuard::new(1);
        let (ok_tx, ok_rx) = oneshot::channel::<u32>();
        let (err_tx, err_rx) = oneshot::channel::<u32>();

        let mut resolved = Box::pin(guard.wrap(ok_rx.map(|r| r.map_err(|_| "dropped"))));
        let mut rejected = Box::pin(guard.wrap(err_rx.map(|_| Err::<u32, _>("failed"))));
        assert!(resolved.as_mut().now_or_never().is_none());

        guard.invalidate();
        ok_tx.send(1).unwrap();
        err_tx.send(2).unwrap();

        assert!(resolved.as_mut().now_or_never().is_none());
        assert!(rejected.as_mut().now_or_never().is_none());
    }

    #[test]
    fn test_guards_are_independent() {
        let first = StaleGuard::new(1);
        let second = StaleGuard::new(2);
        first.invalidate();
        assert!(!first.is_valid());
        assert!(second.is_valid());
        assert_eq!(block_on(second.wrap(async { 3 })), 3);
    }
}
