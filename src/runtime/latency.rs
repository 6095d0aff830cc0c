//! A latency tracker: one state machine plus the guard of its in-flight operation.

use futures::future::{self, BoxFuture};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, trace};

use super::guard::StaleGuard;
use super::machine::{LatencyEvent, LatencyMachine, LatencyState};

/// Drives one watched operation to its state update.
///
/// Completes once the settlement has been applied; never completes if the
/// operation was superseded, aborted or torn down first.
pub type Settlement = BoxFuture<'static, ()>;

struct LatencyCore<T, E> {
    machine: LatencyMachine<T, E>,
    guard: Option<StaleGuard>,
    generation: u64,
}

impl<T, E> Drop for LatencyCore<T, E> {
    // Teardown: nothing may settle into released state.
    fn drop(&mut self) {
        if let Some(guard) = &self.guard {
            guard.invalidate();
        }
    }
}

fn lock<T, E>(core: &Mutex<LatencyCore<T, E>>) -> MutexGuard<'_, LatencyCore<T, E>> {
    core.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Latency<T, E> {
    core: Arc<Mutex<LatencyCore<T, E>>>,
}

impl<T, E> Clone for Latency<T, E> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

/// Non-owning handle; does not keep the tracker alive.
pub struct WeakLatency<T, E> {
    core: Weak<Mutex<LatencyCore<T, E>>>,
}

impl<T, E> Clone for WeakLatency<T, E> {
    fn clone(&self) -> Self {
        Self {
            core: Weak::clone(&self.core),
        }
    }
}

impl<T, E> WeakLatency<T, E> {
    pub fn upgrade(&self) -> Option<Latency<T, E>> {
        self.core.upgrade().map(|core| Latency { core })
    }
}

impl<T, E> Default for Latency<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Latency<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            core: Arc::new(Mutex::new(LatencyCore {
                machine: LatencyMachine::new(),
                guard: None,
                generation: 0,
            })),
        }
    }

    pub fn downgrade(&self) -> WeakLatency<T, E> {
        WeakLatency {
            core: Arc::downgrade(&self.core),
        }
    }

    /// Track `operation` as the current one.
    pub fn watch<F>(&self, operation: F) -> Settlement
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.watch_with(move || operation)
    }

    /// Swap guards and emit `Watch`, then start the operation.
    ///
    /// The old guard is invalidated and the new one installed under the same
    /// lock as the `Watch` transition, so two guards are never valid at once.
    pub fn watch_with<S, F>(&self, start: S) -> Settlement
    where
        S: FnOnce() -> F,
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        let guard = {
            let mut core = lock(&self.core);
            if let Some(previous) = core.guard.take() {
                previous.invalidate();
            }
            core.generation += 1;
            let guard = StaleGuard::new(core.generation);
            core.guard = Some(guard.clone());
            core.machine.send(LatencyEvent::Watch);
            debug!(generation = guard.generation(), "watching operation");
            guard
        };

        let wrapped = guard.wrap(start());
        let core = Arc::downgrade(&self.core);

        Box::pin(async move {
            let outcome = wrapped.await;

            let accepted = core.upgrade().map(|core| {
                let mut core = lock(&core);
                let current = core.guard.as_ref().map(StaleGuard::generation);
                if current != Some(guard.generation()) || !guard.is_valid() {
                    return false;
                }
                match outcome {
                    Ok(data) => core.machine.send(LatencyEvent::Resolve(data)),
                    Err(error) => core.machine.send(LatencyEvent::Reject(error)),
                };
                true
            });

            if accepted != Some(true) {
                trace!(generation = guard.generation(), "stale settlement parked");
                future::pending::<()>().await;
            }
        })
    }

    /// Invalidate the current operation and return to idle.
    pub fn abort(&self) {
        let mut core = lock(&self.core);
        if let Some(guard) = core.guard.take() {
            guard.invalidate();
        }
        core.machine.send(LatencyEvent::Abort);
    }

    pub fn reset(&self) {
        lock(&self.core).machine.send(LatencyEvent::Reset);
    }

    pub fn state(&self) -> LatencyState {
        lock(&self.core).machine.state()
    }

    pub fn pending(&self) -> bool {
        self.state() == LatencyState::Pending
    }

    pub fn data(&self) -> Option<T> {
        lock(&self.core).machine.context().data.clone()
    }

    pub fn error(&self) -> Option<E> {
        lock(&self.core).machine.context().error.clone()
    }

    /// Generation of the operation currently being tracked, if any.
    pub fn generation(&self) -> Option<u64> {
        lock(&self.core).guard.as_ref().map(StaleGuard::generation)
    }
}
