//! Binding handler: the runtime value behind one async-concern export.
//!
//! Built from a user factory, a data plane and a [`Latency`] tracker. Each
//! invocation supersedes the previous one; only the latest can settle.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use super::data_plane::DataPlane;
use super::latency::{Latency, Settlement, WeakLatency};
use super::machine::LatencyState;

/// The invocable operation a factory returns.
pub type Operation<A, T, E> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// Adapt an async closure into an [`Operation`].
pub fn operation<A, T, E, F, Fut>(f: F) -> Operation<A, T, E>
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    Arc::new(move |args| Box::pin(f(args)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerStatus {
    Idle,
    Loading,
    Success,
    Error,
}

impl From<LatencyState> for HandlerStatus {
    fn from(state: LatencyState) -> Self {
        match state {
            LatencyState::Idle => HandlerStatus::Idle,
            LatencyState::Pending => HandlerStatus::Loading,
            LatencyState::Fulfilled => HandlerStatus::Success,
            LatencyState::Rejected => HandlerStatus::Error,
        }
    }
}

/// A failed operation together with a way to try it again.
pub struct AsyncError<E> {
    pub reason: E,
    retry: Arc<dyn Fn() -> Option<Settlement> + Send + Sync>,
}

impl<E> AsyncError<E> {
    /// Re-invoke with the arguments of the most recent call.
    ///
    /// `None` once the handler has been torn down.
    pub fn retry(&self) -> Option<Settlement> {
        (self.retry)()
    }
}

impl<E: fmt::Debug> fmt::Debug for AsyncError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncError").field("reason", &self.reason).finish_non_exhaustive()
    }
}

pub struct AsyncHandler<A, T, E> {
    latency: Latency<T, E>,
    operation: Operation<A, T, E>,
    last_args: Arc<Mutex<Option<A>>>,
}

impl<A, T, E> Clone for AsyncHandler<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            latency: self.latency.clone(),
            operation: Arc::clone(&self.operation),
            last_args: Arc::clone(&self.last_args),
        }
    }
}

impl<A, T, E> AsyncHandler<A, T, E>
where
    A: Clone + Send + 'static,
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Build the operation once from `factory` and the shared data plane.
    pub fn new<F>(factory: F, data_plane: &DataPlane) -> Self
    where
        F: FnOnce(&DataPlane) -> Operation<A, T, E>,
    {
        Self::from_operation(factory(data_plane))
    }

    pub fn from_operation(operation: Operation<A, T, E>) -> Self {
        Self {
            latency: Latency::new(),
            operation,
            last_args: Arc::new(Mutex::new(None)),
        }
    }

    /// Start a new operation with `args`, superseding any in flight.
    pub fn invoke(&self, args: A) -> Settlement {
        *self.last_args.lock().unwrap_or_else(PoisonError::into_inner) = Some(args.clone());
        let operation = Arc::clone(&self.operation);
        self.latency.watch_with(move || operation(args))
    }

    /// Re-invoke with the last arguments; `None` if never invoked.
    pub fn retry(&self) -> Option<Settlement> {
        let args = self.last_args.lock().unwrap_or_else(PoisonError::into_inner).clone()?;
        Some(self.invoke(args))
    }

    pub fn loading(&self) -> bool {
        self.latency.pending()
    }

    pub fn data(&self) -> Option<T> {
        self.latency.data()
    }

    pub fn error(&self) -> Option<AsyncError<E>> {
        let reason = self.latency.error()?;
        let weak = WeakHandler {
            latency: self.latency.downgrade(),
            operation: Arc::clone(&self.operation),
            last_args: Arc::clone(&self.last_args),
        };
        Some(AsyncError {
            reason,
            retry: Arc::new(move || weak.upgrade()?.retry()),
        })
    }

    pub fn status(&self) -> HandlerStatus {
        self.latency.state().into()
    }

    pub fn abort(&self) {
        self.latency.abort();
    }

    pub fn reset(&self) {
        self.latency.reset();
    }
}

/// Retry capture that does not keep a torn-down handler alive.
struct WeakHandler<A, T, E> {
    latency: WeakLatency<T, E>,
    operation: Operation<A, T, E>,
    last_args: Arc<Mutex<Option<A>>>,
}

impl<A, T, E> WeakHandler<A, T, E> {
    fn upgrade(&self) -> Option<AsyncHandler<A, T, E>> {
        Some(AsyncHandler {
            latency: self.latency.upgrade()?,
            operation: Arc::clone(&self.operation),
            last_args: Arc::clone(&self.last_args),
        })
    }
}
