//! The data plane: clients and services shared by every async factory.
//!
//! Generated wrappers read it through [`use_data_plane`], which only works
//! inside [`DataPlane::provide`]. Outside a provider it is an error, never a
//! silent default: a missing provider is a wiring bug.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::RuntimeError;

pub type Registry = HashMap<String, Arc<dyn Any + Send + Sync>>;

#[derive(Clone, Default)]
pub struct DataPlane {
    clients: Arc<Registry>,
    services: Arc<Registry>,
}

impl fmt::Debug for DataPlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut clients: Vec<_> = self.clients.keys().collect();
        let mut services: Vec<_> = self.services.keys().collect();
        clients.sort();
        services.sort();
        f.debug_struct("DataPlane")
            .field("clients", &clients)
            .field("services", &services)
            .finish()
    }
}

impl DataPlane {
    pub fn new(clients: Registry, services: Registry) -> Self {
        Self {
            clients: Arc::new(clients),
            services: Arc::new(services),
        }
    }

    pub fn with_client<C: Any + Send + Sync>(mut self, name: impl Into<String>, client: C) -> Self {
        Arc::make_mut(&mut self.clients).insert(name.into(), Arc::new(client));
        self
    }

    pub fn with_service<S: Any + Send + Sync>(mut self, name: impl Into<String>, service: S) -> Self {
        Arc::make_mut(&mut self.services).insert(name.into(), Arc::new(service));
        self
    }

    /// Typed lookup; `None` if absent or of another type.
    pub fn client<C: Any + Send + Sync>(&self, name: &str) -> Option<Arc<C>> {
        Arc::clone(self.clients.get(name)?).downcast::<C>().ok()
    }

    pub fn service<S: Any + Send + Sync>(&self, name: &str) -> Option<Arc<S>> {
        Arc::clone(self.services.get(name)?).downcast::<S>().ok()
    }

    /// Run `f` with `self` as the current data plane on this thread.
    pub fn provide<R>(&self, f: impl FnOnce() -> R) -> R {
        PROVIDED.with(|stack| stack.borrow_mut().push(self.clone()));
        let _scope = ProvideScope;
        f()
    }
}

thread_local! {
    static PROVIDED: RefCell<Vec<DataPlane>> = const { RefCell::new(Vec::new()) };
}

/// Pops the provided data plane even if `f` unwinds.
struct ProvideScope;

impl Drop for ProvideScope {
    fn drop(&mut self) {
        PROVIDED.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// The innermost provided data plane.
pub fn use_data_plane() -> Result<DataPlane, RuntimeError> {
    PROVIDED.with(|stack| stack.borrow().last().cloned().ok_or(RuntimeError::OutsideProvider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct RestClient {
        base_url: &'static str,
    }

    #[test]
    fn test_accessor_fails_outside_provider() {
        assert_eq!(use_data_plane().unwrap_err(), RuntimeError::OutsideProvider);
    }

    #[test]
    fn test_nested_providers_shadow_and_restore() {
        let outer = DataPlane::default().with_client("rest", RestClient { base_url: "/a" });
        let inner = DataPlane::default().with_client("rest", RestClient { base_url: "/b" });

        outer.provide(|| {
            inner.provide(|| {
                let dp = use_data_plane().unwrap();
                assert_eq!(dp.client::<RestClient>("rest").unwrap().base_url, "/b");
            });
            let dp = use_data_plane().unwrap();
            assert_eq!(dp.client::<RestClient>("rest").unwrap().base_url, "/a");
        });
        assert!(use_data_plane().is_err());
    }

    #[test]
    fn test_typed_lookup_rejects_wrong_type() {
        let dp = DataPlane::default().with_service("users", 42_u32);
        assert_eq!(dp.service::<u32>("users").as_deref(), Some(&42));
        assert!(dp.service::<String>("users").is_none());
        assert!(dp.client::<u32>("users").is_none());
    }
}
