//! Route loaders: a handler re-invoked whenever the route params change.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use super::handler::AsyncHandler;
use super::latency::Settlement;
use crate::error::RuntimeError;

/// Matched route params; optional segments may be absent.
pub type RouteParams = BTreeMap<String, Option<String>>;

pub struct RouteLoader<T, E> {
    handler: AsyncHandler<RouteParams, T, E>,
    last_key: Mutex<Option<String>>,
}

impl<T, E> RouteLoader<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    pub fn new(handler: AsyncHandler<RouteParams, T, E>) -> Self {
        Self {
            handler,
            last_key: Mutex::new(None),
        }
    }

    pub fn handler(&self) -> &AsyncHandler<RouteParams, T, E> {
        &self.handler
    }

    /// Invoke the loader if `params` differ from the last synced set.
    pub fn sync(&self, params: &RouteParams) -> Result<Option<Settlement>, RuntimeError> {
        let key = serde_json::to_string(params).map_err(|e| RuntimeError::Serialize(e.to_string()))?;
        {
            let mut last = self.last_key.lock().unwrap_or_else(PoisonError::into_inner);
            if last.as_deref() == Some(key.as_str()) {
                return Ok(None);
            }
            *last = Some(key);
        }
        Ok(Some(self.handler.invoke(params.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::handler::operation;
    use futures::executor::block_on;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn params(pairs: &[(&str, Option<&str>)]) -> RouteParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect()
    }

    #[test]
    fn test_reinvokes_only_on_param_change() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let loader = RouteLoader::new(AsyncHandler::from_operation(operation(
            move |p: RouteParams| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<_, String>(p.get("id").cloned().flatten()) }
            },
        )));

        let a = params(&[("id", Some("1"))]);
        block_on(loader.sync(&a).unwrap().unwrap());
        assert!(loader.sync(&a).unwrap().is_none());
        assert_eq!(loader.handler().data(), Some(Some("1".to_string())));

        let b = params(&[("id", Some("2"))]);
        block_on(loader.sync(&b).unwrap().unwrap());
        assert_eq!(loader.handler().data(), Some(Some("2".to_string())));

        let absent = params(&[("id", None)]);
        block_on(loader.sync(&absent).unwrap().unwrap());
        assert_eq!(loader.handler().data(), Some(None));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
