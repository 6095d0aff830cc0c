//! Translation cache for localized components.
//!
//! An owned `locale:namespace → messages` store with at most one in-flight
//! load per key. A lookup that finds a load in flight hands back the shared
//! future so the caller can suspend on it and retry.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::warn;

/// Flat `key → text` messages.
pub type Messages = BTreeMap<String, String>;

/// Translation asset path → URL, as produced by the bundler glob.
pub type TranslationMap = BTreeMap<String, String>;

pub type PendingLoad = Shared<BoxFuture<'static, ()>>;

enum Entry {
    Ready(Arc<Messages>),
    Loading(PendingLoad),
}

pub enum Lookup {
    Ready(Arc<Messages>),
    /// Await, then look up again.
    Pending(PendingLoad),
}

type Entries = Mutex<HashMap<String, Entry>>;

fn lock(entries: &Entries) -> MutexGuard<'_, HashMap<String, Entry>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Default)]
pub struct TranslationCache {
    entries: Arc<Entries>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(locale: &str, namespace: &str) -> String {
        format!("{}:{}", locale, namespace)
    }

    pub fn get(&self, locale: &str, namespace: &str) -> Option<Arc<Messages>> {
        match lock(&self.entries).get(&Self::key(locale, namespace))? {
            Entry::Ready(messages) => Some(Arc::clone(messages)),
            Entry::Loading(_) => None,
        }
    }

    pub fn insert(&self, locale: &str, namespace: &str, messages: Messages) {
        lock(&self.entries).insert(Self::key(locale, namespace), Entry::Ready(Arc::new(messages)));
    }

    pub fn is_loading(&self, locale: &str, namespace: &str) -> bool {
        matches!(
            lock(&self.entries).get(&Self::key(locale, namespace)),
            Some(Entry::Loading(_))
        )
    }

    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    /// Cached messages, the in-flight load, or a new load started with `load`.
    ///
    /// `load` runs on the first poll of the returned future, never under the
    /// cache lock. A failed load is cached as empty so a suspending caller
    /// cannot loop.
    pub fn lookup_or_load<L, F>(&self, locale: &str, namespace: &str, load: L) -> Lookup
    where
        L: FnOnce() -> F + Send + 'static,
        F: Future<Output = Result<Messages, String>> + Send + 'static,
    {
        let key = Self::key(locale, namespace);
        let mut entries = lock(&self.entries);

        match entries.get(&key) {
            Some(Entry::Ready(messages)) => return Lookup::Ready(Arc::clone(messages)),
            Some(Entry::Loading(pending)) => return Lookup::Pending(pending.clone()),
            None => {}
        }

        let store: Weak<Entries> = Arc::downgrade(&self.entries);
        let entry_key = key.clone();
        let pending = async move {
            let messages = load().await.unwrap_or_else(|err| {
                warn!(key = %entry_key, error = %err, "translation load failed, caching empty");
                Messages::new()
            });
            if let Some(store) = store.upgrade() {
                lock(&store).insert(entry_key, Entry::Ready(Arc::new(messages)));
            }
        }
        .boxed()
        .shared();

        entries.insert(key, Entry::Loading(pending.clone()));
        Lookup::Pending(pending)
    }
}

/// URL of the translation file for `locale`, falling back to its language
/// (`pt-BR` → `pt`).
pub fn resolve_locale_url<'a>(translations: &'a TranslationMap, locale: &str) -> Option<&'a str> {
    let find = |tag: &str| {
        let suffix = format!("/{}.json", tag);
        translations
            .iter()
            .find(|(path, _)| path.ends_with(&suffix))
            .map(|(_, url)| url.as_str())
    };

    find(locale).or_else(|| {
        let language = locale.split('-').next().filter(|l| !l.is_empty() && *l != locale)?;
        find(language)
    })
}

/// Overlay loaded messages on the defaults, dropping the `namespace/` key prefix.
pub fn localize(defaults: &Messages, loaded: &Messages, namespace: &str) -> Messages {
    let prefix = format!("{}/", namespace);
    let mut merged = defaults.clone();
    for (key, value) in loaded {
        let key = key.strip_prefix(&prefix).unwrap_or(key);
        merged.insert(key.to_string(), value.clone());
    }
    merged
}
