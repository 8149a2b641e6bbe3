//! Response cache provider for the snapshot fetching layer.
//!
//! The provider loads the persisted cache once, hands the live map to the
//! fetching layer, and writes it back when the page is torn down. It is
//! constructed once per application and disposed when the application shuts
//! down; dropping it removes the teardown listener.

use crate::cache::{CacheMap, LocalCacheStore};
use crate::storage::DurableStorage;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

/// Page lifecycle hooks the provider depends on.
pub trait PageLifecycle {
    /// Registration handle; dropping it unregisters the handler.
    type Listener;

    fn on_teardown(&self, handler: Box<dyn Fn()>) -> Self::Listener;

    /// Reload the running application.
    fn reload(&self);
}

/// `beforeunload` listener and `location.reload()` of the current window.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserLifecycle;

impl PageLifecycle for BrowserLifecycle {
    type Listener = gloo_events::EventListener;

    fn on_teardown(&self, handler: Box<dyn Fn()>) -> Self::Listener {
        gloo_events::EventListener::new(&gloo_utils::window(), "beforeunload", move |_| {
            handler()
        })
    }

    fn reload(&self) {
        if let Err(e) = gloo_utils::window().location().reload() {
            warn!("Failed to reload the page: {:?}", e);
        }
    }
}

/// Live cache shared with the fetching layer. Reads and writes go straight
/// to the map the provider persists.
#[derive(Clone, Default)]
pub struct SharedCache(Rc<RefCell<CacheMap>>);

/// Handles compare by identity: two handles are equal when they share a map.
impl PartialEq for SharedCache {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl SharedCache {
    pub fn new(map: CacheMap) -> Self {
        Self(Rc::new(RefCell::new(map)))
    }

    /// Cached value for `key`, or `None` when absent or no longer matching
    /// the expected shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let map = self.0.borrow();
        let value = map.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!("Ignoring cached '{}' with unexpected shape: {}", key, e);
                None
            }
        }
    }

    pub fn insert<T: Serialize>(&self, key: impl Into<String>, value: &T) {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(v) => {
                self.0.borrow_mut().insert(key, v);
            }
            Err(e) => warn!("Not caching '{}': {}", key, e),
        }
    }

    pub fn remove(&self, key: &str) -> bool {
        self.0.borrow_mut().shift_remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

pub struct ResponseCacheProvider<S, L: PageLifecycle> {
    store: Rc<LocalCacheStore<S>>,
    cache: SharedCache,
    lifecycle: L,
    listener: Option<L::Listener>,
}

impl<S, L> ResponseCacheProvider<S, L>
where
    S: DurableStorage + 'static,
    L: PageLifecycle,
{
    /// Load the persisted cache. This is the only time the slot is read.
    pub fn new(store: LocalCacheStore<S>, lifecycle: L) -> Self {
        let cache = SharedCache::new(store.load());
        info!("Response cache ready with {} entries", cache.len());
        Self {
            store: Rc::new(store),
            cache,
            lifecycle,
            listener: None,
        }
    }

    /// Handle to the live map, for the fetching layer.
    pub fn cache(&self) -> SharedCache {
        self.cache.clone()
    }

    pub fn is_registered(&self) -> bool {
        self.listener.is_some()
    }

    /// Persist the live map on page teardown. Registering again while a
    /// listener is active does nothing.
    pub fn register(&mut self) {
        if self.listener.is_some() {
            return;
        }
        let store = Rc::clone(&self.store);
        let cache = self.cache.clone();
        let listener = self
            .lifecycle
            .on_teardown(Box::new(move || persist_best_effort(&store, &cache)));
        self.listener = Some(listener);
    }

    /// Write the live map to storage now.
    pub fn flush(&self) {
        persist_best_effort(&self.store, &self.cache);
    }

    /// Remove the teardown listener.
    pub fn dispose(&mut self) {
        self.listener = None;
    }

    /// Drop the persisted cache and reload the application. The listener is
    /// removed first so the reload does not write the stale map back.
    pub fn invalidate(&mut self) {
        self.dispose();
        self.store.clear();
        info!("Response cache cleared, reloading");
        self.lifecycle.reload();
    }
}

impl<S, L: PageLifecycle> Drop for ResponseCacheProvider<S, L> {
    fn drop(&mut self) {
        self.listener = None;
    }
}

// TODO: surface repeated quota failures to the user instead of only logging them
fn persist_best_effort<S: DurableStorage>(store: &LocalCacheStore<S>, cache: &SharedCache) {
    if let Err(e) = store.persist(&cache.0.borrow()) {
        warn!("Dropping cache write: {}", e);
    }
}
