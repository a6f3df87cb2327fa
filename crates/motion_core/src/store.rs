//! Central motion state store
//!
//! A keyed store (by element id) holding each element's derived visual
//! values and two independent visibility flags:
//!
//! - **internal** visibility, written by the element's own viewport trigger
//! - **triggered** visibility, written by an external/manual trigger
//!
//! The element is considered visible when either flag is set. Consumers never
//! get mutable access to entries; they read snapshots or subscribe to
//! per-element notifications.
//!
//! The store is an explicit service object. Cloning a [`MotionStore`] yields
//! another handle onto the same entries, so tests can build isolated stores
//! while an application shares one.
//!
//! # Example
//!
//! ```
//! use motion_core::store::MotionStore;
//!
//! let store = MotionStore::new();
//! store.initialize_element("hero");
//!
//! let sub = store.subscribe("hero", |entry| {
//!     println!("hero visible: {}", entry.final_visibility);
//! });
//!
//! store.set_internal_visibility("hero", true);
//! assert!(store.get_state("hero").unwrap().final_visibility);
//!
//! sub.unsubscribe();
//! ```

use crate::config::{MotionConfig, StoreDefaults};
use serde::Serialize;
use crate::value::MotionValues;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

/// Store entry for one element
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MotionEntry {
    /// Set by the element's own viewport trigger
    pub internal_visibility: bool,
    /// Set by an external or manual trigger
    pub triggered_visibility: bool,
    /// `internal_visibility || triggered_visibility`
    pub final_visibility: bool,
    pub opacity: f32,
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale: f32,
    pub rotate: f32,
    pub blur: f32,
    pub progress: f32,
    /// Visible but not yet at rest
    pub is_animating: bool,
}

impl MotionEntry {
    fn new(defaults: &StoreDefaults) -> Self {
        let mut entry = Self {
            internal_visibility: false,
            triggered_visibility: false,
            final_visibility: false,
            opacity: defaults.initial_opacity,
            translate_x: 0.0,
            translate_y: defaults.initial_translate_y,
            scale: defaults.initial_scale,
            rotate: 0.0,
            blur: 0.0,
            progress: 0.0,
            is_animating: false,
        };
        entry.recompute();
        entry
    }

    fn merge(&mut self, values: &MotionValues) {
        if let Some(opacity) = values.opacity {
            self.opacity = opacity;
        }
        if let Some(tx) = values.translate_x {
            self.translate_x = tx;
        }
        if let Some(ty) = values.translate_y {
            self.translate_y = ty;
        }
        if let Some(scale) = values.scale {
            self.scale = scale;
        }
        if let Some(rotate) = values.rotate {
            self.rotate = rotate;
        }
        if let Some(blur) = values.blur {
            self.blur = blur;
        }
        if let Some(progress) = values.progress {
            self.progress = progress;
        }
        self.recompute();
    }

    /// Recompute derived fields from the stored flags and values
    fn recompute(&mut self) {
        self.final_visibility = self.internal_visibility || self.triggered_visibility;
        self.is_animating = self.final_visibility
            && (self.opacity < 1.0 || self.translate_x != 0.0 || self.translate_y != 0.0);
    }
}

/// Identifier of one registered listener
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&MotionEntry) + Send + Sync>;

struct StoreInner {
    entries: RwLock<FxHashMap<String, MotionEntry>>,
    listeners: RwLock<FxHashMap<String, Vec<(ListenerId, Listener)>>>,
    next_listener: AtomicU64,
    defaults: StoreDefaults,
}

impl StoreInner {
    fn entries(&self) -> RwLockReadGuard<'_, FxHashMap<String, MotionEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn entries_mut(&self) -> RwLockWriteGuard<'_, FxHashMap<String, MotionEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners(&self) -> RwLockReadGuard<'_, FxHashMap<String, Vec<(ListenerId, Listener)>>> {
        self.listeners.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners_mut(
        &self,
    ) -> RwLockWriteGuard<'_, FxHashMap<String, Vec<(ListenerId, Listener)>>> {
        self.listeners.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove_listener(&self, key: &str, id: ListenerId) -> bool {
        let mut listeners = self.listeners_mut();
        let Some(list) = listeners.get_mut(key) else {
            return false;
        };
        let before = list.len();
        list.retain(|(listener_id, _)| *listener_id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            listeners.remove(key);
        }
        removed
    }
}

/// Central store of per-element motion state
#[derive(Clone)]
pub struct MotionStore {
    inner: Arc<StoreInner>,
}

impl MotionStore {
    /// Create an empty store with the default initial values
    pub fn new() -> Self {
        Self::with_defaults(StoreDefaults::default())
    }

    /// Create an empty store seeded from the `[store]` config section
    pub fn from_config(config: &MotionConfig) -> Self {
        Self::with_defaults(config.store.clone())
    }

    /// Create an empty store with custom initial values for new entries
    pub fn with_defaults(defaults: StoreDefaults) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                entries: RwLock::new(FxHashMap::default()),
                listeners: RwLock::new(FxHashMap::default()),
                next_listener: AtomicU64::new(1),
                defaults,
            }),
        }
    }

    /// Create the entry for an element
    ///
    /// Calling this again for an existing element is a no-op: values and
    /// subscribers are kept.
    pub fn initialize_element(&self, id: &str) {
        let mut entries = self.inner.entries_mut();
        if entries.contains_key(id) {
            return;
        }
        tracing::trace!(element = id, "motion store: initialize element");
        entries.insert(id.to_string(), MotionEntry::new(&self.inner.defaults));
    }

    /// Set the visibility reported by the element's own viewport trigger
    pub fn set_internal_visibility(&self, id: &str, visible: bool) {
        self.write(id, |entry| {
            entry.internal_visibility = visible;
            entry.recompute();
        });
    }

    /// Set the visibility reported by an external trigger
    pub fn set_triggered_visibility(&self, id: &str, visible: bool) {
        self.write(id, |entry| {
            entry.triggered_visibility = visible;
            entry.recompute();
        });
    }

    /// Merge a partial set of visual values into an element's entry
    pub fn update_motion_values(&self, id: &str, values: &MotionValues) {
        if values.is_empty() {
            return;
        }
        self.write(id, |entry| entry.merge(values));
    }

    /// Snapshot of one element's entry
    pub fn get_state(&self, id: &str) -> Option<MotionEntry> {
        self.inner.entries().get(id).cloned()
    }

    /// Copy of every entry
    ///
    /// The returned map is detached from the store; mutating it has no effect.
    pub fn get_all_states(&self) -> FxHashMap<String, MotionEntry> {
        self.inner.entries().clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.entries().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries().is_empty()
    }

    /// Subscribe to changes of one element
    ///
    /// Listeners fire synchronously after every write to that element, in
    /// registration order. The subscription stays active until
    /// [`Subscription::unsubscribe`] is called or the element is reset.
    pub fn subscribe<F>(&self, id: &str, listener: F) -> Subscription
    where
        F: Fn(&MotionEntry) + Send + Sync + 'static,
    {
        let listener_id = ListenerId(self.inner.next_listener.fetch_add(1, Ordering::Relaxed));
        self.inner
            .listeners_mut()
            .entry(id.to_string())
            .or_default()
            .push((listener_id, Arc::new(listener)));

        Subscription {
            store: Arc::downgrade(&self.inner),
            key: id.to_string(),
            id: listener_id,
        }
    }

    /// Number of listeners currently registered for an element
    pub fn listener_count(&self, id: &str) -> usize {
        self.inner.listeners().get(id).map_or(0, Vec::len)
    }

    /// Remove one element's entry and all of its listeners
    pub fn reset_element(&self, id: &str) {
        self.inner.entries_mut().remove(id);
        self.inner.listeners_mut().remove(id);
        tracing::trace!(element = id, "motion store: reset element");
    }

    /// Remove every entry and every listener
    pub fn reset(&self) {
        self.inner.entries_mut().clear();
        self.inner.listeners_mut().clear();
        tracing::trace!("motion store: reset");
    }

    /// Apply a mutation to an existing entry and notify its listeners
    ///
    /// Writes to unknown elements are ignored.
    fn write<F>(&self, id: &str, f: F)
    where
        F: FnOnce(&mut MotionEntry),
    {
        let snapshot = {
            let mut entries = self.inner.entries_mut();
            let Some(entry) = entries.get_mut(id) else {
                tracing::trace!(element = id, "motion store: write to missing element ignored");
                return;
            };
            f(entry);
            entry.clone()
        };
        self.notify(id, &snapshot);
    }

    fn notify(&self, id: &str, entry: &MotionEntry) {
        // Listeners may subscribe or unsubscribe while being notified, so
        // iterate a snapshot with no lock held.
        let listeners: SmallVec<[Listener; 4]> = match self.inner.listeners().get(id) {
            Some(list) => list.iter().map(|(_, l)| Arc::clone(l)).collect(),
            None => return,
        };

        for listener in listeners {
            let result = panic::catch_unwind(AssertUnwindSafe(|| listener(entry)));
            if let Err(payload) = result {
                if cfg!(debug_assertions) {
                    tracing::warn!(
                        element = id,
                        "motion store: listener panicked: {}",
                        panic_message(&*payload)
                    );
                }
            }
        }
    }
}

impl Default for MotionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MotionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionStore")
            .field("entries", &self.len())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}

/// Handle returned by [`MotionStore::subscribe`]
///
/// Dropping the handle does not unsubscribe.
#[derive(Debug)]
pub struct Subscription {
    store: Weak<StoreInner>,
    key: String,
    id: ListenerId,
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Detach the listener
    ///
    /// Returns `false` if it was already removed (by an earlier call, an
    /// element reset or a store reset) or the store is gone.
    pub fn unsubscribe(&self) -> bool {
        match self.store.upgrade() {
            Some(inner) => inner.remove_listener(&self.key, self.id),
            None => false,
        }
    }
}
