//! Typed side-channel values carried alongside a call.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A typed key for [`Metadata`] and [`Context`](crate::context::Context) values.
///
/// Keys are usually zero-sized marker types private to the interceptor that
/// owns them, so two independently written interceptors can never collide on
/// a key by accident.
///
/// ```rust,ignore
/// struct RequestIdKey;
///
/// impl Key for RequestIdKey {
///     type Value = String;
/// }
/// ```
pub trait Key: 'static {
    /// The type stored under this key.
    type Value: Clone + Send + Sync + 'static;
}

type Slot = Arc<dyn Any + Send + Sync>;

/// A per-call bag of typed values.
///
/// Created empty for each call. Inner stages write entries that outer stages
/// read on the way back. Stored values are immutable once inserted; replacing
/// a value means calling [`Metadata::set`] again. That makes [`Clone`] an
/// independent copy: neither side observes later writes to the other.
#[derive(Clone, Default)]
pub struct Metadata {
    values: HashMap<TypeId, Slot>,
}

impl Metadata {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the value stored under `K`.
    #[must_use]
    pub fn get<K: Key>(&self) -> Option<&K::Value> {
        self.values
            .get(&TypeId::of::<K>())
            .and_then(|slot| slot.downcast_ref::<K::Value>())
    }

    /// Stores `value` under `K`, replacing any previous value.
    pub fn set<K: Key>(&mut self, value: K::Value) {
        self.values.insert(TypeId::of::<K>(), Arc::new(value));
    }

    /// Removes and returns the value stored under `K`.
    pub fn remove<K: Key>(&mut self) -> Option<K::Value> {
        self.values
            .remove(&TypeId::of::<K>())
            .and_then(|slot| slot.downcast_ref::<K::Value>().cloned())
    }

    /// Returns true if a value is stored under `K`.
    #[must_use]
    pub fn contains<K: Key>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<K>())
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the bag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copies every entry of `other` into `self`, overwriting on conflict.
    pub fn extend(&mut self, other: &Self) {
        for (key, slot) in &other.values {
            self.values.insert(*key, Arc::clone(slot));
        }
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metadata")
            .field("len", &self.values.len())
            .finish()
    }
}
