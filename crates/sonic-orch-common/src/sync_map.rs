//! Type-safe map wrapper that prevents auto-vivification bugs.
//!
//! This module provides a `SyncMap` type that is a safer alternative to
//! `std::collections::HashMap` for use in orchestration code. It prevents
//! the common C++ bug of accidentally creating map entries when accessing
//! non-existent keys.
//!
//! # The Problem
//!
//! In C++, `map[key].ref_count++` will create a default-constructed entry
//! if `key` doesn't exist. This can lead to subtle bugs where reference
//! counts become incorrect.
//!
//! # The Solution
//!
//! `SyncMap` provides explicit methods that never auto-create entries:
//! - `get()` returns `Option<&V>`
//! - `get_mut()` returns `Option<&mut V>`
//! - `increment_ref()` returns `Result<u32, Error>`

use std::collections::HashMap;
use std::hash::Hash;
use thiserror::Error;

/// Error type for SyncMap operations.
#[derive(Debug, Clone, Error)]
pub enum SyncMapError {
    #[error("Key not found")]
    KeyNotFound,

    #[error("Reference count underflow")]
    RefCountUnderflow,
}

/// Trait for types that have a reference count.
pub trait HasRefCount {
    /// Increments the reference count and returns the new value.
    fn increment_ref(&mut self) -> u32;

    /// Decrements the reference count and returns the new value.
    ///
    /// Returns `None` if the count would underflow.
    fn decrement_ref(&mut self) -> Option<u32>;

    /// Returns the current reference count.
    fn ref_count(&self) -> u32;
}

/// A type-safe map wrapper that prevents auto-vivification bugs.
///
/// Unlike `HashMap`, this type never creates entries implicitly.
/// All operations that might create entries are explicit.
///
/// # Example
///
/// ```
/// use sonic_orch_common::SyncMap;
///
/// let mut map: SyncMap<String, i32> = SyncMap::new();
///
/// // get() returns None for missing keys (doesn't create entry)
/// assert!(map.get(&"missing".to_string()).is_none());
///
/// // Must explicitly insert
/// map.insert("key".to_string(), 42);
/// assert_eq!(map.get(&"key".to_string()), Some(&42));
/// ```
#[derive(Debug, Clone)]
pub struct SyncMap<K, V> {
    inner: HashMap<K, V>,
}

impl<K, V> SyncMap<K, V>
where
    K: Eq + Hash,
{
    /// Creates a new empty map.
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    /// Creates a new map with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: HashMap::with_capacity(capacity),
        }
    }

    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns true if the map contains the given key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.contains_key(key)
    }

    /// Returns a reference to the value for the given key.
    ///
    /// Returns `None` if the key is not present.
    /// **This never creates entries.**
    pub fn get(&self, key: &K) -> Option<&V> {
        self.inner.get(key)
    }

    /// Returns a mutable reference to the value for the given key.
    ///
    /// Returns `None` if the key is not present.
    /// **This never creates entries.**
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.inner.get_mut(key)
    }

    /// Inserts a key-value pair into the map.
    ///
    /// Returns the old value if the key was already present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.inner.insert(key, value)
    }

    /// Removes a key from the map.
    ///
    /// Returns the removed value if the key was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.inner.remove(key)
    }

    /// Clears all entries from the map.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Returns an iterator over key-value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.inner.iter()
    }

    /// Returns an iterator over keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.inner.keys()
    }

    /// Returns an iterator over values.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.inner.values()
    }

    /// Returns a mutable iterator over values.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.inner.values_mut()
    }

    /// Gets the value for a key, or inserts a default value if not present.
    ///
    /// Unlike `get()`, this method **will** create an entry if the key
    /// is not present. Use this when you explicitly want this behavior.
    pub fn get_or_insert_with<F>(&mut self, key: K, f: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        self.inner.entry(key).or_insert_with(f)
    }

    /// Gets the value for a key, or inserts a default value if not present.
    pub fn get_or_insert(&mut self, key: K, value: V) -> &mut V {
        self.inner.entry(key).or_insert(value)
    }
}

impl<K, V> SyncMap<K, V>
where
    K: Eq + Hash,
    V: HasRefCount,
{
    /// Increments the reference count for the given key.
    ///
    /// Returns the new reference count, or an error if the key is not found.
    ///
    /// **This never creates entries.** This is the safe replacement for
    /// the C++ pattern `map[key].ref_count++`.
    pub fn increment_ref(&mut self, key: &K) -> Result<u32, SyncMapError> {
        match self.inner.get_mut(key) {
            Some(entry) => Ok(entry.increment_ref()),
            None => Err(SyncMapError::KeyNotFound),
        }
    }

    /// Decrements the reference count for the given key.
    ///
    /// Returns the new reference count, or an error if the key is not found
    /// or the count would underflow.
    pub fn decrement_ref(&mut self, key: &K) -> Result<u32, SyncMapError> {
        match self.inner.get_mut(key) {
            Some(entry) => entry
                .decrement_ref()
                .ok_or(SyncMapError::RefCountUnderflow),
            None => Err(SyncMapError::KeyNotFound),
        }
    }

    /// Returns the reference count for the given key.
    ///
    /// Returns `None` if the key is not found.
    pub fn ref_count(&self, key: &K) -> Option<u32> {
        self.inner.get(key).map(|e| e.ref_count())
    }
}

impl<K, V> Default for SyncMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for SyncMap<K, V>
where
    K: Eq + Hash,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

/// One outgoing reference: `(type, name, field)` naming the referencing
/// object and the field on it that points at the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceEdge {
    pub ref_type: String,
    pub name: String,
    pub field: String,
}

impl ReferenceEdge {
    pub fn new(ref_type: impl Into<String>, name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            ref_type: ref_type.into(),
            name: name.into(),
            field: field.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ReferenceCell {
    oid: Option<u64>,
    pending_remove: bool,
    refs: Vec<ReferenceEdge>,
}

/// What a delete handler should do after consulting the reference map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceRemoval {
    /// Nothing refers to the object; it was erased from the map. The caller
    /// should issue the HAL remove and decrement CRM.
    Proceed,
    /// Something still refers to the object. It was marked `pendingRemove`
    /// and stays in the map; the caller must return NEED_RETRY and must not
    /// call the HAL remove.
    NeedRetry,
}

/// The object-reference graph: `type -> name -> { oid, pendingRemove, refs
/// }`. This is a distinct structure from [`SyncMap`]'s per-key integer
/// refcount — it tracks actual edges between named objects of different
/// types (e.g. a buffer profile referencing a buffer pool) so a delete
/// handler can find out exactly who still depends on an object, not just
/// how many.
///
/// # Example
///
/// ```
/// use sonic_orch_common::{ReferenceMap, ReferenceRemoval};
///
/// let mut refs = ReferenceMap::new();
/// refs.set_oid("buffer_pool", "pool0", 0x1000);
/// refs.set_reference("buffer_profile", "profile0", "pool", "buffer_pool", "pool0");
///
/// assert!(refs.is_referenced("buffer_pool", "pool0"));
/// assert_eq!(refs.begin_remove("buffer_pool", "pool0"), ReferenceRemoval::NeedRetry);
/// assert!(refs.is_pending_remove("buffer_pool", "pool0"));
///
/// let removable = refs.release_references("buffer_profile", "profile0");
/// assert_eq!(removable, vec![("buffer_pool".to_string(), "pool0".to_string())]);
/// assert_eq!(refs.begin_remove("buffer_pool", "pool0"), ReferenceRemoval::Proceed);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReferenceMap {
    cells: HashMap<String, HashMap<String, ReferenceCell>>,
}

impl ReferenceMap {
    /// Creates an empty reference map.
    pub fn new() -> Self {
        Self {
            cells: HashMap::new(),
        }
    }

    fn cell_mut(&mut self, obj_type: &str, name: &str) -> &mut ReferenceCell {
        self.cells
            .entry(obj_type.to_string())
            .or_default()
            .entry(name.to_string())
            .or_default()
    }

    fn cell(&self, obj_type: &str, name: &str) -> Option<&ReferenceCell> {
        self.cells.get(obj_type)?.get(name)
    }

    /// Records the SAI object id for `(type, name)`. Call this once the
    /// object is created; it does not touch the reference multiset.
    pub fn set_oid(&mut self, obj_type: &str, name: &str, oid: u64) {
        self.cell_mut(obj_type, name).oid = Some(oid);
    }

    /// Returns the SAI object id for `(type, name)`, if tracked.
    pub fn oid(&self, obj_type: &str, name: &str) -> Option<u64> {
        self.cell(obj_type, name)?.oid
    }

    /// Records that `(from_type, from_name)` refers to `(type, name)` via
    /// `field`. Idempotent: recording the same edge twice has no extra
    /// effect.
    pub fn set_reference(
        &mut self,
        from_type: &str,
        from_name: &str,
        field: &str,
        obj_type: &str,
        name: &str,
    ) {
        let edge = ReferenceEdge::new(from_type, from_name, field);
        let cell = self.cell_mut(obj_type, name);
        if !cell.refs.contains(&edge) {
            cell.refs.push(edge);
        }
    }

    /// Drops all outgoing references from `(from_type, from_name)`, i.e.
    /// every edge it holds on any target. Returns the `(type, name)` of
    /// targets that were `pendingRemove` and have now lost their last
    /// reference — the caller should retry those deletes on the next
    /// sweep.
    pub fn release_references(
        &mut self,
        from_type: &str,
        from_name: &str,
    ) -> Vec<(String, String)> {
        let mut now_removable = Vec::new();
        for (obj_type, names) in self.cells.iter_mut() {
            for (name, cell) in names.iter_mut() {
                let had_refs = !cell.refs.is_empty();
                cell.refs
                    .retain(|e| !(e.ref_type == from_type && e.name == from_name));
                if had_refs && cell.refs.is_empty() && cell.pending_remove {
                    now_removable.push((obj_type.clone(), name.clone()));
                }
            }
        }
        now_removable
    }

    /// True if anything still refers to `(type, name)`.
    pub fn is_referenced(&self, obj_type: &str, name: &str) -> bool {
        self.cell(obj_type, name)
            .map(|c| !c.refs.is_empty())
            .unwrap_or(false)
    }

    /// A hint string naming what references `(type, name)`, for logging.
    pub fn who_references(&self, obj_type: &str, name: &str) -> String {
        match self.cell(obj_type, name) {
            Some(cell) => cell
                .refs
                .iter()
                .map(|e| format!("{}:{}.{}", e.ref_type, e.name, e.field))
                .collect::<Vec<_>>()
                .join(", "),
            None => String::new(),
        }
    }

    /// True if `(type, name)` is marked pending-remove.
    pub fn is_pending_remove(&self, obj_type: &str, name: &str) -> bool {
        self.cell(obj_type, name)
            .map(|c| c.pending_remove)
            .unwrap_or(false)
    }

    /// Marks `(type, name)` pending-remove without erasing it.
    pub fn mark_pending_remove(&mut self, obj_type: &str, name: &str) {
        self.cell_mut(obj_type, name).pending_remove = true;
    }

    /// Clears a pending-remove mark, e.g. after a config change brings the
    /// object back.
    pub fn clear_pending_remove(&mut self, obj_type: &str, name: &str) {
        if let Some(cell) = self.cells.get_mut(obj_type).and_then(|m| m.get_mut(name)) {
            cell.pending_remove = false;
        }
    }

    /// Removes `(type, name)` from the map entirely.
    pub fn erase(&mut self, obj_type: &str, name: &str) {
        if let Some(names) = self.cells.get_mut(obj_type) {
            names.remove(name);
            if names.is_empty() {
                self.cells.remove(obj_type);
            }
        }
    }

    /// Implements the delete handler template: if `(type, name)` is still
    /// referenced, mark it pending-remove and tell the caller to return
    /// NEED_RETRY without calling the HAL remove; otherwise erase it from
    /// the map so the caller can proceed with the HAL remove and the CRM
    /// decrement.
    pub fn begin_remove(&mut self, obj_type: &str, name: &str) -> ReferenceRemoval {
        if self.is_referenced(obj_type, name) {
            self.mark_pending_remove(obj_type, name);
            ReferenceRemoval::NeedRetry
        } else {
            self.erase(obj_type, name);
            ReferenceRemoval::Proceed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct RefCountedValue {
        data: String,
        ref_count: u32,
    }

    impl RefCountedValue {
        fn new(data: &str) -> Self {
            Self {
                data: data.to_string(),
                ref_count: 0,
            }
        }
    }

    impl HasRefCount for RefCountedValue {
        fn increment_ref(&mut self) -> u32 {
            self.ref_count += 1;
            self.ref_count
        }

        fn decrement_ref(&mut self) -> Option<u32> {
            if self.ref_count == 0 {
                None
            } else {
                self.ref_count -= 1;
                Some(self.ref_count)
            }
        }

        fn ref_count(&self) -> u32 {
            self.ref_count
        }
    }

    #[test]
    fn test_basic_operations() {
        let mut map: SyncMap<String, i32> = SyncMap::new();

        assert!(map.is_empty());
        assert!(map.get(&"key".to_string()).is_none());

        map.insert("key".to_string(), 42);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&"key".to_string()), Some(&42));

        map.remove(&"key".to_string());
        assert!(map.is_empty());
    }

    #[test]
    fn test_get_never_creates() {
        let mut map: SyncMap<String, i32> = SyncMap::new();

        // get() should return None and NOT create an entry
        assert!(map.get(&"missing".to_string()).is_none());
        assert!(map.is_empty());

        // get_mut() should also not create
        assert!(map.get_mut(&"missing".to_string()).is_none());
        assert!(map.is_empty());
    }

    #[test]
    fn test_increment_ref_requires_existing_key() {
        let mut map: SyncMap<String, RefCountedValue> = SyncMap::new();

        // Should fail for missing key
        assert!(map.increment_ref(&"missing".to_string()).is_err());

        // Should succeed for existing key
        map.insert("key".to_string(), RefCountedValue::new("test"));
        assert_eq!(map.increment_ref(&"key".to_string()).unwrap(), 1);
        assert_eq!(map.increment_ref(&"key".to_string()).unwrap(), 2);
    }

    #[test]
    fn test_decrement_ref_underflow_protection() {
        let mut map: SyncMap<String, RefCountedValue> = SyncMap::new();
        map.insert("key".to_string(), RefCountedValue::new("test"));

        // Should fail - ref_count is 0
        assert!(map.decrement_ref(&"key".to_string()).is_err());

        // After increment, decrement should work
        map.increment_ref(&"key".to_string()).unwrap();
        assert_eq!(map.decrement_ref(&"key".to_string()).unwrap(), 0);

        // Second decrement should fail again
        assert!(map.decrement_ref(&"key".to_string()).is_err());
    }

    #[test]
    fn test_get_or_insert() {
        let mut map: SyncMap<String, i32> = SyncMap::new();

        // This explicitly creates the entry
        let value = map.get_or_insert("key".to_string(), 42);
        assert_eq!(*value, 42);
        assert_eq!(map.len(), 1);

        // Second call returns existing value
        let value = map.get_or_insert("key".to_string(), 100);
        assert_eq!(*value, 42); // Not 100
    }

    #[test]
    fn test_reference_map_unreferenced_removes_immediately() {
        let mut refs = ReferenceMap::new();
        refs.set_oid("buffer_pool", "pool0", 0x1000);

        assert!(!refs.is_referenced("buffer_pool", "pool0"));
        assert_eq!(
            refs.begin_remove("buffer_pool", "pool0"),
            ReferenceRemoval::Proceed
        );
        assert!(refs.oid("buffer_pool", "pool0").is_none());
    }

    /// End-to-end scenario 4: create pool P, create profile F referencing
    /// P, attempt delete P (gated), delete F, then P becomes removable.
    #[test]
    fn test_reference_gate_scenario() {
        let mut refs = ReferenceMap::new();
        refs.set_oid("buffer_pool", "P", 1);
        refs.set_oid("buffer_profile", "F", 2);
        refs.set_reference("buffer_profile", "F", "pool", "buffer_pool", "P");

        assert!(refs.is_referenced("buffer_pool", "P"));
        assert_eq!(refs.who_references("buffer_pool", "P"), "buffer_profile:F.pool");

        // Delete of P is gated: marked pendingRemove, HAL remove not called.
        assert_eq!(
            refs.begin_remove("buffer_pool", "P"),
            ReferenceRemoval::NeedRetry
        );
        assert!(refs.is_pending_remove("buffer_pool", "P"));
        assert!(refs.oid("buffer_pool", "P").is_some());

        // Delete F: nothing refers to F itself, so its remove proceeds and
        // releases F's own outgoing reference to P.
        assert_eq!(
            refs.begin_remove("buffer_profile", "F"),
            ReferenceRemoval::Proceed
        );
        let now_removable = refs.release_references("buffer_profile", "F");
        assert_eq!(now_removable, vec![("buffer_pool".to_string(), "P".to_string())]);

        // Next sweep: P is no longer referenced, remove proceeds.
        assert!(!refs.is_referenced("buffer_pool", "P"));
        assert_eq!(
            refs.begin_remove("buffer_pool", "P"),
            ReferenceRemoval::Proceed
        );
    }

    #[test]
    fn test_reference_map_set_reference_idempotent() {
        let mut refs = ReferenceMap::new();
        refs.set_reference("vrf", "Vrf1", "vrf", "route", "10.0.0.0/24");
        refs.set_reference("vrf", "Vrf1", "vrf", "route", "10.0.0.0/24");

        assert_eq!(
            refs.who_references("route", "10.0.0.0/24"),
            "vrf:Vrf1.vrf"
        );
    }
}
