//! Bulk SAI call aggregators.
//!
//! `EntityBulker` and `ObjectBulker` batch many pending create/remove/set
//! calls for a single SAI object type and dispatch them with the bulk SAI
//! APIs instead of one call per entry. Callers stage work with
//! `create_entry`/`remove_entry`/`set_entry_attribute`, then call `flush()`
//! once per event-loop iteration to actually issue the bulk calls.
//!
//! Staged work is keyed by an opaque request id rather than an output
//! pointer (there is nothing in Rust to point into): callers keep their own
//! map from request id back to whatever context they need, and read the
//! final statuses out of flush()'s return value.
use std::collections::HashMap;
use std::hash::Hash;

use sonic_sai::SaiStatus;

/// A single pending SAI attribute in attribute-id/value form.
pub type SaiAttr<A> = A;

/// HAL surface a bulker dispatches through.
///
/// Implementations wrap the real bulk SAI functions
/// (`create_route_entries`, `remove_next_hop_group_members`, ...);
/// tests provide a fake that records calls.
pub trait BulkEntryApi<E, A> {
    /// Bulk-creates entries, one attribute list per entry.
    fn bulk_create(&self, entries: &[E], attrs: &[Vec<A>]) -> Vec<SaiStatus>;
    /// Bulk-removes entries.
    fn bulk_remove(&self, entries: &[E]) -> Vec<SaiStatus>;
    /// Bulk-sets a single attribute per entry.
    fn bulk_set(&self, entries: &[E], attrs: &[A]) -> Vec<SaiStatus>;
}

/// HAL surface for bulkers whose entries are SAI object ids allocated on
/// create (next hop group members, etc.), rather than caller-defined keys.
pub trait BulkObjectApi<A> {
    /// Bulk-creates objects. Returns one (status, object_id) pair per entry,
    /// in request order.
    fn bulk_create(&self, attrs: &[Vec<A>]) -> Vec<(SaiStatus, u64)>;
    /// Bulk-removes objects by id.
    fn bulk_remove(&self, object_ids: &[u64]) -> Vec<SaiStatus>;
}

struct CreatingEntry<E, A> {
    entry: E,
    attrs: Vec<A>,
}

struct SettingEntry<E, A> {
    entry: E,
    attr: A,
}

/// Aggregates create/remove/set calls for SAI objects keyed by a
/// caller-defined entry type (route prefix, inseg label, FDB entry...).
///
/// # Quick-cancel
///
/// If an entry queued for creation is removed before the next `flush()`,
/// the create is dropped and the remove resolves immediately as success:
/// the object never reached hardware, so there's nothing to remove.
/// Likewise a remove on an entry with pending `set_entry_attribute` calls
/// drops those sets; they never get a chance to apply to an object that's
/// about to disappear.
pub struct EntityBulker<E, A, Api> {
    api: Api,
    max_bulk_size: usize,
    next_id: u64,
    creating_entries: HashMap<E, (u64, CreatingEntry<E, A>)>,
    setting_entries: HashMap<E, Vec<(u64, SettingEntry<E, A>)>>,
    removing_entries: HashMap<E, u64>,
    resolved: Vec<(u64, SaiStatus)>,
}

impl<E, A, Api> EntityBulker<E, A, Api>
where
    E: Eq + Hash + Clone,
    A: Clone,
    Api: BulkEntryApi<E, A>,
{
    /// Creates a new bulker dispatching through `api`, chunking bulk calls
    /// at `max_bulk_size` entries.
    pub fn new(api: Api, max_bulk_size: usize) -> Self {
        Self {
            api,
            max_bulk_size: max_bulk_size.max(1),
            next_id: 0,
            creating_entries: HashMap::new(),
            setting_entries: HashMap::new(),
            removing_entries: HashMap::new(),
            resolved: Vec::new(),
        }
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Queues a create. Returns the request id whose status appears in a
    /// future `flush()` result, or `Err` immediately if the entry is
    /// already queued for creation.
    pub fn create_entry(&mut self, entry: E, attrs: Vec<A>) -> Result<u64, SaiStatus> {
        if self.creating_entries.contains_key(&entry) {
            return Err(SaiStatus::ItemAlreadyExists);
        }
        let id = self.alloc_id();
        self.creating_entries.insert(
            entry.clone(),
            (id, CreatingEntry { entry, attrs }),
        );
        Ok(id)
    }

    /// Queues a remove. If the entry was only ever staged for creation (or
    /// has pending sets), this resolves immediately without hitting SAI.
    pub fn remove_entry(&mut self, entry: E) -> Result<u64, SaiStatus> {
        if let Some(pending_sets) = self.setting_entries.remove(&entry) {
            for (id, _) in pending_sets {
                self.resolved.push((id, SaiStatus::Success));
            }
        }

        if let Some((id, _)) = self.creating_entries.remove(&entry) {
            self.resolved.push((id, SaiStatus::Success));
            let remove_id = self.alloc_id();
            self.resolved.push((remove_id, SaiStatus::Success));
            return Ok(remove_id);
        }

        let id = self.alloc_id();
        self.removing_entries.insert(entry, id);
        Ok(id)
    }

    /// Queues a set-attribute call.
    pub fn set_entry_attribute(&mut self, entry: E, attr: A) -> u64 {
        let id = self.alloc_id();
        self.setting_entries
            .entry(entry.clone())
            .or_default()
            .push((id, SettingEntry { entry, attr }));
        id
    }

    /// Returns true if `entry` has a pending remove queued.
    pub fn bulk_entry_pending_removal(&self, entry: &E) -> bool {
        self.removing_entries.contains_key(entry)
    }

    pub fn creating_entries_count(&self) -> usize {
        self.creating_entries.len()
    }

    pub fn setting_entries_count(&self) -> usize {
        self.setting_entries.values().map(|v| v.len()).sum()
    }

    pub fn removing_entries_count(&self) -> usize {
        self.removing_entries.len()
    }

    /// Dispatches all staged work in remove, create, set order and returns
    /// the resolved status of every request id since the last flush.
    pub fn flush(&mut self) -> Vec<(u64, SaiStatus)> {
        let mut results = std::mem::take(&mut self.resolved);

        for chunk in chunks_of(self.removing_entries.drain().collect(), self.max_bulk_size) {
            let (entries, ids): (Vec<E>, Vec<u64>) = chunk.into_iter().unzip();
            let statuses = self.api.bulk_remove(&entries);
            results.extend(ids.into_iter().zip(statuses));
        }

        for chunk in chunks_of(
            self.creating_entries.drain().map(|(_, v)| v).collect(),
            self.max_bulk_size,
        ) {
            let (ids, entries_attrs): (Vec<u64>, Vec<(E, Vec<A>)>) = chunk
                .into_iter()
                .map(|(id, e)| (id, (e.entry, e.attrs)))
                .unzip();
            let (entries, attrs): (Vec<E>, Vec<Vec<A>>) = entries_attrs.into_iter().unzip();
            let statuses = self.api.bulk_create(&entries, &attrs);
            results.extend(ids.into_iter().zip(statuses));
        }

        let flat_sets: Vec<(u64, SettingEntry<E, A>)> = self
            .setting_entries
            .drain()
            .flat_map(|(_, v)| v.into_iter())
            .collect();
        for chunk in chunks_of(flat_sets, self.max_bulk_size) {
            let (ids, entries_attrs): (Vec<u64>, Vec<(E, A)>) = chunk
                .into_iter()
                .map(|(id, s)| (id, (s.entry, s.attr)))
                .unzip();
            let (entries, attrs): (Vec<E>, Vec<A>) = entries_attrs.into_iter().unzip();
            let statuses = self.api.bulk_set(&entries, &attrs);
            results.extend(ids.into_iter().zip(statuses));
        }

        results
    }

    /// Drops all staged work without dispatching it.
    pub fn clear(&mut self) {
        self.creating_entries.clear();
        self.setting_entries.clear();
        self.removing_entries.clear();
        self.resolved.clear();
    }
}

/// Aggregates create/remove calls for SAI objects whose id is assigned by
/// SAI on creation (e.g. next hop group members).
pub struct ObjectBulker<A, Api> {
    api: Api,
    max_bulk_size: usize,
    next_id: u64,
    creating_entries: Vec<(u64, Vec<A>)>,
    removing_entries: HashMap<u64, u64>,
    resolved: Vec<(u64, SaiStatus, Option<u64>)>,
}

impl<A, Api> ObjectBulker<A, Api>
where
    A: Clone,
    Api: BulkObjectApi<A>,
{
    pub fn new(api: Api, max_bulk_size: usize) -> Self {
        Self {
            api,
            max_bulk_size: max_bulk_size.max(1),
            next_id: 0,
            creating_entries: Vec::new(),
            removing_entries: HashMap::new(),
            resolved: Vec::new(),
        }
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Queues a create. The resulting object id, if any, comes back in the
    /// `flush()` result alongside the status.
    pub fn create_entry(&mut self, attrs: Vec<A>) -> u64 {
        let id = self.alloc_id();
        self.creating_entries.push((id, attrs));
        id
    }

    /// Queues a remove of an already-created object.
    pub fn remove_entry(&mut self, object_id: u64) -> u64 {
        let id = self.alloc_id();
        self.removing_entries.insert(object_id, id);
        id
    }

    pub fn creating_entries_count(&self) -> usize {
        self.creating_entries.len()
    }

    pub fn removing_entries_count(&self) -> usize {
        self.removing_entries.len()
    }

    /// Dispatches staged removes then creates. Returns
    /// `(request_id, status, object_id)`; `object_id` is only populated for
    /// creates that succeeded.
    pub fn flush(&mut self) -> Vec<(u64, SaiStatus, Option<u64>)> {
        let mut results = std::mem::take(&mut self.resolved);

        for chunk in chunks_of(self.removing_entries.drain().collect(), self.max_bulk_size) {
            let (object_ids, ids): (Vec<u64>, Vec<u64>) = chunk.into_iter().unzip();
            let statuses = self.api.bulk_remove(&object_ids);
            results.extend(ids.into_iter().zip(statuses).map(|(id, s)| (id, s, None)));
        }

        for chunk in chunks_of(std::mem::take(&mut self.creating_entries), self.max_bulk_size) {
            let (ids, attrs): (Vec<u64>, Vec<Vec<A>>) = chunk.into_iter().unzip();
            let created = self.api.bulk_create(&attrs);
            results.extend(
                ids.into_iter()
                    .zip(created)
                    .map(|(id, (status, oid))| (id, status, Some(oid))),
            );
        }

        results
    }

    pub fn clear(&mut self) {
        self.creating_entries.clear();
        self.removing_entries.clear();
        self.resolved.clear();
    }
}

fn chunks_of<T>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    let mut out = Vec::new();
    let mut iter = items.into_iter().peekable();
    while iter.peek().is_some() {
        out.push(iter.by_ref().take(size).collect());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeApi {
        create_calls: RefCell<Vec<usize>>,
        remove_calls: RefCell<Vec<usize>>,
        set_calls: RefCell<Vec<usize>>,
    }

    impl BulkEntryApi<String, (String, String)> for FakeApi {
        fn bulk_create(&self, entries: &[String], attrs: &[Vec<(String, String)>]) -> Vec<SaiStatus> {
            self.create_calls.borrow_mut().push(entries.len());
            assert_eq!(entries.len(), attrs.len());
            vec![SaiStatus::Success; entries.len()]
        }

        fn bulk_remove(&self, entries: &[String]) -> Vec<SaiStatus> {
            self.remove_calls.borrow_mut().push(entries.len());
            vec![SaiStatus::Success; entries.len()]
        }

        fn bulk_set(&self, entries: &[String], attrs: &[(String, String)]) -> Vec<SaiStatus> {
            self.set_calls.borrow_mut().push(entries.len());
            assert_eq!(entries.len(), attrs.len());
            vec![SaiStatus::Success; entries.len()]
        }
    }

    #[test]
    fn create_then_flush_resolves_success() {
        let mut bulker = EntityBulker::new(FakeApi::default(), 100);
        let id = bulker
            .create_entry("10.0.0.0/24".to_string(), vec![("nexthop".into(), "eth0".into())])
            .unwrap();

        let results = bulker.flush();
        assert_eq!(results, vec![(id, SaiStatus::Success)]);
        assert_eq!(bulker.creating_entries_count(), 0);
    }

    #[test]
    fn remove_of_pending_create_quick_cancels() {
        let mut bulker = EntityBulker::new(FakeApi::default(), 100);
        let create_id = bulker.create_entry("10.0.0.0/24".to_string(), vec![]).unwrap();
        let remove_id = bulker.remove_entry("10.0.0.0/24".to_string()).unwrap();

        // No bulk call is needed; both resolve on the next flush without
        // ever touching the HAL.
        assert_eq!(bulker.creating_entries_count(), 0);
        assert_eq!(bulker.removing_entries_count(), 0);

        let results = bulker.flush();
        assert!(results.contains(&(create_id, SaiStatus::Success)));
        assert!(results.contains(&(remove_id, SaiStatus::Success)));
        assert_eq!(bulker.api.create_calls.borrow().len(), 0);
        assert_eq!(bulker.api.remove_calls.borrow().len(), 0);
    }

    #[test]
    fn remove_drops_pending_sets() {
        let mut bulker = EntityBulker::new(FakeApi::default(), 100);
        bulker.create_entry("key".to_string(), vec![]).unwrap();
        bulker.flush();

        let set_id = bulker.set_entry_attribute("key".to_string(), ("mtu".into(), "9000".into()));
        let remove_id = bulker.remove_entry("key".to_string()).unwrap();

        let results = bulker.flush();
        assert!(results.contains(&(set_id, SaiStatus::Success)));
        assert!(results.iter().any(|(id, s)| *id == remove_id && *s == SaiStatus::Success));
        assert_eq!(bulker.api.set_calls.borrow().len(), 0);
    }

    #[test]
    fn chunking_splits_at_max_bulk_size() {
        let mut bulker = EntityBulker::new(FakeApi::default(), 2);
        for i in 0..5 {
            bulker.create_entry(format!("key{i}"), vec![]).unwrap();
        }
        bulker.flush();
        let calls = bulker.api.create_calls.borrow().clone();
        assert_eq!(calls.iter().sum::<usize>(), 5);
        assert!(calls.iter().all(|&n| n <= 2));
    }

    struct FakeObjectApi {
        next_oid: RefCell<u64>,
    }

    impl BulkObjectApi<(String, String)> for FakeObjectApi {
        fn bulk_create(&self, attrs: &[Vec<(String, String)>]) -> Vec<(SaiStatus, u64)> {
            attrs
                .iter()
                .map(|_| {
                    let mut n = self.next_oid.borrow_mut();
                    *n += 1;
                    (SaiStatus::Success, *n)
                })
                .collect()
        }

        fn bulk_remove(&self, object_ids: &[u64]) -> Vec<SaiStatus> {
            vec![SaiStatus::Success; object_ids.len()]
        }
    }

    #[test]
    fn object_bulker_assigns_ids_on_create() {
        let mut bulker = ObjectBulker::new(FakeObjectApi { next_oid: RefCell::new(0) }, 100);
        let id = bulker.create_entry(vec![("index".into(), "0".into())]);
        let results = bulker.flush();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, id);
        assert_eq!(results[0].1, SaiStatus::Success);
        assert!(results[0].2.is_some());
    }
}
