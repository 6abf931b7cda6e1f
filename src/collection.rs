use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// Collection
///
/// A generic keyed, in-memory record collection — the storage primitive for the
/// entire backend. Every record kind (developers, keys, players, events, ...)
/// lives in its own `Collection<T>` inside the shared `Store`.
///
/// Semantics are deliberately minimal:
/// - **Last-write-wins**: `insert` with an existing id silently replaces.
/// - **Linear-scan filtering**: `filter` walks every record; there is no
///   secondary indexing.
/// - No eviction, no transactions, no persistence.
pub struct Collection<T> {
    records: RwLock<HashMap<Uuid, T>>,
}

impl<T: Clone> Collection<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts (or replaces) the record under `id`. Last-write-wins.
    pub fn insert(&self, id: Uuid, record: T) {
        self.records
            .write()
            .expect("collection lock poisoned")
            .insert(id, record);
    }

    /// Returns a clone of the record, if present.
    pub fn get(&self, id: Uuid) -> Option<T> {
        self.records
            .read()
            .expect("collection lock poisoned")
            .get(&id)
            .cloned()
    }

    /// Applies `mutate` to the record in place and returns the updated clone.
    /// Returns `None` (without calling `mutate`) when the id is absent.
    pub fn update<F>(&self, id: Uuid, mutate: F) -> Option<T>
    where
        F: FnOnce(&mut T),
    {
        let mut records = self.records.write().expect("collection lock poisoned");
        let record = records.get_mut(&id)?;
        mutate(record);
        Some(record.clone())
    }

    /// Removes and returns the record, if present.
    pub fn remove(&self, id: Uuid) -> Option<T> {
        self.records
            .write()
            .expect("collection lock poisoned")
            .remove(&id)
    }

    /// Linear scan: clones of every record matching the predicate.
    pub fn filter<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.records
            .read()
            .expect("collection lock poisoned")
            .values()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }

    /// Clones of every record, in unspecified order.
    pub fn all(&self) -> Vec<T> {
        self.records
            .read()
            .expect("collection lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .expect("collection lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every record matching the predicate, returning how many went.
    pub fn remove_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&T) -> bool,
    {
        let mut records = self.records.write().expect("collection lock poisoned");
        let before = records.len();
        records.retain(|_, r| !predicate(r));
        before - records.len()
    }
}

impl<T: Clone> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}
