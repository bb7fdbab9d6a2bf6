use std::any::type_name;
use std::fmt;
use std::rc::Weak;

use foldhash::{HashMap, HashMapExt};

use crate::{EntryCell, EphemeralKey, EphemeralMap, InvalidKeyError};

/// The table is only scanned for records of dead entries once it holds at least this many.
const MIN_PURGE_THRESHOLD: usize = 64;

/// An [`EphemeralMap`] that keeps its associations in a hash table next to the entries.
///
/// The table refers to each key through a weak reference, so it never keeps an entry's value
/// alive. As long as a record exists, the weak reference also keeps the address of the entry from
/// being reused by another entry, which makes the address a reliable identity.
///
/// When an entry is dropped while it is still a key, its record lingers until the table purges
/// records of dead entries. That happens automatically when the table grows past twice its size
/// after the previous purge, or on demand via [`purge()`][Self::purge].
///
/// This is the default membership strategy of a [`Pool`][crate::Pool].
pub struct SideTableMap<T, V> {
    /// Keyed by entry address. We use foldhash for better performance with small hash tables.
    records: HashMap<usize, Record<T, V>>,

    purge_threshold: usize,
}

struct Record<T, V> {
    key: Weak<EntryCell<T>>,
    value: V,
}

impl<T, V> SideTableMap<T, V> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            purge_threshold: MIN_PURGE_THRESHOLD,
        }
    }

    /// The number of records in the table, including records of entries that have been dropped
    /// but not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops the records of all keys whose entries are no longer alive.
    pub fn purge(&mut self) {
        self.records.retain(|_, record| record.key.strong_count() > 0);

        self.purge_threshold = self
            .records
            .len()
            .saturating_mul(2)
            .max(MIN_PURGE_THRESHOLD);
    }
}

impl<T, V: Clone> EphemeralMap<T, V> for SideTableMap<T, V> {
    fn set<K>(&mut self, key: &K, value: V) -> Result<(), InvalidKeyError>
    where
        K: EphemeralKey<T> + ?Sized,
    {
        let entry = key.live_entry().ok_or(InvalidKeyError)?;

        if self.records.len() >= self.purge_threshold {
            self.purge();
        }

        self.records.insert(
            entry.address(),
            Record {
                key: entry.downgrade_cell(),
                value,
            },
        );

        Ok(())
    }

    fn get<K>(&self, key: &K) -> Option<V>
    where
        K: EphemeralKey<T> + ?Sized,
    {
        let entry = key.live_entry()?;

        self.records
            .get(&entry.address())
            .map(|record| record.value.clone())
    }

    fn has<K>(&self, key: &K) -> bool
    where
        K: EphemeralKey<T> + ?Sized,
    {
        key.live_entry()
            .is_some_and(|entry| self.records.contains_key(&entry.address()))
    }

    fn delete<K>(&mut self, key: &K)
    where
        K: EphemeralKey<T> + ?Sized,
    {
        if let Some(entry) = key.live_entry() {
            self.records.remove(&entry.address());
        }
    }
}

impl<T, V> Default for SideTableMap<T, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, V> fmt::Debug for SideTableMap<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("len", &self.records.len())
            .field("purge_threshold", &self.purge_threshold)
            .finish()
    }
}
