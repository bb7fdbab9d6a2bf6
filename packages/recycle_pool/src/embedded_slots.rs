use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{EphemeralKey, EphemeralMap, InvalidKeyError};

/// An [`EphemeralMap`] that stores each association inside the key entry itself.
///
/// Every map instance has a process-unique identity, and the value associated with an entry is
/// kept in a hidden slot of that entry, labeled with the identity of the map. Nothing outside the
/// entry refers to the entry, so the map can never keep it alive. The association is dropped
/// together with the entry.
///
/// Dropping the map does not visit its keys: the hidden slots of entries that outlive the map
/// keep their (now unreachable) values until the entries themselves are dropped.
///
/// This is the fallback membership strategy of a [`Pool`][crate::Pool], selected via
/// [`MembershipStrategy::EmbeddedSlot`][crate::MembershipStrategy::EmbeddedSlot].
pub struct EmbeddedSlotMap<V> {
    id: MapId,

    _value: PhantomData<V>,
}

impl<V> EmbeddedSlotMap<V> {
    /// Creates an empty map with a fresh identity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: MapId::next(),
            _value: PhantomData,
        }
    }
}

impl<T, V: Clone + 'static> EphemeralMap<T, V> for EmbeddedSlotMap<V> {
    fn set<K>(&mut self, key: &K, value: V) -> Result<(), InvalidKeyError>
    where
        K: EphemeralKey<T> + ?Sized,
    {
        let entry = key.live_entry().ok_or(InvalidKeyError)?;
        entry.slots().set(self.id, value);
        Ok(())
    }

    fn get<K>(&self, key: &K) -> Option<V>
    where
        K: EphemeralKey<T> + ?Sized,
    {
        key.live_entry()?.slots().get(self.id)
    }

    fn has<K>(&self, key: &K) -> bool
    where
        K: EphemeralKey<T> + ?Sized,
    {
        key.live_entry()
            .is_some_and(|entry| entry.slots().contains(self.id))
    }

    fn delete<K>(&mut self, key: &K)
    where
        K: EphemeralKey<T> + ?Sized,
    {
        if let Some(entry) = key.live_entry() {
            entry.slots().remove(self.id);
        }
    }
}

impl<V> Default for EmbeddedSlotMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for EmbeddedSlotMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("id", &self.id)
            .finish()
    }
}

/// Labels the hidden slots that belong to one [`EmbeddedSlotMap`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct MapId(u64);

static NEXT_MAP_ID: AtomicU64 = AtomicU64::new(0);

impl MapId {
    pub(crate) fn next() -> Self {
        // Relaxed is enough, we only need every value to be handed out once.
        Self(NEXT_MAP_ID.fetch_add(1, Ordering::Relaxed))
    }
}
