use std::borrow::Cow;

use thiserror::Error;

use crate::{Entry, WeakEntry};

/// An association from entries to values that is never the reason an entry stays alive.
///
/// Once every strong handle to an entry is dropped, the entry's value is dropped as well,
/// regardless of whether the entry is still a key in some map. Two implementations exist:
///
/// * [`SideTableMap`][crate::SideTableMap] keeps a table next to the entries, referring to them
///   through weak references.
/// * [`EmbeddedSlotMap`][crate::EmbeddedSlotMap] stores the association inside the key entry
///   itself, in an area that callers cannot see.
///
/// # Example
///
/// ```rust
/// use recycle_pool::{EphemeralMap, Entry, SideTableMap};
///
/// let mut map = SideTableMap::<String, u32>::new();
/// let entry = Entry::new(String::from("key"));
///
/// map.set(&entry, 1).unwrap();
/// assert_eq!(map.get(&entry), Some(1));
///
/// map.delete(&entry);
/// assert!(!map.has(&entry));
/// ```
pub trait EphemeralMap<T, V> {
    /// Associates `value` with `key`, replacing any previous association.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidKeyError`] if `key` does not refer to a live entry.
    fn set<K>(&mut self, key: &K, value: V) -> Result<(), InvalidKeyError>
    where
        K: EphemeralKey<T> + ?Sized;

    /// Returns the value associated with `key`, if any.
    fn get<K>(&self, key: &K) -> Option<V>
    where
        K: EphemeralKey<T> + ?Sized;

    /// Whether `key` has an associated value.
    fn has<K>(&self, key: &K) -> bool
    where
        K: EphemeralKey<T> + ?Sized;

    /// Removes the association of `key`. Does nothing if there is none.
    fn delete<K>(&mut self, key: &K)
    where
        K: EphemeralKey<T> + ?Sized;
}

/// Something that can be used as a key of an [`EphemeralMap`].
///
/// A key refers to at most one live [`Entry`]. Keys that do not refer to a live entry cannot
/// carry an association.
pub trait EphemeralKey<T> {
    /// The entry this key refers to, if that entry is still alive.
    fn live_entry(&self) -> Option<Cow<'_, Entry<T>>>;
}

impl<T> EphemeralKey<T> for Entry<T> {
    fn live_entry(&self) -> Option<Cow<'_, Entry<T>>> {
        Some(Cow::Borrowed(self))
    }
}

impl<T> EphemeralKey<T> for WeakEntry<T> {
    fn live_entry(&self) -> Option<Cow<'_, Entry<T>>> {
        self.upgrade().map(Cow::Owned)
    }
}

/// The key given to [`EphemeralMap::set()`] does not refer to a live entry.
#[derive(Debug, Error)]
#[error("invalid value used as an ephemeral map key: it does not refer to a live entry")]
#[non_exhaustive]
pub struct InvalidKeyError;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(InvalidKeyError: Send, Sync, std::error::Error);

    #[test]
    fn entry_is_always_a_live_key() {
        let entry = Entry::new(1_u8);
        let live = entry.live_entry().unwrap();

        assert!(Entry::ptr_eq(&live, &entry));
        assert!(matches!(live, Cow::Borrowed(_)));
    }

    #[test]
    fn weak_entry_is_live_only_while_entry_is() {
        let entry = Entry::new(1_u8);
        let weak = Entry::downgrade(&entry);

        assert!(weak.live_entry().is_some());

        drop(entry);

        assert!(weak.live_entry().is_none());
        assert!(WeakEntry::<u8>::new().live_entry().is_none());
    }

    #[test]
    fn invalid_key_error_has_message() {
        assert!(InvalidKeyError.to_string().contains("live entry"));
    }
}
