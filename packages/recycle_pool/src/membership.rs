use std::fmt;

use serde::Deserialize;

use crate::{EmbeddedSlotMap, Entry, EphemeralMap, OwnerToken, SideTableMap};

/// Selects how a pool remembers which entries it produced.
///
/// Both strategies answer "is this entry mine?" in constant time and neither keeps entries
/// alive. They differ in where the bookkeeping lives.
///
/// # Examples
///
/// ```
/// use recycle_pool::{MembershipStrategy, Pool};
///
/// let pool = Pool::<String>::builder()
///     .membership(MembershipStrategy::EmbeddedSlot)
///     .build();
/// ```
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum MembershipStrategy {
    /// A weak side table owned by the pool ([`SideTableMap`]). This is the default.
    #[default]
    SideTable,

    /// A hidden slot inside each entry ([`EmbeddedSlotMap`]).
    EmbeddedSlot,
}

/// What the pool records about each entry it produced.
///
/// The epoch changes on every reset, so entries produced before a reset stop matching even
/// though the owner token stays the same.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Stamp {
    pub(crate) owner: OwnerToken,
    pub(crate) epoch: u64,
}

/// The pool-private registry of entries, backed by the selected [`MembershipStrategy`].
pub(crate) enum Membership<T> {
    SideTable(SideTableMap<T, Stamp>),
    EmbeddedSlot(EmbeddedSlotMap<Stamp>),
}

impl<T> Membership<T> {
    pub(crate) fn new(strategy: MembershipStrategy) -> Self {
        match strategy {
            MembershipStrategy::SideTable => Self::SideTable(SideTableMap::new()),
            MembershipStrategy::EmbeddedSlot => Self::EmbeddedSlot(EmbeddedSlotMap::new()),
        }
    }

    pub(crate) fn register(&mut self, entry: &Entry<T>, stamp: Stamp) {
        let result = match self {
            Self::SideTable(map) => map.set(entry, stamp),
            Self::EmbeddedSlot(map) => map.set(entry, stamp),
        };

        result.expect("a strong entry handle always refers to a live entry, so it is a valid key");
    }

    pub(crate) fn stamp_of(&self, entry: &Entry<T>) -> Option<Stamp> {
        match self {
            Self::SideTable(map) => map.get(entry),
            Self::EmbeddedSlot(map) => map.get(entry),
        }
    }

    pub(crate) fn deregister(&mut self, entry: &Entry<T>) {
        match self {
            Self::SideTable(map) => map.delete(entry),
            Self::EmbeddedSlot(map) => map.delete(entry),
        }
    }

    pub(crate) fn strategy(&self) -> MembershipStrategy {
        match self {
            Self::SideTable(_) => MembershipStrategy::SideTable,
            Self::EmbeddedSlot(_) => MembershipStrategy::EmbeddedSlot,
        }
    }
}

impl<T> fmt::Debug for Membership<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SideTable(map) => f.debug_tuple("SideTable").field(map).finish(),
            Self::EmbeddedSlot(map) => f.debug_tuple("EmbeddedSlot").field(map).finish(),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn stamp(owner: u64, epoch: u64) -> Stamp {
        Stamp {
            owner: OwnerToken::from_raw(owner),
            epoch,
        }
    }

    fn exercise(strategy: MembershipStrategy) {
        let mut membership = Membership::<u32>::new(strategy);
        assert_eq!(membership.strategy(), strategy);

        let entry = Entry::new(1);
        let stranger = Entry::new(1);

        membership.register(&entry, stamp(1, 0));

        assert_eq!(membership.stamp_of(&entry), Some(stamp(1, 0)));
        assert_eq!(membership.stamp_of(&stranger), None);

        membership.register(&entry, stamp(1, 1));
        assert_eq!(membership.stamp_of(&entry), Some(stamp(1, 1)));

        membership.deregister(&entry);
        assert_eq!(membership.stamp_of(&entry), None);
    }

    #[test]
    fn side_table_tracks_stamps() {
        exercise(MembershipStrategy::SideTable);
    }

    #[test]
    fn embedded_slot_tracks_stamps() {
        exercise(MembershipStrategy::EmbeddedSlot);
    }

    #[test]
    fn default_strategy_is_side_table() {
        assert_eq!(MembershipStrategy::default(), MembershipStrategy::SideTable);
    }
}
