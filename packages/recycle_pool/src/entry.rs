use std::any::{Any, type_name};
use std::cell::{BorrowMutError, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::MapId;

/// A handle to a value managed by a [`Pool`][crate::Pool].
///
/// An entry is a reference-counted handle: cloning it yields another handle to the same value,
/// and two handles are considered the same entry if and only if [`Entry::ptr_eq()`] says so.
/// The pool never looks at the value itself, only at the identity of the entry.
///
/// The value is accessed through [`borrow()`][Self::borrow] and
/// [`borrow_mut()`][Self::borrow_mut], which follow the rules of [`RefCell`]. Pool hooks also
/// borrow the value mutably while they run, so a caller must not hold a borrow of an entry across
/// a call that hands the entry to the pool.
///
/// # Example
///
/// ```rust
/// use recycle_pool::Entry;
///
/// let entry = Entry::new(vec![1, 2, 3]);
/// let alias = entry.clone();
///
/// alias.borrow_mut().push(4);
///
/// assert_eq!(*entry.borrow(), vec![1, 2, 3, 4]);
/// assert!(Entry::ptr_eq(&entry, &alias));
/// ```
///
/// # Thread safety
///
/// This type is single-threaded. It is neither [`Send`] nor [`Sync`].
pub struct Entry<T> {
    cell: Rc<EntryCell<T>>,
}

/// The allocation behind an [`Entry`]. Its address is the identity of the entry.
pub(crate) struct EntryCell<T> {
    slots: HiddenSlots,
    value: RefCell<T>,
}

impl<T> Entry<T> {
    /// Wraps a value in a new entry that does not belong to any pool.
    ///
    /// Pools create their own entries through their factory. Entries created here are never
    /// accepted by [`Pool::release()`][crate::Pool::release].
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            cell: Rc::new(EntryCell {
                slots: HiddenSlots::default(),
                value: RefCell::new(value),
            }),
        }
    }

    /// Immutably borrows the value.
    ///
    /// # Panics
    ///
    /// Panics if the value is currently mutably borrowed.
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, T> {
        self.cell.value.borrow()
    }

    /// Mutably borrows the value.
    ///
    /// # Panics
    ///
    /// Panics if the value is currently borrowed.
    #[must_use]
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.cell.value.borrow_mut()
    }

    /// Mutably borrows the value, failing if it is currently borrowed.
    ///
    /// # Errors
    ///
    /// Returns [`BorrowMutError`] if the value is currently borrowed through any handle.
    pub fn try_borrow_mut(&self) -> Result<RefMut<'_, T>, BorrowMutError> {
        self.cell.value.try_borrow_mut()
    }

    /// Whether two handles refer to the same entry.
    #[must_use]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Rc::ptr_eq(&this.cell, &other.cell)
    }

    /// Creates a non-owning reference to the entry.
    ///
    /// The weak reference does not keep the value alive.
    #[must_use]
    pub fn downgrade(this: &Self) -> WeakEntry<T> {
        WeakEntry {
            cell: Rc::downgrade(&this.cell),
        }
    }

    pub(crate) fn address(&self) -> usize {
        Rc::as_ptr(&self.cell).addr()
    }

    pub(crate) fn downgrade_cell(&self) -> Weak<EntryCell<T>> {
        Rc::downgrade(&self.cell)
    }

    pub(crate) fn slots(&self) -> &HiddenSlots {
        &self.cell.slots
    }
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Entry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("value", &self.cell.value)
            .finish_non_exhaustive()
    }
}

/// A non-owning reference to an [`Entry`].
///
/// A weak entry does not keep the value alive. Use [`upgrade()`][Self::upgrade] to get the entry
/// back while some strong handle still exists.
pub struct WeakEntry<T> {
    cell: Weak<EntryCell<T>>,
}

impl<T> WeakEntry<T> {
    /// Creates a weak entry that never referred to anything. Upgrading it always fails.
    #[must_use]
    pub fn new() -> Self {
        Self { cell: Weak::new() }
    }

    /// Returns the entry if its value is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Entry<T>> {
        self.cell.upgrade().map(|cell| Entry { cell })
    }
}

impl<T> Clone for WeakEntry<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Weak::clone(&self.cell),
        }
    }
}

impl<T> Default for WeakEntry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for WeakEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("alive", &(self.cell.strong_count() > 0))
            .finish()
    }
}

/// Associations stored directly inside an entry, one per [`EmbeddedSlotMap`][1] that the entry
/// is a key of. Callers never see these.
///
/// Most entries belong to exactly one map, hence the inline capacity of one.
///
/// [1]: crate::EmbeddedSlotMap
#[derive(Default)]
pub(crate) struct HiddenSlots {
    slots: RefCell<SmallVec<[(MapId, Box<dyn Any>); 1]>>,
}

impl HiddenSlots {
    pub(crate) fn get<V: Clone + 'static>(&self, map: MapId) -> Option<V> {
        self.slots
            .borrow()
            .iter()
            .find(|(id, _)| *id == map)
            .and_then(|(_, value)| value.downcast_ref::<V>())
            .cloned()
    }

    pub(crate) fn contains(&self, map: MapId) -> bool {
        self.slots.borrow().iter().any(|(id, _)| *id == map)
    }

    pub(crate) fn set<V: 'static>(&self, map: MapId, value: V) {
        let mut slots = self.slots.borrow_mut();

        if let Some((_, existing)) = slots.iter_mut().find(|(id, _)| *id == map) {
            *existing = Box::new(value);
        } else {
            slots.push((map, Box::new(value)));
        }
    }

    pub(crate) fn remove(&self, map: MapId) {
        self.slots.borrow_mut().retain(|(id, _)| *id != map);
    }
}
