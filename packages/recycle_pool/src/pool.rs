use std::any::type_name;
use std::fmt;
use std::iter;

use tracing::{debug, trace};

use crate::membership::{Membership, Stamp};
use crate::{
    Entry, MembershipStrategy, OwnerToken, PoolBuilder, PoolError, Result, Strictness, validation,
};

pub(crate) type Factory<T> = Box<dyn FnMut() -> T>;
pub(crate) type EntryHook<T> = Box<dyn FnMut(&mut T)>;
pub(crate) type ResetHook<T> = Box<dyn FnMut(&[Entry<T>])>;

/// An object pool that recycles entries instead of creating new ones for every use.
///
/// Entries move between two states: available (sitting in the pool's free list) and reserved
/// (handed out to a caller). [`reserve()`][1] takes the most recently released entry from the free
/// list, creating a new entry only when the free list is empty. [`release()`][2] returns an entry
/// to the free list.
///
/// The pool remembers every entry it created, which lets it refuse entries that came from
/// elsewhere. This bookkeeping never keeps an entry alive: an entry that nobody holds on to is
/// dropped even if the pool still remembers it.
///
/// # Hooks
///
/// * `on_reserve` runs on every entry handed out by [`reserve()`][1], whether it was reused or
///   newly created. It typically stamps the entry with the fields a caller expects.
/// * `on_release` runs on every entry that [`release()`][2] puts back on the free list. It
///   typically scrubs the entry back to a neutral state.
/// * `on_reset` runs once per [`reset()`][3], seeing the free list as it was before the reset.
///
/// Entries created to fill the pool at construction or reset do not pass through any hook.
/// Hooks run inline; if a hook panics, the panic propagates to the caller and whatever the pool
/// did before calling the hook stays done.
///
/// # Capacity
///
/// The optional maximum size limits only how many entries can sit in the free list. There is no
/// limit on how many entries can be reserved at the same time. An entry released into a full free
/// list is dropped by the pool.
///
/// # Example
///
/// ```rust
/// use recycle_pool::Pool;
///
/// let mut pool = Pool::<Vec<u8>>::builder()
///     .initial_size(2)
///     .on_release(|buffer: &mut Vec<u8>| buffer.clear())
///     .build();
///
/// let buffer = pool.reserve();
/// buffer.borrow_mut().extend_from_slice(b"hello");
///
/// assert_eq!(pool.available(), 1);
/// assert_eq!(pool.reserved(), 1);
///
/// pool.release(buffer).unwrap();
///
/// assert_eq!(pool.available(), 2);
/// assert!(pool.reserve().borrow().is_empty());
/// ```
///
/// # Thread safety
///
/// This type is single-threaded. It is neither [`Send`] nor [`Sync`]. Use [`LocalPool`][4] to
/// share one pool between several owners on the same thread.
///
/// [1]: Self::reserve
/// [2]: Self::release
/// [3]: Self::reset
/// [4]: crate::LocalPool
pub struct Pool<T> {
    name: Option<String>,

    owner: OwnerToken,

    /// Advanced on every reset. Entries registered in an earlier epoch no longer belong to us.
    epoch: u64,

    /// Entries created since construction or the last reset, whether available or reserved.
    generated: usize,

    /// Available entries. The most recently released entry is at the end.
    free: Vec<Entry<T>>,

    /// Already clamped to `max_size`.
    initial_size: usize,

    /// Limit on the length of `free`. `None` means unbounded.
    max_size: Option<usize>,

    create: Factory<T>,
    on_reserve: Option<EntryHook<T>>,
    on_release: Option<EntryHook<T>>,
    on_reset: Option<ResetHook<T>>,

    membership: Membership<T>,

    strictness: Strictness,
}

/// Everything a [`Pool`] is made of, as assembled by a builder.
pub(crate) struct PoolParts<T> {
    pub(crate) name: Option<String>,
    pub(crate) owner: OwnerToken,
    pub(crate) initial_size: usize,
    pub(crate) max_size: Option<usize>,
    pub(crate) create: Factory<T>,
    pub(crate) on_reserve: Option<EntryHook<T>>,
    pub(crate) on_release: Option<EntryHook<T>>,
    pub(crate) on_reset: Option<ResetHook<T>>,
    pub(crate) membership: MembershipStrategy,
    pub(crate) strictness: Strictness,
}

impl<T: Default + 'static> Pool<T> {
    /// Creates a pool with the default configuration.
    ///
    /// New entries are created with [`T::default()`][Default::default], one entry is created
    /// up front, the free list is unbounded and no hooks are set.
    ///
    /// # Example
    ///
    /// ```rust
    /// use recycle_pool::Pool;
    ///
    /// let pool = Pool::<String>::new();
    ///
    /// assert_eq!(pool.available(), 1);
    /// assert_eq!(pool.reserved(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building a pool whose entries are created with [`T::default()`][Default::default].
    ///
    /// # Example
    ///
    /// ```rust
    /// use recycle_pool::Pool;
    ///
    /// let pool = Pool::<String>::builder()
    ///     .name("strings")
    ///     .initial_size(4)
    ///     .max_size(16)
    ///     .build();
    ///
    /// assert_eq!(pool.name(), Some("strings"));
    /// assert_eq!(pool.available(), 4);
    /// ```
    pub fn builder() -> PoolBuilder<T> {
        PoolBuilder::new(Box::new(T::default))
    }
}

impl<T> Pool<T> {
    /// Starts building a pool whose entries are created by `create`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use recycle_pool::Pool;
    ///
    /// let pool = Pool::builder_with_factory(|| Vec::<u8>::with_capacity(1024)).build();
    ///
    /// assert!(pool.free_list()[0].borrow().capacity() >= 1024);
    /// ```
    pub fn builder_with_factory(create: impl FnMut() -> T + 'static) -> PoolBuilder<T> {
        PoolBuilder::new(Box::new(create))
    }

    #[must_use]
    pub(crate) fn new_inner(parts: PoolParts<T>) -> Self {
        let initial_size = parts
            .max_size
            .map_or(parts.initial_size, |max| parts.initial_size.min(max));

        let mut pool = Self {
            name: parts.name,
            owner: parts.owner,
            epoch: 0,
            generated: 0,
            free: Vec::with_capacity(initial_size),
            initial_size,
            max_size: parts.max_size,
            create: parts.create,
            on_reserve: parts.on_reserve,
            on_release: parts.on_release,
            on_reset: parts.on_reset,
            membership: Membership::new(parts.membership),
            strictness: parts.strictness,
        };

        pool.populate();

        debug!(
            pool = %pool.owner,
            name = pool.name.as_deref(),
            initial_size = pool.initial_size,
            max_size = pool.max_size,
            "pool created"
        );

        pool
    }

    /// Hands out an entry, reusing the most recently released one if there is any.
    ///
    /// A new entry is created if the free list is empty. Either way, the `on_reserve` hook runs
    /// on the entry before it is returned.
    ///
    /// # Example
    ///
    /// ```rust
    /// use recycle_pool::Pool;
    ///
    /// let mut pool = Pool::<String>::builder().initial_size(0).build();
    ///
    /// let first = pool.reserve();
    /// assert_eq!(pool.size(), 1);
    ///
    /// pool.release(first.clone()).unwrap();
    ///
    /// let second = pool.reserve();
    /// assert!(recycle_pool::Entry::ptr_eq(&first, &second));
    /// assert_eq!(pool.size(), 1);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the reused entry is currently borrowed by the caller and an `on_reserve` hook is
    /// set. Panics raised by the factory or the hook propagate.
    pub fn reserve(&mut self) -> Entry<T> {
        let entry = self.free.pop().unwrap_or_else(|| self.generate());

        if let Some(on_reserve) = self.on_reserve.as_mut() {
            on_reserve(&mut *entry.borrow_mut());
        }

        entry
    }

    /// Reserves `count` entries, one after another.
    ///
    /// If a hook panics midway, the entries reserved before the panic stay reserved.
    ///
    /// # Example
    ///
    /// ```rust
    /// use recycle_pool::Pool;
    ///
    /// let mut pool = Pool::<String>::builder().initial_size(0).build();
    ///
    /// let entries = pool.reserve_many(5);
    ///
    /// assert_eq!(entries.len(), 5);
    /// assert_eq!(pool.reserved(), 5);
    /// assert_eq!(pool.available(), 0);
    /// ```
    pub fn reserve_many(&mut self, count: usize) -> Vec<Entry<T>> {
        iter::repeat_with(|| self.reserve()).take(count).collect()
    }

    /// Returns an entry to the pool.
    ///
    /// * Releasing an entry that is already available does nothing.
    /// * Releasing into a full free list drops the entry. The pool does not reuse it.
    /// * Otherwise the `on_release` hook runs on the entry and the entry is put on the free list.
    ///
    /// # Errors
    ///
    /// If the entry was not produced by this pool, or was reserved before the last
    /// [`reset()`][Self::reset], a strict pool returns [`PoolError::Ownership`] and leaves the
    /// free list as it was. A lenient pool emits a warning and returns `Ok(())`.
    ///
    /// If an `on_release` hook is set and the entry's value is borrowed through some handle, the
    /// hook cannot run. A strict pool returns [`PoolError::EntryInUse`], a lenient pool emits a
    /// warning and returns `Ok(())`. Either way the entry stays out of the free list and the
    /// caller can release it again once the borrow ends.
    ///
    /// # Example
    ///
    /// ```rust
    /// use recycle_pool::{Entry, Pool, PoolError};
    ///
    /// let mut pool = Pool::<String>::new();
    ///
    /// let entry = pool.reserve();
    /// pool.release(entry).unwrap();
    ///
    /// let stranger = Entry::new(String::new());
    /// assert!(matches!(
    ///     pool.release(stranger),
    ///     Err(PoolError::Ownership { .. })
    /// ));
    /// ```
    ///
    /// # Panics
    ///
    /// Panics raised by the hook propagate.
    pub fn release(&mut self, entry: Entry<T>) -> Result<()> {
        if !self.owns(&entry) {
            return validation::escalate(
                self.strictness,
                PoolError::Ownership {
                    owner: self.owner,
                    name: self.name.clone(),
                },
            );
        }

        if self.is_available(&entry) {
            return Ok(());
        }

        if self.is_full() {
            trace!(pool = %self.owner, "free list is full, dropping released entry");
            return Ok(());
        }

        if let Some(on_release) = self.on_release.as_mut() {
            let Ok(mut value) = entry.try_borrow_mut() else {
                return validation::escalate(
                    self.strictness,
                    PoolError::EntryInUse {
                        owner: self.owner,
                        name: self.name.clone(),
                    },
                );
            };

            on_release(&mut *value);
        }

        self.free.push(entry);

        Ok(())
    }

    /// Releases each of the entries, in order.
    ///
    /// # Errors
    ///
    /// Stops at the first entry that [`release()`][Self::release] rejects and returns its error.
    /// The entries released before it stay released.
    pub fn release_many<I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = Entry<T>>,
    {
        for entry in entries {
            self.release(entry)?;
        }

        Ok(())
    }

    /// Returns the pool to the state it had right after construction.
    ///
    /// The `on_reset` hook runs first, seeing the current free list. The pool then forgets every
    /// available entry and creates `initial_size` fresh ones.
    ///
    /// Entries that are reserved at the time of the reset are not tracked by the free list and
    /// become orphaned: the pool no longer accepts them, so releasing one later is an ownership
    /// violation. Callers holding entries across a reset should drop them instead.
    ///
    /// # Example
    ///
    /// ```rust
    /// use recycle_pool::Pool;
    ///
    /// let mut pool = Pool::<String>::builder().initial_size(3).build();
    ///
    /// let orphan = pool.reserve();
    /// pool.reset();
    ///
    /// assert_eq!(pool.available(), 3);
    /// assert_eq!(pool.reserved(), 0);
    /// assert!(pool.release(orphan).is_err());
    /// ```
    ///
    /// # Panics
    ///
    /// Panics raised by the `on_reset` hook or the factory propagate.
    pub fn reset(&mut self) {
        if let Some(on_reset) = self.on_reset.as_mut() {
            on_reset(self.free.as_slice());
        }

        for entry in &self.free {
            self.membership.deregister(entry);
        }

        self.free.clear();
        self.generated = 0;
        self.epoch = self.epoch.wrapping_add(1);

        self.populate();

        debug!(pool = %self.owner, epoch = self.epoch, "pool reset");
    }

    /// The number of entries in the free list.
    #[must_use]
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// The number of entries created since construction or the last reset that are not in the
    /// free list.
    #[must_use]
    pub fn reserved(&self) -> usize {
        self.generated
            .checked_sub(self.free.len())
            .expect("the free list only holds entries generated in the current epoch")
    }

    /// The number of entries created since construction or the last reset.
    #[must_use]
    pub fn size(&self) -> usize {
        self.generated
    }

    /// The name given to the pool, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The token that identifies this pool.
    #[must_use]
    pub fn owner_token(&self) -> OwnerToken {
        self.owner
    }

    /// The number of entries created at construction and on every reset.
    ///
    /// This never exceeds [`max_size()`][Self::max_size].
    #[must_use]
    pub fn initial_size(&self) -> usize {
        self.initial_size
    }

    /// The maximum length of the free list. `None` means the free list is unbounded.
    #[must_use]
    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }

    /// How the pool reacts to contract violations.
    #[must_use]
    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    /// How the pool remembers which entries it produced.
    #[must_use]
    pub fn membership(&self) -> MembershipStrategy {
        self.membership.strategy()
    }

    /// The available entries. The entry that [`reserve()`][Self::reserve] hands out next is the
    /// last one.
    #[must_use]
    pub fn free_list(&self) -> &[Entry<T>] {
        &self.free
    }

    /// Whether the entry was produced by this pool since construction or the last reset.
    #[must_use]
    pub fn owns(&self, entry: &Entry<T>) -> bool {
        self.membership.stamp_of(entry) == Some(self.stamp())
    }

    /// Whether the entry is in the free list.
    #[must_use]
    pub fn is_available(&self, entry: &Entry<T>) -> bool {
        self.free.iter().any(|candidate| Entry::ptr_eq(candidate, entry))
    }

    fn is_full(&self) -> bool {
        self.max_size.is_some_and(|max| self.free.len() >= max)
    }

    fn stamp(&self) -> Stamp {
        Stamp {
            owner: self.owner,
            epoch: self.epoch,
        }
    }

    fn generate(&mut self) -> Entry<T> {
        let entry = Entry::new((self.create)());

        self.membership.register(&entry, self.stamp());

        self.generated = self
            .generated
            .checked_add(1)
            .expect("a pool cannot create more entries than fit in memory");

        entry
    }

    fn populate(&mut self) {
        for _ in 0..self.initial_size {
            let entry = self.generate();
            self.free.push(entry);
        }
    }
}

impl<T: Default + 'static> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("epoch", &self.epoch)
            .field("generated", &self.generated)
            .field("available", &self.free.len())
            .field("initial_size", &self.initial_size)
            .field("max_size", &self.max_size)
            .field("on_reserve", &self.on_reserve.is_some())
            .field("on_release", &self.on_release.is_some())
            .field("on_reset", &self.on_reset.is_some())
            .field("membership", &self.membership)
            .field("strictness", &self.strictness)
            .finish_non_exhaustive()
    }
}
