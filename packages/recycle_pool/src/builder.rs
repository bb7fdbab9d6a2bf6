use std::any::type_name;
use std::fmt;

use crate::pool::{EntryHook, Factory, PoolParts, ResetHook};
use crate::{Entry, MembershipStrategy, Pool, RandomTokenSource, Strictness, TokenSource};

/// Builder for creating an instance of [`Pool`].
///
/// You only need to use this builder if you want to customize the pool configuration.
/// The default configuration used by [`Pool::new()`][1] creates one entry up front, never limits
/// the free list and sets no hooks.
///
/// Obtain a builder from [`Pool::builder()`][2] (entries created with `T::default()`) or
/// [`Pool::builder_with_factory()`][3] (entries created by a closure).
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
///
/// use recycle_pool::{Pool, Strictness};
///
/// let mut pool = Pool::<HashMap<String, String>>::builder()
///     .name("records")
///     .initial_size(8)
///     .max_size(64)
///     .on_reserve(|record| {
///         record.insert("foo".to_string(), "bar".to_string());
///     })
///     .on_release(|record| record.clear())
///     .strictness(Strictness::Strict)
///     .build();
///
/// let record = pool.reserve();
/// assert_eq!(record.borrow()["foo"], "bar");
/// ```
///
/// [1]: Pool::new
/// [2]: Pool::builder
/// [3]: Pool::builder_with_factory
#[must_use]
pub struct PoolBuilder<T> {
    create: Factory<T>,
    initial_size: usize,
    max_size: Option<usize>,
    name: Option<String>,
    on_reserve: Option<EntryHook<T>>,
    on_release: Option<EntryHook<T>>,
    on_reset: Option<ResetHook<T>>,
    strictness: Strictness,
    membership: MembershipStrategy,
    token_source: Box<dyn TokenSource>,
}

impl<T> fmt::Debug for PoolBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolBuilder")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("initial_size", &self.initial_size)
            .field("max_size", &self.max_size)
            .field("name", &self.name)
            .field("on_reserve", &self.on_reserve.is_some())
            .field("on_release", &self.on_release.is_some())
            .field("on_reset", &self.on_reset.is_some())
            .field("strictness", &self.strictness)
            .field("membership", &self.membership)
            .finish_non_exhaustive()
    }
}

impl<T> PoolBuilder<T> {
    pub(crate) fn new(create: Factory<T>) -> Self {
        Self {
            create,
            initial_size: 1,
            max_size: None,
            name: None,
            on_reserve: None,
            on_release: None,
            on_reset: None,
            strictness: Strictness::default(),
            membership: MembershipStrategy::default(),
            token_source: Box::new(RandomTokenSource::new()),
        }
    }

    /// Sets the function that creates new entries, replacing the current one.
    pub fn create(mut self, create: impl FnMut() -> T + 'static) -> Self {
        self.create = Box::new(create);
        self
    }

    /// Sets how many entries are created at construction and on every reset. Defaults to 1.
    ///
    /// Values above the [maximum size][Self::max_size] are lowered to the maximum size.
    ///
    /// # Examples
    ///
    /// ```
    /// use recycle_pool::Pool;
    ///
    /// let pool = Pool::<u64>::builder().initial_size(5).max_size(2).build();
    ///
    /// assert_eq!(pool.available(), 2);
    /// ```
    pub fn initial_size(mut self, initial_size: usize) -> Self {
        self.initial_size = initial_size;
        self
    }

    /// Limits how many entries the free list can hold. By default the free list is unbounded.
    ///
    /// This does not limit how many entries can be reserved at the same time. Entries released
    /// while the free list is full are dropped.
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Sets a descriptive name for the pool. The name has no effect on pool behavior other than
    /// showing up in diagnostics.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the hook that runs on every entry handed out by [`Pool::reserve()`].
    pub fn on_reserve(mut self, hook: impl FnMut(&mut T) + 'static) -> Self {
        self.on_reserve = Some(Box::new(hook));
        self
    }

    /// Sets the hook that runs on every entry [`Pool::release()`] puts back on the free list.
    pub fn on_release(mut self, hook: impl FnMut(&mut T) + 'static) -> Self {
        self.on_release = Some(Box::new(hook));
        self
    }

    /// Sets the hook that runs at the start of every [`Pool::reset()`], receiving the free list
    /// as it is before the reset.
    ///
    /// The hook sees the free list itself rather than a copy. It can modify the entries but not
    /// the list.
    pub fn on_reset(mut self, hook: impl FnMut(&[Entry<T>]) + 'static) -> Self {
        self.on_reset = Some(Box::new(hook));
        self
    }

    /// Sets how the pool reacts to contract violations. Defaults to [`Strictness::Strict`].
    pub fn strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    /// Sets how the pool remembers which entries it produced. Defaults to
    /// [`MembershipStrategy::SideTable`].
    pub fn membership(mut self, membership: MembershipStrategy) -> Self {
        self.membership = membership;
        self
    }

    /// Sets where the pool gets its [owner token][crate::OwnerToken] from. Defaults to
    /// [`RandomTokenSource`].
    pub fn token_source(mut self, token_source: impl TokenSource + 'static) -> Self {
        self.token_source = Box::new(token_source);
        self
    }

    /// Builds the pool, creating the initial entries.
    ///
    /// # Panics
    ///
    /// Panics raised by the factory propagate.
    #[must_use]
    pub fn build(mut self) -> Pool<T> {
        let owner = self.token_source.next_token();

        Pool::new_inner(PoolParts {
            name: self.name,
            owner,
            initial_size: self.initial_size,
            max_size: self.max_size,
            create: self.create,
            on_reserve: self.on_reserve,
            on_release: self.on_release,
            on_reset: self.on_reset,
            membership: self.membership,
            strictness: self.strictness,
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::{OwnerToken, SequentialTokenSource};

    #[test]
    fn defaults() {
        let pool = Pool::<u32>::builder().build();

        assert_eq!(pool.initial_size(), 1);
        assert_eq!(pool.max_size(), None);
        assert_eq!(pool.name(), None);
        assert_eq!(pool.strictness(), Strictness::Strict);
        assert_eq!(pool.membership(), MembershipStrategy::SideTable);
    }

    #[test]
    fn custom_factory_replaces_default() {
        let counter = Rc::new(Cell::new(0_u32));

        let mut pool = Pool::<u32>::builder()
            .initial_size(0)
            .create({
                let counter = Rc::clone(&counter);
                move || {
                    counter.set(counter.get() + 1);
                    counter.get() * 10
                }
            })
            .build();

        assert_eq!(*pool.reserve().borrow(), 10);
        assert_eq!(*pool.reserve().borrow(), 20);
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn factory_for_type_without_default() {
        struct Connection {
            id: u32,
        }

        let pool = Pool::builder_with_factory(|| Connection { id: 7 })
            .initial_size(2)
            .build();

        assert_eq!(pool.available(), 2);
        assert_eq!(pool.free_list().first().unwrap().borrow().id, 7);
    }

    #[test]
    fn token_source_is_used() {
        let first = Pool::<u32>::builder()
            .token_source(SequentialTokenSource::starting_at(40))
            .build();

        assert_eq!(first.owner_token(), OwnerToken::from_raw(40));
    }

    #[test]
    fn pools_get_distinct_tokens_by_default() {
        let a = Pool::<u32>::new();
        let b = Pool::<u32>::new();

        assert_ne!(a.owner_token(), b.owner_token());
    }

    #[test]
    fn debug_lists_configuration() {
        let builder = Pool::<u32>::builder().name("numbers").max_size(3);

        let rendered = format!("{builder:?}");

        assert!(rendered.contains("u32"));
        assert!(rendered.contains("numbers"));
        assert!(rendered.contains("Some(3)"));
    }
}
