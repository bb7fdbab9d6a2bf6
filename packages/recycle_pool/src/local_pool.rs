use std::cell::RefCell;
use std::rc::Rc;

use crate::{Entry, OwnerToken, Pool, PoolBuilder, Result};

/// A cloneable handle to a shared [`Pool`].
///
/// Multiple handles can exist simultaneously, all referring to the same pool. The pool stays
/// alive as long as at least one handle exists. All operations take `&self`.
///
/// # Reentrancy
///
/// Hooks must not call back into the same pool through a handle. The pool is borrowed for the
/// duration of every operation, so doing so panics.
///
/// # Single-threaded Design
///
/// This type is designed for single-threaded use and is neither [`Send`] nor [`Sync`].
///
/// # Example
///
/// ```rust
/// use recycle_pool::LocalPool;
///
/// let pool = LocalPool::<String>::new();
///
/// // Clone the pool handle for use in different parts of the code.
/// let pool_clone = pool.clone();
///
/// let entry = pool.reserve();
/// pool_clone.release(entry).unwrap();
///
/// assert_eq!(pool.available(), 1);
/// ```
#[derive(Debug)]
pub struct LocalPool<T> {
    /// The shared pool instance protected by a `RefCell` for single-threaded interior mutability.
    inner: Rc<RefCell<Pool<T>>>,
}

impl<T> From<Pool<T>> for LocalPool<T> {
    /// Wraps an existing pool so it can be shared.
    ///
    /// # Example
    ///
    /// ```rust
    /// use recycle_pool::{LocalPool, Pool};
    ///
    /// let pool = Pool::<Vec<u8>>::builder().initial_size(4).build();
    /// let shared = LocalPool::from(pool);
    ///
    /// assert_eq!(shared.available(), 4);
    /// ```
    fn from(pool: Pool<T>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(pool)),
        }
    }
}

impl<T: Default + 'static> LocalPool<T> {
    /// Creates a shared pool with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::from(Pool::new())
    }

    /// Starts building a pool. Turn the result into a shared pool with [`LocalPool::from()`].
    pub fn builder() -> PoolBuilder<T> {
        Pool::builder()
    }
}

impl<T> LocalPool<T> {
    /// See [`Pool::reserve()`].
    #[must_use]
    pub fn reserve(&self) -> Entry<T> {
        self.inner.borrow_mut().reserve()
    }

    /// See [`Pool::reserve_many()`].
    #[must_use]
    pub fn reserve_many(&self, count: usize) -> Vec<Entry<T>> {
        self.inner.borrow_mut().reserve_many(count)
    }

    /// See [`Pool::release()`].
    ///
    /// # Errors
    ///
    /// See [`Pool::release()`].
    pub fn release(&self, entry: Entry<T>) -> Result<()> {
        self.inner.borrow_mut().release(entry)
    }

    /// See [`Pool::release_many()`].
    ///
    /// # Errors
    ///
    /// See [`Pool::release_many()`].
    pub fn release_many<I>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = Entry<T>>,
    {
        self.inner.borrow_mut().release_many(entries)
    }

    /// See [`Pool::reset()`].
    pub fn reset(&self) {
        self.inner.borrow_mut().reset();
    }

    /// See [`Pool::available()`].
    #[must_use]
    pub fn available(&self) -> usize {
        self.inner.borrow().available()
    }

    /// See [`Pool::reserved()`].
    #[must_use]
    pub fn reserved(&self) -> usize {
        self.inner.borrow().reserved()
    }

    /// See [`Pool::size()`].
    #[must_use]
    pub fn size(&self) -> usize {
        self.inner.borrow().size()
    }

    /// See [`Pool::name()`].
    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.inner.borrow().name().map(str::to_owned)
    }

    /// See [`Pool::owner_token()`].
    #[must_use]
    pub fn owner_token(&self) -> OwnerToken {
        self.inner.borrow().owner_token()
    }

    /// See [`Pool::owns()`].
    #[must_use]
    pub fn owns(&self, entry: &Entry<T>) -> bool {
        self.inner.borrow().owns(entry)
    }

    /// See [`Pool::is_available()`].
    #[must_use]
    pub fn is_available(&self, entry: &Entry<T>) -> bool {
        self.inner.borrow().is_available(entry)
    }
}

impl<T> Clone for LocalPool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Default + 'static> Default for LocalPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_not_impl_any;

    use super::*;

    #[test]
    fn single_threaded_assertions() {
        // LocalPool should NOT be Send or Sync - it's single-threaded only
        assert_not_impl_any!(LocalPool<u32>: Send);
        assert_not_impl_any!(LocalPool<u32>: Sync);
    }

    #[test]
    fn clones_share_one_pool() {
        let pool = LocalPool::<u32>::new();
        let pool_clone = pool.clone();

        let entry = pool.reserve();

        assert_eq!(pool_clone.reserved(), 1);
        assert!(pool_clone.owns(&entry));
        assert_eq!(pool.owner_token(), pool_clone.owner_token());

        pool_clone.release(entry.clone()).unwrap();

        assert!(pool.is_available(&entry));
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn batch_operations() {
        let pool = LocalPool::from(Pool::<u32>::builder().initial_size(0).name("batch").build());

        let entries = pool.reserve_many(3);
        assert_eq!(pool.size(), 3);

        pool.release_many(entries).unwrap();
        assert_eq!(pool.available(), 3);

        pool.reset();
        assert_eq!(pool.available(), 0);
        assert_eq!(pool.name().as_deref(), Some("batch"));
    }

    #[test]
    fn foreign_entry_is_rejected() {
        let pool = LocalPool::<u32>::new();

        pool.release(Entry::new(0)).unwrap_err();
    }
}
