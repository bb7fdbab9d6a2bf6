use std::any::type_name;
use std::fmt;
use std::rc::Rc;

use foldhash::{HashMap, HashMapExt};
use serde::Deserialize;

use crate::{Entry, MembershipStrategy, Pool, Result, Strictness, validation};

/// A declarative pool configuration, turned into a pool by [`create_pool()`].
///
/// Unlike [`PoolBuilder`][crate::PoolBuilder], which takes closures, this configuration refers
/// to the factory and hooks by name. The names are looked up in a [`CallbackRegistry`] when the
/// pool is created. This makes the configuration plain data that can be deserialized, for
/// example from a TOML file.
///
/// Every field is optional when deserializing.
///
/// # Examples
///
/// ```
/// use recycle_pool::{CallbackRegistry, PoolConfig, create_pool};
///
/// let mut config = PoolConfig::default();
/// config.name = Some("buffers".to_string());
/// config.initial_size = 4;
/// config.on_release = Some("clear".to_string());
///
/// let mut callbacks = CallbackRegistry::<Vec<u8>>::new();
/// callbacks.register_entry_hook("clear", Vec::clear);
///
/// let pool = create_pool(&config, &callbacks).unwrap();
/// assert_eq!(pool.available(), 4);
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
#[non_exhaustive]
pub struct PoolConfig {
    /// Descriptive name of the pool.
    pub name: Option<String>,

    /// How many entries are created at construction and on every reset. Defaults to 1.
    pub initial_size: usize,

    /// Limit on the length of the free list. `None` (the default) means unbounded.
    pub max_size: Option<usize>,

    /// Name of the registered factory that creates entries. `None` means `T::default()`.
    pub create: Option<String>,

    /// Name of the registered entry hook to run on reserve.
    pub on_reserve: Option<String>,

    /// Name of the registered entry hook to run on release.
    pub on_release: Option<String>,

    /// Name of the registered reset hook to run on reset.
    pub on_reset: Option<String>,

    /// How the pool reacts to contract violations, including hooks that cannot be resolved.
    pub strictness: Strictness,

    /// How the pool remembers which entries it produced.
    pub membership: MembershipStrategy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: None,
            initial_size: 1,
            max_size: None,
            create: None,
            on_reserve: None,
            on_release: None,
            on_reset: None,
            strictness: Strictness::default(),
            membership: MembershipStrategy::default(),
        }
    }
}

type SharedFactory<T> = Rc<dyn Fn() -> T>;
type SharedEntryHook<T> = Rc<dyn Fn(&mut T)>;
type SharedResetHook<T> = Rc<dyn Fn(&[Entry<T>])>;

/// Named factories and hooks that a [`PoolConfig`] can refer to.
///
/// One registry can serve any number of pools; the registered functions are shared between
/// them.
pub struct CallbackRegistry<T> {
    factories: HashMap<String, SharedFactory<T>>,
    entry_hooks: HashMap<String, SharedEntryHook<T>>,
    reset_hooks: HashMap<String, SharedResetHook<T>>,
}

impl<T> CallbackRegistry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            entry_hooks: HashMap::new(),
            reset_hooks: HashMap::new(),
        }
    }

    /// Registers a factory usable as [`PoolConfig::create`], replacing any factory of the same
    /// name.
    pub fn register_factory(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn() -> T + 'static,
    ) -> &mut Self {
        self.factories.insert(name.into(), Rc::new(factory));
        self
    }

    /// Registers a hook usable as [`PoolConfig::on_reserve`] or [`PoolConfig::on_release`],
    /// replacing any entry hook of the same name.
    pub fn register_entry_hook(
        &mut self,
        name: impl Into<String>,
        hook: impl Fn(&mut T) + 'static,
    ) -> &mut Self {
        self.entry_hooks.insert(name.into(), Rc::new(hook));
        self
    }

    /// Registers a hook usable as [`PoolConfig::on_reset`], replacing any reset hook of the same
    /// name.
    pub fn register_reset_hook(
        &mut self,
        name: impl Into<String>,
        hook: impl Fn(&[Entry<T>]) + 'static,
    ) -> &mut Self {
        self.reset_hooks.insert(name.into(), Rc::new(hook));
        self
    }
}

impl<T> Default for CallbackRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for CallbackRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut factories = self.factories.keys().collect::<Vec<_>>();
        let mut entry_hooks = self.entry_hooks.keys().collect::<Vec<_>>();
        let mut reset_hooks = self.reset_hooks.keys().collect::<Vec<_>>();

        factories.sort();
        entry_hooks.sort();
        reset_hooks.sort();

        f.debug_struct(type_name::<Self>())
            .field("factories", &factories)
            .field("entry_hooks", &entry_hooks)
            .field("reset_hooks", &reset_hooks)
            .finish()
    }
}

/// Creates a pool from a declarative configuration, resolving callback names in `callbacks`.
///
/// Entries are created with `T::default()` unless `config.create` names a registered factory.
/// For types without a [`Default`] implementation, use [`create_pool_with_factory()`].
///
/// # Errors
///
/// Returns [`PoolError::Config`][crate::PoolError::Config] if `config.create` names no
/// registered factory.
///
/// If `on_reserve`, `on_release` or `on_reset` names no registered hook of the right kind, a
/// strict configuration returns [`PoolError::Config`][crate::PoolError::Config]. A lenient
/// configuration emits a warning and leaves that hook unset.
///
/// # Examples
///
/// ```
/// use recycle_pool::{CallbackRegistry, PoolConfig, PoolError, Strictness, create_pool};
///
/// let callbacks = CallbackRegistry::<String>::new();
///
/// let mut config = PoolConfig::default();
/// config.on_reserve = Some("missing".to_string());
///
/// assert!(matches!(
///     create_pool(&config, &callbacks),
///     Err(PoolError::Config { .. })
/// ));
///
/// config.strictness = Strictness::Lenient;
/// assert!(create_pool(&config, &callbacks).is_ok());
/// ```
pub fn create_pool<T>(config: &PoolConfig, callbacks: &CallbackRegistry<T>) -> Result<Pool<T>>
where
    T: Default + 'static,
{
    create_pool_with_factory(config, callbacks, T::default)
}

/// Creates a pool from a declarative configuration, resolving callback names in `callbacks`.
///
/// Entries are created by `create` unless `config.create` names a registered factory, which then
/// takes precedence. Unlike [`create_pool()`], this works for types without a [`Default`]
/// implementation.
///
/// # Errors
///
/// Same as [`create_pool()`].
///
/// # Examples
///
/// ```
/// use recycle_pool::{CallbackRegistry, PoolConfig, create_pool_with_factory};
///
/// struct Connection {
///     port: u16,
/// }
///
/// let mut callbacks = CallbackRegistry::<Connection>::new();
/// callbacks.register_factory("admin", || Connection { port: 9000 });
///
/// let mut config = PoolConfig::default();
/// config.create = Some("admin".to_string());
///
/// let pool = create_pool_with_factory(&config, &callbacks, || Connection { port: 80 }).unwrap();
/// assert_eq!(pool.free_list()[0].borrow().port, 9000);
/// ```
pub fn create_pool_with_factory<T>(
    config: &PoolConfig,
    callbacks: &CallbackRegistry<T>,
    create: impl FnMut() -> T + 'static,
) -> Result<Pool<T>>
where
    T: 'static,
{
    let builder = match &config.create {
        Some(name) => {
            let factory = callbacks
                .factories
                .get(name)
                .map(Rc::clone)
                .ok_or_else(|| validation::unresolved_callback("create", "factory", name))?;

            Pool::builder_with_factory(move || factory())
        }
        None => Pool::builder_with_factory(create),
    };

    let mut builder = builder
        .initial_size(config.initial_size)
        .strictness(config.strictness)
        .membership(config.membership);

    if let Some(name) = &config.name {
        builder = builder.name(name.clone());
    }

    if let Some(max_size) = config.max_size {
        builder = builder.max_size(max_size);
    }

    if let Some(hook) = resolve(
        config.strictness,
        "on_reserve",
        "entry hook",
        config.on_reserve.as_deref(),
        &callbacks.entry_hooks,
    )? {
        builder = builder.on_reserve(move |entry| hook(entry));
    }

    if let Some(hook) = resolve(
        config.strictness,
        "on_release",
        "entry hook",
        config.on_release.as_deref(),
        &callbacks.entry_hooks,
    )? {
        builder = builder.on_release(move |entry| hook(entry));
    }

    if let Some(hook) = resolve(
        config.strictness,
        "on_reset",
        "reset hook",
        config.on_reset.as_deref(),
        &callbacks.reset_hooks,
    )? {
        builder = builder.on_reset(move |free| hook(free));
    }

    Ok(builder.build())
}

/// Looks up an optional hook by name. A name that cannot be resolved is escalated according to
/// `strictness` and, if that does not fail, treated as if no hook had been named.
fn resolve<F: ?Sized>(
    strictness: Strictness,
    option: &str,
    kind: &str,
    name: Option<&str>,
    registry: &HashMap<String, Rc<F>>,
) -> Result<Option<Rc<F>>> {
    let Some(name) = name else {
        return Ok(None);
    };

    if let Some(hook) = registry.get(name) {
        return Ok(Some(Rc::clone(hook)));
    }

    validation::escalate(
        strictness,
        validation::unresolved_callback(option, kind, name),
    )?;

    Ok(None)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::PoolError;

    fn registry() -> CallbackRegistry<Vec<u32>> {
        let mut callbacks = CallbackRegistry::new();

        callbacks
            .register_factory("primed", || vec![1, 2, 3])
            .register_entry_hook("stamp", |entry: &mut Vec<u32>| entry.push(42))
            .register_entry_hook("scrub", Vec::clear)
            .register_reset_hook("ignore", |_: &[Entry<Vec<u32>>]| {});

        callbacks
    }

    #[test]
    fn default_config_matches_default_pool() {
        let pool = create_pool(&PoolConfig::default(), &CallbackRegistry::<u32>::new()).unwrap();

        assert_eq!(pool.available(), 1);
        assert_eq!(pool.max_size(), None);
        assert_eq!(pool.name(), None);
        assert_eq!(pool.strictness(), Strictness::Strict);
    }

    #[test]
    fn resolves_all_callbacks() {
        let mut config = PoolConfig::default();
        config.name = Some("numbers".to_string());
        config.initial_size = 0;
        config.max_size = Some(4);
        config.create = Some("primed".to_string());
        config.on_reserve = Some("stamp".to_string());
        config.on_release = Some("scrub".to_string());
        config.on_reset = Some("ignore".to_string());

        let mut pool = create_pool(&config, &registry()).unwrap();

        assert_eq!(pool.name(), Some("numbers"));
        assert_eq!(pool.max_size(), Some(4));

        let entry = pool.reserve();
        assert_eq!(*entry.borrow(), vec![1, 2, 3, 42]);

        pool.release(entry.clone()).unwrap();
        assert!(entry.borrow().is_empty());

        pool.reset();
    }

    #[test]
    fn unknown_factory_is_fatal_even_when_lenient() {
        let mut config = PoolConfig::default();
        config.create = Some("missing".to_string());
        config.strictness = Strictness::Lenient;

        let error = create_pool(&config, &registry()).unwrap_err();

        assert!(matches!(error, PoolError::Config { problem } if problem.contains("missing")));
    }

    #[test]
    fn unknown_hook_is_fatal_when_strict() {
        for option in ["on_reserve", "on_release", "on_reset"] {
            let mut config = PoolConfig::default();
            let name = Some("missing".to_string());

            match option {
                "on_reserve" => config.on_reserve = name,
                "on_release" => config.on_release = name,
                _ => config.on_reset = name,
            }

            let error = create_pool(&config, &registry()).unwrap_err();

            assert!(
                matches!(&error, PoolError::Config { problem } if problem.starts_with(option)),
                "{error}"
            );
        }
    }

    #[test]
    fn unknown_hook_is_dropped_when_lenient() {
        let mut config = PoolConfig::default();
        config.on_reserve = Some("missing".to_string());
        config.on_release = Some("scrub".to_string());
        config.strictness = Strictness::Lenient;

        let mut pool = create_pool(&config, &registry()).unwrap();

        let entry = pool.reserve();
        entry.borrow_mut().push(5);

        // The unresolved on_reserve hook is unset, the resolved on_release hook works.
        pool.release(entry.clone()).unwrap();
        assert!(entry.borrow().is_empty());
    }

    #[test]
    fn hook_of_wrong_kind_does_not_resolve() {
        let mut config = PoolConfig::default();
        config.on_reset = Some("scrub".to_string());

        create_pool(&config, &registry()).unwrap_err();
    }

    #[test]
    fn shared_registry_serves_many_pools() {
        let calls = Rc::new(Cell::new(0));

        let mut callbacks = CallbackRegistry::<u32>::new();
        callbacks.register_entry_hook("count", {
            let calls = Rc::clone(&calls);
            move |_: &mut u32| calls.set(calls.get() + 1)
        });

        let mut config = PoolConfig::default();
        config.on_reserve = Some("count".to_string());

        let mut first = create_pool(&config, &callbacks).unwrap();
        let mut second = create_pool(&config, &callbacks).unwrap();

        _ = first.reserve();
        _ = second.reserve();

        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn type_without_default_uses_fallback_factory() {
        struct Connection {
            port: u16,
        }

        let callbacks = CallbackRegistry::<Connection>::new();

        let mut config = PoolConfig::default();
        config.initial_size = 2;

        let pool =
            create_pool_with_factory(&config, &callbacks, || Connection { port: 80 }).unwrap();

        assert_eq!(pool.available(), 2);
        assert!(pool.free_list().iter().all(|entry| entry.borrow().port == 80));
    }

    #[test]
    fn registered_factory_overrides_fallback_factory() {
        struct Connection {
            port: u16,
        }

        let mut callbacks = CallbackRegistry::<Connection>::new();
        callbacks.register_factory("admin", || Connection { port: 9000 });

        let mut config = PoolConfig::default();
        config.initial_size = 0;
        config.create = Some("admin".to_string());

        let mut pool =
            create_pool_with_factory(&config, &callbacks, || Connection { port: 80 }).unwrap();

        assert_eq!(pool.reserve().borrow().port, 9000);

        config.create = Some("missing".to_string());
        let result = create_pool_with_factory(&config, &callbacks, || Connection { port: 80 });
        assert!(matches!(result, Err(PoolError::Config { .. })));
    }

    #[test]
    fn debug_lists_names() {
        let rendered = format!("{:?}", registry());

        assert!(rendered.contains("primed"));
        assert!(rendered.contains("scrub"));
        assert!(rendered.contains("ignore"));
    }
}
