#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! This package provides [`Pool`], a single-threaded object pool that recycles entries instead of
//! creating new ones for every use, reducing allocation pressure in code that repeatedly needs
//! short-lived mutable objects.
//!
//! # Features
//!
//! - **LIFO reuse**: the most recently released entry is handed out first, favoring entries that
//!   are still warm in cache.
//! - **Ownership checks**: a pool refuses entries it did not produce, or that it has forgotten
//!   about since a reset.
//! - **No retention**: the bookkeeping behind ownership checks never keeps an entry alive.
//! - **Lifecycle hooks**: stamp entries on reserve, scrub them on release, inspect the free list
//!   on reset.
//! - **Bounded idle inventory**: an optional limit on how many entries wait in the free list.
//! - **Configurable strictness**: contract violations either fail or are logged via `tracing`.
//! - **Declarative configuration**: [`PoolConfig`] can be deserialized and refers to callbacks
//!   by name.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! use recycle_pool::Pool;
//!
//! let mut pool = Pool::<HashMap<String, String>>::builder()
//!     .on_reserve(|record| {
//!         record.insert("foo".to_string(), "bar".to_string());
//!     })
//!     .on_release(|record| record.clear())
//!     .build();
//!
//! let record = pool.reserve();
//! assert_eq!(record.borrow().len(), 1);
//!
//! pool.release(record.clone()).unwrap();
//! assert!(record.borrow().is_empty());
//!
//! // The same entry comes back, stamped again by the reserve hook.
//! let again = pool.reserve();
//! assert!(recycle_pool::Entry::ptr_eq(&record, &again));
//! assert_eq!(again.borrow()["foo"], "bar");
//! ```
//!
//! # Membership strategies
//!
//! How a pool remembers its entries is selected by [`MembershipStrategy`]. The underlying maps
//! are also usable on their own through the [`EphemeralMap`] trait: [`SideTableMap`] and
//! [`EmbeddedSlotMap`].

mod builder;
mod config;
mod embedded_slots;
mod entry;
mod ephemeral_map;
mod error;
mod local_pool;
mod membership;
mod owner_token;
mod pool;
mod side_table;
mod strictness;
mod validation;

pub use builder::*;
pub use config::*;
pub use embedded_slots::EmbeddedSlotMap;
pub(crate) use embedded_slots::MapId;
pub use entry::{Entry, WeakEntry};
pub(crate) use entry::EntryCell;
pub use ephemeral_map::*;
pub use error::PoolError;
pub(crate) use error::Result;
pub use local_pool::*;
pub use membership::MembershipStrategy;
pub use owner_token::*;
pub use pool::Pool;
pub use side_table::*;
pub use strictness::*;
