use thiserror::Error;

use crate::OwnerToken;

/// Errors that can occur when creating or using a pool.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PoolError {
    /// The pool configuration cannot be honored.
    #[error("invalid pool configuration: {problem}")]
    Config {
        /// A human-readable description of the problem.
        problem: String,
    },

    /// An entry was given to a pool that did not produce it, or that has been reset since.
    #[error("entry does not belong to pool {owner}{}", display_name(.name.as_deref()))]
    Ownership {
        /// The token of the pool that rejected the entry.
        owner: OwnerToken,

        /// The name of the pool that rejected the entry, if it has one.
        name: Option<String>,
    },

    /// An entry could not be released because its value is borrowed through some handle while
    /// the release hook needs to modify it.
    #[error("entry is borrowed elsewhere and cannot be released into pool {owner}{}", display_name(.name.as_deref()))]
    EntryInUse {
        /// The token of the pool that refused the entry.
        owner: OwnerToken,

        /// The name of the pool that refused the entry, if it has one.
        name: Option<String>,
    },
}

fn display_name(name: Option<&str>) -> String {
    name.map(|name| format!(" ('{name}')")).unwrap_or_default()
}

/// A specialized `Result` type for pool operations, returning the crate's
/// [`PoolError`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, PoolError>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(PoolError: Send, Sync, Debug);

    #[test]
    fn config_error_mentions_problem() {
        let error = PoolError::Config {
            problem: "no factory named 'widget'".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "invalid pool configuration: no factory named 'widget'"
        );
    }

    #[test]
    fn ownership_error_mentions_pool() {
        let anonymous = PoolError::Ownership {
            owner: OwnerToken::from_raw(1),
            name: None,
        };
        let named = PoolError::Ownership {
            owner: OwnerToken::from_raw(1),
            name: Some("vectors".to_string()),
        };

        assert_eq!(
            anonymous.to_string(),
            "entry does not belong to pool pool_0000000000000001"
        );
        assert_eq!(
            named.to_string(),
            "entry does not belong to pool pool_0000000000000001 ('vectors')"
        );
    }

    #[test]
    fn entry_in_use_error_mentions_pool() {
        let error = PoolError::EntryInUse {
            owner: OwnerToken::from_raw(2),
            name: Some("vectors".to_string()),
        };

        assert_eq!(
            error.to_string(),
            "entry is borrowed elsewhere and cannot be released into pool pool_0000000000000002 ('vectors')"
        );
    }
}
