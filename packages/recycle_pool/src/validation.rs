//! Reporting of contract violations according to the strictness of a pool.

use crate::{PoolError, Result, Strictness};

/// Surfaces a contract violation.
///
/// In strict mode the violation is returned as an error. In lenient mode it is emitted as a
/// `tracing` warning and `Ok(())` is returned, so the caller can skip the offending step and carry
/// on.
pub(crate) fn escalate(strictness: Strictness, error: PoolError) -> Result<()> {
    match strictness {
        Strictness::Strict => Err(error),
        Strictness::Lenient => {
            tracing::warn!(%error, "pool contract violated");
            Ok(())
        }
    }
}

/// Builds the error for a callback name that does not resolve to a callable of the right kind.
pub(crate) fn unresolved_callback(option: &str, kind: &str, name: &str) -> PoolError {
    PoolError::Config {
        problem: format!("{option} refers to '{name}', which is not a registered {kind}"),
    }
}
