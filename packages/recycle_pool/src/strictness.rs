use serde::Deserialize;

/// Determines how a pool reacts when its contract is violated.
///
/// Affected are configuration problems that do not make the pool unusable (a hook that cannot
/// be resolved) and attempts to release an entry that the pool did not produce. A factory that
/// cannot be resolved is always an error, regardless of strictness.
///
/// The pool never decides this on its own. Callers that want the behavior to follow the build
/// profile can use [`Strictness::for_build_profile()`].
///
/// # Examples
///
/// ```
/// use recycle_pool::{Entry, Pool, Strictness};
///
/// let mut pool = Pool::<Vec<u8>>::builder()
///     .strictness(Strictness::Lenient)
///     .build();
///
/// // A lenient pool logs the violation and otherwise ignores the call.
/// pool.release(Entry::new(Vec::new())).unwrap();
/// ```
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Strictness {
    /// Contract violations are returned as errors. This is the default.
    #[default]
    Strict,

    /// Contract violations are reported as `tracing` warnings and the offending part of the
    /// operation is skipped.
    Lenient,
}

impl Strictness {
    /// Strict in builds with debug assertions enabled, lenient otherwise.
    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Depends on the build profile of the test run itself.
    pub fn for_build_profile() -> Self {
        if cfg!(debug_assertions) {
            Self::Strict
        } else {
            Self::Lenient
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn default_is_strict() {
        assert_eq!(Strictness::default(), Strictness::Strict);
    }

    #[test]
    #[cfg(debug_assertions)]
    fn debug_builds_are_strict() {
        assert_eq!(Strictness::for_build_profile(), Strictness::Strict);
    }
}
