use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Identifies one [`Pool`][crate::Pool] instance for its whole lifetime.
///
/// A pool registers every entry it creates under its owner token, which is how it later proves
/// that an entry given to [`Pool::release()`][crate::Pool::release] is one of its own.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct OwnerToken(u64);

impl OwnerToken {
    /// Creates a token from its raw representation.
    ///
    /// This is meant for custom [`TokenSource`] implementations.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw representation of the token.
    #[must_use]
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OwnerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool_{:016x}", self.0)
    }
}

/// Hands out the [`OwnerToken`] of each new pool.
///
/// Every token handed out by one source must be different from every other token it hands out,
/// and should be different from tokens handed out by any other source used in the same process.
pub trait TokenSource {
    /// Returns a token that has not been handed out before.
    fn next_token(&mut self) -> OwnerToken;
}

/// The default [`TokenSource`], producing tokens that are unique across the process with
/// overwhelming probability.
///
/// The upper half of a token is a sequence number offset by a time basis that is captured once
/// per process. The lower half is random. Two tokens can only collide if the sequence wraps
/// around and the random halves also coincide.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct RandomTokenSource;

/// Milliseconds since the epoch, modulo one billion, at first use.
static TIME_BASIS: LazyLock<u64> = LazyLock::new(|| {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u64::try_from(elapsed.as_millis() % 1_000_000_000)
                .expect("a value below one billion always fits in u64")
        })
});

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

impl RandomTokenSource {
    /// Creates a new token source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TokenSource for RandomTokenSource {
    fn next_token(&mut self) -> OwnerToken {
        // Relaxed is enough, we only need every sequence number to be handed out once.
        let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let high = TIME_BASIS.wrapping_add(sequence) & 0xFFFF_FFFF;
        let low = u64::from(rand::random::<u32>());

        OwnerToken((high << 32) | low)
    }
}

/// A [`TokenSource`] that hands out consecutive tokens, starting from a chosen value.
///
/// Useful in tests that need to know the token of a pool in advance.
///
/// # Example
///
/// ```rust
/// use recycle_pool::{OwnerToken, Pool, SequentialTokenSource};
///
/// let pool = Pool::<Vec<u8>>::builder()
///     .token_source(SequentialTokenSource::starting_at(100))
///     .build();
///
/// assert_eq!(pool.owner_token(), OwnerToken::from_raw(100));
/// ```
#[derive(Debug)]
pub struct SequentialTokenSource {
    next: u64,
}

impl SequentialTokenSource {
    /// Creates a source whose first token is `first`.
    #[must_use]
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }
}

impl Default for SequentialTokenSource {
    fn default() -> Self {
        Self::starting_at(0)
    }
}

impl TokenSource for SequentialTokenSource {
    fn next_token(&mut self) -> OwnerToken {
        let token = OwnerToken(self.next);

        self.next = self
            .next
            .checked_add(1)
            .expect("a sequential token source cannot hand out more than u64::MAX tokens");

        token
    }
}
