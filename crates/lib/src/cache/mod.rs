//! Cache layer.
//!
//! [`CacheBackend`] is the small set of key/value, hash and scan primitives
//! the engine needs from a network cache. Two implementations ship:
//! [`InMemoryCache`] for tests and single-process tooling, and `RedisCache`
//! (feature `redis`) for production.
//!
//! The typed caches built on top, [`VerificationCodeCache`] and
//! [`CounterCache`], bound every call with a timeout and route every
//! [`CacheFault`] through [`policy::recover`], so callers only ever see
//! [`CacheError`].

use std::time::Duration;

use async_trait::async_trait;

pub mod counters;
pub mod errors;
pub mod in_memory;
pub mod policy;
#[cfg(feature = "redis")]
pub mod redis;
pub mod verification;

pub use counters::CounterCache;
pub use errors::{CacheError, CacheFault, FaultKind};
pub use in_memory::InMemoryCache;
#[cfg(feature = "redis")]
pub use self::redis::RedisCache;
pub use verification::VerificationCodeCache;

/// Result of a raw backend primitive.
pub type FaultResult<T> = std::result::Result<T, CacheFault>;

/// Primitive operations of a TTL-aware key/value and hash store.
///
/// Hash values are 64-bit signed integers. Implementations must classify
/// every failure into a [`CacheFault`] and never panic on transport errors.
#[async_trait]
pub trait CacheBackend: Send + Sync + std::fmt::Debug {
    /// Whether `key` exists and has not expired.
    async fn exists(&self, key: &str) -> FaultResult<bool>;

    /// String value at `key`, if any.
    async fn get(&self, key: &str) -> FaultResult<Option<String>>;

    /// Set a string value that expires after `ttl`.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> FaultResult<()>;

    /// Remove `key`. Returns whether a live key was actually removed.
    async fn delete(&self, key: &str) -> FaultResult<bool>;

    /// Write every `(field, value)` pair into the hash at `key`, creating it if needed.
    async fn hash_put_all(&self, key: &str, entries: &[(String, i64)]) -> FaultResult<()>;

    /// All fields of the hash at `key`. Empty when the key is absent.
    async fn hash_get_all(&self, key: &str) -> FaultResult<Vec<(String, i64)>>;

    /// Whether `field` exists in the hash at `key`.
    async fn hash_field_exists(&self, key: &str, field: &str) -> FaultResult<bool>;

    /// Atomically add `delta` to `field` and return the new value.
    async fn hash_increment(&self, key: &str, field: &str, delta: i64) -> FaultResult<i64>;

    /// Overwrite `field` with `value`.
    async fn hash_set(&self, key: &str, field: &str, value: i64) -> FaultResult<()>;

    /// Field names of the hash at `key`.
    async fn hash_fields(&self, key: &str) -> FaultResult<Vec<String>>;

    /// Every live key matching a glob `pattern` (`*` and `?`).
    async fn scan(&self, pattern: &str) -> FaultResult<Vec<String>>;

    /// Round-trip check.
    async fn ping(&self) -> FaultResult<()>;
}

