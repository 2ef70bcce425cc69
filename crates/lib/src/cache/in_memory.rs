//! In-memory cache backend
//!
//! This module provides an in-memory implementation of [`CacheBackend`],
//! suitable for testing, development and single-process tooling where no
//! network cache is available.
//!
//! Expiry is lazy: an entry past its deadline is treated as absent on every
//! read and dropped on the next write that touches it. Deadlines come from an
//! injected [`Clock`], so tests can cross a TTL without sleeping.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::{CacheBackend, CacheFault, FaultResult};
use crate::clock::{Clock, SystemClock};

#[derive(Debug, Clone)]
enum Slot {
    Text(String),
    Hash(HashMap<String, i64>),
}

#[derive(Debug, Clone)]
struct Stored {
    slot: Slot,
    /// Absolute expiry in clock millis. `None` never expires.
    expires_at: Option<u64>,
}

impl Stored {
    fn is_live(&self, now: u64) -> bool {
        self.expires_at.is_none_or(|deadline| now < deadline)
    }
}

fn wrong_type(key: &str) -> CacheFault {
    CacheFault::serialization(format!(
        "WRONGTYPE operation against key {key} holding the wrong kind of value"
    ))
}

/// A [`CacheBackend`] keeping every key in a process-local map.
#[derive(Debug)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, Stored>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryCache {
    /// Creates an empty cache driven by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty cache whose TTLs are measured against `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of live keys.
    pub async fn len(&self) -> usize {
        let now = self.clock.now_millis();
        self.entries
            .read()
            .await
            .values()
            .filter(|stored| stored.is_live(now))
            .count()
    }

    /// Whether no live keys remain.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Run `f` against the live hash at `key`, creating an empty one if `create` is set.
    async fn with_hash<T>(
        &self,
        key: &str,
        create: bool,
        f: impl FnOnce(Option<&mut HashMap<String, i64>>) -> FaultResult<T>,
    ) -> FaultResult<T> {
        let now = self.clock.now_millis();
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|stored| !stored.is_live(now)) {
            entries.remove(key);
        }
        if create && !entries.contains_key(key) {
            entries.insert(
                key.to_string(),
                Stored {
                    slot: Slot::Hash(HashMap::new()),
                    expires_at: None,
                },
            );
        }
        match entries.get_mut(key) {
            Some(Stored {
                slot: Slot::Hash(hash),
                ..
            }) => f(Some(hash)),
            Some(_) => Err(wrong_type(key)),
            None => f(None),
        }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Glob match supporting `*` (any run) and `?` (any single char).
pub(crate) fn glob_matches(pattern: &str, candidate: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let candidate: Vec<char> = candidate.chars().collect();
    let (mut p, mut c) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while c < candidate.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, c));
                p += 1;
            }
            Some(&ch) if ch == '?' || ch == candidate[c] => {
                p += 1;
                c += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    c = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&ch| ch == '*')
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn exists(&self, key: &str) -> FaultResult<bool> {
        let now = self.clock.now_millis();
        Ok(self
            .entries
            .read()
            .await
            .get(key)
            .is_some_and(|stored| stored.is_live(now)))
    }

    async fn get(&self, key: &str) -> FaultResult<Option<String>> {
        let now = self.clock.now_millis();
        match self.entries.read().await.get(key) {
            Some(stored) if stored.is_live(now) => match &stored.slot {
                Slot::Text(value) => Ok(Some(value.clone())),
                Slot::Hash(_) => Err(wrong_type(key)),
            },
            _ => Ok(None),
        }
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> FaultResult<()> {
        let ttl_millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let expires_at = Some(self.clock.deadline_after(ttl_millis));
        self.entries.write().await.insert(
            key.to_string(),
            Stored {
                slot: Slot::Text(value.to_string()),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> FaultResult<bool> {
        let now = self.clock.now_millis();
        Ok(self
            .entries
            .write()
            .await
            .remove(key)
            .is_some_and(|stored| stored.is_live(now)))
    }

    async fn hash_put_all(&self, key: &str, entries: &[(String, i64)]) -> FaultResult<()> {
        self.with_hash(key, !entries.is_empty(), |hash| {
            if let Some(hash) = hash {
                hash.extend(entries.iter().cloned());
            }
            Ok(())
        })
        .await
    }

    async fn hash_get_all(&self, key: &str) -> FaultResult<Vec<(String, i64)>> {
        self.with_hash(key, false, |hash| {
            Ok(hash
                .map(|hash| hash.iter().map(|(f, v)| (f.clone(), *v)).collect())
                .unwrap_or_default())
        })
        .await
    }

    async fn hash_field_exists(&self, key: &str, field: &str) -> FaultResult<bool> {
        self.with_hash(key, false, |hash| {
            Ok(hash.is_some_and(|hash| hash.contains_key(field)))
        })
        .await
    }

    async fn hash_increment(&self, key: &str, field: &str, delta: i64) -> FaultResult<i64> {
        self.with_hash(key, true, |hash| {
            let Some(hash) = hash else {
                return Err(wrong_type(key));
            };
            let value = hash.entry(field.to_string()).or_insert(0);
            *value = value
                .checked_add(delta)
                .ok_or_else(|| CacheFault::other("increment or decrement would overflow"))?;
            Ok(*value)
        })
        .await
    }

    async fn hash_set(&self, key: &str, field: &str, value: i64) -> FaultResult<()> {
        self.with_hash(key, true, |hash| {
            if let Some(hash) = hash {
                hash.insert(field.to_string(), value);
            }
            Ok(())
        })
        .await
    }

    async fn hash_fields(&self, key: &str) -> FaultResult<Vec<String>> {
        self.with_hash(key, false, |hash| {
            Ok(hash
                .map(|hash| hash.keys().cloned().collect())
                .unwrap_or_default())
        })
        .await
    }

    async fn scan(&self, pattern: &str) -> FaultResult<Vec<String>> {
        let now = self.clock.now_millis();
        let mut keys: Vec<String> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|(key, stored)| stored.is_live(now) && glob_matches(pattern, key))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn ping(&self) -> FaultResult<()> {
        Ok(())
    }
}
