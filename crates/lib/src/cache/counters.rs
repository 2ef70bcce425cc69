//! Per-user correct-answer counters held in a cache hash.
//!
//! One hash per user, field = question id as a decimal string, value = count.
//! Reads re-key fields numerically, so question 10 sorts after question 2.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use crate::Result;
use crate::cache::policy::{guarded, recover};
use crate::cache::{CacheBackend, CacheError, CacheFault};
use crate::keys::KeySpace;

/// Question id to correct-answer count, ordered numerically.
pub type CounterMap = BTreeMap<u64, i64>;

/// Hash-shaped cache of a user's counters during a session.
#[derive(Debug, Clone)]
pub struct CounterCache {
    backend: Arc<dyn CacheBackend>,
    keys: KeySpace,
    timeout: Duration,
}

impl CounterCache {
    pub fn new(backend: Arc<dyn CacheBackend>, keys: KeySpace, timeout: Duration) -> Self {
        Self {
            backend,
            keys,
            timeout,
        }
    }

    /// Overwrite the user's hash with `counters`.
    pub async fn bulk_load(&self, username: &str, counters: &CounterMap) -> Result<()> {
        if counters.is_empty() {
            return Err(CacheError::InvalidArgument {
                reason: format!("no counters to load for {username}"),
            }
            .into());
        }
        let key = self.keys.correct_times(username)?;
        let entries: Vec<(String, i64)> = counters
            .iter()
            .map(|(id, count)| (id.to_string(), *count))
            .collect();

        guarded(
            "bulk_load_counters",
            self.timeout,
            None,
            self.backend.hash_put_all(&key, &entries),
        )
        .await?;
        tracing::debug!(username, fields = entries.len(), "Counters loaded into cache");
        Ok(())
    }

    /// Every counter of the user, ordered by numeric question id.
    pub async fn bulk_read(&self, username: &str) -> Result<CounterMap> {
        let key = self.keys.correct_times(username)?;
        let raw = guarded(
            "bulk_read_counters",
            self.timeout,
            None,
            self.backend.hash_get_all(&key),
        )
        .await?;
        if raw.is_empty() {
            return Err(CacheError::NotFound { key }.into());
        }

        let mut counters = CounterMap::new();
        for (field, count) in raw {
            let Ok(id) = field.parse::<u64>() else {
                return recover(
                    "bulk_read_counters",
                    CacheFault::serialization(format!(
                        "field {field:?} of {key} is not a question id"
                    )),
                    None,
                );
            };
            counters.insert(id, count);
        }
        Ok(counters)
    }

    /// Add one to an existing counter and return the new count.
    ///
    /// The field check and the write are separate round-trips. An eviction
    /// landing between them leaves a one-field hash behind; callers keep to one
    /// session per user, so login and logout never overlap an increment.
    pub async fn increment(&self, username: &str, question_id: u64) -> Result<i64> {
        let (key, field) = self.existing_field(username, question_id).await?;
        guarded(
            "increment_counter",
            self.timeout,
            None,
            self.backend.hash_increment(&key, &field, 1),
        )
        .await
    }

    /// Overwrite an existing counter with `value` and return it.
    ///
    /// Same check-then-write window as [`CounterCache::increment`].
    pub async fn set(&self, username: &str, question_id: u64, value: i64) -> Result<i64> {
        if value < 0 {
            return Err(CacheError::InvalidArgument {
                reason: format!("counter for question {question_id} cannot be negative ({value})"),
            }
            .into());
        }
        let (key, field) = self.existing_field(username, question_id).await?;
        guarded(
            "set_counter",
            self.timeout,
            None,
            self.backend.hash_set(&key, &field, value),
        )
        .await?;
        Ok(value)
    }

    /// Reset every counter of the user to zero in one write.
    pub async fn clear_all(&self, username: &str) -> Result<()> {
        let key = self.keys.correct_times(username)?;
        let fields = guarded(
            "clear_counters",
            self.timeout,
            None,
            self.backend.hash_fields(&key),
        )
        .await?;
        if fields.is_empty() {
            return Err(CacheError::NotFound { key }.into());
        }

        let zeroed: Vec<(String, i64)> = fields.into_iter().map(|field| (field, 0)).collect();
        guarded(
            "clear_counters",
            self.timeout,
            None,
            self.backend.hash_put_all(&key, &zeroed),
        )
        .await
    }

    /// Delete every cache key of the user.
    ///
    /// Individual delete failures are logged and skipped. Returns `true` once
    /// every matching key has been attempted, `false` if the scan itself failed.
    pub async fn evict(&self, username: &str) -> Result<bool> {
        let pattern = self.keys.user_pattern(username)?;
        let Some(keys) = guarded(
            "scan_user_keys",
            self.timeout,
            Some(None),
            async { self.backend.scan(&pattern).await.map(Some) },
        )
        .await?
        else {
            return Ok(false);
        };

        for key in &keys {
            let removed = guarded(
                "evict_key",
                self.timeout,
                Some(false),
                self.backend.delete(key),
            )
            .await?;
            if !removed {
                tracing::debug!(username, key = %key, "Key already gone during eviction");
            }
        }
        tracing::info!(username, keys = keys.len(), "Evicted user cache entries");
        Ok(true)
    }

    /// Distinct usernames that currently have any key in the namespace.
    pub async fn cached_users(&self) -> Result<Vec<String>> {
        let pattern = self.keys.all_users_pattern();
        let keys = guarded(
            "scan_all_users",
            self.timeout,
            None,
            self.backend.scan(&pattern),
        )
        .await?;
        let users: BTreeSet<&str> = keys
            .iter()
            .filter_map(|key| self.keys.username_of(key))
            .collect();
        Ok(users.into_iter().map(str::to_string).collect())
    }

    async fn existing_field(&self, username: &str, question_id: u64) -> Result<(String, String)> {
        let key = self.keys.correct_times(username)?;
        let field = question_id.to_string();
        let present = guarded(
            "counter_field_exists",
            self.timeout,
            None,
            self.backend.hash_field_exists(&key, &field),
        )
        .await?;
        if !present {
            return Err(CacheError::FieldNotFound { key, field }.into());
        }
        Ok((key, field))
    }
}
