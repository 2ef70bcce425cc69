use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use exam_archive::cache::{CacheBackend, CacheFault, FaultKind, FaultResult};
use exam_archive::{Clock, InMemoryCache};

/// What an injected fault does to a matching call.
#[derive(Debug, Clone)]
pub enum Fault {
    /// Return a fault of this kind immediately.
    Fail(FaultKind),
    /// Never answer; the caller's timeout has to fire.
    Stall,
}

#[derive(Debug, Clone)]
struct Rule {
    operation: &'static str,
    key: Option<String>,
    fault: Fault,
}

/// A [`CacheBackend`] that forwards to an [`InMemoryCache`] unless a rule matches.
///
/// Operation names are the trait method names (`"get"`, `"delete"`, `"scan"`, ...).
#[derive(Debug)]
pub struct FaultyCache {
    inner: InMemoryCache,
    rules: Mutex<Vec<Rule>>,
}

impl FaultyCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: InMemoryCache::with_clock(clock),
            rules: Mutex::new(Vec::new()),
        }
    }

    /// Fault every call of `operation`.
    pub fn fail(&self, operation: &'static str, fault: Fault) {
        self.rules.lock().unwrap().push(Rule {
            operation,
            key: None,
            fault,
        });
    }

    /// Fault calls of `operation` on exactly `key`.
    pub fn fail_key(&self, operation: &'static str, key: &str, fault: Fault) {
        self.rules.lock().unwrap().push(Rule {
            operation,
            key: Some(key.to_string()),
            fault,
        });
    }

    /// Remove every rule.
    pub fn heal(&self) {
        self.rules.lock().unwrap().clear();
    }

    pub fn inner(&self) -> &InMemoryCache {
        &self.inner
    }

    async fn check(&self, operation: &'static str, key: &str) -> FaultResult<()> {
        let fault = self
            .rules
            .lock()
            .unwrap()
            .iter()
            .find(|rule| {
                rule.operation == operation && rule.key.as_deref().is_none_or(|k| k == key)
            })
            .map(|rule| rule.fault.clone());
        match fault {
            None => Ok(()),
            Some(Fault::Fail(kind)) => Err(CacheFault::new(kind, format!("injected {operation}"))),
            Some(Fault::Stall) => {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Err(CacheFault::other("stall released"))
            }
        }
    }
}

#[async_trait]
impl CacheBackend for FaultyCache {
    async fn exists(&self, key: &str) -> FaultResult<bool> {
        self.check("exists", key).await?;
        self.inner.exists(key).await
    }

    async fn get(&self, key: &str) -> FaultResult<Option<String>> {
        self.check("get", key).await?;
        self.inner.get(key).await
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> FaultResult<()> {
        self.check("set_with_ttl", key).await?;
        self.inner.set_with_ttl(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> FaultResult<bool> {
        self.check("delete", key).await?;
        self.inner.delete(key).await
    }

    async fn hash_put_all(&self, key: &str, entries: &[(String, i64)]) -> FaultResult<()> {
        self.check("hash_put_all", key).await?;
        self.inner.hash_put_all(key, entries).await
    }

    async fn hash_get_all(&self, key: &str) -> FaultResult<Vec<(String, i64)>> {
        self.check("hash_get_all", key).await?;
        self.inner.hash_get_all(key).await
    }

    async fn hash_field_exists(&self, key: &str, field: &str) -> FaultResult<bool> {
        self.check("hash_field_exists", key).await?;
        self.inner.hash_field_exists(key, field).await
    }

    async fn hash_increment(&self, key: &str, field: &str, delta: i64) -> FaultResult<i64> {
        self.check("hash_increment", key).await?;
        self.inner.hash_increment(key, field, delta).await
    }

    async fn hash_set(&self, key: &str, field: &str, value: i64) -> FaultResult<()> {
        self.check("hash_set", key).await?;
        self.inner.hash_set(key, field, value).await
    }

    async fn hash_fields(&self, key: &str) -> FaultResult<Vec<String>> {
        self.check("hash_fields", key).await?;
        self.inner.hash_fields(key).await
    }

    async fn scan(&self, pattern: &str) -> FaultResult<Vec<String>> {
        self.check("scan", pattern).await?;
        self.inner.scan(pattern).await
    }

    async fn ping(&self) -> FaultResult<()> {
        self.check("ping", "").await?;
        self.inner.ping().await
    }
}
