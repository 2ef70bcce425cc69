//! Single-use verification codes.
//!
//! Per user the code moves through `Absent -> Issued(ttl) -> Absent`, leaving
//! `Issued` either by a successful [`VerificationCodeCache::consume`] or by
//! TTL expiry. A new issue replaces any live code.
//!
//! Consumption is exactly-once: after a matching comparison the key is
//! deleted, and only the caller whose delete actually removed it succeeds.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::Result;
use crate::cache::policy::{bounded, guarded, recover};
use crate::cache::{CacheBackend, CacheError, CacheFault};
use crate::keys::KeySpace;

/// Issues, fetches and consumes verification codes.
#[derive(Debug, Clone)]
pub struct VerificationCodeCache {
    backend: Arc<dyn CacheBackend>,
    keys: KeySpace,
    timeout: Duration,
}

impl VerificationCodeCache {
    pub fn new(backend: Arc<dyn CacheBackend>, keys: KeySpace, timeout: Duration) -> Self {
        Self {
            backend,
            keys,
            timeout,
        }
    }

    /// Generate a numeric code of `length` digits. Leading zeros are kept.
    pub fn generate(length: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }

    /// Store `code` for `username` with `ttl`, replacing any live code.
    ///
    /// Returns `false` when the cache could not be reached; the failure is
    /// logged and not raised.
    pub async fn issue(&self, username: &str, code: &str, ttl: Duration) -> Result<bool> {
        if code.is_empty() {
            return Err(CacheError::InvalidArgument {
                reason: "verification code must not be empty".to_string(),
            }
            .into());
        }
        let key = self.keys.verify_code(username)?;

        let outcome: std::result::Result<(), CacheFault> = async {
            if bounded(self.timeout, self.backend.exists(&key)).await? {
                tracing::debug!(username, "Replacing live verification code");
                bounded(self.timeout, self.backend.delete(&key)).await?;
            }
            bounded(self.timeout, self.backend.set_with_ttl(&key, code, ttl)).await
        }
        .await;

        match outcome {
            Ok(()) => {
                tracing::info!(username, ttl_secs = ttl.as_secs(), "Verification code issued");
                Ok(true)
            }
            Err(fault) => recover("issue_verification_code", fault, Some(false)),
        }
    }

    /// The live code for `username`, without consuming it.
    pub async fn fetch(&self, username: &str) -> Result<String> {
        let key = self.keys.verify_code(username)?;
        guarded("fetch_verification_code", self.timeout, None, self.backend.get(&key))
            .await?
            .ok_or_else(|| {
                CacheError::CodeNotFoundOrExpired {
                    username: username.to_string(),
                }
                .into()
            })
    }

    /// Check `candidate` against the live code and delete it on an exact match.
    pub async fn consume(&self, username: &str, candidate: &str) -> Result<()> {
        if candidate.is_empty() {
            return Err(CacheError::InvalidArgument {
                reason: "verification code must not be empty".to_string(),
            }
            .into());
        }
        let stored = self.fetch(username).await?;
        if stored != candidate {
            tracing::warn!(username, "Verification code mismatch");
            return Err(CacheError::CodeMismatch {
                username: username.to_string(),
            }
            .into());
        }

        let key = self.keys.verify_code(username)?;
        let removed = guarded(
            "consume_verification_code",
            self.timeout,
            None,
            self.backend.delete(&key),
        )
        .await?;
        if !removed {
            // Another caller consumed it, or it expired, between fetch and delete.
            return Err(CacheError::CodeNotFoundOrExpired {
                username: username.to_string(),
            }
            .into());
        }

        tracing::info!(username, "Verification code consumed");
        Ok(())
    }

    /// Delete the live code for `username`.
    pub async fn revoke(&self, username: &str) -> Result<()> {
        let key = self.keys.verify_code(username)?;
        let removed = guarded(
            "revoke_verification_code",
            self.timeout,
            None,
            self.backend.delete(&key),
        )
        .await?;
        if removed {
            Ok(())
        } else {
            Err(CacheError::CodeNotFoundOrExpired {
                username: username.to_string(),
            }
            .into())
        }
    }

    /// Whether a code is live for `username`. `false` when the cache is unreachable.
    pub async fn is_live(&self, username: &str) -> Result<bool> {
        let key = self.keys.verify_code(username)?;
        guarded(
            "verification_code_exists",
            self.timeout,
            Some(false),
            self.backend.exists(&key),
        )
        .await
    }
}
