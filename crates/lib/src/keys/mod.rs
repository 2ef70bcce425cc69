//! Cache key construction.
//!
//! Every cache key the engine touches has the shape `<root>:<username>:<subkey>`.
//! Keys are pure string values; nothing here performs I/O.
//!
//! Usernames double as archive directory names, so validation also rejects
//! anything that would escape the archive root or widen a `SCAN MATCH`
//! pattern to another user's keys.

pub mod errors;

pub use errors::KeyError;

use crate::Result;
use crate::constants::{DEFAULT_KEY_ROOT, KEY_SEPARATOR, QUES_CORRECT_TIMES, VERIFY_CODE};

/// Per-user sub-keys stored in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubKey {
    /// Hash of question id -> correct count.
    QuesCorrectTimes,
    /// TTL-bound single-use verification code.
    VerifyCode,
}

impl SubKey {
    /// Wire name of the sub-key.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubKey::QuesCorrectTimes => QUES_CORRECT_TIMES,
            SubKey::VerifyCode => VERIFY_CODE,
        }
    }
}

impl std::fmt::Display for SubKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reject usernames that cannot safely become a key segment or directory name.
pub fn validate_username(username: &str) -> Result<()> {
    let reason = if username.is_empty() {
        Some("must not be empty")
    } else if username.contains(KEY_SEPARATOR) {
        Some("must not contain the key separator ':'")
    } else if username.contains(['*', '?', '[', ']']) {
        Some("must not contain glob metacharacters")
    } else if username.contains(['/', '\\']) {
        Some("must not contain path separators")
    } else if username == "." || username == ".." {
        Some("must not be a relative path component")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(KeyError::InvalidUsername {
            username: username.to_string(),
            reason,
        }
        .into()),
        None => Ok(()),
    }
}

/// Build `<root>:<username>:<subkey>`.
///
/// Identical inputs always produce identical keys.
pub fn build(root: &str, username: &str, subkey: SubKey) -> Result<String> {
    validate_username(username)?;
    Ok(format!(
        "{root}{KEY_SEPARATOR}{username}{KEY_SEPARATOR}{}",
        subkey.as_str()
    ))
}

/// Naming convention for one key namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    root: String,
}

impl KeySpace {
    /// Create a key space rooted at `root`.
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    /// The namespace root.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Key of `subkey` for `username`.
    pub fn key(&self, username: &str, subkey: SubKey) -> Result<String> {
        build(&self.root, username, subkey)
    }

    /// Counter hash key for `username`.
    pub fn correct_times(&self, username: &str) -> Result<String> {
        self.key(username, SubKey::QuesCorrectTimes)
    }

    /// Verification code key for `username`.
    pub fn verify_code(&self, username: &str) -> Result<String> {
        self.key(username, SubKey::VerifyCode)
    }

    /// Pattern matching every key of one user: `<root>:<username>:*`.
    pub fn user_pattern(&self, username: &str) -> Result<String> {
        validate_username(username)?;
        Ok(format!(
            "{}{KEY_SEPARATOR}{username}{KEY_SEPARATOR}*",
            self.root
        ))
    }

    /// Pattern matching every key in the namespace: `<root>:*`.
    pub fn all_users_pattern(&self) -> String {
        format!("{}{KEY_SEPARATOR}*", self.root)
    }

    /// Extract the username segment from a key in this namespace.
    pub fn username_of<'k>(&self, key: &'k str) -> Option<&'k str> {
        let rest = key
            .strip_prefix(self.root.as_str())?
            .strip_prefix(KEY_SEPARATOR)?;
        let (username, _subkey) = rest.split_once(KEY_SEPARATOR)?;
        (!username.is_empty()).then_some(username)
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_ROOT)
    }
}
