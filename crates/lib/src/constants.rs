//! Constants used throughout the archive engine.
//!
//! Central definitions for cache sub-keys, archive file names and the
//! default time bounds placed on external calls.

use std::time::Duration;

/// Default namespace root for cache keys (`user:<name>:<subkey>`).
pub const DEFAULT_KEY_ROOT: &str = "user";

/// Separator between key segments. Usernames may not contain it.
pub const KEY_SEPARATOR: char = ':';

/// Sub-key of the per-question correct-answer counter hash.
pub const QUES_CORRECT_TIMES: &str = "ques-correct-times";

/// Sub-key of the single-use verification code.
pub const VERIFY_CODE: &str = "verify-code";

/// Avatar file inside each archive directory.
pub const AVATAR_FILE_NAME: &str = "avatar.png";

/// Counters file inside each archive directory.
pub const CORRECT_TIMES_FILE_NAME: &str = "correct_times.json";

/// Name passed to `FileArchiveStore::delete` to remove everything under a path.
pub const DELETE_ALL: &str = "*";

/// Bound on a single cache round-trip.
pub const CACHE_TIMEOUT: Duration = Duration::from_secs(3);

/// Bound on a single filesystem operation.
pub const FILE_TIMEOUT: Duration = Duration::from_secs(5);

/// Bound on a composite engine flow (login, logout, ...).
pub const FLOW_TIMEOUT: Duration = Duration::from_secs(10);

/// Default lifetime of a verification code.
pub const VERIFY_CODE_TTL: Duration = Duration::from_secs(300);

/// Default number of digits in a generated verification code.
pub const VERIFY_CODE_LENGTH: usize = 6;

/// Default number of concurrent blocking filesystem jobs.
pub const BLOCKING_WORKERS: usize = 8;
