//! Engine integration tests
//!
//! Full session flows over a temporary archive root and the fault-injecting
//! cache.

mod failures;
