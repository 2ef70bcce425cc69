//! Cache integration tests
//!
//! Typed caches over the fault-injecting backend, so transport failures and
//! timeouts can be driven without a network.

mod policy;
mod verification;
