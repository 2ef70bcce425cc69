//! Subcommand implementations.

pub mod codes;
pub mod counters;
pub mod health;
pub mod session;
