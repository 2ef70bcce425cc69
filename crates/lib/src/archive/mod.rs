//! Durable per-user archives on the local filesystem.
//!
//! [`FileArchiveStore`] performs the raw file operations; [`format`] defines
//! the counters file; [`avatar`] holds avatar bytes and the process-wide
//! default.

pub mod avatar;
pub mod errors;
pub mod format;
pub mod store;

pub use avatar::{AvatarBlob, DefaultAvatar};
pub use errors::ArchiveError;
pub use format::CounterRecord;
pub use store::{FileArchiveStore, file_extension};
