//! Avatar images.

use std::path::Path;
use std::sync::Arc;

/// Opaque avatar image bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AvatarBlob(Arc<[u8]>);

impl AvatarBlob {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for AvatarBlob {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

/// Process-wide default avatar.
///
/// Loaded once at startup and handed to the engine; never reloaded. New
/// archives are seeded with it and avatar reads can fall back to it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DefaultAvatar(AvatarBlob);

impl DefaultAvatar {
    pub fn new(blob: AvatarBlob) -> Self {
        Self(blob)
    }

    /// Read the default avatar from `path`, or an empty image if that fails.
    pub fn load(path: &Path) -> Self {
        match std::fs::read(path) {
            Ok(bytes) => {
                tracing::info!(path = %path.display(), bytes = bytes.len(), "Default avatar loaded");
                Self(AvatarBlob::from(bytes))
            }
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Failed to load default avatar, using an empty image"
                );
                Self::default()
            }
        }
    }

    pub fn blob(&self) -> &AvatarBlob {
        &self.0
    }
}
