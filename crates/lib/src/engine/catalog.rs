//! Question catalog collaborator.

use async_trait::async_trait;

use crate::Result;

/// Source of the number of questions a new archive is seeded with.
#[async_trait]
pub trait QuestionCatalog: Send + Sync + std::fmt::Debug {
    /// Current number of questions. Ids run `0..count`.
    async fn question_count(&self) -> Result<u64>;
}

/// A catalog of fixed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedCatalog(pub u64);

#[async_trait]
impl QuestionCatalog for FixedCatalog {
    async fn question_count(&self) -> Result<u64> {
        Ok(self.0)
    }
}
