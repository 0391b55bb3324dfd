use async_trait::async_trait;
use thiserror::Error;

use forno_core::domain::turn::{Speaker, Turn};

pub mod memory;
pub mod turn;

pub use memory::InMemoryTurnRepository;
pub use turn::SqlTurnRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Append-only conversation log. Turns are never updated or deleted; the
/// store assigns ids and timestamps and `append` is durable before it
/// returns. `list_all` may run concurrently with `append` and never
/// observes a partial write.
#[async_trait]
pub trait TurnRepository: Send + Sync {
    async fn append(&self, speaker: Speaker, text: &str) -> Result<Turn, RepositoryError>;

    /// Every persisted turn, ascending by creation time (ties broken by id).
    async fn list_all(&self) -> Result<Vec<Turn>, RepositoryError>;
}
