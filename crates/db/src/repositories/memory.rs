use chrono::Utc;
use tokio::sync::RwLock;

use forno_core::domain::turn::{Speaker, Turn};

use super::{RepositoryError, TurnRepository};

/// Test double for the persisted log. Timestamps are clamped to stay
/// non-decreasing even when appends land within one clock tick.
#[derive(Default)]
pub struct InMemoryTurnRepository {
    turns: RwLock<Vec<Turn>>,
}

#[async_trait::async_trait]
impl TurnRepository for InMemoryTurnRepository {
    async fn append(&self, speaker: Speaker, text: &str) -> Result<Turn, RepositoryError> {
        let mut turns = self.turns.write().await;

        let mut created_at = Utc::now();
        if let Some(last) = turns.last() {
            created_at = created_at.max(last.created_at);
        }

        let turn =
            Turn { id: turns.len() as i64 + 1, speaker, text: text.to_string(), created_at };
        turns.push(turn.clone());
        Ok(turn)
    }

    async fn list_all(&self) -> Result<Vec<Turn>, RepositoryError> {
        let turns = self.turns.read().await;
        Ok(turns.clone())
    }
}

#[cfg(test)]
mod tests {
    use forno_core::domain::turn::Speaker;

    use super::InMemoryTurnRepository;
    use crate::repositories::TurnRepository;

    #[tokio::test]
    async fn append_then_list_round_trip() {
        let repo = InMemoryTurnRepository::default();

        let stored = repo.append(Speaker::User, "quero uma portuguesa").await.expect("append");
        let turns = repo.list_all().await.expect("list");

        assert_eq!(turns, vec![stored]);
    }

    #[tokio::test]
    async fn timestamps_never_decrease_across_interleaved_appends() {
        let repo = InMemoryTurnRepository::default();

        for index in 0..10 {
            let speaker = if index % 2 == 0 { Speaker::User } else { Speaker::Assistant };
            repo.append(speaker, "mensagem").await.expect("append");
        }

        let turns = repo.list_all().await.expect("list");
        assert_eq!(turns.len(), 10);
        assert!(turns.windows(2).all(|pair| pair[0].created_at <= pair[1].created_at));
        assert!(turns.windows(2).all(|pair| pair[0].id < pair[1].id));
    }
}
