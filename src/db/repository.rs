use num_bigint::BigInt;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::db::models::{ChatBoard, ChatId, ScoreRecord};
use crate::db::store::JsonStore;
use crate::db::StoreResult;
use crate::leaderboard::scoring::{Sender, add_score};

/// Serialized access to the score file.
///
/// Each operation reloads the file, and mutations hold the lock across the whole
/// load -> mutate -> save sequence so that two writers can never overwrite each other's
/// changes.
#[derive(Debug)]
pub struct ScoreRepository {
    store: JsonStore,
    lock: Mutex<()>,
}

impl ScoreRepository {
    pub fn new(store: JsonStore) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    #[instrument(skip(self, sender, delta), fields(user = sender.id, %delta))]
    pub async fn increment_by(
        &self,
        chat: &ChatId,
        sender: &Sender,
        delta: &BigInt,
    ) -> StoreResult<ScoreRecord> {
        let _guard = self.lock.lock().await;

        let mut store = self.store.load().await?;
        let record = add_score(&mut store, chat, sender, delta).clone();
        self.store.save(&store).await?;

        tracing::info!(score = %record.score, name = %record.name, "score updated");
        Ok(record)
    }

    /// Snapshot of a chat's board; empty if nobody has scored in the chat yet
    #[instrument(skip(self))]
    pub async fn board(&self, chat: &ChatId) -> StoreResult<ChatBoard> {
        let _guard = self.lock.lock().await;

        let store = self.store.load().await?;
        Ok(store.board(chat).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;
    use crate::db::models::UserId;

    fn n(value: i64) -> BigInt {
        BigInt::from(value)
    }

    fn sender(id: i64, name: &str) -> Sender {
        Sender {
            id,
            full_name: Some(name.to_string()),
            username: None,
        }
    }

    fn repository(dir: &tempfile::TempDir) -> ScoreRepository {
        ScoreRepository::new(JsonStore::new(dir.path().join("scores.json")))
    }

    async fn record(repo: &ScoreRepository, chat: &ChatId, user: i64) -> ScoreRecord {
        repo.board(chat)
            .await
            .unwrap()
            .get(&UserId::from(user))
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn test_increment_persists() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(&dir);
        let chat = ChatId::from("100");

        repo.increment_by(&chat, &sender(1, "Alice"), &n(5)).await.unwrap();
        repo.increment_by(&chat, &sender(1, "Alice"), &n(-1)).await.unwrap();

        // a fresh repository over the same file sees the same data
        let reopened = repository(&dir);
        let record = record(&reopened, &chat, 1).await;

        assert_eq!(record.score, n(4));
        assert_eq!(record.name, "Alice");
    }

    #[tokio::test]
    async fn test_board_of_unknown_chat_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(&dir);

        repo.increment_by(&ChatId::from("100"), &sender(1, "Alice"), &n(5))
            .await
            .unwrap();

        assert!(repo.board(&ChatId::from("200")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_huge_scores_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(&dir);
        let chat = ChatId::from("100");
        let huge: BigInt = "99999999999999999999".parse().unwrap();

        repo.increment_by(&chat, &sender(1, "Alice"), &huge).await.unwrap();
        repo.increment_by(&chat, &sender(1, "Alice"), &huge).await.unwrap();
        repo.increment_by(&chat, &sender(2, "Bob"), &n(3)).await.unwrap();

        let reopened = repository(&dir);
        assert_eq!(record(&reopened, &chat, 1).await.score, &huge + &huge);
        assert_eq!(record(&reopened, &chat, 2).await.score, n(3));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Arc::new(repository(&dir));
        let chat = ChatId::from("100");

        let mut handles = Vec::new();
        for i in 0..20i64 {
            let repo = repo.clone();
            let chat = chat.clone();
            handles.push(tokio::spawn(async move {
                repo.increment_by(&chat, &sender(i % 3, "someone"), &n(1))
                    .await
                    .unwrap();
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        let board = repo.board(&chat).await.unwrap();
        let total: BigInt = board.iter().map(|(_, r)| &r.score).sum();
        assert_eq!(total, n(20));
    }
}
