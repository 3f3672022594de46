use chrono::{DateTime, Utc};
use num_bigint::BigInt;

use crate::db::models::{ChatId, ScoreRecord, ScoreStore, UserId};

/// Who sent a score command, independent of the chat platform's user object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: i64,
    pub full_name: Option<String>,
    pub username: Option<String>,
}

impl Sender {
    /// Resolves the name shown in the table: full name, then handle, then the numeric id
    pub fn display_name(&self) -> String {
        [&self.full_name, &self.username]
            .into_iter()
            .flatten()
            .find(|name| !name.is_empty())
            .cloned()
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// Applies `delta` to the sender's record in `chat`, stamping it with the current time.
///
/// Only the in-memory store changes; persisting is up to the caller.
pub fn add_score<'a>(
    store: &'a mut ScoreStore,
    chat: &ChatId,
    sender: &Sender,
    delta: &BigInt,
) -> &'a ScoreRecord {
    add_score_at(store, chat, sender, delta, Utc::now())
}

pub fn add_score_at<'a>(
    store: &'a mut ScoreStore,
    chat: &ChatId,
    sender: &Sender,
    delta: &BigInt,
    now: DateTime<Utc>,
) -> &'a ScoreRecord {
    let record = store
        .board_mut(chat.clone())
        .record_mut(UserId::from(sender.id));

    record.name = sender.display_name();
    record.score += delta;
    record.updated_at = Some(now);

    record
}
