use tracing::instrument;

use crate::bot::gate::{BotEvent, classify};
use crate::constants::MESSAGE_LENGTH_LIMIT;
use crate::db::prelude::*;
use crate::leaderboard::scoring::Sender;
use crate::leaderboard::table::render;
use crate::telegram::client::split_text;
use crate::telegram::types::{Message, ReplyParameters, SendMessage, Update, User};

impl From<&User> for Sender {
    fn from(user: &User) -> Self {
        Sender {
            id: user.id,
            full_name: Some(user.full_name()),
            username: user.username.clone(),
        }
    }
}

/// A text answer going back into the thread the triggering message came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub chat_id: i64,
    pub thread_id: Option<i64>,
    pub reply_to: i64,
    pub text: String,
}

impl Reply {
    /// Outgoing `sendMessage` calls for this reply. Overlong text is split, and only the first
    /// part quotes the triggering message.
    pub fn into_messages(self) -> Vec<SendMessage> {
        self.into_messages_limited(MESSAGE_LENGTH_LIMIT)
    }

    fn into_messages_limited(self, limit: usize) -> Vec<SendMessage> {
        split_text(&self.text, limit)
            .into_iter()
            .enumerate()
            .map(|(i, text)| SendMessage {
                chat_id: self.chat_id,
                text,
                message_thread_id: self.thread_id,
                reply_parameters: (i == 0).then_some(ReplyParameters {
                    message_id: self.reply_to,
                    allow_sending_without_reply: true,
                }),
            })
            .collect()
    }
}

/// Turns messages into score changes and table replies.
#[derive(Debug)]
pub struct Handler {
    repo: ScoreRepository,
    bot_username: Option<String>,
}

impl Handler {
    pub fn new(repo: ScoreRepository, bot_username: Option<String>) -> Self {
        Self { repo, bot_username }
    }

    #[instrument(skip(self, update), fields(update_id = update.update_id))]
    pub async fn handle_update(&self, update: &Update) -> StoreResult<Option<Reply>> {
        match &update.message {
            Some(message) => self.handle_message(message).await,
            None => {
                tracing::debug!("update carries no message");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, message), fields(chat_id = message.chat.id, message_id = message.message_id))]
    pub async fn handle_message(&self, message: &Message) -> StoreResult<Option<Reply>> {
        let event = classify(
            message.chat.kind,
            message.is_topic_message,
            message.text.as_deref(),
            self.bot_username.as_deref(),
        );
        let chat = ChatId::from(message.chat.id);

        match event {
            BotEvent::Ignored(reason) => {
                tracing::debug!(?reason, "message ignored");
                Ok(None)
            }

            BotEvent::Score { delta } => {
                // anonymous admins and linked-channel posts have no user to credit
                let Some(from) = &message.from else {
                    tracing::debug!(%delta, "score command without a sender");
                    return Ok(None);
                };

                self.repo
                    .increment_by(&chat, &Sender::from(from), &delta)
                    .await?;
                Ok(None)
            }

            BotEvent::TableRequest => {
                let board = self.repo.board(&chat).await?;
                tracing::info!(entries = board.len(), "table requested");

                Ok(Some(Reply {
                    chat_id: message.chat.id,
                    thread_id: message.message_thread_id,
                    reply_to: message.message_id,
                    text: render(&board),
                }))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use num_bigint::BigInt;

    use super::*;
    use crate::db::models::{ScoreStore, UserId};
    use crate::telegram::types::{Chat, ChatType};

    const CHAT: i64 = 100;
    const TOPIC: i64 = 5;

    fn user(id: i64, first_name: &str) -> User {
        User {
            id,
            first_name: first_name.into(),
            last_name: None,
            username: None,
        }
    }

    fn topic_message(from: Option<User>, text: &str) -> Message {
        Message {
            message_id: 1000,
            message_thread_id: Some(TOPIC),
            is_topic_message: true,
            from,
            chat: Chat {
                id: CHAT,
                kind: ChatType::Supergroup,
            },
            text: Some(text.into()),
        }
    }

    fn handler(dir: &tempfile::TempDir) -> Handler {
        let repo = ScoreRepository::new(JsonStore::new(dir.path().join("scores.json")));
        Handler::new(repo, Some("tally_bot".into()))
    }

    async fn stored(dir: &tempfile::TempDir) -> ScoreStore {
        JsonStore::new(dir.path().join("scores.json")).load().await.unwrap()
    }

    #[tokio::test]
    async fn test_scores_then_table() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(&dir);

        let alice = user(1, "Alice");
        let bob = User {
            username: Some("bobby".into()),
            ..user(2, "")
        };

        assert_eq!(handler.handle_message(&topic_message(Some(alice), "!5")).await.unwrap(), None);
        assert_eq!(handler.handle_message(&topic_message(Some(bob), "!-2")).await.unwrap(), None);

        let store = stored(&dir).await;
        let board = store.board(&ChatId::from("100")).unwrap();
        assert_eq!(board.get(&UserId::from("1")).unwrap().name, "Alice");
        assert_eq!(board.get(&UserId::from("1")).unwrap().score, BigInt::from(5));
        assert_eq!(board.get(&UserId::from("2")).unwrap().name, "bobby");
        assert_eq!(board.get(&UserId::from("2")).unwrap().score, BigInt::from(-2));

        let reply = handler
            .handle_message(&topic_message(None, "!т"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(reply.chat_id, CHAT);
        assert_eq!(reply.thread_id, Some(TOPIC));
        assert_eq!(reply.reply_to, 1000);
        assert_eq!(reply.text, "Баллы по философии:\n1. Alice — 5\n2. bobby — -2");
    }

    #[tokio::test]
    async fn test_table_of_fresh_chat() {
        let dir = tempfile::tempdir().unwrap();
        let reply = handler(&dir)
            .handle_message(&topic_message(Some(user(1, "Alice")), "/start"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(reply.text, "Таблица пуста.");
    }

    #[tokio::test]
    async fn test_ineligible_messages_do_not_score() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(&dir);

        let mut main_stream = topic_message(Some(user(1, "Alice")), "!5");
        main_stream.is_topic_message = false;
        main_stream.message_thread_id = None;

        let mut private = topic_message(Some(user(1, "Alice")), "!5");
        private.chat.kind = ChatType::Private;

        assert_eq!(handler.handle_message(&main_stream).await.unwrap(), None);
        assert_eq!(handler.handle_message(&private).await.unwrap(), None);
        assert!(stored(&dir).await.is_empty());
    }

    #[tokio::test]
    async fn test_senderless_score_is_ignored() {
        let dir = tempfile::tempdir().unwrap();

        let reply = handler(&dir)
            .handle_message(&topic_message(None, "!5"))
            .await
            .unwrap();

        assert_eq!(reply, None);
        assert!(stored(&dir).await.is_empty());
    }

    #[tokio::test]
    async fn test_update_without_message() {
        let dir = tempfile::tempdir().unwrap();
        let update = Update {
            update_id: 1,
            message: None,
        };

        assert_eq!(handler(&dir).handle_update(&update).await.unwrap(), None);
    }

    #[test]
    fn test_long_reply_is_split() {
        let reply = Reply {
            chat_id: CHAT,
            thread_id: Some(TOPIC),
            reply_to: 1000,
            text: "1. aaaa\n2. bbbb\n3. cccc".into(),
        };

        let messages = reply.into_messages_limited(10);
        assert_eq!(messages.len(), 3);
        assert!(messages.iter().all(|m| m.message_thread_id == Some(TOPIC)));
        assert_eq!(messages[0].reply_parameters.as_ref().map(|p| p.message_id), Some(1000));
        assert!(messages[1].reply_parameters.is_none());
        assert_eq!(messages[2].text, "3. cccc");
    }
}
