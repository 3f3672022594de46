use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

/// Telegram chat id, kept in the string form it has as a JSON key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub String);

/// Telegram user id, kept in the string form it has as a JSON key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for ChatId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single user's standing within one chat.
///
/// Scores have no upper or lower bound and are stored as plain JSON integers of any length.
///
/// Every field tolerates being absent in the persisted file: a record without a `score` reads as
/// zero, and an absent or unreadable `updated_at` reads as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Display name as of the most recent score change
    #[serde(default)]
    pub name: String,

    #[serde(default, with = "integer")]
    pub score: BigInt,

    #[serde(default, with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// All score records for a single chat
///
/// `<user_id, record>`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatBoard(BTreeMap<UserId, ScoreRecord>);

impl ChatBoard {
    #[cfg(test)]
    pub fn get(&self, user: &UserId) -> Option<&ScoreRecord> {
        self.0.get(user)
    }

    /// Fetches the user's record, creating a zero-score one if the user has never scored here
    pub fn record_mut(&mut self, user: UserId) -> &mut ScoreRecord {
        self.0.entry(user).or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UserId, &ScoreRecord)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(UserId, ScoreRecord)> for ChatBoard {
    fn from_iter<T: IntoIterator<Item = (UserId, ScoreRecord)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Every chat's leaderboard, exactly as persisted on disk
///
/// `<chat_id, board>`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreStore(BTreeMap<ChatId, ChatBoard>);

impl ScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn board(&self, chat: &ChatId) -> Option<&ChatBoard> {
        self.0.get(chat)
    }

    /// Fetches the chat's board, creating an empty one on the chat's first score event
    pub fn board_mut(&mut self, chat: ChatId) -> &mut ChatBoard {
        self.0.entry(chat).or_default()
    }

    pub fn chats(&self) -> impl Iterator<Item = &ChatId> {
        self.0.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Arbitrary-length integers written as bare JSON numbers, e.g. `100000000000000000000`
mod integer {
    use num_bigint::BigInt;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Number;

    pub fn serialize<S>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Number::from_string_unchecked(value.to_string()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigInt, D::Error>
    where
        D: Deserializer<'de>,
    {
        let number = Number::deserialize(deserializer)?;

        number
            .as_str()
            .parse()
            .map_err(|_| D::Error::custom(format!("score is not an integer: {number}")))
    }
}

/// RFC 3339 timestamps with microsecond precision and an explicit `+00:00` offset, e.g.
/// `2025-03-01T12:00:00.123456+00:00`.
///
/// Reading is lenient: anything that doesn't parse as RFC 3339 becomes `None` instead of
/// failing the whole file.
mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, false)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;

        Ok(raw
            .as_ref()
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|ts| ts.with_timezone(&Utc)))
    }
}
