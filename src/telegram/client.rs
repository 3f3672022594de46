use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;

use crate::telegram::types::{ApiResponse, GetUpdates, Message, SendMessage, Update, User};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Extra time granted on top of the long-poll timeout before the request is abandoned
const POLL_GRACE: Duration = Duration::from_secs(15);

/// Only plain messages are of interest; edits would replay score commands
pub const ALLOWED_UPDATES: [&str; 1] = ["message"];

/// Thin Bot API client over `reqwest`.
///
/// The token is part of every request URL, so reqwest errors are stripped of their URL before
/// they leave this module.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base: String,
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient").finish_non_exhaustive()
    }
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str) -> TelegramResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    /// Validates the token and returns the bot's own account
    #[instrument(skip(self))]
    pub async fn get_me(&self) -> TelegramResult<User> {
        self.call("getMe", &serde_json::json!({}), REQUEST_TIMEOUT)
            .await
    }

    /// Long-polls for new updates; returns early as soon as any arrive.
    ///
    /// Passing the last seen `update_id + 1` as `offset` confirms everything before it.
    #[instrument(skip(self))]
    pub async fn get_updates(&self, offset: Option<i64>, timeout: u64) -> TelegramResult<Vec<Update>> {
        let params = GetUpdates {
            offset,
            timeout,
            allowed_updates: &ALLOWED_UPDATES,
        };

        self.call("getUpdates", &params, Duration::from_secs(timeout) + POLL_GRACE)
            .await
    }

    #[instrument(skip(self, message), fields(chat_id = message.chat_id, thread_id = ?message.message_thread_id))]
    pub async fn send_message(&self, message: &SendMessage) -> TelegramResult<Message> {
        self.call("sendMessage", message, REQUEST_TIMEOUT).await
    }

    async fn call<P, T>(&self, method: &str, params: &P, timeout: Duration) -> TelegramResult<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let res = self
            .http
            .post(format!("{}/{}", self.base, method))
            .json(params)
            .timeout(timeout)
            .send()
            .await?;

        let status = res.status();
        let body = res.bytes().await?;

        // telegram sends a JSON envelope for failures too, anything else came from something in
        // between us and the API
        let envelope: ApiResponse<T> = serde_json::from_slice(&body)
            .map_err(|source| TelegramErr::Decode { status, source })?;

        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),

            ApiResponse {
                error_code,
                description,
                parameters,
                ..
            } => {
                let err = TelegramErr::Api {
                    code: error_code.unwrap_or(i64::from(status.as_u16())),
                    description: description.unwrap_or_default(),
                    retry_after: parameters.and_then(|p| p.retry_after),
                };

                tracing::debug!(method, error = %err, "bot api call failed");
                Err(err)
            }
        }
    }
}

/// Splits `text` into pieces that each fit in one Telegram message, preferring line breaks.
///
/// Lines longer than `limit` on their own are cut wherever the limit falls.
pub fn split_text(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = utf16_len(line);
        let sep = usize::from(!current.is_empty());

        if current_len + sep + line_len <= limit {
            if sep == 1 {
                current.push('\n');
            }
            current.push_str(line);
            current_len += sep + line_len;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        for ch in line.chars() {
            let width = ch.len_utf16();
            if current_len + width > limit {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }

            current.push(ch);
            current_len += width;
        }
    }

    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }

    chunks
}

fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

pub type TelegramResult<T> = core::result::Result<T, TelegramErr>;

#[derive(Debug, Error)]
pub enum TelegramErr {
    #[error(transparent)]
    Reqwest(reqwest::Error),

    #[error("unreadable response (status {status}): {source}")]
    Decode {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },

    #[error("bot api error {code}: {description}")]
    Api {
        code: i64,
        description: String,
        retry_after: Option<u64>,
    },
}

impl From<reqwest::Error> for TelegramErr {
    fn from(e: reqwest::Error) -> Self {
        TelegramErr::Reqwest(e.without_url())
    }
}

impl TelegramErr {
    /// The token was rejected; retrying can't help
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, TelegramErr::Api { code: 401 | 404, .. })
    }

    /// Flood control wait requested by telegram, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            TelegramErr::Api {
                retry_after: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}
