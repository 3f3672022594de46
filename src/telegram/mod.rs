//! Bot API transport: long polling in, `sendMessage` out.
//!
//! Usage e.g (in `async fn main() .. `):
//!
//! let client = TelegramClient::new(TELEGRAM_API_URL, &env.telegram_bot_token)?;
//! let me = client.get_me().await?;
//! let handles = dispatch::start_bot(client, handler, 30);

pub mod client;
pub mod dispatch;
pub mod types;
