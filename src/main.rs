use futures::future::join_all;
use thiserror::Error;

use crate::bot::handler::Handler;
use crate::db::prelude::*;
use crate::telegram::client::{TelegramClient, TelegramErr};
use crate::telegram::dispatch::{self, DispatchErr};
use crate::util::env::{Env, EnvErr};

mod args;
mod bot;
mod constants;
mod db;
mod leaderboard;
mod parsing;
mod telegram;
mod util;

#[derive(Debug, Error)]
enum RunnerErr {
    #[error(transparent)]
    Env(#[from] EnvErr),

    #[error(transparent)]
    Telegram(#[from] TelegramErr),

    #[error(transparent)]
    Dispatch(#[from] DispatchErr),

    #[error(transparent)]
    Store(#[from] StoreErr),

    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}

type Result<T> = core::result::Result<T, RunnerErr>;

#[tokio::main]
async fn main() -> Result<()> {
    util::env::load_dotenv()?;
    util::tracing::init_subscriber();

    let args = args::parse_cli_args();
    let env = Env::new().inspect_err(|e| tracing::error!(error = %e, "configuration error"))?;

    let client = TelegramClient::new(&args.api_url, &env.telegram_bot_token)?;
    let me = client
        .get_me()
        .await
        .inspect_err(|e| tracing::error!(error = %e, "could not reach the bot api"))?;

    tracing::info!(bot_id = me.id, bot_username = ?me.username, "authorized");

    // an unreadable score file stops startup here
    let store = JsonStore::new(args.scores_path);
    let existing = store.load().await?;
    if existing.is_empty() {
        tracing::info!("no scores recorded yet");
    } else {
        tracing::info!(chats = existing.chats().count(), "loaded existing scores");
    }

    let repo = ScoreRepository::new(store);
    let handler = Handler::new(repo, me.username);
    let handles = dispatch::start_bot(client, handler, args.poll_timeout);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received, shutting down");
        }

        results = join_all(handles) => {
            for result in results {
                result??;
            }
        }
    }

    Ok(())
}
