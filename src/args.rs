use std::path::PathBuf;

use clap::Parser;

use crate::constants::{DEFAULT_POLL_TIMEOUT_SECS, DEFAULT_SCORES_PATH, TELEGRAM_API_URL};

/// Keeps per-topic scores for Telegram group chats.
///
/// The bot token is read from `TELEGRAM_BOT_TOKEN` (environment or `.env`), never from the
/// command line.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// JSON file holding every chat's scores
    #[arg(short, long, env = "SCORES_PATH", default_value = DEFAULT_SCORES_PATH)]
    pub scores_path: PathBuf,

    /// Long-poll timeout for `getUpdates`, in seconds (at least 1, so polling never spins)
    #[arg(
        short = 't',
        long,
        env = "POLL_TIMEOUT",
        default_value_t = DEFAULT_POLL_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..=50)
    )]
    pub poll_timeout: u64,

    /// Bot API base URL
    #[arg(long, env = "TELEGRAM_API_URL", default_value = TELEGRAM_API_URL)]
    pub api_url: String,
}

pub fn parse_cli_args() -> Cli {
    let args = Cli::parse();
    tracing::debug!(args = ?args, "command line");

    args
}
