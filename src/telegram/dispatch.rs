use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::bot::handler::{Handler, Reply};
use crate::constants::{BACKOFF_INITIAL_SECS, BACKOFF_MAX_SECS};
use crate::telegram::client::{TelegramClient, TelegramErr};
use crate::telegram::types::Update;

/// Work sent from the handler back to the poller, which owns all outgoing traffic
#[derive(Debug)]
pub enum BotCommand {
    Reply(Reply),
}

pub type DispatchResult<T> = core::result::Result<T, DispatchErr>;

#[derive(Debug, Error)]
pub enum DispatchErr {
    #[error(transparent)]
    Telegram(#[from] TelegramErr),

    #[error("dispatch channel closed unexpectedly")]
    ChannelClosed,
}

/// Spawns the poller and the handler tasks.
///
/// Updates flow poller -> handler over one channel and replies flow back over another, so the
/// handler sees exactly one message at a time and the score file only ever has one writer.
#[instrument(skip(client, handler))]
pub fn start_bot(
    client: TelegramClient,
    handler: Handler,
    poll_timeout: u64,
) -> Vec<JoinHandle<DispatchResult<()>>> {
    let (update_tx, update_rx) = mpsc::unbounded_channel::<Update>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<BotCommand>();

    let handler_task = tokio::spawn(read_channel(handler, update_rx, cmd_tx));
    let poller_task = tokio::spawn(poll_updates(client, poll_timeout, update_tx, cmd_rx));

    vec![poller_task, handler_task]
}

/// Handler side: processes updates in arrival order until the poller goes away.
///
/// A failing update is logged and skipped; it never stops the loop.
#[instrument(skip_all)]
pub async fn read_channel(
    handler: Handler,
    mut rx: UnboundedReceiver<Update>,
    tx: UnboundedSender<BotCommand>,
) -> DispatchResult<()> {
    tracing::debug!("update reader started");

    while let Some(update) = rx.recv().await {
        match handler.handle_update(&update).await {
            Ok(Some(reply)) => tx
                .send(BotCommand::Reply(reply))
                .map_err(|_| DispatchErr::ChannelClosed)?,
            Ok(None) => {}
            Err(e) => {
                tracing::error!(error = %e, update_id = update.update_id, "failed to handle update");
            }
        }
    }

    tracing::debug!("update channel closed, reader exiting");
    Ok(())
}

/// Poller side: long-polls `getUpdates` and sends replies queued by the handler.
///
/// Transient failures are retried with backoff. A rejected token ends the loop with an error.
#[instrument(skip(client, tx, rx))]
pub async fn poll_updates(
    client: TelegramClient,
    timeout: u64,
    tx: UnboundedSender<Update>,
    mut rx: UnboundedReceiver<BotCommand>,
) -> DispatchResult<()> {
    let mut offset: Option<i64> = None;
    let mut backoff = Backoff::default();

    tracing::info!("polling for updates");

    loop {
        tokio::select! {
            res = client.get_updates(offset, timeout) => match res {
                Ok(updates) => {
                    backoff.reset();
                    if !updates.is_empty() {
                        tracing::debug!(count = updates.len(), "RX updates");
                    }

                    for update in updates {
                        offset = Some(update.update_id + 1);
                        tx.send(update).map_err(|_| DispatchErr::ChannelClosed)?;
                    }
                }

                Err(e) if e.is_unauthorized() => {
                    tracing::error!(error = %e, "bot token rejected, giving up");
                    return Err(e.into());
                }

                Err(e) => {
                    let wait = e.retry_after().unwrap_or_else(|| backoff.next_delay());
                    tracing::warn!(error = %e, wait_ms = wait.as_millis() as u64, "polling failed, retrying");
                    tokio::time::sleep(wait).await;
                }
            },

            Some(cmd) = rx.recv() => match cmd {
                BotCommand::Reply(reply) => send_reply(&client, reply).await,
            },
        }
    }
}

#[instrument(skip(client, reply), fields(chat_id = reply.chat_id, thread_id = ?reply.thread_id))]
async fn send_reply(client: &TelegramClient, reply: Reply) {
    for message in reply.into_messages() {
        let mut result = client.send_message(&message).await;

        // one retry when flood control asks us to wait
        if let Err(e) = &result
            && let Some(wait) = e.retry_after()
        {
            tracing::warn!(wait_ms = wait.as_millis() as u64, "reply rate limited, waiting");
            tokio::time::sleep(wait).await;
            result = client.send_message(&message).await;
        }

        if let Err(e) = result {
            tracing::error!(error = %e, "failed to send reply");
            return;
        }
    }

    tracing::debug!("reply sent");
}

/// Exponential backoff with up to 50% random jitter
#[derive(Debug)]
struct Backoff {
    current: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            current: Duration::from_secs(BACKOFF_INITIAL_SECS),
        }
    }
}

impl Backoff {
    fn next_delay(&mut self) -> Duration {
        let base = self.current;
        self.current = (self.current * 2).min(Duration::from_secs(BACKOFF_MAX_SECS));

        let jitter_ms = rand::random_range(0..=base.as_millis() as u64 / 2);
        base + Duration::from_millis(jitter_ms)
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}
