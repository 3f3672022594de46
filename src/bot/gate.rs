use num_bigint::BigInt;

use crate::parsing::commands::{Command, parse_command};
use crate::telegram::types::ChatType;

/// What an incoming message amounts to, decided without touching the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotEvent {
    Score { delta: BigInt },
    TableRequest,
    Ignored(Ignored),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    NotGroupChat,
    NotTopicMessage,
    NoText,
    NoCommand,
}

/// Decides whether a message is eligible and, if so, what it asks for.
///
/// Only messages in a group or supergroup that belong to a forum topic count. The same rule
/// applies to `/start` and `/t`.
pub fn classify(
    chat_type: ChatType,
    is_topic_message: bool,
    text: Option<&str>,
    bot_username: Option<&str>,
) -> BotEvent {
    if !chat_type.is_group() {
        return BotEvent::Ignored(Ignored::NotGroupChat);
    }

    if !is_topic_message {
        return BotEvent::Ignored(Ignored::NotTopicMessage);
    }

    let Some(text) = text else {
        return BotEvent::Ignored(Ignored::NoText);
    };

    match parse_command(text, bot_username) {
        Some(Command::Score(delta)) => BotEvent::Score { delta },
        Some(Command::Table) => BotEvent::TableRequest,
        None => BotEvent::Ignored(Ignored::NoCommand),
    }
}
