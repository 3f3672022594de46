use num_bigint::BigInt;
use tracing::instrument;

use super::lexer::Lexer;
use crate::constants::{TABLE_COMMANDS, TABLE_TRIGGER};

/// What a chat message asks the bot to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add `delta` to the sender's score
    Score(BigInt),

    /// Print the chat's leaderboard
    Table,
}

/// Recognizes a command in a message's text.
///
/// Table requests win over score changes; anything unrecognized is `None`. `bot_username` is
/// used to tell `/t@this_bot` apart from `/t@some_other_bot`.
#[instrument(level = "trace", ret)]
pub fn parse_command(text: &str, bot_username: Option<&str>) -> Option<Command> {
    if is_table_trigger(text) {
        return Some(Command::Table);
    }

    if let Some(name) = parse_bot_command(text, bot_username)
        && TABLE_COMMANDS.iter().any(|cmd| name.eq_ignore_ascii_case(cmd))
    {
        return Some(Command::Table);
    }

    parse_score(text).map(Command::Score)
}

/// `!т` in any letter case, surrounding whitespace ignored
pub fn is_table_trigger(text: &str) -> bool {
    text.trim().to_lowercase() == TABLE_TRIGGER
}

/// Parses `[!][whitespace][-]digits`, the whole trimmed text and nothing else. Any number of
/// digits is accepted.
pub fn parse_score(text: &str) -> Option<BigInt> {
    let mut lexer = Lexer::new(text.trim());

    lexer.eat('!');
    lexer.skip_whitespace();

    let negative = lexer.eat('-');
    let digits = lexer.next_while(|ch| ch.is_ascii_digit())?;

    if !lexer.is_eof() {
        return None;
    }

    let literal = if negative {
        format!("-{digits}")
    } else {
        digits.to_string()
    };

    literal.parse().ok()
}

/// Extracts the name of a leading `/command` or `/command@botname`.
///
/// A command addressed to a different bot is `None`. Anything after the first word is treated as
/// arguments and ignored.
pub fn parse_bot_command<'a>(text: &'a str, bot_username: Option<&str>) -> Option<&'a str> {
    let mut lexer = Lexer::new(text.trim_start());

    if !lexer.eat('/') {
        return None;
    }

    let word = lexer.next_word()?;
    let (name, mention) = match word.split_once('@') {
        Some((name, mention)) => (name, Some(mention)),
        None => (word, None),
    };

    if let (Some(mention), Some(me)) = (mention, bot_username)
        && !mention.eq_ignore_ascii_case(me)
    {
        return None;
    }

    if name.is_empty() {
        return None;
    }

    Some(name)
}
