//! Resolves command-line words and selector flags against the command table.
//!
//! A command can be chosen with its `--<name>` flag or by naming it (or a
//! unique prefix of its name or an alias) as the first word. Anything else is a
//! follow-up to the stored conversation.

use crate::commands::{self, CommandSpec};
use thiserror::Error;
use tracing::debug;

/// What a single invocation asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    /// Start a new conversation with a command-table entry.
    Start {
        command: &'static CommandSpec,
        text: String,
    },
    /// Continue the stored conversation.
    FollowUp { text: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum DispatchError {
    #[error("more than one command selected: {}", .0.join(", "))]
    Duplicate(Vec<&'static str>),
    #[error("'{word}' is ambiguous, it could mean: {}", .candidates.join(", "))]
    Ambiguous {
        word: String,
        candidates: Vec<&'static str>,
    },
    #[error("no text given for '{0}'")]
    MissingText(&'static str),
    #[error("nothing to send. Give some text, or use --help")]
    NoInput,
}

/// Picks the command and text for this invocation.
///
/// `flags` are the names of the selector flags that were set, in table order.
pub fn resolve(flags: &[&'static str], words: &[String]) -> Result<Invocation, DispatchError> {
    match flags {
        [] => resolve_words(words),
        [name] => {
            let command = commands::find(name).ok_or(DispatchError::NoInput)?;
            start(command, words)
        }
        _ => Err(DispatchError::Duplicate(flags.to_vec())),
    }
}

fn resolve_words(words: &[String]) -> Result<Invocation, DispatchError> {
    let Some(first) = words.first() else {
        return Err(DispatchError::NoInput);
    };

    let Some(command) = select_word(first)? else {
        debug!("'{}' is not a command, treating input as a follow-up", first);
        return follow_up(words);
    };

    let rest = &words[1..];
    if let Some(second) = rest.first().and_then(|w| commands::find_exact(w)) {
        if second.name != command.name {
            return Err(DispatchError::Duplicate(vec![command.name, second.name]));
        }
    }

    start(command, rest)
}

fn select_word(word: &str) -> Result<Option<&'static CommandSpec>, DispatchError> {
    if let Some(command) = commands::find_exact(word) {
        return Ok(Some(command));
    }

    let candidates = commands::find_by_prefix(word);
    match candidates.as_slice() {
        [] => Ok(None),
        [command] => Ok(Some(*command)),
        _ => Err(DispatchError::Ambiguous {
            word: word.to_string(),
            candidates: candidates.iter().map(|c| c.name).collect(),
        }),
    }
}

fn start(command: &'static CommandSpec, words: &[String]) -> Result<Invocation, DispatchError> {
    let text = words.join(" ");
    if text.trim().is_empty() {
        return Err(DispatchError::MissingText(command.name));
    }
    Ok(Invocation::Start { command, text })
}

fn follow_up(words: &[String]) -> Result<Invocation, DispatchError> {
    let text = words.join(" ");
    if text.trim().is_empty() {
        return Err(DispatchError::NoInput);
    }
    Ok(Invocation::FollowUp { text })
}
