//! Parsing of the lines typed at the prompt.

use thiserror::Error;

use crate::config::ConfigError;
use crate::i18n::Language;

/// Text printed by `/help`.
pub const HELP: &str = "\
  /new             open a new flight
  /list            show flight logs
  /open <n>        switch to flight n
  /delete <n>      delete flight n
  /lang <en|fr>    change language
  /airbnb          quick action: find accommodation
  /activities      quick action: things to do
  /help            this help
  /quit            leave
  anything else is sent to Wingman";

/// One user action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Send the text as a chat message.
    Say(String),
    /// Open a new conversation.
    New,
    /// Print the conversation list.
    List,
    /// Switch to the conversation at this 1-based position.
    Open(usize),
    /// Delete the conversation at this 1-based position.
    Delete(usize),
    /// Change language.
    Lang(Language),
    /// Send the accommodation quick action.
    QuickAirbnb,
    /// Send the activities quick action.
    QuickActivities,
    /// Print the help text.
    Help,
    /// Leave the terminal.
    Quit,
}

/// Errors for malformed commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Slash command that does not exist.
    #[error("unknown command /{0}, try /help")]
    Unknown(String),
    /// Command needs an argument.
    #[error("/{0} needs an argument")]
    MissingArgument(&'static str),
    /// Position is not a number or is zero.
    #[error("invalid flight number: {0:?}")]
    InvalidPosition(String),
    /// Language code not supported.
    #[error(transparent)]
    Language(#[from] ConfigError),
}

/// Parse one input line; blank lines yield `None`.
///
/// # Errors
/// Returns an error for unknown slash commands and bad arguments.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let Some(rest) = trimmed.strip_prefix('/') else {
        return Ok(Some(Command::Say(line.trim_end_matches(['\r', '\n']).to_string())));
    };

    let (name, arg) = rest.split_once(char::is_whitespace).map_or((rest, None), |(name, arg)| {
        (name, Some(arg.trim()).filter(|a| !a.is_empty()))
    });

    let command = match name.to_ascii_lowercase().as_str() {
        "new" => Command::New,
        "list" | "logs" => Command::List,
        "open" => Command::Open(position(arg, "open")?),
        "delete" | "del" => Command::Delete(position(arg, "delete")?),
        "lang" => Command::Lang(arg.ok_or(CommandError::MissingArgument("lang"))?.parse()?),
        "airbnb" => Command::QuickAirbnb,
        "activities" => Command::QuickActivities,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn position(arg: Option<&str>, command: &'static str) -> Result<usize, CommandError> {
    let raw = arg.ok_or(CommandError::MissingArgument(command))?;
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CommandError::InvalidPosition(raw.to_string())),
    }
}
