//! Special commands parser for interactive chat mode
//!
//! Special commands act on the session instead of being sent to the
//! backend. Commands are prefixed with `/` and are case-insensitive.
//! Message and prompt positions are 1-based, as displayed.

use crate::session::Rating;
use colored::Colorize;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },

    /// Argument is not a positive number
    #[error("Invalid position for {command}: {arg}\n\nPositions start at 1")]
    InvalidPosition { command: String, arg: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Start a new topic: clear the conversation and refetch prompts
    NewTopic,

    /// Clear the conversation, keep the current prompts
    Clear,

    /// Toggle a rating on the message at a 1-based position
    Rate { position: usize, rating: Rating },

    /// List the current suggested prompts
    ShowPrompts,

    /// Send the suggested prompt at a 1-based position
    PickPrompt(usize),

    /// Print the whole conversation again
    History,

    /// Print the feedback form link
    FeedbackForm,

    /// Show message count and whether a reply is pending
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command; send the input as a message
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns `CommandError` for unknown commands, missing arguments or
/// positions that are not positive integers.
///
/// # Examples
///
/// ```
/// use chatline::commands::special_commands::{parse_special_command, SpecialCommand};
/// use chatline::session::Rating;
///
/// assert_eq!(parse_special_command("/new").unwrap(), SpecialCommand::NewTopic);
/// assert_eq!(
///     parse_special_command("/up 2").unwrap(),
///     SpecialCommand::Rate { position: 2, rating: Rating::Up }
/// );
/// assert_eq!(parse_special_command("hello").unwrap(), SpecialCommand::None);
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let mut parts = lower.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let arg = parts.next();

    match command {
        "/new" | "/topic" => Ok(SpecialCommand::NewTopic),
        "/clear" => Ok(SpecialCommand::Clear),
        "/up" => Ok(SpecialCommand::Rate {
            position: parse_position("/up", arg, "/up <message number>")?,
            rating: Rating::Up,
        }),
        "/down" => Ok(SpecialCommand::Rate {
            position: parse_position("/down", arg, "/down <message number>")?,
            rating: Rating::Down,
        }),
        "/prompts" | "/suggestions" => Ok(SpecialCommand::ShowPrompts),
        "/pick" => Ok(SpecialCommand::PickPrompt(parse_position(
            "/pick",
            arg,
            "/pick <suggestion number>",
        )?)),
        "/history" => Ok(SpecialCommand::History),
        "/feedback" => Ok(SpecialCommand::FeedbackForm),
        "/status" => Ok(SpecialCommand::ShowStatus),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" | "exit" | "quit" => Ok(SpecialCommand::Exit),
        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

fn parse_position(command: &str, arg: Option<&str>, usage: &str) -> Result<usize, CommandError> {
    let arg = arg.ok_or_else(|| CommandError::MissingArgument {
        command: command.to_string(),
        usage: usage.to_string(),
    })?;
    match arg.parse::<usize>() {
        Ok(position) if position > 0 => Ok(position),
        _ => Err(CommandError::InvalidPosition {
            command: command.to_string(),
            arg: arg.to_string(),
        }),
    }
}

/// Print help for the interactive session
pub fn print_help() {
    println!("\n{}", "Chat commands:".bold());
    println!("  /new              Start a new topic (clears chat, refreshes suggestions)");
    println!("  /clear            Clear the chat, keep suggestions");
    println!("  /up <n>           Toggle thumbs up on message n");
    println!("  /down <n>         Toggle thumbs down on message n");
    println!("  /prompts          List suggested prompts");
    println!("  /pick <n>         Send suggested prompt n");
    println!("  /history          Show the whole conversation");
    println!("  /feedback         Show the feedback form link");
    println!("  /status           Show session status");
    println!("  /help             Show this help");
    println!("  /exit             Leave the session\n");
}
