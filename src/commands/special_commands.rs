//! Special commands parser for the interactive workspace
//!
//! This module parses the slash commands that can be entered at the
//! workspace prompt. Special commands allow users to:
//! - Select a language and inspect or replace the buffer
//! - Run or reset the buffer
//! - Toggle the theme
//! - Inspect chat history and presence
//! - Display help information
//! - Exit the session
//!
//! Command names are case-insensitive; their arguments are kept verbatim.
//! Anything that is not a command is sent as a chat message.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an argument it does not take
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed at the workspace prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Switch the editor language
    SelectLanguage(String),

    /// Show the language catalog
    ListLanguages,

    /// Print the current buffer
    ShowCode,

    /// Replace the buffer with inline text
    ///
    /// `\n` and `\t` escapes in the argument are expanded.
    Edit(String),

    /// Replace the buffer with the contents of a file
    Load(PathBuf),

    /// Execute the buffer
    Run,

    /// Restore the default snippet
    Reset,

    /// Flip between dark and light
    ToggleTheme,

    /// Print the chat history
    History,

    /// Show who is online
    Who,

    /// Display language, theme, run state and chat counters
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent as a chat message.
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns CommandError::UnknownCommand if input starts with "/" but is not a valid command.
/// Returns CommandError::UnsupportedArgument if a command that takes no argument receives one.
/// Returns CommandError::MissingArgument if a command requires an argument but none was provided.
///
/// # Examples
///
/// ```
/// use codechat::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// let cmd = parse_special_command("/lang python").unwrap();
/// assert_eq!(cmd, SpecialCommand::SelectLanguage("python".to_string()));
///
/// let cmd = parse_special_command("hello there").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();

    // Anything without a leading "/" is chat, including "exit"
    if !trimmed.starts_with('/') {
        return Ok(SpecialCommand::None);
    }

    let (name, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name.to_lowercase(), rest.trim()),
        None => (trimmed.to_lowercase(), ""),
    };

    let no_arg = |cmd: SpecialCommand| {
        if arg.is_empty() {
            Ok(cmd)
        } else {
            Err(CommandError::UnsupportedArgument {
                command: name.clone(),
                arg: arg.to_string(),
            })
        }
    };
    let missing = |usage: &str| CommandError::MissingArgument {
        command: name.clone(),
        usage: usage.to_string(),
    };

    match name.as_str() {
        "/lang" | "/language" => {
            if arg.is_empty() {
                Err(missing("/lang <language_id>"))
            } else {
                Ok(SpecialCommand::SelectLanguage(arg.to_string()))
            }
        }
        "/langs" | "/languages" => no_arg(SpecialCommand::ListLanguages),
        "/code" => no_arg(SpecialCommand::ShowCode),
        "/edit" => {
            if arg.is_empty() {
                Err(missing("/edit <code>"))
            } else {
                Ok(SpecialCommand::Edit(unescape(arg)))
            }
        }
        "/load" => {
            if arg.is_empty() {
                Err(missing("/load <path>"))
            } else {
                Ok(SpecialCommand::Load(PathBuf::from(arg)))
            }
        }
        "/run" => no_arg(SpecialCommand::Run),
        "/reset" => no_arg(SpecialCommand::Reset),
        "/theme" => no_arg(SpecialCommand::ToggleTheme),
        "/history" => no_arg(SpecialCommand::History),
        "/who" => no_arg(SpecialCommand::Who),
        "/status" => no_arg(SpecialCommand::ShowStatus),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(name.clone())),
    }
}

/// Expand `\n`, `\t` and `\\` escapes
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Display help text for special commands
pub fn print_help() {
    println!(
        r#"
Workspace Commands
==================

EDITOR:
  /lang <id>      - Switch language (loads its saved or default code)
  /langs          - List supported languages
  /code           - Show the current buffer
  /edit <code>    - Replace the buffer; use \n for line breaks
  /load <path>    - Replace the buffer with a file's contents
  /run            - Execute the buffer
  /reset          - Restore the language's default code

CHAT:
  <text>          - Send a chat message
  /history        - Show the conversation
  /who            - Show who is online

SESSION:
  /theme          - Toggle dark/light theme
  /status         - Show language, theme and run state
  /help           - Show this help message
  /?              - Same as /help
  /exit, /quit    - Exit the workspace

NOTES:
  - Command names are case-insensitive
  - Regular text (not starting with /) is sent to the chat, even "exit"
  - Results and replies appear as soon as they arrive
"#
    );
}
