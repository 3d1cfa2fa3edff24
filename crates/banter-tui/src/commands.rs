// Copyright (c) 2025-2026 Banter Contributors
//
// SPDX-License-Identifier: MIT
//! Slash commands typed into the input line.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Stage an image file for the next message.
    Attach(PathBuf),
    /// Unstage the most recently attached file.
    Detach,
    /// Toggle voice dictation.
    Dictate,
    Quit,
}

/// Parse an input line as a slash command.
///
/// `None` means the line is not a command and should be sent as chat text;
/// `Some(Err(_))` is a user-facing message for a malformed or unknown one.
pub fn parse(input: &str) -> Option<Result<Command, String>> {
    let input = input.trim();
    if !input.starts_with('/') {
        return None;
    }
    let (name, rest) = match input.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (input, ""),
    };
    Some(match name {
        "/attach" => {
            if rest.is_empty() {
                Err("usage: /attach <path>".into())
            } else {
                Ok(Command::Attach(PathBuf::from(rest)))
            }
        }
        "/detach" => Ok(Command::Detach),
        "/dictate" => Ok(Command::Dictate),
        "/quit" | "/exit" => Ok(Command::Quit),
        other => Err(format!("unknown command: {other}")),
    })
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse("hello there"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn attach_takes_a_path_with_spaces() {
        assert_eq!(
            parse("/attach /tmp/my picture.png"),
            Some(Ok(Command::Attach(PathBuf::from("/tmp/my picture.png"))))
        );
    }

    #[test]
    fn attach_without_a_path_reports_usage() {
        assert!(matches!(parse("/attach"), Some(Err(_))));
    }

    #[test]
    fn bare_commands_parse() {
        assert_eq!(parse("/detach"), Some(Ok(Command::Detach)));
        assert_eq!(parse("/dictate"), Some(Ok(Command::Dictate)));
        assert_eq!(parse("/quit"), Some(Ok(Command::Quit)));
        assert_eq!(parse("/exit"), Some(Ok(Command::Quit)));
    }

    #[test]
    fn unknown_command_is_an_error_not_a_message() {
        assert!(matches!(parse("/frobnicate"), Some(Err(_))));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(parse("  /quit  "), Some(Ok(Command::Quit)));
    }
}
