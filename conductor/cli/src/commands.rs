//! Line Commands
//!
//! Parses one line of learner input into a [`TutorEvent`].

use lesson_core::{DeckId, TutorEvent};
use thiserror::Error;

/// Help text printed for `help`
pub const HELP: &str = "\
Commands:
  deck <id>|none   select a deck (or clear the selection)
  next, n          next slide
  prev, p          previous slide
  explain, e       ask the teacher to explain this slide
  ask <question>   ask the tutor anything
  show             print the current session
  quit, q          leave";

/// A parsed input line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Forward to the conductor
    Event(TutorEvent),
    /// Print [`HELP`]
    Help,
    /// Blank line
    Empty,
}

/// Input that isn't a command
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// First word not recognised
    #[error("Unknown command '{0}' (try 'help')")]
    Unknown(String),

    /// `deck` without a usable argument
    #[error("Usage: deck <id>|none")]
    BadDeck,

    /// `ask` without a question
    #[error("Usage: ask <question>")]
    MissingQuestion,
}

/// Parse one line of input
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(w, r)| (w, r.trim()));

    let event = match word.to_ascii_lowercase().as_str() {
        "" => return Ok(Command::Empty),
        "help" | "h" | "?" => return Ok(Command::Help),
        "deck" => match rest {
            "" => return Err(CommandError::BadDeck),
            "none" | "-" => TutorEvent::SelectDeck { deck_id: None },
            id => TutorEvent::SelectDeck {
                deck_id: Some(id.parse::<DeckId>().map_err(|_| CommandError::BadDeck)?),
            },
        },
        "next" | "n" => TutorEvent::NextSlide,
        "prev" | "previous" | "p" => TutorEvent::PreviousSlide,
        "explain" | "e" => TutorEvent::ExplainSlide,
        "ask" => {
            if rest.is_empty() {
                return Err(CommandError::MissingQuestion);
            }
            TutorEvent::AskQuestion {
                question: rest.to_string(),
            }
        }
        "show" => TutorEvent::RequestSnapshot,
        "quit" | "q" | "exit" => TutorEvent::QuitRequested,
        other => return Err(CommandError::Unknown(other.to_string())),
    };

    Ok(Command::Event(event))
}
