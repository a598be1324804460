use draw_poker::entities::HAND_SIZE;
use std::fmt;

/// Something the player typed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    /// Swap the cards at these 1-based positions. Empty means stand pat.
    Swap(Vec<usize>),
    Deal,
    /// Show the current hand again.
    Hand,
    Help,
    Quit,
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A swap position that isn't a number.
    InvalidPosition(String),
    /// A swap position outside `1..=5`.
    PositionOutOfRange(usize),
    /// The same position given twice.
    DuplicatePosition(usize),
    /// Unrecognized command.
    UnrecognizedCommand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPosition(value) => write!(
                f,
                "Invalid card position '{}'. Use numbers (e.g., 'swap 1 3')",
                value
            ),
            Self::PositionOutOfRange(position) => write!(
                f,
                "Card position {} is out of range. Positions go from 1 to {}",
                position, HAND_SIZE
            ),
            Self::DuplicatePosition(position) => {
                write!(f, "Card position {} was given more than once", position)
            }
            Self::UnrecognizedCommand(cmd) => write!(
                f,
                "Unrecognized command '{}'. Type 'help' to see available commands",
                cmd
            ),
        }
    }
}

impl std::error::Error for ParseError {}

pub const HELP: &str = "\
Commands:
  swap [N...]   Swap the cards at positions N (1-5); no positions stands pat
  deal          Deal a new round
  hand          Show your hand
  help          Show this help
  quit          Leave the game
";

/// Parse a command string into a Command.
///
/// # Examples
///
/// ```
/// use dp_client::commands::{Command, parse_command};
///
/// assert_eq!(parse_command("deal"), Ok(Command::Deal));
/// assert_eq!(parse_command("swap 1 4"), Ok(Command::Swap(vec![1, 4])));
/// assert_eq!(parse_command("stand"), Ok(Command::Swap(vec![])));
/// ```
pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let trimmed = input.trim();

    // Try single-word commands first
    match trimmed {
        "deal" => return Ok(Command::Deal),
        "hand" | "show" => return Ok(Command::Hand),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        "stand" => return Ok(Command::Swap(Vec::new())),
        _ => {}
    }

    let parts: Vec<&str> = trimmed.split_ascii_whitespace().collect();
    match parts.first() {
        Some(&"swap") => parse_swap_command(&parts[1..]),
        _ => Err(ParseError::UnrecognizedCommand(trimmed.to_string())),
    }
}

/// Parse swap positions: "swap [N...]"
fn parse_swap_command(positions: &[&str]) -> Result<Command, ParseError> {
    let mut parsed = Vec::with_capacity(positions.len());
    for value in positions {
        let position = value
            .parse::<usize>()
            .map_err(|_| ParseError::InvalidPosition(value.to_string()))?;
        if !(1..=HAND_SIZE).contains(&position) {
            return Err(ParseError::PositionOutOfRange(position));
        }
        if parsed.contains(&position) {
            return Err(ParseError::DuplicatePosition(position));
        }
        parsed.push(position);
    }
    Ok(Command::Swap(parsed))
}
