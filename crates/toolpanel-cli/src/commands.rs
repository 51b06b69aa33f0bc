//! Simulator console commands.

use std::str::FromStr;

use thiserror::Error;
use toolpanel_core::PositionId;
use toolpanel_hardware::traits::Key;

/// One line typed at the simulator prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Lift the tool at a position (sensor reads zero).
    Take(PositionId),

    /// Put the tool back (sensor reads full scale).
    Return(PositionId),

    /// Press keys on the keypad, one per scan.
    Keys(Vec<Key>),

    /// Print what the station is doing.
    Status,

    /// Print the command list.
    Help,

    /// Stop the station and exit.
    Quit,
}

/// Errors parsing a console line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}', type 'help'")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub const HELP: &str = "\
commands:
  take <position>     tool leaves its position
  return <position>   tool goes back to its position
  keys <symbols>      press keys, e.g. 'keys 4321#' ('*' erases)
  status              show what the station is doing
  help                show this list
  quit                stop the station";

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(CommandError::Empty)?;
        let rest: Vec<&str> = words.collect();
        let argument = rest.concat();

        let position = |name: &'static str| -> Result<PositionId, CommandError> {
            match rest.as_slice() {
                [] => Err(CommandError::MissingArgument(name)),
                [id] => PositionId::new(*id)
                    .map_err(|e| CommandError::InvalidArgument(e.to_string())),
                _ => Err(CommandError::InvalidArgument(format!(
                    "'{name}' takes one position"
                ))),
            }
        };

        match verb.to_ascii_lowercase().as_str() {
            "take" | "t" => Ok(Self::Take(position("take")?)),
            "return" | "r" => Ok(Self::Return(position("return")?)),
            "keys" | "k" => {
                if argument.is_empty() {
                    return Err(CommandError::MissingArgument("keys"));
                }
                let keys = argument
                    .chars()
                    .map(Key::from_symbol)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| CommandError::InvalidArgument(e.to_string()))?;
                Ok(Self::Keys(keys))
            }
            "status" | "s" => Ok(Self::Status),
            "help" | "h" | "?" => Ok(Self::Help),
            "quit" | "q" | "exit" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}
