//! Client input translation from terminal lines to protocol commands

use crate::game::ClientGameState;
use shared::{ClientCommand, Direction, ProtocolError};

/// What the client should do with one line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    Send(ClientCommand),
    Hint,
    Help,
    Quit,
}

pub const HELP_TEXT: &str = "\
Commands:
  w/a/s/d       move up/left/down/right
  r             toggle ready
  start         start the round (player 1)
  name <name>   set your display name
  hint          show the next step towards the exit
  q             quit
Raw protocol lines (JOIN, READY, START, MOVE) are sent as typed.";

/// Maps terminal input to actions
///
/// Shortcuts are case-insensitive. Anything that is not a shortcut must be a
/// valid protocol command, so typos never reach the server.
pub struct InputManager;

impl InputManager {
    pub fn parse_line(line: &str, state: &ClientGameState) -> Result<InputAction, ProtocolError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(ProtocolError::Empty);
        }

        let (keyword, argument) = match trimmed.split_once(' ') {
            Some((keyword, rest)) => (keyword, Some(rest.trim())),
            None => (trimmed, None),
        };

        let shortcut = match (keyword.to_ascii_lowercase().as_str(), argument) {
            ("w", None) => Some(Self::step(Direction::Up)),
            ("a", None) => Some(Self::step(Direction::Left)),
            ("s", None) => Some(Self::step(Direction::Down)),
            ("d", None) => Some(Self::step(Direction::Right)),
            ("r", None) => Some(InputAction::Send(ClientCommand::Ready {
                ready: !state.my_ready(),
            })),
            ("start", None) => Some(InputAction::Send(ClientCommand::Start)),
            ("name", Some(name)) if !name.is_empty() => Some(InputAction::Send(ClientCommand::Join {
                name: name.to_string(),
            })),
            ("hint", None) => Some(InputAction::Hint),
            ("help" | "?", None) => Some(InputAction::Help),
            ("q" | "quit" | "exit", None) => Some(InputAction::Quit),
            _ => None,
        };

        match shortcut {
            Some(action) => Ok(action),
            None => ClientCommand::parse(trimmed).map(InputAction::Send),
        }
    }

    fn step(direction: Direction) -> InputAction {
        InputAction::Send(ClientCommand::Move { direction })
    }
}
