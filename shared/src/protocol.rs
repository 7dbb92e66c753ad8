//! Line-based text protocol
//!
//! Every frame is a single UTF-8 line. Clients send space separated commands
//! (`JOIN <name>`, `READY <0|1>`, `START`, `MOVE <dir>`); the server answers with
//! `|` separated events. Both directions are encoded through `Display` and decoded
//! through `FromStr`, so the server, the client and the tests share one codec.

use crate::maze::{Cell, MazeError, MazeGrid};
use crate::player::{Direction, Position, Role};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Reasons a line could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("empty line")]
    Empty,
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("missing argument for {0}")]
    MissingArgument(&'static str),
    #[error("invalid argument `{value}` for {command}")]
    InvalidArgument {
        command: &'static str,
        value: String,
    },
    #[error("{kind} line has {actual} fields, expected {expected}")]
    FieldCount {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    Maze(#[from] MazeError),
}

/// Commands sent by a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientCommand {
    Join { name: String },
    Ready { ready: bool },
    Start,
    Move { direction: Direction },
}

impl ClientCommand {
    /// Parses a command line; surrounding whitespace is ignored
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ProtocolError::Empty);
        }

        let (keyword, argument) = match line.split_once(' ') {
            Some((keyword, rest)) => (keyword, Some(rest.trim())),
            None => (line, None),
        };

        match keyword {
            "JOIN" => {
                let name = argument.ok_or(ProtocolError::MissingArgument("JOIN"))?;
                Ok(ClientCommand::Join {
                    name: name.to_string(),
                })
            }
            "READY" => match argument {
                Some("1") => Ok(ClientCommand::Ready { ready: true }),
                Some("0") => Ok(ClientCommand::Ready { ready: false }),
                Some(other) => Err(ProtocolError::InvalidArgument {
                    command: "READY",
                    value: other.to_string(),
                }),
                None => Err(ProtocolError::MissingArgument("READY")),
            },
            "START" => match argument {
                None => Ok(ClientCommand::Start),
                Some(other) => Err(ProtocolError::InvalidArgument {
                    command: "START",
                    value: other.to_string(),
                }),
            },
            "MOVE" => {
                let direction = argument.ok_or(ProtocolError::MissingArgument("MOVE"))?;
                Ok(ClientCommand::Move {
                    direction: direction.parse()?,
                })
            }
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

impl FromStr for ClientCommand {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClientCommand::parse(s)
    }
}

impl fmt::Display for ClientCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientCommand::Join { name } => write!(f, "JOIN {}", name),
            ClientCommand::Ready { ready } => write!(f, "READY {}", flag(*ready)),
            ClientCommand::Start => f.write_str("START"),
            ClientCommand::Move { direction } => write!(f, "MOVE {}", direction),
        }
    }
}

/// Lobby view of one role's slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub present: bool,
    pub name: String,
    pub ready: bool,
}

/// Aggregate lobby state as broadcast in `STATE` lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbySnapshot {
    pub players: [SlotSnapshot; 2],
    pub can_start: bool,
}

impl LobbySnapshot {
    /// Builds a snapshot and derives `can_start` from both slots
    pub fn new(player_one: SlotSnapshot, player_two: SlotSnapshot) -> Self {
        let can_start = [&player_one, &player_two]
            .iter()
            .all(|slot| slot.present && slot.ready);
        Self {
            players: [player_one, player_two],
            can_start,
        }
    }

    pub fn slot(&self, role: Role) -> &SlotSnapshot {
        &self.players[role.index()]
    }
}

/// Events sent by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerEvent {
    Role(Role),
    Full,
    State(LobbySnapshot),
    Maze(MazeGrid),
    Exit(Position),
    Start,
    Position { role: Role, position: Position },
    Win(Role),
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

fn parse_flag(kind: &'static str, value: &str) -> Result<bool, ProtocolError> {
    match value {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(ProtocolError::InvalidArgument {
            command: kind,
            value: other.to_string(),
        }),
    }
}

fn parse_number<T: FromStr>(kind: &'static str, value: &str) -> Result<T, ProtocolError> {
    value.parse().map_err(|_| ProtocolError::InvalidArgument {
        command: kind,
        value: value.to_string(),
    })
}

fn expect_fields(
    kind: &'static str,
    fields: &[&str],
    expected: usize,
) -> Result<(), ProtocolError> {
    if fields.len() != expected {
        return Err(ProtocolError::FieldCount {
            kind,
            expected,
            actual: fields.len(),
        });
    }
    Ok(())
}

/// Removes the field separator so names cannot shift the STATE layout
pub fn sanitize_name(name: &str) -> String {
    name.chars().filter(|c| *c != '|').collect()
}

fn position_kind(role: Role) -> &'static str {
    match role {
        Role::One => "P1_POS",
        Role::Two => "P2_POS",
    }
}

impl fmt::Display for ServerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerEvent::Role(role) => write!(f, "ROLE {}", role),
            ServerEvent::Full => f.write_str("FULL"),
            ServerEvent::State(snapshot) => {
                f.write_str("STATE")?;
                for slot in &snapshot.players {
                    write!(
                        f,
                        "|{}|{}|{}",
                        flag(slot.present),
                        sanitize_name(&slot.name),
                        flag(slot.ready)
                    )?;
                }
                write!(f, "|{}", flag(snapshot.can_start))
            }
            ServerEvent::Maze(grid) => {
                write!(f, "MAZE|{}|{}|", grid.width(), grid.height())?;
                let mut encoded = String::with_capacity(grid.cells().len() * 2);
                for (i, cell) in grid.cells().iter().enumerate() {
                    if i > 0 {
                        encoded.push(',');
                    }
                    encoded.push(cell.digit());
                }
                f.write_str(&encoded)
            }
            ServerEvent::Exit(position) => write!(f, "EXIT|{}|{}", position.x, position.y),
            ServerEvent::Start => f.write_str("START"),
            ServerEvent::Position { role, position } => {
                write!(f, "{}|{}|{}", position_kind(*role), position.x, position.y)
            }
            ServerEvent::Win(role) => write!(f, "WIN|{}", role),
        }
    }
}

impl FromStr for ServerEvent {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(|c| c == '\r' || c == '\n');
        if line.is_empty() {
            return Err(ProtocolError::Empty);
        }

        if let Some(role) = line.strip_prefix("ROLE ") {
            return Ok(ServerEvent::Role(role.trim().parse()?));
        }

        let fields: Vec<&str> = line.split('|').collect();
        match fields[0] {
            "FULL" => {
                expect_fields("FULL", &fields, 1)?;
                Ok(ServerEvent::Full)
            }
            "START" => {
                expect_fields("START", &fields, 1)?;
                Ok(ServerEvent::Start)
            }
            "STATE" => {
                expect_fields("STATE", &fields, 8)?;
                let slot = |offset: usize| -> Result<SlotSnapshot, ProtocolError> {
                    Ok(SlotSnapshot {
                        present: parse_flag("STATE", fields[offset])?,
                        name: fields[offset + 1].to_string(),
                        ready: parse_flag("STATE", fields[offset + 2])?,
                    })
                };
                Ok(ServerEvent::State(LobbySnapshot {
                    players: [slot(1)?, slot(4)?],
                    can_start: parse_flag("STATE", fields[7])?,
                }))
            }
            "MAZE" => {
                expect_fields("MAZE", &fields, 4)?;
                let width: usize = parse_number("MAZE", fields[1])?;
                let height: usize = parse_number("MAZE", fields[2])?;
                let cells = fields[3]
                    .split(',')
                    .map(Cell::from_digit)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ServerEvent::Maze(MazeGrid::from_cells(width, height, cells)?))
            }
            "EXIT" => {
                expect_fields("EXIT", &fields, 3)?;
                Ok(ServerEvent::Exit(Position::new(
                    parse_number("EXIT", fields[1])?,
                    parse_number("EXIT", fields[2])?,
                )))
            }
            kind @ ("P1_POS" | "P2_POS") => {
                let role = if kind == "P1_POS" { Role::One } else { Role::Two };
                expect_fields(position_kind(role), &fields, 3)?;
                Ok(ServerEvent::Position {
                    role,
                    position: Position::new(
                        parse_number(position_kind(role), fields[1])?,
                        parse_number(position_kind(role), fields[2])?,
                    ),
                })
            }
            "WIN" => {
                expect_fields("WIN", &fields, 2)?;
                Ok(ServerEvent::Win(fields[1].parse()?))
            }
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::generate;
    use crate::{MAZE_HEIGHT, MAZE_WIDTH};

    fn slot(present: bool, name: &str, ready: bool) -> SlotSnapshot {
        SlotSnapshot {
            present,
            name: name.to_string(),
            ready,
        }
    }

    #[test]
    fn test_parse_client_commands() {
        assert_eq!(
            ClientCommand::parse("JOIN Alice").unwrap(),
            ClientCommand::Join {
                name: "Alice".to_string()
            }
        );
        assert_eq!(
            ClientCommand::parse("  JOIN   Big Bob  \r\n").unwrap(),
            ClientCommand::Join {
                name: "Big Bob".to_string()
            }
        );
        assert_eq!(
            ClientCommand::parse("READY 1").unwrap(),
            ClientCommand::Ready { ready: true }
        );
        assert_eq!(
            ClientCommand::parse("READY 0").unwrap(),
            ClientCommand::Ready { ready: false }
        );
        assert_eq!(ClientCommand::parse("START").unwrap(), ClientCommand::Start);
        assert_eq!(
            ClientCommand::parse("MOVE LEFT").unwrap(),
            ClientCommand::Move {
                direction: Direction::Left
            }
        );
    }

    #[test]
    fn test_parse_rejects_malformed_commands() {
        assert_eq!(ClientCommand::parse("   "), Err(ProtocolError::Empty));
        assert_eq!(
            ClientCommand::parse("JOIN"),
            Err(ProtocolError::MissingArgument("JOIN"))
        );
        assert_eq!(
            ClientCommand::parse("READY"),
            Err(ProtocolError::MissingArgument("READY"))
        );
        assert!(matches!(
            ClientCommand::parse("READY yes"),
            Err(ProtocolError::InvalidArgument { command: "READY", .. })
        ));
        assert!(matches!(
            ClientCommand::parse("START now"),
            Err(ProtocolError::InvalidArgument { command: "START", .. })
        ));
        assert!(matches!(
            ClientCommand::parse("MOVE NORTH"),
            Err(ProtocolError::InvalidArgument { command: "MOVE", .. })
        ));
        assert_eq!(
            ClientCommand::parse("MOVE"),
            Err(ProtocolError::MissingArgument("MOVE"))
        );
        assert_eq!(
            ClientCommand::parse("DANCE"),
            Err(ProtocolError::UnknownCommand("DANCE".to_string()))
        );
        assert!(ClientCommand::parse("join Alice").is_err());
    }

    #[test]
    fn test_client_command_display() {
        let commands = [
            (ClientCommand::Join { name: "Eve".into() }, "JOIN Eve"),
            (ClientCommand::Ready { ready: true }, "READY 1"),
            (ClientCommand::Ready { ready: false }, "READY 0"),
            (ClientCommand::Start, "START"),
            (
                ClientCommand::Move {
                    direction: Direction::Up,
                },
                "MOVE UP",
            ),
        ];
        for (command, line) in commands {
            assert_eq!(command.to_string(), line);
        }
    }

    #[test]
    fn test_can_start_truth_table() {
        for bits in 0..16u8 {
            let p1_present = bits & 1 != 0;
            let p1_ready = bits & 2 != 0;
            let p2_present = bits & 4 != 0;
            let p2_ready = bits & 8 != 0;

            let snapshot = LobbySnapshot::new(
                slot(p1_present, "", p1_ready),
                slot(p2_present, "", p2_ready),
            );
            let expected = p1_present && p1_ready && p2_present && p2_ready;
            assert_eq!(snapshot.can_start, expected, "case {:04b}", bits);
        }
    }

    #[test]
    fn test_state_encoding() {
        let snapshot = LobbySnapshot::new(slot(true, "Ann", true), slot(false, "", false));
        assert_eq!(
            ServerEvent::State(snapshot).to_string(),
            "STATE|1|Ann|1|0||0|0"
        );
    }

    #[test]
    fn test_state_strips_separator_from_names() {
        let snapshot = LobbySnapshot::new(slot(true, "a|b||c", false), slot(true, "|", true));
        let line = ServerEvent::State(snapshot).to_string();
        assert_eq!(line, "STATE|1|abc|0|1||1|0");
        assert_eq!(line.split('|').count(), 8);
    }

    #[test]
    fn test_state_decoding() {
        let event: ServerEvent = "STATE|1|Ann Lee|1|1|Bo|0|0".parse().unwrap();
        match event {
            ServerEvent::State(snapshot) => {
                assert_eq!(snapshot.slot(Role::One).name, "Ann Lee");
                assert!(snapshot.slot(Role::One).ready);
                assert!(snapshot.slot(Role::Two).present);
                assert!(!snapshot.slot(Role::Two).ready);
                assert!(!snapshot.can_start);
            }
            other => panic!("Unexpected event {:?}", other),
        }
        assert!(matches!(
            "STATE|1|x|1".parse::<ServerEvent>(),
            Err(ProtocolError::FieldCount { kind: "STATE", .. })
        ));
    }

    #[test]
    fn test_maze_encoding() {
        let maze = generate(MAZE_WIDTH, MAZE_HEIGHT, 8).unwrap();
        let line = ServerEvent::Maze(maze.grid().clone()).to_string();

        let fields: Vec<&str> = line.split('|').collect();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0], "MAZE");
        assert_eq!(fields[1], "41");
        assert_eq!(fields[2], "31");

        let cells: Vec<&str> = fields[3].split(',').collect();
        assert_eq!(cells.len(), 1271);
        assert!(cells.iter().all(|c| *c == "0" || *c == "1"));
        // (1, 1) is row 1, column 1
        assert_eq!(cells[MAZE_WIDTH + 1], "1");
        assert_eq!(cells[0], "0");

        match line.parse::<ServerEvent>().unwrap() {
            ServerEvent::Maze(grid) => assert_eq!(&grid, maze.grid()),
            other => panic!("Unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_maze_decoding_rejects_bad_grids() {
        assert!(matches!(
            "MAZE|2|2|0,1,1".parse::<ServerEvent>(),
            Err(ProtocolError::Maze(MazeError::CellCount { .. }))
        ));
        assert!(matches!(
            "MAZE|2|2|0,1,1,7".parse::<ServerEvent>(),
            Err(ProtocolError::Maze(MazeError::InvalidCell(_)))
        ));
        assert!("MAZE|x|2|0,1".parse::<ServerEvent>().is_err());
        assert!(matches!(
            "MAZE|4294967296|4294967296|0".parse::<ServerEvent>(),
            Err(ProtocolError::Maze(MazeError::Oversized { .. }))
        ));
    }

    #[test]
    fn test_simple_event_lines() {
        let events = [
            (ServerEvent::Role(Role::One), "ROLE 1"),
            (ServerEvent::Role(Role::Two), "ROLE 2"),
            (ServerEvent::Full, "FULL"),
            (ServerEvent::Exit(Position::new(40, 29)), "EXIT|40|29"),
            (ServerEvent::Start, "START"),
            (
                ServerEvent::Position {
                    role: Role::One,
                    position: Position::new(1, 1),
                },
                "P1_POS|1|1",
            ),
            (
                ServerEvent::Position {
                    role: Role::Two,
                    position: Position::new(3, 5),
                },
                "P2_POS|3|5",
            ),
            (ServerEvent::Win(Role::Two), "WIN|2"),
        ];

        for (event, line) in events {
            assert_eq!(event.to_string(), line);
            assert_eq!(line.parse::<ServerEvent>().unwrap(), event);
        }
    }

    #[test]
    fn test_unknown_server_line() {
        assert!(matches!(
            "HELLO|1".parse::<ServerEvent>(),
            Err(ProtocolError::UnknownCommand(_))
        ));
        assert!("WIN|3".parse::<ServerEvent>().is_err());
        assert_eq!("".parse::<ServerEvent>(), Err(ProtocolError::Empty));
    }

    #[test]
    fn test_events_serialize_to_json() {
        let json = serde_json::to_string(&ServerEvent::Win(Role::One)).unwrap();
        assert_eq!(json, r#"{"Win":"One"}"#);
    }
}
