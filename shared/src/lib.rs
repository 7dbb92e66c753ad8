//! # Maze Race Shared Library
//!
//! Types and algorithms used by both the server and the client:
//!
//! - [`maze`]: seeded depth-first maze generation and grid queries
//! - [`player`]: roles, positions and the authoritative single-step move check
//! - [`protocol`]: the newline-delimited text protocol spoken over TCP
//!
//! Everything here is synchronous and free of I/O so it can be exercised
//! directly from unit tests.

pub mod maze;
pub mod player;
pub mod protocol;

pub use maze::{generate, Cell, Maze, MazeDimensions, MazeError, MazeGrid};
pub use player::{Direction, Player, Position, Role};
pub use protocol::{ClientCommand, LobbySnapshot, ProtocolError, ServerEvent, SlotSnapshot};

pub const DEFAULT_PORT: u16 = 5000;
pub const MAZE_WIDTH: usize = 41;
pub const MAZE_HEIGHT: usize = 31;
pub const MIN_MAZE_DIM: usize = 5;
pub const MAX_PLAYERS: usize = 2;
