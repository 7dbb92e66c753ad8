//! Player roles, grid positions and authoritative movement validation

use crate::maze::{Cell, MazeGrid};
use crate::protocol::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which of the two player slots a connection occupies
///
/// Role one is the host: it is the only role allowed to start a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    One,
    Two,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::One, Role::Two];

    /// Wire number of the role (1 or 2)
    pub fn number(self) -> u8 {
        match self {
            Role::One => 1,
            Role::Two => 2,
        }
    }

    pub fn from_number(number: u8) -> Option<Role> {
        match number {
            1 => Some(Role::One),
            2 => Some(Role::Two),
            _ => None,
        }
    }

    /// Zero-based slot index, used for fixed-size per-role arrays
    pub fn index(self) -> usize {
        match self {
            Role::One => 0,
            Role::Two => 1,
        }
    }

    pub fn is_host(self) -> bool {
        self == Role::One
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl FromStr for Role {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u8>()
            .ok()
            .and_then(Role::from_number)
            .ok_or_else(|| ProtocolError::InvalidArgument {
                command: "ROLE",
                value: s.to_string(),
            })
    }
}

/// Facing / movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Grid offset for one step; y grows downwards
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UP" => Ok(Direction::Up),
            "DOWN" => Ok(Direction::Down),
            "LEFT" => Ok(Direction::Left),
            "RIGHT" => Ok(Direction::Right),
            other => Err(ProtocolError::InvalidArgument {
                command: "MOVE",
                value: other.to_string(),
            }),
        }
    }
}

/// Integer cell coordinate; signed so a step off the top or left edge stays representable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Fixed entrance every player spawns on
    pub const START: Position = Position { x: 1, y: 1 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, direction: Direction) -> Position {
        let (dx, dy) = direction.delta();
        Position {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A player inside a running round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub role: Role,
    pub position: Position,
    pub facing: Direction,
}

impl Player {
    /// Creates a player on the entrance, facing down
    pub fn new(role: Role) -> Self {
        Self {
            role,
            position: Position::START,
            facing: Direction::default(),
        }
    }

    /// Puts the player back on the entrance for a new round
    pub fn reset(&mut self) {
        self.position = Position::START;
        self.facing = Direction::default();
    }

    /// Attempts a single step and reports whether the position changed
    ///
    /// The facing direction is always updated, even when the step is blocked.
    /// The step is accepted only if the target cell is inside the grid and is floor.
    pub fn try_move(&mut self, direction: Direction, grid: &MazeGrid) -> bool {
        self.facing = direction;

        let target = self.position.step(direction);
        if grid.cell_at(target) != Some(Cell::Floor) {
            return false;
        }

        self.position = target;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::{Maze, MazeDimensions};

    /// 5x5 grid with a single vertical corridor at x = 1 and an opening at (2, 1)
    fn corridor_grid() -> MazeGrid {
        #[rustfmt::skip]
        let digits = [
            0, 0, 0, 0, 0,
            0, 1, 1, 0, 0,
            0, 1, 0, 0, 0,
            0, 1, 0, 0, 0,
            0, 0, 0, 0, 0,
        ];
        let cells = digits
            .iter()
            .map(|&d| if d == 1 { Cell::Floor } else { Cell::Wall })
            .collect();
        MazeGrid::from_cells(5, 5, cells).unwrap()
    }

    #[test]
    fn test_role_numbers() {
        assert_eq!(Role::One.number(), 1);
        assert_eq!(Role::Two.number(), 2);
        assert_eq!(Role::from_number(1), Some(Role::One));
        assert_eq!(Role::from_number(2), Some(Role::Two));
        assert_eq!(Role::from_number(0), None);
        assert_eq!(Role::from_number(3), None);
        assert!(Role::One.is_host());
        assert!(!Role::Two.is_host());
        assert_eq!("2".parse::<Role>().unwrap(), Role::Two);
        assert!("x".parse::<Role>().is_err());
    }

    #[test]
    fn test_direction_parsing() {
        for direction in Direction::ALL {
            assert_eq!(direction.as_str().parse::<Direction>().unwrap(), direction);
        }
        assert!("up".parse::<Direction>().is_err());
        assert!("NORTH".parse::<Direction>().is_err());
        assert_eq!(Direction::default(), Direction::Down);
    }

    #[test]
    fn test_player_creation() {
        let player = Player::new(Role::Two);
        assert_eq!(player.role, Role::Two);
        assert_eq!(player.position, Position::new(1, 1));
        assert_eq!(player.facing, Direction::Down);
    }

    #[test]
    fn test_move_into_floor() {
        let grid = corridor_grid();
        let mut player = Player::new(Role::One);

        assert!(player.try_move(Direction::Down, &grid));
        assert_eq!(player.position, Position::new(1, 2));
        assert!(player.try_move(Direction::Up, &grid));
        assert!(player.try_move(Direction::Right, &grid));
        assert_eq!(player.position, Position::new(2, 1));
        assert_eq!(player.facing, Direction::Right);
    }

    #[test]
    fn test_blocked_move_updates_facing_only() {
        let grid = corridor_grid();
        let mut player = Player::new(Role::One);

        assert!(!player.try_move(Direction::Left, &grid));
        assert_eq!(player.position, Position::START);
        assert_eq!(player.facing, Direction::Left);

        assert!(!player.try_move(Direction::Up, &grid));
        assert_eq!(player.position, Position::START);
        assert_eq!(player.facing, Direction::Up);
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let grid = MazeGrid::from_cells(3, 3, vec![Cell::Floor; 9]).unwrap();

        let mut player = Player::new(Role::One);
        player.position = Position::new(0, 0);
        assert!(!player.try_move(Direction::Up, &grid));
        assert!(!player.try_move(Direction::Left, &grid));
        assert_eq!(player.position, Position::new(0, 0));

        player.position = Position::new(2, 2);
        assert!(!player.try_move(Direction::Down, &grid));
        assert!(!player.try_move(Direction::Right, &grid));
        assert_eq!(player.position, Position::new(2, 2));
    }

    #[test]
    fn test_every_move_is_one_floor_step_or_nothing() {
        let maze = Maze::generate(MazeDimensions::new(21, 15).unwrap(), 99);
        let grid = maze.grid();

        for y in -1..=grid.height() as i32 {
            for x in -1..=grid.width() as i32 {
                for direction in Direction::ALL {
                    let mut player = Player::new(Role::One);
                    player.position = Position::new(x, y);
                    let before = player.position;

                    if player.try_move(direction, grid) {
                        assert_eq!(player.position, before.step(direction));
                        assert_eq!(grid.cell_at(player.position), Some(Cell::Floor));
                    } else {
                        assert_eq!(player.position, before);
                    }
                    assert_eq!(player.facing, direction);
                }
            }
        }
    }

    #[test]
    fn test_reset() {
        let grid = corridor_grid();
        let mut player = Player::new(Role::One);
        player.try_move(Direction::Down, &grid);
        player.try_move(Direction::Left, &grid);

        player.reset();
        assert_eq!(player.position, Position::START);
        assert_eq!(player.facing, Direction::Down);
    }
}
