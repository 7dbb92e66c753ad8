//! Seeded maze generation
//!
//! Mazes are carved with a randomized depth-first search over the odd-coordinate
//! lattice of the grid. Every lattice cell is entered exactly once, so the floor
//! cells form a spanning tree: there is exactly one simple path between any two
//! of them. The walk uses an explicit stack, so large grids cannot overflow.

use crate::player::{Direction, Position};
use crate::{MAZE_HEIGHT, MAZE_WIDTH, MIN_MAZE_DIM};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

/// Errors raised while building or decoding a maze
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MazeError {
    #[error("maze dimensions {width}x{height} are below the minimum of {min}x{min}")]
    TooSmall {
        width: usize,
        height: usize,
        min: usize,
    },
    #[error("expected {expected} cells for the grid, got {actual}")]
    CellCount { expected: usize, actual: usize },
    #[error("invalid cell value `{0}`")]
    InvalidCell(String),
    #[error("maze dimensions {width}x{height} are too large")]
    Oversized { width: usize, height: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Wall,
    Floor,
}

impl Cell {
    /// Wire digit: 0 for wall, 1 for floor
    pub fn digit(self) -> char {
        match self {
            Cell::Wall => '0',
            Cell::Floor => '1',
        }
    }

    pub fn from_digit(value: &str) -> Result<Cell, MazeError> {
        match value {
            "0" => Ok(Cell::Wall),
            "1" => Ok(Cell::Floor),
            other => Err(MazeError::InvalidCell(other.to_string())),
        }
    }
}

/// Validated generator dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MazeDimensions {
    width: usize,
    height: usize,
}

impl MazeDimensions {
    pub fn new(width: usize, height: usize) -> Result<Self, MazeError> {
        if width < MIN_MAZE_DIM || height < MIN_MAZE_DIM {
            return Err(MazeError::TooSmall {
                width,
                height,
                min: MIN_MAZE_DIM,
            });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }
}

impl Default for MazeDimensions {
    fn default() -> Self {
        Self {
            width: MAZE_WIDTH,
            height: MAZE_HEIGHT,
        }
    }
}

/// Row-major grid of cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MazeGrid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl MazeGrid {
    fn filled(width: usize, height: usize, cell: Cell) -> Self {
        Self {
            width,
            height,
            cells: vec![cell; width * height],
        }
    }

    /// Builds a grid from decoded cells, checking the cell count
    pub fn from_cells(width: usize, height: usize, cells: Vec<Cell>) -> Result<Self, MazeError> {
        let expected = width
            .checked_mul(height)
            .ok_or(MazeError::Oversized { width, height })?;
        if cells.len() != expected {
            return Err(MazeError::CellCount {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cell at a position, or None when the position lies outside the grid
    pub fn cell_at(&self, position: Position) -> Option<Cell> {
        if position.x < 0 || position.y < 0 {
            return None;
        }
        let (x, y) = (position.x as usize, position.y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.cells[y * self.width + x])
    }

    pub fn is_floor(&self, position: Position) -> bool {
        self.cell_at(position) == Some(Cell::Floor)
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        self.cells[y * self.width + x]
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        self.cells[y * self.width + x] = cell;
    }

    /// Shortest sequence of steps over floor cells from `from` to `to`
    pub fn find_path(&self, from: Position, to: Position) -> Option<Vec<Direction>> {
        if !self.is_floor(from) || !self.is_floor(to) {
            return None;
        }

        let index = |p: Position| p.y as usize * self.width + p.x as usize;
        let mut came_from: Vec<Option<(Position, Direction)>> = vec![None; self.cells.len()];
        let mut seen = vec![false; self.cells.len()];
        let mut queue = VecDeque::new();

        seen[index(from)] = true;
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            if current == to {
                let mut steps = Vec::new();
                let mut cursor = current;
                while let Some((previous, direction)) = came_from[index(cursor)] {
                    steps.push(direction);
                    cursor = previous;
                }
                steps.reverse();
                return Some(steps);
            }

            for direction in Direction::ALL {
                let next = current.step(direction);
                if self.is_floor(next) && !seen[index(next)] {
                    seen[index(next)] = true;
                    came_from[index(next)] = Some((current, direction));
                    queue.push_back(next);
                }
            }
        }

        None
    }
}

/// Lattice steps in the order up, right, down, left
const CARVE_STEPS: [(isize, isize); 4] = [(0, -2), (2, 0), (0, 2), (-2, 0)];

/// One pending cell of the depth-first carve
struct CarveFrame {
    x: usize,
    y: usize,
    steps: [(isize, isize); 4],
    next: usize,
}

impl CarveFrame {
    fn new(x: usize, y: usize, rng: &mut StdRng) -> Self {
        let mut steps = CARVE_STEPS;
        steps.shuffle(rng);
        Self {
            x,
            y,
            steps,
            next: 0,
        }
    }
}

/// A generated maze: the grid plus its single border exit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maze {
    grid: MazeGrid,
    exit: Position,
}

impl Maze {
    /// Generates a maze; identical seeds give identical mazes
    pub fn generate(dimensions: MazeDimensions, seed: u64) -> Self {
        let (width, height) = (dimensions.width(), dimensions.height());
        let mut rng = StdRng::seed_from_u64(seed);
        let mut grid = MazeGrid::filled(width, height, Cell::Wall);

        let start = Position::START;
        grid.set(start.x as usize, start.y as usize, Cell::Floor);

        let mut stack = vec![CarveFrame::new(start.x as usize, start.y as usize, &mut rng)];
        while let Some(frame) = stack.last_mut() {
            if frame.next == frame.steps.len() {
                stack.pop();
                continue;
            }

            let (dx, dy) = frame.steps[frame.next];
            frame.next += 1;

            let (x, y) = (frame.x as isize, frame.y as isize);
            let (nx, ny) = (x + dx, y + dy);
            if nx <= 0 || ny <= 0 || nx >= width as isize - 1 || ny >= height as isize - 1 {
                continue;
            }

            let (mx, my) = (((x + nx) / 2) as usize, ((y + ny) / 2) as usize);
            let (nx, ny) = (nx as usize, ny as usize);
            if grid.get(nx, ny) != Cell::Wall {
                continue;
            }

            grid.set(mx, my, Cell::Floor);
            grid.set(nx, ny, Cell::Floor);
            stack.push(CarveFrame::new(nx, ny, &mut rng));
        }

        let exit = Self::open_exit(&mut grid);
        Self { grid, exit }
    }

    /// Opens the right-hand border next to the lowest floor cell of the last inner column
    fn open_exit(grid: &mut MazeGrid) -> Position {
        let (width, height) = (grid.width, grid.height);
        let rows = || (1..height - 1).rev();

        let y = match rows().find(|&y| grid.get(width - 2, y) == Cell::Floor) {
            Some(y) => y,
            None => {
                // Even widths never carve column width - 2; bridge from the last lattice column.
                let y = rows()
                    .find(|&y| grid.get(width - 3, y) == Cell::Floor)
                    .unwrap_or(1);
                grid.set(width - 2, y, Cell::Floor);
                y
            }
        };

        grid.set(width - 1, y, Cell::Floor);
        Position::new(width as i32 - 1, y as i32)
    }

    pub fn grid(&self) -> &MazeGrid {
        &self.grid
    }

    pub fn exit(&self) -> Position {
        self.exit
    }

    pub fn width(&self) -> usize {
        self.grid.width
    }

    pub fn height(&self) -> usize {
        self.grid.height
    }
}

/// Validates the dimensions and generates a maze
pub fn generate(width: usize, height: usize, seed: u64) -> Result<Maze, MazeError> {
    Ok(Maze::generate(MazeDimensions::new(width, height)?, seed))
}
