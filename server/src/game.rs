use log::{debug, info};
use shared::{Direction, Maze, MazeDimensions, Player, Position, Role};

/// Result of an accepted `MOVE`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Whether the mover's position changed
    pub moved: bool,
    /// Positions of both players after the move, indexed by role
    pub positions: [Position; 2],
    /// Set when this move ended the round
    pub winner: Option<Role>,
}

/// Authoritative round state: the maze and both players
#[derive(Debug, Clone, Default)]
pub struct GameState {
    pub round: u64,
    maze: Option<Maze>,
    players: Option<[Player; 2]>,
    winner: Option<Role>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a fresh maze and puts both players back on the entrance
    pub fn start_round(&mut self, dimensions: MazeDimensions, seed: u64) -> &Maze {
        self.round += 1;
        self.winner = None;

        match self.players.as_mut() {
            Some(players) => players.iter_mut().for_each(Player::reset),
            None => self.players = Some([Player::new(Role::One), Player::new(Role::Two)]),
        }

        let maze = Maze::generate(dimensions, seed);
        info!(
            "Round {} started with seed {} ({}x{}, exit at {})",
            self.round,
            seed,
            maze.width(),
            maze.height(),
            maze.exit()
        );
        self.maze.insert(maze)
    }

    /// Drops the maze so no further moves are accepted until the next start
    pub fn abandon(&mut self) {
        if self.maze.take().is_some() {
            info!("Round {} abandoned", self.round);
        }
        self.players = None;
        self.winner = None;
    }

    pub fn maze(&self) -> Option<&Maze> {
        self.maze.as_ref()
    }

    pub fn winner(&self) -> Option<Role> {
        self.winner
    }

    /// A round is running while a maze exists and nobody has won yet
    pub fn is_running(&self) -> bool {
        self.maze.is_some() && self.winner.is_none()
    }

    pub fn positions(&self) -> Option<[Position; 2]> {
        self.players
            .as_ref()
            .map(|players| [players[0].position, players[1].position])
    }

    pub fn player(&self, role: Role) -> Option<&Player> {
        self.players.as_ref().map(|players| &players[role.index()])
    }

    /// Applies a move for `role`
    ///
    /// Returns None when no round is running. Otherwise the move is validated
    /// against the maze and both players are checked against the exit.
    pub fn apply_move(&mut self, role: Role, direction: Direction) -> Option<MoveOutcome> {
        if !self.is_running() {
            return None;
        }
        let maze = self.maze.as_ref()?;
        let players = self.players.as_mut()?;

        let moved = players[role.index()].try_move(direction, maze.grid());
        debug!(
            "Player {} moved {}: {} -> {}",
            role,
            direction,
            if moved { "ok" } else { "blocked" },
            players[role.index()].position
        );

        let exit = maze.exit();
        let winner = players
            .iter()
            .find(|player| player.position == exit)
            .map(|player| player.role);

        if let Some(role) = winner {
            info!("Player {} reached the exit in round {}", role, self.round);
            self.winner = Some(role);
        }

        Some(MoveOutcome {
            moved,
            positions: [players[0].position, players[1].position],
            winner,
        })
    }
}
