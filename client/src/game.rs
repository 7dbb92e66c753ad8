use log::debug;
use shared::{Direction, LobbySnapshot, MazeGrid, Position, Role, ServerEvent};

/// Where the client is in the session lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Connecting,
    Lobby,
    InGame,
    Finished,
    Rejected,
}

/// Local mirror of what the server has reported
///
/// Nothing here is authoritative: every field is overwritten by the next
/// server event that covers it.
#[derive(Debug, Clone, Default)]
pub struct ClientGameState {
    pub role: Option<Role>,
    pub phase: Phase,
    pub lobby: LobbySnapshot,
    pub grid: Option<MazeGrid>,
    pub exit: Option<Position>,
    pub positions: [Option<Position>; 2],
    pub winner: Option<Role>,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_server_event(&mut self, event: &ServerEvent) {
        match event {
            ServerEvent::Role(role) => {
                self.role = Some(*role);
                self.phase = Phase::Lobby;
            }
            ServerEvent::Full => {
                self.phase = Phase::Rejected;
            }
            ServerEvent::State(snapshot) => {
                self.lobby = snapshot.clone();
                // Losing the opponent ends any round on the server side
                if self.phase == Phase::InGame && !self.opponent_present() {
                    self.phase = Phase::Lobby;
                }
            }
            ServerEvent::Maze(grid) => {
                self.grid = Some(grid.clone());
                self.exit = None;
                self.positions = [None, None];
                self.winner = None;
            }
            ServerEvent::Exit(position) => {
                self.exit = Some(*position);
            }
            ServerEvent::Start => {
                self.phase = Phase::InGame;
            }
            ServerEvent::Position { role, position } => {
                self.positions[role.index()] = Some(*position);
            }
            ServerEvent::Win(role) => {
                self.winner = Some(*role);
                self.phase = Phase::Finished;
            }
        }
        debug!("Client phase after {:?}: {:?}", event_kind(event), self.phase);
    }

    pub fn is_host(&self) -> bool {
        self.role.map(Role::is_host).unwrap_or(false)
    }

    pub fn my_ready(&self) -> bool {
        self.role
            .map(|role| self.lobby.slot(role).ready)
            .unwrap_or(false)
    }

    pub fn my_position(&self) -> Option<Position> {
        self.positions[self.role?.index()]
    }

    fn opponent_present(&self) -> bool {
        Role::ALL
            .into_iter()
            .filter(|role| Some(*role) != self.role)
            .all(|role| self.lobby.slot(role).present)
    }

    /// First step of the shortest route from the local player to the exit
    pub fn hint(&self) -> Option<Direction> {
        let grid = self.grid.as_ref()?;
        let path = grid.find_path(self.my_position()?, self.exit?)?;
        path.first().copied()
    }

    /// Human readable line for an event, from this client's point of view
    pub fn describe(&self, event: &ServerEvent) -> String {
        let who = |role: Role| {
            let name = &self.lobby.slot(role).name;
            let label = if name.is_empty() {
                format!("Player {}", role)
            } else {
                format!("{} (player {})", name, role)
            };
            if Some(role) == self.role {
                format!("{} [you]", label)
            } else {
                label
            }
        };

        match event {
            ServerEvent::Role(role) => format!("Connected as player {}", role),
            ServerEvent::Full => "Server is full".to_string(),
            ServerEvent::State(snapshot) => {
                let slots: Vec<String> = Role::ALL
                    .into_iter()
                    .map(|role| {
                        let slot = snapshot.slot(role);
                        if !slot.present {
                            format!("P{}: -", role)
                        } else {
                            let ready = if slot.ready { "ready" } else { "not ready" };
                            format!("P{}: {} ({})", role, slot.name, ready)
                        }
                    })
                    .collect();
                let start = if snapshot.can_start { " | can start" } else { "" };
                format!("Lobby {}{}", slots.join(" | "), start)
            }
            ServerEvent::Maze(grid) => format!("Maze {}x{} received", grid.width(), grid.height()),
            ServerEvent::Exit(position) => format!("Exit at {}", position),
            ServerEvent::Start => "Race started!".to_string(),
            ServerEvent::Position { role, position } => format!("{} at {}", who(*role), position),
            ServerEvent::Win(role) => {
                if Some(*role) == self.role {
                    "You win!".to_string()
                } else {
                    format!("{} wins", who(*role))
                }
            }
        }
    }
}

fn event_kind(event: &ServerEvent) -> &'static str {
    match event {
        ServerEvent::Role(_) => "ROLE",
        ServerEvent::Full => "FULL",
        ServerEvent::State(_) => "STATE",
        ServerEvent::Maze(_) => "MAZE",
        ServerEvent::Exit(_) => "EXIT",
        ServerEvent::Start => "START",
        ServerEvent::Position { .. } => "POS",
        ServerEvent::Win(_) => "WIN",
    }
}
