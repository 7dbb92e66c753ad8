//! Lobby state machine
//!
//! The lobby is the single owner of all session state: the connection slots,
//! their names and ready flags, and the running round. Every handler mutates
//! that state and queues the resulting broadcasts before returning, so callers
//! that run handlers one at a time (the server's message loop) get causally
//! ordered output on every connection for free.
//!
//! Invalid requests (unknown lines, START from role two or before both players
//! are ready, MOVE outside a round) are ignored without a reply.

use crate::client_manager::{ClientManager, ConnectionId, LineSender};
use crate::config::ServerConfig;
use crate::game::GameState;
use crate::utils::get_timestamp;
use log::{debug, info};
use shared::{ClientCommand, Direction, MazeDimensions, Role, ServerEvent};
use std::net::SocketAddr;

pub struct Lobby {
    clients: ClientManager,
    game_state: GameState,
    dimensions: MazeDimensions,
    base_seed: Option<u64>,
}

impl Lobby {
    pub fn new(dimensions: MazeDimensions, base_seed: Option<u64>) -> Self {
        Self {
            clients: ClientManager::new(),
            game_state: GameState::new(),
            dimensions,
            base_seed,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.dimensions, config.seed)
    }

    pub fn clients(&self) -> &ClientManager {
        &self.clients
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    /// Admits a new connection or turns it away
    ///
    /// An admitted connection receives its `ROLE` line, then everyone receives
    /// the updated `STATE`. A rejected connection receives `FULL` and nothing else.
    pub fn connect(
        &mut self,
        id: ConnectionId,
        addr: SocketAddr,
        sender: LineSender,
    ) -> Option<Role> {
        match self.clients.add_client(id, addr, sender.clone()) {
            Some(role) => {
                self.clients.send_to(id, &ServerEvent::Role(role));
                self.broadcast_state();
                Some(role)
            }
            None => {
                info!("Rejecting connection {} from {}: lobby is full", id, addr);
                if sender.send(ServerEvent::Full.to_string()).is_err() {
                    debug!("Connection {} went away before FULL was queued", id);
                }
                None
            }
        }
    }

    /// Removes a connection and tells the remaining player
    pub fn disconnect(&mut self, id: ConnectionId) {
        let Some(slot) = self.clients.remove_client(id) else {
            return;
        };

        if self.game_state.maze().is_some() {
            info!("Player {} left; ending the current round", slot.role);
            self.game_state.abandon();
        }
        self.broadcast_state();
    }

    /// Decodes and applies one inbound line; malformed lines are dropped
    pub fn handle_line(&mut self, id: ConnectionId, line: &str) {
        match ClientCommand::parse(line) {
            Ok(command) => self.handle_command(id, command),
            Err(e) => debug!("Ignoring line from connection {}: {}", id, e),
        }
    }

    pub fn handle_command(&mut self, id: ConnectionId, command: ClientCommand) {
        let Some(role) = self.clients.role_of(id) else {
            debug!("Ignoring command from unknown connection {}", id);
            return;
        };

        match command {
            ClientCommand::Join { name } => self.join(id, name),
            ClientCommand::Ready { ready } => self.set_ready(id, ready),
            ClientCommand::Start => self.start(role),
            ClientCommand::Move { direction } => self.move_player(role, direction),
        }
    }

    fn join(&mut self, id: ConnectionId, name: String) {
        if let Some(slot) = self.clients.get_mut(id) {
            info!("Player {} is now called {:?}", slot.role, name);
            slot.name = name;
        }
        self.broadcast_state();
    }

    fn set_ready(&mut self, id: ConnectionId, ready: bool) {
        if let Some(slot) = self.clients.get_mut(id) {
            debug!("Player {} ready: {}", slot.role, ready);
            slot.ready = ready;
        }
        self.broadcast_state();
    }

    fn start(&mut self, role: Role) {
        if !role.is_host() {
            debug!("Ignoring START from player {}", role);
            return;
        }
        if !self.clients.can_start() {
            debug!("Ignoring START: both players must be present and ready");
            return;
        }

        let seed = self.next_seed();
        let maze = self.game_state.start_round(self.dimensions, seed);
        let maze_event = ServerEvent::Maze(maze.grid().clone());
        let exit_event = ServerEvent::Exit(maze.exit());

        self.clients.broadcast(&maze_event);
        self.clients.broadcast(&exit_event);
        self.clients.broadcast(&ServerEvent::Start);
        self.broadcast_positions();
    }

    fn move_player(&mut self, role: Role, direction: Direction) {
        let Some(outcome) = self.game_state.apply_move(role, direction) else {
            debug!("Ignoring MOVE from player {}: no round in progress", role);
            return;
        };

        self.broadcast_positions();
        if let Some(winner) = outcome.winner {
            self.clients.broadcast(&ServerEvent::Win(winner));
        }
    }

    fn next_seed(&self) -> u64 {
        match self.base_seed {
            Some(seed) => seed.wrapping_add(self.game_state.round),
            None => get_timestamp(),
        }
    }

    fn broadcast_state(&self) {
        self.clients
            .broadcast(&ServerEvent::State(self.clients.snapshot()));
    }

    fn broadcast_positions(&self) {
        let Some(positions) = self.game_state.positions() else {
            return;
        };
        for role in Role::ALL {
            self.clients.broadcast(&ServerEvent::Position {
                role,
                position: positions[role.index()],
            });
        }
    }
}
