//! Connection slots and role assignment for the two-player lobby
//!
//! This module tracks which connections currently hold a player role:
//! - Role assignment (lowest free role, at most two slots)
//! - Per-slot display name and ready flag
//! - Outbound line queues used for targeted sends and broadcasts
//! - The lobby snapshot that is broadcast as a `STATE` line
//!
//! The manager never touches sockets. Each slot owns the sending half of its
//! connection's outbound queue; dropping the slot closes that queue, which in
//! turn lets the connection's writer task finish and close the socket.

use log::{info, warn};
use shared::{LobbySnapshot, Role, ServerEvent, SlotSnapshot, MAX_PLAYERS};
use std::net::SocketAddr;
use tokio::sync::mpsc;

/// Identifier handed out by the accept loop, unique for the server's lifetime
pub type ConnectionId = u32;

/// Sending half of a connection's outbound line queue
pub type LineSender = mpsc::UnboundedSender<String>;

/// A connection that holds a player role
#[derive(Debug)]
pub struct ConnectionSlot {
    pub id: ConnectionId,
    pub role: Role,
    pub addr: SocketAddr,
    /// Display name set through `JOIN`
    pub name: String,
    /// Ready flag set through `READY`
    pub ready: bool,
    sender: LineSender,
}

impl ConnectionSlot {
    pub fn new(id: ConnectionId, role: Role, addr: SocketAddr, sender: LineSender) -> Self {
        Self {
            id,
            role,
            addr,
            name: String::new(),
            ready: false,
            sender,
        }
    }

    /// Queues an event for this connection
    ///
    /// Returns false if the connection's writer has already gone away; the
    /// reader side will report the disconnect on its own.
    pub fn send(&self, event: &ServerEvent) -> bool {
        if self.sender.send(event.to_string()).is_err() {
            warn!("Outbound queue for connection {} is closed", self.id);
            return false;
        }
        true
    }

    fn snapshot(&self) -> SlotSnapshot {
        SlotSnapshot {
            present: true,
            name: self.name.clone(),
            ready: self.ready,
        }
    }
}

/// Holds the zero to two connection slots of the lobby
#[derive(Debug, Default)]
pub struct ClientManager {
    slots: Vec<ConnectionSlot>,
}

impl ClientManager {
    pub fn new() -> Self {
        Self {
            slots: Vec::with_capacity(MAX_PLAYERS),
        }
    }

    /// Attempts to admit a connection
    ///
    /// Returns the lowest free role, or None when both roles are taken.
    pub fn add_client(
        &mut self,
        id: ConnectionId,
        addr: SocketAddr,
        sender: LineSender,
    ) -> Option<Role> {
        if self.slots.len() >= MAX_PLAYERS {
            return None;
        }

        let role = Role::ALL
            .into_iter()
            .find(|role| self.slot_for_role(*role).is_none())?;

        info!("Connection {} from {} assigned role {}", id, addr, role);
        self.slots.push(ConnectionSlot::new(id, role, addr, sender));
        Some(role)
    }

    /// Removes a connection, returning its slot if it held one
    pub fn remove_client(&mut self, id: ConnectionId) -> Option<ConnectionSlot> {
        let index = self.slots.iter().position(|slot| slot.id == id)?;
        let slot = self.slots.remove(index);
        info!("Connection {} released role {}", slot.id, slot.role);
        Some(slot)
    }

    pub fn get(&self, id: ConnectionId) -> Option<&ConnectionSlot> {
        self.slots.iter().find(|slot| slot.id == id)
    }

    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut ConnectionSlot> {
        self.slots.iter_mut().find(|slot| slot.id == id)
    }

    pub fn slot_for_role(&self, role: Role) -> Option<&ConnectionSlot> {
        self.slots.iter().find(|slot| slot.role == role)
    }

    pub fn role_of(&self, id: ConnectionId) -> Option<Role> {
        self.get(id).map(|slot| slot.role)
    }

    /// Current lobby state, with `can_start` derived from both slots
    pub fn snapshot(&self) -> LobbySnapshot {
        let slot = |role| {
            self.slot_for_role(role)
                .map(ConnectionSlot::snapshot)
                .unwrap_or_default()
        };
        LobbySnapshot::new(slot(Role::One), slot(Role::Two))
    }

    pub fn can_start(&self) -> bool {
        self.snapshot().can_start
    }

    /// Queues an event for every connected slot
    pub fn broadcast(&self, event: &ServerEvent) {
        for slot in &self.slots {
            slot.send(event);
        }
    }

    /// Queues an event for a single connection
    pub fn send_to(&self, id: ConnectionId, event: &ServerEvent) -> bool {
        self.get(id).map(|slot| slot.send(event)).unwrap_or(false)
    }

    /// Returns the number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
