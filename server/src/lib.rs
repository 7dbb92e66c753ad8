//! # Maze Race Server Library
//!
//! This library provides the authoritative server for the two-player maze race.
//! It arbitrates the lobby, generates the maze for each round, validates every
//! move and decides the winner. Clients only send commands and render whatever
//! the server reports.
//!
//! ## Core Responsibilities
//!
//! ### Lobby Arbitration
//! Handles the complete lifecycle of player connections:
//! - Role assignment (role 1 or 2, a third connection is answered with `FULL`)
//! - Display names and ready flags
//! - Start gating: only role 1 may start, and only when both players are ready
//! - Disconnection cleanup and role reuse
//!
//! ### Authoritative Movement
//! Positions are never taken from clients. Each `MOVE` is resolved against the
//! server's maze, both positions are broadcast after every move, and the first
//! player on the exit cell wins the round.
//!
//! ## Architecture Design
//!
//! ### Single-Writer Lobby Loop
//! All session state lives in one [`lobby::Lobby`] owned by the task running
//! [`network::Server::run`]. Connection tasks forward inbound lines over a
//! channel and the loop applies them one at a time. Outbound lines are queued
//! while the state change is applied, so every client sees broadcasts in the
//! order the changes happened.
//!
//! ### Per-Connection Tasks
//! Each accepted socket gets a reader task that blocks on the next line and a
//! writer task that drains the connection's outbound queue. Closing a socket
//! only ends that connection's tasks; the accept loop and the other player are
//! unaffected.
//!
//! ## Module Organization
//!
//! - `client_manager`: connection slots, roles, names and ready flags
//! - `config`: validated server configuration
//! - `game`: the current round (maze, players, winner)
//! - `lobby`: the command handlers and broadcast rules
//! - `network`: TCP accept loop, line reader/writer and the lobby loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 41x31 maze on the default port, seeded from the wall clock
//!     let config = ServerConfig::new("0.0.0.0", 5000, 41, 31, None)?;
//!     let server = Server::bind(&config).await?;
//!
//!     // Runs until a ServerHandle asks it to shut down
//!     server.run().await;
//!
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod game;
pub mod lobby;
pub mod network;
pub mod utils;
