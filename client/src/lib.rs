//! # Maze Race Client Library
//!
//! Headless terminal client for the maze race server. It connects over TCP,
//! turns typed commands into protocol lines and keeps a local mirror of the
//! session built from the server's events. The server is authoritative for
//! everything; the client never predicts moves.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! Local mirror of the lobby, the maze and both player positions, plus the
//! human readable rendering of each event and the `hint` path query.
//!
//! ### Input Module (`input`)
//! Maps terminal lines to actions: `w/a/s/d` movement shortcuts, a ready
//! toggle, word commands and raw protocol lines.
//!
//! ### Network Module (`network`)
//! Owns the connection and the select loop between server events and
//! terminal input. Events are printed as text or as JSON lines.
//!
//! ## Usage Example
//!
//! ```no_run
//! use client::network::Client;
//! use shared::ClientCommand;
//!
//! # async fn play() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = Client::connect("127.0.0.1:5000", false).await?;
//! client.send(&ClientCommand::Ready { ready: true }).await?;
//! while let Some(event) = client.recv().await? {
//!     println!("{}", client.game_state().describe(&event));
//! }
//! # Ok(())
//! # }
//! ```

pub mod game;
pub mod input;
pub mod network;
