//! # tetris-arena
//!
//! A small runtime for real-time multiplayer game rooms built on tokio.
//!
//! ## Overview
//!
//! Every room is owned by one task (an actor). Client input and timer ticks are
//! funneled into the room as commands over a channel and applied one at a time, so
//! the room state is never mutated concurrently. Rooms live in a [`Registry`] that
//! opens them on first use and drops them once they report themselves empty.
//!
//! ## Key Features
//!
//! - One serialized command queue per room
//! - Create-on-join / destroy-on-empty registry with stale-close protection
//! - Repeating [`Ticker`] timers with adjustable period and liveness flag
//! - Validated room and player names
//! - Support for custom room engines via trait
//!
//! ## Example
//!
//! ```rust,no_run
//! use tetris_arena::{ArenaConfig, Registry, Result, RoomEngine, RoomName, RoomSender};
//!
//! struct Lobby(usize);
//!
//! impl RoomEngine for Lobby {
//!     type Command = usize;
//!     fn handle(&mut self, joined: usize) -> Result<()> {
//!         self.0 += joined;
//!         Ok(())
//!     }
//!     fn is_empty(&self) -> bool {
//!         self.0 == 0
//!     }
//!     fn shutdown(&mut self) {}
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut registry = Registry::new(ArenaConfig::default(), |_: &RoomName, _: RoomSender<usize>| Lobby(0));
//!     let room = registry.get_or_create(&RoomName::new("lobby")?)?;
//!     room.send(1)?;
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod engine;
pub mod error;
pub mod registry;
pub mod room;
pub mod ticker;
pub mod types;

// Re-exports for convenience
pub use config::ArenaConfig;
pub use engine::{EngineFactory, RoomEngine};
pub use error::{ArenaError, Result};
pub use registry::Registry;
pub use room::{ClosedRoom, RoomHandle, RoomMessage, RoomSender};
pub use ticker::Ticker;
pub use types::{ConnectionId, PlayerName, RoomName, MAX_NAME_LEN};
