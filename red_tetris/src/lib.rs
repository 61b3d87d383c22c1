//! # red_tetris
//!
//! Server core of a multiplayer Tetris where every line you clear lands as
//! garbage on your opponents' boards.
//!
//! Players join rooms by name. The first player of a room leads it and starts
//! matches; everybody receives the same piece sequence and the last player standing
//! wins. Every room runs as its own task on top of [`tetris_arena`], and a
//! [`Dispatcher`] sits between client connections and rooms.

pub mod board;
pub mod config;
pub mod dispatcher;
pub mod piece;
pub mod player;
pub mod protocol;
pub mod render;
pub mod room;
pub mod tcp;

pub use board::{ActivePiece, Board, BoardId, Cell, Direction, SpeedMode, TickOutcome};
pub use config::{GameConfig, SpeedProfile};
pub use dispatcher::{ClientLink, Dispatcher, DispatcherHandle, Inbound};
pub use piece::{Piece, PieceKind, PieceQueue, RotationDirection};
pub use player::Player;
pub use protocol::{ClientMessage, JoinRejection, KeyPhase, RoomEvent, ServerEvent};
pub use render::{PlainTermStyle, TermRender};
pub use room::{Room, RoomCommand};
