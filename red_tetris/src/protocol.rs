//! Messages exchanged with clients
//!
//! Both directions are JSON objects tagged by a `type` field, for instance
//! `{"type":"move","direction":"left"}` or `{"type":"gameOver","winner":"alice"}`.

use serde::{Deserialize, Serialize};
use tetris_arena::{ArenaError, ConnectionId, RoomName};

use crate::board::{Cell, Direction, SpeedMode};
use crate::piece::PieceKind;

/// Message received from a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    Join {
        room: String,
        player: String,
    },
    LeaderStart {
        #[serde(default)]
        speed: Option<u32>,
    },
    Move {
        direction: Direction,
    },
    Rotate,
    SetSpeedMode {
        mode: SpeedMode,
    },
    /// Raw key event, translated by the dispatcher
    Keyboard {
        phase: KeyPhase,
        key: String,
    },
    Disconnect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyPhase {
    Down,
    Up,
}

/// Why a join was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JoinRejection {
    NameTaken,
    Malformed,
    RoomFull,
}

impl JoinRejection {
    /// Reason to report for a failed join, None if the error is not the client's fault
    pub fn from_error(err: &ArenaError) -> Option<Self> {
        match err {
            ArenaError::NameTaken { .. } => Some(JoinRejection::NameTaken),
            ArenaError::InvalidName(_) => Some(JoinRejection::Malformed),
            ArenaError::RoomFull(_) | ArenaError::RoomLimit(_) => Some(JoinRejection::RoomFull),
            _ => None,
        }
    }
}

/// Message sent to a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    Joined {
        room: String,
        player: String,
        is_leader: bool,
        waiting: bool,
    },
    RoomInfo {
        room: String,
        players: Vec<String>,
        waiters: Vec<String>,
        leader: Option<String>,
        is_playing: bool,
    },
    BoardUpdated {
        player: String,
        grid: Vec<Vec<Cell>>,
        spectrum: Vec<usize>,
    },
    NextPiece {
        player: String,
        piece: PieceKind,
    },
    GameStarted,
    PlayerLost {
        player: String,
    },
    GameOver {
        winner: Option<String>,
    },
    InvalidName {
        reason: JoinRejection,
    },
    RoomDestroyed {
        room: String,
    },
}

/// Recipients of a room event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Every member of the room
    All,
    /// One connection, joined or still joining
    Connection(ConnectionId),
}

/// Event published by a room, routed by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomEvent {
    pub room: RoomName,
    pub audience: Audience,
    pub event: ServerEvent,
}

/// Game input derived from a key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Move(Direction),
    Rotate,
    Speed(SpeedMode),
}

/// Translate a key event, None for keys without a binding in that phase
pub fn key_input(phase: KeyPhase, key: &str) -> Option<KeyInput> {
    match (phase, key) {
        (KeyPhase::Down, "ArrowLeft") => Some(KeyInput::Move(Direction::Left)),
        (KeyPhase::Down, "ArrowRight") => Some(KeyInput::Move(Direction::Right)),
        (KeyPhase::Down, "ArrowUp") => Some(KeyInput::Rotate),
        (KeyPhase::Down, "ArrowDown") => Some(KeyInput::Speed(SpeedMode::Fast)),
        (KeyPhase::Down, " ") => Some(KeyInput::Speed(SpeedMode::Sprint)),
        (KeyPhase::Up, "ArrowDown") => Some(KeyInput::Speed(SpeedMode::Normal)),
        _ => None,
    }
}
