/// Error types for the tetris-arena library
use thiserror::Error;

/// Result type alias for arena operations
pub type Result<T> = std::result::Result<T, ArenaError>;

/// Errors that can occur in arena operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// Invalid room or player name provided
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Player name already used in the target room
    #[error("Player name '{player}' is already taken in room '{room}'")]
    NameTaken {
        /// Room that rejected the join
        room: String,
        /// Rejected player name
        player: String,
    },

    /// Room has no free slot for another player
    #[error("Room '{0}' is full")]
    RoomFull(String),

    /// Room is not known to the registry
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    /// Player is not a member of the room
    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    /// Operation reserved for the room leader
    #[error("Player '{0}' is not the room leader")]
    NotLeader(String),

    /// Operation not allowed while a match is running
    #[error("Match already in progress")]
    AlreadyPlaying,

    /// Operation requires a running match
    #[error("No match in progress")]
    NotPlaying,

    /// Room actor is gone and does not accept commands anymore
    #[error("Room closed: {0}")]
    RoomClosed(String),

    /// Server no longer accepts input
    #[error("Server is shutting down")]
    ShuttingDown,

    /// Registry refuses to open more rooms
    #[error("Room limit reached ({0})")]
    RoomLimit(usize),

    /// Configuration rejected at load time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal consistency fault
    #[error("Invariant violation: {0}")]
    Invariant(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

impl ArenaError {
    /// Whether the error means the state of the owner can no longer be trusted
    ///
    /// Rejected input and protocol misuse are not fatal, they are expected during play.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ArenaError::Invariant(_))
    }
}

impl From<std::io::Error> for ArenaError {
    fn from(err: std::io::Error) -> Self {
        ArenaError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_invariant_is_fatal() {
        assert!(ArenaError::Invariant("grid desync".to_string()).is_fatal());
        assert!(!ArenaError::AlreadyPlaying.is_fatal());
        assert!(!ArenaError::NotLeader("bob".to_string()).is_fatal());
        assert!(!ArenaError::RoomClosed("r1".to_string()).is_fatal());
    }

    #[test]
    fn test_name_taken_display() {
        let err = ArenaError::NameTaken {
            room: "r1".to_string(),
            player: "alice".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Player name 'alice' is already taken in room 'r1'"
        );
    }
}
