/// Core identifier types for the tetris-arena library
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{ArenaError, Result};

/// Longest accepted room or player name, in characters
pub const MAX_NAME_LEN: usize = 32;

/// Validate that a string can be used as a room or player name
///
/// Names are compared case-sensitively, so no normalisation happens here.
fn validate(kind: &str, s: &str) -> Result<()> {
    if s.trim().is_empty() {
        return Err(ArenaError::InvalidName(format!("{} name cannot be empty", kind)));
    }

    if s.chars().count() > MAX_NAME_LEN {
        return Err(ArenaError::InvalidName(format!(
            "{} name '{}' is longer than {} characters",
            kind, s, MAX_NAME_LEN
        )));
    }

    if let Some(ch) = s.chars().find(|ch| ch.is_control()) {
        return Err(ArenaError::InvalidName(format!(
            "{} name '{}' contains control character {:?}",
            kind, s, ch
        )));
    }

    Ok(())
}

/// Unique key of a room in the registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomName(String);

impl RoomName {
    /// Create from a user supplied name, returns error if the name is not acceptable
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate("Room", &name)?;
        Ok(RoomName(name))
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Player name, unique inside one room
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerName(String);

impl PlayerName {
    /// Create from a user supplied name, returns error if the name is not acceptable
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate("Player", &name)?;
        Ok(PlayerName(name))
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlayerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<str> for PlayerName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PlayerName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Opaque handle of a client connection, assigned by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

impl ConnectionId {
    /// Allocate a new process-unique connection id
    pub fn generate() -> Self {
        ConnectionId(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap an id assigned elsewhere
    pub fn from_raw(raw: u64) -> Self {
        ConnectionId(raw)
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_name_valid() {
        let result = PlayerName::new("alice");
        assert!(result.is_ok());
        assert_eq!(result.unwrap().as_str(), "alice");
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let lower = PlayerName::new("alice").unwrap();
        let upper = PlayerName::new("Alice").unwrap();
        assert_ne!(lower, upper);
    }

    #[test]
    fn test_name_empty() {
        assert!(PlayerName::new("").is_err());
        assert!(RoomName::new("   ").is_err());
    }

    #[test]
    fn test_name_too_long() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(
            RoomName::new(long),
            Err(ArenaError::InvalidName(_))
        ));
        assert!(RoomName::new("x".repeat(MAX_NAME_LEN)).is_ok());
    }

    #[test]
    fn test_name_control_characters() {
        assert!(PlayerName::new("bad\nname").is_err());
        assert!(PlayerName::new("tab\there").is_err());
    }

    #[test]
    fn test_connection_ids_are_unique() {
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();
        assert_ne!(a, b);
        assert_eq!(ConnectionId::from_raw(7).to_string(), "conn#7");
    }
}
