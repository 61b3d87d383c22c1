//! Configuration for the room registry

/// Main configuration for an arena registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Maximum number of rooms open at the same time (None = unlimited)
    pub max_rooms: Option<usize>,
}

impl ArenaConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of rooms
    pub fn with_max_rooms(mut self, max_rooms: Option<usize>) -> Self {
        self.max_rooms = max_rooms;
        self
    }
}
