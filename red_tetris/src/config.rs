//! Configuration of the game rules

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tetris_arena::{ArenaError, Result};

use crate::board::SpeedMode;

/// Main configuration for rooms and boards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Board height
    pub rows: usize,

    /// Board width
    pub cols: usize,

    /// Gravity period at speed 1 (in milliseconds)
    pub normal_interval_ms: u64,

    /// Gravity period while the down key is held (in milliseconds)
    pub fast_interval_ms: u64,

    /// Gravity period after a drop, until the piece locks (in milliseconds)
    pub sprint_interval_ms: u64,

    /// Highest speed accepted from the leader
    pub max_speed: u32,

    /// Whether cleared rows are sent as garbage to the opponents
    pub garbage: bool,

    /// Maximum number of players and waiters per room (None = unlimited)
    pub max_players: Option<usize>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: 20,
            cols: 10,
            normal_interval_ms: 1000,
            fast_interval_ms: 50,
            sprint_interval_ms: 10,
            max_speed: 10,
            garbage: true,
            max_players: None,
        }
    }
}

impl GameConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file; missing fields keep their default
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: GameConfig =
            serde_json::from_str(&text).map_err(|e| ArenaError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the board cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.cols < 4 || self.rows < 4 {
            return Err(ArenaError::InvalidConfig(format!(
                "board must be at least 4x4, got {}x{}",
                self.rows, self.cols
            )));
        }
        if self.fast_interval_ms == 0 || self.sprint_interval_ms == 0 || self.normal_interval_ms == 0
        {
            return Err(ArenaError::InvalidConfig(
                "gravity intervals must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Set the board size
    pub fn with_size(mut self, rows: usize, cols: usize) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    /// Set the gravity periods in milliseconds
    pub fn with_intervals_ms(mut self, normal: u64, fast: u64, sprint: u64) -> Self {
        self.normal_interval_ms = normal;
        self.fast_interval_ms = fast;
        self.sprint_interval_ms = sprint;
        self
    }

    /// Set the highest accepted speed
    pub fn with_max_speed(mut self, max_speed: u32) -> Self {
        self.max_speed = max_speed.max(1);
        self
    }

    /// Enable or disable garbage rows
    pub fn with_garbage(mut self, garbage: bool) -> Self {
        self.garbage = garbage;
        self
    }

    /// Set the maximum number of members per room
    pub fn with_max_players(mut self, max_players: Option<usize>) -> Self {
        self.max_players = max_players;
        self
    }

    /// Gravity periods for a match started at `speed`
    ///
    /// Missing or out of range speeds are clamped to `1..=max_speed`.
    pub fn speed_profile(&self, speed: Option<u32>) -> SpeedProfile {
        let speed = u64::from(speed.unwrap_or(1).clamp(1, self.max_speed.max(1)));
        let fast = Duration::from_millis(self.fast_interval_ms);
        let normal = Duration::from_millis(self.normal_interval_ms / speed).max(fast);
        SpeedProfile {
            normal,
            fast,
            sprint: Duration::from_millis(self.sprint_interval_ms),
        }
    }
}

/// Gravity period per speed mode for one board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedProfile {
    pub normal: Duration,
    pub fast: Duration,
    pub sprint: Duration,
}

impl SpeedProfile {
    pub fn interval(&self, mode: SpeedMode) -> Duration {
        match mode {
            SpeedMode::Normal => self.normal,
            SpeedMode::Fast => self.fast,
            SpeedMode::Sprint => self.sprint,
        }
    }
}

impl Default for SpeedProfile {
    fn default() -> Self {
        GameConfig::default().speed_profile(None)
    }
}
