use tetris_arena::{ArenaError, PlayerName, Result};

use crate::board::{Board, BoardId};
use crate::config::{GameConfig, SpeedProfile};

/// Member of a room and owner of one board
#[derive(Debug)]
pub struct Player {
    name: PlayerName,
    is_leader: bool,
    is_playing: bool,
    board: Board,
}

impl Player {
    pub fn new(name: PlayerName, board: Board) -> Self {
        Self {
            name,
            is_leader: false,
            is_playing: false,
            board,
        }
    }

    pub fn name(&self) -> &PlayerName {
        &self.name
    }

    pub fn is_leader(&self) -> bool {
        self.is_leader
    }

    pub fn set_leader(&mut self, is_leader: bool) {
        self.is_leader = is_leader;
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// Replace the board with a fresh one fed by the piece sequence of `key`
    pub fn update_key(
        &mut self,
        key: u64,
        board_id: BoardId,
        config: &GameConfig,
        speeds: SpeedProfile,
    ) -> Result<()> {
        if self.is_playing {
            return Err(ArenaError::AlreadyPlaying);
        }
        // Dropping the previous board stops its gravity timer
        self.board = Board::new(board_id, key, config, speeds);
        Ok(())
    }

    /// Enter the match on the current board
    pub fn start_playing(&mut self) -> Result<()> {
        if self.is_playing {
            return Err(ArenaError::AlreadyPlaying);
        }
        self.is_playing = true;
        Ok(())
    }

    /// End this player's match
    ///
    /// Returns true only for the call that actually ended it; later calls are
    /// ignored so a death is never counted twice.
    pub fn gameover(&mut self) -> bool {
        if !self.is_playing {
            tracing::debug!("Game over for '{}' ignored, not playing", self.name);
            return false;
        }
        self.is_playing = false;
        self.board.freeze();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        let config = GameConfig::default();
        let board = Board::new(0, 1, &config, config.speed_profile(None));
        Player::new(PlayerName::new("alice").unwrap(), board)
    }

    #[test]
    fn test_gameover_once_per_life() {
        let mut player = player();
        assert!(!player.gameover());

        player.start_playing().unwrap();
        assert!(player.gameover());
        assert!(!player.is_playing());
        assert!(player.board().is_frozen());
        assert!(!player.gameover());
    }

    #[test]
    fn test_update_key_rejected_while_playing() {
        let config = GameConfig::default();
        let mut player = player();
        player.start_playing().unwrap();

        let result = player.update_key(9, 5, &config, config.speed_profile(None));
        assert_eq!(result, Err(ArenaError::AlreadyPlaying));
        assert_eq!(player.board().id(), 0);
    }

    #[test]
    fn test_update_key_replaces_board() {
        let config = GameConfig::default();
        let mut player = player();
        player.start_playing().unwrap();
        player.gameover();

        player
            .update_key(9, 5, &config, config.speed_profile(Some(2)))
            .unwrap();
        let board = player.board();
        assert_eq!(board.id(), 5);
        assert!(!board.is_frozen());
        assert_eq!(board.locked_count(), 0);
        assert_eq!(board.interval(), std::time::Duration::from_millis(500));
    }
}
