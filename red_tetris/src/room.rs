//! Game room: lobby, match and winner bookkeeping for one room name

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tetris_arena::{ArenaError, ConnectionId, PlayerName, Result, RoomEngine, RoomName, RoomSender};

use crate::board::{Board, BoardId, Direction, SpeedMode, TickOutcome};
use crate::config::GameConfig;
use crate::player::Player;
use crate::protocol::{Audience, JoinRejection, RoomEvent, ServerEvent};

/// Commands handled by a room, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomCommand {
    Join {
        player: PlayerName,
        connection: ConnectionId,
    },
    LeaderStart {
        player: PlayerName,
        speed: Option<u32>,
    },
    Move {
        player: PlayerName,
        direction: Direction,
    },
    Rotate {
        player: PlayerName,
    },
    SetSpeedMode {
        player: PlayerName,
        mode: SpeedMode,
    },
    Disconnect {
        player: PlayerName,
    },
    /// Gravity step for one board, posted by its ticker
    Tick {
        player: PlayerName,
        board: BoardId,
    },
}

/// State of one room
///
/// A room is in the lobby until its leader starts a match, and goes back to the
/// lobby when the match ends. Players joining during a match wait and take part in
/// the next one.
pub struct Room {
    name: RoomName,
    config: GameConfig,
    players: Vec<Player>,
    waiters: Vec<Player>,
    is_playing: bool,
    match_size: usize,
    rng: StdRng,
    next_board_id: BoardId,
    events: flume::Sender<RoomEvent>,
    sender: RoomSender<RoomCommand>,
}

impl Room {
    pub fn new(
        name: RoomName,
        config: GameConfig,
        events: flume::Sender<RoomEvent>,
        sender: RoomSender<RoomCommand>,
        seed: u64,
    ) -> Self {
        Self {
            name,
            config,
            players: Vec::new(),
            waiters: Vec::new(),
            is_playing: false,
            match_size: 0,
            rng: StdRng::seed_from_u64(seed),
            next_board_id: 0,
            events,
            sender,
        }
    }

    pub fn name(&self) -> &RoomName {
        &self.name
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn waiters(&self) -> &[Player] {
        &self.waiters
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn leader(&self) -> Option<&PlayerName> {
        self.players.first().map(Player::name)
    }

    fn emit(&self, audience: Audience, event: ServerEvent) {
        let event = RoomEvent {
            room: self.name.clone(),
            audience,
            event,
        };
        if self.events.send(event).is_err() {
            tracing::trace!("Room '{}' has no event listener", self.name);
        }
    }

    fn emit_room_info(&self) {
        let names = |members: &[Player]| -> Vec<String> {
            members.iter().map(|p| p.name().to_string()).collect()
        };
        self.emit(
            Audience::All,
            ServerEvent::RoomInfo {
                room: self.name.to_string(),
                players: names(&self.players),
                waiters: names(&self.waiters),
                leader: self.leader().map(ToString::to_string),
                is_playing: self.is_playing,
            },
        );
    }

    fn publish_board(&self, index: usize) {
        let player = &self.players[index];
        self.emit(
            Audience::All,
            ServerEvent::BoardUpdated {
                player: player.name().to_string(),
                grid: player.board().snapshot(),
                spectrum: player.board().spectrum(),
            },
        );
    }

    fn publish_next_piece(&mut self, index: usize) {
        let player = &mut self.players[index];
        let piece = player.board_mut().next_piece();
        let event = ServerEvent::NextPiece {
            player: player.name().to_string(),
            piece,
        };
        self.emit(Audience::All, event);
    }

    fn allocate_board_id(&mut self) -> BoardId {
        let id = self.next_board_id;
        self.next_board_id += 1;
        id
    }

    fn player_index(&self, name: &PlayerName) -> Option<usize> {
        self.players.iter().position(|p| p.name() == name)
    }

    /// Add a member; players go to the lobby, or wait while a match runs
    pub fn add_player(&mut self, name: PlayerName, connection: ConnectionId) -> Result<()> {
        if self
            .players
            .iter()
            .chain(&self.waiters)
            .any(|p| p.name() == &name)
        {
            return Err(ArenaError::NameTaken {
                room: self.name.to_string(),
                player: name.to_string(),
            });
        }
        if let Some(max) = self.config.max_players {
            if self.players.len() + self.waiters.len() >= max {
                return Err(ArenaError::RoomFull(self.name.to_string()));
            }
        }

        let id = self.allocate_board_id();
        let key = self.rng.random();
        let board = Board::new(id, key, &self.config, self.config.speed_profile(None));
        let mut player = Player::new(name.clone(), board);

        let waiting = self.is_playing;
        let is_leader = !waiting && self.players.is_empty();
        player.set_leader(is_leader);
        if waiting {
            self.waiters.push(player);
        } else {
            self.players.push(player);
        }
        tracing::info!(
            "Player '{}' joined room '{}'{}",
            name,
            self.name,
            if waiting { " and waits for the next match" } else { "" }
        );

        self.emit(
            Audience::Connection(connection),
            ServerEvent::Joined {
                room: self.name.to_string(),
                player: name.to_string(),
                is_leader,
                waiting,
            },
        );
        self.emit_room_info();
        Ok(())
    }

    /// Start a match, only the leader can do it and only from the lobby
    pub fn leader_start_game(&mut self, name: &PlayerName, speed: Option<u32>) -> Result<()> {
        if self.is_playing {
            return Err(ArenaError::AlreadyPlaying);
        }
        if self.leader() != Some(name) {
            return Err(ArenaError::NotLeader(name.to_string()));
        }

        let key: u64 = self.rng.random();
        let speeds = self.config.speed_profile(speed);
        for index in 0..self.players.len() {
            let board_id = self.allocate_board_id();
            let player = &mut self.players[index];
            player.update_key(key, board_id, &self.config, speeds)?;
            if !player.board_mut().spawn_piece() {
                return Err(ArenaError::Invariant(format!(
                    "first piece does not fit on an empty board in room '{}'",
                    self.name
                )));
            }
            player.start_playing()?;

            let player_name = player.name().clone();
            player
                .board_mut()
                .start_gravity(self.sender.clone(), move || RoomCommand::Tick {
                    player: player_name.clone(),
                    board: board_id,
                });
        }
        self.is_playing = true;
        self.match_size = self.players.len();
        tracing::info!(
            "Match started in room '{}' with {} player(s)",
            self.name,
            self.match_size
        );

        self.emit(Audience::All, ServerEvent::GameStarted);
        for index in 0..self.players.len() {
            self.publish_next_piece(index);
            self.publish_board(index);
        }
        self.emit_room_info();
        Ok(())
    }

    /// Index of a player taking part in the running match
    fn active_player(&self, name: &PlayerName) -> Result<usize> {
        if !self.is_playing {
            return Err(ArenaError::NotPlaying);
        }
        let index = self
            .player_index(name)
            .ok_or_else(|| ArenaError::PlayerNotFound(name.to_string()))?;
        if !self.players[index].is_playing() {
            return Err(ArenaError::NotPlaying);
        }
        Ok(index)
    }

    fn move_piece(&mut self, name: &PlayerName, direction: Direction) -> Result<()> {
        let index = self.active_player(name)?;
        if self.players[index].board_mut().move_side(direction) {
            self.publish_board(index);
        }
        Ok(())
    }

    fn rotate_piece(&mut self, name: &PlayerName) -> Result<()> {
        let index = self.active_player(name)?;
        if self.players[index].board_mut().rotate_piece() {
            self.publish_board(index);
        }
        Ok(())
    }

    fn set_speed_mode(&mut self, name: &PlayerName, mode: SpeedMode) -> Result<()> {
        let index = self.active_player(name)?;
        self.players[index].board_mut().change_speed_mode(mode);
        Ok(())
    }

    fn tick(&mut self, name: &PlayerName, board_id: BoardId) -> Result<()> {
        let Some(index) = self.player_index(name) else {
            tracing::trace!("Tick for '{}' dropped, player left", name);
            return Ok(());
        };
        let player = &mut self.players[index];
        if !player.is_playing() || player.board().id() != board_id || player.board().is_frozen() {
            tracing::trace!("Stale tick for board {} of '{}' dropped", board_id, name);
            return Ok(());
        }

        let outcome = match player.board_mut().tick() {
            Ok(outcome) => outcome,
            Err(e) if e.is_fatal() => {
                tracing::error!(
                    "Board of '{}' in room '{}' failed with piece {:?}: {}",
                    name,
                    self.name,
                    self.players[index].board().active(),
                    e
                );
                self.player_died(index);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        match outcome {
            TickOutcome::Idle => {}
            TickOutcome::Fell => self.publish_board(index),
            TickOutcome::Locked { cleared } => {
                self.publish_board(index);
                self.publish_next_piece(index);
                self.send_garbage(index, cleared);
            }
            TickOutcome::ToppedOut { cleared } => {
                self.publish_board(index);
                // The player is out before its last rows reach anybody
                self.player_died(index);
                if self.is_playing {
                    self.send_garbage(index, cleared);
                }
            }
        }
        Ok(())
    }

    /// Push `count` garbage rows to every other playing board, in player order
    fn send_garbage(&mut self, from: usize, count: usize) {
        if count == 0 || !self.config.garbage {
            return;
        }
        let hole = self.rng.random_range(0..self.config.cols);
        let mut topped_out = Vec::new();
        for index in 0..self.players.len() {
            if index == from || !self.players[index].is_playing() {
                continue;
            }
            if !self.players[index].board_mut().add_garbage(count, hole) {
                topped_out.push(index);
            }
            self.publish_board(index);
        }
        tracing::debug!(
            "Room '{}': {} garbage row(s) from '{}'",
            self.name,
            count,
            self.players[from].name()
        );
        for index in topped_out {
            self.player_died(index);
        }
    }

    /// Record the death of a player and end the match if it decided a winner
    pub fn player_died(&mut self, index: usize) {
        let player = &mut self.players[index];
        if !player.gameover() {
            return;
        }
        tracing::info!(
            "Player '{}' lost in room '{}' after clearing {} row(s)",
            player.name(),
            self.name,
            player.board().lines_cleared()
        );
        tracing::debug!("Final board of '{}':\n{}", player.name(), player.board());
        let event = ServerEvent::PlayerLost {
            player: player.name().to_string(),
        };
        self.emit(Audience::All, event);

        let alive: Vec<usize> = (0..self.players.len())
            .filter(|&i| self.players[i].is_playing())
            .collect();
        match alive.as_slice() {
            [] => self.end_match(None),
            [winner] if self.match_size >= 2 => self.end_match(Some(*winner)),
            _ => {}
        }
    }

    fn end_match(&mut self, winner: Option<usize>) {
        let winner = winner.map(|index| self.players[index].name().to_string());
        for player in &mut self.players {
            player.gameover();
            player.board_mut().freeze();
        }
        self.is_playing = false;
        self.match_size = 0;

        // Members who waited are in the lobby for the next match
        self.players.append(&mut self.waiters);
        for (index, player) in self.players.iter_mut().enumerate() {
            player.set_leader(index == 0);
        }

        match &winner {
            Some(name) => tracing::info!("Match in room '{}' won by '{}'", self.name, name),
            None => tracing::info!("Match in room '{}' ended without winner", self.name),
        }
        self.emit(Audience::All, ServerEvent::GameOver { winner });
        self.emit_room_info();
    }

    /// Remove a member; a player leaving a match loses it first
    pub fn player_disconnect(&mut self, name: &PlayerName) -> Result<()> {
        if let Some(index) = self.waiters.iter().position(|p| p.name() == name) {
            self.waiters.remove(index);
            tracing::info!("Player '{}' left room '{}'", name, self.name);
            self.emit_room_info();
            return Ok(());
        }

        let index = self
            .player_index(name)
            .ok_or_else(|| ArenaError::PlayerNotFound(name.to_string()))?;
        self.player_died(index);
        // Dropping the player stops its gravity timer
        self.players.remove(index);
        for (index, player) in self.players.iter_mut().enumerate() {
            player.set_leader(index == 0);
        }
        tracing::info!("Player '{}' left room '{}'", name, self.name);
        if !self.is_empty() {
            self.emit_room_info();
        }
        Ok(())
    }
}

impl RoomEngine for Room {
    type Command = RoomCommand;

    fn handle(&mut self, command: RoomCommand) -> Result<()> {
        match command {
            RoomCommand::Join { player, connection } => {
                let result = self.add_player(player, connection);
                if let Err(e) = &result {
                    if let Some(reason) = JoinRejection::from_error(e) {
                        self.emit(
                            Audience::Connection(connection),
                            ServerEvent::InvalidName { reason },
                        );
                    }
                }
                result
            }
            RoomCommand::LeaderStart { player, speed } => self.leader_start_game(&player, speed),
            RoomCommand::Move { player, direction } => self.move_piece(&player, direction),
            RoomCommand::Rotate { player } => self.rotate_piece(&player),
            RoomCommand::SetSpeedMode { player, mode } => self.set_speed_mode(&player, mode),
            RoomCommand::Disconnect { player } => self.player_disconnect(&player),
            RoomCommand::Tick { player, board } => self.tick(&player, board),
        }
    }

    fn is_empty(&self) -> bool {
        self.players.is_empty() && self.waiters.is_empty()
    }

    fn shutdown(&mut self) {
        for player in self.players.iter_mut().chain(self.waiters.iter_mut()) {
            player.board_mut().freeze();
        }
        self.emit(
            Audience::All,
            ServerEvent::RoomDestroyed {
                room: self.name.to_string(),
            },
        );
    }
}
