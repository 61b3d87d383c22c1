use std::time::Duration;

use serde::{Deserialize, Serialize};
use tetris_arena::{ArenaError, Result, RoomSender, Ticker};

use crate::config::{GameConfig, SpeedProfile};
use crate::piece::{Piece, PieceKind, PieceQueue, RotationDirection};

/// Identifier of a board inside its room, changes every time a board is replaced
pub type BoardId = u64;

/// Column shifts tried in order when a rotation does not fit in place
const WALL_KICKS: [isize; 5] = [0, -1, 1, -2, 2];

/// One cell of the grid
///
/// `Filled` only appears in snapshots, it marks the falling piece. The grid itself
/// holds `Empty`, `Locked` and `Garbage` cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
pub enum Cell {
    Empty,
    Filled(PieceKind),
    Locked(PieceKind),
    Garbage,
}

impl Cell {
    /// Whether the cell blocks a piece
    pub fn is_occupied(&self) -> bool {
        !matches!(self, Cell::Empty)
    }
}

// Wire code: 0 empty, 1..=7 locked piece, 8 garbage, 11..=17 falling piece
impl From<Cell> for u8 {
    fn from(cell: Cell) -> u8 {
        match cell {
            Cell::Empty => 0,
            Cell::Locked(kind) => kind.code(),
            Cell::Garbage => 8,
            Cell::Filled(kind) => kind.code() + 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpeedMode {
    Normal,
    Fast,
    Sprint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Left,
    Right,
}

/// Falling piece and the grid position of its 4x4 box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivePiece {
    pub piece: Piece,
    pub row: isize,
    pub col: isize,
}

impl ActivePiece {
    /// Grid coordinates of the occupied cells
    pub fn cells(&self) -> impl Iterator<Item = (isize, isize)> + '_ {
        self.piece
            .cells()
            .iter()
            .map(move |&(r, c)| (self.row + r as isize, self.col + c as isize))
    }

    fn shifted(&self, rows: isize, cols: isize) -> Self {
        ActivePiece {
            piece: self.piece,
            row: self.row + rows,
            col: self.col + cols,
        }
    }
}

/// What a gravity step did to the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to move (frozen or no piece)
    Idle,
    /// Piece moved down one row
    Fell,
    /// Piece locked, rows were cleared and the next piece spawned
    Locked { cleared: usize },
    /// Piece locked but the next piece could not spawn
    ToppedOut { cleared: usize },
}

pub struct Board {
    id: BoardId,
    rows: usize,
    cols: usize,
    grid: Vec<Vec<Cell>>,
    active: Option<ActivePiece>,
    queue: PieceQueue,
    speed_mode: SpeedMode,
    speeds: SpeedProfile,
    frozen: bool,
    gravity: Option<Ticker>,
    lines_cleared: usize,
}

impl Board {
    /// Create an empty board whose pieces are drawn from the sequence of `key`
    pub fn new(id: BoardId, key: u64, config: &GameConfig, speeds: SpeedProfile) -> Self {
        Board {
            id,
            rows: config.rows,
            cols: config.cols,
            grid: vec![vec![Cell::Empty; config.cols]; config.rows],
            active: None,
            queue: PieceQueue::new(key),
            speed_mode: SpeedMode::Normal,
            speeds,
            frozen: false,
            gravity: None,
            lines_cleared: 0,
        }
    }

    pub fn id(&self) -> BoardId {
        self.id
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn active(&self) -> Option<&ActivePiece> {
        self.active.as_ref()
    }

    pub fn speed_mode(&self) -> SpeedMode {
        self.speed_mode
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Total number of rows cleared on this board
    pub fn lines_cleared(&self) -> usize {
        self.lines_cleared
    }

    /// Locked content of the grid, without the falling piece
    pub fn grid(&self) -> &[Vec<Cell>] {
        &self.grid
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.grid
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(Cell::Empty)
    }

    /// Upcoming piece
    pub fn next_piece(&mut self) -> PieceKind {
        self.queue.peek()
    }

    /// Current gravity period
    pub fn interval(&self) -> Duration {
        self.speeds.interval(self.speed_mode)
    }

    /// Check that every cell of `candidate` is inside the grid and empty
    fn fits(&self, candidate: &ActivePiece) -> bool {
        candidate.cells().all(|(row, col)| {
            row >= 0
                && col >= 0
                && (row as usize) < self.rows
                && (col as usize) < self.cols
                && !self.grid[row as usize][col as usize].is_occupied()
        })
    }

    /// Place the next queued piece at the top. Returns false if it is blocked
    pub fn spawn_piece(&mut self) -> bool {
        if self.frozen {
            return false;
        }
        let candidate = ActivePiece {
            piece: Piece::new(self.queue.pop()),
            row: 0,
            col: self.cols as isize / 2 - 2,
        };
        if self.fits(&candidate) {
            self.active = Some(candidate);
            true
        } else {
            self.active = None;
            false
        }
    }

    /// Shift the falling piece one column, invalid moves are ignored
    pub fn move_side(&mut self, direction: Direction) -> bool {
        if self.frozen {
            return false;
        }
        let Some(current) = self.active else {
            return false;
        };
        let delta = match direction {
            Direction::Left => -1,
            Direction::Right => 1,
        };
        let candidate = current.shifted(0, delta);
        if self.fits(&candidate) {
            self.active = Some(candidate);
            true
        } else {
            false
        }
    }

    /// Rotate the falling piece clockwise
    ///
    /// The rotated piece is tried in place, then shifted sideways; if no position
    /// fits, the board is left unchanged.
    pub fn rotate_piece(&mut self) -> bool {
        if self.frozen {
            return false;
        }
        let Some(current) = self.active else {
            return false;
        };
        let rotated = ActivePiece {
            piece: current
                .piece
                .with_rotation(current.piece.rotate(RotationDirection::Clockwise)),
            ..current
        };
        for kick in WALL_KICKS {
            let candidate = rotated.shifted(0, kick);
            if self.fits(&candidate) {
                self.active = Some(candidate);
                return true;
            }
        }
        false
    }

    /// Change the gravity mode, the timer picks up the new period at once
    pub fn change_speed_mode(&mut self, mode: SpeedMode) {
        if self.frozen {
            return;
        }
        self.speed_mode = mode;
        if let Some(gravity) = &self.gravity {
            gravity.set_period(self.interval());
        }
    }

    /// Start the repeating gravity timer that posts `make_tick()` into the room
    pub fn start_gravity<C, F>(&mut self, sender: RoomSender<C>, make_tick: F)
    where
        C: Send + 'static,
        F: FnMut() -> C + Send + 'static,
    {
        if self.frozen {
            return;
        }
        self.gravity = Some(Ticker::spawn(sender, self.interval(), make_tick));
    }

    /// Whether a gravity timer is attached and running
    pub fn has_gravity(&self) -> bool {
        self.gravity.as_ref().is_some_and(|g| g.is_alive())
    }

    /// Advance the falling piece one row, locking it when it cannot fall
    ///
    /// Locking clears the completed rows and spawns the next piece. A blocked spawn is
    /// reported as `ToppedOut`; the caller decides what a top-out means.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        if self.frozen {
            return Ok(TickOutcome::Idle);
        }
        let Some(current) = self.active else {
            return Ok(TickOutcome::Idle);
        };

        let below = current.shifted(1, 0);
        if self.fits(&below) {
            self.active = Some(below);
            return Ok(TickOutcome::Fell);
        }

        self.lock()?;
        let cleared = self.clear_full_rows();
        self.lines_cleared += cleared;
        if self.speed_mode == SpeedMode::Sprint {
            self.change_speed_mode(SpeedMode::Normal);
        }

        if self.spawn_piece() {
            Ok(TickOutcome::Locked { cleared })
        } else {
            Ok(TickOutcome::ToppedOut { cleared })
        }
    }

    /// Write the falling piece into the grid
    ///
    /// On failure the piece stays active so the faulty board can be inspected.
    fn lock(&mut self) -> Result<()> {
        let Some(current) = self.active else {
            return Ok(());
        };
        // All cells are checked before any is written
        let mut cells = Vec::with_capacity(4);
        for (row, col) in current.cells() {
            if row < 0 || col < 0 || row as usize >= self.rows || col as usize >= self.cols {
                return Err(ArenaError::Invariant(format!(
                    "board {} locks a piece outside the grid at ({}, {})",
                    self.id, row, col
                )));
            }
            let (row, col) = (row as usize, col as usize);
            if self.grid[row][col].is_occupied() {
                return Err(ArenaError::Invariant(format!(
                    "board {} locks a piece over an occupied cell at ({}, {})",
                    self.id, row, col
                )));
            }
            cells.push((row, col));
        }
        self.active = None;
        let cell = Cell::Locked(current.piece.kind());
        for (row, col) in cells {
            self.grid[row][col] = cell;
        }
        Ok(())
    }

    /// Indices of the rows where every column is occupied
    pub fn full_rows(&self) -> Vec<usize> {
        self.grid
            .iter()
            .enumerate()
            .filter(|(_, row)| row.iter().all(Cell::is_occupied))
            .map(|(index, _)| index)
            .collect()
    }

    /// Remove every complete row and shift the rows above down
    ///
    /// The whole grid is scanned before anything moves, so several rows completed by
    /// the same piece are all removed together. Returns the number of rows removed.
    fn clear_full_rows(&mut self) -> usize {
        let full = self.full_rows();
        if full.is_empty() {
            return 0;
        }
        let mut index = 0;
        self.grid.retain(|_| {
            let keep = !full.contains(&index);
            index += 1;
            keep
        });
        let mut grid = vec![vec![Cell::Empty; self.cols]; full.len()];
        grid.append(&mut self.grid);
        self.grid = grid;
        full.len()
    }

    /// Push `count` garbage rows in from the bottom
    ///
    /// Every garbage row is full except for the `hole` column. Rows pushed above the
    /// top are lost. A falling piece that now overlaps is lifted until it fits; if it
    /// cannot fit anywhere it is dropped and the next piece spawns in its place.
    /// Returns false if that spawn was blocked.
    pub fn add_garbage(&mut self, count: usize, hole: usize) -> bool {
        if self.frozen || count == 0 {
            return true;
        }
        let count = count.min(self.rows);
        let hole = hole % self.cols;

        self.grid.drain(0..count);
        for _ in 0..count {
            let mut row = vec![Cell::Garbage; self.cols];
            row[hole] = Cell::Empty;
            self.grid.push(row);
        }

        let Some(current) = self.active else {
            return true;
        };
        let mut candidate = current;
        while !self.fits(&candidate) {
            candidate = candidate.shifted(-1, 0);
            if candidate.cells().any(|(row, _)| row < 0) {
                self.active = None;
                return self.spawn_piece();
            }
        }
        self.active = Some(candidate);
        true
    }

    /// Stop the gravity timer and reject every further change. Idempotent
    pub fn freeze(&mut self) {
        if self.frozen {
            return;
        }
        self.frozen = true;
        if let Some(gravity) = self.gravity.take() {
            gravity.stop();
        }
    }

    /// Grid with the falling piece drawn as `Filled` cells
    pub fn snapshot(&self) -> Vec<Vec<Cell>> {
        let mut grid = self.grid.clone();
        if let Some(active) = &self.active {
            let cell = Cell::Filled(active.piece.kind());
            for (row, col) in active.cells() {
                if row >= 0 && col >= 0 && (row as usize) < self.rows && (col as usize) < self.cols {
                    grid[row as usize][col as usize] = cell;
                }
            }
        }
        grid
    }

    /// Height of the highest locked cell of every column
    pub fn spectrum(&self) -> Vec<usize> {
        (0..self.cols)
            .map(|col| {
                self.grid
                    .iter()
                    .position(|row| row[col].is_occupied())
                    .map_or(0, |top| self.rows - top)
            })
            .collect()
    }

    /// Number of occupied cells in the grid
    pub fn locked_count(&self) -> usize {
        self.grid
            .iter()
            .flatten()
            .filter(|cell| cell.is_occupied())
            .count()
    }

    #[cfg(test)]
    pub(crate) fn set_cell(&mut self, row: usize, col: usize, cell: Cell) {
        self.grid[row][col] = cell;
    }

    #[cfg(test)]
    pub(crate) fn set_active(&mut self, active: Option<ActivePiece>) {
        self.active = active;
    }
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board")
            .field("id", &self.id)
            .field("active", &self.active)
            .field("speed_mode", &self.speed_mode)
            .field("frozen", &self.frozen)
            .field("lines_cleared", &self.lines_cleared)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> Board {
        let config = GameConfig::default();
        Board::new(1, 42, &config, config.speed_profile(None))
    }

    fn place(board: &mut Board, kind: PieceKind, rotation: u8, row: isize, col: isize) {
        board.set_active(Some(ActivePiece {
            piece: Piece::new(kind).with_rotation(rotation),
            row,
            col,
        }));
    }

    /// Fill a row with locked cells, leaving the given columns empty
    fn fill_row(board: &mut Board, row: usize, holes: &[usize]) {
        for col in 0..board.cols() {
            if !holes.contains(&col) {
                board.set_cell(row, col, Cell::Locked(PieceKind::O));
            }
        }
    }

    fn in_bounds_and_free(board: &Board) -> bool {
        let active = board.active().unwrap();
        active.cells().all(|(r, c)| {
            r >= 0
                && c >= 0
                && (r as usize) < board.rows()
                && (c as usize) < board.cols()
                && !board.cell(r as usize, c as usize).is_occupied()
        })
    }

    #[test]
    fn test_new_board_is_empty() {
        let board = board();
        assert_eq!(board.rows(), 20);
        assert_eq!(board.cols(), 10);
        assert_eq!(board.locked_count(), 0);
        assert!(board.active().is_none());
        assert!(!board.is_frozen());
        assert_eq!(board.speed_mode(), SpeedMode::Normal);
    }

    #[test]
    fn test_spawn_uses_queue_order() {
        let mut board = board();
        let expected = board.next_piece();
        assert!(board.spawn_piece());
        let active = board.active().unwrap();
        assert_eq!(active.piece.kind(), expected);
        assert_eq!((active.row, active.col), (0, 3));
    }

    #[test]
    fn test_move_side_stops_at_walls() {
        let mut board = board();
        place(&mut board, PieceKind::T, 0, 0, 3);

        let mut moves = 0;
        while board.move_side(Direction::Left) {
            moves += 1;
            assert!(in_bounds_and_free(&board));
        }
        assert_eq!(moves, 3);
        assert_eq!(board.active().unwrap().col, 0);

        let mut moves = 0;
        while board.move_side(Direction::Right) {
            moves += 1;
            assert!(in_bounds_and_free(&board));
        }
        assert_eq!(moves, 7);
    }

    #[test]
    fn test_move_side_blocked_by_locked_cell() {
        let mut board = board();
        place(&mut board, PieceKind::O, 0, 10, 3);
        // O occupies columns 4 and 5
        board.set_cell(11, 6, Cell::Garbage);

        assert!(!board.move_side(Direction::Right));
        assert_eq!(board.active().unwrap().col, 3);
        assert!(board.move_side(Direction::Left));
    }

    #[test]
    fn test_rotate_in_open_space() {
        let mut board = board();
        place(&mut board, PieceKind::T, 0, 5, 3);

        assert!(board.rotate_piece());
        let active = board.active().unwrap();
        assert_eq!(active.piece.rotation(), 1);
        assert_eq!(active.col, 3);
        assert!(in_bounds_and_free(&board));
    }

    #[test]
    fn test_rotate_blocked_leaves_board_unchanged() {
        let mut board = board();
        place(&mut board, PieceKind::T, 0, 0, 3);
        // Rotated T needs row 2 whatever the kick
        fill_row(&mut board, 2, &[]);

        let before_active = *board.active().unwrap();
        let before_grid = board.snapshot();
        assert!(!board.rotate_piece());
        assert_eq!(*board.active().unwrap(), before_active);
        assert_eq!(board.snapshot(), before_grid);
    }

    #[test]
    fn test_rotate_kicks_off_the_wall() {
        let mut board = board();
        // Vertical I in the last column
        place(&mut board, PieceKind::I, 1, 5, 7);
        assert!(board.active().unwrap().cells().all(|(_, c)| c == 9));

        assert!(board.rotate_piece());
        let active = board.active().unwrap();
        assert_eq!(active.piece.rotation(), 0);
        assert_eq!(active.col, 6);
        assert!(in_bounds_and_free(&board));
    }

    #[test]
    fn test_tick_falls_then_locks() {
        let mut board = board();
        place(&mut board, PieceKind::O, 0, 17, 0);

        assert_eq!(board.tick().unwrap(), TickOutcome::Fell);
        assert_eq!(board.active().unwrap().row, 18);
        assert_eq!(board.tick().unwrap(), TickOutcome::Locked { cleared: 0 });

        assert_eq!(board.locked_count(), 4);
        assert_eq!(board.cell(19, 1), Cell::Locked(PieceKind::O));
        assert_eq!(board.cell(18, 2), Cell::Locked(PieceKind::O));
        // Next piece spawned at the top
        assert_eq!(board.active().unwrap().row, 0);
    }

    #[test]
    fn test_filling_last_hole_clears_bottom_row() {
        let mut board = board();
        fill_row(&mut board, 19, &[0]);
        board.set_cell(18, 5, Cell::Locked(PieceKind::T));
        // Vertical I dropping into column 0
        place(&mut board, PieceKind::I, 1, 15, -2);

        assert_eq!(board.tick().unwrap(), TickOutcome::Fell);
        let before = board.locked_count() + 4;
        assert_eq!(board.tick().unwrap(), TickOutcome::Locked { cleared: 1 });

        assert_eq!(board.locked_count(), before - board.cols());
        // Row above moved down by one
        assert_eq!(board.cell(19, 5), Cell::Locked(PieceKind::T));
        for row in 17..20 {
            assert_eq!(board.cell(row, 0), Cell::Locked(PieceKind::I));
        }
        assert_eq!(board.cell(16, 0), Cell::Empty);
        assert!(board.full_rows().is_empty());
        assert!(board.active().is_some());
        assert_eq!(board.lines_cleared(), 1);
    }

    #[test]
    fn test_non_adjacent_rows_cleared_in_one_tick() {
        let mut board = board();
        fill_row(&mut board, 16, &[0]);
        fill_row(&mut board, 18, &[0]);
        board.set_cell(17, 3, Cell::Locked(PieceKind::S));
        board.set_cell(19, 7, Cell::Locked(PieceKind::Z));
        place(&mut board, PieceKind::I, 1, 16, -2);

        let before = board.locked_count() + 4;
        assert_eq!(board.tick().unwrap(), TickOutcome::Locked { cleared: 2 });
        assert_eq!(board.locked_count(), before - 2 * board.cols());

        // Remaining rows keep their order at the bottom
        assert_eq!(board.cell(18, 0), Cell::Locked(PieceKind::I));
        assert_eq!(board.cell(18, 3), Cell::Locked(PieceKind::S));
        assert_eq!(board.cell(19, 0), Cell::Locked(PieceKind::I));
        assert_eq!(board.cell(19, 7), Cell::Locked(PieceKind::Z));
        assert_eq!(board.locked_count(), 4);
        for row in 0..18 {
            assert!(board.grid()[row].iter().all(|c| !c.is_occupied()));
        }
    }

    #[test]
    fn test_full_rows_matches_occupancy() {
        let mut board = board();
        fill_row(&mut board, 19, &[]);
        fill_row(&mut board, 17, &[4]);
        assert_eq!(board.full_rows(), vec![19]);
        for (index, row) in board.grid().iter().enumerate() {
            let occupied = row.iter().filter(|c| c.is_occupied()).count();
            assert_eq!(occupied == board.cols(), board.full_rows().contains(&index));
        }
    }

    #[test]
    fn test_blocked_spawn_tops_out() {
        let mut board = board();
        // Every spawn orientation covers (1, 4)
        board.set_cell(1, 4, Cell::Garbage);
        place(&mut board, PieceKind::O, 0, 18, 0);

        assert_eq!(board.tick().unwrap(), TickOutcome::ToppedOut { cleared: 0 });
        assert!(board.active().is_none());
    }

    #[test]
    fn test_lock_over_occupied_cell_is_invariant_violation() {
        let mut board = board();
        place(&mut board, PieceKind::O, 0, 18, 0);
        board.set_cell(19, 1, Cell::Garbage);

        let result = board.tick();
        assert!(matches!(result, Err(ArenaError::Invariant(_))));
        assert_eq!(board.locked_count(), 1);
        // The faulting piece is still drawn on the board
        assert_eq!(board.active().map(|a| a.row), Some(18));
        assert_eq!(board.snapshot()[18][1], Cell::Filled(PieceKind::O));
    }

    #[test]
    fn test_garbage_pushes_rows_up() {
        let mut board = board();
        board.set_cell(19, 2, Cell::Locked(PieceKind::J));
        board.set_cell(0, 0, Cell::Locked(PieceKind::L));

        assert!(board.add_garbage(2, 6));

        assert_eq!(board.cell(17, 2), Cell::Locked(PieceKind::J));
        for row in 18..20 {
            for col in 0..10 {
                let expected = if col == 6 { Cell::Empty } else { Cell::Garbage };
                assert_eq!(board.cell(row, col), expected);
            }
        }
        // Top row was pushed out
        assert_eq!(board.locked_count(), 1 + 2 * 9);
        assert_eq!(board.grid().len(), 20);
    }

    #[test]
    fn test_garbage_lifts_falling_piece() {
        let mut board = board();
        place(&mut board, PieceKind::O, 0, 18, 0);

        assert!(board.add_garbage(1, 9));
        let active = *board.active().unwrap();
        assert_eq!(active.row, 17);
        assert!(in_bounds_and_free(&board));
    }

    #[test]
    fn test_garbage_tops_out_when_no_piece_fits() {
        let mut board = board();
        // Stack up to row 2 with column 0 open, so no row is complete
        for row in 2..board.rows() {
            fill_row(&mut board, row, &[0]);
        }
        place(&mut board, PieceKind::O, 0, 0, 3);

        // The stack rises into row 1, the piece cannot be lifted and every spawn
        // orientation covers (1, 4)
        assert!(!board.add_garbage(1, 0));
        assert!(board.active().is_none());
        assert_eq!(board.cell(19, 0), Cell::Empty);
        assert_eq!(board.cell(1, 4), Cell::Locked(PieceKind::O));
    }

    #[test]
    fn test_garbage_row_can_be_cleared() {
        let mut board = board();
        assert!(board.add_garbage(1, 0));
        place(&mut board, PieceKind::I, 1, 15, -2);

        assert_eq!(board.tick().unwrap(), TickOutcome::Fell);
        assert_eq!(board.tick().unwrap(), TickOutcome::Locked { cleared: 1 });
        assert_eq!(board.locked_count(), 3);
    }

    #[test]
    fn test_speed_mode_changes_interval() {
        let mut board = board();
        assert_eq!(board.interval(), Duration::from_millis(1000));
        board.change_speed_mode(SpeedMode::Fast);
        assert_eq!(board.interval(), Duration::from_millis(50));
        board.change_speed_mode(SpeedMode::Normal);
        assert_eq!(board.interval(), Duration::from_millis(1000));
    }

    #[test]
    fn test_sprint_ends_when_piece_locks() {
        let mut board = board();
        place(&mut board, PieceKind::O, 0, 18, 0);
        board.change_speed_mode(SpeedMode::Sprint);
        assert_eq!(board.interval(), Duration::from_millis(10));

        assert!(matches!(board.tick().unwrap(), TickOutcome::Locked { .. }));
        assert_eq!(board.speed_mode(), SpeedMode::Normal);
    }

    #[test]
    fn test_frozen_board_ignores_everything() {
        let mut board = board();
        place(&mut board, PieceKind::T, 0, 5, 3);
        board.freeze();
        board.freeze();

        let before = *board.active().unwrap();
        assert!(!board.move_side(Direction::Left));
        assert!(!board.rotate_piece());
        assert_eq!(board.tick().unwrap(), TickOutcome::Idle);
        assert!(board.add_garbage(3, 0));
        board.change_speed_mode(SpeedMode::Fast);

        assert!(board.is_frozen());
        assert_eq!(*board.active().unwrap(), before);
        assert_eq!(board.locked_count(), 0);
        assert_eq!(board.speed_mode(), SpeedMode::Normal);
    }

    #[test]
    fn test_snapshot_overlays_falling_piece() {
        let mut board = board();
        place(&mut board, PieceKind::O, 0, 0, 3);

        let snapshot = board.snapshot();
        assert_eq!(snapshot[0][4], Cell::Filled(PieceKind::O));
        assert_eq!(snapshot[1][5], Cell::Filled(PieceKind::O));
        // The grid itself never holds the falling piece
        assert_eq!(board.cell(0, 4), Cell::Empty);
    }

    #[test]
    fn test_spectrum() {
        let mut board = board();
        board.set_cell(19, 0, Cell::Garbage);
        board.set_cell(15, 3, Cell::Locked(PieceKind::T));
        board.set_cell(18, 3, Cell::Locked(PieceKind::T));

        let spectrum = board.spectrum();
        assert_eq!(spectrum.len(), 10);
        assert_eq!(spectrum[0], 1);
        assert_eq!(spectrum[3], 5);
        assert_eq!(spectrum[9], 0);
    }

    #[test]
    fn test_cell_wire_codes() {
        assert_eq!(serde_json::to_string(&Cell::Empty).unwrap(), "0");
        assert_eq!(serde_json::to_string(&Cell::Locked(PieceKind::T)).unwrap(), "2");
        assert_eq!(serde_json::to_string(&Cell::Garbage).unwrap(), "8");
        assert_eq!(serde_json::to_string(&Cell::Filled(PieceKind::I)).unwrap(), "17");
    }

    #[tokio::test]
    async fn test_freeze_stops_gravity() {
        let mut board = board();
        let (sender, _rx) = RoomSender::<u32>::channel();
        board.start_gravity(sender, || 1);
        assert!(board.has_gravity());

        board.freeze();
        assert!(!board.has_gravity());
    }
}
