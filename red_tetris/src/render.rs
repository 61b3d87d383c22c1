//! Text rendering of boards, used in logs and test failure output

use std::fmt;

use crate::board::{Board, Cell};

#[derive(Debug, Clone, PartialEq)]
pub enum TermCell {
    Grid(Cell),
    BorderVertical,
    BorderHorizontal,
    BorderCorner,
    Space,
    Message(String),
}

pub trait TermStyle {
    fn display<'a>(&self, cell: &'a TermCell) -> &'a str;
    fn width(&self, cell: &TermCell) -> usize;
}

pub trait TermRender {
    fn output(&self, style: &impl TermStyle) -> Vec<Vec<TermCell>>;

    fn render(&self, style: &impl TermStyle) -> Vec<String> {
        self.output(style)
            .iter()
            .map(|row| row.iter().map(|cell| style.display(cell)).collect())
            .collect()
    }
}

// Pad every line of the block with spaces up to the widest one
fn pad_block_right(block: &mut [Vec<TermCell>], style: &impl TermStyle) {
    let widths: Vec<usize> = block
        .iter()
        .map(|row| row.iter().map(|cell| style.width(cell)).sum())
        .collect();
    let width = widths.iter().copied().max().unwrap_or(0);
    for (row, line_width) in block.iter_mut().zip(widths) {
        row.extend(std::iter::repeat_n(TermCell::Space, width - line_width));
    }
}

pub struct PlainTermStyle;

impl TermStyle for PlainTermStyle {
    fn display<'a>(&self, cell: &'a TermCell) -> &'a str {
        match cell {
            TermCell::Grid(Cell::Empty) => "  ",
            TermCell::Grid(Cell::Garbage) => "##",
            TermCell::Grid(Cell::Filled(_)) => "<>",
            TermCell::Grid(Cell::Locked(_)) => "[]",
            TermCell::BorderVertical => "|",
            TermCell::BorderHorizontal => "--",
            TermCell::BorderCorner => "+",
            TermCell::Space => " ",
            TermCell::Message(s) => s.as_str(),
        }
    }

    fn width(&self, cell: &TermCell) -> usize {
        match cell {
            TermCell::Grid(_) | TermCell::BorderHorizontal => 2,
            TermCell::BorderVertical | TermCell::BorderCorner | TermCell::Space => 1,
            TermCell::Message(s) => s.len(),
        }
    }
}

/// Board inside a frame, with a banner over the middle row once frozen
pub struct FramedBoard<'a> {
    board: &'a Board,
}

impl<'a> FramedBoard<'a> {
    pub fn new(board: &'a Board) -> Self {
        Self { board }
    }
}

impl TermRender for FramedBoard<'_> {
    fn output(&self, style: &impl TermStyle) -> Vec<Vec<TermCell>> {
        let cols = self.board.cols();
        let mut grid: Vec<Vec<TermCell>> = self
            .board
            .snapshot()
            .into_iter()
            .map(|row| row.into_iter().map(TermCell::Grid).collect())
            .collect();
        if self.board.is_frozen() && !grid.is_empty() {
            let middle = grid.len() / 2;
            grid[middle] = vec![TermCell::Message(" Game Over".to_string())];
            pad_block_right(&mut grid, style);
        }

        let mut border = vec![TermCell::BorderCorner];
        border.extend(std::iter::repeat_n(TermCell::BorderHorizontal, cols));
        border.push(TermCell::BorderCorner);

        let mut lines = vec![border.clone()];
        for row in grid {
            let mut line = vec![TermCell::BorderVertical];
            line.extend(row);
            line.push(TermCell::BorderVertical);
            lines.push(line);
        }
        lines.push(border);
        lines
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in FramedBoard::new(self).render(&PlainTermStyle) {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::piece::PieceKind;

    fn board() -> Board {
        let config = GameConfig::default().with_size(4, 4);
        Board::new(1, 0, &config, config.speed_profile(None))
    }

    #[test]
    fn test_render_frame() {
        let mut board = board();
        board.set_cell(3, 0, Cell::Locked(PieceKind::T));
        board.set_cell(3, 3, Cell::Garbage);

        let lines = FramedBoard::new(&board).render(&PlainTermStyle);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "+--------+");
        assert_eq!(lines[4], "|[]    ##|");
        assert_eq!(lines[5], "+--------+");
    }

    #[test]
    fn test_frozen_board_shows_banner() {
        let config = GameConfig::default();
        let mut board = Board::new(1, 0, &config, config.speed_profile(None));
        board.freeze();

        let text = board.to_string();
        assert!(text.contains("Game Over"));
        let widths: Vec<usize> = text.lines().map(str::len).collect();
        assert!(widths.iter().all(|&w| w == widths[0]));
    }
}
