use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Offset of one occupied cell inside the 4x4 piece box, as (row, col)
pub type CellOffset = (i8, i8);

/// The four occupied cells of a piece in one orientation
pub type Shape = [CellOffset; 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    O,
    T,
    J,
    L,
    S,
    Z,
    I,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::O,
        PieceKind::T,
        PieceKind::J,
        PieceKind::L,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::I,
    ];

    /// Number of distinct orientations
    pub fn rotation_count(&self) -> u8 {
        shapes(*self).len() as u8
    }

    /// Numeric code used on the wire, 1..=7
    pub fn code(&self) -> u8 {
        match self {
            PieceKind::O => 1,
            PieceKind::T => 2,
            PieceKind::J => 3,
            PieceKind::L => 4,
            PieceKind::S => 5,
            PieceKind::Z => 6,
            PieceKind::I => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationDirection {
    Clockwise,
    CounterClockwise,
}

// Orientations are listed clockwise, starting from the spawn orientation.
const O_SHAPES: [Shape; 1] = [[(0, 1), (0, 2), (1, 1), (1, 2)]];

const I_SHAPES: [Shape; 2] = [
    [(1, 0), (1, 1), (1, 2), (1, 3)],
    [(0, 2), (1, 2), (2, 2), (3, 2)],
];

const S_SHAPES: [Shape; 2] = [
    [(0, 1), (0, 2), (1, 0), (1, 1)],
    [(0, 1), (1, 1), (1, 2), (2, 2)],
];

const Z_SHAPES: [Shape; 2] = [
    [(0, 0), (0, 1), (1, 1), (1, 2)],
    [(0, 2), (1, 1), (1, 2), (2, 1)],
];

const T_SHAPES: [Shape; 4] = [
    [(0, 1), (1, 0), (1, 1), (1, 2)],
    [(0, 1), (1, 1), (1, 2), (2, 1)],
    [(1, 0), (1, 1), (1, 2), (2, 1)],
    [(0, 1), (1, 0), (1, 1), (2, 1)],
];

const J_SHAPES: [Shape; 4] = [
    [(0, 0), (1, 0), (1, 1), (1, 2)],
    [(0, 1), (0, 2), (1, 1), (2, 1)],
    [(1, 0), (1, 1), (1, 2), (2, 2)],
    [(0, 1), (1, 1), (2, 0), (2, 1)],
];

const L_SHAPES: [Shape; 4] = [
    [(0, 2), (1, 0), (1, 1), (1, 2)],
    [(0, 1), (1, 1), (2, 1), (2, 2)],
    [(1, 0), (1, 1), (1, 2), (2, 0)],
    [(0, 0), (0, 1), (1, 1), (2, 1)],
];

fn shapes(kind: PieceKind) -> &'static [Shape] {
    match kind {
        PieceKind::O => &O_SHAPES,
        PieceKind::T => &T_SHAPES,
        PieceKind::J => &J_SHAPES,
        PieceKind::L => &L_SHAPES,
        PieceKind::S => &S_SHAPES,
        PieceKind::Z => &Z_SHAPES,
        PieceKind::I => &I_SHAPES,
    }
}

/// One tetromino in a given orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Piece {
    kind: PieceKind,
    rotation: u8,
}

impl Piece {
    pub fn new(kind: PieceKind) -> Self {
        Piece { kind, rotation: 0 }
    }

    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    /// Next rotation index in `direction`, wrapping over the kind's orientation count
    pub fn rotate(&self, direction: RotationDirection) -> u8 {
        let count = self.kind.rotation_count();
        match direction {
            RotationDirection::Clockwise => (self.rotation + 1) % count,
            RotationDirection::CounterClockwise => (self.rotation + count - 1) % count,
        }
    }

    /// Same piece in another orientation
    pub fn with_rotation(&self, rotation: u8) -> Self {
        Piece {
            kind: self.kind,
            rotation: rotation % self.kind.rotation_count(),
        }
    }

    /// Occupied cells of the current orientation
    pub fn cells(&self) -> &'static Shape {
        &shapes(self.kind)[self.rotation as usize]
    }
}

/// 7-bag piece generator
///
/// Each bag holds every kind once in shuffled order. Two queues built from the same
/// key produce the same sequence, which is how all boards of one match are fed the
/// same pieces.
#[derive(Debug, Clone)]
pub struct PieceQueue {
    bag: Vec<PieceKind>,
    rng: StdRng,
}

impl PieceQueue {
    pub fn new(key: u64) -> Self {
        let mut queue = Self {
            bag: Vec::with_capacity(PieceKind::ALL.len()),
            rng: StdRng::seed_from_u64(key),
        };
        queue.refill();
        queue
    }

    // Bag is consumed from the back
    fn refill(&mut self) {
        let mut bag = PieceKind::ALL.to_vec();
        bag.shuffle(&mut self.rng);
        bag.reverse();
        self.bag = bag;
    }

    /// Take the next piece
    pub fn pop(&mut self) -> PieceKind {
        if self.bag.is_empty() {
            self.refill();
        }
        self.bag.pop().unwrap_or(PieceKind::I)
    }

    /// Upcoming piece without taking it
    pub fn peek(&mut self) -> PieceKind {
        if self.bag.is_empty() {
            self.refill();
        }
        self.bag.last().copied().unwrap_or(PieceKind::I)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_rotation_counts() {
        assert_eq!(PieceKind::O.rotation_count(), 1);
        assert_eq!(PieceKind::I.rotation_count(), 2);
        assert_eq!(PieceKind::S.rotation_count(), 2);
        assert_eq!(PieceKind::Z.rotation_count(), 2);
        assert_eq!(PieceKind::T.rotation_count(), 4);
        assert_eq!(PieceKind::J.rotation_count(), 4);
        assert_eq!(PieceKind::L.rotation_count(), 4);
    }

    #[test]
    fn test_rotate_wraps() {
        let t = Piece::new(PieceKind::T);
        assert_eq!(t.rotate(RotationDirection::Clockwise), 1);
        assert_eq!(t.rotate(RotationDirection::CounterClockwise), 3);
        assert_eq!(t.with_rotation(3).rotate(RotationDirection::Clockwise), 0);

        let o = Piece::new(PieceKind::O);
        assert_eq!(o.rotate(RotationDirection::Clockwise), 0);

        let i = Piece::new(PieceKind::I).with_rotation(1);
        assert_eq!(i.rotate(RotationDirection::Clockwise), 0);
    }

    #[test]
    fn test_rotate_does_not_change_piece() {
        let piece = Piece::new(PieceKind::L);
        let _ = piece.rotate(RotationDirection::Clockwise);
        assert_eq!(piece.rotation(), 0);
    }

    #[test]
    fn test_shapes_have_four_distinct_cells_in_box() {
        for kind in PieceKind::ALL {
            for rotation in 0..kind.rotation_count() {
                let cells = Piece::new(kind).with_rotation(rotation).cells();
                let unique: HashSet<_> = cells.iter().collect();
                assert_eq!(unique.len(), 4, "{:?} rotation {}", kind, rotation);
                assert!(cells
                    .iter()
                    .all(|&(r, c)| (0..4).contains(&r) && (0..4).contains(&c)));
            }
        }
    }

    #[test]
    fn test_codes_are_distinct() {
        let codes: HashSet<_> = PieceKind::ALL.iter().map(|k| k.code()).collect();
        assert_eq!(codes.len(), 7);
        assert!(codes.iter().all(|&c| (1..=7).contains(&c)));
    }

    #[test]
    fn test_bag_contains_each_kind_once() {
        let mut queue = PieceQueue::new(42);
        for _ in 0..3 {
            let bag: HashSet<_> = (0..7).map(|_| queue.pop()).collect();
            assert_eq!(bag.len(), 7);
        }
    }

    #[test]
    fn test_same_key_same_sequence() {
        let mut a = PieceQueue::new(7);
        let mut b = PieceQueue::new(7);
        let seq_a: Vec<_> = (0..30).map(|_| a.pop()).collect();
        let seq_b: Vec<_> = (0..30).map(|_| b.pop()).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn test_peek_matches_next() {
        let mut queue = PieceQueue::new(3);
        for _ in 0..10 {
            let peeked = queue.peek();
            assert_eq!(queue.pop(), peeked);
        }
    }
}
