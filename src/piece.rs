//! Tetrominoes: base shapes, rotation forms, spawn placement and the piece randomizer.

use crate::Randomizer;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::LazyLock;

/// Locked-block colour identifier, 1..=7 (0 is never stored).
pub type ColorId = u8;

/// Tetromino kinds (I, O, S, Z, J, L, T).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TetrominoKind {
    I,
    O,
    S,
    Z,
    J,
    L,
    T,
}

impl TetrominoKind {
    pub const ALL: [Self; 7] = [Self::I, Self::O, Self::S, Self::Z, Self::J, Self::L, Self::T];

    /// Fixed colour per kind: I=1, O=2, S=3, Z=4, J=5, L=6, T=7.
    pub fn color_id(self) -> ColorId {
        self.index() as ColorId + 1
    }

    #[inline]
    fn index(self) -> usize {
        match self {
            Self::I => 0,
            Self::O => 1,
            Self::S => 2,
            Self::Z => 3,
            Self::J => 4,
            Self::L => 5,
            Self::T => 6,
        }
    }

    /// Spawn orientation, rows top to bottom.
    fn base_rows(self) -> &'static [&'static [u8]] {
        match self {
            Self::I => &[&[1, 1, 1, 1]],
            Self::O => &[&[1, 1], &[1, 1]],
            Self::S => &[&[0, 1, 1], &[1, 1, 0]],
            Self::Z => &[&[1, 1, 0], &[0, 1, 1]],
            Self::J => &[&[1, 0, 0], &[1, 1, 1]],
            Self::L => &[&[0, 0, 1], &[1, 1, 1]],
            Self::T => &[&[0, 1, 0], &[1, 1, 1]],
        }
    }

    /// Shape after `rotation` clockwise quarter turns.
    pub fn shape(self, rotation: u8) -> &'static Shape {
        &SHAPES[self.index()][(rotation % 4) as usize]
    }
}

/// All four rotation forms of every kind, derived once from the base shapes.
static SHAPES: LazyLock<[[Shape; 4]; 7]> = LazyLock::new(|| {
    std::array::from_fn(|k| {
        let base = Shape::from_rows(TetrominoKind::ALL[k].base_rows());
        let mut forms = [base.clone(), base.clone(), base.clone(), base];
        for r in 1..4 {
            forms[r] = forms[r - 1].rotated_cw();
        }
        forms
    })
});

/// Boolean occupancy matrix in local coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    width: usize,
    height: usize,
    filled: Vec<bool>,
}

impl Shape {
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.len());
        let filled = rows
            .iter()
            .flat_map(|r| r.iter().map(|&v| v != 0))
            .collect();
        Self {
            width,
            height,
            filled,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn is_filled(&self, row: usize, col: usize) -> bool {
        row < self.height && col < self.width && self.filled[row * self.width + col]
    }

    /// Filled cells as (row, col) in local coordinates.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.height)
            .flat_map(move |r| (0..self.width).map(move |c| (r, c)))
            .filter(|&(r, c)| self.is_filled(r, c))
    }

    /// Quarter turn clockwise: transpose, then reverse each row.
    pub fn rotated_cw(&self) -> Self {
        let (width, height) = (self.height, self.width);
        let mut filled = Vec::with_capacity(self.filled.len());
        for row in 0..height {
            for col in 0..width {
                filled.push(self.is_filled(self.height - 1 - col, row));
            }
        }
        Self {
            width,
            height,
            filled,
        }
    }
}

/// A tetromino placed on the grid: `(x, y)` anchors the shape's top-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub kind: TetrominoKind,
    pub rotation: u8, // 0..4
    pub x: i32,
    pub y: i32,
}

impl Piece {
    pub fn new(kind: TetrominoKind, rotation: u8, x: i32, y: i32) -> Self {
        Self {
            kind,
            rotation: rotation % 4,
            x,
            y,
        }
    }

    /// Horizontally centred on row 0 in spawn orientation.
    pub fn spawn(kind: TetrominoKind, cols: usize) -> Self {
        let width = kind.shape(0).width() as i32;
        Self::new(kind, 0, (cols as i32 - width).div_euclid(2), 0)
    }

    #[inline]
    pub fn shape(&self) -> &'static Shape {
        self.kind.shape(self.rotation)
    }

    #[inline]
    pub fn color_id(&self) -> ColorId {
        self.kind.color_id()
    }

    /// Filled cells as (row, col) in grid coordinates; rows may be negative.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape()
            .cells()
            .map(|(r, c)| (self.y + r as i32, self.x + c as i32))
    }

    pub fn shifted(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    /// Same anchor, next clockwise rotation form.
    pub fn rotated_cw(self) -> Self {
        Self {
            rotation: (self.rotation + 1) % 4,
            ..self
        }
    }
}

/// Source of upcoming kinds: uniform draws or a shuffled bag of all seven.
#[derive(Debug, Clone)]
pub struct PieceSource {
    rng: StdRng,
    randomizer: Randomizer,
    bag: Vec<TetrominoKind>,
}

impl PieceSource {
    pub fn new(randomizer: Randomizer, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            randomizer,
            bag: Vec::with_capacity(7),
        }
    }

    fn refill(&mut self) {
        let mut all = TetrominoKind::ALL.to_vec();
        all.shuffle(&mut self.rng);
        self.bag.extend(all);
    }

    pub fn next_kind(&mut self) -> TetrominoKind {
        match self.randomizer {
            Randomizer::Uniform => TetrominoKind::ALL[self.rng.gen_range(0..TetrominoKind::ALL.len())],
            Randomizer::Bag => {
                if self.bag.is_empty() {
                    self.refill();
                }
                self.bag.pop().unwrap_or(TetrominoKind::I)
            }
        }
    }
}
