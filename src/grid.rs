//! Playfield: fixed-size matrix of locked blocks, row 0 at the top.

use crate::piece::{ColorId, Piece};
use std::collections::VecDeque;

/// Single cell: either empty or a locked block of a given color-id (1..=7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Block(ColorId),
}

impl Cell {
    #[inline]
    pub fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Locked-block playfield. Dimensions never change after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cols: usize,
    /// rows[y][x] = cell. rows[0] is top.
    rows: VecDeque<Vec<Cell>>,
}

impl Grid {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows: (0..rows).map(|_| vec![Cell::Empty; cols]).collect(),
        }
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        self.rows.get(row).and_then(|r| r.get(col)).copied()
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        if let Some(slot) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *slot = cell;
        }
    }

    /// True when (row, col) is outside the grid or holds a locked block.
    pub fn is_occupied(&self, row: i32, col: i32) -> bool {
        if row < 0 || col < 0 {
            return true;
        }
        match self.get(row as usize, col as usize) {
            Some(cell) => !cell.is_empty(),
            None => true,
        }
    }

    /// Write every filled cell of `piece` into the grid at its position.
    /// Cells above row 0 are dropped.
    pub fn lock(&mut self, piece: &Piece) {
        let color = piece.color_id();
        for (row, col) in piece.cells() {
            if row < 0 || col < 0 {
                continue;
            }
            self.set(row as usize, col as usize, Cell::Block(color));
        }
    }

    fn is_row_full(&self, row: usize) -> bool {
        self.rows
            .get(row)
            .is_some_and(|r| r.iter().all(|c| !c.is_empty()))
    }

    /// Indices of rows that are currently full, top to bottom.
    pub fn full_rows(&self) -> Vec<usize> {
        (0..self.rows()).filter(|&r| self.is_row_full(r)).collect()
    }

    /// Remove every full row, shifting rows above down and inserting empty rows at the top.
    /// Returns the number of rows removed.
    pub fn clear_full_rows(&mut self) -> usize {
        let mut cleared = 0;
        let mut row = self.rows.len();
        while row > 0 {
            let idx = row - 1;
            if self.is_row_full(idx) {
                self.rows.remove(idx);
                self.rows.push_front(vec![Cell::Empty; self.cols]);
                cleared += 1;
                // Same index again: the row above has shifted into it.
                continue;
            }
            row -= 1;
        }
        cleared
    }

    /// Iterate rows top to bottom.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }
}
