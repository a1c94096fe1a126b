//! Clockwise rotation with a fixed wall-kick sequence.

use crate::collision::collides;
use crate::grid::Grid;
use crate::piece::Piece;

/// Offsets (dx, dy) tried in order when the rotated piece does not fit.
pub const WALL_KICKS: [(i32, i32); 5] = [(1, 0), (-1, 0), (0, -1), (2, 0), (-2, 0)];

/// Rotate `piece` a quarter turn clockwise. Returns the placed result, or `None` when
/// neither the plain rotation nor any kick fits; the caller keeps the original piece.
pub fn rotate(piece: &Piece, grid: &Grid) -> Option<Piece> {
    let rotated = piece.rotated_cw();
    if !collides(&rotated, grid) {
        return Some(rotated);
    }
    WALL_KICKS
        .iter()
        .map(|&(dx, dy)| rotated.shifted(dx, dy))
        .find(|candidate| !collides(candidate, grid))
}
