//! Placement check for a piece against the grid.

use crate::grid::Grid;
use crate::piece::Piece;

/// True if any filled cell of `piece` is left/right of the walls, below the floor,
/// or on a locked block. Cells above row 0 are allowed.
pub fn collides(piece: &Piece, grid: &Grid) -> bool {
    let (cols, rows) = (grid.cols() as i32, grid.rows() as i32);
    piece.cells().any(|(row, col)| {
        if col < 0 || col >= cols || row >= rows {
            return true;
        }
        row >= 0 && grid.is_occupied(row, col)
    })
}
