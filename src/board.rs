//! Playfield grid: locked cell colours, row-full test, row clearing.

use std::collections::VecDeque;

/// Default playfield height in rows.
pub const DEFAULT_ROWS: usize = 20;
/// Default playfield width in columns.
pub const DEFAULT_COLUMNS: usize = 10;

/// Fixed-size grid of colour indices. 0 is empty; 1..=7 are locked piece
/// colours. rows[0] is the top row. Dimensions never change after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    columns: usize,
    cells: VecDeque<Vec<u8>>,
}

impl Board {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            cells: (0..rows).map(|_| vec![0u8; columns]).collect(),
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Colour index at (row, col), or 0 when out of bounds.
    #[inline]
    pub fn color_at(&self, row: i32, col: i32) -> u8 {
        if row < 0 || col < 0 {
            return 0;
        }
        self.cells
            .get(row as usize)
            .and_then(|r| r.get(col as usize))
            .copied()
            .unwrap_or(0)
    }

    /// Write every occupied shape cell at the given origin. The caller must
    /// have collision-checked the position first; a write that would land
    /// outside the grid is a contract violation, not a runtime condition.
    pub fn place(&mut self, shape: &[Vec<u8>], origin_x: i32, origin_y: i32, color: u8) {
        for (r, row) in shape.iter().enumerate() {
            for (c, &cell) in row.iter().enumerate() {
                if cell == 0 {
                    continue;
                }
                let by = origin_y + r as i32;
                let bx = origin_x + c as i32;
                debug_assert!(
                    by >= 0 && (by as usize) < self.rows && bx >= 0 && (bx as usize) < self.columns,
                    "place() outside the grid at ({by}, {bx})"
                );
                if let Some(target) = self
                    .cells
                    .get_mut(by.max(0) as usize)
                    .and_then(|r| r.get_mut(bx.max(0) as usize))
                {
                    *target = color;
                }
            }
        }
    }

    /// True iff every cell in the row is non-zero.
    pub fn is_row_full(&self, row: usize) -> bool {
        self.cells
            .get(row)
            .is_some_and(|r| r.iter().all(|&c| c != 0))
    }

    /// Remove the row and insert an all-empty row at the top, shifting the
    /// rows above down by one (gravity-from-above semantics).
    pub fn clear_row(&mut self, row: usize) {
        if row >= self.rows {
            return;
        }
        self.cells.remove(row);
        self.cells.push_front(vec![0u8; self.columns]);
    }

    /// Reset every cell to empty (session start).
    pub fn clear(&mut self) {
        for row in &mut self.cells {
            row.fill(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_row(board: &mut Board, row: usize, color: u8) {
        for col in 0..board.columns() {
            board.place(&[vec![1]], col as i32, row as i32, color);
        }
    }

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new(DEFAULT_ROWS, DEFAULT_COLUMNS);
        for row in 0..DEFAULT_ROWS {
            for col in 0..DEFAULT_COLUMNS {
                assert_eq!(board.color_at(row as i32, col as i32), 0);
            }
        }
    }

    #[test]
    fn test_color_at_out_of_bounds_is_zero() {
        let board = Board::new(20, 10);
        assert_eq!(board.color_at(-1, 0), 0);
        assert_eq!(board.color_at(0, -1), 0);
        assert_eq!(board.color_at(20, 0), 0);
        assert_eq!(board.color_at(0, 10), 0);
    }

    #[test]
    fn test_place_writes_occupied_cells_only() {
        let mut board = Board::new(20, 10);
        // T shape at (3, 17): top row occupies (17, 3..6), stem at (18, 4).
        let shape = vec![vec![1, 1, 1], vec![0, 1, 0]];
        board.place(&shape, 3, 17, 1);
        assert_eq!(board.color_at(17, 3), 1);
        assert_eq!(board.color_at(17, 4), 1);
        assert_eq!(board.color_at(17, 5), 1);
        assert_eq!(board.color_at(18, 4), 1);
        assert_eq!(board.color_at(18, 3), 0);
        assert_eq!(board.color_at(18, 5), 0);
    }

    #[test]
    fn test_row_full() {
        let mut board = Board::new(20, 10);
        assert!(!board.is_row_full(19));
        fill_row(&mut board, 19, 2);
        assert!(board.is_row_full(19));
        assert!(!board.is_row_full(20));
    }

    #[test]
    fn test_clear_row_shifts_rows_down() {
        let mut board = Board::new(20, 10);
        fill_row(&mut board, 19, 2);
        board.place(&[vec![1]], 0, 18, 5);
        board.clear_row(19);
        // Bottom row now holds what was above it; a fresh empty row is on top.
        assert_eq!(board.color_at(19, 0), 5);
        assert!(!board.is_row_full(19));
        for col in 0..10 {
            assert_eq!(board.color_at(0, col), 0);
        }
    }

    #[test]
    fn test_clear_resets_all_cells() {
        let mut board = Board::new(20, 10);
        fill_row(&mut board, 10, 3);
        board.clear();
        for row in 0..20 {
            for col in 0..10 {
                assert_eq!(board.color_at(row, col), 0);
            }
        }
    }
}
