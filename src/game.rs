//! Game state: board, active and lookahead pieces, collision, locking,
//! line clears, and score/level/speed progression.

use crate::GameConfig;
use crate::board::Board;
use crate::pieces::{Piece, PieceRng, rotate_cw};
use std::time::Duration;

/// Flat bonus per cleared line.
const POINTS_PER_LINE: u32 = 100;
/// Lines needed to advance a level.
const LINES_PER_LEVEL: u32 = 10;
/// Tick interval reduction per level-up.
const SPEEDUP_PER_LEVEL_MS: u64 = 50;
/// Fastest allowed tick interval.
const MIN_TICK_MS: u64 = 100;

/// One session's worth of simulation state. Created fresh by `new()` (the
/// session start); the UI reads it per frame and submits intents, never
/// mutating the board or pieces directly.
#[derive(Debug, Clone)]
pub struct GameState {
    pub board: Board,
    pub active: Piece,
    /// Lookahead slot: becomes the active piece on lock.
    pub next: Piece,
    rng: PieceRng,
    pub score: u32,
    pub level: u32,
    /// Lines cleared since the last level-up; resets at `LINES_PER_LEVEL`.
    pub lines_since_level_up: u32,
    pub lines_total: u32,
    /// Current gravity interval. Non-increasing; floor `MIN_TICK_MS`.
    pub tick_interval: Duration,
    pub game_over: bool,
    /// Row indices removed by the most recent lock, kept for the UI flash.
    last_cleared_rows: Vec<usize>,
}

impl GameState {
    pub fn new(config: &GameConfig, seed: u32) -> Self {
        let mut rng = PieceRng::new(seed);
        let active = Piece::spawn(rng.next_kind(), config.columns);
        let next = Piece::spawn(rng.next_kind(), config.columns);
        Self {
            board: Board::new(config.rows, config.columns),
            active,
            next,
            rng,
            score: 0,
            level: 1,
            lines_since_level_up: 0,
            lines_total: 0,
            tick_interval: Duration::from_millis(config.tick_ms),
            game_over: false,
            last_cleared_rows: Vec::new(),
        }
    }

    /// True iff any occupied cell of `shape` at offset (x, y) leaves the
    /// playfield sideways or below, or lands on a non-empty board cell.
    /// Cells above the top row never collide; an all-empty shape never
    /// collides.
    pub fn collides(&self, shape: &[Vec<u8>], x: i32, y: i32) -> bool {
        for (r, row) in shape.iter().enumerate() {
            for (c, &cell) in row.iter().enumerate() {
                if cell == 0 {
                    continue;
                }
                let bx = x + c as i32;
                let by = y + r as i32;
                if bx < 0 || bx >= self.board.columns() as i32 || by >= self.board.rows() as i32 {
                    return true;
                }
                if by < 0 {
                    continue;
                }
                if self.board.color_at(by, bx) != 0 {
                    return true;
                }
            }
        }
        false
    }

    /// Move the active piece by (dx, dy) if the target position is free.
    /// Sole primitive for left/right/soft-drop/gravity movement. Reports
    /// failure without mutating anything.
    pub fn try_move(&mut self, dx: i32, dy: i32) -> bool {
        if self.game_over {
            return false;
        }
        let nx = self.active.x + dx;
        let ny = self.active.y + dy;
        if self.collides(&self.active.shape, nx, ny) {
            return false;
        }
        self.active.x = nx;
        self.active.y = ny;
        true
    }

    /// Rotate the active piece 90° clockwise in place. No wall kicks:
    /// a rotation blocked by a wall or the stack fails silently.
    pub fn try_rotate(&mut self) -> bool {
        if self.game_over {
            return false;
        }
        let rotated = rotate_cw(&self.active.shape);
        if self.collides(&rotated, self.active.x, self.active.y) {
            return false;
        }
        self.active.shape = rotated;
        true
    }

    /// One downward step. Gravity ticks and soft drops both route here;
    /// a blocked step locks the piece and advances the lookahead.
    pub fn step_down(&mut self) {
        if self.game_over {
            return;
        }
        if !self.try_move(0, 1) {
            self.lock_and_advance();
        }
    }

    pub fn move_left(&mut self) {
        self.try_move(-1, 0);
    }

    pub fn move_right(&mut self) {
        self.try_move(1, 0);
    }

    pub fn soft_drop(&mut self) {
        self.step_down();
    }

    pub fn rotate(&mut self) {
        self.try_rotate();
    }

    /// Commit the active piece into the board, clear full rows, score them,
    /// and promote the lookahead. If the fresh piece already collides at its
    /// spawn position the session is over and nothing further is placed.
    fn lock_and_advance(&mut self) {
        self.board.place(
            &self.active.shape,
            self.active.x,
            self.active.y,
            self.active.color,
        );
        let cleared = self.clear_full_rows();
        self.apply_line_score(cleared.len() as u32);
        self.last_cleared_rows = cleared;
        let columns = self.board.columns();
        self.active = std::mem::replace(
            &mut self.next,
            Piece::spawn(self.rng.next_kind(), columns),
        );
        if self.collides(&self.active.shape, self.active.x, self.active.y) {
            self.game_over = true;
        }
    }

    /// Scan bottom-to-top and clear every full row. After a clear the rows
    /// above shift down into the same index, so the index is re-tested;
    /// stacked full rows all clear in one pass.
    fn clear_full_rows(&mut self) -> Vec<usize> {
        let mut cleared = Vec::new();
        let mut row = self.board.rows();
        while row > 0 {
            let y = row - 1;
            if self.board.is_row_full(y) {
                self.board.clear_row(y);
                cleared.push(y);
            } else {
                row -= 1;
            }
        }
        cleared
    }

    /// Flat 100 points per line; every tenth line advances the level and
    /// shaves 50 ms off the gravity interval down to the floor.
    fn apply_line_score(&mut self, lines: u32) {
        for _ in 0..lines {
            self.score += POINTS_PER_LINE;
            self.lines_total += 1;
            self.lines_since_level_up += 1;
            if self.lines_since_level_up >= LINES_PER_LEVEL {
                self.level += 1;
                self.lines_since_level_up = 0;
                let ms = self.tick_interval.as_millis() as u64;
                self.tick_interval =
                    Duration::from_millis(ms.saturating_sub(SPEEDUP_PER_LEVEL_MS).max(MIN_TICK_MS));
            }
        }
    }

    /// Rows removed by the most recent lock, handed to the UI once for the
    /// line-clear flash.
    pub fn take_cleared_rows(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.last_cleared_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::shape;

    fn config() -> GameConfig {
        GameConfig {
            rows: 20,
            columns: 10,
            tick_ms: 500,
            seed: Some(1),
            no_animation: false,
        }
    }

    fn new_game() -> GameState {
        GameState::new(&config(), 1)
    }

    /// Replace the active piece with a given catalog kind at spawn.
    fn set_active(state: &mut GameState, kind: usize) {
        state.active = Piece::spawn(kind, state.board.columns());
    }

    fn fill_row_except(state: &mut GameState, row: usize, gap_col: usize) {
        for col in 0..state.board.columns() {
            if col != gap_col {
                state.board.place(&[vec![1]], col as i32, row as i32, 3);
            }
        }
    }

    #[test]
    fn test_collides_walls_and_floor() {
        let state = new_game();
        let square: Vec<Vec<u8>> = shape(1).iter().map(|r| r.to_vec()).collect();
        assert!(state.collides(&square, -1, 0), "left wall");
        assert!(state.collides(&square, 9, 0), "right wall");
        assert!(state.collides(&square, 0, 19), "floor");
        assert!(!state.collides(&square, 0, 18), "resting on floor is fine");
        assert!(!state.collides(&square, 8, 0), "flush against right wall");
    }

    #[test]
    fn test_collides_above_top_is_allowed() {
        let state = new_game();
        let square: Vec<Vec<u8>> = shape(1).iter().map(|r| r.to_vec()).collect();
        assert!(!state.collides(&square, 4, -1), "overhanging the top");
        assert!(state.collides(&square, -1, -1), "still checks walls above top");
    }

    #[test]
    fn test_collides_occupied_cell() {
        let mut state = new_game();
        state.board.place(&[vec![1]], 4, 10, 2);
        let square: Vec<Vec<u8>> = shape(1).iter().map(|r| r.to_vec()).collect();
        assert!(state.collides(&square, 4, 10));
        assert!(state.collides(&square, 3, 9));
        assert!(!state.collides(&square, 5, 10));
    }

    #[test]
    fn test_collides_empty_shape_is_vacuous() {
        let state = new_game();
        let empty: Vec<Vec<u8>> = vec![vec![0, 0], vec![0, 0]];
        assert!(!state.collides(&empty, -5, 100));
    }

    #[test]
    fn test_try_move_commits_or_leaves_state() {
        let mut state = new_game();
        set_active(&mut state, 1); // O at (3, 0)
        assert!(state.try_move(1, 0));
        assert_eq!((state.active.x, state.active.y), (4, 0));
        // Push against the right wall until blocked.
        while state.try_move(1, 0) {}
        assert_eq!(state.active.x, 8);
        assert!(!state.try_move(1, 0));
        assert_eq!((state.active.x, state.active.y), (8, 0));
    }

    #[test]
    fn test_rotate_blocked_at_wall_fails_silently() {
        let mut state = new_game();
        set_active(&mut state, 6); // I piece, 1x4
        state.active.shape = rotate_cw(&state.active.shape); // vertical, 4x1
        state.active.x = 9;
        state.active.y = 16;
        // Rotating back to horizontal would poke through the right wall.
        let before = state.active.shape.clone();
        assert!(!state.try_rotate());
        assert_eq!(state.active.shape, before);
        // Away from the wall the same rotation succeeds.
        state.active.x = 5;
        assert!(state.try_rotate());
    }

    #[test]
    fn test_square_soft_drop_to_floor_then_lock() {
        let mut state = new_game();
        set_active(&mut state, 1); // O at (3, 0), 2 rows tall
        let rows = state.board.rows();
        for _ in 0..rows - 2 {
            assert!(state.try_move(0, 1));
        }
        assert_eq!(state.active.y, (rows - 2) as i32);
        // One more step is blocked by the floor and locks instead.
        assert!(!state.try_move(0, 1));
        state.soft_drop();
        assert_eq!(state.board.color_at(19, 3), 2);
        assert_eq!(state.board.color_at(19, 4), 2);
        assert_eq!(state.board.color_at(18, 3), 2);
        assert_eq!(state.board.color_at(18, 4), 2);
        assert!(!state.game_over);
    }

    #[test]
    fn test_lock_without_clear_leaves_score_and_level() {
        let mut state = new_game();
        set_active(&mut state, 1);
        for _ in 0..19 {
            state.soft_drop();
        }
        assert_eq!(state.score, 0);
        assert_eq!(state.level, 1);
        assert_eq!(state.lines_since_level_up, 0);
        assert!(state.take_cleared_rows().is_empty());
    }

    #[test]
    fn test_completing_a_row_clears_and_shifts() {
        let mut state = new_game();
        fill_row_except(&mut state, 19, 4);
        state.board.place(&[vec![1]], 0, 18, 5); // marker above the full row
        // Single-cell piece stand-in: drop the O so one of its cells fills the gap.
        state.active = Piece {
            shape: vec![vec![1]],
            x: 4,
            y: 0,
            color: 2,
        };
        for _ in 0..20 {
            state.soft_drop();
        }
        assert_eq!(state.score, 100);
        assert_eq!(state.lines_since_level_up, 1);
        assert_eq!(state.lines_total, 1);
        // Row 19 was removed; the marker shifted down onto the bottom row.
        assert_eq!(state.board.color_at(19, 0), 5);
        assert!(!state.board.is_row_full(19));
        for col in 0..10 {
            assert_eq!(state.board.color_at(0, col), 0);
        }
        assert_eq!(state.take_cleared_rows(), vec![19]);
    }

    #[test]
    fn test_stacked_full_rows_clear_in_one_lock() {
        let mut state = new_game();
        fill_row_except(&mut state, 19, 4);
        fill_row_except(&mut state, 18, 4);
        // Vertical 2-cell piece fills both gaps at once.
        state.active = Piece {
            shape: vec![vec![1], vec![1]],
            x: 4,
            y: 0,
            color: 2,
        };
        for _ in 0..20 {
            state.soft_drop();
        }
        assert_eq!(state.score, 200);
        assert_eq!(state.lines_since_level_up, 2);
        for col in 0..10 {
            assert_eq!(state.board.color_at(19, col), 0);
            assert_eq!(state.board.color_at(18, col), 0);
        }
    }

    #[test]
    fn test_ten_clears_advance_level_and_speed() {
        let mut state = new_game();
        for _ in 0..9 {
            state.apply_line_score(1);
        }
        assert_eq!(state.level, 1);
        assert_eq!(state.tick_interval, Duration::from_millis(500));
        state.apply_line_score(1);
        assert_eq!(state.level, 2);
        assert_eq!(state.lines_since_level_up, 0);
        assert_eq!(state.score, 1000);
        assert_eq!(state.tick_interval, Duration::from_millis(450));
    }

    #[test]
    fn test_speed_floor_at_100ms() {
        let mut state = new_game();
        // 500 -> 100 takes 8 level-ups; further level-ups stay at the floor.
        state.apply_line_score(120);
        assert_eq!(state.tick_interval, Duration::from_millis(100));
        assert_eq!(state.level, 13);
    }

    #[test]
    fn test_spawn_collision_is_game_over() {
        let mut state = new_game();
        // Occupy the spawn rows (leaving a gap so they do not count as full
        // lines) so any fresh piece overlaps the stack.
        for row in 0..2 {
            for col in 1..10 {
                state.board.place(&[vec![1]], col, row, 1);
            }
        }
        // Park the active piece lower down and force a lock.
        state.active = Piece {
            shape: vec![vec![1]],
            x: 0,
            y: 19,
            color: 1,
        };
        state.soft_drop();
        assert!(state.game_over);
    }

    #[test]
    fn test_intents_are_noops_after_game_over() {
        let mut state = new_game();
        state.game_over = true;
        let before = state.active.clone();
        state.move_left();
        state.move_right();
        state.soft_drop();
        state.rotate();
        assert_eq!(state.active, before);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_fresh_session_state() {
        let state = new_game();
        assert_eq!(state.score, 0);
        assert_eq!(state.level, 1);
        assert_eq!(state.lines_since_level_up, 0);
        assert_eq!(state.tick_interval, Duration::from_millis(500));
        assert!(!state.game_over);
        assert_eq!(state.active.x, 3);
        assert_eq!(state.next.y, 0);
    }

    #[test]
    fn test_same_seed_same_piece_sequence() {
        let a = GameState::new(&config(), 7);
        let b = GameState::new(&config(), 7);
        assert_eq!(a.active, b.active);
        assert_eq!(a.next, b.next);
    }
}
