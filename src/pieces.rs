//! Piece catalog: the seven tetromino shapes, rotation, and spawning.

/// Number of entries in the catalog.
pub const SHAPE_COUNT: usize = 7;

/// Catalog entry: rectangular 0/1 matrix in piece-local coordinates, row 0 on top.
pub type CatalogShape = &'static [&'static [u8]];

/// The seven tetrominoes. The colour identifier for entry `i` is `i + 1`;
/// colour 0 is reserved for empty board cells.
static SHAPES: [CatalogShape; SHAPE_COUNT] = [
    &[&[1, 1, 1], &[0, 1, 0]],    // T
    &[&[1, 1], &[1, 1]],          // O
    &[&[1, 1, 0], &[0, 1, 1]],    // S
    &[&[0, 1, 1], &[1, 1, 0]],    // Z
    &[&[1, 0, 0], &[1, 1, 1]],    // L
    &[&[0, 0, 1], &[1, 1, 1]],    // J
    &[&[1, 1, 1, 1]],             // I
];

/// Catalog size (always 7).
pub fn shape_count() -> usize {
    SHAPES.len()
}

/// Immutable shape matrix for a catalog index (0..7).
pub fn shape(index: usize) -> CatalogShape {
    SHAPES[index]
}

/// 90° clockwise rotation: `rotated[c][rows - 1 - r] = shape[r][c]`.
/// Returns a new matrix; catalog entries are never mutated.
pub fn rotate_cw(shape: &[Vec<u8>]) -> Vec<Vec<u8>> {
    let rows = shape.len();
    let cols = shape.first().map_or(0, Vec::len);
    let mut rotated = vec![vec![0u8; rows]; cols];
    for (r, row) in shape.iter().enumerate() {
        for (c, &cell) in row.iter().enumerate() {
            rotated[c][rows - 1 - r] = cell;
        }
    }
    rotated
}

/// Falling piece: current rotation matrix plus board offset of its top-left cell.
/// The colour index (1..=7) is fixed at spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub shape: Vec<Vec<u8>>,
    pub x: i32,
    pub y: i32,
    pub color: u8,
}

impl Piece {
    /// Spawn a piece of the given catalog kind at the top of a board
    /// `columns` wide. Spawn column is fixed: `columns / 2 - 2`.
    pub fn spawn(kind: usize, columns: usize) -> Self {
        Self {
            shape: shape(kind).iter().map(|row| row.to_vec()).collect(),
            x: (columns / 2) as i32 - 2,
            y: 0,
            color: (kind + 1) as u8,
        }
    }

    /// Iterate over occupied cells as board coordinates `(col, row)`.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape.iter().enumerate().flat_map(move |(r, row)| {
            row.iter()
                .enumerate()
                .filter(|&(_, &cell)| cell != 0)
                .map(move |(c, _)| (self.x + c as i32, self.y + r as i32))
        })
    }
}

/// Seedable LCG used to draw piece kinds. Kept tiny and deterministic so a
/// fixed seed replays the same piece sequence (constants from Numerical Recipes).
#[derive(Debug, Clone)]
pub struct PieceRng {
    state: u32,
}

impl PieceRng {
    pub fn new(seed: u32) -> Self {
        // A zero state would produce a degenerate sequence.
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.state
    }

    /// Uniform catalog index in `[0, SHAPE_COUNT)`.
    pub fn next_kind(&mut self) -> usize {
        (self.next_u32() >> 16) as usize % SHAPE_COUNT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_seven_shapes() {
        assert_eq!(shape_count(), 7);
        for i in 0..shape_count() {
            let s = shape(i);
            assert!(!s.is_empty());
            let width = s[0].len();
            assert!(s.iter().all(|row| row.len() == width), "shape {i} not rectangular");
            assert!(s.iter().copied().flatten().any(|&c| c != 0));
        }
    }

    #[test]
    fn test_spawn_color_is_index_plus_one() {
        for kind in 0..shape_count() {
            let p = Piece::spawn(kind, 10);
            assert_eq!(p.color, (kind + 1) as u8);
            assert_eq!(p.x, 3);
            assert_eq!(p.y, 0);
        }
    }

    #[test]
    fn test_rotation_cycle_of_four_is_identity() {
        for kind in 0..shape_count() {
            let original: Vec<Vec<u8>> = shape(kind).iter().map(|r| r.to_vec()).collect();
            let mut s = original.clone();
            for _ in 0..4 {
                s = rotate_cw(&s);
            }
            assert_eq!(s, original, "shape {kind} not restored after 4 rotations");
        }
    }

    #[test]
    fn test_square_rotation_is_identity() {
        // O piece (index 1) is invariant under a single rotation.
        let original: Vec<Vec<u8>> = shape(1).iter().map(|r| r.to_vec()).collect();
        assert_eq!(rotate_cw(&original), original);
    }

    #[test]
    fn test_rotate_cw_transposes_and_reverses() {
        // T piece: [[1,1,1],[0,1,0]] rotated CW is [[0,1],[1,1],[0,1]].
        let t: Vec<Vec<u8>> = shape(0).iter().map(|r| r.to_vec()).collect();
        assert_eq!(rotate_cw(&t), vec![vec![0, 1], vec![1, 1], vec![0, 1]]);
    }

    #[test]
    fn test_rng_deterministic_and_in_range() {
        let mut a = PieceRng::new(42);
        let mut b = PieceRng::new(42);
        for _ in 0..100 {
            let k = a.next_kind();
            assert_eq!(k, b.next_kind());
            assert!(k < SHAPE_COUNT);
        }
    }

    #[test]
    fn test_rng_zero_seed_is_usable() {
        let mut rng = PieceRng::new(0);
        let kinds: Vec<usize> = (0..14).map(|_| rng.next_kind()).collect();
        assert!(kinds.iter().any(|&k| k != kinds[0]));
    }

    #[test]
    fn test_piece_cells_offsets() {
        let p = Piece::spawn(1, 10); // O at x=3, y=0
        let cells: Vec<(i32, i32)> = p.cells().collect();
        assert_eq!(cells, vec![(3, 0), (4, 0), (3, 1), (4, 1)]);
    }
}
