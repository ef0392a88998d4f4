use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ============================================================================
// Types
// ============================================================================

/// A cell coordinate. `x` grows rightward, `y` grows upward, row 0 is the floor.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// A set of occupied cells.
///
/// Cells are kept sorted and deduplicated, so two shapes compare equal exactly
/// when they cover the same cells regardless of how they were built.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Shape {
    cells: Vec<Position>,
}

impl Shape {
    pub fn new<I, P>(cells: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Position>,
    {
        let mut cells: Vec<Position> = cells.into_iter().map(Into::into).collect();
        cells.sort_unstable();
        cells.dedup();
        Self { cells }
    }

    pub fn cells(&self) -> &[Position] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, cell: Position) -> bool {
        self.cells.binary_search(&cell).is_ok()
    }

    /// Translates every cell by `anchor`. Coordinates wrap at the `i32` limits.
    pub fn translated(&self, anchor: Position) -> Self {
        Self::new(self.cells.iter().map(|c| {
            Position::new(c.x.wrapping_add(anchor.x), c.y.wrapping_add(anchor.y))
        }))
    }

    /// Quarter turn clockwise about the local origin: `(x, y) -> (y, -x)`.
    pub fn rotated(&self) -> Self {
        Self::new(self.cells.iter().map(|c| Position::new(c.y, c.x.wrapping_neg())))
    }
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ShapeKind {
    L,
    Corners,
    J,
    I,
    T,
    Hook,
    Z,
    O,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 8] = [
        ShapeKind::L,
        ShapeKind::Corners,
        ShapeKind::J,
        ShapeKind::I,
        ShapeKind::T,
        ShapeKind::Hook,
        ShapeKind::Z,
        ShapeKind::O,
    ];

    pub fn offsets(&self) -> [(i32, i32); 4] {
        match self {
            ShapeKind::L => [(0, 2), (0, 1), (0, 0), (1, 0)],
            ShapeKind::Corners => [(0, 4), (0, 0), (4, 0), (4, 4)],
            ShapeKind::J => [(1, 2), (1, 1), (1, 0), (0, 0)],
            ShapeKind::I => [(0, 3), (0, 2), (0, 1), (0, 0)],
            ShapeKind::T => [(-1, 1), (0, 1), (1, 1), (0, 0)],
            ShapeKind::Hook => [(-1, 0), (0, 0), (1, 0), (1, 1)],
            ShapeKind::Z => [(-1, 1), (0, 1), (0, 0), (1, 0)],
            ShapeKind::O => [(0, 1), (1, 1), (0, 0), (1, 0)],
        }
    }

    pub fn shape(&self) -> Shape {
        Shape::new(self.offsets())
    }
}

/// Picks one of the catalog shapes uniformly from `rng`.
pub fn spawn_random_block<R: Rng + ?Sized>(rng: &mut R) -> Shape {
    let kind = ShapeKind::ALL[rng.gen_range(0..ShapeKind::ALL.len())];
    kind.shape()
}

// ============================================================================
// Shape Sources
// ============================================================================

pub trait ShapeSource {
    fn next_shape(&mut self) -> Shape;
}

pub struct RandomShapeSource {
    rng: StdRng,
}

impl RandomShapeSource {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl ShapeSource for RandomShapeSource {
    fn next_shape(&mut self) -> Shape {
        spawn_random_block(&mut self.rng)
    }
}

/// Replays a fixed list of shapes, wrapping around at the end.
pub struct SequenceShapeSource {
    shapes: Vec<Shape>,
    index: usize,
}

impl SequenceShapeSource {
    pub fn new(shapes: Vec<Shape>) -> Self {
        assert!(!shapes.is_empty(), "sequence source needs at least one shape");
        Self { shapes, index: 0 }
    }

    pub fn of_kinds(kinds: &[ShapeKind]) -> Self {
        Self::new(kinds.iter().map(ShapeKind::shape).collect())
    }
}

impl ShapeSource for SequenceShapeSource {
    fn next_shape(&mut self) -> Shape {
        let shape = self.shapes[self.index % self.shapes.len()].clone();
        self.index += 1;
        shape
    }
}
