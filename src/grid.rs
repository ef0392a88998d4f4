use std::str::FromStr;

use log::{debug, trace};
use rand::Rng;

use crate::catalog::{spawn_random_block, Position, Shape};
use crate::error::GridError;

// ============================================================================
// Configuration
// ============================================================================

pub const WIDTH: i32 = 15;
/// Spawn row and viewport height only; blocks may sit arbitrarily high.
pub const HEIGHT: i32 = 30;

pub const SPAWN_POSITION: Position = Position::new(WIDTH / 2, HEIGHT - 1);

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    fn dx(self) -> i32 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }
}

impl FromStr for Direction {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(GridError::InvalidDirection(other.to_string())),
        }
    }
}

/// A block frozen at absolute coordinates.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PlacedBlock {
    pub cells: Shape,
}

impl PlacedBlock {
    pub fn new(cells: Shape) -> Self {
        Self { cells }
    }
}

/// The controllable block: a shape in offset form plus the anchor it hangs from.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ActiveBlock {
    pub position: Position,
    pub shape: Shape,
}

impl ActiveBlock {
    pub fn new(shape: Shape, position: Position) -> Self {
        Self { position, shape }
    }

    pub fn at_spawn(shape: Shape) -> Self {
        Self::new(shape, SPAWN_POSITION)
    }

    /// Absolute cells: every offset translated by the anchor.
    pub fn cells(&self) -> Shape {
        self.shape.translated(self.position)
    }

    fn moved(&self, dx: i32, dy: i32) -> Self {
        Self {
            position: Position::new(
                self.position.x.wrapping_add(dx),
                self.position.y.wrapping_add(dy),
            ),
            shape: self.shape.clone(),
        }
    }

    fn rotated(&self) -> Self {
        Self {
            position: self.position,
            shape: self.shape.rotated(),
        }
    }
}

/// Whole game state. Every transition returns a new candidate `Grid`; none of
/// them check legality, that is what [`Grid::is_valid`] is for.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Grid {
    placed: Vec<PlacedBlock>,
    active: Option<ActiveBlock>,
}

/// Fresh board with `shape` at the spawn anchor.
pub fn new_grid(shape: Shape) -> Grid {
    Grid::new(shape)
}

fn in_bounds(cell: Position) -> bool {
    (0..WIDTH).contains(&cell.x) && cell.y >= 0
}

// ============================================================================
// Construction & Queries
// ============================================================================

impl Grid {
    pub fn new(shape: Shape) -> Self {
        Self {
            placed: Vec::new(),
            active: Some(ActiveBlock::at_spawn(shape)),
        }
    }

    pub fn spawn<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(spawn_random_block(rng))
    }

    pub fn from_parts(placed: Vec<PlacedBlock>, active: Option<ActiveBlock>) -> Self {
        Self { placed, active }
    }

    pub fn placed(&self) -> &[PlacedBlock] {
        &self.placed
    }

    pub fn active(&self) -> Option<&ActiveBlock> {
        self.active.as_ref()
    }

    pub fn resolve_active(&self) -> Option<Shape> {
        self.active.as_ref().map(ActiveBlock::cells)
    }

    /// True iff a placed block holds `cell`. The active block is not considered.
    pub fn is_occupied(&self, cell: Position) -> bool {
        self.placed.iter().any(|b| b.cells.contains(cell))
    }

    pub fn is_valid(&self) -> bool {
        let active = self.resolve_active().unwrap_or_default();

        let placed_cells = self.placed.iter().flat_map(|b| b.cells.cells());
        if !placed_cells.chain(active.cells()).all(|c| in_bounds(*c)) {
            return false;
        }

        !active.cells().iter().any(|c| self.is_occupied(*c))
    }

    pub fn highest_placed_row(&self) -> Option<i32> {
        self.placed
            .iter()
            .flat_map(|b| b.cells.cells())
            .map(|c| c.y)
            .max()
    }

    /// Lowest row at or above `from` that holds a placed cell.
    pub fn lowest_placed_row_from(&self, from: i32) -> Option<i32> {
        self.placed
            .iter()
            .flat_map(|b| b.cells.cells())
            .map(|c| c.y)
            .filter(|&y| y >= from)
            .min()
    }

    pub fn placed_cell_count(&self) -> usize {
        self.placed.iter().map(|b| b.cells.len()).sum()
    }

    pub fn is_row_full(&self, row: i32) -> bool {
        (0..WIDTH).all(|x| self.is_occupied(Position::new(x, row)))
    }
}

// ============================================================================
// Transitions
// ============================================================================

impl Grid {
    fn map_active(&self, f: impl FnOnce(&ActiveBlock) -> ActiveBlock) -> Self {
        Self {
            placed: self.placed.clone(),
            active: self.active.as_ref().map(f),
        }
    }

    pub fn shift(&self, direction: Direction) -> Self {
        self.map_active(|a| a.moved(direction.dx(), 0))
    }

    /// String-typed move; anything but `"left"` or `"right"` is rejected.
    pub fn try_move(&self, direction: &str) -> Result<Self, GridError> {
        Ok(self.shift(direction.parse()?))
    }

    pub fn drop(&self) -> Self {
        self.map_active(|a| a.moved(0, -1))
    }

    pub fn rotate(&self) -> Self {
        self.map_active(ActiveBlock::rotated)
    }

    /// Freezes the active block into the placed blocks. Unconditional.
    pub fn place_active(&self) -> Self {
        let mut placed = self.placed.clone();
        if let Some(cells) = self.resolve_active() {
            trace!("placing block at {:?}", cells.cells());
            placed.push(PlacedBlock::new(cells));
        }
        Self {
            placed,
            active: None,
        }
    }

    pub fn with_active(&self, active: ActiveBlock) -> Self {
        Self {
            placed: self.placed.clone(),
            active: Some(active),
        }
    }

    pub fn clear_full_rows(&self) -> Self {
        self.clear_full_rows_counted().0
    }

    /// Clears full rows bottom to top and reports how many were removed.
    pub fn clear_full_rows_counted(&self) -> (Self, usize) {
        let mut grid = self.clone();
        let mut cleared = 0;
        let mut from = 0;

        // Only rows holding cells can be full, so skip straight to the next one.
        while let Some(row) = grid.lowest_placed_row_from(from) {
            if grid.is_row_full(row) {
                grid = grid.without_row(row);
                cleared += 1;
                // Rows above moved into `row`; check it again.
                from = row;
            } else if let Some(next) = row.checked_add(1) {
                from = next;
            } else {
                break;
            }
        }

        if cleared > 0 {
            debug!("cleared {} full row(s)", cleared);
        }
        (grid, cleared)
    }

    /// Deletes `row` from every placed block and lowers everything above it.
    fn without_row(&self, row: i32) -> Self {
        let placed = self
            .placed
            .iter()
            .filter_map(|b| {
                let kept = b.cells.cells().iter().filter(|c| c.y != row);
                let cells = Shape::new(kept.map(|c| {
                    if c.y > row {
                        Position::new(c.x, c.y - 1)
                    } else {
                        *c
                    }
                }));
                (!cells.is_empty()).then(|| PlacedBlock::new(cells))
            })
            .collect();

        Self {
            placed,
            active: self.active.clone(),
        }
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

pub mod test_helpers {
    use super::*;

    pub fn block(cells: &[(i32, i32)]) -> PlacedBlock {
        PlacedBlock::new(Shape::new(cells.iter().copied()))
    }

    /// A placed block covering every column of `row`.
    pub fn full_row(row: i32) -> PlacedBlock {
        PlacedBlock::new(Shape::new((0..WIDTH).map(|x| (x, row))))
    }

    /// A placed block covering `row` except for column `gap_x`.
    pub fn row_with_gap(row: i32, gap_x: i32) -> PlacedBlock {
        PlacedBlock::new(Shape::new(
            (0..WIDTH).filter(|&x| x != gap_x).map(|x| (x, row)),
        ))
    }

    pub fn active(offsets: &[(i32, i32)], x: i32, y: i32) -> ActiveBlock {
        ActiveBlock::new(Shape::new(offsets.iter().copied()), Position::new(x, y))
    }
}
