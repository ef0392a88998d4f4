pub mod catalog;
pub mod error;
pub mod game;
pub mod grid;

pub use catalog::{spawn_random_block, Position, Shape, ShapeKind};
pub use error::GridError;
pub use grid::{new_grid, ActiveBlock, Direction, Grid, PlacedBlock, HEIGHT, WIDTH};
