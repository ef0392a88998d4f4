use thiserror::Error;

/// Contract violations raised by the grid engine.
///
/// Illegal positions are not errors: transitions hand back candidate grids and
/// the caller checks [`Grid::is_valid`](crate::grid::Grid::is_valid).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("invalid direction {0:?}, expected \"left\" or \"right\"")]
    InvalidDirection(String),
}
