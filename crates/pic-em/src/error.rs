//! Error types for grid configuration.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("Grid spacing along {axis} must be positive and finite, got {value}")]
    InvalidSpacing { axis: char, value: f64 },

    #[error("Grid must have at least one cell along {0}")]
    EmptyAxis(char),

    #[error("Unsupported dimensionality: {0}")]
    UnsupportedDimensionality(String),

    #[error("XZ grids must have exactly one cell along y, got {0}")]
    DegenerateAxis(usize),

    #[error("At least {required} guard cells are required, got {got}")]
    InsufficientGuards { required: usize, got: usize },

    #[error("Array layouts do not match")]
    LayoutMismatch,
}

pub type Result<T> = std::result::Result<T, GridError>;
