//! Error types for prescription validation.

use thiserror::Error;

/// Result type alias using ValidationError.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Reasons a prescription cannot be encoded.
///
/// These are never fatal for a batch: the offending prescription is skipped
/// and its siblings still encode.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("prescription has no rate raster")]
    MissingRates,

    #[error("prescription has no cell width")]
    MissingCellWidth,

    #[error("prescription has no cell height")]
    MissingCellHeight,

    #[error("prescription has no origin")]
    MissingOrigin,

    #[error("raster declares {columns}x{rows} cells but holds {cells}")]
    ShapeMismatch {
        columns: usize,
        rows: usize,
        cells: usize,
    },

    #[error("invalid cell size: {0}")]
    InvalidCellSize(String),
}

impl ValidationError {
    /// Short machine-friendly reason, used as a structured log field.
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::MissingRates => "missing_rates",
            ValidationError::MissingCellWidth => "missing_cell_width",
            ValidationError::MissingCellHeight => "missing_cell_height",
            ValidationError::MissingOrigin => "missing_origin",
            ValidationError::ShapeMismatch { .. } => "shape_mismatch",
            ValidationError::InvalidCellSize(_) => "invalid_cell_size",
        }
    }
}
