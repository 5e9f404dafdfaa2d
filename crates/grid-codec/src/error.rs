//! Error types for zone reduction and grid encoding.

use thiserror::Error;

use crate::binary::CodeWidth;

/// Errors that can occur while reducing or encoding a grid.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridCodecError {
    /// A zone code does not fit the widest code width allowed.
    #[error("zone code {code} exceeds the {ceiling} code width ceiling")]
    EncodingOverflow { code: usize, ceiling: CodeWidth },

    /// The binary payload does not hold `columns * rows` codes.
    #[error("grid payload is {actual} bytes, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    /// The raster dimensions disagree with its cell count.
    #[error("grid declares {columns}x{rows} cells but holds {cells}")]
    ShapeMismatch {
        columns: usize,
        rows: usize,
        cells: usize,
    },

    /// A decoded code is not a valid zone code.
    #[error("invalid zone code {code} at cell {index}")]
    InvalidCode { code: usize, index: usize },

    /// A code in the grid has no zone in the table.
    #[error("zone code {0} is not in the zone table")]
    UnknownZoneCode(usize),
}

/// Result type for grid codec operations.
pub type Result<T> = std::result::Result<T, GridCodecError>;
