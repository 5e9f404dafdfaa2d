//! Error types for the unit registry.

use thiserror::Error;

/// Result type for registry operations.
pub type UnitResult<T> = Result<T, UnitError>;

/// Errors raised while extending the unit registry.
///
/// Conversion itself never fails: a value that cannot be converted is
/// returned unconverted instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    #[error("unit code already registered: {0}")]
    DuplicateCode(String),

    #[error("invalid scale for unit '{code}': {scale}")]
    InvalidScale { code: String, scale: f64 },

    #[error("unknown unit: {0}")]
    UnknownUnit(String),
}
