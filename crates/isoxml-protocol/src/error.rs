//! Error types for task data encoding and decoding.

use grid_codec::{CodeWidth, GridCodecError};
use isoxml_common::ValidationError;
use thiserror::Error;

/// Result type alias using CodecError.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised while turning prescriptions into task data and back.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The prescription is incomplete; it is skipped without artifacts.
    #[error("invalid prescription: {0}")]
    Validation(#[from] ValidationError),

    /// A zone code does not fit the configured code width.
    #[error("zone code {code} does not fit the {ceiling} code width")]
    EncodingOverflow { code: usize, ceiling: CodeWidth },

    #[error("grid error: {0}")]
    Grid(GridCodecError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("<{element}> is missing attribute {attribute}")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("<{element}> attribute {attribute} has invalid value '{value}'")]
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },

    #[error("<{parent}> has no <{element}> child")]
    MissingElement {
        parent: &'static str,
        element: &'static str,
    },

    #[error("unknown value presentation: {0}")]
    UnknownPresentation(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<GridCodecError> for CodecError {
    fn from(err: GridCodecError) -> Self {
        match err {
            GridCodecError::EncodingOverflow { code, ceiling } => {
                CodecError::EncodingOverflow { code, ceiling }
            }
            other => CodecError::Grid(other),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for CodecError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        CodecError::Xml(err.into())
    }
}

impl CodecError {
    /// Whether this error only affects the prescription being encoded.
    ///
    /// Sink and XML failures are not; they end the batch.
    pub fn is_per_prescription(&self) -> bool {
        !matches!(self, CodecError::Io(_) | CodecError::Xml(_))
    }
}
