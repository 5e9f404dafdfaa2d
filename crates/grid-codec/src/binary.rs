//! Header-less binary layout of a zone code grid.
//!
//! The payload is the grid's codes in row-major order, one fixed-width
//! unsigned integer per cell, little-endian when wider than a byte. There is
//! no header: the reader must know columns, rows and code width from the XML
//! grid element that references the file. Field equipment relies on this
//! layout, so it must not grow a header.

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GridCodecError, Result};
use crate::reducer::CodeGrid;
use crate::zone::ZoneCode;

/// Width of one cell code in the binary payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CodeWidth {
    /// One byte per cell, codes up to 255.
    One,
    /// Two bytes per cell, codes up to 65535.
    Two,
}

impl Default for CodeWidth {
    fn default() -> Self {
        Self::Two
    }
}

impl CodeWidth {
    pub fn bytes(&self) -> usize {
        match self {
            CodeWidth::One => 1,
            CodeWidth::Two => 2,
        }
    }

    /// Largest code representable at this width.
    pub fn max_code(&self) -> usize {
        match self {
            CodeWidth::One => u8::MAX as usize,
            CodeWidth::Two => u16::MAX as usize,
        }
    }

    /// Narrowest width that can hold `code`.
    pub fn for_max_code(code: usize) -> Option<Self> {
        if code <= CodeWidth::One.max_code() {
            Some(CodeWidth::One)
        } else if code <= CodeWidth::Two.max_code() {
            Some(CodeWidth::Two)
        } else {
            None
        }
    }

    pub fn from_bytes(bytes: usize) -> Option<Self> {
        match bytes {
            1 => Some(CodeWidth::One),
            2 => Some(CodeWidth::Two),
            _ => None,
        }
    }

    /// Recover the code width from a payload length and grid dimensions.
    pub fn infer(byte_len: usize, columns: usize, rows: usize) -> Option<Self> {
        let cells = columns.checked_mul(rows)?;
        if cells == 0 || byte_len % cells != 0 {
            return None;
        }
        Self::from_bytes(byte_len / cells)
    }

    /// Parse "1"/"2" (bytes) or "one"/"two", case-insensitive.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "one" | "u8" => Some(CodeWidth::One),
            "2" | "two" | "u16" => Some(CodeWidth::Two),
            _ => None,
        }
    }
}

impl std::fmt::Display for CodeWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-byte", self.bytes())
    }
}

/// An encoded grid payload and the dimensions needed to read it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedGrid {
    pub data: Bytes,
    pub width: CodeWidth,
    pub columns: usize,
    pub rows: usize,
}

impl EncodedGrid {
    /// Content type of the sibling binary artifact.
    pub const CONTENT_TYPE: &'static str = "application/octet-stream";
    /// File extension of the sibling binary artifact.
    pub const EXTENSION: &'static str = "BIN";

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Encodes and decodes code grids.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridBinaryCodec {
    ceiling: CodeWidth,
}

impl GridBinaryCodec {
    /// Create a codec that refuses codes wider than `ceiling`.
    pub fn new(ceiling: CodeWidth) -> Self {
        Self { ceiling }
    }

    pub fn ceiling(&self) -> CodeWidth {
        self.ceiling
    }

    /// Encode a grid with the narrowest width that fits its largest code.
    ///
    /// Fails with [`GridCodecError::EncodingOverflow`] when that width is
    /// above the ceiling; codes are never truncated.
    pub fn encode(&self, grid: &CodeGrid) -> Result<EncodedGrid> {
        if grid.codes.len() != grid.columns * grid.rows {
            return Err(GridCodecError::ShapeMismatch {
                columns: grid.columns,
                rows: grid.rows,
                cells: grid.codes.len(),
            });
        }

        let max_code = grid.max_code_value().max(ZoneCode::DEFAULT_VALUE);
        let width = CodeWidth::for_max_code(max_code)
            .filter(|width| *width <= self.ceiling)
            .ok_or(GridCodecError::EncodingOverflow {
                code: max_code,
                ceiling: self.ceiling,
            })?;

        let mut buf = BytesMut::with_capacity(grid.codes.len() * width.bytes());
        for code in &grid.codes {
            let value = code.value();
            match width {
                CodeWidth::One => buf.put_u8(value as u8),
                CodeWidth::Two => buf.put_u16_le(value as u16),
            }
        }

        debug!(
            columns = grid.columns,
            rows = grid.rows,
            width = width.bytes(),
            max_code = max_code,
            bytes = buf.len(),
            "Encoded zone code grid"
        );

        Ok(EncodedGrid {
            data: buf.freeze(),
            width,
            columns: grid.columns,
            rows: grid.rows,
        })
    }

    /// Decode a payload given its dimensions and code width.
    pub fn decode(
        &self,
        data: &[u8],
        columns: usize,
        rows: usize,
        width: CodeWidth,
    ) -> Result<CodeGrid> {
        let cells = columns * rows;
        let expected = cells * width.bytes();
        if data.len() != expected {
            return Err(GridCodecError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }

        let codes = data
            .chunks_exact(width.bytes())
            .enumerate()
            .map(|(index, chunk)| {
                let value = match width {
                    CodeWidth::One => chunk[0] as usize,
                    CodeWidth::Two => u16::from_le_bytes([chunk[0], chunk[1]]) as usize,
                };
                ZoneCode::from_value(value)
                    .ok_or(GridCodecError::InvalidCode { code: value, index })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CodeGrid::new(columns, rows, codes))
    }

    /// Decode an [`EncodedGrid`] using its own dimensions.
    pub fn decode_encoded(&self, encoded: &EncodedGrid) -> Result<CodeGrid> {
        self.decode(&encoded.data, encoded.columns, encoded.rows, encoded.width)
    }
}
