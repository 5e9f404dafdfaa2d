//! Rate rasters for grid prescriptions.

use serde::{Deserialize, Serialize};

/// Positioning state recorded for a single raster cell.
///
/// Both flags may be set at once; the encoder decides which wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellCondition {
    #[serde(default)]
    pub signal_lost: bool,
    #[serde(default)]
    pub out_of_field: bool,
}

impl CellCondition {
    /// A cell inside the field with a valid position.
    pub fn in_field() -> Self {
        Self::default()
    }

    pub fn signal_lost() -> Self {
        Self {
            signal_lost: true,
            out_of_field: false,
        }
    }

    pub fn out_of_field() -> Self {
        Self {
            signal_lost: false,
            out_of_field: true,
        }
    }
}

/// One raster cell: a rate per product (by product position) and its condition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RasterCell {
    /// Rate per product position. `None` means no rate for that product.
    pub rates: Vec<Option<f64>>,
    #[serde(default)]
    pub condition: CellCondition,
}

impl RasterCell {
    /// A cell with every rate present and no special condition.
    pub fn with_rates(rates: &[f64]) -> Self {
        Self {
            rates: rates.iter().copied().map(Some).collect(),
            condition: CellCondition::in_field(),
        }
    }

    /// Set the condition of this cell.
    pub fn with_condition(mut self, condition: CellCondition) -> Self {
        self.condition = condition;
        self
    }

    /// Rate for the product at `position`, if present.
    pub fn rate(&self, position: usize) -> Option<f64> {
        self.rates.get(position).copied().flatten()
    }
}

/// A rectangular raster of cells in row-major order, row 0 at the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRaster {
    /// Number of cells in the east direction.
    pub columns: usize,
    /// Number of cells in the north direction.
    pub rows: usize,
    /// Cells, `rows * columns` of them.
    pub cells: Vec<RasterCell>,
}

impl RateRaster {
    /// Create a raster from its cells.
    pub fn new(columns: usize, rows: usize, cells: Vec<RasterCell>) -> Self {
        Self {
            columns,
            rows,
            cells,
        }
    }

    /// Build a single-product raster from rows of rates.
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let columns = rows.first().map(|r| r.len()).unwrap_or(0);
        let cells = rows
            .iter()
            .flat_map(|row| row.iter().map(|&rate| RasterCell::with_rates(&[rate])))
            .collect();
        Self::new(columns, rows.len(), cells)
    }

    /// Get the cell at a column/row position.
    pub fn get(&self, column: usize, row: usize) -> Option<&RasterCell> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        self.cells.get(self.flat_index(column, row))
    }

    /// Get a mutable cell at a column/row position.
    pub fn get_mut(&mut self, column: usize, row: usize) -> Option<&mut RasterCell> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        let index = self.flat_index(column, row);
        self.cells.get_mut(index)
    }

    /// Row-major flat index.
    pub fn flat_index(&self, column: usize, row: usize) -> usize {
        row * self.columns + column
    }

    /// Total number of cells the raster declares.
    pub fn len(&self) -> usize {
        self.columns * self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.columns == 0 || self.rows == 0
    }

    /// Whether the declared dimensions match the stored cell count.
    pub fn is_consistent(&self) -> bool {
        self.cells.len() == self.len()
    }
}
