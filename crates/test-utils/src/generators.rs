//! Raster generators for synthetic prescriptions.
//!
//! These create predictable rate patterns so tests can check zone counts and
//! code layouts without hand-writing large rasters.

use isoxml_common::{CellCondition, RasterCell, RateRaster};

/// Creates a single-product raster where cell `(col, row)` has rate
/// `(col + row) % levels`, scaled by `step`.
///
/// The raster uses exactly `levels` distinct rates (when it is large enough),
/// one of which is 0 and maps to the default zone.
///
/// ```
/// use test_utils::create_banded_raster;
///
/// let raster = create_banded_raster(4, 3, 3, 10.0);
/// assert_eq!(raster.cells.len(), 12);
/// assert_eq!(raster.get(0, 0).unwrap().rate(0), Some(0.0));
/// assert_eq!(raster.get(1, 0).unwrap().rate(0), Some(10.0));
/// assert_eq!(raster.get(2, 1).unwrap().rate(0), Some(0.0));
/// ```
pub fn create_banded_raster(columns: usize, rows: usize, levels: usize, step: f64) -> RateRaster {
    let levels = levels.max(1);
    let mut cells = Vec::with_capacity(columns * rows);
    for row in 0..rows {
        for col in 0..columns {
            let rate = ((col + row) % levels) as f64 * step;
            cells.push(RasterCell::with_rates(&[rate]));
        }
    }
    RateRaster::new(columns, rows, cells)
}

/// Creates a raster in which every cell has a different, non-zero rate.
///
/// Useful for forcing a given number of ordinary zones.
pub fn create_unique_raster(columns: usize, rows: usize) -> RateRaster {
    let cells = (0..columns * rows)
        .map(|i| RasterCell::with_rates(&[(i + 1) as f64]))
        .collect();
    RateRaster::new(columns, rows, cells)
}

/// Creates a raster with one rate per product for every cell.
///
/// Product `p` at cell `(col, row)` gets `base[p] + col * col_step`.
pub fn create_multi_product_raster(
    columns: usize,
    rows: usize,
    base: &[f64],
    col_step: f64,
) -> RateRaster {
    let mut cells = Vec::with_capacity(columns * rows);
    for _row in 0..rows {
        for col in 0..columns {
            let rates: Vec<f64> = base.iter().map(|b| b + col as f64 * col_step).collect();
            cells.push(RasterCell::with_rates(&rates));
        }
    }
    RateRaster::new(columns, rows, cells)
}

/// Marks a border of cells `width` wide as out of field.
pub fn mark_border_out_of_field(raster: &mut RateRaster, width: usize) {
    let (columns, rows) = (raster.columns, raster.rows);
    for row in 0..rows {
        for col in 0..columns {
            let on_border = col < width
                || row < width
                || col + width >= columns
                || row + width >= rows;
            if on_border {
                if let Some(cell) = raster.get_mut(col, row) {
                    cell.condition.out_of_field = true;
                }
            }
        }
    }
}

/// Marks the given cells as having lost the positioning signal.
pub fn mark_signal_lost(raster: &mut RateRaster, cells: &[(usize, usize)]) {
    for &(col, row) in cells {
        if let Some(cell) = raster.get_mut(col, row) {
            cell.condition = CellCondition {
                signal_lost: true,
                ..cell.condition
            };
        }
    }
}
