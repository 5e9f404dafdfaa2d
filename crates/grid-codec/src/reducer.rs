//! Reduction of a dense rate raster into treatment zones and a code grid.

use std::collections::HashMap;

use tracing::debug;

use isoxml_common::{Quantity, RasterCell, RateRaster};
use unit_system::{Unit, UnitConverter};

use crate::error::{GridCodecError, Result};
use crate::zone::{DataVariable, TreatmentZone, ZoneCode, ZoneKey, ZoneTable};

pub const DEFAULT_ZONE_NAME: &str = "Default";
pub const LOSS_OF_SIGNAL_ZONE_NAME: &str = "Loss of GPS";
pub const OUT_OF_FIELD_ZONE_NAME: &str = "Out of Field";

/// A product that resolved to an ISO id, with the position of its rate in
/// each cell's rate vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductColumn {
    pub product_id: String,
    pub position: usize,
}

impl ProductColumn {
    pub fn new(product_id: impl Into<String>, position: usize) -> Self {
        Self {
            product_id: product_id.into(),
            position,
        }
    }
}

/// Everything the reducer reads. Nothing here is mutated.
#[derive(Debug, Clone, Copy)]
pub struct ReductionInput<'a> {
    pub raster: &'a RateRaster,
    /// Products in prescription order. Unresolved products are left out.
    pub products: &'a [ProductColumn],
    /// Unit code of every raster rate.
    pub rate_unit: Option<&'a str>,
    /// Canonical unit for the rate dimension, if one could be determined.
    pub canonical: Option<&'a Unit>,
    pub loss_of_signal: Option<&'a Quantity>,
    pub out_of_field: Option<&'a Quantity>,
}

/// Zone codes for every cell, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeGrid {
    pub columns: usize,
    pub rows: usize,
    pub codes: Vec<ZoneCode>,
}

impl CodeGrid {
    pub fn new(columns: usize, rows: usize, codes: Vec<ZoneCode>) -> Self {
        Self {
            columns,
            rows,
            codes,
        }
    }

    pub fn get(&self, column: usize, row: usize) -> Option<ZoneCode> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        self.codes.get(row * self.columns + column).copied()
    }

    /// Numeric codes, one `Vec` per row.
    pub fn to_rows(&self) -> Vec<Vec<usize>> {
        if self.columns == 0 {
            return vec![Vec::new(); self.rows];
        }
        self.codes
            .chunks(self.columns)
            .map(|row| row.iter().map(|code| code.value()).collect())
            .collect()
    }

    /// Highest numeric code used by any cell.
    pub fn max_code_value(&self) -> usize {
        self.codes.iter().map(|code| code.value()).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Output of a reduction.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    pub zones: ZoneTable,
    pub grid: CodeGrid,
}

impl Reduction {
    pub fn has_loss_of_signal_zone(&self) -> bool {
        self.zones.contains(ZoneCode::LossOfSignal)
    }

    pub fn has_out_of_field_zone(&self) -> bool {
        self.zones.contains(ZoneCode::OutOfField)
    }
}

/// Reduces rasters to zone tables. Holds no per-grid state.
#[derive(Debug, Clone, Copy)]
pub struct GridReducer<'c> {
    converter: &'c UnitConverter,
}

impl<'c> GridReducer<'c> {
    pub fn new(converter: &'c UnitConverter) -> Self {
        Self { converter }
    }

    /// Build the zone table and code grid for a raster.
    ///
    /// The default zone always comes first with code 1. The loss-of-signal and
    /// out-of-field zones follow when they hold at least one variable and at
    /// least one cell is assigned to them. Overlay rates on a grid with no
    /// flagged cells are therefore dropped: a terminal that loses signal at
    /// run time gets no `I`/`J` fallback zone from such a task. A flagged
    /// cell whose overlay zone is not emitted keeps its own rate zone.
    /// Ordinary zones are appended in the order their first cell is met in a
    /// row-major scan, so identical input always yields identical output.
    pub fn reduce(&self, input: &ReductionInput<'_>) -> Result<Reduction> {
        let raster = input.raster;
        if !raster.is_consistent() {
            return Err(GridCodecError::ShapeMismatch {
                columns: raster.columns,
                rows: raster.rows,
                cells: raster.cells.len(),
            });
        }

        let default_zone = self.build_zone(DEFAULT_ZONE_NAME, input, |_| {
            Some((0.0, input.rate_unit))
        });
        let loss_zone = self.overlay_zone(LOSS_OF_SIGNAL_ZONE_NAME, input, input.loss_of_signal);
        let out_zone = self.overlay_zone(OUT_OF_FIELD_ZONE_NAME, input, input.out_of_field);

        let default_key = default_zone.key();
        let loss_emitted =
            !loss_zone.is_empty() && raster.cells.iter().any(|c| c.condition.signal_lost);
        let out_emitted = !out_zone.is_empty()
            && raster.cells.iter().any(|c| {
                c.condition.out_of_field && !(c.condition.signal_lost && loss_emitted)
            });

        let mut zones = ZoneTable::new();
        zones.push(ZoneCode::Default, default_zone);
        if loss_emitted {
            zones.push(ZoneCode::LossOfSignal, loss_zone);
        }
        if out_emitted {
            zones.push(ZoneCode::OutOfField, out_zone);
        }

        let mut ordinary: HashMap<ZoneKey, ZoneCode> = HashMap::new();
        let mut ordinary_zones: Vec<(ZoneCode, TreatmentZone)> = Vec::new();
        let mut codes = Vec::with_capacity(raster.cells.len());

        for cell in &raster.cells {
            let code = if cell.condition.signal_lost && loss_emitted {
                ZoneCode::LossOfSignal
            } else if cell.condition.out_of_field && out_emitted {
                ZoneCode::OutOfField
            } else {
                let zone = self.cell_zone(cell, input);
                let key = zone.key();
                if zone.is_empty() || key == default_key {
                    ZoneCode::Default
                } else if let Some(code) = ordinary.get(&key) {
                    *code
                } else {
                    let code = ZoneCode::Ordinary(ordinary_zones.len());
                    let mut zone = zone;
                    zone.name = format!("Zone {}", code.value());
                    ordinary.insert(key, code);
                    ordinary_zones.push((code, zone));
                    code
                }
            };
            codes.push(code);
        }

        for (code, zone) in ordinary_zones {
            zones.push(code, zone);
        }

        debug!(
            columns = raster.columns,
            rows = raster.rows,
            products = input.products.len(),
            zones = zones.len(),
            loss_of_signal = loss_emitted,
            out_of_field = out_emitted,
            "Reduced raster to treatment zones"
        );

        Ok(Reduction {
            zones,
            grid: CodeGrid::new(raster.columns, raster.rows, codes),
        })
    }

    fn cell_zone(&self, cell: &RasterCell, input: &ReductionInput<'_>) -> TreatmentZone {
        self.build_zone("", input, |product| {
            cell.rate(product.position).map(|rate| (rate, input.rate_unit))
        })
    }

    fn overlay_zone(
        &self,
        name: &str,
        input: &ReductionInput<'_>,
        overlay: Option<&Quantity>,
    ) -> TreatmentZone {
        self.build_zone(name, input, |_| {
            overlay.map(|q| (q.value, q.unit.as_deref()))
        })
    }

    /// Build a zone with one variable per product that has a value.
    fn build_zone<'u, F>(&self, name: &str, input: &ReductionInput<'_>, mut value_of: F) -> TreatmentZone
    where
        F: FnMut(&ProductColumn) -> Option<(f64, Option<&'u str>)>,
    {
        let mut zone = TreatmentZone::new(name);
        for product in input.products {
            let Some((value, unit)) = value_of(product) else {
                continue;
            };
            let conversion = self.converter.to_canonical(value, unit, input.canonical);
            if let Some(variable) = DataVariable::from_conversion(product.product_id.clone(), conversion) {
                zone.push(variable);
            }
        }
        zone
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isoxml_common::CellCondition;

    fn products(n: usize) -> Vec<ProductColumn> {
        (0..n).map(|i| ProductColumn::new(format!("PDT{}", i + 1), i)).collect()
    }

    fn input<'a>(
        raster: &'a RateRaster,
        products: &'a [ProductColumn],
        loss: Option<&'a Quantity>,
        out: Option<&'a Quantity>,
    ) -> ReductionInput<'a> {
        ReductionInput {
            raster,
            products,
            rate_unit: None,
            canonical: None,
            loss_of_signal: loss,
            out_of_field: out,
        }
    }

    #[test]
    fn test_two_by_two_without_overlay_cells() {
        let converter = UnitConverter::default();
        let raster = RateRaster::from_rows(&[vec![5.0, 5.0], vec![0.0, 0.0]]);
        let products = products(1);
        let loss = Quantity::unitless(9.0);
        let out = Quantity::unitless(3.0);

        let reduction = GridReducer::new(&converter)
            .reduce(&input(&raster, &products, Some(&loss), Some(&out)))
            .unwrap();

        assert_eq!(reduction.grid.to_rows(), vec![vec![2, 2], vec![1, 1]]);
        assert_eq!(reduction.zones.get(ZoneCode::Default).unwrap().variables[0].value, 0.0);
        assert_eq!(
            reduction.zones.get(ZoneCode::Ordinary(0)).unwrap().variables[0].value,
            5.0
        );
        // overlay rates are set but no cell uses them
        assert_eq!(reduction.zones.len(), 2);
        assert!(!reduction.has_loss_of_signal_zone());
        assert!(!reduction.has_out_of_field_zone());
    }

    #[test]
    fn test_loss_of_signal_cell() {
        let converter = UnitConverter::default();
        let mut raster = RateRaster::from_rows(&[vec![5.0, 5.0], vec![0.0, 0.0]]);
        raster.get_mut(0, 0).unwrap().condition = CellCondition::signal_lost();
        let products = products(1);
        let loss = Quantity::unitless(9.0);
        let out = Quantity::unitless(3.0);

        let reduction = GridReducer::new(&converter)
            .reduce(&input(&raster, &products, Some(&loss), Some(&out)))
            .unwrap();

        assert_eq!(reduction.grid.to_rows(), vec![vec![253, 2], vec![1, 1]]);
        assert_eq!(
            reduction.zones.get(ZoneCode::LossOfSignal).unwrap().variables[0].value,
            9.0
        );
        assert!(!reduction.has_out_of_field_zone());
        let codes: Vec<usize> = reduction.zones.iter().map(|e| e.code.value()).collect();
        assert_eq!(codes, vec![1, 253, 2]);
    }

    #[test]
    fn test_loss_of_signal_wins_over_out_of_field() {
        let converter = UnitConverter::default();
        let mut raster = RateRaster::from_rows(&[vec![5.0, 5.0]]);
        raster.get_mut(0, 0).unwrap().condition = CellCondition {
            signal_lost: true,
            out_of_field: true,
        };
        raster.get_mut(1, 0).unwrap().condition = CellCondition::out_of_field();
        let products = products(1);
        let loss = Quantity::unitless(9.0);
        let out = Quantity::unitless(3.0);

        let reduction = GridReducer::new(&converter)
            .reduce(&input(&raster, &products, Some(&loss), Some(&out)))
            .unwrap();

        assert_eq!(reduction.grid.to_rows(), vec![vec![253, 254]]);
    }

    #[test]
    fn test_absent_overlay_zone_is_not_used() {
        let converter = UnitConverter::default();
        let mut raster = RateRaster::from_rows(&[vec![5.0, 0.0]]);
        raster.get_mut(0, 0).unwrap().condition = CellCondition::signal_lost();
        raster.get_mut(1, 0).unwrap().condition = CellCondition::out_of_field();
        let products = products(1);

        let reduction = GridReducer::new(&converter)
            .reduce(&input(&raster, &products, None, None))
            .unwrap();

        assert!(!reduction.has_loss_of_signal_zone());
        assert!(!reduction.has_out_of_field_zone());
        assert_eq!(reduction.grid.to_rows(), vec![vec![2, 1]]);
    }

    #[test]
    fn test_empty_product_list() {
        let converter = UnitConverter::default();
        let raster = RateRaster::from_rows(&[vec![5.0, 7.0], vec![1.0, 0.0]]);
        let loss = Quantity::unitless(9.0);

        let reduction = GridReducer::new(&converter)
            .reduce(&input(&raster, &[], Some(&loss), None))
            .unwrap();

        assert_eq!(reduction.zones.len(), 1);
        assert!(reduction.zones.get(ZoneCode::Default).unwrap().is_empty());
        assert!(reduction.grid.codes.iter().all(|c| *c == ZoneCode::Default));
    }

    #[test]
    fn test_first_seen_order_and_reuse() {
        let converter = UnitConverter::default();
        let raster = RateRaster::from_rows(&[vec![7.0, 3.0, 7.0], vec![3.0, 0.0, 9.0]]);
        let products = products(1);

        let reduction = GridReducer::new(&converter)
            .reduce(&input(&raster, &products, None, None))
            .unwrap();

        assert_eq!(reduction.grid.to_rows(), vec![vec![2, 3, 2], vec![3, 1, 4]]);
        let codes: Vec<usize> = reduction.zones.iter().map(|e| e.code.value()).collect();
        assert_eq!(codes, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_missing_product_rate_is_omitted() {
        let converter = UnitConverter::default();
        let cells = vec![
            RasterCell {
                rates: vec![Some(4.0), None],
                condition: CellCondition::in_field(),
            },
            RasterCell {
                rates: vec![Some(4.0), Some(0.0)],
                condition: CellCondition::in_field(),
            },
        ];
        let raster = RateRaster::new(2, 1, cells);
        let products = products(2);

        let reduction = GridReducer::new(&converter)
            .reduce(&input(&raster, &products, None, None))
            .unwrap();

        let first = reduction.zones.get(ZoneCode::Ordinary(0)).unwrap();
        assert_eq!(first.variables.len(), 1);
        let second = reduction.zones.get(ZoneCode::Ordinary(1)).unwrap();
        assert_eq!(second.variables.len(), 2);
        assert_eq!(second.variables[1].value, 0.0);
    }

    #[test]
    fn test_cell_without_rates_uses_default_zone() {
        let converter = UnitConverter::default();
        let raster = RateRaster::new(1, 1, vec![RasterCell::default()]);
        let products = products(1);

        let reduction = GridReducer::new(&converter)
            .reduce(&input(&raster, &products, None, None))
            .unwrap();

        assert_eq!(reduction.grid.codes, vec![ZoneCode::Default]);
    }

    #[test]
    fn test_shape_mismatch() {
        let converter = UnitConverter::default();
        let mut raster = RateRaster::from_rows(&[vec![1.0, 2.0]]);
        raster.rows = 2;
        let err = GridReducer::new(&converter)
            .reduce(&input(&raster, &products(1), None, None))
            .unwrap_err();
        assert!(matches!(err, GridCodecError::ShapeMismatch { .. }));
    }
}
