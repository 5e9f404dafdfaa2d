//! The raster prescription handed to the encoder by the catalog.

use serde::{Deserialize, Serialize};

use crate::catalog::ReferenceId;
use crate::error::{ValidationError, ValidationResult};
use crate::geo::{GeoPoint, Quantity};
use crate::grid::RateRaster;

/// A variable-rate raster prescription.
///
/// Optional members mirror what a catalog may hand over; [`Prescription::validate`]
/// decides whether the prescription can be encoded at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    /// Internal catalog id.
    pub id: ReferenceId,
    pub description: String,
    /// Field this prescription applies to.
    pub field_id: ReferenceId,
    /// South-west corner of the raster.
    #[serde(default)]
    pub origin: Option<GeoPoint>,
    /// Cell extent in the east direction.
    #[serde(default)]
    pub cell_width: Option<Quantity>,
    /// Cell extent in the north direction.
    #[serde(default)]
    pub cell_height: Option<Quantity>,
    #[serde(default)]
    pub rates: Option<RateRaster>,
    /// Unit code of every raster rate.
    #[serde(default)]
    pub rate_unit: Option<String>,
    /// Products, in the order of each cell's rate vector.
    #[serde(default)]
    pub product_ids: Vec<ReferenceId>,
    #[serde(default)]
    pub loss_of_signal_rate: Option<Quantity>,
    #[serde(default)]
    pub out_of_field_rate: Option<Quantity>,
}

impl Prescription {
    /// Create an empty prescription for a field; everything else unset.
    pub fn new(id: ReferenceId, description: impl Into<String>, field_id: ReferenceId) -> Self {
        Self {
            id,
            description: description.into(),
            field_id,
            origin: None,
            cell_width: None,
            cell_height: None,
            rates: None,
            rate_unit: None,
            product_ids: Vec::new(),
            loss_of_signal_rate: None,
            out_of_field_rate: None,
        }
    }

    /// Check that the prescription carries everything needed to encode it.
    ///
    /// Rates, cell width, cell height and origin must all be present and the
    /// raster must hold exactly `columns * rows` cells.
    pub fn validate(&self) -> ValidationResult<()> {
        let rates = self.rates.as_ref().ok_or(ValidationError::MissingRates)?;
        let width = self
            .cell_width
            .as_ref()
            .ok_or(ValidationError::MissingCellWidth)?;
        let height = self
            .cell_height
            .as_ref()
            .ok_or(ValidationError::MissingCellHeight)?;
        if self.origin.is_none() {
            return Err(ValidationError::MissingOrigin);
        }

        if !rates.is_consistent() {
            return Err(ValidationError::ShapeMismatch {
                columns: rates.columns,
                rows: rates.rows,
                cells: rates.cells.len(),
            });
        }

        for (name, size) in [("width", width), ("height", height)] {
            if !(size.value.is_finite() && size.value > 0.0) {
                return Err(ValidationError::InvalidCellSize(format!(
                    "cell {} must be positive, got {}",
                    name, size.value
                )));
            }
        }

        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
