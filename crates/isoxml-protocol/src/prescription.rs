//! Encoding raster prescriptions as grid tasks.
//!
//! Each prescription goes through three steps:
//!
//! 1. **Prepare** (pure, parallel in batches): validate, reduce the raster to
//!    treatment zones, encode the binary grid and size the cells in degrees.
//! 2. **Register** value presentations for every user unit in its zones.
//! 3. **Write** (serial): allocate ids, then the binary grid and the `TSK`
//!    element go to the sink back to back.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use grid_codec::{
    CodeWidth, EncodedGrid, GridBinaryCodec, GridReducer, ProductColumn, Reduction,
    ReductionInput, ZoneCode,
};
use isoxml_common::{
    resolve_product, Catalog, GeoPoint, IdGenerator, OwnerChain, Prescription, Quantity,
    ReferenceId, ValidationError,
};
use unit_system::UnitConverter;

use crate::config::CodecConfig;
use crate::document::TaskDataDocument;
use crate::error::{CodecError, CodecResult};
use crate::sink::TaskDataSink;
use crate::task::{GridDefinition, Task, GRID_TYPE_ZONE_CODES, TASK_PREFIX, TASK_STATUS_PLANNED};
use crate::writer::TaskDataWriter;

/// A prescription reduced and encoded, waiting for ids.
#[derive(Debug, Clone)]
pub struct PreparedGrid {
    pub prescription_id: ReferenceId,
    pub description: String,
    pub owners: OwnerChain,
    pub reduction: Reduction,
    pub encoded: EncodedGrid,
    pub origin: GeoPoint,
    /// Cell size along the meridian, degrees.
    pub cell_north: f64,
    /// Cell size along the parallel, degrees.
    pub cell_east: f64,
}

/// What was written for one prescription.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSummary {
    pub prescription_id: ReferenceId,
    pub task_id: String,
    /// Binary artifact name, with extension.
    pub grid_file: String,
    pub zones: usize,
    pub code_width: CodeWidth,
}

/// Outcome of [`PrescriptionCodec::encode_all`].
#[derive(Debug, Default)]
pub struct BatchReport {
    pub encoded: Vec<TaskSummary>,
    /// Prescriptions that failed validation.
    pub skipped: Vec<(ReferenceId, ValidationError)>,
    /// Prescriptions that were valid but could not be encoded.
    pub failed: Vec<(ReferenceId, CodecError)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.encoded.len() + self.skipped.len() + self.failed.len()
    }

    /// Every prescription was encoded.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }
}

/// Turns prescriptions into grid tasks.
#[derive(Debug, Clone)]
pub struct PrescriptionCodec {
    config: CodecConfig,
    converter: UnitConverter,
}

impl PrescriptionCodec {
    /// Create a codec with the built-in unit table.
    pub fn new(config: CodecConfig) -> CodecResult<Self> {
        Self::with_converter(config, UnitConverter::default())
    }

    pub fn with_converter(config: CodecConfig, converter: UnitConverter) -> CodecResult<Self> {
        config.validate().map_err(CodecError::Config)?;
        Ok(Self { config, converter })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn converter(&self) -> &UnitConverter {
        &self.converter
    }

    /// Validate, reduce and binary-encode one prescription.
    ///
    /// Touches no shared state, so prescriptions can be prepared in parallel.
    pub fn prepare<C: Catalog + ?Sized>(
        &self,
        prescription: &Prescription,
        catalog: &C,
    ) -> CodecResult<PreparedGrid> {
        prescription.validate()?;

        let (Some(raster), Some(origin), Some(width), Some(height)) = (
            prescription.rates.as_ref(),
            prescription.origin,
            prescription.cell_width.as_ref(),
            prescription.cell_height.as_ref(),
        ) else {
            // validate() already checked these
            return Err(ValidationError::MissingRates.into());
        };

        let (cell_north, cell_east) = self.cell_size_degrees(origin, width, height)?;

        let products: Vec<ProductColumn> = prescription
            .product_ids
            .iter()
            .enumerate()
            .filter_map(|(position, id)| match resolve_product(catalog, *id) {
                Some(iso_id) => Some(ProductColumn::new(iso_id, position)),
                None => {
                    debug!(
                        prescription_id = prescription.id,
                        product = *id,
                        "Product not in catalog, rates dropped"
                    );
                    None
                }
            })
            .collect();

        let rate_unit = prescription.rate_unit.as_deref();
        let canonical = rate_unit.and_then(|code| self.converter.canonical_for_code(code));
        let input = ReductionInput {
            raster,
            products: &products,
            rate_unit,
            canonical,
            loss_of_signal: prescription.loss_of_signal_rate.as_ref(),
            out_of_field: prescription.out_of_field_rate.as_ref(),
        };

        let reduction = GridReducer::new(&self.converter).reduce(&input)?;
        let encoded = GridBinaryCodec::new(self.config.grid.max_code_width).encode(&reduction.grid)?;

        Ok(PreparedGrid {
            prescription_id: prescription.id,
            description: prescription.description.clone(),
            owners: OwnerChain::resolve(catalog, prescription.field_id),
            reduction,
            encoded,
            origin,
            cell_north,
            cell_east,
        })
    }

    /// Encode one prescription into a document.
    ///
    /// Nothing is written when the prescription is invalid or its grid
    /// overflows the code width.
    pub fn encode_prescription<C, S, G>(
        &self,
        prescription: &Prescription,
        catalog: &C,
        document: &mut TaskDataDocument<S, G>,
    ) -> CodecResult<TaskSummary>
    where
        C: Catalog + ?Sized,
        S: TaskDataSink,
        G: IdGenerator,
    {
        let prepared = self.prepare(prescription, catalog)?;
        self.register_presentations(&prepared, document);
        self.flush_presentations(document)?;
        self.write_task(&prepared, document)
    }

    /// Encode every prescription in the catalog.
    ///
    /// Invalid prescriptions are skipped and overflowing grids reported; the
    /// rest still encode. Only sink and XML failures abort the batch.
    /// Value presentations for the whole batch are written ahead of the
    /// first task.
    pub fn encode_all<C, S, G>(
        &self,
        catalog: &C,
        document: &mut TaskDataDocument<S, G>,
    ) -> CodecResult<BatchReport>
    where
        C: Catalog + ?Sized,
        S: TaskDataSink,
        G: IdGenerator,
    {
        let prescriptions = catalog.prescriptions();
        let prepared: Vec<CodecResult<PreparedGrid>> = if self.config.parallel {
            prescriptions
                .par_iter()
                .map(|prescription| self.prepare(prescription, catalog))
                .collect()
        } else {
            prescriptions
                .iter()
                .map(|prescription| self.prepare(prescription, catalog))
                .collect()
        };

        for grid in prepared.iter().flatten() {
            self.register_presentations(grid, document);
        }
        self.flush_presentations(document)?;

        let mut report = BatchReport::default();
        for (prescription, result) in prescriptions.iter().zip(prepared) {
            match result {
                Ok(grid) => report.encoded.push(self.write_task(&grid, document)?),
                Err(CodecError::Validation(err)) => {
                    warn!(
                        prescription_id = prescription.id,
                        reason = err.reason(),
                        error = %err,
                        "Skipping invalid prescription"
                    );
                    report.skipped.push((prescription.id, err));
                }
                Err(err) if err.is_per_prescription() => {
                    warn!(
                        prescription_id = prescription.id,
                        error = %err,
                        "Failed to encode prescription"
                    );
                    report.failed.push((prescription.id, err));
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            encoded = report.encoded.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Encoded prescription batch"
        );

        Ok(report)
    }

    /// Convert cell width and height to degrees at the origin.
    fn cell_size_degrees(
        &self,
        origin: GeoPoint,
        width: &Quantity,
        height: &Quantity,
    ) -> CodecResult<(f64, f64)> {
        let north_m = self.to_metres(height, "height")?;
        let east_m = self.to_metres(width, "width")?;
        origin.metres_to_degrees(north_m, east_m).ok_or_else(|| {
            ValidationError::InvalidCellSize(format!(
                "no east extent at latitude {}",
                origin.latitude
            ))
            .into()
        })
    }

    /// A size without a unit is taken to be in metres.
    fn to_metres(&self, size: &Quantity, which: &str) -> CodecResult<f64> {
        match size.unit.as_deref() {
            None => Ok(size.value),
            Some(code) => self
                .converter
                .convert_codes(size.value, code, "m")
                .ok_or_else(|| {
                    ValidationError::InvalidCellSize(format!(
                        "cell {} unit '{}' is not a length",
                        which, code
                    ))
                    .into()
                }),
        }
    }

    fn register_presentations<S, G>(
        &self,
        prepared: &PreparedGrid,
        document: &mut TaskDataDocument<S, G>,
    ) where
        S: TaskDataSink,
        G: IdGenerator,
    {
        for entry in &prepared.reduction.zones {
            for variable in &entry.zone.variables {
                document.presentations.register(
                    &variable.unit,
                    self.config.vpn_decimals,
                    &mut document.ids,
                );
            }
        }
    }

    fn flush_presentations<S, G>(&self, document: &mut TaskDataDocument<S, G>) -> CodecResult<()>
    where
        S: TaskDataSink,
        G: IdGenerator,
    {
        let xml = {
            let registry = self.converter.registry();
            let pending = document.presentations.take_unwritten().to_vec();
            if pending.is_empty() {
                return Ok(());
            }
            TaskDataWriter::new(registry, &document.presentations, self.config.vpn_decimals)
                .presentations_xml(&pending)?
        };
        document.sink.write_xml(&xml)
    }

    fn write_task<S, G>(
        &self,
        prepared: &PreparedGrid,
        document: &mut TaskDataDocument<S, G>,
    ) -> CodecResult<TaskSummary>
    where
        S: TaskDataSink,
        G: IdGenerator,
    {
        let task_id = document.ids.next_id(TASK_PREFIX);
        let file_name = document
            .ids
            .next_file_name(&self.config.grid.grid_file_prefix);

        let zones = &prepared.reduction.zones;
        let task = Task {
            id: task_id.clone(),
            description: prepared.description.clone(),
            owners: prepared.owners.clone(),
            status: TASK_STATUS_PLANNED,
            loss_of_signal_code: prepared
                .reduction
                .has_loss_of_signal_zone()
                .then_some(ZoneCode::LossOfSignal),
            out_of_field_code: prepared
                .reduction
                .has_out_of_field_zone()
                .then_some(ZoneCode::OutOfField),
            zones: zones.clone(),
            grid: GridDefinition {
                origin: prepared.origin,
                cell_north: prepared.cell_north,
                cell_east: prepared.cell_east,
                columns: prepared.encoded.columns,
                rows: prepared.encoded.rows,
                file_name,
                file_length: prepared.encoded.len(),
                grid_type: GRID_TYPE_ZONE_CODES,
                default_code: ZoneCode::Default,
            },
        };

        let xml = TaskDataWriter::new(
            self.converter.registry(),
            &document.presentations,
            self.config.vpn_decimals,
        )
        .task_xml(&task)?;

        let grid_file = task.grid.binary_name();
        document.sink.write_binary(&grid_file, &prepared.encoded.data)?;
        document.sink.write_xml(&xml)?;

        info!(
            prescription_id = prepared.prescription_id,
            task_id = %task_id,
            zones = zones.len(),
            width = %prepared.encoded.width,
            grid_file = %grid_file,
            "Encoded prescription"
        );

        Ok(TaskSummary {
            prescription_id: prepared.prescription_id,
            task_id,
            grid_file,
            zones: zones.len(),
            code_width: prepared.encoded.width,
        })
    }
}
