//! In-memory form of a grid task (`TSK`) and its grid (`GRD`).

use grid_codec::{CodeWidth, EncodedGrid, ZoneCode, ZoneTable};
use isoxml_common::{GeoPoint, OwnerChain};

/// Element prefix of task ids.
pub const TASK_PREFIX: &str = "TSK";

/// Task status written on new tasks: planned.
pub const TASK_STATUS_PLANNED: u8 = 1;

/// Grid type whose cells hold treatment zone codes.
pub const GRID_TYPE_ZONE_CODES: u8 = 1;

/// Placement and storage of a task's binary grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridDefinition {
    /// South-west corner of cell (0, 0).
    pub origin: GeoPoint,
    /// Cell size along the meridian, degrees.
    pub cell_north: f64,
    /// Cell size along the parallel, degrees.
    pub cell_east: f64,
    pub columns: usize,
    pub rows: usize,
    /// File name stem, without extension.
    pub file_name: String,
    /// Payload length in bytes.
    pub file_length: usize,
    pub grid_type: u8,
    pub default_code: ZoneCode,
}

impl GridDefinition {
    /// File name of the binary artifact, with extension.
    pub fn binary_name(&self) -> String {
        format!("{}.{}", self.file_name, EncodedGrid::EXTENSION)
    }

    /// Code width implied by the recorded file length.
    pub fn code_width(&self) -> Option<CodeWidth> {
        CodeWidth::infer(self.file_length, self.columns, self.rows)
    }
}

/// A grid task as written to and read from task data.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub description: String,
    /// Customer, farm and field ids; absent links are not written.
    pub owners: OwnerChain,
    pub status: u8,
    pub loss_of_signal_code: Option<ZoneCode>,
    pub out_of_field_code: Option<ZoneCode>,
    pub zones: ZoneTable,
    pub grid: GridDefinition,
}
