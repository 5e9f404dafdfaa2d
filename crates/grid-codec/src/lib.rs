//! Treatment zone reduction and binary grid encoding.
//!
//! A raster prescription holds a rate per product for every cell. Field
//! equipment instead expects a small table of treatment zones plus a grid of
//! zone codes, one fixed-width code per cell, stored as a sibling binary file.
//!
//! # Architecture
//!
//! ```text
//! RateRaster + overlay rates
//!      │
//!      ▼
//! GridReducer::reduce
//!      │
//!      ├─► UnitConverter (every rate → canonical unit)
//!      │
//!      ├─► Default / loss-of-signal / out-of-field zones
//!      │
//!      └─► Ordinary zones, first-seen row-major order
//!               │
//!               ▼
//!          ZoneTable + CodeGrid
//!               │
//!               ▼
//!      GridBinaryCodec::encode ──► header-less row-major bytes
//! ```

pub mod binary;
pub mod config;
pub mod error;
pub mod reducer;
pub mod zone;

pub use binary::{CodeWidth, EncodedGrid, GridBinaryCodec};
pub use config::GridCodecConfig;
pub use error::{GridCodecError, Result};
pub use reducer::{CodeGrid, GridReducer, ProductColumn, Reduction, ReductionInput};
pub use zone::{DataVariable, TreatmentZone, VariableUnit, ZoneCode, ZoneEntry, ZoneKey, ZoneTable};
