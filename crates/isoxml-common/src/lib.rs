//! Common types shared across the ISOXML prescription crates.

pub mod catalog;
pub mod error;
pub mod geo;
pub mod grid;
pub mod ids;
pub mod prescription;

pub use catalog::{resolve_product, Catalog, InMemoryCatalog, OwnerChain, ReferenceId};
pub use error::{ValidationError, ValidationResult};
pub use geo::{GeoPoint, Quantity};
pub use grid::{CellCondition, RasterCell, RateRaster};
pub use ids::{IdGenerator, SequentialIds};
pub use prescription::Prescription;
