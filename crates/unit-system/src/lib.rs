//! Units of measure for ISOXML prescriptions.
//!
//! Rates in a prescription arrive in whatever unit the user picked
//! (`l/ha`, `lb/ac`, `seeds/ac`, ...). ISO 11783 task data carries them in the
//! single canonical unit of their data dictionary entry (`mm3/m2`, `mg/m2`,
//! `/m2`, ...). This crate knows which units share a physical dimension and
//! converts between them, refusing to convert across dimensions.

pub mod convert;
pub mod dimension;
pub mod error;
pub mod registry;

pub use convert::{Conversion, UnitConverter};
pub use dimension::Dimension;
pub use error::{UnitError, UnitResult};
pub use registry::{Unit, UnitRegistry};
