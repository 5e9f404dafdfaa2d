//! ISOXML task data encoding for grid prescriptions.
//!
//! Supports:
//! - Grid tasks (`TSK`) with treatment zones (`TZN`, `PDV`) and a type 1
//!   zone code grid (`GRD` plus a sibling binary file)
//! - Value presentations (`VPN`) for rates given in non-canonical units
//! - Reading the same elements back and decoding the binary grid
//!
//! ```ignore
//! use isoxml_common::SequentialIds;
//! use isoxml_protocol::{CodecConfig, MemorySink, PrescriptionCodec, TaskDataDocument};
//!
//! let codec = PrescriptionCodec::new(CodecConfig::from_env())?;
//! let mut document = TaskDataDocument::new(MemorySink::new(), SequentialIds::new());
//! let report = codec.encode_all(&catalog, &mut document)?;
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod prescription;
pub mod presentation;
pub mod reader;
pub mod sink;
pub mod task;
pub mod writer;

pub use config::CodecConfig;
pub use document::TaskDataDocument;
pub use error::{CodecError, CodecResult};
pub use prescription::{BatchReport, PreparedGrid, PrescriptionCodec, TaskSummary};
pub use presentation::{ValuePresentation, ValuePresentations};
pub use reader::{decode_cells, decode_codes, TaskData, TaskDataReader};
pub use sink::{DirectorySink, MemorySink, TaskDataSink};
pub use task::{GridDefinition, Task};
pub use writer::TaskDataWriter;
