//! I/O seams for the wave engine.
//!
//! Mesh files, source catalogs, snapshots and receiver traces reach the
//! solver only through the narrow interfaces in this crate. The shipped
//! implementations serialize with serde_json (the catalog and model
//! documents mirror the attribute layout of the external formats); a
//! different backing store plugs in behind the same traits without
//! touching the solver.

pub mod error;
pub mod model;
pub mod snapshot;
pub mod sources;
pub mod traces;

pub use error::{IoError, Result};
pub use model::{read_model, write_model};
pub use snapshot::{JsonSnapshotWriter, NullSnapshotWriter, SnapshotWriter};
pub use sources::{SourceCatalog, SourceEntry, SourceKind, read_source_catalog};
pub use traces::write_trace_file;
