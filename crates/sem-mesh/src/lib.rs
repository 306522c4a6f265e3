//! Mesh data model for the spectral-element wave engine.
//!
//! This crate owns the unstructured-mesh description consumed by the solver:
//! vertex coordinates, cell connectivity, named side sets, and per-vertex
//! material parameter fields. It knows nothing about polynomial orders or
//! degrees of freedom; those live in the solver crate.

pub mod builder;
pub mod error;
pub mod mesh;
pub mod sets;

pub use builder::{structured_hexes, structured_quads, structured_tets, structured_tris};
pub use error::{MeshError, Result};
pub use mesh::{Cell, ElementShape, Mesh, MeshStatistics};
pub use sets::{SideSet, SideSets};
