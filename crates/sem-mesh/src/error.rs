//! Error types for sem-mesh.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MeshError>;

#[derive(Error, Debug)]
pub enum MeshError {
    #[error("cell {cell} of shape {shape} has {actual} vertices but expected {expected}")]
    BadConnectivity {
        cell: usize,
        shape: &'static str,
        actual: usize,
        expected: usize,
    },

    #[error("cell {cell} references non-existent vertex {vertex}")]
    DanglingVertex { cell: usize, vertex: usize },

    #[error("vertex field '{name}' has {actual} entries but the mesh has {expected} vertices")]
    FieldLength {
        name: String,
        actual: usize,
        expected: usize,
    },

    #[error("side set '{0}' not present in the mesh")]
    UnknownSideSet(String),

    #[error("mesh dimension {0} is not supported (expected 2 or 3)")]
    BadDimension(usize),
}
