//! Mesh/model file reader.
//!
//! The mesh document carries vertex coordinates, cell connectivity, named
//! side sets and per-vertex material parameter fields, the same content
//! the engine would pull from an Exodus II file through an external
//! reader. `sem_mesh::Mesh` derives serde, so the document maps onto it
//! directly.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use sem_mesh::Mesh;

use crate::error::{IoError, Result};

/// Read a mesh (and its material model fields) from a JSON document.
pub fn read_model(path: &Path) -> Result<Mesh> {
    if !path.exists() {
        return Err(IoError::FileNotFound(path.display().to_string()));
    }
    let file = File::open(path)?;
    let mesh: Mesh = serde_json::from_reader(BufReader::new(file)).map_err(|e| IoError::Parse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    mesh.validate().map_err(|e| IoError::Parse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(mesh)
}

/// Write a mesh document, mainly for tests and mesh generation tooling.
pub fn write_model(path: &Path, mesh: &Mesh) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer(BufWriter::new(file), mesh)?;
    Ok(())
}
