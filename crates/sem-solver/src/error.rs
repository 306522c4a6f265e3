//! Error types for the solver crate.
//!
//! One enum covers the whole engine surface; the CLI maps any of these to a
//! non-zero exit code. `LocalizationError` is the only non-fatal kind: the
//! driver logs it and drops the offending source or receiver.

use sem_mesh::ElementShape;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SolverError>;

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("polynomial order {order} is outside the supported range [1, {max}] for {shape}")]
    UnsupportedOrder {
        order: usize,
        max: usize,
        shape: &'static str,
    },

    #[error("shape/physics combination not implemented: {shape:?} with {physics}")]
    UnsupportedShape {
        shape: ElementShape,
        physics: &'static str,
    },

    #[error("geometry error in element {element}: {reason}")]
    Geometry { element: usize, reason: String },

    #[error("'{name}' at ({x}, {y}, {z}) has no owning element in the mesh")]
    Localization {
        name: String,
        x: f64,
        y: f64,
        z: f64,
    },

    #[error("field '{0}' is not present in the field dictionary")]
    UnknownField(String),

    #[error("material parameter '{name}' missing on element {element}")]
    MissingParameter { name: &'static str, element: usize },

    #[error(
        "|{field}| = {value:.3e} exceeded the blowup sentinel {sentinel} at t = {time:.6e}; \
         reduce the time step"
    )]
    NumericalBlowup {
        field: String,
        value: f64,
        sentinel: f64,
        time: f64,
    },

    #[error("time step {dt:.3e} exceeds the CFL limit {limit:.3e}")]
    CflViolation { dt: f64, limit: f64 },

    #[error(transparent)]
    Mesh(#[from] sem_mesh::MeshError),

    #[error(transparent)]
    Io(#[from] sem_io::IoError),
}
