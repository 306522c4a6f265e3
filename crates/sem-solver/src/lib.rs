//! Spectral-element time-domain engine for linear acoustic and elastic
//! wave propagation on unstructured meshes.
//!
//! The crate is layered bottom-up: reference tables ([`basis`]), geometric
//! maps ([`shape`]), per-element operators ([`element`]), constitutive
//! kernels ([`physics`]), global DoF layout and scatter ([`dof`],
//! [`fields`]), and the explicit Newmark driver ([`newmark`]) assembled by
//! [`driver::Simulation`]. File formats stay behind the `sem-io` seams.

pub mod basis;
pub mod config;
pub mod dof;
pub mod driver;
pub mod element;
pub mod error;
pub mod fields;
pub mod newmark;
pub mod physics;
pub mod receiver;
pub mod shape;
pub mod source;

pub use config::{ReceiverSpec, SimulationConfig, SourceSpec};
pub use driver::Simulation;
pub use error::{Result, SolverError};
pub use newmark::{NewmarkIntegrator, RunSummary};
pub use physics::PhysicsKind;
pub use receiver::Receiver;
pub use source::{Source, SourceTimeFunction};
