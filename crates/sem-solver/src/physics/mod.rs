//! Physics kernels: the constitutive layer over the element operators.
//!
//! A kernel declares which fields it pulls from and pushes into the global
//! DoF vectors, and computes the stiffness action K*u for its element. The
//! Dirichlet decorator wraps any kernel and masks pinned face DoFs.

pub mod acoustic;
pub mod dirichlet;
pub mod elastic2d;
pub mod elastic3d;

use sem_mesh::Mesh;

use crate::element::{ElementOps, params_at_nodes};
use crate::error::{Result, SolverError};

pub use acoustic::AcousticKernel;
pub use dirichlet::DirichletKernel;
pub use elastic2d::Elastic2dKernel;
pub use elastic3d::Elastic3dKernel;

/// Physics selector, resolved against the mesh dimension at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicsKind {
    Acoustic,
    Elastic2d,
    Elastic3d,
}

impl PhysicsKind {
    pub fn label(&self) -> &'static str {
        match self {
            PhysicsKind::Acoustic => "acoustic",
            PhysicsKind::Elastic2d => "elastic-2d",
            PhysicsKind::Elastic3d => "elastic-3d",
        }
    }

    /// Number of displacement components.
    pub fn num_components(&self) -> usize {
        match self {
            PhysicsKind::Acoustic => 1,
            PhysicsKind::Elastic2d => 2,
            PhysicsKind::Elastic3d => 3,
        }
    }

    /// Fields read from the global vectors each step.
    pub fn pull_fields(&self) -> &'static [&'static str] {
        match self {
            PhysicsKind::Acoustic => &["u"],
            PhysicsKind::Elastic2d => &["ux", "uy"],
            PhysicsKind::Elastic3d => &["ux", "uy", "uz"],
        }
    }

    /// Fields summed into the global vectors each step.
    pub fn push_fields(&self) -> &'static [&'static str] {
        match self {
            PhysicsKind::Acoustic => &["a"],
            PhysicsKind::Elastic2d => &["ax", "ay"],
            PhysicsKind::Elastic3d => &["ax", "ay", "az"],
        }
    }

    /// Newmark state per component: (u, v, a, a_).
    pub fn triples(&self) -> &'static [[&'static str; 4]] {
        match self {
            PhysicsKind::Acoustic => &[["u", "v", "a", "a_"]],
            PhysicsKind::Elastic2d => {
                &[["ux", "vx", "ax", "ax_"], ["uy", "vy", "ay", "ay_"]]
            }
            PhysicsKind::Elastic3d => &[
                ["ux", "vx", "ax", "ax_"],
                ["uy", "vy", "ay", "ay_"],
                ["uz", "vz", "az", "az_"],
            ],
        }
    }

    /// Every field the integrator must allocate, `mi` included.
    pub fn all_fields(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        for t in self.triples() {
            out.extend_from_slice(t);
        }
        out.push("mi");
        out
    }
}

/// Constitutive layer over one element.
pub trait Kernel: Send + Sync {
    fn kind(&self) -> PhysicsKind;
    fn element(&self) -> &dyn ElementOps;

    fn pull_fields(&self) -> &'static [&'static str] {
        self.kind().pull_fields()
    }

    fn push_fields(&self) -> &'static [&'static str] {
        self.kind().push_fields()
    }

    /// Diagonal element mass at every node.
    fn mass(&self, out: &mut [f64]);

    /// out[c] = (K u)_c for the pulled element-local fields (tensor order).
    fn stiffness_action(&self, pulled: &[Vec<f64>], out: &mut [Vec<f64>]);

    /// Record pinned boundary faces. Base kernels ignore this; the
    /// Dirichlet decorator caches the face DoFs.
    fn set_boundary_conditions(&mut self, _faces: &[usize]) {}

    /// Element-local node indices with homogeneous Dirichlet conditions.
    fn pinned_nodes(&self) -> &[usize] {
        &[]
    }

    /// Largest stable time step for this element, C * h_e / v_max with
    /// C = 1.0 for the explicit Newmark scheme.
    fn cfl_time_step(&self) -> f64;
}

/// Look one material parameter up at the element's integration points.
pub(crate) fn required_param(
    mesh: &Mesh,
    cell: usize,
    element: &dyn ElementOps,
    name: &'static str,
) -> Result<Vec<f64>> {
    let verts = mesh
        .field_at_cell_vertices(name, cell)
        .ok_or(SolverError::MissingParameter {
            name,
            element: cell,
        })?;
    Ok(params_at_nodes(element, &verts))
}

/// Build the kernel for one cell, rejecting unsupported shape/physics
/// pairings (a 2D law on a 3D cell and vice versa).
pub fn build_kernel(
    mesh: &Mesh,
    cell: usize,
    element: Box<dyn ElementOps>,
    kind: PhysicsKind,
) -> Result<Box<dyn Kernel>> {
    let shape = element.shape();
    match (kind, shape.dim()) {
        (PhysicsKind::Acoustic, _) => Ok(Box::new(AcousticKernel::new(mesh, cell, element)?)),
        (PhysicsKind::Elastic2d, 2) => Ok(Box::new(Elastic2dKernel::new(mesh, cell, element)?)),
        (PhysicsKind::Elastic3d, 3) => Ok(Box::new(Elastic3dKernel::new(mesh, cell, element)?)),
        _ => Err(SolverError::UnsupportedShape {
            shape,
            physics: kind.label(),
        }),
    }
}

/// Resolve the configured physics against the mesh dimension.
pub fn resolve_physics(name: &str, dim: usize) -> Result<PhysicsKind> {
    match (name, dim) {
        ("acoustic", _) => Ok(PhysicsKind::Acoustic),
        ("elastic", 2) => Ok(PhysicsKind::Elastic2d),
        ("elastic", 3) => Ok(PhysicsKind::Elastic3d),
        _ => Err(SolverError::Config(format!(
            "unknown physics '{name}' (expected 'acoustic' or 'elastic')"
        ))),
    }
}
