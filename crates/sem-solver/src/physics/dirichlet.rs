//! Homogeneous Dirichlet decorator.
//!
//! Wraps any kernel; `set_boundary_conditions` records the DoFs of the
//! pinned faces, and every stiffness compute zeroes the pushed residual on
//! them. The integrator additionally masks the assembled global
//! acceleration, which also covers boundary DoFs reached only through
//! corner-touching neighbour elements.

use crate::element::ElementOps;
use crate::physics::{Kernel, PhysicsKind};

pub struct DirichletKernel {
    inner: Box<dyn Kernel>,
    pinned: Vec<usize>,
}

impl DirichletKernel {
    pub fn new(inner: Box<dyn Kernel>) -> Self {
        Self {
            inner,
            pinned: Vec::new(),
        }
    }
}

impl Kernel for DirichletKernel {
    fn kind(&self) -> PhysicsKind {
        self.inner.kind()
    }

    fn element(&self) -> &dyn ElementOps {
        self.inner.element()
    }

    fn mass(&self, out: &mut [f64]) {
        self.inner.mass(out);
    }

    fn stiffness_action(&self, pulled: &[Vec<f64>], out: &mut [Vec<f64>]) {
        self.inner.stiffness_action(pulled, out);
        for component in out.iter_mut() {
            for &node in &self.pinned {
                component[node] = 0.0;
            }
        }
    }

    fn set_boundary_conditions(&mut self, faces: &[usize]) {
        let mut pinned: Vec<usize> = faces
            .iter()
            .flat_map(|&f| self.inner.element().face_nodes(f))
            .collect();
        pinned.sort_unstable();
        pinned.dedup();
        self.pinned = pinned;
    }

    fn pinned_nodes(&self) -> &[usize] {
        &self.pinned
    }

    fn cfl_time_step(&self) -> f64 {
        self.inner.cfl_time_step()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::BasisCache;
    use crate::element::build_element;
    use crate::physics::AcousticKernel;
    use sem_mesh::{ElementShape, structured_quads};

    fn decorated(faces: &[usize]) -> DirichletKernel {
        let mut mesh = structured_quads(1, 1, [0.0, 1.0], [0.0, 1.0]).unwrap();
        mesh.set_uniform_field("VP", 1.0);
        let mut cache = BasisCache::new();
        let coords = mesh.cell_coords(0);
        let element = build_element(&mut cache, ElementShape::Quad, 3, &coords, 0).unwrap();
        let inner = Box::new(AcousticKernel::new(&mesh, 0, element).unwrap());
        let mut k = DirichletKernel::new(inner);
        k.set_boundary_conditions(faces);
        k
    }

    #[test]
    fn pins_all_face_nodes_without_duplicates() {
        // bottom and left share a corner node
        let k = decorated(&[0, 2]);
        assert_eq!(k.pinned_nodes().len(), 4 + 4 - 1);
    }

    #[test]
    fn residual_is_zeroed_on_pinned_nodes() {
        let k = decorated(&[0]);
        let p = k.element().num_nodes();
        let u: Vec<f64> = k
            .element()
            .node_coords()
            .iter()
            .map(|c| c[0] * c[0] + c[1])
            .collect();
        let mut out = vec![vec![0.0; p]];
        k.stiffness_action(&[u], &mut out);
        for &node in k.pinned_nodes() {
            assert_eq!(out[0][node], 0.0);
        }
        // unpinned rows survive
        assert!(out[0].iter().any(|&r| r != 0.0));
    }
}
