//! Scalar acoustic wave kernel.
//!
//! K u = integral of grad(phi) . (c^2 grad u) with c = VP interpolated to
//! the nodes; the mass is the plain volume integral of the test functions
//! (pressure formulation). Simplex elements pre-form the dense stiffness
//! once; tensor elements stay matrix-free through sum factorization.

use nalgebra::DMatrix;
use sem_mesh::Mesh;

use crate::element::ElementOps;
use crate::error::Result;
use crate::physics::{Kernel, PhysicsKind, required_param};

pub struct AcousticKernel {
    element: Box<dyn ElementOps>,
    /// VP^2 at every node.
    c2: Vec<f64>,
    vmax: f64,
    prebuilt: Option<DMatrix<f64>>,
}

impl AcousticKernel {
    pub fn new(mesh: &Mesh, cell: usize, element: Box<dyn ElementOps>) -> Result<Self> {
        let vp = required_param(mesh, cell, element.as_ref(), "VP")?;
        let c2: Vec<f64> = vp.iter().map(|v| v * v).collect();
        let vmax = vp.iter().cloned().fold(0.0, f64::max);
        let prebuilt = element.build_stiffness_matrix(&c2);
        Ok(Self {
            element,
            c2,
            vmax,
            prebuilt,
        })
    }
}

impl Kernel for AcousticKernel {
    fn kind(&self) -> PhysicsKind {
        PhysicsKind::Acoustic
    }

    fn element(&self) -> &dyn ElementOps {
        &*self.element
    }

    fn mass(&self, out: &mut [f64]) {
        let ones = vec![1.0; self.element.num_nodes()];
        self.element.apply_test_and_integrate(&ones, out);
    }

    fn stiffness_action(&self, pulled: &[Vec<f64>], out: &mut [Vec<f64>]) {
        let u = &pulled[0];
        let p = self.element.num_nodes();
        if let Some(k) = &self.prebuilt {
            for i in 0..p {
                let mut acc = 0.0;
                for j in 0..p {
                    acc += k[(i, j)] * u[j];
                }
                out[0][i] = acc;
            }
            return;
        }
        let dim = self.element.dim();
        let mut grad = vec![0.0; dim * p];
        self.element.compute_gradient(u, &mut grad);
        for n in 0..p {
            for l in 0..dim {
                grad[l * p + n] *= self.c2[n];
            }
        }
        self.element.apply_grad_test_and_integrate(&grad, &mut out[0]);
    }

    fn cfl_time_step(&self) -> f64 {
        self.element.size_measure() / self.vmax
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::BasisCache;
    use crate::element::build_element;
    use sem_mesh::{ElementShape, structured_quads, structured_tris};

    fn kernel_on(mesh: &Mesh, shape: ElementShape, order: usize) -> AcousticKernel {
        let mut cache = BasisCache::new();
        let coords = mesh.cell_coords(0);
        let element = build_element(&mut cache, shape, order, &coords, 0).unwrap();
        AcousticKernel::new(mesh, 0, element).unwrap()
    }

    #[test]
    fn missing_vp_is_reported() {
        let mesh = structured_quads(1, 1, [0.0, 1.0], [0.0, 1.0]).unwrap();
        let mut cache = BasisCache::new();
        let coords = mesh.cell_coords(0);
        let element = build_element(&mut cache, ElementShape::Quad, 2, &coords, 0).unwrap();
        assert!(AcousticKernel::new(&mesh, 0, element).is_err());
    }

    #[test]
    fn mass_is_positive_and_sums_to_area() {
        let mut mesh = structured_quads(1, 1, [0.0, 2.0], [0.0, 3.0]).unwrap();
        mesh.set_uniform_field("VP", 1.5);
        let k = kernel_on(&mesh, ElementShape::Quad, 4);
        let mut m = vec![0.0; k.element().num_nodes()];
        k.mass(&mut m);
        assert!(m.iter().all(|&x| x > 0.0));
        let total: f64 = m.iter().sum();
        assert!((total - 6.0).abs() < 1e-12);
    }

    #[test]
    fn stiffness_annihilates_constants() {
        let mut mesh = structured_quads(1, 1, [0.0, 1.0], [0.0, 1.0]).unwrap();
        mesh.set_uniform_field("VP", 2.0);
        let k = kernel_on(&mesh, ElementShape::Quad, 3);
        let p = k.element().num_nodes();
        let pulled = vec![vec![1.0; p]];
        let mut out = vec![vec![0.0; p]];
        k.stiffness_action(&pulled, &mut out);
        for r in &out[0] {
            assert!(r.abs() < 1e-12);
        }
    }

    #[test]
    fn simplex_path_uses_prebuilt_stiffness() {
        let mut mesh = structured_tris(1, 1, [0.0, 1.0], [0.0, 1.0]).unwrap();
        mesh.set_uniform_field("VP", 1.0);
        let k = kernel_on(&mesh, ElementShape::Tri, 3);
        assert!(k.prebuilt.is_some());
        // matrix path must still kill constants
        let p = k.element().num_nodes();
        let pulled = vec![vec![3.0; p]];
        let mut out = vec![vec![0.0; p]];
        k.stiffness_action(&pulled, &mut out);
        for r in &out[0] {
            assert!(r.abs() < 1e-11);
        }
    }

    #[test]
    fn cfl_scales_with_wavespeed() {
        let mut mesh = structured_quads(1, 1, [0.0, 1.0], [0.0, 1.0]).unwrap();
        mesh.set_uniform_field("VP", 1.0);
        let slow = kernel_on(&mesh, ElementShape::Quad, 3).cfl_time_step();
        mesh.set_uniform_field("VP", 4.0);
        let fast = kernel_on(&mesh, ElementShape::Quad, 3).cfl_time_step();
        assert!((slow / fast - 4.0).abs() < 1e-12);
    }
}
