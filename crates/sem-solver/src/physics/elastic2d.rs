//! 2D isotropic elastic kernel.
//!
//! Strain from the displacement gradients, stress by Hooke's law with the
//! Lame parameters derived from (VP, VS, RHO), and the stiffness action
//! assembled component by component:
//!
//!   sigma = lambda tr(eps) I + 2 mu eps,
//!   lambda = rho (VP^2 - 2 VS^2),  mu = rho VS^2.

use sem_mesh::Mesh;

use crate::element::ElementOps;
use crate::error::Result;
use crate::physics::{Kernel, PhysicsKind, required_param};

pub struct Elastic2dKernel {
    element: Box<dyn ElementOps>,
    lambda: Vec<f64>,
    mu: Vec<f64>,
    rho: Vec<f64>,
    vmax: f64,
}

impl Elastic2dKernel {
    pub fn new(mesh: &Mesh, cell: usize, element: Box<dyn ElementOps>) -> Result<Self> {
        let vp = required_param(mesh, cell, element.as_ref(), "VP")?;
        let vs = required_param(mesh, cell, element.as_ref(), "VS")?;
        let rho = required_param(mesh, cell, element.as_ref(), "RHO")?;
        let p = element.num_nodes();
        let mut lambda = vec![0.0; p];
        let mut mu = vec![0.0; p];
        for n in 0..p {
            mu[n] = rho[n] * vs[n] * vs[n];
            lambda[n] = rho[n] * (vp[n] * vp[n] - 2.0 * vs[n] * vs[n]);
        }
        let vmax = vp.iter().cloned().fold(0.0, f64::max);
        Ok(Self {
            element,
            lambda,
            mu,
            rho,
            vmax,
        })
    }
}

impl Kernel for Elastic2dKernel {
    fn kind(&self) -> PhysicsKind {
        PhysicsKind::Elastic2d
    }

    fn element(&self) -> &dyn ElementOps {
        &*self.element
    }

    fn mass(&self, out: &mut [f64]) {
        self.element.apply_test_and_integrate(&self.rho, out);
    }

    fn stiffness_action(&self, pulled: &[Vec<f64>], out: &mut [Vec<f64>]) {
        let p = self.element.num_nodes();
        let mut gx = vec![0.0; 2 * p];
        let mut gy = vec![0.0; 2 * p];
        self.element.compute_gradient(&pulled[0], &mut gx);
        self.element.compute_gradient(&pulled[1], &mut gy);

        // per-node stress, then one flux per displacement component
        let mut flux_x = vec![0.0; 2 * p];
        let mut flux_y = vec![0.0; 2 * p];
        for n in 0..p {
            let exx = gx[n];
            let eyy = gy[p + n];
            let exy = 0.5 * (gx[p + n] + gy[n]);
            let trace = exx + eyy;
            let sxx = self.lambda[n] * trace + 2.0 * self.mu[n] * exx;
            let syy = self.lambda[n] * trace + 2.0 * self.mu[n] * eyy;
            let sxy = 2.0 * self.mu[n] * exy;
            flux_x[n] = sxx;
            flux_x[p + n] = sxy;
            flux_y[n] = sxy;
            flux_y[p + n] = syy;
        }
        self.element
            .apply_grad_test_and_integrate(&flux_x, &mut out[0]);
        self.element
            .apply_grad_test_and_integrate(&flux_y, &mut out[1]);
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
    use sem_mesh::{ElementShape, structured_quads};

    fn kernel(order: usize) -> Elastic2dKernel {
        let mut mesh = structured_quads(1, 1, [0.0, 1.3], [0.0, 0.9]).unwrap();
        mesh.set_uniform_field("VP", 2.0);
        mesh.set_uniform_field("VS", 1.1);
        mesh.set_uniform_field("RHO", 1.7);
        let mut cache = BasisCache::new();
        let coords = mesh.cell_coords(0);
        let element = build_element(&mut cache, ElementShape::Quad, order, &coords, 0).unwrap();
        Elastic2dKernel::new(&mesh, 0, element).unwrap()
    }

    #[test]
    fn mass_is_density_weighted_area() {
        let k = kernel(3);
        let mut m = vec![0.0; k.element().num_nodes()];
        k.mass(&mut m);
        let total: f64 = m.iter().sum();
        assert!((total - 1.7 * 1.3 * 0.9).abs() < 1e-12);
        assert!(m.iter().all(|&x| x > 0.0));
    }

    #[test]
    fn rigid_translation_produces_no_force() {
        let k = kernel(3);
        let p = k.element().num_nodes();
        let pulled = vec![vec![0.3; p], vec![-0.7; p]];
        let mut out = vec![vec![0.0; p], vec![0.0; p]];
        k.stiffness_action(&pulled, &mut out);
        for c in 0..2 {
            for r in &out[c] {
                assert!(r.abs() < 1e-12);
            }
        }
    }

    #[test]
    fn uniform_strain_balances_in_the_interior() {
        // linear displacement -> constant stress -> interior residuals
        // vanish and each component sums to zero over the element
        let k = kernel(4);
        let p = k.element().num_nodes();
        let coords = k.element().node_coords().to_vec();
        let pulled = vec![
            coords.iter().map(|c| 0.2 * c[0] + 0.1 * c[1]).collect::<Vec<_>>(),
            coords.iter().map(|c| -0.3 * c[0] + 0.4 * c[1]).collect::<Vec<_>>(),
        ];
        let mut out = vec![vec![0.0; p], vec![0.0; p]];
        k.stiffness_action(&pulled, &mut out);
        for c in 0..2 {
            let total: f64 = out[c].iter().sum();
            assert!(total.abs() < 1e-11, "component {c}");
        }
    }

    #[test]
    fn stiffness_action_is_symmetric() {
        let k = kernel(3);
        let p = k.element().num_nodes();
        let coords = k.element().node_coords().to_vec();
        let u = vec![
            coords.iter().map(|c| (c[0] * 2.0).sin()).collect::<Vec<_>>(),
            coords.iter().map(|c| c[0] * c[1]).collect::<Vec<_>>(),
        ];
        let v = vec![
            coords.iter().map(|c| c[1] * c[1]).collect::<Vec<_>>(),
            coords.iter().map(|c| (c[1] - c[0]).cos()).collect::<Vec<_>>(),
        ];
        let mut ku = vec![vec![0.0; p], vec![0.0; p]];
        let mut kv = vec![vec![0.0; p], vec![0.0; p]];
        k.stiffness_action(&u, &mut ku);
        k.stiffness_action(&v, &mut kv);
        let dot = |a: &[Vec<f64>], b: &[Vec<f64>]| -> f64 {
            a.iter()
                .zip(b)
                .map(|(ac, bc)| ac.iter().zip(bc).map(|(x, y)| x * y).sum::<f64>())
                .sum()
        };
        let ukv = dot(&u, &kv);
        let vku = dot(&v, &ku);
        assert!(((ukv - vku) / ukv.abs().max(1e-30)).abs() < 1e-10);
    }
}
