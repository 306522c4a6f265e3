//! 3D elastic kernel with vertical transverse isotropy.
//!
//! The nine strain components collapse to a Voigt-6 vector; stress comes
//! from the VTI stiffness with entries derived from (RHO, VPV, VPH, VSV,
//! VSH, ETA):
//!
//!   A = rho VPH^2, C = rho VPV^2, L = rho VSV^2, N = rho VSH^2,
//!   F = eta (A - 2L),
//!   c11 = c22 = A, c33 = C, c12 = A - 2N, c13 = c23 = F,
//!   c44 = c55 = L, c66 = N.
//!
//! Direct-stiffness input (vertex fields C11..C66) overrides the derived
//! coefficients when present. With VPV = VPH, VSV = VSH, ETA = 1 the
//! matrix reduces to the isotropic Hooke law.

use sem_mesh::Mesh;

use crate::element::ElementOps;
use crate::error::Result;
use crate::physics::{Kernel, PhysicsKind, required_param};

/// Per-node Voigt coefficients, one row per node:
/// [c11, c12, c13, c22, c23, c33, c44, c55, c66].
type VoigtRows = Vec<[f64; 9]>;

pub struct Elastic3dKernel {
    element: Box<dyn ElementOps>,
    cij: VoigtRows,
    rho: Vec<f64>,
    vmax: f64,
}

impl Elastic3dKernel {
    pub fn new(mesh: &Mesh, cell: usize, element: Box<dyn ElementOps>) -> Result<Self> {
        let rho = required_param(mesh, cell, element.as_ref(), "RHO")?;
        let p = element.num_nodes();

        let direct = ["C11", "C12", "C13", "C22", "C23", "C33", "C44", "C55", "C66"]
            .iter()
            .all(|n| mesh.vertex_fields.contains_key(*n));

        let (cij, vmax) = if direct {
            let mut rows: VoigtRows = vec![[0.0; 9]; p];
            for (slot, name) in ["C11", "C12", "C13", "C22", "C23", "C33", "C44", "C55", "C66"]
                .into_iter()
                .enumerate()
            {
                let vals = required_param(mesh, cell, element.as_ref(), name)?;
                for n in 0..p {
                    rows[n][slot] = vals[n];
                }
            }
            let vmax = rows
                .iter()
                .zip(&rho)
                .map(|(r, &d)| (r[0].max(r[5]) / d).sqrt())
                .fold(0.0, f64::max);
            (rows, vmax)
        } else {
            let vpv = required_param(mesh, cell, element.as_ref(), "VPV")?;
            let vph = required_param(mesh, cell, element.as_ref(), "VPH")?;
            let vsv = required_param(mesh, cell, element.as_ref(), "VSV")?;
            let vsh = required_param(mesh, cell, element.as_ref(), "VSH")?;
            let eta = required_param(mesh, cell, element.as_ref(), "ETA")?;
            let mut rows: VoigtRows = vec![[0.0; 9]; p];
            let mut vmax: f64 = 0.0;
            for n in 0..p {
                let a = rho[n] * vph[n] * vph[n];
                let c = rho[n] * vpv[n] * vpv[n];
                let l = rho[n] * vsv[n] * vsv[n];
                let nn = rho[n] * vsh[n] * vsh[n];
                let f = eta[n] * (a - 2.0 * l);
                rows[n] = [a, a - 2.0 * nn, f, a, f, c, l, l, nn];
                vmax = vmax.max(vpv[n]).max(vph[n]);
            }
            (rows, vmax)
        };

        Ok(Self {
            element,
            cij,
            rho,
            vmax,
        })
    }
}

impl Kernel for Elastic3dKernel {
    fn kind(&self) -> PhysicsKind {
        PhysicsKind::Elastic3d
    }

    fn element(&self) -> &dyn ElementOps {
        &*self.element
    }

    fn mass(&self, out: &mut [f64]) {
        self.element.apply_test_and_integrate(&self.rho, out);
    }

    fn stiffness_action(&self, pulled: &[Vec<f64>], out: &mut [Vec<f64>]) {
        let p = self.element.num_nodes();
        let mut gx = vec![0.0; 3 * p];
        let mut gy = vec![0.0; 3 * p];
        let mut gz = vec![0.0; 3 * p];
        self.element.compute_gradient(&pulled[0], &mut gx);
        self.element.compute_gradient(&pulled[1], &mut gy);
        self.element.compute_gradient(&pulled[2], &mut gz);

        let mut flux_x = vec![0.0; 3 * p];
        let mut flux_y = vec![0.0; 3 * p];
        let mut flux_z = vec![0.0; 3 * p];
        for n in 0..p {
            let [c11, c12, c13, c22, c23, c33, c44, c55, c66] = self.cij[n];
            let exx = gx[n];
            let eyy = gy[p + n];
            let ezz = gz[2 * p + n];
            // engineering shears
            let gxy = gx[p + n] + gy[n];
            let gyz = gy[2 * p + n] + gz[p + n];
            let gxz = gx[2 * p + n] + gz[n];

            let sxx = c11 * exx + c12 * eyy + c13 * ezz;
            let syy = c12 * exx + c22 * eyy + c23 * ezz;
            let szz = c13 * exx + c23 * eyy + c33 * ezz;
            let syz = c44 * gyz;
            let sxz = c55 * gxz;
            let sxy = c66 * gxy;

            flux_x[n] = sxx;
            flux_x[p + n] = sxy;
            flux_x[2 * p + n] = sxz;
            flux_y[n] = sxy;
            flux_y[p + n] = syy;
            flux_y[2 * p + n] = syz;
            flux_z[n] = sxz;
            flux_z[p + n] = syz;
            flux_z[2 * p + n] = szz;
        }
        self.element
            .apply_grad_test_and_integrate(&flux_x, &mut out[0]);
        self.element
            .apply_grad_test_and_integrate(&flux_y, &mut out[1]);
        self.element
            .apply_grad_test_and_integrate(&flux_z, &mut out[2]);
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
    use sem_mesh::{ElementShape, structured_hexes};

    fn vti_mesh() -> Mesh {
        let mut mesh =
            structured_hexes(1, 1, 1, [0.0, 1.0], [0.0, 1.0], [0.0, 1.0]).unwrap();
        mesh.set_uniform_field("RHO", 1.2);
        mesh.set_uniform_field("VPV", 2.0);
        mesh.set_uniform_field("VPH", 2.0);
        mesh.set_uniform_field("VSV", 1.0);
        mesh.set_uniform_field("VSH", 1.0);
        mesh.set_uniform_field("ETA", 1.0);
        mesh
    }

    fn kernel(mesh: &Mesh) -> Elastic3dKernel {
        let mut cache = BasisCache::new();
        let coords = mesh.cell_coords(0);
        let element = build_element(&mut cache, ElementShape::Hex, 2, &coords, 0).unwrap();
        Elastic3dKernel::new(mesh, 0, element).unwrap()
    }

    #[test]
    fn isotropic_limit_matches_hooke() {
        let k = kernel(&vti_mesh());
        // lambda = rho (VP^2 - 2 VS^2) = 1.2 * 2, mu = rho VS^2 = 1.2
        let row = k.cij[0];
        let lambda = 1.2 * (4.0 - 2.0);
        let mu = 1.2;
        assert!((row[0] - (lambda + 2.0 * mu)).abs() < 1e-12); // c11
        assert!((row[1] - lambda).abs() < 1e-12); // c12
        assert!((row[2] - lambda).abs() < 1e-12); // c13
        assert!((row[5] - (lambda + 2.0 * mu)).abs() < 1e-12); // c33
        assert!((row[6] - mu).abs() < 1e-12); // c44
        assert!((row[8] - mu).abs() < 1e-12); // c66
    }

    #[test]
    fn direct_cij_input_overrides_derivation() {
        let mut mesh = vti_mesh();
        for (name, value) in [
            ("C11", 5.0),
            ("C12", 1.0),
            ("C13", 1.1),
            ("C22", 5.0),
            ("C23", 1.1),
            ("C33", 4.5),
            ("C44", 1.4),
            ("C55", 1.4),
            ("C66", 2.0),
        ] {
            mesh.set_uniform_field(name, value);
        }
        let k = kernel(&mesh);
        assert!((k.cij[0][0] - 5.0).abs() < 1e-12);
        assert!((k.cij[0][5] - 4.5).abs() < 1e-12);
    }

    #[test]
    fn rigid_translation_produces_no_force() {
        let k = kernel(&vti_mesh());
        let p = k.element().num_nodes();
        let pulled = vec![vec![1.0; p], vec![-2.0; p], vec![0.5; p]];
        let mut out = vec![vec![0.0; p], vec![0.0; p], vec![0.0; p]];
        k.stiffness_action(&pulled, &mut out);
        for c in 0..3 {
            for r in &out[c] {
                assert!(r.abs() < 1e-11);
            }
        }
    }

    #[test]
    fn stiffness_action_is_symmetric() {
        let k = kernel(&vti_mesh());
        let p = k.element().num_nodes();
        let coords = k.element().node_coords().to_vec();
        let u = vec![
            coords.iter().map(|c| c[0] * c[1]).collect::<Vec<_>>(),
            coords.iter().map(|c| (c[2] * 2.0).sin()).collect::<Vec<_>>(),
            coords.iter().map(|c| c[0] + c[2]).collect::<Vec<_>>(),
        ];
        let v = vec![
            coords.iter().map(|c| c[2] * c[2]).collect::<Vec<_>>(),
            coords.iter().map(|c| c[0]).collect::<Vec<_>>(),
            coords.iter().map(|c| (c[1]).cos()).collect::<Vec<_>>(),
        ];
        let mut ku = vec![vec![0.0; p]; 3];
        let mut kv = vec![vec![0.0; p]; 3];
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
        assert!(((ukv - vku) / ukv.abs().max(1e-30)).abs() < 1e-9);
    }
}
