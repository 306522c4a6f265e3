//! Affine tetrahedron geometry.

use nalgebra::Matrix3;

use crate::shape::{HULL_TOL, bbox_contains};

/// Geometry of one tetrahedral cell, affine from the reference tet
/// (-1,-1,-1), (1,-1,-1), (-1,1,-1), (-1,-1,1).
#[derive(Debug, Clone)]
pub struct TetGeometry {
    verts: [[f64; 3]; 4],
    jac: Matrix3<f64>,
    det: f64,
}

impl TetGeometry {
    pub fn new(coords: &[[f64; 3]]) -> Self {
        debug_assert_eq!(coords.len(), 4);
        let mut verts = [[0.0; 3]; 4];
        verts.copy_from_slice(coords);
        let mut jac = Matrix3::zeros();
        for k in 0..3 {
            for l in 0..3 {
                jac[(k, l)] = (verts[k + 1][l] - verts[0][l]) / 2.0;
            }
        }
        let det = jac.determinant();
        Self { verts, jac, det }
    }

    /// Barycentric weights at a reference point.
    pub fn vertex_weights(xi: &[f64; 3]) -> [f64; 4] {
        let lb = (1.0 + xi[0]) / 2.0;
        let lc = (1.0 + xi[1]) / 2.0;
        let ld = (1.0 + xi[2]) / 2.0;
        [1.0 - lb - lc - ld, lb, lc, ld]
    }

    pub fn map(&self, xi: &[f64; 3]) -> [f64; 3] {
        let w = Self::vertex_weights(xi);
        let mut x = [0.0; 3];
        for v in 0..4 {
            for l in 0..3 {
                x[l] += w[v] * self.verts[v][l];
            }
        }
        x
    }

    pub fn jacobian(&self) -> &Matrix3<f64> {
        &self.jac
    }

    pub fn det_jacobian(&self) -> f64 {
        self.det
    }

    /// Inverse of the constant Jacobian with the determinant.
    pub fn inverse_jacobian(&self) -> Option<(Matrix3<f64>, f64)> {
        Some((self.jac.try_inverse()?, self.det))
    }

    pub fn inverse_map(&self, x: &[f64; 3]) -> Option<[f64; 3]> {
        let rhs = nalgebra::Vector3::new(
            x[0] - self.verts[0][0],
            x[1] - self.verts[0][1],
            x[2] - self.verts[0][2],
        );
        let xi = self.jac.transpose().lu().solve(&rhs)?;
        Some([xi[0] - 1.0, xi[1] - 1.0, xi[2] - 1.0])
    }

    pub fn check_hull(&self, x: &[f64; 3]) -> bool {
        if !bbox_contains(&self.verts, x, 3, HULL_TOL) {
            return false;
        }
        match self.inverse_map(x) {
            Some(xi) => {
                let lam = Self::vertex_weights(&xi);
                lam.iter().all(|&l| l >= -HULL_TOL)
            }
            None => false,
        }
    }

    pub fn min_edge_length(&self) -> f64 {
        let edges = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];
        edges
            .iter()
            .map(|&(a, b)| {
                let mut d2 = 0.0;
                for k in 0..3 {
                    let d = self.verts[a][k] - self.verts[b][k];
                    d2 += d * d;
                }
                d2.sqrt()
            })
            .fold(f64::INFINITY, f64::min)
    }
}
