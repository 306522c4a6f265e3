//! Trilinear hexahedron geometry.

use nalgebra::{Matrix3, Vector3};

use crate::shape::{HULL_TOL, bbox_contains};

/// Reference-corner signs in local vertex order: bottom 0-3
/// counter-clockwise, then top 4-7.
const CORNER_SIGNS: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

/// Geometry of one hexahedral cell.
#[derive(Debug, Clone)]
pub struct HexGeometry {
    verts: [[f64; 3]; 8],
}

impl HexGeometry {
    pub fn new(coords: &[[f64; 3]]) -> Self {
        debug_assert_eq!(coords.len(), 8);
        let mut verts = [[0.0; 3]; 8];
        verts.copy_from_slice(coords);
        Self { verts }
    }

    /// Trilinear vertex weights at a reference point.
    pub fn vertex_weights(xi: &[f64; 3]) -> [f64; 8] {
        let mut w = [0.0; 8];
        for (v, sgn) in CORNER_SIGNS.iter().enumerate() {
            w[v] = (1.0 + sgn[0] * xi[0]) * (1.0 + sgn[1] * xi[1]) * (1.0 + sgn[2] * xi[2]) / 8.0;
        }
        w
    }

    pub fn map(&self, xi: &[f64; 3]) -> [f64; 3] {
        let w = Self::vertex_weights(xi);
        let mut x = [0.0; 3];
        for v in 0..8 {
            for l in 0..3 {
                x[l] += w[v] * self.verts[v][l];
            }
        }
        x
    }

    /// Jacobian at a reference point; J[(k, l)] = d x_l / d xi_k.
    pub fn jacobian(&self, xi: &[f64; 3]) -> Matrix3<f64> {
        let mut j = Matrix3::zeros();
        for (v, sgn) in CORNER_SIGNS.iter().enumerate() {
            let f = [
                1.0 + sgn[0] * xi[0],
                1.0 + sgn[1] * xi[1],
                1.0 + sgn[2] * xi[2],
            ];
            let dw = [
                sgn[0] * f[1] * f[2] / 8.0,
                f[0] * sgn[1] * f[2] / 8.0,
                f[0] * f[1] * sgn[2] / 8.0,
            ];
            for k in 0..3 {
                for l in 0..3 {
                    j[(k, l)] += dw[k] * self.verts[v][l];
                }
            }
        }
        j
    }

    pub fn jacobian_det(&self, xi: &[f64; 3]) -> (Matrix3<f64>, f64) {
        let j = self.jacobian(xi);
        let det = j.determinant();
        (j, det)
    }

    /// Inverse Jacobian and the determinant; `None` for a degenerate map.
    pub fn inverse_jacobian(&self, xi: &[f64; 3]) -> Option<(Matrix3<f64>, f64)> {
        let (j, det) = self.jacobian_det(xi);
        Some((j.try_inverse()?, det))
    }

    /// Newton inversion of the trilinear map.
    pub fn inverse_map(&self, x: &[f64; 3]) -> Option<[f64; 3]> {
        let mut xi = [0.0f64; 3];
        for _ in 0..30 {
            let fx = self.map(&xi);
            let res = Vector3::new(x[0] - fx[0], x[1] - fx[1], x[2] - fx[2]);
            if res.norm() < 1e-13 {
                return Some(xi);
            }
            let j = self.jacobian(&xi);
            let step = j.transpose().lu().solve(&res)?;
            for k in 0..3 {
                xi[k] += step[k];
                if !xi[k].is_finite() || xi[k].abs() > 10.0 {
                    return None;
                }
            }
        }
        let fx = self.map(&xi);
        let res =
            ((x[0] - fx[0]).powi(2) + (x[1] - fx[1]).powi(2) + (x[2] - fx[2]).powi(2)).sqrt();
        (res < 1e-10).then_some(xi)
    }

    pub fn check_hull(&self, x: &[f64; 3]) -> bool {
        let coords3 = self.verts;
        if !bbox_contains(&coords3, x, 3, HULL_TOL) {
            return false;
        }
        match self.inverse_map(x) {
            Some(xi) => xi.iter().all(|c| c.abs() <= 1.0 + HULL_TOL),
            None => false,
        }
    }

    pub fn min_edge_length(&self) -> f64 {
        let edges = [
            (0, 1),
            (3, 2),
            (4, 5),
            (7, 6),
            (0, 3),
            (1, 2),
            (4, 7),
            (5, 6),
            (0, 4),
            (1, 5),
            (2, 6),
            (3, 7),
        ];
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

    pub fn verts(&self) -> &[[f64; 3]; 8] {
        &self.verts
    }
}
