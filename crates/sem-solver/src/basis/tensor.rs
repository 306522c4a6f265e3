//! Tensor-product nodal basis for quadrilaterals and hexahedra.
//!
//! Nodes live on the (N+1)^d grid of 1D GLL points with lexicographic
//! numbering, r fastest. Basis values and derivatives at arbitrary points
//! are outer products of the 1D tables; the heavy per-element contractions
//! (sum factorization) live in the element layer and consume the 1D tables
//! directly.

use crate::basis::gll::Gll1d;
use crate::error::Result;

/// Nodal basis on the reference square or cube.
#[derive(Debug, Clone)]
pub struct TensorBasis {
    /// Polynomial order N.
    pub order: usize,
    /// 2 for quad, 3 for hex.
    pub dim: usize,
    /// Shared 1D GLL tables.
    pub gll: Gll1d,
}

impl TensorBasis {
    pub fn new(order: usize, dim: usize) -> Result<Self> {
        debug_assert!(dim == 2 || dim == 3);
        Ok(Self {
            order,
            dim,
            gll: Gll1d::new(order)?,
        })
    }

    /// Nodes along one dimension, N + 1.
    pub fn nodes_per_dim(&self) -> usize {
        self.order + 1
    }

    /// Total node count (N+1)^dim.
    pub fn num_nodes(&self) -> usize {
        self.nodes_per_dim().pow(self.dim as u32)
    }

    /// Lexicographic node index from per-dimension indices (k ignored in 2D).
    pub fn node_index(&self, i: usize, j: usize, k: usize) -> usize {
        let np = self.nodes_per_dim();
        if self.dim == 2 {
            i + np * j
        } else {
            i + np * (j + np * k)
        }
    }

    /// Per-dimension indices of a lexicographic node index.
    pub fn node_ijk(&self, n: usize) -> [usize; 3] {
        let np = self.nodes_per_dim();
        if self.dim == 2 {
            [n % np, n / np, 0]
        } else {
            [n % np, (n / np) % np, n / (np * np)]
        }
    }

    /// Reference coordinates of node `n`.
    pub fn node_coords(&self, n: usize) -> [f64; 3] {
        let [i, j, k] = self.node_ijk(n);
        let x = &self.gll.nodes;
        if self.dim == 2 {
            [x[i], x[j], 0.0]
        } else {
            [x[i], x[j], x[k]]
        }
    }

    /// Reference quadrature weight of node `n`, the product of the 1D
    /// weights taken in (r, s, t) order.
    pub fn node_weight(&self, n: usize) -> f64 {
        let [i, j, k] = self.node_ijk(n);
        let w = &self.gll.weights;
        if self.dim == 2 {
            w[i] * w[j]
        } else {
            (w[i] * w[j]) * w[k]
        }
    }

    /// All basis values at an arbitrary reference point.
    pub fn interp(&self, xi: &[f64]) -> Vec<f64> {
        let lr = self.gll.interp(xi[0]);
        let ls = self.gll.interp(xi[1]);
        let lt = if self.dim == 3 {
            self.gll.interp(xi[2])
        } else {
            vec![1.0]
        };

        let mut out = Vec::with_capacity(self.num_nodes());
        let np = self.nodes_per_dim();
        let kk = if self.dim == 3 { np } else { 1 };
        for k in 0..kk {
            for j in 0..np {
                for i in 0..np {
                    out.push(lr[i] * ls[j] * lt[k]);
                }
            }
        }
        out
    }

    /// All basis partial derivatives along reference axis `axis`.
    pub fn deriv(&self, xi: &[f64], axis: usize) -> Vec<f64> {
        let mut tab = [
            self.gll.interp(xi[0]),
            self.gll.interp(xi[1]),
            if self.dim == 3 {
                self.gll.interp(xi[2])
            } else {
                vec![1.0]
            },
        ];
        tab[axis] = self.gll.interp_deriv(xi[axis]);

        let mut out = Vec::with_capacity(self.num_nodes());
        let np = self.nodes_per_dim();
        let kk = if self.dim == 3 { np } else { 1 };
        for k in 0..kk {
            for j in 0..np {
                for i in 0..np {
                    out.push(tab[0][i] * tab[1][j] * tab[2][k]);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_indexing_round_trips() {
        let b = TensorBasis::new(3, 3).unwrap();
        for n in 0..b.num_nodes() {
            let [i, j, k] = b.node_ijk(n);
            assert_eq!(b.node_index(i, j, k), n);
        }
    }

    #[test]
    fn weights_sum_to_reference_volume() {
        let quad = TensorBasis::new(4, 2).unwrap();
        let sum: f64 = (0..quad.num_nodes()).map(|n| quad.node_weight(n)).sum();
        assert!((sum - 4.0).abs() < 1e-12);

        let hex = TensorBasis::new(3, 3).unwrap();
        let sum: f64 = (0..hex.num_nodes()).map(|n| hex.node_weight(n)).sum();
        assert!((sum - 8.0).abs() < 1e-12);
    }

    #[test]
    fn interp_partition_of_unity() {
        let b = TensorBasis::new(3, 2).unwrap();
        for xi in [[-0.7, 0.2, 0.0], [0.0, 0.0, 0.0], [0.9, -0.9, 0.0]] {
            let sum: f64 = b.interp(&xi).iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn interp_cardinal_at_nodes() {
        let b = TensorBasis::new(2, 3).unwrap();
        for n in 0..b.num_nodes() {
            let vals = b.interp(&b.node_coords(n));
            for (m, &v) in vals.iter().enumerate() {
                let expected = if m == n { 1.0 } else { 0.0 };
                assert!((v - expected).abs() < 1e-12, "node {n} basis {m}");
            }
        }
    }

    #[test]
    fn deriv_matches_analytic_monomial() {
        // f(r, s) = r^2 s on the order-3 quad basis; exact in the span.
        let b = TensorBasis::new(3, 2).unwrap();
        let f: Vec<f64> = (0..b.num_nodes())
            .map(|n| {
                let c = b.node_coords(n);
                c[0] * c[0] * c[1]
            })
            .collect();
        for xi in [[-0.5, 0.4, 0.0], [0.3, -0.8, 0.0]] {
            let dr = b.deriv(&xi, 0);
            let ds = b.deriv(&xi, 1);
            let dfdr: f64 = dr.iter().zip(&f).map(|(a, b)| a * b).sum();
            let dfds: f64 = ds.iter().zip(&f).map(|(a, b)| a * b).sum();
            assert!((dfdr - 2.0 * xi[0] * xi[1]).abs() < 1e-11);
            assert!((dfds - xi[0] * xi[0]).abs() < 1e-11);
        }
    }
}
