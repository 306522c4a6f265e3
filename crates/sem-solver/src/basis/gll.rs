//! Gauss-Lobatto-Legendre quadrature and 1D Lagrange tables.
//!
//! The GLL rule of order N has N+1 nodes on [-1, 1] including both
//! endpoints and integrates polynomials up to degree 2N-1 exactly. The
//! interior nodes are the roots of P_N', found by Newton iteration from
//! Chebyshev-Lobatto starting values; weights follow from the closed form
//! w_i = 2 / (N (N+1) P_N(x_i)^2).

use nalgebra::DMatrix;

use crate::error::{Result, SolverError};

/// Largest tensor-shape polynomial order the engine accepts.
pub const MAX_ORDER: usize = 9;

/// 1D GLL nodes, weights, and the Lagrange differentiation matrix.
#[derive(Debug, Clone)]
pub struct Gll1d {
    /// Polynomial order N (N+1 nodes).
    pub order: usize,
    /// Nodes in ascending order; nodes[0] = -1, nodes[N] = +1.
    pub nodes: Vec<f64>,
    /// Quadrature weights, all positive.
    pub weights: Vec<f64>,
    /// diff[(i, j)] = l_j'(x_i).
    pub diff: DMatrix<f64>,
}

impl Gll1d {
    /// Build the tables for order `n`.
    pub fn new(n: usize) -> Result<Self> {
        if n < 1 || n > MAX_ORDER {
            return Err(SolverError::UnsupportedOrder {
                order: n,
                max: MAX_ORDER,
                shape: "tensor",
            });
        }

        let nodes = gll_nodes(n);
        let weights = gll_weights(n, &nodes);

        let np = n + 1;
        let mut diff = DMatrix::zeros(np, np);
        for i in 0..np {
            let row = lagrange_derivs(&nodes, nodes[i]);
            for j in 0..np {
                diff[(i, j)] = row[j];
            }
        }

        Ok(Self {
            order: n,
            nodes,
            weights,
            diff,
        })
    }

    /// Number of nodes, N + 1.
    pub fn num_nodes(&self) -> usize {
        self.order + 1
    }

    /// Lagrange basis values l_j(xi) at an arbitrary point.
    pub fn interp(&self, xi: f64) -> Vec<f64> {
        lagrange_values(&self.nodes, xi)
    }

    /// Lagrange basis derivatives l_j'(xi) at an arbitrary point.
    pub fn interp_deriv(&self, xi: f64) -> Vec<f64> {
        lagrange_derivs(&self.nodes, xi)
    }
}

/// P_n(x) and P_n'(x) by the three-term recurrence.
pub(crate) fn legendre(n: usize, x: f64) -> (f64, f64) {
    if n == 0 {
        return (1.0, 0.0);
    }
    let mut p_prev = 1.0;
    let mut p = x;
    for k in 1..n {
        let kf = k as f64;
        let p_next = ((2.0 * kf + 1.0) * x * p - kf * p_prev) / (kf + 1.0);
        p_prev = p;
        p = p_next;
    }
    // P_n'(x) = n (x P_n - P_{n-1}) / (x^2 - 1), valid away from the endpoints.
    let dp = if (x * x - 1.0).abs() < 1e-14 {
        // At x = +-1: P_n'(+-1) = (+-1)^{n-1} n (n+1) / 2.
        let sign = if n % 2 == 0 { x.signum() } else { 1.0 };
        sign * (n * (n + 1)) as f64 / 2.0
    } else {
        (n as f64) * (x * p - p_prev) / (x * x - 1.0)
    };
    (p, dp)
}

/// GLL nodes in ascending order.
fn gll_nodes(n: usize) -> Vec<f64> {
    let np = n + 1;
    let mut nodes = vec![0.0; np];
    nodes[0] = -1.0;
    nodes[n] = 1.0;

    // Interior nodes: roots of P_n'. Newton with P_n'' from the Legendre ODE.
    for i in 1..n {
        let mut x = -(std::f64::consts::PI * i as f64 / n as f64).cos();
        for _ in 0..50 {
            let (p, dp) = legendre(n, x);
            let ddp = (2.0 * x * dp - (n * (n + 1)) as f64 * p) / (1.0 - x * x);
            let step = dp / ddp;
            x -= step;
            if step.abs() < 1e-15 {
                break;
            }
        }
        nodes[i] = x;
    }
    // The midpoint root of an odd count lands on 0 exactly.
    if n % 2 == 0 {
        nodes[n / 2] = 0.0;
    }
    nodes
}

fn gll_weights(n: usize, nodes: &[f64]) -> Vec<f64> {
    nodes
        .iter()
        .map(|&x| {
            let (p, _) = legendre(n, x);
            2.0 / ((n * (n + 1)) as f64 * p * p)
        })
        .collect()
}

/// l_j(xi) for all j by the product formula; exact 0/1 at the nodes.
fn lagrange_values(nodes: &[f64], xi: f64) -> Vec<f64> {
    let np = nodes.len();
    let mut vals = vec![0.0; np];
    for j in 0..np {
        let mut v = 1.0;
        for k in 0..np {
            if k != j {
                v *= (xi - nodes[k]) / (nodes[j] - nodes[k]);
            }
        }
        vals[j] = v;
    }
    vals
}

/// l_j'(xi) for all j.
fn lagrange_derivs(nodes: &[f64], xi: f64) -> Vec<f64> {
    let np = nodes.len();
    let mut derivs = vec![0.0; np];
    for j in 0..np {
        let mut sum = 0.0;
        for m in 0..np {
            if m == j {
                continue;
            }
            let mut term = 1.0 / (nodes[j] - nodes[m]);
            for k in 0..np {
                if k != j && k != m {
                    term *= (xi - nodes[k]) / (nodes[j] - nodes[k]);
                }
            }
            sum += term;
        }
        derivs[j] = sum;
    }
    derivs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_orders() {
        assert!(matches!(
            Gll1d::new(0),
            Err(SolverError::UnsupportedOrder { order: 0, .. })
        ));
        assert!(Gll1d::new(MAX_ORDER).is_ok());
        assert!(Gll1d::new(MAX_ORDER + 1).is_err());
    }

    #[test]
    fn known_low_order_nodes() {
        let g1 = Gll1d::new(1).unwrap();
        assert_eq!(g1.nodes, vec![-1.0, 1.0]);
        assert_eq!(g1.weights, vec![1.0, 1.0]);

        let g2 = Gll1d::new(2).unwrap();
        assert!((g2.nodes[1]).abs() < 1e-15);
        assert!((g2.weights[0] - 1.0 / 3.0).abs() < 1e-14);
        assert!((g2.weights[1] - 4.0 / 3.0).abs() < 1e-14);

        // N = 3 interior nodes sit at +-1/sqrt(5).
        let g3 = Gll1d::new(3).unwrap();
        let r = 1.0 / 5.0_f64.sqrt();
        assert!((g3.nodes[1] + r).abs() < 1e-13);
        assert!((g3.nodes[2] - r).abs() < 1e-13);
        assert!((g3.weights[0] - 1.0 / 6.0).abs() < 1e-13);
        assert!((g3.weights[1] - 5.0 / 6.0).abs() < 1e-13);
    }

    #[test]
    fn weights_are_positive_and_sum_to_interval_length() {
        for n in 1..=MAX_ORDER {
            let g = Gll1d::new(n).unwrap();
            let sum: f64 = g.weights.iter().sum();
            assert!((sum - 2.0).abs() < 1e-12, "order {n}: sum {sum}");
            assert!(g.weights.iter().all(|&w| w > 0.0), "order {n}");
        }
    }

    #[test]
    fn quadrature_exact_to_degree_2n_minus_1() {
        for n in 1..=MAX_ORDER {
            let g = Gll1d::new(n).unwrap();
            for deg in 0..=(2 * n - 1) {
                let numeric: f64 = g
                    .nodes
                    .iter()
                    .zip(&g.weights)
                    .map(|(&x, &w)| w * x.powi(deg as i32))
                    .sum();
                let exact = if deg % 2 == 0 {
                    2.0 / (deg as f64 + 1.0)
                } else {
                    0.0
                };
                assert!(
                    (numeric - exact).abs() < 1e-12,
                    "order {n} degree {deg}: {numeric} vs {exact}"
                );
            }
        }
    }

    #[test]
    fn interp_is_cardinal_at_nodes_and_sums_to_one() {
        let g = Gll1d::new(5).unwrap();
        for (i, &x) in g.nodes.iter().enumerate() {
            let vals = g.interp(x);
            for (j, &v) in vals.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((v - expected).abs() < 1e-12);
            }
        }
        for &xi in &[-0.9, -0.3, 0.1, 0.77] {
            let sum: f64 = g.interp(xi).iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn differentiation_matrix_is_exact_on_polynomials() {
        let g = Gll1d::new(4).unwrap();
        // f(x) = x^3 - 2x, f'(x) = 3x^2 - 2, both within the basis span.
        let f: Vec<f64> = g.nodes.iter().map(|&x| x * x * x - 2.0 * x).collect();
        for i in 0..g.num_nodes() {
            let mut df = 0.0;
            for j in 0..g.num_nodes() {
                df += g.diff[(i, j)] * f[j];
            }
            let exact = 3.0 * g.nodes[i] * g.nodes[i] - 2.0;
            assert!((df - exact).abs() < 1e-11, "node {i}: {df} vs {exact}");
        }
    }

    #[test]
    fn derivative_rows_sum_to_zero() {
        // d/dx of the constant 1 must vanish.
        let g = Gll1d::new(6).unwrap();
        for i in 0..g.num_nodes() {
            let row_sum: f64 = (0..g.num_nodes()).map(|j| g.diff[(i, j)]).sum();
            assert!(row_sum.abs() < 1e-11);
        }
    }
}
