//! Exact cubature on the reference simplices.
//!
//! Duffy-collapsed Gauss-Legendre products: the reference triangle or tet
//! is mapped to the unit square/cube and integrated with a tensor Gauss
//! rule, giving exactness to any requested polynomial degree. The
//! collocated nodal rules keep the mass diagonal; these rules serve the
//! pre-formed simplex stiffness, whose integrands exceed the nodal rules'
//! degree once the basis carries bubble enrichments.

use crate::basis::gll::legendre;

/// Gauss-Legendre nodes and weights on [0, 1].
fn gauss01(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut xs = Vec::with_capacity(n);
    let mut ws = Vec::with_capacity(n);
    for i in 1..=n {
        let mut x = (std::f64::consts::PI * (i as f64 - 0.25) / (n as f64 + 0.5)).cos();
        for _ in 0..100 {
            let (p, dp) = legendre(n, x);
            let dx = p / dp;
            x -= dx;
            if dx.abs() < 1e-15 {
                break;
            }
        }
        let (_, dp) = legendre(n, x);
        xs.push((x + 1.0) / 2.0);
        ws.push(1.0 / ((1.0 - x * x) * dp * dp));
    }
    (xs, ws)
}

/// Cubature on the reference triangle (-1,-1), (1,-1), (-1,1) (area 2),
/// exact for polynomials of total degree <= 2n - 2.
pub fn triangle(n: usize) -> (Vec<[f64; 3]>, Vec<f64>) {
    let (xs, ws) = gauss01(n);
    let mut pts = Vec::with_capacity(n * n);
    let mut wts = Vec::with_capacity(n * n);
    for (u, wu) in xs.iter().zip(&ws) {
        for (v, wv) in xs.iter().zip(&ws) {
            let l1 = u;
            let l2 = v * (1.0 - u);
            pts.push([2.0 * l1 - 1.0, 2.0 * l2 - 1.0, 0.0]);
            wts.push(wu * wv * (1.0 - u) * 4.0);
        }
    }
    (pts, wts)
}

/// Cubature on the reference tetrahedron (volume 4/3), exact for
/// polynomials of total degree <= 2n - 3.
pub fn tetrahedron(n: usize) -> (Vec<[f64; 3]>, Vec<f64>) {
    let (xs, ws) = gauss01(n);
    let mut pts = Vec::with_capacity(n * n * n);
    let mut wts = Vec::with_capacity(n * n * n);
    for (u, wu) in xs.iter().zip(&ws) {
        for (v, wv) in xs.iter().zip(&ws) {
            for (w, ww) in xs.iter().zip(&ws) {
                let l1 = u;
                let l2 = v * (1.0 - u);
                let l3 = w * (1.0 - u) * (1.0 - v);
                let jac = (1.0 - u) * (1.0 - u) * (1.0 - v);
                pts.push([2.0 * l1 - 1.0, 2.0 * l2 - 1.0, 2.0 * l3 - 1.0]);
                wts.push(wu * wv * ww * jac * 8.0);
            }
        }
    }
    (pts, wts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(n: i32) -> f64 {
        (1..=n).map(|k| k as f64).product()
    }

    /// Moment of r^a s^b over the reference triangle by affine change from
    /// the unit triangle (a! b! / (a+b+2)!).
    fn tri_moment(a: i32, b: i32) -> f64 {
        let mut total = 0.0;
        for i in 0..=a {
            for j in 0..=b {
                let binom = fact(a) / (fact(i) * fact(a - i)) * fact(b) / (fact(j) * fact(b - j));
                total += binom
                    * 2f64.powi(i + j)
                    * (-1f64).powi(a - i + b - j)
                    * (fact(i) * fact(j) / fact(i + j + 2));
            }
        }
        4.0 * total
    }

    #[test]
    fn triangle_weights_sum_to_the_area() {
        let (_, wts) = triangle(6);
        let sum: f64 = wts.iter().sum();
        assert!((sum - 2.0).abs() < 1e-13);
    }

    #[test]
    fn triangle_rule_is_exact_on_high_degree_monomials() {
        let (pts, wts) = triangle(6); // degree 10
        for (a, b) in [(0, 0), (3, 2), (5, 3), (8, 0), (4, 4)] {
            let numeric: f64 = pts
                .iter()
                .zip(&wts)
                .map(|(p, &w)| w * p[0].powi(a) * p[1].powi(b))
                .sum();
            let exact = tri_moment(a, b);
            assert!(
                (numeric - exact).abs() < 1e-12 * exact.abs().max(1.0),
                "r^{a} s^{b}: {numeric} vs {exact}"
            );
        }
    }

    #[test]
    fn tetrahedron_weights_sum_to_the_volume() {
        let (_, wts) = tetrahedron(6);
        let sum: f64 = wts.iter().sum();
        assert!((sum - 4.0 / 3.0).abs() < 1e-13);
    }

    #[test]
    fn tetrahedron_rule_integrates_low_moments() {
        let (pts, wts) = tetrahedron(6);
        // int of r over the reference tet: centroid r = -1/2, volume 4/3
        let numeric: f64 = pts.iter().zip(&wts).map(|(p, &w)| w * p[0]).sum();
        assert!((numeric + 2.0 / 3.0).abs() < 1e-12);
        // int of r^2: by affine change from the unit tet, 4*... use the
        // unit-tet moment x^2 -> 1/60, x -> 1/24, 1 -> 1/6:
        // (2x-1)^2 = 4x^2 - 4x + 1 -> 8*(4/60 - 4/24 + 1/6) = 8/15
        let numeric: f64 = pts.iter().zip(&wts).map(|(p, &w)| w * p[0] * p[0]).sum();
        assert!((numeric - 8.0 / 15.0).abs() < 1e-12, "{numeric}");
    }
}
