//! Per-element spectral operators.
//!
//! [`ElementOps`] is the small shape-capability interface the physics
//! kernels program against: gradients, test-function integration, delta
//! coefficients, point location. Tensor shapes (quad/hex) implement it
//! with sum-factorized 1D contractions; simplices (tri/tet) with dense
//! reference derivative tables and an optional pre-formed stiffness.

pub mod simplex;
pub mod tensor;

use nalgebra::DMatrix;
use sem_mesh::ElementShape;

use crate::basis::{BasisCache, NodeEntity, ReferenceBasis};
use crate::error::{Result, SolverError};

pub use simplex::SimplexElement;
pub use tensor::TensorElement;

/// Spectral operators of one concrete element.
///
/// Nodal data passed in and out is in tensor (table) order. Vector-valued
/// quantities (gradients, fluxes) are component-major: entry `k * P + p`
/// holds component `k` at node `p`.
pub trait ElementOps: Send + Sync {
    fn shape(&self) -> ElementShape;
    fn order(&self) -> usize;
    fn dim(&self) -> usize;
    /// Number of nodes P.
    fn num_nodes(&self) -> usize;
    /// Physical coordinates of every node.
    fn node_coords(&self) -> &[[f64; 3]];
    /// Combined quadrature weight w_i * det J_i at every node.
    fn integration_weights(&self) -> &[f64];
    /// Closure permutation sigma: `f_tensor[sigma[i]]` is the i-th DoF in
    /// topology order.
    fn closure(&self) -> &[usize];
    /// Mesh entity of each node, in tensor order.
    fn node_entities(&self) -> &[NodeEntity];

    /// Physical gradient of a nodal field at every node.
    fn compute_gradient(&self, f: &[f64], grad: &mut [f64]);

    /// r_i = integral of grad(phi_i) . F over the element.
    fn apply_grad_test_and_integrate(&self, flux: &[f64], out: &mut [f64]);

    /// r_i = w_i det J_i f_i (collocation makes this diagonal).
    fn apply_test_and_integrate(&self, f: &[f64], out: &mut [f64]) {
        let w = self.integration_weights();
        for (i, o) in out.iter_mut().enumerate() {
            *o = w[i] * f[i];
        }
    }

    /// Surface integral of f against the test functions on one face,
    /// written into the face's nodes of `out` (other entries untouched).
    fn apply_test_and_integrate_face(&self, f: &[f64], face: usize, out: &mut [f64]);

    /// Tensor-order node indices on a local face (edge in 2D).
    fn face_nodes(&self, face: usize) -> Vec<usize>;

    /// Basis values at an arbitrary reference point.
    fn interp_at(&self, xi: &[f64]) -> Vec<f64>;

    /// c_i = l_i(xi) / (w_i det J_i); `apply_test_and_integrate(c)` then
    /// reproduces a unit point source at xi.
    fn delta_coefficients(&self, xi: &[f64]) -> Vec<f64> {
        let l = self.interp_at(xi);
        let w = self.integration_weights();
        l.iter().zip(w).map(|(&li, &wi)| li / wi).collect()
    }

    /// Reference coordinates of a physical point, if the map inverts.
    fn inverse_map(&self, x: &[f64; 3]) -> Option<Vec<f64>>;

    /// Membership test: bounding box first, then the shape's exact test.
    fn check_hull(&self, x: &[f64; 3]) -> bool;

    /// P x n_verts interpolation matrix from cell vertices to nodes, used
    /// to carry material parameters onto the integration points.
    fn vertex_interp(&self) -> &DMatrix<f64>;

    /// Element size measure for CFL estimates (shortest edge).
    fn size_measure(&self) -> f64;

    /// Pre-formed stiffness for a scalar law with coefficient `c_nodes`
    /// (simplices only; tensor shapes stay matrix-free).
    fn build_stiffness_matrix(&self, _c_nodes: &[f64]) -> Option<DMatrix<f64>> {
        None
    }
}

/// Interpolate per-vertex values to the element nodes.
pub fn params_at_nodes(element: &dyn ElementOps, vertex_values: &[f64]) -> Vec<f64> {
    let interp = element.vertex_interp();
    let p = element.num_nodes();
    let mut out = vec![0.0; p];
    for i in 0..p {
        let mut acc = 0.0;
        for (v, &val) in vertex_values.iter().enumerate() {
            acc += interp[(i, v)] * val;
        }
        out[i] = acc;
    }
    out
}

/// Build the element operators for one cell from shared reference tables.
/// Cheap to call in parallel once the tables exist.
pub fn build_element_from(
    basis: &ReferenceBasis,
    shape: ElementShape,
    coords: &[[f64; 3]],
    element_id: usize,
) -> Result<Box<dyn ElementOps>> {
    match basis {
        ReferenceBasis::Tensor(b) => Ok(Box::new(TensorElement::new(
            shape,
            b.clone(),
            coords,
            element_id,
        )?)),
        ReferenceBasis::Simplex(b) => Ok(Box::new(SimplexElement::new(
            b.clone(),
            coords,
            element_id,
        )?)),
    }
}

/// Build the element operators for one cell.
pub fn build_element(
    cache: &mut BasisCache,
    shape: ElementShape,
    order: usize,
    coords: &[[f64; 3]],
    element_id: usize,
) -> Result<Box<dyn ElementOps>> {
    let basis = cache.get(shape, order)?;
    build_element_from(&basis, shape, coords, element_id)
}

pub(crate) fn geometry_error(element: usize, det: f64) -> SolverError {
    SolverError::Geometry {
        element,
        reason: format!("non-positive Jacobian determinant {det:.6e} at an integration point"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_builds_every_supported_shape() {
        let mut cache = BasisCache::new();
        let quad = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        assert!(build_element(&mut cache, ElementShape::Quad, 3, &quad, 0).is_ok());

        let tri = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        assert!(build_element(&mut cache, ElementShape::Tri, 3, &tri, 1).is_ok());

        let tet = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ];
        assert!(build_element(&mut cache, ElementShape::Tet, 1, &tet, 2).is_ok());
        assert!(build_element(&mut cache, ElementShape::Tet, 2, &tet, 3).is_ok());
        assert!(matches!(
            build_element(&mut cache, ElementShape::Tet, 3, &tet, 4),
            Err(SolverError::UnsupportedOrder { .. })
        ));
    }

    #[test]
    fn inverted_cell_is_a_geometry_error() {
        let mut cache = BasisCache::new();
        // clockwise quad, negative determinant
        let quad = [
            [0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
        ];
        assert!(matches!(
            build_element(&mut cache, ElementShape::Quad, 2, &quad, 7),
            Err(SolverError::Geometry { element: 7, .. })
        ));
    }
}
