//! Sum-factorized operators for quadrilaterals and hexahedra.
//!
//! All hot loops contract one reference dimension at a time against the 1D
//! differentiation matrix, so the full gradient operator is never
//! materialized. Jacobians are evaluated at construction for every node;
//! the bilinear/trilinear map makes them position-dependent.

use std::sync::Arc;

use nalgebra::DMatrix;
use sem_mesh::ElementShape;

use crate::basis::closure::{NodeEntity, classify_tensor_nodes, closure_permutation};
use crate::basis::tensor::TensorBasis;
use crate::element::{ElementOps, geometry_error};
use crate::error::Result;
use crate::shape::{HexGeometry, QuadGeometry};

enum TensorGeometry {
    Quad(QuadGeometry),
    Hex(HexGeometry),
}

/// A quad or hex element bound to its vertex coordinates.
pub struct TensorElement {
    shape: ElementShape,
    basis: Arc<TensorBasis>,
    geom: TensorGeometry,
    node_coords: Vec<[f64; 3]>,
    /// (J^-1)(l, k) per node, row-major with stride dim.
    inv_j: Vec<f64>,
    /// w_i * det J_i per node.
    wdetj: Vec<f64>,
    closure: Vec<usize>,
    entities: Vec<NodeEntity>,
    vertex_interp: DMatrix<f64>,
}

impl TensorElement {
    pub fn new(
        shape: ElementShape,
        basis: Arc<TensorBasis>,
        coords: &[[f64; 3]],
        element_id: usize,
    ) -> Result<Self> {
        let dim = basis.dim;
        let p = basis.num_nodes();
        let geom = match shape {
            ElementShape::Quad => TensorGeometry::Quad(QuadGeometry::new(coords)),
            ElementShape::Hex => TensorGeometry::Hex(HexGeometry::new(coords)),
            _ => unreachable!("tensor elements are quads and hexes"),
        };

        let mut node_coords = Vec::with_capacity(p);
        let mut inv_j = vec![0.0; p * dim * dim];
        let mut wdetj = vec![0.0; p];
        let nv = shape.num_vertices();
        let mut vertex_interp = DMatrix::zeros(p, nv);

        for n in 0..p {
            let xi = basis.node_coords(n);
            match &geom {
                TensorGeometry::Quad(g) => {
                    let xi2 = [xi[0], xi[1]];
                    let (inv, det) = g
                        .inverse_jacobian(&xi2)
                        .ok_or_else(|| geometry_error(element_id, 0.0))?;
                    if det <= 0.0 {
                        return Err(geometry_error(element_id, det));
                    }
                    for l in 0..2 {
                        for k in 0..2 {
                            inv_j[n * 4 + l * 2 + k] = inv[(l, k)];
                        }
                    }
                    wdetj[n] = basis.node_weight(n) * det;
                    let x = g.map(&xi2);
                    node_coords.push([x[0], x[1], 0.0]);
                    for (v, w) in QuadGeometry::vertex_weights(&xi2).iter().enumerate() {
                        vertex_interp[(n, v)] = *w;
                    }
                }
                TensorGeometry::Hex(g) => {
                    let (inv, det) = g
                        .inverse_jacobian(&xi)
                        .ok_or_else(|| geometry_error(element_id, 0.0))?;
                    if det <= 0.0 {
                        return Err(geometry_error(element_id, det));
                    }
                    for l in 0..3 {
                        for k in 0..3 {
                            inv_j[n * 9 + l * 3 + k] = inv[(l, k)];
                        }
                    }
                    wdetj[n] = basis.node_weight(n) * det;
                    node_coords.push(g.map(&xi));
                    for (v, w) in HexGeometry::vertex_weights(&xi).iter().enumerate() {
                        vertex_interp[(n, v)] = *w;
                    }
                }
            }
        }

        let closure = closure_permutation(&basis, shape);
        let entities = classify_tensor_nodes(&basis, shape);

        Ok(Self {
            shape,
            basis,
            geom,
            node_coords,
            inv_j,
            wdetj,
            closure,
            entities,
            vertex_interp,
        })
    }

    fn gradient_quad(&self, f: &[f64], grad: &mut [f64]) {
        let n1 = self.basis.nodes_per_dim();
        let p = n1 * n1;
        let d = &self.basis.gll.diff;
        for j in 0..n1 {
            for i in 0..n1 {
                let n = i + n1 * j;
                let mut dr = 0.0;
                for a in 0..n1 {
                    dr += d[(i, a)] * f[a + n1 * j];
                }
                let mut ds = 0.0;
                for b in 0..n1 {
                    ds += d[(j, b)] * f[i + n1 * b];
                }
                let inv = &self.inv_j[n * 4..n * 4 + 4];
                grad[n] = inv[0] * dr + inv[1] * ds;
                grad[p + n] = inv[2] * dr + inv[3] * ds;
            }
        }
    }

    fn gradient_hex(&self, f: &[f64], grad: &mut [f64]) {
        let n1 = self.basis.nodes_per_dim();
        let p = n1 * n1 * n1;
        let d = &self.basis.gll.diff;
        for k in 0..n1 {
            for j in 0..n1 {
                for i in 0..n1 {
                    let n = i + n1 * (j + n1 * k);
                    let mut dr = 0.0;
                    for a in 0..n1 {
                        dr += d[(i, a)] * f[a + n1 * (j + n1 * k)];
                    }
                    let mut ds = 0.0;
                    for b in 0..n1 {
                        ds += d[(j, b)] * f[i + n1 * (b + n1 * k)];
                    }
                    let mut dt = 0.0;
                    for c in 0..n1 {
                        dt += d[(k, c)] * f[i + n1 * (j + n1 * c)];
                    }
                    let inv = &self.inv_j[n * 9..n * 9 + 9];
                    grad[n] = inv[0] * dr + inv[1] * ds + inv[2] * dt;
                    grad[p + n] = inv[3] * dr + inv[4] * ds + inv[5] * dt;
                    grad[2 * p + n] = inv[6] * dr + inv[7] * ds + inv[8] * dt;
                }
            }
        }
    }

    fn grad_test_quad(&self, flux: &[f64], out: &mut [f64]) {
        let n1 = self.basis.nodes_per_dim();
        let p = n1 * n1;
        let d = &self.basis.gll.diff;
        // rotate into reference components and fold in the weights
        let mut gr = vec![0.0; p];
        let mut gs = vec![0.0; p];
        for n in 0..p {
            let c = self.wdetj[n];
            let inv = &self.inv_j[n * 4..n * 4 + 4];
            gr[n] = c * (inv[0] * flux[n] + inv[2] * flux[p + n]);
            gs[n] = c * (inv[1] * flux[n] + inv[3] * flux[p + n]);
        }
        for j in 0..n1 {
            for i in 0..n1 {
                let n = i + n1 * j;
                let mut acc = 0.0;
                for a in 0..n1 {
                    acc += d[(a, i)] * gr[a + n1 * j];
                }
                for b in 0..n1 {
                    acc += d[(b, j)] * gs[i + n1 * b];
                }
                out[n] = acc;
            }
        }
    }

    fn grad_test_hex(&self, flux: &[f64], out: &mut [f64]) {
        let n1 = self.basis.nodes_per_dim();
        let p = n1 * n1 * n1;
        let d = &self.basis.gll.diff;
        let mut gr = vec![0.0; p];
        let mut gs = vec![0.0; p];
        let mut gt = vec![0.0; p];
        for n in 0..p {
            let c = self.wdetj[n];
            let inv = &self.inv_j[n * 9..n * 9 + 9];
            let (f0, f1, f2) = (flux[n], flux[p + n], flux[2 * p + n]);
            gr[n] = c * (inv[0] * f0 + inv[3] * f1 + inv[6] * f2);
            gs[n] = c * (inv[1] * f0 + inv[4] * f1 + inv[7] * f2);
            gt[n] = c * (inv[2] * f0 + inv[5] * f1 + inv[8] * f2);
        }
        for k in 0..n1 {
            for j in 0..n1 {
                for i in 0..n1 {
                    let n = i + n1 * (j + n1 * k);
                    let mut acc = 0.0;
                    for a in 0..n1 {
                        acc += d[(a, i)] * gr[a + n1 * (j + n1 * k)];
                    }
                    for b in 0..n1 {
                        acc += d[(b, j)] * gs[i + n1 * (b + n1 * k)];
                    }
                    for c in 0..n1 {
                        acc += d[(c, k)] * gt[i + n1 * (j + n1 * c)];
                    }
                    out[n] = acc;
                }
            }
        }
    }

    /// Tensor index of a face-grid position (u, v run over the full
    /// (N+1)^2 grid of the face; v ignored for quad edges).
    fn face_grid_index(&self, face: usize, u: usize, v: usize) -> usize {
        let n = self.basis.order;
        match self.shape {
            ElementShape::Quad => match face {
                0 => self.basis.node_index(u, 0, 0),
                1 => self.basis.node_index(u, n, 0),
                2 => self.basis.node_index(0, u, 0),
                _ => self.basis.node_index(n, u, 0),
            },
            ElementShape::Hex => match face {
                0 => self.basis.node_index(u, v, 0),
                1 => self.basis.node_index(u, v, n),
                2 => self.basis.node_index(u, 0, v),
                3 => self.basis.node_index(u, n, v),
                4 => self.basis.node_index(0, u, v),
                _ => self.basis.node_index(n, u, v),
            },
            _ => unreachable!(),
        }
    }

    /// Physical face corners projected onto an orthonormal in-plane frame.
    fn projected_face(&self, face: usize) -> QuadGeometry {
        let TensorGeometry::Hex(g) = &self.geom else {
            unreachable!("2D faces are edges");
        };
        let cycle = self.shape.faces()[face];
        let c: Vec<[f64; 3]> = cycle.iter().map(|&v| g.verts()[v]).collect();
        let sub = |a: [f64; 3], b: [f64; 3]| [a[0] - b[0], a[1] - b[1], a[2] - b[2]];
        let dot = |a: [f64; 3], b: [f64; 3]| a[0] * b[0] + a[1] * b[1] + a[2] * b[2];
        let e1raw = sub(c[1], c[0]);
        let n1 = dot(e1raw, e1raw).sqrt();
        let e1 = [e1raw[0] / n1, e1raw[1] / n1, e1raw[2] / n1];
        let e2raw = sub(c[3], c[0]);
        let along = dot(e2raw, e1);
        let mut e2 = [
            e2raw[0] - along * e1[0],
            e2raw[1] - along * e1[1],
            e2raw[2] - along * e1[2],
        ];
        let n2 = dot(e2, e2).sqrt();
        for x in e2.iter_mut() {
            *x /= n2;
        }
        let projected: Vec<[f64; 3]> = c
            .iter()
            .map(|&v| {
                let d = sub(v, c[0]);
                [dot(d, e1), dot(d, e2), 0.0]
            })
            .collect();
        QuadGeometry::new(&projected)
    }
}

impl ElementOps for TensorElement {
    fn shape(&self) -> ElementShape {
        self.shape
    }

    fn order(&self) -> usize {
        self.basis.order
    }

    fn dim(&self) -> usize {
        self.basis.dim
    }

    fn num_nodes(&self) -> usize {
        self.basis.num_nodes()
    }

    fn node_coords(&self) -> &[[f64; 3]] {
        &self.node_coords
    }

    fn integration_weights(&self) -> &[f64] {
        &self.wdetj
    }

    fn closure(&self) -> &[usize] {
        &self.closure
    }

    fn node_entities(&self) -> &[NodeEntity] {
        &self.entities
    }

    fn compute_gradient(&self, f: &[f64], grad: &mut [f64]) {
        match self.shape {
            ElementShape::Quad => self.gradient_quad(f, grad),
            _ => self.gradient_hex(f, grad),
        }
    }

    fn apply_grad_test_and_integrate(&self, flux: &[f64], out: &mut [f64]) {
        match self.shape {
            ElementShape::Quad => self.grad_test_quad(flux, out),
            _ => self.grad_test_hex(flux, out),
        }
    }

    fn apply_test_and_integrate_face(&self, f: &[f64], face: usize, out: &mut [f64]) {
        let n1 = self.basis.nodes_per_dim();
        let w1 = &self.basis.gll.weights;
        match self.shape {
            ElementShape::Quad => {
                // straight edge: constant 1D metric |Q - P| / 2
                let TensorGeometry::Quad(g) = &self.geom else {
                    unreachable!();
                };
                let ends = self.shape.faces()[face];
                let (pv, qv) = (g.verts()[ends[0]], g.verts()[ends[1]]);
                let len = ((qv[0] - pv[0]).powi(2) + (qv[1] - pv[1]).powi(2)).sqrt();
                for u in 0..n1 {
                    let node = self.face_grid_index(face, u, 0);
                    out[node] += w1[u] * len / 2.0 * f[node];
                }
            }
            ElementShape::Hex => {
                let face2d = self.projected_face(face);
                for v in 0..n1 {
                    for u in 0..n1 {
                        let node = self.face_grid_index(face, u, v);
                        let xi2 = [self.basis.gll.nodes[u], self.basis.gll.nodes[v]];
                        let (_, det2) = face2d.jacobian_det(&xi2);
                        out[node] += w1[u] * w1[v] * det2.abs() * f[node];
                    }
                }
            }
            _ => unreachable!(),
        }
    }

    fn face_nodes(&self, face: usize) -> Vec<usize> {
        let n1 = self.basis.nodes_per_dim();
        match self.shape {
            ElementShape::Quad => (0..n1).map(|u| self.face_grid_index(face, u, 0)).collect(),
            _ => {
                let mut out = Vec::with_capacity(n1 * n1);
                for v in 0..n1 {
                    for u in 0..n1 {
                        out.push(self.face_grid_index(face, u, v));
                    }
                }
                out
            }
        }
    }

    fn interp_at(&self, xi: &[f64]) -> Vec<f64> {
        self.basis.interp(xi)
    }

    fn inverse_map(&self, x: &[f64; 3]) -> Option<Vec<f64>> {
        match &self.geom {
            TensorGeometry::Quad(g) => g.inverse_map(&[x[0], x[1]]).map(|xi| xi.to_vec()),
            TensorGeometry::Hex(g) => g.inverse_map(x).map(|xi| xi.to_vec()),
        }
    }

    fn check_hull(&self, x: &[f64; 3]) -> bool {
        match &self.geom {
            TensorGeometry::Quad(g) => g.check_hull(x),
            TensorGeometry::Hex(g) => g.check_hull(x),
        }
    }

    fn vertex_interp(&self) -> &DMatrix<f64> {
        &self.vertex_interp
    }

    fn size_measure(&self) -> f64 {
        match &self.geom {
            TensorGeometry::Quad(g) => g.min_edge_length(),
            TensorGeometry::Hex(g) => g.min_edge_length(),
        }
    }
}
