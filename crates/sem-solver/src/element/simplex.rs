//! Dense-table operators for triangles and tetrahedra.
//!
//! The affine map gives a constant Jacobian, so sum factorization buys
//! nothing here; the reference derivative tables are applied as dense
//! matrices, and the scalar stiffness is pre-formed once per element and
//! used as a plain matrix-vector product afterwards. The pre-formed
//! stiffness is integrated with the exact Duffy-Gauss cubature: the
//! collocated nodal rules exist to keep the mass diagonal, but the bubble
//! enrichments push the stiffness integrands past their exactness degree,
//! and under-integrating there costs accuracy on coarse meshes.

use std::sync::Arc;

use nalgebra::DMatrix;
use sem_mesh::ElementShape;

use crate::basis::closure::NodeEntity;
use crate::basis::cubature;
use crate::basis::simplex::{
    SimplexBasis, TET2_FACE_WE, TET2_FACE_WF, TET2_FACE_WV,
};
use crate::element::{ElementOps, geometry_error};
use crate::error::Result;
use crate::shape::{TetGeometry, TriGeometry};

enum SimplexGeometry {
    Tri(TriGeometry),
    Tet(TetGeometry),
}

/// A tri or tet element bound to its vertex coordinates.
pub struct SimplexElement {
    basis: Arc<SimplexBasis>,
    geom: SimplexGeometry,
    node_coords: Vec<[f64; 3]>,
    /// Constant (J^-1)(l, k), row-major with stride dim.
    inv_j: [f64; 9],
    det_j: f64,
    /// w_i * det J per node.
    wdetj: Vec<f64>,
    closure: Vec<usize>,
    vertex_interp: DMatrix<f64>,
    /// Collocated 1D rule on the edge node positions, aligned with
    /// `face_nodes` order (triangles only).
    edge_rule: Vec<f64>,
}

impl SimplexElement {
    pub fn new(basis: Arc<SimplexBasis>, coords: &[[f64; 3]], element_id: usize) -> Result<Self> {
        let dim = basis.shape.dim();
        let p = basis.num_nodes();

        let (geom, det_j, inv_flat) = match basis.shape {
            ElementShape::Tri => {
                let g = TriGeometry::new(coords);
                let (inv, det) = g
                    .inverse_jacobian()
                    .ok_or_else(|| geometry_error(element_id, 0.0))?;
                if det <= 0.0 {
                    return Err(geometry_error(element_id, det));
                }
                let mut flat = [0.0; 9];
                for l in 0..2 {
                    for k in 0..2 {
                        flat[l * 2 + k] = inv[(l, k)];
                    }
                }
                (SimplexGeometry::Tri(g), det, flat)
            }
            ElementShape::Tet => {
                let g = TetGeometry::new(coords);
                let (inv, det) = g
                    .inverse_jacobian()
                    .ok_or_else(|| geometry_error(element_id, 0.0))?;
                if det <= 0.0 {
                    return Err(geometry_error(element_id, det));
                }
                let mut flat = [0.0; 9];
                for l in 0..3 {
                    for k in 0..3 {
                        flat[l * 3 + k] = inv[(l, k)];
                    }
                }
                (SimplexGeometry::Tet(g), det, flat)
            }
            _ => unreachable!("simplex elements are tris and tets"),
        };

        let nv = basis.shape.num_vertices();
        let mut node_coords = Vec::with_capacity(p);
        let mut vertex_interp = DMatrix::zeros(p, nv);
        let mut wdetj = vec![0.0; p];
        for (n, node) in basis.nodes.iter().enumerate() {
            wdetj[n] = basis.weights[n] * det_j;
            match &geom {
                SimplexGeometry::Tri(g) => {
                    let xi2 = [node[0], node[1]];
                    let x = g.map(&xi2);
                    node_coords.push([x[0], x[1], 0.0]);
                    for (v, w) in TriGeometry::vertex_weights(&xi2).iter().enumerate() {
                        vertex_interp[(n, v)] = *w;
                    }
                }
                SimplexGeometry::Tet(g) => {
                    node_coords.push(g.map(node));
                    for (v, w) in TetGeometry::vertex_weights(node).iter().enumerate() {
                        vertex_interp[(n, v)] = *w;
                    }
                }
            }
        }

        let edge_rule = if dim == 2 {
            edge_rule_1d(&basis)
        } else {
            Vec::new()
        };

        Ok(Self {
            closure: (0..p).collect(),
            basis,
            geom,
            node_coords,
            inv_j: inv_flat,
            det_j,
            wdetj,
            vertex_interp,
            edge_rule,
        })
    }

    fn reference_derivs(&self, f: &[f64], out: &mut [[f64; 3]]) {
        let p = self.basis.num_nodes();
        let dim = self.basis.shape.dim();
        for n in 0..p {
            let mut d = [0.0; 3];
            for i in 0..p {
                d[0] += self.basis.dr[(n, i)] * f[i];
                d[1] += self.basis.ds[(n, i)] * f[i];
            }
            if dim == 3 {
                let dt = self.basis.dt.as_ref().expect("3D basis carries dt");
                for i in 0..p {
                    d[2] += dt[(n, i)] * f[i];
                }
            }
            out[n] = d;
        }
    }
}

/// Group weight of a tet2 node on a local face: corners, midpoints of
/// the face's edges, and the face's own points carry the collocated face
/// rule; every other node is off the face.
fn tet2_face_weight(shape: ElementShape, ent: &NodeEntity, face: usize) -> Option<f64> {
    let cyc = shape.faces()[face];
    match *ent {
        NodeEntity::Vertex(v) if cyc.contains(&v) => Some(TET2_FACE_WV),
        NodeEntity::Edge { edge, .. } => {
            let [a, b] = shape.edges()[edge];
            (cyc.contains(&a) && cyc.contains(&b)).then_some(TET2_FACE_WE)
        }
        NodeEntity::Face { face: f, .. } if f == face => Some(TET2_FACE_WF),
        _ => None,
    }
}

/// Interpolatory 1D rule on the triangle's edge node positions
/// ([-1, interior..., 1]), solved from the moment equations. Exact to
/// degree (#nodes - 1), which covers the traces of the element space.
fn edge_rule_1d(basis: &SimplexBasis) -> Vec<f64> {
    let per_edge = match basis.order {
        1 => 0,
        2 => 1,
        _ => 2,
    };
    let mut positions = vec![-1.0];
    // interior positions of local edge 0 ((0,1): s = -1, parameter = r)
    for idx in 0..per_edge {
        let node = basis
            .entities
            .iter()
            .position(|e| matches!(e, NodeEntity::Edge { edge: 0, index } if *index == idx))
            .expect("edge node present");
        positions.push(basis.nodes[node][0]);
    }
    positions.push(1.0);

    let m = positions.len();
    let mut vand = DMatrix::zeros(m, m);
    let mut moments = nalgebra::DVector::zeros(m);
    for k in 0..m {
        for (i, &x) in positions.iter().enumerate() {
            vand[(k, i)] = x.powi(k as i32);
        }
        moments[k] = if k % 2 == 0 {
            2.0 / (k as f64 + 1.0)
        } else {
            0.0
        };
    }
    let w = vand.lu().solve(&moments).expect("edge moment system solves");
    w.iter().copied().collect()
}

impl ElementOps for SimplexElement {
    fn shape(&self) -> ElementShape {
        self.basis.shape
    }

    fn order(&self) -> usize {
        self.basis.order
    }

    fn dim(&self) -> usize {
        self.basis.shape.dim()
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
        &self.basis.entities
    }

    fn compute_gradient(&self, f: &[f64], grad: &mut [f64]) {
        let p = self.basis.num_nodes();
        let dim = self.dim();
        let mut refd = vec![[0.0; 3]; p];
        self.reference_derivs(f, &mut refd);
        for n in 0..p {
            for l in 0..dim {
                let mut g = 0.0;
                for k in 0..dim {
                    g += self.inv_j[l * dim + k] * refd[n][k];
                }
                grad[l * p + n] = g;
            }
        }
    }

    fn apply_grad_test_and_integrate(&self, flux: &[f64], out: &mut [f64]) {
        let p = self.basis.num_nodes();
        let dim = self.dim();
        out[..p].fill(0.0);
        for n in 0..p {
            let c = self.wdetj[n];
            // G_k = c * sum_l (J^-1)(l, k) F_l
            let mut g = [0.0; 3];
            for k in 0..dim {
                for l in 0..dim {
                    g[k] += self.inv_j[l * dim + k] * flux[l * p + n];
                }
                g[k] *= c;
            }
            for i in 0..p {
                out[i] += self.basis.dr[(n, i)] * g[0] + self.basis.ds[(n, i)] * g[1];
            }
            if dim == 3 {
                let dt = self.basis.dt.as_ref().expect("3D basis carries dt");
                for i in 0..p {
                    out[i] += dt[(n, i)] * g[2];
                }
            }
        }
    }

    fn apply_test_and_integrate_face(&self, f: &[f64], face: usize, out: &mut [f64]) {
        match &self.geom {
            SimplexGeometry::Tri(_) => {
                let ends = self.basis.shape.edges()[face];
                let verts = [self.node_coords[ends[0]], self.node_coords[ends[1]]];
                // face_nodes order matches the edge-rule positions
                let nodes = self.face_nodes(face);
                let len = ((verts[1][0] - verts[0][0]).powi(2)
                    + (verts[1][1] - verts[0][1]).powi(2))
                .sqrt();
                for (slot, &node) in nodes.iter().enumerate() {
                    out[node] += self.edge_rule[slot] * len / 2.0 * f[node];
                }
            }
            SimplexGeometry::Tet(_) => {
                let cyc = self.basis.shape.faces()[face];
                let a = self.node_coords[cyc[0]];
                let b = self.node_coords[cyc[1]];
                let c = self.node_coords[cyc[2]];
                let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
                let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
                let cross = [
                    u[1] * v[2] - u[2] * v[1],
                    u[2] * v[0] - u[0] * v[2],
                    u[0] * v[1] - u[1] * v[0],
                ];
                let area =
                    0.5 * (cross[0] * cross[0] + cross[1] * cross[1] + cross[2] * cross[2]).sqrt();
                if self.basis.order == 1 {
                    // three vertex nodes, a third of the face area each
                    for &node in cyc {
                        out[node] += area / 3.0 * f[node];
                    }
                } else {
                    // collocated face rule, unit-triangle weights scaled
                    // to the physical area
                    let scale = 2.0 * area;
                    for (n, ent) in self.basis.entities.iter().enumerate() {
                        if let Some(w) = tet2_face_weight(self.basis.shape, ent, face) {
                            out[n] += w * scale * f[n];
                        }
                    }
                }
            }
        }
    }

    fn face_nodes(&self, face: usize) -> Vec<usize> {
        match self.basis.shape {
            ElementShape::Tri => {
                let ends = self.basis.shape.edges()[face];
                let mut nodes = vec![ends[0]];
                for (n, e) in self.basis.entities.iter().enumerate() {
                    if matches!(e, NodeEntity::Edge { edge, .. } if *edge == face) {
                        nodes.push(n);
                    }
                }
                nodes.push(ends[1]);
                nodes
            }
            _ if self.basis.order == 1 => self.basis.shape.faces()[face].to_vec(),
            _ => self
                .basis
                .entities
                .iter()
                .enumerate()
                .filter(|(_, e)| tet2_face_weight(self.basis.shape, e, face).is_some())
                .map(|(n, _)| n)
                .collect(),
        }
    }

    fn interp_at(&self, xi: &[f64]) -> Vec<f64> {
        self.basis.interp(xi)
    }

    fn inverse_map(&self, x: &[f64; 3]) -> Option<Vec<f64>> {
        match &self.geom {
            SimplexGeometry::Tri(g) => g.inverse_map(&[x[0], x[1]]).map(|xi| xi.to_vec()),
            SimplexGeometry::Tet(g) => g.inverse_map(x).map(|xi| xi.to_vec()),
        }
    }

    fn check_hull(&self, x: &[f64; 3]) -> bool {
        match &self.geom {
            SimplexGeometry::Tri(g) => g.check_hull(x),
            SimplexGeometry::Tet(g) => g.check_hull(x),
        }
    }

    fn vertex_interp(&self) -> &DMatrix<f64> {
        &self.vertex_interp
    }

    fn size_measure(&self) -> f64 {
        match &self.geom {
            SimplexGeometry::Tri(g) => g.min_edge_length(),
            SimplexGeometry::Tet(g) => g.min_edge_length(),
        }
    }

    fn build_stiffness_matrix(&self, c_nodes: &[f64]) -> Option<DMatrix<f64>> {
        let p = self.basis.num_nodes();
        let dim = self.dim();
        let (points, weights) = match self.basis.shape {
            ElementShape::Tri => cubature::triangle(7),
            _ => cubature::tetrahedron(7),
        };

        let mut k = DMatrix::zeros(p, p);
        let mut phys = vec![0.0; dim * p];
        for (q, &w) in points.iter().zip(&weights) {
            let xi = &q[..dim];
            let vals = self.basis.interp(xi);
            let c_q: f64 = vals.iter().zip(c_nodes).map(|(a, b)| a * b).sum();

            let dr = self.basis.deriv(xi, 0);
            let ds = self.basis.deriv(xi, 1);
            let dt = if dim == 3 {
                self.basis.deriv(xi, 2)
            } else {
                Vec::new()
            };
            for i in 0..p {
                let refd = [dr[i], ds[i], if dim == 3 { dt[i] } else { 0.0 }];
                for l in 0..dim {
                    let mut g = 0.0;
                    for m in 0..dim {
                        g += self.inv_j[l * dim + m] * refd[m];
                    }
                    phys[l * p + i] = g;
                }
            }

            let scale = w * self.det_j * c_q;
            for i in 0..p {
                for j in i..p {
                    let mut dot = 0.0;
                    for l in 0..dim {
                        dot += phys[l * p + i] * phys[l * p + j];
                    }
                    k[(i, j)] += scale * dot;
                }
            }
        }
        for i in 0..p {
            for j in 0..i {
                k[(i, j)] = k[(j, i)];
            }
        }
        Some(k)
    }
}
