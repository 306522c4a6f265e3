//! Nodal tables for triangles and tetrahedra.
//!
//! Simplices have no tensor structure, so each supported order carries a
//! full-dimensional table: node positions, cubature weights collocated with
//! the nodes (this is what makes the mass matrix diagonal), and dense
//! derivative tables. The interpolation spaces are the classical
//! mass-lumped enrichments:
//!
//! - triangle N=1: P1 on the 3 vertices;
//! - triangle N=2: P2 + cell bubble on 7 nodes, cubature exact to degree 3;
//! - triangle N=3: P3 + b*P1 on 12 nodes, cubature exact to degree 5 with
//!   all weights positive (edge parameter alpha, interior parameter beta);
//! - tetrahedron N=1: P1 on the 4 vertices;
//! - tetrahedron N=2: the 23-node element of Mulder's family, P2 + (face
//!   bubble x face P1) per face + cell bubble, with vertices, edge
//!   midpoints, 3 points per face at face-barycentric (1-2a, a, a) and
//!   the centroid; its collocated rule is the unique positive solution of
//!   the degree-4 moment equations.
//!
//! Bare P2 nodes on the tetrahedron give a negative vertex weight (the
//! enrichment above is what restores positivity), and the degree-3 tet
//! needs the 50-node layout whose orbit structure is not determined by
//! the moment equations alone, so tet orders >= 3 reject with
//! `UnsupportedOrder`.
//!
//! The reference triangle is (-1,-1), (1,-1), (-1,1) (area 2); the
//! reference tetrahedron is (-1,-1,-1), (1,-1,-1), (-1,1,-1), (-1,-1,1)
//! (volume 4/3). The numeric parameters below were produced offline by
//! Newton iteration on the symmetric moment equations.

use nalgebra::DMatrix;
use sem_mesh::ElementShape;

use crate::basis::closure::NodeEntity;
use crate::error::{Result, SolverError};

/// Largest supported triangle order.
pub const MAX_TRI_ORDER: usize = 3;
/// Largest supported tetrahedron order.
pub const MAX_TET_ORDER: usize = 2;

// Degree-3 triangle: edge nodes at alpha / 1-alpha along each edge,
// interior nodes at barycentric (1-2*beta, beta, beta) and permutations.
const TRI3_ALPHA: f64 = 0.29346955590904017;
const TRI3_BETA: f64 = 0.20734517566359079;
// Weights on the reference triangle (area 2).
const TRI3_WV: f64 = 0.029745826049641173;
const TRI3_WE: f64 = 0.097683362468101596;
const TRI3_WI: f64 = 0.44155411568082224;

// Degree-2 tetrahedron: face nodes at face-barycentric (1-2a, a, a) and
// permutations; weights on the reference tet (volume 4/3).
const TET2_ALPHA: f64 = 0.18858048469644617;
const TET2_WV: f64 = 0.0017328144234988207;
const TET2_WE: f64 = 0.010017745385040765;
const TET2_WF: f64 = 0.071662199748324509;
const TET2_WC: f64 = 0.40634920634919935;

/// Collocated face rule of the degree-2 tet, unit-triangle weights for
/// the vertex / edge-midpoint / face-point groups (exact to degree 3).
pub(crate) const TET2_FACE_WV: f64 = 0.01027006767296712;
pub(crate) const TET2_FACE_WE: f64 = 0.030987749434133832;
pub(crate) const TET2_FACE_WF: f64 = 0.12540884955956572;

/// Full-dimensional nodal basis for a simplex shape.
///
/// Nodes are stored in topology order (vertices, then edge nodes along each
/// local edge's direction, then interior), so the closure permutation for
/// simplices is the identity.
#[derive(Debug, Clone)]
pub struct SimplexBasis {
    pub shape: ElementShape,
    pub order: usize,
    /// Reference coordinates, one row per node (third entry unused in 2D).
    pub nodes: Vec<[f64; 3]>,
    /// Collocated cubature weights, all positive.
    pub weights: Vec<f64>,
    /// Mesh entity of each node, aligned with `nodes`.
    pub entities: Vec<NodeEntity>,
    /// coeff[(g, i)]: l_i = sum_g coeff[(g, i)] * gen_g.
    coeff: DMatrix<f64>,
    /// dr[(p, i)] = dl_i/dr at node p; likewise ds, dt.
    pub dr: DMatrix<f64>,
    pub ds: DMatrix<f64>,
    pub dt: Option<DMatrix<f64>>,
}

impl SimplexBasis {
    pub fn triangle(order: usize) -> Result<Self> {
        if order < 1 || order > MAX_TRI_ORDER {
            return Err(SolverError::UnsupportedOrder {
                order,
                max: MAX_TRI_ORDER,
                shape: "triangle",
            });
        }
        let (nodes, weights, entities) = tri_nodes(order);
        Self::build(ElementShape::Tri, order, nodes, weights, entities)
    }

    pub fn tetrahedron(order: usize) -> Result<Self> {
        if order < 1 || order > MAX_TET_ORDER {
            return Err(SolverError::UnsupportedOrder {
                order,
                max: MAX_TET_ORDER,
                shape: "tetrahedron",
            });
        }
        let (nodes, weights, entities) = tet_nodes(order);
        Self::build(ElementShape::Tet, order, nodes, weights, entities)
    }

    fn build(
        shape: ElementShape,
        order: usize,
        nodes: Vec<[f64; 3]>,
        weights: Vec<f64>,
        entities: Vec<NodeEntity>,
    ) -> Result<Self> {
        let p = nodes.len();
        let dim = shape.dim();
        let mut vand = DMatrix::zeros(p, p);
        for (row, node) in nodes.iter().enumerate() {
            for g in 0..p {
                vand[(row, g)] = gen_value(shape, order, g, node);
            }
        }
        let coeff = vand.try_inverse().ok_or_else(|| SolverError::Geometry {
            element: 0,
            reason: format!(
                "singular generalized Vandermonde for {} order {order}",
                shape.label()
            ),
        })?;

        let mut dr = DMatrix::zeros(p, p);
        let mut ds = DMatrix::zeros(p, p);
        let mut dtm = if dim == 3 {
            Some(DMatrix::zeros(p, p))
        } else {
            None
        };
        for (row, node) in nodes.iter().enumerate() {
            for i in 0..p {
                let mut grad = [0.0; 3];
                for g in 0..p {
                    let gg = gen_grad(shape, order, g, node);
                    for k in 0..dim {
                        grad[k] += coeff[(g, i)] * gg[k];
                    }
                }
                dr[(row, i)] = grad[0];
                ds[(row, i)] = grad[1];
                if let Some(dt) = dtm.as_mut() {
                    dt[(row, i)] = grad[2];
                }
            }
        }

        Ok(Self {
            shape,
            order,
            nodes,
            weights,
            entities,
            coeff,
            dr,
            ds,
            dt: dtm,
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Basis values at an arbitrary reference point.
    pub fn interp(&self, xi: &[f64]) -> Vec<f64> {
        let p = self.num_nodes();
        let node = [xi[0], xi[1], if xi.len() > 2 { xi[2] } else { 0.0 }];
        let mut out = vec![0.0; p];
        for g in 0..p {
            let gv = gen_value(self.shape, self.order, g, &node);
            for i in 0..p {
                out[i] += self.coeff[(g, i)] * gv;
            }
        }
        out
    }

    /// Basis partial derivatives along reference axis `axis`.
    pub fn deriv(&self, xi: &[f64], axis: usize) -> Vec<f64> {
        let p = self.num_nodes();
        let node = [xi[0], xi[1], if xi.len() > 2 { xi[2] } else { 0.0 }];
        let mut out = vec![0.0; p];
        for g in 0..p {
            let gg = gen_grad(self.shape, self.order, g, &node);
            for i in 0..p {
                out[i] += self.coeff[(g, i)] * gg[axis];
            }
        }
        out
    }
}

/// Triangle node tables in topology order.
fn tri_nodes(order: usize) -> (Vec<[f64; 3]>, Vec<f64>, Vec<NodeEntity>) {
    const A: [f64; 2] = [-1.0, -1.0];
    const B: [f64; 2] = [1.0, -1.0];
    const C: [f64; 2] = [-1.0, 1.0];
    let lerp = |p: [f64; 2], q: [f64; 2], t: f64| {
        [p[0] + t * (q[0] - p[0]), p[1] + t * (q[1] - p[1]), 0.0]
    };
    let vert = |v: [f64; 2]| [v[0], v[1], 0.0];
    // barycentric (la, lb, lc) against vertices A, B, C
    let bary = |la: f64, lb: f64, lc: f64| {
        [
            la * A[0] + lb * B[0] + lc * C[0],
            la * A[1] + lb * B[1] + lc * C[1],
            0.0,
        ]
    };

    let mut nodes = vec![vert(A), vert(B), vert(C)];
    let mut entities = vec![
        NodeEntity::Vertex(0),
        NodeEntity::Vertex(1),
        NodeEntity::Vertex(2),
    ];
    // Local edges in mesh order: (0,1), (1,2), (2,0).
    let edges = [(A, B), (B, C), (C, A)];

    match order {
        1 => {
            let weights = vec![2.0 / 3.0; 3];
            (nodes, weights, entities)
        }
        2 => {
            for (e, (p, q)) in edges.iter().enumerate() {
                nodes.push(lerp(*p, *q, 0.5));
                entities.push(NodeEntity::Edge { edge: e, index: 0 });
            }
            nodes.push([-1.0 / 3.0, -1.0 / 3.0, 0.0]);
            entities.push(NodeEntity::Interior(0));
            let mut weights = vec![1.0 / 10.0; 3];
            weights.extend([4.0 / 15.0; 3]);
            weights.push(9.0 / 10.0);
            (nodes, weights, entities)
        }
        3 => {
            for (e, (p, q)) in edges.iter().enumerate() {
                nodes.push(lerp(*p, *q, TRI3_ALPHA));
                entities.push(NodeEntity::Edge { edge: e, index: 0 });
                nodes.push(lerp(*p, *q, 1.0 - TRI3_ALPHA));
                entities.push(NodeEntity::Edge { edge: e, index: 1 });
            }
            let b = TRI3_BETA;
            nodes.push(bary(1.0 - 2.0 * b, b, b));
            nodes.push(bary(b, 1.0 - 2.0 * b, b));
            nodes.push(bary(b, b, 1.0 - 2.0 * b));
            for i in 0..3 {
                entities.push(NodeEntity::Interior(i));
            }
            let mut weights = vec![TRI3_WV; 3];
            weights.extend([TRI3_WE; 6]);
            weights.extend([TRI3_WI; 3]);
            (nodes, weights, entities)
        }
        _ => unreachable!("order checked by SimplexBasis::triangle"),
    }
}

/// Triangle bubble b = la*lb*lc and its reference gradient.
fn tri_bubble(r: f64, s: f64) -> (f64, f64, f64) {
    let la = -(r + s) / 2.0;
    let lb = (1.0 + r) / 2.0;
    let lc = (1.0 + s) / 2.0;
    let b = la * lb * lc;
    let db_dr = -0.5 * lb * lc + la * 0.5 * lc;
    let db_ds = -0.5 * lb * lc + la * lb * 0.5;
    (b, db_dr, db_ds)
}

/// Reference-tet vertices in mesh-local order.
const TET_VERTS: [[f64; 3]; 4] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
];

/// Local faces in mesh order (face f opposite vertex f).
const TET_FACES: [[usize; 3]; 4] = [[1, 2, 3], [0, 2, 3], [0, 1, 3], [0, 1, 2]];

/// Local edges in mesh order.
const TET_EDGES: [[usize; 2]; 6] = [[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]];

/// Barycentric coordinates of a reference-tet point.
fn tet_bary(node: &[f64; 3]) -> [f64; 4] {
    let lb = (1.0 + node[0]) / 2.0;
    let lc = (1.0 + node[1]) / 2.0;
    let ld = (1.0 + node[2]) / 2.0;
    [1.0 - lb - lc - ld, lb, lc, ld]
}

/// Constant reference gradients of the tet barycentrics.
const TET_BARY_GRAD: [[f64; 3]; 4] = [
    [-0.5, -0.5, -0.5],
    [0.5, 0.0, 0.0],
    [0.0, 0.5, 0.0],
    [0.0, 0.0, 0.5],
];

/// Product of barycentric factors and its reference gradient.
fn bary_product(node: &[f64; 3], factors: &[usize]) -> (f64, [f64; 3]) {
    let lam = tet_bary(node);
    let mut value = 1.0;
    for &f in factors {
        value *= lam[f];
    }
    let mut grad = [0.0; 3];
    for (i, &fi) in factors.iter().enumerate() {
        let mut prod = 1.0;
        for (j, &fj) in factors.iter().enumerate() {
            if j != i {
                prod *= lam[fj];
            }
        }
        for k in 0..3 {
            grad[k] += prod * TET_BARY_GRAD[fi][k];
        }
    }
    (value, grad)
}

/// Tetrahedron node tables in topology order.
fn tet_nodes(order: usize) -> (Vec<[f64; 3]>, Vec<f64>, Vec<NodeEntity>) {
    let mut nodes: Vec<[f64; 3]> = TET_VERTS.to_vec();
    let mut entities: Vec<NodeEntity> = (0..4).map(NodeEntity::Vertex).collect();
    if order == 1 {
        return (nodes, vec![1.0 / 3.0; 4], entities);
    }

    for (e, [a, b]) in TET_EDGES.iter().enumerate() {
        let mut mid = [0.0; 3];
        for k in 0..3 {
            mid[k] = (TET_VERTS[*a][k] + TET_VERTS[*b][k]) / 2.0;
        }
        nodes.push(mid);
        entities.push(NodeEntity::Edge { edge: e, index: 0 });
    }
    for (f, cyc) in TET_FACES.iter().enumerate() {
        for lead in 0..3 {
            let mut lam = [0.0; 4];
            for (j, &vtx) in cyc.iter().enumerate() {
                lam[vtx] = if j == lead {
                    1.0 - 2.0 * TET2_ALPHA
                } else {
                    TET2_ALPHA
                };
            }
            let mut p = [0.0; 3];
            for i in 0..4 {
                for k in 0..3 {
                    p[k] += lam[i] * TET_VERTS[i][k];
                }
            }
            nodes.push(p);
            entities.push(NodeEntity::Face {
                face: f,
                iu: lead,
                iv: 0,
            });
        }
    }
    nodes.push([-0.5, -0.5, -0.5]);
    entities.push(NodeEntity::Interior(0));

    let mut weights = vec![TET2_WV; 4];
    weights.extend([TET2_WE; 6]);
    weights.extend([TET2_WF; 12]);
    weights.push(TET2_WC);
    (nodes, weights, entities)
}

// Monomial exponents for P1..P3 in 2D, graded order.
const TRI_MONO: [(i32, i32); 10] = [
    (0, 0),
    (1, 0),
    (0, 1),
    (2, 0),
    (1, 1),
    (0, 2),
    (3, 0),
    (2, 1),
    (1, 2),
    (0, 3),
];

// Monomial exponents for P2 in 3D, graded order.
const TET_MONO: [(i32, i32, i32); 10] = [
    (0, 0, 0),
    (1, 0, 0),
    (0, 1, 0),
    (0, 0, 1),
    (2, 0, 0),
    (1, 1, 0),
    (1, 0, 1),
    (0, 2, 0),
    (0, 1, 1),
    (0, 0, 2),
];

/// Value and reference gradient of generator `g` of the 23-dimensional
/// degree-2 tet space: P2 monomials, face-bubble x face-barycentric
/// enrichments, cell bubble.
fn tet2_gen(g: usize, node: &[f64; 3]) -> (f64, [f64; 3]) {
    if g < 10 {
        let (a, b, c) = TET_MONO[g];
        let (r, s, t) = (node[0], node[1], node[2]);
        let value = r.powi(a) * s.powi(b) * t.powi(c);
        let dr = if a > 0 {
            a as f64 * r.powi(a - 1) * s.powi(b) * t.powi(c)
        } else {
            0.0
        };
        let ds = if b > 0 {
            b as f64 * r.powi(a) * s.powi(b - 1) * t.powi(c)
        } else {
            0.0
        };
        let dt = if c > 0 {
            c as f64 * r.powi(a) * s.powi(b) * t.powi(c - 1)
        } else {
            0.0
        };
        return (value, [dr, ds, dt]);
    }
    if g < 22 {
        let cyc = TET_FACES[(g - 10) / 3];
        let lead = cyc[(g - 10) % 3];
        return bary_product(node, &[cyc[0], cyc[1], cyc[2], lead]);
    }
    bary_product(node, &[0, 1, 2, 3])
}

fn gen_value(shape: ElementShape, order: usize, g: usize, node: &[f64; 3]) -> f64 {
    let (r, s, t) = (node[0], node[1], node[2]);
    match shape {
        ElementShape::Tri => {
            let nm = match order {
                1 => 3,
                2 => 6,
                _ => 10,
            };
            if g < nm {
                let (a, b) = TRI_MONO[g];
                return r.powi(a) * s.powi(b);
            }
            let (bub, _, _) = tri_bubble(r, s);
            match (order, g - nm) {
                (2, 0) => bub,
                (3, 0) => bub * r,
                (3, 1) => bub * s,
                _ => unreachable!(),
            }
        }
        ElementShape::Tet if order == 1 => match g {
            0 => 1.0,
            1 => r,
            2 => s,
            3 => t,
            _ => unreachable!(),
        },
        ElementShape::Tet => tet2_gen(g, node).0,
        _ => unreachable!("simplex generators apply to tri/tet only"),
    }
}

fn gen_grad(shape: ElementShape, order: usize, g: usize, node: &[f64; 3]) -> [f64; 3] {
    let (r, s) = (node[0], node[1]);
    match shape {
        ElementShape::Tri => {
            let nm = match order {
                1 => 3,
                2 => 6,
                _ => 10,
            };
            if g < nm {
                let (a, b) = TRI_MONO[g];
                let dr = if a > 0 {
                    a as f64 * r.powi(a - 1) * s.powi(b)
                } else {
                    0.0
                };
                let ds = if b > 0 {
                    b as f64 * r.powi(a) * s.powi(b - 1)
                } else {
                    0.0
                };
                return [dr, ds, 0.0];
            }
            let (bub, db_dr, db_ds) = tri_bubble(r, s);
            match (order, g - nm) {
                (2, 0) => [db_dr, db_ds, 0.0],
                (3, 0) => [db_dr * r + bub, db_ds * r, 0.0],
                (3, 1) => [db_dr * s, db_ds * s + bub, 0.0],
                _ => unreachable!(),
            }
        }
        ElementShape::Tet if order == 1 => match g {
            0 => [0.0, 0.0, 0.0],
            1 => [1.0, 0.0, 0.0],
            2 => [0.0, 1.0, 0.0],
            3 => [0.0, 0.0, 1.0],
            _ => unreachable!(),
        },
        ElementShape::Tet => tet2_gen(g, node).1,
        _ => unreachable!("simplex generators apply to tri/tet only"),
    }
}
