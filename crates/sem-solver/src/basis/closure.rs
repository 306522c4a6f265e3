//! Closure orderings: tensor order vs topology order.
//!
//! Tensor order numbers element nodes lexicographically, r fastest.
//! Topology order lists them entity by entity: vertices first, then edge
//! interiors (each edge walked along its ordered vertex pair), then face
//! interiors, then the cell interior. The global DoF layer stores data per
//! mesh entity, so both the closure permutation and the per-node entity
//! classification come from the same enumeration.

use sem_mesh::ElementShape;

use crate::basis::tensor::TensorBasis;

/// Which mesh entity a reference node sits on, with its position within
/// that entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeEntity {
    /// Local vertex id.
    Vertex(usize),
    /// Local edge id and index along the edge's ordered direction
    /// (0 .. N-2 for the N-1 interior nodes).
    Edge { edge: usize, index: usize },
    /// Local face id and position within the face. Quad faces carry an
    /// (iu, iv) grid position, u running cycle[0] -> cycle[1] and v
    /// running cycle[0] -> cycle[3]; triangular faces put the ordinal of
    /// the corner the node is tied to in `iu` and leave `iv` zero.
    Face { face: usize, iu: usize, iv: usize },
    /// Linear index into the cell-interior block.
    Interior(usize),
}

/// Classify every tensor-ordered node of a quad or hex of order `n`.
pub fn classify_tensor_nodes(basis: &TensorBasis, shape: ElementShape) -> Vec<NodeEntity> {
    match shape {
        ElementShape::Quad => classify_quad(basis.order),
        ElementShape::Hex => classify_hex(basis.order),
        _ => unreachable!("tensor classification applies to quad/hex only"),
    }
}

fn classify_quad(n: usize) -> Vec<NodeEntity> {
    let np = n + 1;
    let mut out = Vec::with_capacity(np * np);
    let mut interior = 0usize;
    for j in 0..np {
        for i in 0..np {
            out.push(classify_quad_node(n, i, j, &mut interior));
        }
    }
    out
}

fn classify_quad_node(n: usize, i: usize, j: usize, interior: &mut usize) -> NodeEntity {
    let lo = |x: usize| x == 0;
    let hi = |x: usize| x == n;
    match (lo(i), hi(i), lo(j), hi(j)) {
        (true, _, true, _) => NodeEntity::Vertex(0),
        (_, true, true, _) => NodeEntity::Vertex(1),
        (_, true, _, true) => NodeEntity::Vertex(2),
        (true, _, _, true) => NodeEntity::Vertex(3),
        // Quad edges: 0 bottom (0->1, +r), 1 top (3->2, +r),
        //             2 left (0->3, +s), 3 right (1->2, +s).
        (_, _, true, _) => NodeEntity::Edge { edge: 0, index: i - 1 },
        (_, _, _, true) => NodeEntity::Edge { edge: 1, index: i - 1 },
        (true, _, _, _) => NodeEntity::Edge { edge: 2, index: j - 1 },
        (_, true, _, _) => NodeEntity::Edge { edge: 3, index: j - 1 },
        _ => {
            let e = NodeEntity::Interior(*interior);
            *interior += 1;
            e
        }
    }
}

fn classify_hex(n: usize) -> Vec<NodeEntity> {
    let np = n + 1;
    let mut out = Vec::with_capacity(np * np * np);
    let mut interior = 0usize;
    for k in 0..np {
        for j in 0..np {
            for i in 0..np {
                out.push(classify_hex_node(n, i, j, k, &mut interior));
            }
        }
    }
    out
}

fn classify_hex_node(n: usize, i: usize, j: usize, k: usize, interior: &mut usize) -> NodeEntity {
    let b = |x: usize| x == 0 || x == n; // on a boundary plane of the cube
    let onb = [b(i), b(j), b(k)];
    let count = onb.iter().filter(|&&x| x).count();

    match count {
        3 => {
            // Hex vertex numbering: bottom 0-3 counter-clockwise, top 4-7.
            let v = match (i == n, j == n, k == n) {
                (false, false, false) => 0,
                (true, false, false) => 1,
                (true, true, false) => 2,
                (false, true, false) => 3,
                (false, false, true) => 4,
                (true, false, true) => 5,
                (true, true, true) => 6,
                (false, true, true) => 7,
            };
            NodeEntity::Vertex(v)
        }
        2 => {
            // Edge order matches ElementShape::Hex.edges(): four r-parallel,
            // four s-parallel, four t-parallel edges.
            let (edge, index) = if !onb[0] {
                let e = match (j == n, k == n) {
                    (false, false) => 0,
                    (true, false) => 1,
                    (false, true) => 2,
                    (true, true) => 3,
                };
                (e, i - 1)
            } else if !onb[1] {
                let e = match (i == n, k == n) {
                    (false, false) => 4,
                    (true, false) => 5,
                    (false, true) => 6,
                    (true, true) => 7,
                };
                (e, j - 1)
            } else {
                let e = match (i == n, j == n) {
                    (false, false) => 8,
                    (true, false) => 9,
                    (true, true) => 10,
                    (false, true) => 11,
                };
                (e, k - 1)
            };
            NodeEntity::Edge { edge, index }
        }
        1 => {
            // Face order matches ElementShape::Hex.faces():
            // 0 bottom (t-), 1 top (t+), 2 front (s-), 3 back (s+),
            // 4 left (r-), 5 right (r+). u is the lower reference axis
            // spanning the face, v the higher; both walked low to high.
            let (face, iu, iv) = if onb[2] {
                (if k == n { 1 } else { 0 }, i - 1, j - 1)
            } else if onb[1] {
                (if j == n { 3 } else { 2 }, i - 1, k - 1)
            } else {
                (if i == n { 5 } else { 4 }, j - 1, k - 1)
            };
            NodeEntity::Face { face, iu, iv }
        }
        _ => {
            let e = NodeEntity::Interior(*interior);
            *interior += 1;
            e
        }
    }
}

/// The closure permutation sigma: `f_tensor[sigma[i]]` is the i-th DoF in
/// topology order.
pub fn closure_permutation(basis: &TensorBasis, shape: ElementShape) -> Vec<usize> {
    let classes = classify_tensor_nodes(basis, shape);
    let n = basis.order;
    let num_nodes = classes.len();

    // Rank each entity class in topology order, then sort tensor indices by
    // (rank, position within entity).
    let edge_interior = n.saturating_sub(1);
    let face_interior = edge_interior * edge_interior;
    let num_vertices = shape.num_vertices();
    let num_edges = shape.edges().len();
    let num_faces_3d = if shape.dim() == 3 { shape.num_faces() } else { 0 };

    let key = |e: &NodeEntity| -> usize {
        match *e {
            NodeEntity::Vertex(v) => v,
            NodeEntity::Edge { edge, index } => num_vertices + edge * edge_interior + index,
            NodeEntity::Face { face, iu, iv } => {
                num_vertices
                    + num_edges * edge_interior
                    + face * face_interior
                    + iu
                    + edge_interior * iv
            }
            NodeEntity::Interior(idx) => {
                num_vertices
                    + num_edges * edge_interior
                    + num_faces_3d * face_interior
                    + idx
            }
        }
    };

    let mut sigma = vec![0usize; num_nodes];
    for (tensor_idx, class) in classes.iter().enumerate() {
        sigma[key(class)] = tensor_idx;
    }
    sigma
}
