//! Global DoF layout and element-to-global closure maps.
//!
//! The section assigns contiguous DoF blocks to mesh entities: one per
//! vertex, N-1 per edge, (N-1)^2 per quad face, and the cell-interior
//! block. Shared entities are discovered by their sorted global vertex
//! keys. Edge DoFs are stored from the smaller global vertex id to the
//! larger; quad-face DoFs in the frame of the face's canonical cycle
//! (started at the smallest vertex id, heading toward its smaller
//! neighbour); triangular-face DoFs by the rank of the corner vertex they
//! are tied to. Each element's closure map composes its own traversal
//! with the entity orientations, so neighbouring elements agree on shared
//! DoFs.
//!
//! The distributed-mesh service behind this layer is reduced to the
//! [`DofExchange`] seam; the serial provider ships here, a parallel one
//! would post neighbour exchanges in `begin` and drain them in `end`.

use std::collections::HashMap;

use nalgebra::DVector;
use sem_mesh::Mesh;

use crate::basis::NodeEntity;
use crate::element::ElementOps;
use crate::error::{Result, SolverError};

/// Scatter mode for local/global transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    Add,
    Insert,
}

/// Global scalar DoF layout.
#[derive(Debug)]
pub struct Section {
    pub total_dofs: usize,
    pub num_vertices: usize,
    pub num_edges: usize,
    pub num_faces: usize,
}

/// Tensor-order node -> local vector index for one element.
#[derive(Debug, Clone)]
pub struct ClosureMap {
    pub dofs: Vec<usize>,
}

impl ClosureMap {
    /// Extract element DoFs in tensor order.
    pub fn get(&self, local: &DVector<f64>, out: &mut [f64]) {
        for (p, &g) in self.dofs.iter().enumerate() {
            out[p] = local[g];
        }
    }

    /// Scatter element values into the local vector.
    pub fn set(&self, local: &mut DVector<f64>, values: &[f64], mode: InsertMode) {
        match mode {
            InsertMode::Add => {
                for (p, &g) in self.dofs.iter().enumerate() {
                    local[g] += values[p];
                }
            }
            InsertMode::Insert => {
                for (p, &g) in self.dofs.iter().enumerate() {
                    local[g] = values[p];
                }
            }
        }
    }
}

/// Build the scalar section and one closure map per element.
pub fn build_section(
    mesh: &Mesh,
    elements: &[Box<dyn ElementOps>],
) -> Result<(Section, Vec<ClosureMap>)> {
    let borrowed: Vec<&dyn ElementOps> = elements.iter().map(|e| e.as_ref()).collect();
    build_section_borrowed(mesh, &borrowed)
}

/// As [`build_section`], over borrowed element handles.
pub fn build_section_borrowed(
    mesh: &Mesh,
    elements: &[&dyn ElementOps],
) -> Result<(Section, Vec<ClosureMap>)> {
    let mut offset = mesh.num_vertices(); // one DoF per vertex, id order
    let mut edge_map: HashMap<(usize, usize), (usize, usize)> = HashMap::new();
    let mut face_map: HashMap<Vec<usize>, (usize, Vec<usize>)> = HashMap::new();
    let mut maps = Vec::with_capacity(elements.len());

    for (cell_id, element) in elements.iter().enumerate() {
        let cell = &mesh.cells[cell_id];
        let shape = element.shape();
        let entities = element.node_entities();
        let order = element.order();

        let per_edge = entities
            .iter()
            .filter(|e| matches!(e, NodeEntity::Edge { edge: 0, .. }))
            .count();
        let per_face = entities
            .iter()
            .filter(|e| matches!(e, NodeEntity::Face { face: 0, .. }))
            .count();
        let interior = entities
            .iter()
            .filter(|e| matches!(e, NodeEntity::Interior(_)))
            .count();

        let cell_offset = offset;
        offset += interior;

        let mut dofs = vec![0usize; entities.len()];
        for (tensor_idx, entity) in entities.iter().enumerate() {
            dofs[tensor_idx] = match *entity {
                NodeEntity::Vertex(v) => cell.vertices[v],
                NodeEntity::Edge { edge, index } => {
                    let [a, b] = shape.edges()[edge];
                    let (ga, gb) = (cell.vertices[a], cell.vertices[b]);
                    let key = (ga.min(gb), ga.max(gb));
                    let (eoff, ndof) = *edge_map.entry(key).or_insert_with(|| {
                        let e = (offset, per_edge);
                        offset += per_edge;
                        e
                    });
                    if ndof != per_edge {
                        return Err(SolverError::Config(format!(
                            "non-conforming edge DoF counts at cell {cell_id} ({ndof} vs {per_edge})"
                        )));
                    }
                    let slot = if ga < gb { index } else { per_edge - 1 - index };
                    eoff + slot
                }
                NodeEntity::Face { face, iu, iv } => {
                    let cycle: Vec<usize> = shape.faces()[face]
                        .iter()
                        .map(|&v| cell.vertices[v])
                        .collect();
                    let mut key = cycle.clone();
                    key.sort_unstable();
                    if cycle.len() == 3 {
                        // Triangular face: the DoF is tied to one corner
                        // (the odd barycentric coordinate); its canonical
                        // slot is the rank of that corner's global id.
                        let gid = cycle[iu];
                        let slot = key
                            .iter()
                            .position(|&v| v == gid)
                            .expect("face corner appears in its own cycle");
                        let foff = face_map
                            .entry(key)
                            .or_insert_with(|| {
                                let f = (offset, Vec::new());
                                offset += per_face;
                                f
                            })
                            .0;
                        foff + slot
                    } else {
                        let (foff, canon) = face_map.entry(key).or_insert_with(|| {
                            let f = (offset, canonical_cycle(&cycle));
                            offset += per_face;
                            f
                        });
                        let (ia, ib) = face_grid_transform(&cycle, canon, order, iu, iv);
                        *foff + ia + (order - 1) * ib
                    }
                }
                NodeEntity::Interior(idx) => cell_offset + idx,
            };
        }
        maps.push(ClosureMap { dofs });
    }

    Ok((
        Section {
            total_dofs: offset,
            num_vertices: mesh.num_vertices(),
            num_edges: edge_map.len(),
            num_faces: face_map.len(),
        },
        maps,
    ))
}

/// Canonical traversal of a quad-face vertex cycle: start at the smallest
/// global id, head toward the smaller of its two neighbours.
fn canonical_cycle(cycle: &[usize]) -> Vec<usize> {
    let m = cycle
        .iter()
        .enumerate()
        .min_by_key(|&(_, &v)| v)
        .map(|(i, _)| i)
        .expect("face cycle is non-empty");
    let next = cycle[(m + 1) % 4];
    let prev = cycle[(m + 3) % 4];
    if next <= prev {
        (0..4).map(|i| cycle[(m + i) % 4]).collect()
    } else {
        (0..4).map(|i| cycle[(m + 4 - i) % 4]).collect()
    }
}

/// Face-corner grid positions: u runs cycle[0] -> cycle[1], v runs
/// cycle[0] -> cycle[3].
const FACE_CORNER: [(f64, f64); 4] = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];

/// Map an interior face-grid position from a local cycle's frame to the
/// canonical cycle's frame. One of the 8 square symmetries, picked by
/// matching vertex ids.
fn face_grid_transform(
    local: &[usize],
    canon: &[usize],
    order: usize,
    iu: usize,
    iv: usize,
) -> (usize, usize) {
    let n = order as f64;
    let r = local
        .iter()
        .position(|&v| v == canon[0])
        .expect("canonical cycle shares vertices with the local cycle");
    let step: usize = if local[(r + 1) % 4] == canon[1] {
        1
    } else {
        debug_assert_eq!(local[(r + 3) % 4], canon[1]);
        3 // -1 mod 4
    };
    let pr = FACE_CORNER[r];
    let p1 = FACE_CORNER[(r + step) % 4];
    let p3 = FACE_CORNER[(r + 4 - step) % 4];
    let e1 = (p1.0 - pr.0, p1.1 - pr.1);
    let e2 = (p3.0 - pr.0, p3.1 - pr.1);
    // local fractional coordinates of the interior node
    let x = ((iu as f64 + 1.0) / n - pr.0, (iv as f64 + 1.0) / n - pr.1);
    let det = e1.0 * e2.1 - e1.1 * e2.0;
    let a = (x.0 * e2.1 - x.1 * e2.0) / det;
    let b = (e1.0 * x.1 - e1.1 * x.0) / det;
    let ia = (a * n - 1.0).round() as isize;
    let ib = (b * n - 1.0).round() as isize;
    debug_assert!(ia >= 0 && (ia as usize) < order - 1);
    debug_assert!(ib >= 0 && (ib as usize) < order - 1);
    (ia as usize, ib as usize)
}

/// Transfer seam between the per-process local vector (owned + ghost) and
/// the global vector (owned only). `begin` posts the neighbour exchange,
/// `end` drains it; the serial provider completes everything in `end`.
pub trait DofExchange: Send + Sync {
    fn local_to_global_begin(&self, _local: &DVector<f64>, _global: &DVector<f64>) {}

    fn local_to_global_end(
        &self,
        local: &DVector<f64>,
        global: &mut DVector<f64>,
        mode: InsertMode,
    );

    fn global_to_local(&self, global: &DVector<f64>, local: &mut DVector<f64>);
}

/// Single-process provider: local and global layouts coincide and there
/// are no ghosts, so transfers are copies.
pub struct SerialExchange;

impl DofExchange for SerialExchange {
    fn local_to_global_end(
        &self,
        local: &DVector<f64>,
        global: &mut DVector<f64>,
        mode: InsertMode,
    ) {
        match mode {
            InsertMode::Add | InsertMode::Insert => global.copy_from(local),
        }
    }

    fn global_to_local(&self, global: &DVector<f64>, local: &mut DVector<f64>) {
        local.copy_from(global);
    }
}
