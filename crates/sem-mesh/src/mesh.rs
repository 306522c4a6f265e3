//! Core mesh data structures.
//!
//! A [`Mesh`] holds vertex coordinates, cell connectivity, named side sets
//! and per-vertex material parameter fields. Cells reference vertices by
//! index; local edge and face numbering for each [`ElementShape`] is fixed
//! by the tables in this module and shared with the solver's closure logic.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{MeshError, Result};
use crate::sets::SideSets;

/// Concrete cell shapes supported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementShape {
    /// 3-vertex triangle (2D)
    Tri,
    /// 4-vertex quadrilateral (2D)
    Quad,
    /// 4-vertex tetrahedron (3D)
    Tet,
    /// 8-vertex hexahedron (3D)
    Hex,
}

impl ElementShape {
    /// Ambient dimension of the shape.
    pub fn dim(&self) -> usize {
        match self {
            ElementShape::Tri | ElementShape::Quad => 2,
            ElementShape::Tet | ElementShape::Hex => 3,
        }
    }

    /// Number of corner vertices.
    pub fn num_vertices(&self) -> usize {
        match self {
            ElementShape::Tri => 3,
            ElementShape::Quad => 4,
            ElementShape::Tet => 4,
            ElementShape::Hex => 8,
        }
    }

    /// Local edges as ordered vertex pairs.
    ///
    /// Quad/hex edges run in the direction of the increasing reference
    /// coordinate they are parallel to; the solver's closure layer relies on
    /// this when reconciling shared-edge DoF ordering between neighbours.
    pub fn edges(&self) -> &'static [[usize; 2]] {
        match self {
            ElementShape::Tri => &[[0, 1], [1, 2], [2, 0]],
            ElementShape::Quad => &[[0, 1], [3, 2], [0, 3], [1, 2]],
            ElementShape::Tet => &[[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]],
            ElementShape::Hex => &[
                // parallel to r
                [0, 1],
                [3, 2],
                [4, 5],
                [7, 6],
                // parallel to s
                [0, 3],
                [1, 2],
                [4, 7],
                [5, 6],
                // parallel to t
                [0, 4],
                [1, 5],
                [2, 6],
                [3, 7],
            ],
        }
    }

    /// Local faces as vertex index lists.
    ///
    /// 2D shapes reuse their edges as "faces" so side sets have a uniform
    /// (cell, face) addressing across dimensions. Hex face order is
    /// bottom, top, front, back, left, right (t-, t+, s-, s+, r-, r+);
    /// the structured builders name their side sets accordingly.
    pub fn faces(&self) -> &'static [&'static [usize]] {
        match self {
            ElementShape::Tri => &[&[0, 1], &[1, 2], &[2, 0]],
            ElementShape::Quad => &[&[0, 1], &[3, 2], &[0, 3], &[1, 2]],
            ElementShape::Tet => &[&[1, 2, 3], &[0, 2, 3], &[0, 1, 3], &[0, 1, 2]],
            ElementShape::Hex => &[
                &[0, 1, 2, 3],
                &[4, 5, 6, 7],
                &[0, 1, 5, 4],
                &[3, 2, 6, 7],
                &[0, 3, 7, 4],
                &[1, 2, 6, 5],
            ],
        }
    }

    /// Number of faces (edges in 2D).
    pub fn num_faces(&self) -> usize {
        self.faces().len()
    }

    /// Short label used in log output and errors.
    pub fn label(&self) -> &'static str {
        match self {
            ElementShape::Tri => "tri",
            ElementShape::Quad => "quad",
            ElementShape::Tet => "tet",
            ElementShape::Hex => "hex",
        }
    }
}

/// A single cell: shape tag plus vertex connectivity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub shape: ElementShape,
    /// Vertex indices into `Mesh::coords`, in the shape's local order.
    pub vertices: Vec<usize>,
}

impl Cell {
    pub fn new(shape: ElementShape, vertices: Vec<usize>) -> Self {
        Self { shape, vertices }
    }
}

/// Complete unstructured mesh with material fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mesh {
    /// Ambient dimension (2 or 3).
    pub dim: usize,
    /// Vertex coordinates; the third component is unused in 2D.
    pub coords: Vec<[f64; 3]>,
    /// Cells in ordinal order. The ordinal is the cell's identifier.
    pub cells: Vec<Cell>,
    /// Named boundary side sets.
    pub side_sets: SideSets,
    /// Per-vertex material parameter fields keyed by name (VP, RHO, ...).
    pub vertex_fields: HashMap<String, Vec<f64>>,
}

impl Mesh {
    /// Create an empty mesh of the given dimension.
    pub fn new(dim: usize) -> Result<Self> {
        if dim != 2 && dim != 3 {
            return Err(MeshError::BadDimension(dim));
        }
        Ok(Self {
            dim,
            coords: Vec::new(),
            cells: Vec::new(),
            side_sets: SideSets::new(),
            vertex_fields: HashMap::new(),
        })
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.coords.len()
    }

    /// Number of cells.
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Corner coordinates of one cell, row per vertex.
    pub fn cell_coords(&self, cell: usize) -> Vec<[f64; 3]> {
        self.cells[cell]
            .vertices
            .iter()
            .map(|&v| self.coords[v])
            .collect()
    }

    /// Centroid of one cell.
    pub fn cell_centroid(&self, cell: usize) -> [f64; 3] {
        let verts = &self.cells[cell].vertices;
        let mut c = [0.0; 3];
        for &v in verts {
            for k in 0..3 {
                c[k] += self.coords[v][k];
            }
        }
        let n = verts.len() as f64;
        [c[0] / n, c[1] / n, c[2] / n]
    }

    /// Attach a per-vertex field, replacing any previous field of that name.
    pub fn set_vertex_field(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if values.len() != self.coords.len() {
            return Err(MeshError::FieldLength {
                name: name.to_string(),
                actual: values.len(),
                expected: self.coords.len(),
            });
        }
        self.vertex_fields.insert(name.to_string(), values);
        Ok(())
    }

    /// Attach a spatially constant field.
    pub fn set_uniform_field(&mut self, name: &str, value: f64) {
        self.vertex_fields
            .insert(name.to_string(), vec![value; self.coords.len()]);
    }

    /// Values of a named field at one cell's vertices.
    pub fn field_at_cell_vertices(&self, name: &str, cell: usize) -> Option<Vec<f64>> {
        let field = self.vertex_fields.get(name)?;
        Some(
            self.cells[cell]
                .vertices
                .iter()
                .map(|&v| field[v])
                .collect(),
        )
    }

    /// Validate connectivity: vertex counts per shape and index ranges.
    pub fn validate(&self) -> Result<()> {
        for (i, cell) in self.cells.iter().enumerate() {
            let expected = cell.shape.num_vertices();
            if cell.vertices.len() != expected {
                return Err(MeshError::BadConnectivity {
                    cell: i,
                    shape: cell.shape.label(),
                    actual: cell.vertices.len(),
                    expected,
                });
            }
            for &v in &cell.vertices {
                if v >= self.coords.len() {
                    return Err(MeshError::DanglingVertex { cell: i, vertex: v });
                }
            }
        }
        for (name, field) in &self.vertex_fields {
            if field.len() != self.coords.len() {
                return Err(MeshError::FieldLength {
                    name: name.clone(),
                    actual: field.len(),
                    expected: self.coords.len(),
                });
            }
        }
        Ok(())
    }

    /// Summary counts for the startup banner.
    pub fn statistics(&self) -> MeshStatistics {
        let mut shape_counts = HashMap::new();
        for cell in &self.cells {
            *shape_counts.entry(cell.shape).or_insert(0usize) += 1;
        }
        MeshStatistics {
            num_vertices: self.coords.len(),
            num_cells: self.cells.len(),
            num_side_sets: self.side_sets.len(),
            shape_counts,
        }
    }
}

/// Mesh summary for reporting.
#[derive(Debug, Clone)]
pub struct MeshStatistics {
    pub num_vertices: usize,
    pub num_cells: usize,
    pub num_side_sets: usize,
    pub shape_counts: HashMap<ElementShape, usize>,
}

impl MeshStatistics {
    /// Format as a human-readable block.
    pub fn format(&self) -> String {
        let mut lines = vec![
            format!("vertices: {}", self.num_vertices),
            format!("cells: {}", self.num_cells),
            format!("side sets: {}", self.num_side_sets),
        ];
        let mut shapes: Vec<_> = self.shape_counts.iter().collect();
        shapes.sort_by_key(|(shape, _)| shape.label());
        for (shape, count) in shapes {
            lines.push(format!("  {}: {}", shape.label(), count));
        }
        lines.join("\n")
    }
}
