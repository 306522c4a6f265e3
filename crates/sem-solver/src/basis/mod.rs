//! Reference-element tables: GLL rules, tensor and simplex nodal bases,
//! and the closure permutations between tensor and topology orderings.
//!
//! Tables are pure functions of (order, shape). They are built once per
//! simulation and shared read-only between all elements of that kind.

pub mod closure;
pub mod cubature;
pub mod gll;
pub mod simplex;
pub mod tensor;

use std::collections::HashMap;
use std::sync::Arc;

use sem_mesh::ElementShape;

pub use closure::{NodeEntity, classify_tensor_nodes, closure_permutation};
pub use gll::{Gll1d, MAX_ORDER};
pub use simplex::{MAX_TET_ORDER, MAX_TRI_ORDER, SimplexBasis};
pub use tensor::TensorBasis;

use crate::error::Result;

/// Reference tables for one (shape, order) pair.
#[derive(Debug, Clone)]
pub enum ReferenceBasis {
    Tensor(Arc<TensorBasis>),
    Simplex(Arc<SimplexBasis>),
}

/// Cache of reference tables, keyed by (shape, order). Tables are built on
/// first request and shared as read-only handles afterwards.
#[derive(Debug, Default)]
pub struct BasisCache {
    entries: HashMap<(ElementShape, usize), ReferenceBasis>,
}

impl BasisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables for the given shape and order, building them if needed.
    pub fn get(&mut self, shape: ElementShape, order: usize) -> Result<ReferenceBasis> {
        if let Some(b) = self.entries.get(&(shape, order)) {
            return Ok(b.clone());
        }
        let built = match shape {
            ElementShape::Quad => {
                ReferenceBasis::Tensor(Arc::new(TensorBasis::new(order, 2)?))
            }
            ElementShape::Hex => ReferenceBasis::Tensor(Arc::new(TensorBasis::new(order, 3)?)),
            ElementShape::Tri => {
                ReferenceBasis::Simplex(Arc::new(SimplexBasis::triangle(order)?))
            }
            ElementShape::Tet => {
                ReferenceBasis::Simplex(Arc::new(SimplexBasis::tetrahedron(order)?))
            }
        };
        self.entries.insert((shape, order), built.clone());
        Ok(built)
    }
}
