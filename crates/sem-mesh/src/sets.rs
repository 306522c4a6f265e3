//! Named boundary side sets.
//!
//! A side set is a named collection of (cell, local face) pairs. The solver
//! looks side sets up by name when enforcing homogeneous Dirichlet
//! conditions; the face index refers to the cell shape's local face table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A named set of cell faces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideSet {
    /// Set name (e.g. "left", "top").
    pub name: String,
    /// (cell ordinal, local face index) pairs.
    pub sides: Vec<(usize, usize)>,
}

impl SideSet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            sides: Vec::new(),
        }
    }
}

/// Collection of all side sets in a mesh.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SideSets {
    sets: HashMap<String, SideSet>,
}

impl SideSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a side set.
    pub fn insert(&mut self, set: SideSet) {
        self.sets.insert(set.name.clone(), set);
    }

    /// Append one side to a named set, creating the set if needed.
    pub fn add_side(&mut self, name: &str, cell: usize, face: usize) {
        self.sets
            .entry(name.to_string())
            .or_insert_with(|| SideSet::new(name))
            .sides
            .push((cell, face));
    }

    /// Look a set up by name.
    pub fn get(&self, name: &str) -> Option<&SideSet> {
        self.sets.get(name)
    }

    /// All set names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Faces of the named sets grouped per cell: cell -> local face ids.
    ///
    /// Unknown names are reported back to the caller so a typo in
    /// `--homogeneous-dirichlet` fails loudly instead of silently freeing
    /// the boundary.
    pub fn faces_by_cell(
        &self,
        names: &[String],
    ) -> std::result::Result<HashMap<usize, Vec<usize>>, String> {
        let mut out: HashMap<usize, Vec<usize>> = HashMap::new();
        for name in names {
            let set = self
                .sets
                .get(name)
                .ok_or_else(|| format!("side set '{name}' not present in the mesh"))?;
            for &(cell, face) in &set.sides {
                out.entry(cell).or_default().push(face);
            }
        }
        for faces in out.values_mut() {
            faces.sort_unstable();
            faces.dedup();
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_lookup() {
        let mut sets = SideSets::new();
        sets.add_side("left", 0, 2);
        sets.add_side("left", 1, 2);
        sets.add_side("top", 3, 1);

        assert_eq!(sets.len(), 2);
        assert_eq!(sets.get("left").unwrap().sides.len(), 2);
        assert_eq!(sets.names(), vec!["left", "top"]);
        assert!(sets.get("bottom").is_none());
    }

    #[test]
    fn faces_by_cell_merges_and_dedups() {
        let mut sets = SideSets::new();
        sets.add_side("left", 0, 2);
        sets.add_side("bottom", 0, 0);
        sets.add_side("bottom", 0, 0);
        sets.add_side("bottom", 1, 0);

        let by_cell = sets
            .faces_by_cell(&["left".to_string(), "bottom".to_string()])
            .unwrap();
        assert_eq!(by_cell.get(&0), Some(&vec![0, 2]));
        assert_eq!(by_cell.get(&1), Some(&vec![0]));
    }

    #[test]
    fn unknown_set_name_is_an_error() {
        let sets = SideSets::new();
        assert!(sets.faces_by_cell(&["nope".to_string()]).is_err());
    }
}
