//! Named simulation fields.
//!
//! A field is a (local, global) pair of vectors over the same section; the
//! integrator owns the dictionary and threads it through every step; no
//! ambient state is involved.

use std::collections::BTreeMap;

use nalgebra::DVector;

use crate::error::{Result, SolverError};

/// One named field: paired local (owned + ghost) and global (owned)
/// vectors. The serial provider gives both the same length.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub local: DVector<f64>,
    pub global: DVector<f64>,
}

impl Field {
    pub fn zeros(name: &str, local_len: usize, global_len: usize) -> Self {
        Self {
            name: name.to_string(),
            local: DVector::zeros(local_len),
            global: DVector::zeros(global_len),
        }
    }
}

/// Owned map name -> field.
#[derive(Debug, Default)]
pub struct FieldDict {
    fields: BTreeMap<String, Field>,
}

impl FieldDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a zero-initialized field, replacing any existing one.
    pub fn create(&mut self, name: &str, local_len: usize, global_len: usize) {
        self.fields
            .insert(name.to_string(), Field::zeros(name, local_len, global_len));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&Field> {
        self.fields
            .get(name)
            .ok_or_else(|| SolverError::UnknownField(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Field> {
        self.fields
            .get_mut(name)
            .ok_or_else(|| SolverError::UnknownField(name.to_string()))
    }

    /// Mutable access to several distinct fields at once.
    pub fn get_disjoint_mut<const K: usize>(
        &mut self,
        names: [&str; K],
    ) -> Result<[&mut Field; K]> {
        for i in 0..K {
            for j in (i + 1)..K {
                assert_ne!(names[i], names[j], "field names must be distinct");
            }
            if !self.fields.contains_key(names[i]) {
                return Err(SolverError::UnknownField(names[i].to_string()));
            }
        }
        let mut out: [Option<&mut Field>; K] = [const { None }; K];
        for (name, field) in self.fields.iter_mut() {
            if let Some(slot) = names.iter().position(|n| *n == name.as_str()) {
                out[slot] = Some(field);
            }
        }
        Ok(out.map(|f| f.expect("presence checked above")))
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
