//! Volumetric snapshot output.
//!
//! The solver hands the writer one global DoF vector per saved field per
//! saved step; the document layout is `[n_steps][n_global_dofs]` per field
//! plus the time vector, matching the external movie format.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;

/// Sink for movie frames.
pub trait SnapshotWriter: Send {
    fn write_frame(&mut self, step: usize, time: f64, field: &str, data: &[f64]) -> Result<()>;

    /// Flush everything to the backing store.
    fn finish(&mut self) -> Result<()>;
}

/// Discards all frames (snapshots disabled).
pub struct NullSnapshotWriter;

impl SnapshotWriter for NullSnapshotWriter {
    fn write_frame(&mut self, _step: usize, _time: f64, _field: &str, _data: &[f64]) -> Result<()> {
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Serialize)]
struct MovieDocument<'a> {
    times: &'a [f64],
    steps: &'a [usize],
    fields: &'a BTreeMap<String, Vec<Vec<f64>>>,
}

/// Accumulates frames and writes one JSON movie document on `finish`.
pub struct JsonSnapshotWriter {
    path: PathBuf,
    times: Vec<f64>,
    steps: Vec<usize>,
    fields: BTreeMap<String, Vec<Vec<f64>>>,
}

impl JsonSnapshotWriter {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            times: Vec::new(),
            steps: Vec::new(),
            fields: BTreeMap::new(),
        }
    }
}

impl SnapshotWriter for JsonSnapshotWriter {
    fn write_frame(&mut self, step: usize, time: f64, field: &str, data: &[f64]) -> Result<()> {
        if self.steps.last() != Some(&step) {
            self.steps.push(step);
            self.times.push(time);
        }
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(data.to_vec());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let file = File::create(&self.path)?;
        let doc = MovieDocument {
            times: &self.times,
            steps: &self.steps,
            fields: &self.fields,
        };
        serde_json::to_writer(BufWriter::new(file), &doc)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_accumulate_per_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movie.json");
        let mut w = JsonSnapshotWriter::new(&path);
        w.write_frame(0, 0.0, "u", &[1.0, 2.0]).unwrap();
        w.write_frame(10, 0.1, "u", &[3.0, 4.0]).unwrap();
        w.finish().unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["times"].as_array().unwrap().len(), 2);
        assert_eq!(doc["fields"]["u"][1][0], 3.0);
    }

    #[test]
    fn null_writer_accepts_everything() {
        let mut w = NullSnapshotWriter;
        w.write_frame(0, 0.0, "u", &[0.0]).unwrap();
        w.finish().unwrap();
    }
}
