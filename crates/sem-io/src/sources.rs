//! Source catalog reader.
//!
//! The catalog document mirrors the external catalog layout: a root
//! `type` attribute (`"ricker"` or `"file"`), then one entry per source
//! keyed by its id, with `location`, `num-components` and the
//! type-specific attributes (`ricker-amplitude`, `ricker-center-freq`,
//! `ricker-time-delay`, `ricker-direction` for Ricker sources; `samples`
//! and `sample-interval` for tabulated ones). Any other `type` value is
//! rejected.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::error::{IoError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Ricker,
    File,
}

/// One source entry, already validated.
#[derive(Debug, Clone)]
pub struct SourceEntry {
    pub id: String,
    pub location: Vec<f64>,
    pub num_components: usize,
    pub direction: Vec<f64>,
    /// (amplitude, center frequency, time delay) for Ricker sources.
    pub ricker: Option<(f64, f64, f64)>,
    /// (samples, sample interval) for tabulated sources.
    pub table: Option<(Vec<f64>, f64)>,
}

/// Parsed catalog: kind plus entries in id order.
#[derive(Debug, Clone)]
pub struct SourceCatalog {
    pub kind: SourceKind,
    pub entries: Vec<SourceEntry>,
}

#[derive(Deserialize)]
struct RawCatalog {
    #[serde(rename = "type")]
    kind: String,
    sources: BTreeMap<String, RawEntry>,
}

#[derive(Deserialize)]
struct RawEntry {
    location: Vec<f64>,
    #[serde(rename = "num-components", default = "one")]
    num_components: usize,
    #[serde(rename = "ricker-amplitude")]
    ricker_amplitude: Option<f64>,
    #[serde(rename = "ricker-center-freq")]
    ricker_center_freq: Option<f64>,
    #[serde(rename = "ricker-time-delay")]
    ricker_time_delay: Option<f64>,
    #[serde(rename = "ricker-direction")]
    ricker_direction: Option<Vec<f64>>,
    samples: Option<Vec<f64>>,
    #[serde(rename = "sample-interval")]
    sample_interval: Option<f64>,
    direction: Option<Vec<f64>>,
}

fn one() -> usize {
    1
}

/// Read and validate a source catalog.
pub fn read_source_catalog(path: &Path) -> Result<SourceCatalog> {
    if !path.exists() {
        return Err(IoError::FileNotFound(path.display().to_string()));
    }
    let file = File::open(path)?;
    let raw: RawCatalog =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| IoError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    let kind = match raw.kind.as_str() {
        "ricker" => SourceKind::Ricker,
        "file" => SourceKind::File,
        other => {
            return Err(IoError::InvalidCatalog(format!(
                "source type must be 'ricker' or 'file', got '{other}'"
            )));
        }
    };

    let mut entries = Vec::with_capacity(raw.sources.len());
    for (id, e) in raw.sources {
        if e.location.is_empty() || e.location.len() > 3 {
            return Err(IoError::InvalidCatalog(format!(
                "source '{id}': location must have 2 or 3 entries"
            )));
        }
        if e.num_components == 0 {
            return Err(IoError::InvalidCatalog(format!(
                "source '{id}': num-components must be at least 1"
            )));
        }
        let (ricker, table, direction) = match kind {
            SourceKind::Ricker => {
                let amp = e.ricker_amplitude.ok_or_else(|| {
                    IoError::InvalidCatalog(format!("source '{id}': missing ricker-amplitude"))
                })?;
                let freq = e.ricker_center_freq.ok_or_else(|| {
                    IoError::InvalidCatalog(format!("source '{id}': missing ricker-center-freq"))
                })?;
                let delay = e.ricker_time_delay.ok_or_else(|| {
                    IoError::InvalidCatalog(format!("source '{id}': missing ricker-time-delay"))
                })?;
                // direction required only for multi-component sources
                let direction = match e.ricker_direction {
                    Some(d) => d,
                    None if e.num_components == 1 => vec![1.0],
                    None => {
                        return Err(IoError::InvalidCatalog(format!(
                            "source '{id}': ricker-direction required for {} components",
                            e.num_components
                        )));
                    }
                };
                (Some((amp, freq, delay)), None, direction)
            }
            SourceKind::File => {
                let samples = e.samples.ok_or_else(|| {
                    IoError::InvalidCatalog(format!("source '{id}': missing samples"))
                })?;
                let interval = e.sample_interval.ok_or_else(|| {
                    IoError::InvalidCatalog(format!("source '{id}': missing sample-interval"))
                })?;
                if interval <= 0.0 {
                    return Err(IoError::InvalidCatalog(format!(
                        "source '{id}': sample-interval must be positive"
                    )));
                }
                let direction = e.direction.unwrap_or_else(|| vec![1.0]);
                (None, Some((samples, interval)), direction)
            }
        };
        if direction.len() != e.num_components {
            return Err(IoError::InvalidCatalog(format!(
                "source '{id}': direction has {} entries for {} components",
                direction.len(),
                e.num_components
            )));
        }
        entries.push(SourceEntry {
            id,
            location: e.location,
            num_components: e.num_components,
            direction,
            ricker,
            table,
        });
    }

    Ok(SourceCatalog { kind, entries })
}
