//! Simulation configuration.
//!
//! Mirrors the command-line surface; the CLI crate maps its flags onto
//! [`SimulationConfig`] and calls [`SimulationConfig::validate`] before
//! building a simulation. `testing` suppresses the mandatory-flag checks
//! so unit tests can assemble partial configurations.

use std::path::PathBuf;

use crate::basis::MAX_ORDER;
use crate::error::{Result, SolverError};

/// Inline source specification (the `--source-*` flag family).
#[derive(Debug, Clone)]
pub struct SourceSpec {
    pub name: String,
    pub source_type: String,
    pub location: [f64; 3],
    pub num_components: usize,
    pub direction: Vec<f64>,
    pub ricker_amplitude: f64,
    pub ricker_center_freq: f64,
    pub ricker_time_delay: f64,
}

/// Inline receiver specification.
#[derive(Debug, Clone)]
pub struct ReceiverSpec {
    pub name: String,
    pub location: [f64; 3],
}

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub mesh_file: Option<PathBuf>,
    pub model_file: Option<PathBuf>,
    pub polynomial_order: usize,
    pub dimension: usize,
    pub duration: f64,
    pub time_step: f64,
    /// "acoustic" or "elastic"; elastic resolves to 2D/3D by dimension.
    pub physics: String,
    /// Side-set names pinned to zero.
    pub homogeneous_dirichlet: Vec<String>,
    pub save_movie: bool,
    pub movie_file_name: Option<PathBuf>,
    pub movie_field: String,
    pub save_frame_every: usize,
    pub source_file_name: Option<PathBuf>,
    pub sources: Vec<SourceSpec>,
    pub receiver_file_name: Option<PathBuf>,
    pub receivers: Vec<ReceiverSpec>,
    pub strict_cfl: bool,
    pub blowup_sentinel: f64,
    pub testing: bool,
    pub verbose: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            mesh_file: None,
            model_file: None,
            polynomial_order: 3,
            dimension: 2,
            duration: 1.0,
            time_step: 1e-3,
            physics: "acoustic".to_string(),
            homogeneous_dirichlet: Vec::new(),
            save_movie: false,
            movie_file_name: None,
            movie_field: "u".to_string(),
            save_frame_every: 10,
            source_file_name: None,
            sources: Vec::new(),
            receiver_file_name: None,
            receivers: Vec::new(),
            strict_cfl: false,
            blowup_sentinel: 5.0,
            testing: false,
            verbose: false,
        }
    }
}

impl SimulationConfig {
    /// Check mandatory flags and cross-field constraints. With `testing`
    /// set, only the constraints that would corrupt a run are enforced.
    pub fn validate(&self) -> Result<()> {
        let cfg = |msg: String| Err(SolverError::Config(msg));

        if self.polynomial_order < 1 || self.polynomial_order > MAX_ORDER {
            return cfg(format!(
                "--polynomial-order must be in [1, {MAX_ORDER}], got {}",
                self.polynomial_order
            ));
        }
        if self.dimension != 2 && self.dimension != 3 {
            return cfg(format!("--dimension must be 2 or 3, got {}", self.dimension));
        }
        if !(self.time_step > 0.0) {
            return cfg(format!("--time-step must be positive, got {}", self.time_step));
        }
        if !(self.duration > 0.0) {
            return cfg(format!("--duration must be positive, got {}", self.duration));
        }
        if !(self.blowup_sentinel > 0.0) {
            return cfg("--blowup-sentinel must be positive".to_string());
        }
        if self.physics != "acoustic" && self.physics != "elastic" {
            return cfg(format!(
                "--physics must be 'acoustic' or 'elastic', got '{}'",
                self.physics
            ));
        }
        for s in &self.sources {
            if s.source_type != "ricker" && s.source_type != "file" {
                return cfg(format!(
                    "--source-type must be 'ricker' or 'file', got '{}'",
                    s.source_type
                ));
            }
            if s.direction.len() != s.num_components {
                return cfg(format!(
                    "source '{}': direction has {} entries for {} components",
                    s.name,
                    s.direction.len(),
                    s.num_components
                ));
            }
        }

        if self.testing {
            return Ok(());
        }

        if self.mesh_file.is_none() {
            return cfg("--mesh-file is required".to_string());
        }
        if self.save_movie {
            if self.movie_file_name.is_none() {
                return cfg("--movie-file-name is required with --save-movie".to_string());
            }
            if self.save_frame_every == 0 {
                return cfg("--save-frame-every must be at least 1".to_string());
            }
        }
        Ok(())
    }

    /// Number of time steps to reach the duration.
    pub fn num_steps(&self) -> usize {
        ((self.duration - 1e-12) / self.time_step).ceil().max(0.0) as usize
    }
}
