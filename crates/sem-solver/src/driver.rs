//! Simulation assembly: mesh + configuration -> runnable state.
//!
//! Builds the reference tables, the per-cell kernels (in parallel), the
//! global section and closure maps, the field dictionary, the lumped
//! inverse mass, and localizes sources and receivers. The mesh owns
//! nothing back: kernels keep only their own element data.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use sem_mesh::Mesh;

use crate::basis::BasisCache;
use crate::config::SimulationConfig;
use crate::dof::{ClosureMap, DofExchange, InsertMode, Section, SerialExchange};
use crate::element::build_element_from;
use crate::error::{Result, SolverError};
use crate::fields::FieldDict;
use crate::physics::{
    DirichletKernel, Kernel, PhysicsKind, build_kernel, resolve_physics,
};
use crate::receiver::Receiver;
use crate::source::{Source, SourceTimeFunction};

/// Fully assembled simulation state, ready for the time integrator.
pub struct Simulation {
    pub(crate) mesh: Mesh,
    pub(crate) physics: PhysicsKind,
    pub(crate) kernels: Vec<Box<dyn Kernel>>,
    pub(crate) section: Section,
    pub(crate) closures: Vec<ClosureMap>,
    pub(crate) exchange: Box<dyn DofExchange>,
    pub(crate) fields: FieldDict,
    /// Global DoFs pinned by homogeneous Dirichlet conditions.
    pub(crate) pinned: Vec<usize>,
    /// Physical position of every global DoF.
    pub(crate) dof_positions: Vec<[f64; 3]>,
    pub(crate) sources: Vec<Source>,
    pub(crate) receivers: Vec<Receiver>,
    /// Smallest per-element CFL time step.
    pub cfl_limit: f64,
}

impl Simulation {
    pub fn new(mesh: Mesh, config: &SimulationConfig) -> Result<Self> {
        config.validate()?;
        mesh.validate()?;
        let physics = resolve_physics(&config.physics, mesh.dim)?;
        let order = config.polynomial_order;

        // Reference tables first (shared, read-only), then elements and
        // kernels in parallel.
        let mut cache = BasisCache::new();
        let mut bases = HashMap::new();
        for cell in &mesh.cells {
            if !bases.contains_key(&cell.shape) {
                bases.insert(cell.shape, cache.get(cell.shape, order)?);
            }
        }

        let dirichlet_faces = mesh
            .side_sets
            .faces_by_cell(&config.homogeneous_dirichlet)
            .map_err(SolverError::Config)?;

        let kernels: Vec<Box<dyn Kernel>> = (0..mesh.num_cells())
            .into_par_iter()
            .map(|c| {
                let cell = &mesh.cells[c];
                let coords = mesh.cell_coords(c);
                let element = build_element_from(&bases[&cell.shape], cell.shape, &coords, c)?;
                let mut kernel = build_kernel(&mesh, c, element, physics)?;
                if let Some(faces) = dirichlet_faces.get(&c) {
                    let mut wrapped = Box::new(DirichletKernel::new(kernel));
                    wrapped.set_boundary_conditions(faces);
                    kernel = wrapped;
                }
                Ok(kernel)
            })
            .collect::<Result<Vec<_>>>()?;

        let elements: Vec<_> = kernels.iter().map(|k| k.element()).collect();
        let (section, closures) = build_section_via(&mesh, &elements)?;
        info!(
            cells = mesh.num_cells(),
            dofs = section.total_dofs,
            physics = physics.label(),
            order,
            "simulation assembled"
        );

        // DoF positions and the global Dirichlet mask.
        let mut dof_positions = vec![[f64::NAN; 3]; section.total_dofs];
        let mut pinned = Vec::new();
        for (kernel, map) in kernels.iter().zip(&closures) {
            let coords = kernel.element().node_coords();
            for (p, &g) in map.dofs.iter().enumerate() {
                dof_positions[g] = coords[p];
            }
            for &node in kernel.pinned_nodes() {
                pinned.push(map.dofs[node]);
            }
        }
        pinned.sort_unstable();
        pinned.dedup();

        // Field dictionary: one scalar field per name, local and global.
        let mut fields = FieldDict::new();
        for name in physics.all_fields() {
            fields.create(name, section.total_dofs, section.total_dofs);
        }

        let cfl_limit = kernels
            .iter()
            .map(|k| k.cfl_time_step())
            .fold(f64::INFINITY, f64::min);
        if config.time_step > cfl_limit {
            if config.strict_cfl {
                return Err(SolverError::CflViolation {
                    dt: config.time_step,
                    limit: cfl_limit,
                });
            }
            warn!(
                dt = config.time_step,
                limit = cfl_limit,
                "time step exceeds the CFL estimate"
            );
        }

        let mut sim = Self {
            mesh,
            physics,
            kernels,
            section,
            closures,
            exchange: Box::new(SerialExchange),
            fields,
            pinned,
            dof_positions,
            sources: Vec::new(),
            receivers: Vec::new(),
            cfl_limit,
        };

        sim.assemble_mass()?;

        let sources = collect_sources(config, physics)?;
        let receivers: Vec<Receiver> = config
            .receivers
            .iter()
            .map(|r| Receiver::new(&r.name, r.location))
            .collect();
        sim.attach_sources(sources);
        sim.attach_receivers(receivers);

        Ok(sim)
    }

    /// Assemble the lumped mass and store its inverse in `mi`.
    fn assemble_mass(&mut self) -> Result<()> {
        let mi = self.fields.get_mut("mi")?;
        mi.local.fill(0.0);
        for (kernel, map) in self.kernels.iter().zip(&self.closures) {
            let mut m = vec![0.0; kernel.element().num_nodes()];
            kernel.mass(&mut m);
            map.set(&mut mi.local, &m, InsertMode::Add);
        }
        self.exchange
            .local_to_global_begin(&mi.local, &mi.global);
        let (local, global) = (&mi.local, &mut mi.global);
        self.exchange
            .local_to_global_end(local, global, InsertMode::Add);

        for (g, v) in mi.global.iter_mut().enumerate() {
            if !(*v > 0.0) {
                return Err(SolverError::Geometry {
                    element: 0,
                    reason: format!("non-positive lumped mass {v:.3e} at DoF {g}"),
                });
            }
            *v = 1.0 / *v;
        }
        debug!("lumped mass assembled and inverted");
        Ok(())
    }

    /// Two-phase localization: every candidate element is queried without
    /// taking ownership; the smallest ordinal wins and finalizes.
    pub fn attach_sources(&mut self, sources: Vec<Source>) {
        let nc = self.physics.num_components();
        for mut src in sources {
            let Some(owner) = self.find_owner(&src.location) else {
                warn_unlocalized("source", &src.name, &src.location);
                continue;
            };
            if !src.finalize(owner, self.kernels[owner].element()) {
                warn_unlocalized("source", &src.name, &src.location);
                continue;
            }
            if src.direction.len() != nc {
                warn!(
                    source = %src.name,
                    "direction has {} entries for {} components; source dropped",
                    src.direction.len(),
                    nc
                );
                continue;
            }
            debug!(source = %src.name, element = owner, "source localized");
            self.sources.push(src);
        }
    }

    pub fn attach_receivers(&mut self, receivers: Vec<Receiver>) {
        let nc = self.physics.num_components();
        for mut rec in receivers {
            let Some(owner) = self.find_owner(&rec.location) else {
                warn_unlocalized("receiver", &rec.name, &rec.location);
                continue;
            };
            if !rec.finalize(owner, self.kernels[owner].element(), nc) {
                warn_unlocalized("receiver", &rec.name, &rec.location);
                continue;
            }
            debug!(receiver = %rec.name, element = owner, "receiver localized");
            self.receivers.push(rec);
        }
    }

    /// All hull-owning candidates, resolved to the smallest ordinal.
    fn find_owner(&self, x: &[f64; 3]) -> Option<usize> {
        self.kernels
            .par_iter()
            .enumerate()
            .filter(|(_, k)| k.element().check_hull(x))
            .map(|(i, _)| i)
            .min()
    }

    /// Set one field's initial values from a function of position, on both
    /// the global and local vectors.
    pub fn set_initial_condition(
        &mut self,
        field: &str,
        f: impl Fn(&[f64; 3]) -> f64,
    ) -> Result<()> {
        let positions = &self.dof_positions;
        let fld = self.fields.get_mut(field)?;
        for (g, pos) in positions.iter().enumerate() {
            fld.global[g] = f(pos);
        }
        self.exchange.global_to_local(&fld.global, &mut fld.local);
        Ok(())
    }

    /// Overwrite one field from a value vector, on both the global and
    /// local sides.
    pub fn set_field_values(&mut self, field: &str, values: &[f64]) -> Result<()> {
        let fld = self.fields.get_mut(field)?;
        if values.len() != fld.global.len() {
            return Err(SolverError::Config(format!(
                "field '{field}' has {} DoFs, got {} values",
                fld.global.len(),
                values.len()
            )));
        }
        for (g, &v) in values.iter().enumerate() {
            fld.global[g] = v;
        }
        self.exchange.global_to_local(&fld.global, &mut fld.local);
        Ok(())
    }

    /// Evaluate the semidiscrete right-hand side a = M^-1 (f(t) - K u)
    /// for the current displacement state; the result lands in the push
    /// fields. Used by diagnostics and by spectral filtering of initial
    /// states.
    pub fn evaluate_acceleration(&mut self, t: f64) -> Result<()> {
        crate::newmark::compute_acceleration(self, t)
    }

    /// Read-only view of a global field (for tests and output).
    pub fn field_global(&self, name: &str) -> Result<&[f64]> {
        Ok(self.fields.get(name)?.global.as_slice())
    }

    pub fn dof_positions(&self) -> &[[f64; 3]] {
        &self.dof_positions
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn receivers(&self) -> &[Receiver] {
        &self.receivers
    }

    pub fn num_sources(&self) -> usize {
        self.sources.len()
    }

    pub fn physics(&self) -> PhysicsKind {
        self.physics
    }
}

/// A source or receiver outside the mesh is dropped, not fatal.
fn warn_unlocalized(kind: &str, name: &str, location: &[f64; 3]) {
    let err = SolverError::Localization {
        name: name.to_string(),
        x: location[0],
        y: location[1],
        z: location[2],
    };
    warn!("{err}; {kind} dropped");
}

/// Bridge: build_section over borrowed element handles.
fn build_section_via(
    mesh: &Mesh,
    elements: &[&dyn crate::element::ElementOps],
) -> Result<(Section, Vec<ClosureMap>)> {
    crate::dof::build_section_borrowed(mesh, elements)
}

/// Convert the configured inline specs and the catalog file into sources.
fn collect_sources(config: &SimulationConfig, physics: PhysicsKind) -> Result<Vec<Source>> {
    let mut out = Vec::new();
    for spec in &config.sources {
        let stf = match spec.source_type.as_str() {
            "ricker" => SourceTimeFunction::Ricker {
                amplitude: spec.ricker_amplitude,
                center_freq: spec.ricker_center_freq,
                time_delay: spec.ricker_time_delay,
            },
            _ => {
                return Err(SolverError::Config(format!(
                    "inline source '{}' must be of type 'ricker'; use --source-file-name for \
                     tabulated sources",
                    spec.name
                )));
            }
        };
        out.push(Source::new(
            &spec.name,
            spec.location,
            spec.direction.clone(),
            stf,
        ));
    }

    if let Some(path) = &config.source_file_name {
        let catalog = sem_io::read_source_catalog(path)?;
        for entry in catalog.entries {
            let mut location = [0.0; 3];
            for (k, &x) in entry.location.iter().take(3).enumerate() {
                location[k] = x;
            }
            let stf = match (entry.ricker, entry.table) {
                (Some((amplitude, center_freq, time_delay)), _) => SourceTimeFunction::Ricker {
                    amplitude,
                    center_freq,
                    time_delay,
                },
                (_, Some((samples, sample_interval))) => SourceTimeFunction::Table {
                    samples,
                    sample_interval,
                },
                _ => unreachable!("catalog reader guarantees one variant"),
            };
            out.push(Source::new(&entry.id, location, entry.direction, stf));
        }
    }

    let nc = physics.num_components();
    for s in &out {
        if s.direction.len() != nc {
            warn!(
                source = %s.name,
                "direction length {} differs from {} field components",
                s.direction.len(),
                nc
            );
        }
    }
    Ok(out)
}
