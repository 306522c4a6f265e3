//! Explicit second-order Newmark time integration (gamma = 1/2, beta = 0).
//!
//! Each step advances the displacement with the previous acceleration,
//! recomputes the acceleration from the assembled stiffness action and
//! sources, and closes the velocity with the trapezoid of the two
//! accelerations. The initial acceleration is computed from the initial
//! state before the first step, which keeps the scheme an exact central
//! difference from rest. The step sequence
//! pull -> compute -> push -> assemble -> mass-solve -> update -> sample
//! is strict; receivers and snapshots observe the updated state.

use std::time::Instant;

use nalgebra::DVector;
use tracing::{info, warn};

use sem_io::SnapshotWriter;

use crate::config::SimulationConfig;
use crate::dof::InsertMode;
use crate::driver::Simulation;
use crate::error::{Result, SolverError};

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub steps: usize,
    pub final_time: f64,
    pub wall_seconds: f64,
}

/// Time-loop driver state.
pub struct NewmarkIntegrator {
    pub time_step: f64,
    pub duration: f64,
    pub blowup_sentinel: f64,
    pub movie_field: Option<String>,
    pub frame_every: usize,
}

impl NewmarkIntegrator {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            time_step: config.time_step,
            duration: config.duration,
            blowup_sentinel: config.blowup_sentinel,
            movie_field: config
                .save_movie
                .then(|| config.movie_field.clone()),
            frame_every: config.save_frame_every.max(1),
        }
    }

    /// Integrate from t = 0 until t >= duration.
    pub fn run(
        &mut self,
        sim: &mut Simulation,
        snapshot: &mut dyn SnapshotWriter,
    ) -> Result<RunSummary> {
        if let Some(field) = &self.movie_field {
            // fail before the loop rather than on the first frame
            sim.fields.get(field)?;
        }
        let nsteps = ((self.duration - 1e-12) / self.time_step).ceil().max(0.0) as usize;
        let start = Instant::now();
        let final_time = self.integrate(sim, snapshot, self.time_step, nsteps, 0.0)?;
        if let Err(e) = snapshot.finish() {
            warn!("snapshot finalization failed: {e}");
        }
        let wall_seconds = start.elapsed().as_secs_f64();
        info!(steps = nsteps, final_time, wall_seconds, "time loop finished");
        Ok(RunSummary {
            steps: nsteps,
            final_time,
            wall_seconds,
        })
    }

    /// Advance `nsteps` steps of size `dt` starting from time `t0`.
    /// Negative `dt` runs the reversible scheme backwards.
    pub fn integrate(
        &mut self,
        sim: &mut Simulation,
        snapshot: &mut dyn SnapshotWriter,
        dt: f64,
        nsteps: usize,
        t0: f64,
    ) -> Result<f64> {
        let triples = sim.physics.triples();

        // Initial acceleration from the starting state (history seed).
        compute_acceleration(sim, t0)?;
        for &[_, _, a, a_] in triples {
            let acc = sim.fields.get(a)?.global.clone();
            sim.fields.get_mut(a_)?.global.copy_from(&acc);
        }

        let mut t = t0;
        for step in 1..=nsteps {
            t = t0 + step as f64 * dt;

            // Predictor: u <- u + dt v + dt^2/2 a_ on the global vectors.
            for &[u, v, _, a_] in triples {
                let [fu, fv, fa_] = sim.fields.get_disjoint_mut([u, v, a_])?;
                for g in 0..fu.global.len() {
                    fu.global[g] += dt * fv.global[g] + 0.5 * dt * dt * fa_.global[g];
                }
            }

            // Stiffness, sources, assembly, Dirichlet, mass solve.
            compute_acceleration(sim, t)?;

            // Corrector: v <- v + dt/2 (a_ + a), then save the history.
            for &[_, v, a, a_] in triples {
                let [fv, fa, fa_] = sim.fields.get_disjoint_mut([v, a, a_])?;
                for g in 0..fv.global.len() {
                    fv.global[g] += 0.5 * dt * (fa.global[g] + fa_.global[g]);
                    fa_.global[g] = fa.global[g];
                }
            }

            self.check_blowup(sim, t)?;
            sample_receivers(sim, t)?;

            if let Some(field) = &self.movie_field {
                if step % self.frame_every == 0 {
                    let data = sim.fields.get(field)?.global.as_slice().to_vec();
                    if let Err(e) = snapshot.write_frame(step, t, field, &data) {
                        warn!(step, "snapshot write failed: {e}");
                    }
                }
            }
        }
        Ok(t)
    }

    fn check_blowup(&self, sim: &Simulation, t: f64) -> Result<()> {
        for &[u, _, _, _] in sim.physics.triples() {
            let field = sim.fields.get(u)?;
            let max = field.global.iter().fold(0.0f64, |m, &v| m.max(v.abs()));
            if max > self.blowup_sentinel {
                return Err(SolverError::NumericalBlowup {
                    field: u.to_string(),
                    value: max,
                    sentinel: self.blowup_sentinel,
                    time: t,
                });
            }
        }
        Ok(())
    }
}

/// One acceleration evaluation: a = M^-1 (f(t) - K u) with the Dirichlet
/// mask applied to the assembled residual.
pub(crate) fn compute_acceleration(sim: &mut Simulation, t: f64) -> Result<()> {
    let pull = sim.physics.pull_fields();
    let push = sim.physics.push_fields();
    let nc = pull.len();
    let n_local = sim.section.total_dofs;

    // 1. pull: global -> local (INSERT)
    for name in pull {
        let field = sim.fields.get_mut(name)?;
        sim.exchange.global_to_local(&field.global, &mut field.local);
    }
    let pull_locals: Vec<DVector<f64>> = pull
        .iter()
        .map(|name| Ok(sim.fields.get(name)?.local.clone()))
        .collect::<Result<_>>()?;

    // 2./3. per-element stiffness action, accumulated with ADD
    let mut push_locals: Vec<DVector<f64>> = (0..nc).map(|_| DVector::zeros(n_local)).collect();
    let mut pulled: Vec<Vec<f64>> = Vec::new();
    let mut out: Vec<Vec<f64>> = Vec::new();
    for (kernel, map) in sim.kernels.iter().zip(&sim.closures) {
        let p = kernel.element().num_nodes();
        pulled.clear();
        out.clear();
        for local in &pull_locals {
            let mut vals = vec![0.0; p];
            map.get(local, &mut vals);
            pulled.push(vals);
        }
        out.resize(nc, Vec::new());
        for o in out.iter_mut() {
            o.clear();
            o.resize(p, 0.0);
        }
        kernel.stiffness_action(&pulled, &mut out);
        for (c, o) in out.iter().enumerate() {
            for (node, &g) in map.dofs.iter().enumerate() {
                push_locals[c][g] -= o[node];
            }
        }
    }

    // source injection at the evaluation time
    for src in &sim.sources {
        let (Some(element), Some(force)) = (src.element, src.force.as_ref()) else {
            continue;
        };
        let s = src.time_function.eval(t);
        if s == 0.0 {
            continue;
        }
        let map = &sim.closures[element];
        for (c, &dir) in src.direction.iter().take(nc).enumerate() {
            for (node, &g) in map.dofs.iter().enumerate() {
                push_locals[c][g] += force[node] * s * dir;
            }
        }
    }

    // 4. local -> global (ADD), 5. Dirichlet mask, 6. mass solve
    let mi = sim.fields.get("mi")?.global.clone();
    for (c, name) in push.iter().enumerate() {
        let field = sim.fields.get_mut(name)?;
        field.local.copy_from(&push_locals[c]);
        sim.exchange.local_to_global_begin(&field.local, &field.global);
        sim.exchange
            .local_to_global_end(&field.local, &mut field.global, InsertMode::Add);
        for &g in &sim.pinned {
            field.global[g] = 0.0;
        }
        for g in 0..field.global.len() {
            field.global[g] *= mi[g];
        }
    }
    Ok(())
}

/// Interpolate the displacement fields at every receiver.
fn sample_receivers(sim: &mut Simulation, t: f64) -> Result<()> {
    if sim.receivers.is_empty() {
        return Ok(());
    }
    let pull = sim.physics.pull_fields();
    let mut globals: Vec<&DVector<f64>> = Vec::with_capacity(pull.len());
    for name in pull {
        globals.push(&sim.fields.get(name)?.global);
    }
    for rec in sim.receivers.iter_mut() {
        let Some(element) = rec.element else { continue };
        let map = &sim.closures[element];
        let p = map.dofs.len();
        let mut element_fields = Vec::with_capacity(pull.len());
        for global in &globals {
            let mut vals = vec![0.0; p];
            for (node, &g) in map.dofs.iter().enumerate() {
                vals[node] = global[g];
            }
            element_fields.push(vals);
        }
        rec.record(t, &element_fields);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use sem_io::NullSnapshotWriter;
    use sem_mesh::structured_quads;

    fn eigenmode_sim(nx: usize, dt: f64) -> (Simulation, SimulationConfig) {
        let mut mesh = structured_quads(nx, nx, [-1.0, 1.0], [-1.0, 1.0]).unwrap();
        mesh.set_uniform_field("VP", 1.0);
        let config = SimulationConfig {
            testing: true,
            polynomial_order: 3,
            time_step: dt,
            duration: 0.1,
            homogeneous_dirichlet: ["left", "right", "bottom", "top"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ..Default::default()
        };
        let mut sim = Simulation::new(mesh, &config).unwrap();
        sim.set_initial_condition("u", |x| {
            (std::f64::consts::PI * (x[0] + 1.0) / 2.0).sin()
                * (std::f64::consts::PI * (x[1] + 1.0) / 2.0).sin()
        })
        .unwrap();
        (sim, config)
    }

    #[test]
    fn forward_then_backward_returns_to_the_initial_state() {
        let (mut sim, config) = eigenmode_sim(2, 3e-3);
        let u0: Vec<f64> = sim.field_global("u").unwrap().to_vec();

        let mut integrator = NewmarkIntegrator::from_config(&config);
        let mut writer = NullSnapshotWriter;
        let t = integrator
            .integrate(&mut sim, &mut writer, 3e-3, 100, 0.0)
            .unwrap();
        integrator
            .integrate(&mut sim, &mut writer, -3e-3, 100, t)
            .unwrap();

        let u: Vec<f64> = sim.field_global("u").unwrap().to_vec();
        let err = u
            .iter()
            .zip(&u0)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f64, f64::max);
        assert!(err < 1e-10, "time reversal error {err}");
    }

    #[test]
    fn blowup_sentinel_aborts_the_run() {
        let (mut sim, mut config) = eigenmode_sim(2, 3e-3);
        config.blowup_sentinel = 0.5; // initial mode peaks at 1
        let mut integrator = NewmarkIntegrator::from_config(&config);
        let mut writer = NullSnapshotWriter;
        let result = integrator.run(&mut sim, &mut writer);
        assert!(matches!(
            result,
            Err(SolverError::NumericalBlowup { .. })
        ));
    }

    #[test]
    fn unknown_movie_field_fails_before_the_loop() {
        let (mut sim, mut config) = eigenmode_sim(2, 3e-3);
        config.save_movie = true;
        config.movie_field = "pressure".to_string();
        let mut integrator = NewmarkIntegrator::from_config(&config);
        let mut writer = NullSnapshotWriter;
        assert!(matches!(
            integrator.run(&mut sim, &mut writer),
            Err(SolverError::UnknownField(_))
        ));
    }
}
