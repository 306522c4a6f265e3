//! Shared helpers for the end-to-end scenario tests.

use sem_solver::Simulation;

/// Relax a displacement field onto the discrete ground mode by damped
/// power iteration on I - tau A, where A = M^-1 K with the Dirichlet mask
/// applied. High modes are damped hardest, so a smooth seed converges to
/// the operator's lowest eigenvector; the result is rescaled to match the
/// seed at the seed's peak DoF. This isolates the discretization's own
/// dispersion from the projection error of a pointwise-interpolated
/// analytic mode.
pub fn filter_ground_mode(sim: &mut Simulation, field: &str, iters: usize) -> Vec<f64> {
    let seed: Vec<f64> = sim.field_global(field).unwrap().to_vec();
    let n = seed.len();

    // spectral-radius estimate by power iteration from a deterministic
    // pseudo-random state
    let mut state = 0x2545f4914f6cdd1du64;
    let mut x: Vec<f64> = (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
        })
        .collect();
    let mut lam_max = 1.0;
    for _ in 0..100 {
        let ax = apply_operator(sim, field, &x);
        let num: f64 = x.iter().zip(&ax).map(|(a, b)| a * b).sum();
        let den: f64 = x.iter().map(|a| a * a).sum();
        lam_max = num / den;
        let nrm = ax.iter().fold(0.0f64, |m, &v| m.max(v.abs())).max(1e-300);
        x = ax.iter().map(|v| v / nrm).collect();
    }
    let tau = 1.0 / (lam_max * 1.05);

    let mut y = seed.clone();
    for _ in 0..iters {
        let ay = apply_operator(sim, field, &y);
        for g in 0..n {
            y[g] -= tau * ay[g];
        }
        let nrm = y.iter().fold(0.0f64, |m, &v| m.max(v.abs())).max(1e-300);
        for v in y.iter_mut() {
            *v /= nrm;
        }
    }

    let peak = seed
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.abs().partial_cmp(&b.1.abs()).unwrap())
        .map(|(i, _)| i)
        .unwrap();
    let scale = seed[peak] / y[peak];
    y.iter().map(|v| v * scale).collect()
}

/// A y for the assembled scalar operator (the acceleration of a zero-
/// source state is -A y).
fn apply_operator(sim: &mut Simulation, field: &str, y: &[f64]) -> Vec<f64> {
    sim.set_field_values(field, y).unwrap();
    sim.evaluate_acceleration(0.0).unwrap();
    sim.field_global("a").unwrap().iter().map(|v| -v).collect()
}
