//! Elastic standing-wave checks. With lambda = 0 (VP^2 = 2 VS^2) a pure
//! P-wave mode ux = sin(pi (x+1)/2), uy = uz = 0 satisfies traction-free
//! conditions on the transverse walls exactly, so pinning only the left
//! and right side sets reproduces the scalar standing wave in ux while the
//! transverse components stay numerically zero.

use sem_io::NullSnapshotWriter;
use sem_mesh::{structured_hexes, structured_quads};
use sem_solver::{NewmarkIntegrator, Simulation, SimulationConfig};

const PI: f64 = std::f64::consts::PI;

fn mode_x(x: &[f64; 3]) -> f64 {
    (PI * (x[0] + 1.0) / 2.0).sin()
}

#[test]
fn p_wave_mode_in_2d_isotropic_elastic() {
    let mut mesh = structured_quads(2, 2, [-1.0, 1.0], [-1.0, 1.0]).unwrap();
    mesh.set_uniform_field("VP", 2.0_f64.sqrt());
    mesh.set_uniform_field("VS", 1.0);
    mesh.set_uniform_field("RHO", 1.0);

    let config = SimulationConfig {
        testing: true,
        physics: "elastic".to_string(),
        polynomial_order: 3,
        time_step: 3e-3,
        duration: 30.0 * 3e-3,
        homogeneous_dirichlet: vec!["left".to_string(), "right".to_string()],
        ..Default::default()
    };
    let mut sim = Simulation::new(mesh, &config).unwrap();
    sim.set_initial_condition("ux", mode_x).unwrap();

    let mut integrator = NewmarkIntegrator::from_config(&config);
    let summary = integrator.run(&mut sim, &mut NullSnapshotWriter).unwrap();

    // omega = VP * pi / 2 = pi / sqrt(2)
    let omega = PI / 2.0_f64.sqrt();
    let phase = (omega * summary.final_time).cos();
    let ux = sim.field_global("ux").unwrap();
    let err = sim
        .dof_positions()
        .iter()
        .zip(ux)
        .map(|(x, &v)| (v - mode_x(x) * phase).abs())
        .fold(0.0f64, f64::max);
    assert!(err < 2.0e-3, "ux error {err}");

    let uy_max = sim
        .field_global("uy")
        .unwrap()
        .iter()
        .fold(0.0f64, |m, &v| m.max(v.abs()));
    assert!(uy_max < 1e-12, "uy leaked to {uy_max}");
}

#[test]
fn p_wave_mode_in_3d_vti_isotropic_limit() {
    let mut mesh = structured_hexes(2, 2, 2, [-1.0, 1.0], [-1.0, 1.0], [-1.0, 1.0]).unwrap();
    mesh.set_uniform_field("RHO", 1.0);
    mesh.set_uniform_field("VPV", 2.0_f64.sqrt());
    mesh.set_uniform_field("VPH", 2.0_f64.sqrt());
    mesh.set_uniform_field("VSV", 1.0);
    mesh.set_uniform_field("VSH", 1.0);
    mesh.set_uniform_field("ETA", 1.0);

    let config = SimulationConfig {
        testing: true,
        physics: "elastic".to_string(),
        dimension: 3,
        polynomial_order: 3,
        time_step: 3e-3,
        duration: 30.0 * 3e-3,
        homogeneous_dirichlet: vec!["left".to_string(), "right".to_string()],
        ..Default::default()
    };
    let mut sim = Simulation::new(mesh, &config).unwrap();
    sim.set_initial_condition("ux", mode_x).unwrap();

    let mut integrator = NewmarkIntegrator::from_config(&config);
    let summary = integrator.run(&mut sim, &mut NullSnapshotWriter).unwrap();

    let omega = PI / 2.0_f64.sqrt();
    let phase = (omega * summary.final_time).cos();
    let ux = sim.field_global("ux").unwrap();
    let err = sim
        .dof_positions()
        .iter()
        .zip(ux)
        .map(|(x, &v)| (v - mode_x(x) * phase).abs())
        .fold(0.0f64, f64::max);
    assert!(err < 2.0e-3, "ux error {err}");

    for name in ["uy", "uz"] {
        let leak = sim
            .field_global(name)
            .unwrap()
            .iter()
            .fold(0.0f64, |m, &v| m.max(v.abs()));
        assert!(leak < 1e-12, "{name} leaked to {leak}");
    }
}
