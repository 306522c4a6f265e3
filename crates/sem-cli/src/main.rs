//! Command-line front end for the wave engine.
//!
//! Parses the flag surface, loads the mesh/model through the I/O seams,
//! assembles the simulation and runs the Newmark loop. All fatal errors
//! map to a non-zero exit code.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sem_io::{JsonSnapshotWriter, NullSnapshotWriter, SnapshotWriter, write_trace_file};
use sem_solver::{
    NewmarkIntegrator, ReceiverSpec, Simulation, SimulationConfig, SourceSpec,
};

#[derive(Parser, Debug)]
#[command(name = "sem", about = "Spectral-element time-domain wave engine")]
struct Cli {
    /// Mesh input file
    #[arg(long)]
    mesh_file: Option<PathBuf>,

    /// Material model file (defaults to the mesh file)
    #[arg(long)]
    model_file: Option<PathBuf>,

    /// Spectral polynomial order
    #[arg(long, default_value_t = 3)]
    polynomial_order: usize,

    /// Ambient dimension (2 or 3)
    #[arg(long, default_value_t = 2)]
    dimension: usize,

    /// Physical duration of the run in seconds
    #[arg(long, default_value_t = 1.0)]
    duration: f64,

    /// Newmark time step in seconds
    #[arg(long, default_value_t = 1e-3)]
    time_step: f64,

    /// Physics: acoustic or elastic
    #[arg(long, default_value = "acoustic")]
    physics: String,

    /// Comma-separated side-set names pinned to zero
    #[arg(long, value_delimiter = ',')]
    homogeneous_dirichlet: Vec<String>,

    /// Save volumetric snapshots
    #[arg(long, action = ArgAction::Set, default_value_t = false)]
    save_movie: bool,

    #[arg(long)]
    movie_file_name: Option<PathBuf>,

    /// Field written to the movie file
    #[arg(long, default_value = "u")]
    movie_field: String,

    /// Snapshot cadence in steps
    #[arg(long, default_value_t = 10)]
    save_frame_every: usize,

    /// Source catalog file
    #[arg(long)]
    source_file_name: Option<PathBuf>,

    /// Number of inline sources
    #[arg(long, default_value_t = 0)]
    number_of_sources: usize,

    /// Inline source type (ricker)
    #[arg(long, default_value = "ricker")]
    source_type: String,

    #[arg(long, value_delimiter = ',')]
    source_location_x: Vec<f64>,

    #[arg(long, value_delimiter = ',')]
    source_location_y: Vec<f64>,

    #[arg(long, value_delimiter = ',')]
    source_location_z: Vec<f64>,

    #[arg(long, value_delimiter = ',')]
    ricker_amplitude: Vec<f64>,

    #[arg(long, value_delimiter = ',')]
    ricker_center_freq: Vec<f64>,

    #[arg(long, value_delimiter = ',')]
    ricker_time_delay: Vec<f64>,

    #[arg(long, value_delimiter = ',')]
    source_num_components: Vec<usize>,

    /// Number of inline receivers
    #[arg(long, default_value_t = 0)]
    number_of_receivers: usize,

    /// Base path for receiver trace output
    #[arg(long)]
    receiver_file_name: Option<PathBuf>,

    #[arg(long, value_delimiter = ',')]
    receiver_names: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    receiver_location_x: Vec<f64>,

    #[arg(long, value_delimiter = ',')]
    receiver_location_y: Vec<f64>,

    #[arg(long, value_delimiter = ',')]
    receiver_location_z: Vec<f64>,

    /// Treat the CFL warning as fatal
    #[arg(long, action = ArgAction::SetTrue)]
    strict_cfl: bool,

    /// Displacement magnitude treated as a numerical blowup
    #[arg(long, default_value_t = 5.0)]
    blowup_sentinel: f64,

    /// Suppress mandatory-flag errors (unit tests)
    #[arg(long, action = ArgAction::Set, default_value_t = false)]
    testing: bool,

    /// Raise the log level
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

impl Cli {
    fn at(v: &[f64], i: usize) -> f64 {
        v.get(i).copied().unwrap_or(0.0)
    }

    fn into_config(self) -> Result<SimulationConfig, String> {
        let mut sources = Vec::new();
        for i in 0..self.number_of_sources {
            let num_components = self.source_num_components.get(i).copied().unwrap_or(1);
            sources.push(SourceSpec {
                name: format!("source-{i}"),
                source_type: self.source_type.clone(),
                location: [
                    Self::at(&self.source_location_x, i),
                    Self::at(&self.source_location_y, i),
                    Self::at(&self.source_location_z, i),
                ],
                num_components,
                direction: vec![1.0; num_components],
                ricker_amplitude: Self::at(&self.ricker_amplitude, i),
                ricker_center_freq: Self::at(&self.ricker_center_freq, i),
                ricker_time_delay: Self::at(&self.ricker_time_delay, i),
            });
        }

        let mut receivers = Vec::new();
        for i in 0..self.number_of_receivers {
            let name = self
                .receiver_names
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("receiver-{i}"));
            receivers.push(ReceiverSpec {
                name,
                location: [
                    Self::at(&self.receiver_location_x, i),
                    Self::at(&self.receiver_location_y, i),
                    Self::at(&self.receiver_location_z, i),
                ],
            });
        }

        Ok(SimulationConfig {
            mesh_file: self.mesh_file,
            model_file: self.model_file,
            polynomial_order: self.polynomial_order,
            dimension: self.dimension,
            duration: self.duration,
            time_step: self.time_step,
            physics: self.physics,
            homogeneous_dirichlet: self.homogeneous_dirichlet,
            save_movie: self.save_movie,
            movie_file_name: self.movie_file_name,
            movie_field: self.movie_field,
            save_frame_every: self.save_frame_every,
            source_file_name: self.source_file_name,
            sources,
            receiver_file_name: self.receiver_file_name,
            receivers,
            strict_cfl: self.strict_cfl,
            blowup_sentinel: self.blowup_sentinel,
            testing: self.testing,
            verbose: self.verbose,
        })
    }
}

fn run(config: SimulationConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    let mesh_path = config
        .mesh_file
        .as_ref()
        .ok_or("no mesh file configured")?;
    let mut mesh = sem_io::read_model(mesh_path)?;

    // A separate model file contributes its vertex parameter fields.
    if let Some(model_path) = &config.model_file {
        if model_path != mesh_path {
            let model = sem_io::read_model(model_path)?;
            for (name, values) in model.vertex_fields {
                mesh.set_vertex_field(&name, values)?;
            }
        }
    }
    info!("mesh loaded:\n{}", mesh.statistics().format());

    let mut sim = Simulation::new(mesh, &config)?;
    info!(
        sources = sim.num_sources(),
        receivers = sim.receivers().len(),
        cfl_limit = sim.cfl_limit,
        "starting time loop"
    );

    let mut snapshot: Box<dyn SnapshotWriter> = match (&config.save_movie, &config.movie_file_name)
    {
        (true, Some(path)) => Box::new(JsonSnapshotWriter::new(path)),
        _ => Box::new(NullSnapshotWriter),
    };

    let mut integrator = NewmarkIntegrator::from_config(&config);
    let summary = integrator.run(&mut sim, snapshot.as_mut())?;
    info!(
        steps = summary.steps,
        final_time = summary.final_time,
        wall_seconds = summary.wall_seconds,
        "run complete"
    );

    // Flush receiver traces.
    let components = sim.physics().pull_fields();
    for rec in sim.receivers() {
        let path = match &config.receiver_file_name {
            Some(base) => base.with_file_name(format!(
                "{}.{}.dat",
                base.file_name().and_then(|s| s.to_str()).unwrap_or("traces"),
                rec.name
            )),
            None => PathBuf::from(format!("{}.dat", rec.name)),
        };
        write_trace_file(
            &path,
            &rec.name,
            &rec.location,
            components,
            &rec.times,
            &rec.traces,
        )?;
        info!(receiver = %rec.name, path = %path.display(), "trace written");
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match cli.into_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::from(2);
        }
    };
    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("fatal: {e}");
            eprintln!("error: {e}");
            ExitCode::from(1)
        }
    }
}
