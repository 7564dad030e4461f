use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::info;
use ndarray::Array1;
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use seakeeping_calc::{
    helipad_motion, read_stl, Constants, Crest, HullMesh, RigidBodyIntegrator, ShipConfig,
    SimulationResult, TrajectoryMetrics, Vec3, WaveField, WaveRequest, WaveSynthesizer,
};

#[derive(Parser)]
#[command(name = "seakeeping", version, about = "Ship motion on a synthesised sea")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print an example scenario as JSON
    Example,
    /// Synthesise the scenario's wave field and store it as JSON
    Waves {
        scenario: PathBuf,
        #[arg(short, long, default_value = "waves.json")]
        out: PathBuf,
    },
    /// Synthesise waves (or load them) and simulate the ship
    Run {
        scenario: PathBuf,
        /// Trajectory CSV
        #[arg(short, long, default_value = "trajectory.csv")]
        out: PathBuf,
        /// Also write everything a 3D viewer needs as JSON
        #[arg(long)]
        visual: Option<PathBuf>,
        /// Override the scenario seed
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Everything needed to reproduce one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Scenario {
    waves: WaveRequest,
    /// Precomputed wave field; replaces synthesis when set
    #[serde(default)]
    waves_file: Option<PathBuf>,
    #[serde(default)]
    ship: ShipConfig,
    /// Binary STL hull; a box of the ship's dimensions when absent
    #[serde(default)]
    stl: Option<PathBuf>,
    #[serde(default)]
    constants: Constants,
    #[serde(default)]
    seed: u64,
}

impl Scenario {
    fn example() -> Self {
        let ship = ShipConfig {
            vertex_offset: Vec3::new(35.0, 42.5, -1.2),
            ref_speed_u: 2.0,
            ..ShipConfig::hms_norfolk()
        };
        Self {
            waves: WaveRequest {
                sea_state: 5,
                x_vec: Array1::linspace(0.0, 299.0, 300),
                y_vec: Array1::linspace(0.0, 99.0, 100),
                beta: std::f64::consts::PI,
                t_vec: Array1::linspace(0.0, 60.0, 301),
                ship_speed: 0.0,
                crest: Crest::LongCrested,
                wavelength: None,
            },
            waves_file: None,
            ship,
            stl: None,
            constants: Constants::new(),
            seed: 1,
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(path)?;
    serde_json::to_writer(BufWriter::new(file), value)?;
    Ok(())
}

fn wave_field(scenario: &Scenario, seed: u64) -> Result<WaveField, Box<dyn std::error::Error>> {
    if let Some(path) = &scenario.waves_file {
        info!("loading waves from {}", path.display());
        let field: WaveField = read_json(path)?;
        field.check_shape()?;
        return Ok(field);
    }
    let mut rng = StdRng::seed_from_u64(seed);
    Ok(WaveSynthesizer::new(scenario.constants.g).synthesize(&scenario.waves, &mut rng)?)
}

fn hull(scenario: &Scenario) -> Result<HullMesh, Box<dyn std::error::Error>> {
    match &scenario.stl {
        Some(path) => {
            info!("reading hull from {}", path.display());
            Ok(read_stl(path)?.into_hull()?)
        }
        None => {
            let s = &scenario.ship;
            info!("no STL given, using a {} x {} x {} m box", s.length, s.width, s.height);
            Ok(HullMesh::cuboid(s.length, s.width, s.height)?)
        }
    }
}

/// Trajectory and helipad motion as one table.
fn trajectory_frame(result: &SimulationResult) -> PolarsResult<DataFrame> {
    const STATE_NAMES: [&str; 12] = [
        "x", "y", "z", "v_u", "v_v", "v_w", "phi", "theta", "psi", "w_phi", "w_theta", "w_psi",
    ];
    let states: Vec<[f64; 12]> = result.trajectory.iter().map(|s| s.to_array()).collect();
    let helipad = helipad_motion(result);

    let mut columns = vec![Series::new("t", result.t_vec.to_vec())];
    for (k, name) in STATE_NAMES.iter().enumerate() {
        let values: Vec<f64> = states.iter().map(|s| s[k]).collect();
        columns.push(Series::new(name, values));
    }
    for (k, axis) in ["x", "y", "z"].iter().enumerate() {
        let pos: Vec<f64> = helipad.iter().map(|h| h.position.to_array()[k]).collect();
        let vel: Vec<f64> = helipad.iter().map(|h| h.velocity.to_array()[k]).collect();
        columns.push(Series::new(&format!("helipad_{axis}"), pos));
        columns.push(Series::new(&format!("helipad_v{axis}"), vel));
    }
    DataFrame::new(columns)
}

fn run(
    scenario: &Scenario,
    seed: u64,
    out: &Path,
    visual: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let waves = wave_field(scenario, seed)?;
    info!("{}", waves.display_name());

    let integrator = RigidBodyIntegrator::new(scenario.constants);
    let summary: BTreeMap<_, _> = scenario.constants.summary().into_iter().collect();
    for (name, value) in &summary {
        info!("{name}: {value}");
    }

    let result = integrator.simulate(&scenario.ship, hull(scenario)?, &waves)?;
    if let Some(step) = result.first_non_finite_step() {
        log::warn!("run diverged at step {step} (t = {:.2} s)", result.t_vec[step]);
    }

    let mut df = trajectory_frame(&result)?;
    let mut file = File::create(out)?;
    CsvWriter::new(&mut file).has_header(true).finish(&mut df)?;
    info!("trajectory written to {}", out.display());

    if let Some(path) = visual {
        write_json(path, &result.visual_bundle(&waves))?;
        info!("visual bundle written to {}", path.display());
    }

    let metrics = TrajectoryMetrics::from_result(&result);
    let summary: BTreeMap<_, _> = metrics.get_summary().into_iter().collect();
    for (name, value) in summary {
        println!("{name:>20}: {value:.4}");
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Example => {
            println!("{}", serde_json::to_string_pretty(&Scenario::example())?);
        }
        Command::Waves { scenario, out } => {
            let scenario: Scenario = read_json(&scenario)?;
            let waves = wave_field(&scenario, scenario.seed)?;
            info!("{}", waves.display_name());
            write_json(&out, &waves)?;
            info!("waves written to {}", out.display());
        }
        Command::Run {
            scenario,
            out,
            visual,
            seed,
        } => {
            let scenario: Scenario = read_json(&scenario)?;
            let seed = seed.unwrap_or(scenario.seed);
            run(&scenario, seed, &out, visual.as_deref())?;
        }
    }
    Ok(())
}
