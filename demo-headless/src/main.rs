use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wind_shear_core::{
    safe_div, AmbientShear, FieldData, LogProfile, ShearConfig, WindSample, WindShear,
};

/// Wind shear over a synthetic dune field for a sweep of wind directions
#[derive(Parser, Debug)]
#[command(name = "wind-shear-demo")]
#[command(about = "Topographic wind shear perturbation demo", long_about = None)]
struct Args {
    /// Number of grid columns
    #[arg(long, default_value_t = 200)]
    cols: usize,

    /// Number of grid rows (1 runs a transect)
    #[arg(long, default_value_t = 100)]
    rows: usize,

    /// Grid spacing in meters
    #[arg(long, default_value_t = 1.0)]
    spacing: f64,

    /// Dune crest height in meters
    #[arg(long, default_value_t = 3.0)]
    dune_height: f64,

    /// Dune wavelength in meters
    #[arg(long, default_value_t = 40.0)]
    wavelength: f64,

    /// Fraction of each dune taken by the stoss slope (0-1)
    #[arg(long, default_value_t = 0.8)]
    stoss_fraction: f64,

    /// Use a flat bed instead of dunes
    #[arg(long)]
    flat: bool,

    /// Wind speed at measurement height in m/s
    #[arg(short, long, default_value_t = 10.0)]
    wind_speed: f64,

    /// Number of wind directions in the sweep
    #[arg(short, long, default_value_t = 8)]
    directions: usize,

    /// Disable flow separation
    #[arg(long)]
    no_separation: bool,

    /// Edge-hold padding cells
    #[arg(long, default_value_t = 50)]
    buffer_cells: usize,
}

/// Transverse dunes with crests along y: a gentle stoss slope followed by a
/// steep lee face
fn dune_field(args: &Args) -> FieldData {
    FieldData::from_fn(args.cols, args.rows, |i, _| {
        if args.flat {
            return 0.0;
        }
        let x = i as f64 * args.spacing;
        let phase = (x / args.wavelength).fract();
        if phase < args.stoss_fraction {
            args.dune_height * phase / args.stoss_fraction
        } else {
            args.dune_height * (1.0 - phase) / (1.0 - args.stoss_fraction)
        }
    })
}

fn run(args: &Args) -> wind_shear_core::Result<()> {
    let x = FieldData::from_fn(args.cols, args.rows, |i, _| i as f64 * args.spacing);
    let y = FieldData::from_fn(args.cols, args.rows, |_, j| j as f64 * args.spacing);
    let z = dune_field(args);
    println!(
        "Grid: {}x{} cells at {:.2} m, bed {:.2}..{:.2} m",
        args.rows,
        args.cols,
        args.spacing,
        z.min(),
        z.max()
    );

    let config = ShearConfig {
        dx: args.spacing,
        dy: args.spacing,
        buffer_cells: args.buffer_cells,
        ..ShearConfig::default()
    };
    let mut shear = WindShear::new(x, y, z.clone(), config)?;
    let layers = shear.layers();
    println!(
        "Layers: inner {:.3} m, middle {:.3} m, velocity ratio {:.3}",
        layers.inner, layers.middle, layers.velocity_ratio
    );
    let (grid_rows, grid_cols) = shear.computational_grid().shape();
    println!("Computational grid: {grid_rows}x{grid_cols}\n");

    let profile = LogProfile::default();
    profile.validate()?;
    let orientation = FieldData::new(args.cols, args.rows);
    let separation = !args.no_separation;
    let transect = args.rows == 1;

    println!("    udir    min amp    max amp  bubbles   max hsep    time ms");
    for step in 0..args.directions.max(1) {
        let udir = -90.0 + 360.0 * step as f64 / args.directions.max(1) as f64;
        // Engine direction udir blows towards the world angle -(udir + 90)
        let sample = WindSample {
            speed: args.wind_speed,
            direction: -(udir + 90.0),
        };
        let ambient = AmbientShear::from_wind(sample, &orientation, &profile, transect);
        let update = shear.step(z.clone(), &ambient, args.wind_speed, udir, separation)?;

        let (min_amp, max_amp) = update
            .tau
            .data
            .iter()
            .zip(&ambient.tau.data)
            .map(|(&t, &t0)| safe_div(t, t0, 1.0))
            .fold((f64::MAX, f64::MIN), |(lo, hi), a| (lo.min(a), hi.max(a)));

        println!(
            "{:>8.1} {:>10.3} {:>10.3} {:>8} {:>10.3} {:>10.2}",
            udir,
            min_amp,
            max_amp,
            shear.bubbles().len(),
            update.hsep.max(),
            shear.timings().total_ms()
        );
    }
    info!("Sweep finished");
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    println!("=== Wind Shear Demo ===\n");

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
