//! Erosim CLI - pipe-model hydraulic erosion simulator.
//!
//! Generate a fractal seed terrain, run the staged erosion simulation for
//! a number of ticks, and export the resulting fields as 16-bit PNGs.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;

use erosim::export::{export_field_png, PngExportOptions};
use erosim::gen::GenConfig;
use erosim::{generate_initial_columns, SimConfig, Simulation};

/// Pipe-model hydraulic erosion simulator.
#[derive(Parser)]
#[command(name = "erosim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a seed terrain and run the erosion simulation.
    Run {
        /// Grid width in cells.
        #[arg(long, default_value = "256")]
        width: usize,

        /// Grid height in cells.
        #[arg(long, default_value = "256")]
        height: usize,

        /// Number of simulation ticks.
        #[arg(short, long, default_value = "5000")]
        ticks: u64,

        /// Random seed for reproducible runs.
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output directory for exported maps.
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Base name for output files.
        #[arg(short, long, default_value = "erosim")]
        name: String,

        /// Override the size-derived time step.
        #[arg(long)]
        dt: Option<f32>,

        /// Disable rainfall.
        #[arg(long)]
        no_rain: bool,

        /// Disable the fixed water sources.
        #[arg(long)]
        no_source: bool,

        /// Disable evaporation.
        #[arg(long)]
        no_evaporation: bool,

        /// Disable vegetation effects.
        #[arg(long)]
        no_vegetation: bool,

        /// Number of noise octaves for the seed terrain.
        #[arg(long, default_value = "4")]
        octaves: u8,

        /// Base noise frequency for the seed terrain.
        #[arg(long, default_value = "2.0")]
        frequency: f32,

        /// Peak-to-valley half-range of the seed terrain.
        #[arg(long, default_value = "1.0")]
        amplitude: f32,

        /// Export the water depth map.
        #[arg(long)]
        water_map: bool,

        /// Export the suspended sediment map.
        #[arg(long)]
        sediment_map: bool,

        /// Export the vegetation cover map.
        #[arg(long)]
        vegetation_map: bool,

        /// Export the regolith depth map.
        #[arg(long)]
        regolith_map: bool,
    },

    /// Display the configuration and memory footprint for a grid size.
    Info {
        /// Grid width in cells.
        #[arg(long, default_value = "256")]
        width: usize,

        /// Grid height in cells.
        #[arg(long, default_value = "256")]
        height: usize,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            width,
            height,
            ticks,
            seed,
            output,
            name,
            dt,
            no_rain,
            no_source,
            no_evaporation,
            no_vegetation,
            octaves,
            frequency,
            amplitude,
            water_map,
            sediment_map,
            vegetation_map,
            regolith_map,
        } => {
            run_simulation(RunArgs {
                width,
                height,
                ticks,
                seed,
                output,
                name,
                dt,
                no_rain,
                no_source,
                no_evaporation,
                no_vegetation,
                octaves,
                frequency,
                amplitude,
                water_map,
                sediment_map,
                vegetation_map,
                regolith_map,
            });
        }
        Commands::Info { width, height } => {
            run_info(width, height);
        }
    }
}

struct RunArgs {
    width: usize,
    height: usize,
    ticks: u64,
    seed: Option<u64>,
    output: PathBuf,
    name: String,
    dt: Option<f32>,
    no_rain: bool,
    no_source: bool,
    no_evaporation: bool,
    no_vegetation: bool,
    octaves: u8,
    frequency: f32,
    amplitude: f32,
    water_map: bool,
    sediment_map: bool,
    vegetation_map: bool,
    regolith_map: bool,
}

fn run_simulation(args: RunArgs) {
    // Validate parameters
    if args.width < 16 || args.width > 8192 || args.height < 16 || args.height > 8192 {
        eprintln!("Error: Grid dimensions must be between 16 and 8192");
        std::process::exit(1);
    }

    if args.octaves < 1 || args.octaves > 16 {
        eprintln!("Error: Octaves must be between 1 and 16");
        std::process::exit(1);
    }

    if let Some(dt) = args.dt {
        if !(dt > 0.0 && dt <= 0.1) {
            eprintln!("Error: dt must be in (0, 0.1]");
            std::process::exit(1);
        }
    }

    // Generate seed if not provided
    let seed = args.seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos() as u64
    });

    println!("Erosim - Hydraulic Erosion Simulator");
    println!("====================================");
    println!("Grid: {}x{}", args.width, args.height);
    println!("Seed: {}", seed);
    println!("Output: {}", args.output.display());

    let start = Instant::now();

    let mut config = SimConfig::for_grid(args.width, args.height);
    config.seed = seed;
    if let Some(dt) = args.dt {
        config.dt = dt;
    }
    if args.no_rain {
        config.rain.enabled = false;
    }
    if args.no_source {
        config.sources.clear();
    }
    if args.no_evaporation {
        config.evaporation = 0.0;
    }
    if args.no_vegetation {
        config.vegetation_enabled = false;
    }

    println!("\nGenerating seed terrain...");
    let gen_config = GenConfig {
        octaves: args.octaves,
        frequency: args.frequency,
        amplitude: args.amplitude,
        seed: seed as i32,
        ..GenConfig::default()
    };
    let initial = generate_initial_columns(args.width, args.height, &gen_config);

    let mut sim = match Simulation::new(config, &initial) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "Running {} ticks (dt = {:.5}s, {:.2}s simulated)...",
        args.ticks,
        sim.config().dt,
        args.ticks as f32 * sim.config().dt
    );

    let report_every = (args.ticks / 10).max(1);
    for tick in 0..args.ticks {
        sim.step();
        if (tick + 1) % report_every == 0 {
            let snap = sim.snapshot();
            println!(
                "  tick {:>8} | t = {:>7.2}s | water {:>10.3} | source {} | rain {}",
                tick + 1,
                sim.elapsed(),
                snap.total_water(),
                if sim.injector().source_active() { "on" } else { "off" },
                if sim.injector().rain_active() { "on" } else { "off" },
            );
        }
    }

    println!("\nSimulation finished in {:.2?}", start.elapsed());

    if let Err(e) = std::fs::create_dir_all(&args.output) {
        eprintln!("Error: Failed to create output directory: {}", e);
        std::process::exit(1);
    }

    println!("Exporting maps...");
    let snap = sim.snapshot();
    let grid = sim.grid();

    let mut exports: Vec<(&str, Vec<f32>)> = vec![("terrain", snap.solid_surface())];
    if args.water_map {
        exports.push(("water", snap.water.to_vec()));
    }
    if args.sediment_map {
        exports.push(("sediment", snap.suspended_sediment.to_vec()));
    }
    if args.vegetation_map {
        exports.push(("vegetation", snap.vegetation.to_vec()));
    }
    if args.regolith_map {
        exports.push(("regolith", snap.regolith.to_vec()));
    }

    for (label, field) in &exports {
        let path = args.output.join(format!("{}_{}.png", args.name, label));
        let options = PngExportOptions::auto_range(field);
        match export_field_png(grid, field, &path, &options) {
            Ok(()) => println!("  wrote {}", path.display()),
            Err(e) => {
                eprintln!("Error: Failed to export {}: {}", label, e);
                std::process::exit(1);
            }
        }
    }

    println!("Done in {:.2?}", start.elapsed());
}

fn run_info(width: usize, height: usize) {
    let config = SimConfig::for_grid(width, height);
    let cells = width * height;

    // Persistent per-cell state: 4 column channels + 4 aux channels, two
    // flux fields of 4 channels, and one Vec2 velocity field, all doubled,
    // plus the single-buffered talus and transport scratch.
    let buffered_floats = 2 * (4 + 4 + 4 + 4 + 2);
    let scratch_floats = 4 + 4 + 2; // soil flux, corner flux, transfer
    let bytes = cells * (buffered_floats + scratch_floats) * std::mem::size_of::<f32>();

    println!("Erosim Configuration");
    println!("====================");
    println!("Grid: {}x{} ({} cells)", width, height, cells);
    println!("Time step: {:.5}s", config.dt);
    println!("Source cutoff: {:.1}s, rain cutoff: {:.1}s", config.source_cutoff, config.rain_cutoff);
    println!("Sources:");
    for s in &config.sources {
        println!(
            "  ({}, {}) radius {:.1} rate {:.2}/s",
            s.x, s.y, s.radius, s.rate
        );
    }
    println!(
        "Rain: {} drop(s)/tick, radius {:.1}, intensity [{:.1}, {:.1}]",
        config.rain.drops_per_tick,
        config.rain.radius,
        config.rain.intensity_min,
        config.rain.intensity_max
    );
    println!("Estimated field memory: {:.1} MB", bytes as f64 / (1024.0 * 1024.0));
}
