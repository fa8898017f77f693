//! Biome placement report for the Nebula biome generator.
//!
//! Loads `config.ron`, registers the built-in Nether and End biomes, builds
//! the biome sources for a seed, and prints a biome map and distribution for
//! each dimension.
//!
//! Run with: `cargo run -p nebula-biome-probe -- --seed 42`

mod report;

use clap::Parser;
use nebula_biomes::{
    BiomeContext, BiomeError, BiomeSource, BiomeSourceAdapter, DimensionId, GeneratorSettings,
    vanilla,
};
use nebula_config::{CliArgs, Config};
use noise::{NoiseFn, OpenSimplex};
use tracing::{error, info, warn};

use report::Window;

/// Frequency of the island noise, in cycles per block.
const ISLAND_FREQUENCY: f64 = 1.0 / 384.0;

const MAP: Window = Window {
    origin_x: -768,
    origin_z: -384,
    columns: 96,
    rows: 48,
    step: 16,
};

fn main() {
    let args = CliArgs::parse();

    let (mut config, config_dir) = match Config::load_from(args.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("Failed to load config, using defaults: {err}");
            (Config::default(), std::env::temp_dir())
        }
    };
    config.apply_cli_overrides(&args);

    nebula_log::init_logging(Some(&config_dir), cfg!(debug_assertions), Some(&config));
    info!("Nebula biome report, config dir {}", config_dir.display());

    let seed = args.seed.unwrap_or(0);
    if let Err(err) = run(&config, seed) {
        error!("Biome report failed: {err}");
        std::process::exit(1);
    }
}

fn run(config: &Config, seed: u64) -> Result<(), BiomeError> {
    let mut context = BiomeContext::new(config);
    vanilla::register(&mut context)?;
    for id in ["nether", "end"] {
        context.register_generator_settings(GeneratorSettings::new(id));
    }

    let mut snapshot = vanilla::snapshot(1);
    context.init_registry(&mut snapshot);

    if config.generator.custom_nether_biome_source {
        let nether = BiomeSourceAdapter::nether(&mut context, &snapshot, seed);
        context.apply_to_level(&DimensionId::nether(), nether.possible_biomes(), &mut snapshot);
        print_report("Nether", &nether)?;
    } else {
        warn!("Custom Nether biome source disabled in config");
    }

    if config.generator.custom_end_biome_source {
        let islands = OpenSimplex::new(nebula_biomes::seed::noise_seed(seed, 0x1514_4D5));
        let terrain = move |x: i32, z: i32| {
            islands.get([f64::from(x) * ISLAND_FREQUENCY, f64::from(z) * ISLAND_FREQUENCY]) > 0.1
        };
        let end = BiomeSourceAdapter::end(&mut context, &snapshot, seed, terrain);
        context.apply_to_level(&DimensionId::end(), end.possible_biomes(), &mut snapshot);
        print_report("End", &end)?;
    } else {
        warn!("Custom End biome source disabled in config");
    }

    info!(
        "Feature order holds {} features",
        context.feature_order().len()
    );
    Ok(())
}

fn print_report(name: &str, source: &BiomeSourceAdapter) -> Result<(), BiomeError> {
    let rows = report::sample(source, MAP)?;
    println!("== {name} (seed {}) ==", source.seed());
    print!("{}", report::render_map(source, &rows));
    for (id, share) in report::distribution(&rows) {
        println!("  {:>6.2}%  {id}", share * 100.0);
    }
    println!();
    Ok(())
}
