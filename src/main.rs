//! # Wavepath Command Line
//!
//! Generates a battle path from a seed and prints a summary or the full JSON.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use wavepath::{
    config, generation::utils, BattlePath, BattlePathGenerator, GenerationConfig, Generator,
    RunMode, WavepathError, WavepathResult,
};

/// Output format of the generated path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human readable overview
    Summary,
    /// Full path as JSON
    Json,
}

/// Run length preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Standard,
    Extended,
}

/// Command line arguments for the path generator.
#[derive(Parser, Debug)]
#[command(name = "wavepath")]
#[command(about = "Seeded generator of branching battle paths")]
#[command(version)]
struct Args {
    /// Root seed for generation
    #[arg(short, long, default_value = config::DEFAULT_SEED)]
    seed: String,

    /// Number of waves in the run
    #[arg(short, long, default_value_t = 500)]
    waves: u32,

    /// Run length preset; overrides --waves
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// First wave that gets nodes
    #[arg(long, default_value_t = 1)]
    start_wave: u32,

    /// Waves per layer
    #[arg(long, default_value_t = config::DEFAULT_LAYER_SIZE)]
    layer_size: u32,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Summary)]
    format: OutputFormat,

    /// Write the path as JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> WavepathResult<()> {
    let args = Args::parse();
    initialize_logging(&args.log_level)?;

    let mut config = match args.mode {
        Some(ModeArg::Standard) => GenerationConfig::for_mode(args.seed.as_str(), RunMode::Standard),
        Some(ModeArg::Extended) => GenerationConfig::for_mode(args.seed.as_str(), RunMode::Extended),
        None => GenerationConfig::new(args.seed.as_str(), args.waves),
    };
    config = config
        .with_start_wave(args.start_wave)
        .with_layer_size(args.layer_size);

    let generator = BattlePathGenerator::new();
    let mut rng = utils::create_rng(&config);
    let path = generator.generate(&config, &mut rng)?;

    if let Some(output) = &args.output {
        path.save_to_file(output)?;
        log::info!("Wrote path to {}", output.display());
    }

    match args.format {
        OutputFormat::Json => println!("{}", path.to_json()?),
        OutputFormat::Summary => print_summary(&path),
    }

    if path.diagnostics().is_empty() {
        Ok(())
    } else {
        Err(WavepathError::GenerationFailed(format!(
            "{} integrity findings",
            path.diagnostics().len()
        )))
    }
}

/// Initializes the logging system based on the specified log level.
fn initialize_logging(log_level: &str) -> WavepathResult<()> {
    #[cfg(feature = "dev-tools")]
    {
        use tracing::Level;

        let level = match log_level.to_lowercase().as_str() {
            "error" => Level::ERROR,
            "warn" => Level::WARN,
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| WavepathError::InvalidState(format!("Logging setup failed: {e}")))?;
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        let level = log_level
            .parse::<log::LevelFilter>()
            .unwrap_or(log::LevelFilter::Warn);
        env_logger::Builder::new()
            .filter_level(level)
            .format_target(false)
            .try_init()
            .map_err(|e| WavepathError::InvalidState(format!("Logging setup failed: {e}")))?;
    }

    Ok(())
}

/// Prints a human readable overview of a generated path.
fn print_summary(path: &BattlePath) {
    let specials = path.special_waves();
    println!("Wavepath v{}", wavepath::VERSION);
    println!("Seed:          {}", path.seed());
    println!("Waves:         {}..={}", path.start_wave(), path.total_waves());
    println!("Layers:        {}", path.layers().len());
    println!("Nodes:         {}", path.graph().len());
    println!("Edges:         {}", path.graph().edge_count());
    println!("Rivals:        {:?}", specials.rival);
    println!("Major bosses:  {:?}", specials.major_boss);
    println!("Elite four:    {:?}", specials.elite_four);
    println!("Champions:     {:?}", specials.champion);
    println!(
        "Evil team:     grunts {:?}, admins {:?}, bosses {:?}",
        specials.evil_team.grunts, specials.evil_team.admins, specials.evil_team.bosses
    );
    println!("Recovery:      {} bosses", specials.recovery_boss.len());
    println!("Milestones:    {:?}", specials.milestone);
    println!("Skipped slots: {}", specials.skipped.len());

    println!("Challenges:");
    for challenge in path.challenge_paths() {
        let modifiers: Vec<&str> = challenge
            .extra_modifiers
            .iter()
            .map(|mode| mode.key())
            .collect();
        println!(
            "  #{} wave {} - {} battles, {} [{}]",
            challenge.chain_id,
            challenge.start_wave,
            challenge.node_count,
            challenge.archetype.flag().key(),
            modifiers.join(", ")
        );
    }

    if path.diagnostics().is_empty() {
        println!("Integrity:     ok");
    } else {
        println!("Integrity:     {} findings", path.diagnostics().len());
        for diagnostic in path.diagnostics() {
            println!("  {diagnostic}");
        }
    }
}
