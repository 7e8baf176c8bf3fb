//! # Battle Path Generator
//!
//! Runs the full pipeline for one seed: schedule special waves, build layers and
//! challenge gauntlets, connect the waves, validate, and publish an immutable
//! [`BattlePath`].

use crate::generation::utils;
use crate::{
    BattleFactory, BattlePath, GenerationConfig, Generator, IntegrityValidator, LayerBuilder,
    PathConnector, SeedRng, SpecialWaveScheduler, StandardBattleFactory, SubseedRegistry,
    WavepathError, WavepathResult,
};
use log::{info, warn};

/// Generates complete battle paths.
#[derive(Debug)]
pub struct BattlePathGenerator {
    factory: Box<dyn BattleFactory>,
    scheduler: SpecialWaveScheduler,
    connector: PathConnector,
}

impl BattlePathGenerator {
    /// Creates a generator using the [`StandardBattleFactory`].
    pub fn new() -> Self {
        Self::with_factory(Box::new(StandardBattleFactory::new()))
    }

    /// Creates a generator that asks `factory` for battle descriptors.
    pub fn with_factory(factory: Box<dyn BattleFactory>) -> Self {
        Self {
            factory,
            scheduler: SpecialWaveScheduler::new(),
            connector: PathConnector::new(),
        }
    }
}

impl Default for BattlePathGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator<BattlePath> for BattlePathGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut SeedRng) -> WavepathResult<BattlePath> {
        config.validate()?;
        info!(
            "Generating battle path for seed {:?} ({} waves from wave {})",
            config.seed, config.total_waves, config.start_wave
        );

        let mut registry = SubseedRegistry::new(config.seed.clone());
        let specials = self.scheduler.schedule(config, rng, &mut registry)?;
        let outcome = LayerBuilder::new(&*self.factory).build(config, rng, &mut registry, &specials)?;

        let mut graph = outcome.graph;
        let mut diagnostics = self.connector.connect(&mut graph, rng, &mut registry)?;
        let report = IntegrityValidator::new().validate(&graph);
        for diagnostic in report.diagnostics() {
            warn!("Integrity check: {}", diagnostic);
        }
        diagnostics.extend(report.into_diagnostics());

        info!(
            "Generated {} nodes, {} edges, {} special waves, {} challenge paths, {} diagnostics",
            graph.len(),
            graph.edge_count(),
            specials.len(),
            outcome.challenge_paths.len(),
            diagnostics.len()
        );

        Ok(BattlePath::from_parts(
            config.seed.clone(),
            config.total_waves,
            config.start_wave,
            outcome.layers,
            graph,
            specials,
            outcome.challenge_paths,
            diagnostics,
        ))
    }

    fn validate(&self, path: &BattlePath, config: &GenerationConfig) -> WavepathResult<()> {
        self.scheduler.validate(path.special_waves(), config)?;
        if let Some(diagnostic) = path.diagnostics().first() {
            return Err(WavepathError::GenerationFailed(format!(
                "{} integrity findings, first: {}",
                path.diagnostics().len(),
                diagnostic
            )));
        }
        let report = IntegrityValidator::new().validate(path.graph());
        if !report.is_clean() {
            return Err(WavepathError::GenerationFailed(format!(
                "{} integrity findings on the stored graph",
                report.diagnostics().len()
            )));
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "BattlePathGenerator"
    }
}

/// Generates the battle path for `seed` with the default factory and band sizes.
///
/// # Examples
///
/// ```
/// let path = wavepath::generate("ABC123", 100).unwrap();
/// assert_eq!(path.total_waves(), 100);
/// assert!(path.diagnostics().is_empty());
/// ```
pub fn generate(seed: &str, total_waves: u32) -> WavepathResult<BattlePath> {
    let config = GenerationConfig::new(seed, total_waves);
    generate_with_config(&config)
}

/// Generates the battle path described by `config` with the default factory.
pub fn generate_with_config(config: &GenerationConfig) -> WavepathResult<BattlePath> {
    let mut rng = utils::create_rng(config);
    BattlePathGenerator::new().generate(config, &mut rng)
}
