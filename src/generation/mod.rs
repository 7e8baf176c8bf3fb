//! # Generation Module
//!
//! Seeded generation of battle paths: special-wave scheduling, layer and challenge
//! construction, edge routing and integrity checking.
//!
//! Every stage draws its randomness from a [`SeedRng`](crate::SeedRng) scope keyed by
//! a subseed derived from the root seed, so a run is fully reproducible from its
//! [`GenerationConfig`].

pub mod battle_path;
pub mod battles;
pub mod challenge;
pub mod connector;
pub mod layers;
pub mod schedule;
pub mod validator;

pub use battle_path::*;
pub use battles::*;
pub use challenge::*;
pub use connector::*;
pub use layers::*;
pub use schedule::*;
pub use validator::*;

use crate::{config, SeedRng, WavepathError, WavepathResult};
use serde::{Deserialize, Serialize};

/// Run length presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    /// A single 500-wave segment
    Standard,
    /// Two 500-wave segments ending on a milestone battle
    Extended,
}

impl RunMode {
    /// Number of waves in a run of this mode.
    pub fn total_waves(self) -> u32 {
        match self {
            RunMode::Standard => 500,
            RunMode::Extended => 1000,
        }
    }
}

/// Configuration for path generation.
///
/// Controls the seed, the extent of the run and the band sizes used to split it
/// into segments and layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Root seed every subseed is derived from
    pub seed: String,
    /// Number of waves in the run
    pub total_waves: u32,
    /// First wave that gets nodes
    pub start_wave: u32,
    /// Waves per layer; every layer ends on a convergence wave
    pub layer_size: u32,
    /// Waves per scheduling segment
    pub segment_size: u32,
    /// Rival identities available to the rival selection
    #[serde(default = "default_rival_pool_size")]
    pub rival_pool_size: u32,
}

fn default_rival_pool_size() -> u32 {
    config::RIVAL_POOL_SIZE
}

impl GenerationConfig {
    /// Creates a configuration with default band sizes.
    ///
    /// # Examples
    ///
    /// ```
    /// use wavepath::GenerationConfig;
    ///
    /// let config = GenerationConfig::new("ABC123", 500);
    /// assert_eq!(config.start_wave, 1);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(seed: impl Into<String>, total_waves: u32) -> Self {
        Self {
            seed: seed.into(),
            total_waves,
            start_wave: 1,
            layer_size: config::DEFAULT_LAYER_SIZE,
            segment_size: config::SEGMENT_SIZE,
            rival_pool_size: config::RIVAL_POOL_SIZE,
        }
    }

    /// Creates a configuration for one of the run presets.
    pub fn for_mode(seed: impl Into<String>, mode: RunMode) -> Self {
        Self::new(seed, mode.total_waves())
    }

    /// Creates a short configuration for testing.
    pub fn for_testing(seed: impl Into<String>) -> Self {
        Self::new(seed, 120)
    }

    /// Sets the first wave that gets nodes.
    pub fn with_start_wave(mut self, start_wave: u32) -> Self {
        self.start_wave = start_wave;
        self
    }

    /// Sets the layer size.
    pub fn with_layer_size(mut self, layer_size: u32) -> Self {
        self.layer_size = layer_size;
        self
    }

    /// Sets how many rival identities the rival selection draws from.
    pub fn with_rival_pool_size(mut self, rival_pool_size: u32) -> Self {
        self.rival_pool_size = rival_pool_size;
        self
    }

    /// Rejects configurations generation cannot start from.
    pub fn validate(&self) -> WavepathResult<()> {
        if self.seed.trim().is_empty() {
            return Err(WavepathError::Configuration(
                "Seed must not be empty".to_string(),
            ));
        }
        if self.total_waves == 0 {
            return Err(WavepathError::Configuration(
                "Total wave count must be positive".to_string(),
            ));
        }
        if self.layer_size == 0 || self.segment_size == 0 {
            return Err(WavepathError::Configuration(
                "Layer and segment sizes must be positive".to_string(),
            ));
        }
        let rivals = rival_count(self.total_waves);
        if self.rival_pool_size < rivals {
            return Err(WavepathError::Configuration(format!(
                "Rival pool of {} cannot supply {} distinct rivals",
                self.rival_pool_size, rivals
            )));
        }
        if self.start_wave == 0 || self.start_wave > self.total_waves {
            return Err(WavepathError::Configuration(format!(
                "Start wave {} is outside the run 1..={}",
                self.start_wave, self.total_waves
            )));
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::for_mode("DEFAULT", RunMode::Standard)
    }
}

/// Trait for seeded generators.
///
/// Every generation stage that produces a self-contained value implements this
/// trait, so stages share one calling convention and can be validated in isolation.
pub trait Generator<T> {
    /// Generates content from the configuration and the seeded random source.
    fn generate(&self, config: &GenerationConfig, rng: &mut SeedRng) -> WavepathResult<T>;

    /// Validates that generated content meets its requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> WavepathResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions shared by the generation stages.
pub mod utils {
    use super::*;

    /// Creates the root random source for a configuration.
    pub fn create_rng(config: &GenerationConfig) -> SeedRng {
        SeedRng::from_root(&config.seed)
    }

    /// Maps a percentage window of a segment to an inclusive wave range.
    ///
    /// # Examples
    ///
    /// ```
    /// use wavepath::generation::utils::percent_window;
    ///
    /// assert_eq!(percent_window(1, 500, 8, 20), (41, 100));
    /// assert_eq!(percent_window(501, 500, 0, 8), (501, 540));
    /// ```
    pub fn percent_window(segment_start: u32, segment_len: u32, low_pct: u32, high_pct: u32) -> (u32, u32) {
        let start = segment_start + segment_len * low_pct / 100;
        let end = segment_start + segment_len * high_pct / 100;
        let last = segment_start + segment_len - 1;
        (start.min(last), end.saturating_sub(1).max(start).min(last))
    }

    /// Inclusive `(start, end)` bounds of every segment of a run.
    pub fn segments(total_waves: u32, segment_size: u32) -> Vec<(u32, u32)> {
        let mut bounds = Vec::new();
        let mut start = 1;
        while start <= total_waves {
            let end = (start + segment_size - 1).min(total_waves);
            bounds.push((start, end));
            start = end + 1;
        }
        bounds
    }

    /// Inclusive `(start, end)` bounds of every layer between `start_wave` and the
    /// final wave. Layers end on multiples of `layer_size` or on the final wave.
    pub fn layer_bounds(start_wave: u32, total_waves: u32, layer_size: u32) -> Vec<(u32, u32)> {
        let mut bounds = Vec::new();
        let mut start = start_wave;
        while start <= total_waves {
            let next_boundary = (start + layer_size - 1) / layer_size * layer_size;
            let end = next_boundary.max(start).min(total_waves);
            bounds.push((start, end));
            start = end + 1;
        }
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config_creation() {
        let config = GenerationConfig::new("SEED", 500);
        assert_eq!(config.seed, "SEED");
        assert_eq!(config.total_waves, 500);
        assert_eq!(config.layer_size, config::DEFAULT_LAYER_SIZE);
        assert_eq!(config.segment_size, config::SEGMENT_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mode_presets() {
        assert_eq!(GenerationConfig::for_mode("A", RunMode::Standard).total_waves, 500);
        assert_eq!(GenerationConfig::for_mode("A", RunMode::Extended).total_waves, 1000);
    }

    #[test]
    fn test_invalid_configurations() {
        let cases = [
            GenerationConfig::new("", 500),
            GenerationConfig::new("   ", 500),
            GenerationConfig::new("SEED", 0),
            GenerationConfig::new("SEED", 500).with_layer_size(0),
            GenerationConfig::new("SEED", 500).with_start_wave(0),
            GenerationConfig::new("SEED", 500).with_start_wave(501),
            GenerationConfig::new("SEED", 500).with_rival_pool_size(4),
            GenerationConfig::new("SEED", 1000).with_rival_pool_size(9),
        ];
        for config in cases {
            assert!(matches!(
                config.validate(),
                Err(WavepathError::Configuration(_))
            ));
        }
    }

    #[test]
    fn test_rival_pool_must_cover_every_rival() {
        assert!(GenerationConfig::new("SEED", 500).with_rival_pool_size(5).validate().is_ok());
        assert!(GenerationConfig::new("SEED", 1000).with_rival_pool_size(10).validate().is_ok());
    }

    #[test]
    fn test_segments_split_run() {
        assert_eq!(utils::segments(500, 500), vec![(1, 500)]);
        assert_eq!(utils::segments(1000, 500), vec![(1, 500), (501, 1000)]);
        assert_eq!(utils::segments(650, 500), vec![(1, 500), (501, 650)]);
    }

    #[test]
    fn test_layer_bounds_end_on_multiples() {
        assert_eq!(
            utils::layer_bounds(1, 45, 20),
            vec![(1, 20), (21, 40), (41, 45)]
        );
        assert_eq!(utils::layer_bounds(15, 40, 20), vec![(15, 20), (21, 40)]);
        assert_eq!(utils::layer_bounds(20, 21, 20), vec![(20, 20), (21, 21)]);
    }

    #[test]
    fn test_percent_window_stays_inside_segment() {
        let (start, end) = utils::percent_window(1, 500, 70, 95);
        assert_eq!((start, end), (351, 475));
        let (start, end) = utils::percent_window(1, 100, 90, 100);
        assert_eq!((start, end), (91, 100));
        let (start, end) = utils::percent_window(1, 10, 0, 5);
        assert!(start <= end);
    }

    #[test]
    fn test_create_rng_is_deterministic() {
        let config = GenerationConfig::new("SAME", 100);
        let mut a = utils::create_rng(&config);
        let mut b = utils::create_rng(&config);
        assert_eq!(a.rand_int(1_000_000), b.rand_int(1_000_000));
    }
}
