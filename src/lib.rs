//! # Wavepath
//!
//! Seeded generation of branching battle paths for wave-based roguelike runs.
//!
//! ## Architecture Overview
//!
//! A run is a sequence of waves. Every wave offers up to four nodes (lanes) and edges
//! lead from one wave to the next, so a path is a layered directed graph the player
//! walks one wave at a time. Generation is deterministic: the same seed always
//! produces the same path.
//!
//! - **Seed Scopes**: hash-derived subseeds and a scoped random source that restores
//!   its state when a scope ends
//! - **Special-Wave Scheduling**: rivals, bosses, elite four and evil-team arcs placed
//!   on distinct waves
//! - **Layer Building**: special, convergence, challenge and filler nodes
//! - **Connection**: crossing-aware edge routing with a global repair pass
//! - **Validation**: read-only structural checks reported as diagnostics
//!
//! ## Quick Start
//!
//! ```
//! use wavepath::{generate, GenerationContext};
//!
//! let path = generate("ABC123", 60).unwrap();
//! let mut context = GenerationContext::new(path);
//! let first = context.available_paths_from(1)[0].id.clone();
//! assert!(context.select_path(&first));
//! ```

pub mod generation;
pub mod path;
pub mod utils;

// Core module re-exports
pub use generation::*;
pub use path::*;
pub use utils::*;

/// Core error type for path generation.
#[derive(thiserror::Error, Debug)]
pub enum WavepathError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Generation cannot start from the given configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A graph or stored path is structurally inconsistent
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Result type used throughout the crate.
pub type WavepathResult<T> = Result<T, WavepathError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Generation configuration constants.
pub mod config {
    /// Default number of waves per layer
    pub const DEFAULT_LAYER_SIZE: u32 = 20;

    /// Number of waves per scheduling segment
    pub const SEGMENT_SIZE: u32 = 500;

    /// Number of rival identities the scheduler draws from
    pub const RIVAL_POOL_SIZE: u32 = 12;

    /// Default seed used by the command line when none is given
    pub const DEFAULT_SEED: &str = "WAVEPATH";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let error = WavepathError::Configuration("Seed must not be empty".to_string());
        assert_eq!(error.to_string(), "Invalid configuration: Seed must not be empty");

        let json_error = serde_json::from_str::<BattlePath>("{").unwrap_err();
        let error: WavepathError = json_error.into();
        assert!(matches!(error, WavepathError::Serde(_)));
    }

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
