//! # Utilities Module
//!
//! Seed derivation and the scoped random source every generation stage draws from.

pub mod seed;

pub use seed::*;
