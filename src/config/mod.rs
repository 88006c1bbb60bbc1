//! Runtime configuration.
//!
//! Timing, bounds and presentation heuristics for the sync layer, loaded
//! from an optional JSON file plus environment overrides.

pub mod settings;

pub use settings::*;
