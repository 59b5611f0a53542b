//! Configuration module for a harvest run
//!
//! This module provides the `HarvestConfig` struct and its type-safe builder
//! with validation and sensible defaults.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod methods;
pub mod types;

// Re-exports for public API
pub use builder::{Complete, HarvestConfigBuilder, WithRegistry};
pub use types::HarvestConfig;
