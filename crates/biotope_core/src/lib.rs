//! # Biotope Core
//!
//! The simulation engine for Biotope, an evolving-ecosystem simulation.
//!
//! Populations of individuals live on the cells of a diffusion topology,
//! exchange matter and energy with their cell following reaction kinetics
//! steered by genetically encoded set-points, clone with mutation, and die
//! when they starve.
//!
//! ## Architecture
//!
//! - **Column arenas**: a population is a set of `ndarray` matrices whose
//!   columns are individuals; structural changes gather columns.
//! - **Closed gene family**: individual, environment and population genes
//!   are enums dispatched from each species' ordered gene lists.
//! - **Fixed pipeline**: [`engine::SimulationEngine::next`] runs the phases
//!   in [`systems`] in a fixed order.
//! - **Deterministic simulation**: all randomness comes from a caller RNG.
//!
//! ## Example
//!
//! ```
//! use biotope_core::signal::SignalLevels;
//!
//! let levels = SignalLevels::new(1.0, 100.0).unwrap();
//! assert!((levels.decode(0.5) - 10.0).abs() < 1e-9);
//! assert!((levels.encode(10.0) - 0.5).abs() < 1e-9);
//! ```

/// Engine and session configuration loaded from TOML
pub mod config;
/// Per-step orchestration
pub mod engine;
/// Error types
pub mod error;
/// Genes decoding signals into process set-points
pub mod gene;
/// ndarray helpers for column arenas
pub mod matrix;
/// Performance metrics collection and logging
pub mod metrics;
/// Colony state and lifecycle operations
pub mod population;
/// Target-level process controllers
pub mod process;
/// Stoichiometric kinetics primitive
pub mod reaction;
/// Exponential signal law
pub mod signal;
/// Immutable per-kind parameters
pub mod species;
/// Simulation state at one instant
pub mod status;
/// Pipeline phases
pub mod systems;
/// Spatial cells and diffusion
pub mod topology;

pub use engine::SimulationEngine;
pub use error::{EngineError, Result};
pub use population::Population;
pub use species::Species;
pub use status::SimulationStatus;
pub use topology::Topology;
