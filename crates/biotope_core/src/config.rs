//! Configuration management for engine parameters.
//!
//! Strongly-typed structures that map to a `biotope.toml` file.
//!
//! ## Example `biotope.toml`
//!
//! ```toml
//! [engine]
//! max_time_step = 0.1
//! energy_index = 2
//! seed = 42
//! deterministic = true
//!
//! [resources]
//! names = ["carbon", "nitrogen", "energy"]
//! molecular_masses = [1.0, 1.0, 0.0]
//! diffusion = [0.5, 0.2, 0.0]
//!
//! [topology]
//! width = 16
//! height = 8
//! unit_length = 1.0
//!
//! [light]
//! intensity = 4.0
//!
//! [session]
//! initial_individuals = 40
//! initial_environment = [50.0, 20.0, 0.0]
//! ```

use crate::error::{EngineError, Result};
use crate::matrix::{Matrix, Vector};
use serde::{Deserialize, Serialize};

/// Stepping and bookkeeping parameters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EngineSection {
    /// Longest time step a single pipeline pass may take.
    pub max_time_step: f64,
    /// Resource row holding energy.
    pub energy_index: usize,
    pub seed: Option<u64>,
    pub deterministic: bool,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            max_time_step: 0.1,
            energy_index: 2,
            seed: None,
            deterministic: false,
        }
    }
}

/// One entry per resource row.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResourceConfig {
    pub names: Vec<String>,
    pub molecular_masses: Vec<f64>,
    /// Diffusion coefficient of each resource through the environment.
    pub diffusion: Vec<f64>,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            names: vec!["carbon".into(), "nitrogen".into(), "energy".into()],
            molecular_masses: vec![1.0, 1.0, 0.0],
            diffusion: vec![0.5, 0.2, 0.0],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TopologyConfig {
    pub width: usize,
    pub height: usize,
    pub unit_length: f64,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            width: 16,
            height: 8,
            unit_length: 1.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LightConfig {
    /// Photo flux per unit time reaching each cell.
    pub intensity: f64,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self { intensity: 4.0 }
    }
}

/// Initial conditions used by session builders.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub initial_individuals: usize,
    /// Amount of each resource placed in every cell at time zero.
    pub initial_environment: Vec<f64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_individuals: 40,
            initial_environment: vec![50.0, 20.0, 0.0],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub resources: ResourceConfig,
    #[serde(default)]
    pub topology: TopologyConfig,
    #[serde(default)]
    pub light: LightConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

fn ensure(condition: bool, message: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(EngineError::config(message))
    }
}

impl EngineConfig {
    /// Validates all configuration parameters, reporting the first failure.
    pub fn validate(&self) -> Result<()> {
        let rows = self.resources.names.len();
        ensure(rows > 0, "At least one resource is required")?;
        ensure(
            self.resources.molecular_masses.len() == rows,
            "One molecular mass per resource is required",
        )?;
        ensure(
            self.resources.diffusion.len() == rows,
            "One diffusion coefficient per resource is required",
        )?;
        ensure(
            self.resources
                .molecular_masses
                .iter()
                .all(|m| m.is_finite() && *m >= 0.0),
            "Molecular masses must be non-negative",
        )?;
        ensure(
            self.resources
                .diffusion
                .iter()
                .all(|d| d.is_finite() && *d >= 0.0),
            "Diffusion coefficients must be non-negative",
        )?;
        ensure(
            self.engine.energy_index < rows,
            "Energy index must name a resource row",
        )?;
        ensure(
            self.engine.max_time_step.is_finite() && self.engine.max_time_step > 0.0,
            "Max time step must be positive",
        )?;
        ensure(self.topology.width >= 3, "Topology width must be at least 3")?;
        ensure(
            self.topology.height >= 2 && self.topology.height % 2 == 0,
            "Topology height must be even and at least 2",
        )?;
        ensure(
            self.topology.unit_length > 0.0,
            "Unit length must be positive",
        )?;
        let fastest = self.resources.diffusion.iter().copied().fold(0.0, f64::max);
        ensure(
            fastest * self.engine.max_time_step / self.topology.unit_length <= 0.5,
            "Max time step is too long for the diffusion coefficients",
        )?;
        ensure(
            self.light.intensity.is_finite() && self.light.intensity >= 0.0,
            "Light intensity must be non-negative",
        )?;
        ensure(
            self.session.initial_environment.len() == rows,
            "One initial environment level per resource is required",
        )?;
        ensure(
            self.session
                .initial_environment
                .iter()
                .all(|v| v.is_finite() && *v >= 0.0),
            "Initial environment levels must be non-negative",
        )?;
        Ok(())
    }

    /// Loads and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.resources.names.len()
    }

    #[must_use]
    pub fn molecular_masses(&self) -> Vector {
        Vector::from(self.resources.molecular_masses.clone())
    }

    /// Diffusion coefficients broadcast to every cell (resources x cells).
    #[must_use]
    pub fn diffusion_field(&self, cell_count: usize) -> Matrix {
        let d = &self.resources.diffusion;
        Matrix::from_shape_fn((d.len(), cell_count), |(r, _)| d[r])
    }
}
