//! Genes: decoded signals driving the process controllers.
//!
//! Each gene owns its `(min_level, max_level)` pairs and a process
//! controller. A population stores one signal matrix per gene, rows =
//! [`signal_count`](IndividualGene::signal_count), columns = individuals.
//! The three scopes form closed enums dispatched from a species' ordered
//! gene lists:
//!
//! - [`IndividualGene`] changes only the individual's own resources.
//! - [`EnvironmentGene`] moves resources between individuals and their cell.
//! - [`PopulationGene`] changes the population itself (cloning).

mod clone;
mod environment;
mod individual;

pub use clone::{CloneGene, Mutation};
pub use environment::ExchangeResourceGene;
pub use individual::{PhotoResourceGene, ResourceGene};

use crate::error::Result;
use crate::matrix::{Matrix, Vector};
use crate::population::Population;
use crate::topology::Topology;
use rand::Rng;

/// Per-step inputs shared by every individual-scoped gene.
#[derive(Debug, Clone, Copy)]
pub struct IndividualContext<'a> {
    /// Each individual's fraction of the competing surface in its cell.
    pub shares: &'a Vector,
    /// Shared photo flux per unit time per cell.
    pub light: f64,
    pub dt: f64,
}

/// Inputs for population-scoped genes.
#[derive(Debug, Clone, Copy)]
pub struct PopulationContext<'a> {
    pub topology: &'a Topology,
    pub molecular_masses: &'a Vector,
    pub energy_index: usize,
    pub dt: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndividualGene {
    Resource(ResourceGene),
    PhotoResource(PhotoResourceGene),
}

impl IndividualGene {
    #[must_use]
    pub fn signal_count(&self) -> usize {
        match self {
            Self::Resource(g) => g.signal_count(),
            Self::PhotoResource(g) => g.signal_count(),
        }
    }

    #[must_use]
    pub fn is_photo(&self) -> bool {
        matches!(self, Self::PhotoResource(_))
    }

    /// Number of resource rows the gene's reaction expects.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        match self {
            Self::Resource(g) => g.resource_count(),
            Self::PhotoResource(g) => g.resource_count(),
        }
    }

    /// Applies the gene to `population`'s resources in place, reading the
    /// signal matrix stored at `slot`.
    pub fn execute(
        &self,
        population: &mut Population,
        slot: usize,
        ctx: &IndividualContext<'_>,
    ) -> Result<()> {
        let delta = {
            let signals = population.individual_signals(slot)?;
            match self {
                Self::Resource(g) => g.compute_changes(population.resources(), signals, ctx.dt)?,
                Self::PhotoResource(g) => g.compute_changes(
                    population.resources(),
                    signals,
                    ctx.shares,
                    ctx.light,
                    ctx.dt,
                )?,
            }
        };
        population.add_resources(&delta)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnvironmentGene {
    ExchangeResource(ExchangeResourceGene),
}

impl EnvironmentGene {
    #[must_use]
    pub fn signal_count(&self) -> usize {
        match self {
            Self::ExchangeResource(g) => g.signal_count(),
        }
    }

    #[must_use]
    pub fn max_resource_row(&self) -> usize {
        match self {
            Self::ExchangeResource(g) => g.max_resource_row(),
        }
    }

    /// Exchanges resources between `population` and `environment`. Both are
    /// updated in place and the two deltas cancel cell by cell.
    pub fn execute(
        &self,
        population: &mut Population,
        slot: usize,
        environment: &mut Matrix,
        shares: &Vector,
    ) -> Result<()> {
        let changes = match self {
            Self::ExchangeResource(g) => g.compute_changes(
                population.resources(),
                population.environment_signals(slot)?,
                environment,
                population.locations(),
                shares,
            )?,
        };
        population.add_resources(&changes.individual)?;
        *environment += &changes.environment;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PopulationGene {
    Clone(CloneGene),
}

impl PopulationGene {
    #[must_use]
    pub fn signal_count(&self) -> usize {
        match self {
            Self::Clone(g) => g.signal_count(),
        }
    }

    /// Number of migration choices the gene was built for, if any.
    #[must_use]
    pub fn migration_choices(&self) -> Option<usize> {
        match self {
            Self::Clone(g) => Some(g.migration().len()),
        }
    }

    /// Runs the gene and returns the population that replaces `population`.
    pub fn execute<R: Rng + ?Sized>(
        &self,
        population: Population,
        slot: usize,
        ctx: &PopulationContext<'_>,
        rng: &mut R,
    ) -> Result<Population> {
        match self {
            Self::Clone(g) => g.execute(population, slot, ctx, rng),
        }
    }
}
