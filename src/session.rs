//! Builds a ready-to-run world from an [`EngineConfig`].

use biotope_core::config::EngineConfig;
use biotope_core::gene::{
    CloneGene, EnvironmentGene, ExchangeResourceGene, IndividualGene, Mutation, PhotoResourceGene,
    PopulationGene, ResourceGene,
};
use biotope_core::matrix::{Matrix, Vector};
use biotope_core::process::{ExchangeResourcesProcess, PhotoReactionProcess, ReactionProcess};
use biotope_core::reaction::Reaction;
use biotope_core::signal::SignalLevels;
use biotope_core::{EngineError, Population, Result, SimulationEngine, SimulationStatus, Species};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

/// Matter and energy each individual starts with.
const INITIAL_MATTER: f64 = 5.0;
const INITIAL_ENERGY: f64 = 5.0;

/// An engine plus the status it will advance.
#[derive(Debug)]
pub struct Session {
    pub engine: SimulationEngine,
    pub status: SimulationStatus,
    pub species: Vec<Arc<Species>>,
}

/// Seeded from `engine.seed` when set, from seed 0 when the run must be
/// deterministic, from entropy otherwise.
#[must_use]
pub fn rng_for(config: &EngineConfig) -> ChaCha8Rng {
    match (config.engine.seed, config.engine.deterministic) {
        (Some(seed), _) => ChaCha8Rng::seed_from_u64(seed),
        (None, true) => ChaCha8Rng::seed_from_u64(0),
        (None, false) => ChaCha8Rng::from_entropy(),
    }
}

impl Session {
    /// Two competing species on the configured honeycomb:
    ///
    /// - `phototroph` turns light into energy and absorbs matter from its cell;
    /// - `chemotroph` absorbs matter and burns the first matter resource.
    ///
    /// Both clone with mutation into random neighbouring cells.
    pub fn demo<R: Rng + ?Sized>(config: &EngineConfig, rng: &mut R) -> Result<Self> {
        let engine = SimulationEngine::from_config(config)?;
        let rows = config.resource_count();
        let energy = config.engine.energy_index;
        let matter: Vec<usize> = (0..rows).filter(|&r| r != energy).collect();
        if matter.is_empty() {
            return Err(EngineError::config(
                "the demo world needs at least one resource besides energy",
            ));
        }
        let choices = engine.topology().neighbors_per_cell() + 1;

        let phototroph = Arc::new(
            Species::new("phototroph", 0.05, 1.0, 2.0)?
                .with_individual_gene(IndividualGene::PhotoResource(photo_gene(rows, energy)?))
                .with_environment_gene(EnvironmentGene::ExchangeResource(uptake_gene(
                    &matter, rows,
                )?))
                .with_population_gene(PopulationGene::Clone(clone_gene(choices)?)),
        );
        let chemotroph = Arc::new(
            Species::new("chemotroph", 0.08, 1.0, 2.5)?
                .with_individual_gene(IndividualGene::Resource(burn_gene(&matter, rows, energy)?))
                .with_environment_gene(EnvironmentGene::ExchangeResource(uptake_gene(
                    &matter, rows,
                )?))
                .with_population_gene(PopulationGene::Clone(clone_gene(choices)?)),
        );

        let cells = engine.topology().cell_count();
        let starting = Vector::from_shape_fn(rows, |r| {
            if r == energy {
                INITIAL_ENERGY
            } else {
                INITIAL_MATTER
            }
        });
        let count = config.session.initial_individuals;
        let populations = vec![
            Population::random(Arc::clone(&phototroph), count, cells, &starting, rng)?,
            Population::random(Arc::clone(&chemotroph), count, cells, &starting, rng)?,
        ];

        let levels = &config.session.initial_environment;
        let environment = Matrix::from_shape_fn((rows, cells), |(r, _)| levels[r]);
        let status = SimulationStatus::new(engine.topology(), environment, populations, 0.0)?;

        tracing::info!(
            cells,
            resources = rows,
            individuals = status.individuals(),
            "demo session ready"
        );
        Ok(Self {
            engine,
            status,
            species: vec![phototroph, chemotroph],
        })
    }
}

/// Light straight into energy, up to an energy set-point.
fn photo_gene(rows: usize, energy: usize) -> Result<PhotoResourceGene> {
    let mut products = vec![0.0; rows];
    products[energy] = 1.0;
    let reaction = Reaction::new(&vec![0.0; rows], &products, &vec![0.0; rows], &vec![0.0; rows])?;
    Ok(PhotoResourceGene::new(
        PhotoReactionProcess::new(reaction, energy)?,
        SignalLevels::new(1.0, 30.0)?,
    ))
}

/// First matter resource into the second (if any) plus energy.
fn burn_gene(matter: &[usize], rows: usize, energy: usize) -> Result<ResourceGene> {
    let mut reagents = vec![0.0; rows];
    let mut products = vec![0.0; rows];
    let mut speeds = vec![0.0; rows];
    reagents[matter[0]] = 1.0;
    speeds[matter[0]] = 0.5;
    if let Some(&waste) = matter.get(1) {
        products[waste] = 1.0;
    }
    products[energy] = 1.0;
    let reaction = Reaction::new(&reagents, &products, &vec![0.5; rows], &speeds)?;
    Ok(ResourceGene::new(
        ReactionProcess::new(reaction, energy)?,
        SignalLevels::new(1.0, 30.0)?,
    ))
}

fn uptake_gene(matter: &[usize], rows: usize) -> Result<ExchangeResourceGene> {
    let levels = SignalLevels::new(1.0, 50.0)?;
    ExchangeResourceGene::new(
        ExchangeResourcesProcess::new(matter.to_vec(), rows)?,
        vec![levels; matter.len()],
    )
}

fn clone_gene(choices: usize) -> Result<CloneGene> {
    CloneGene::new(
        SignalLevels::new(2.0, 40.0)?,
        SignalLevels::new(1.0, 20.0)?,
        SignalLevels::new(0.01, 1.0)?,
        SignalLevels::new(0.01, 1.0)?,
        0.5,
        1.0,
        vec![1.0; choices],
        Mutation::new(0.1, 0.05)?,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use biotope_core::config::{EngineSection, ResourceConfig, SessionConfig};

    #[test]
    fn test_demo_builds_two_species() {
        let config = EngineConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let session = Session::demo(&config, &mut rng).unwrap();
        assert_eq!(session.status.populations.len(), 2);
        assert_eq!(session.status.individuals(), 80);
        assert_eq!(session.status.environment.dim(), (3, 128));
        assert_eq!(session.species[0].name(), "phototroph");
        assert!(session.engine.check_status(&session.status).is_ok());
    }

    #[test]
    fn test_demo_needs_matter() {
        let config = EngineConfig {
            engine: EngineSection {
                energy_index: 0,
                ..Default::default()
            },
            resources: ResourceConfig {
                names: vec!["energy".into()],
                molecular_masses: vec![0.0],
                diffusion: vec![0.0],
            },
            session: SessionConfig {
                initial_environment: vec![0.0],
                ..Default::default()
            },
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(Session::demo(&config, &mut rng).is_err());
    }

    #[test]
    fn test_rng_for_is_seeded() {
        let config = EngineConfig {
            engine: EngineSection {
                seed: Some(9),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(rng_for(&config).gen::<u64>(), rng_for(&config).gen::<u64>());
    }
}
