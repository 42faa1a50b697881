//! Resource-moving phases. Individual-scoped genes only touch their own
//! population and run in parallel; exchange shares the environment matrix
//! and runs population by population.

use crate::error::{EngineError, Result};
use crate::gene::{IndividualContext, IndividualGene};
use crate::matrix::{Matrix, Vector};
use crate::population::Population;
use rayon::prelude::*;

fn check_shares(populations: &[Population], shares: &[Vector]) -> Result<()> {
    if populations.len() != shares.len() {
        return Err(EngineError::shape(
            "distribution shares",
            (populations.len(), 1),
            (shares.len(), 1),
        ));
    }
    Ok(())
}

fn run_individual_genes(
    populations: &mut [Population],
    shares: &[Vector],
    light: f64,
    dt: f64,
    photo: bool,
) -> Result<()> {
    check_shares(populations, shares)?;
    populations
        .par_iter_mut()
        .zip(shares.par_iter())
        .try_for_each(|(population, shares)| {
            let ctx = IndividualContext { shares, light, dt };
            let species = std::sync::Arc::clone(population.species());
            species
                .individual_genes()
                .iter()
                .enumerate()
                .filter(|(_, gene)| gene.is_photo() == photo)
                .try_for_each(|(slot, gene): (usize, &IndividualGene)| {
                    gene.execute(population, slot, &ctx)
                })
        })
}

/// Photo reactions: individuals compete for `light` by surface share.
pub fn photosynthesis(
    populations: &mut [Population],
    shares: &[Vector],
    light: f64,
    dt: f64,
) -> Result<()> {
    run_individual_genes(populations, shares, light, dt, true)
}

/// Internal reactions, pure kinetics.
pub fn react(populations: &mut [Population], shares: &[Vector], dt: f64) -> Result<()> {
    run_individual_genes(populations, shares, 0.0, dt, false)
}

/// Exchanges with the environment. Every gene's individual and environment
/// deltas cancel cell by cell.
pub fn exchange(
    populations: &mut [Population],
    environment: &mut Matrix,
    shares: &[Vector],
) -> Result<()> {
    check_shares(populations, shares)?;
    for (population, shares) in populations.iter_mut().zip(shares) {
        let species = std::sync::Arc::clone(population.species());
        for (slot, gene) in species.environment_genes().iter().enumerate() {
            gene.execute(population, slot, environment, shares)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gene::{EnvironmentGene, ExchangeResourceGene, PhotoResourceGene, ResourceGene};
    use crate::process::{ExchangeResourcesProcess, PhotoReactionProcess, ReactionProcess};
    use crate::reaction::Reaction;
    use crate::signal::SignalLevels;
    use crate::species::Species;
    use ndarray::{array, Axis};
    use std::sync::Arc;

    fn levels() -> SignalLevels {
        SignalLevels::new(1.0, 100.0).unwrap()
    }

    /// Row 0 matter, row 1 energy. Photo converts nothing into energy;
    /// the reaction burns matter into energy.
    fn species() -> Arc<Species> {
        let photo = Reaction::new(&[0.0, 0.0], &[0.0, 1.0], &[0.0; 2], &[0.0; 2]).unwrap();
        let burn = Reaction::new(&[1.0, 0.0], &[0.0, 1.0], &[0.0; 2], &[0.0; 2]).unwrap();
        Arc::new(
            Species::new("lichen", 0.0, 0.0, 3.0)
                .unwrap()
                .with_individual_gene(IndividualGene::PhotoResource(PhotoResourceGene::new(
                    PhotoReactionProcess::new(photo, 1).unwrap(),
                    levels(),
                )))
                .with_individual_gene(IndividualGene::Resource(ResourceGene::new(
                    ReactionProcess::new(burn, 1).unwrap(),
                    levels(),
                )))
                .with_environment_gene(EnvironmentGene::ExchangeResource(
                    ExchangeResourceGene::new(
                        ExchangeResourcesProcess::new(vec![0], 2).unwrap(),
                        vec![levels()],
                    )
                    .unwrap(),
                )),
        )
    }

    fn population() -> Population {
        Population::new(
            species(),
            array![[5.0, 5.0], [0.0, 0.0]],
            vec![0, 1],
            vec![array![[1.0, 1.0]], array![[0.0, 0.0]]],
            vec![array![[1.0, 0.0]]],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn test_photosynthesis_only_runs_photo_genes() {
        let mut pops = vec![population()];
        let shares = vec![array![1.0, 0.5]];
        photosynthesis(&mut pops, &shares, 10.0, 0.1).unwrap();
        assert_eq!(pops[0].resources().row(0), array![5.0, 5.0]);
        assert!((pops[0].resources()[[1, 0]] - 1.0).abs() < 1e-12);
        assert!((pops[0].resources()[[1, 1]] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_react_skips_photo_genes() {
        let mut pops = vec![population()];
        let shares = vec![array![1.0, 1.0]];
        react(&mut pops, &shares, 0.1).unwrap();
        // target is 1.0 energy, kinetics are unbounded here
        assert!((pops[0].resources()[[1, 0]] - 1.0).abs() < 1e-12);
        assert!((pops[0].resources()[[0, 0]] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_exchange_conserves_totals() {
        let mut pops = vec![population()];
        let mut env = array![[50.0, 0.0], [0.0, 0.0]];
        let before = env.sum_axis(Axis(1)) + pops[0].resources().sum_axis(Axis(1));
        exchange(&mut pops, &mut env, &[array![1.0, 1.0]]).unwrap();
        let after = env.sum_axis(Axis(1)) + pops[0].resources().sum_axis(Axis(1));
        assert!((&before - &after).iter().all(|d| d.abs() < 1e-9));
        // first individual wants 100, second releases down to 1
        assert!(pops[0].resources()[[0, 0]] > 5.0);
        assert!((pops[0].resources()[[0, 1]] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_share_count_mismatch() {
        let mut pops = vec![population()];
        assert!(react(&mut pops, &[], 0.1).is_err());
    }
}
