use crate::error::Result;
use crate::gene::PopulationContext;
use crate::population::Population;
use rand::Rng;
use std::sync::Arc;

/// Runs every population gene of every population in list order.
/// Returns the new populations and the number of births.
pub fn reproduce<R: Rng + ?Sized>(
    populations: Vec<Population>,
    ctx: &PopulationContext<'_>,
    rng: &mut R,
) -> Result<(Vec<Population>, usize)> {
    let mut births = 0;
    let mut next = Vec::with_capacity(populations.len());
    for mut population in populations {
        let before = population.len();
        let species = Arc::clone(population.species());
        for (slot, gene) in species.population_genes().iter().enumerate() {
            population = gene.execute(population, slot, ctx, rng)?;
        }
        births += population.len().saturating_sub(before);
        next.push(population);
    }
    Ok((next, births))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gene::{CloneGene, Mutation, PopulationGene};
    use crate::matrix::Matrix;
    use crate::signal::SignalLevels;
    use crate::species::Species;
    use crate::topology::Topology;
    use ndarray::{array, Axis};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn species() -> Arc<Species> {
        let low = SignalLevels::new(0.001, 0.002).unwrap();
        let fast = SignalLevels::new(1000.0, 2000.0).unwrap();
        let gene = CloneGene::new(
            low,
            low,
            fast,
            fast,
            0.5,
            1.0,
            vec![0.0, 1.0],
            Mutation::new(0.5, 0.1).unwrap(),
        )
        .unwrap();
        Arc::new(
            Species::new("yeast", 0.0, 0.0, 3.0)
                .unwrap()
                .with_population_gene(PopulationGene::Clone(gene)),
        )
    }

    #[test]
    fn test_every_rich_individual_clones_into_neighbour() {
        let topology = Topology::from_adjacency(vec![vec![1], vec![0]], 1.0).unwrap();
        let masses = array![1.0, 0.0];
        let population = Population::new(
            species(),
            array![[10.0, 10.0, 10.0], [5.0, 5.0, 5.0]],
            vec![0, 0, 1],
            vec![],
            vec![],
            vec![Matrix::from_elem((4, 3), 0.5)],
        )
        .unwrap();
        let totals = population.resources().sum_axis(Axis(1));
        let ctx = PopulationContext {
            topology: &topology,
            molecular_masses: &masses,
            energy_index: 1,
            dt: 1.0,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let (pops, births) = reproduce(vec![population], &ctx, &mut rng).unwrap();

        assert_eq!(births, 3);
        assert_eq!(pops[0].len(), 6);
        assert_eq!(&pops[0].locations()[3..], &[1, 1, 0]);
        let after = pops[0].resources().sum_axis(Axis(1));
        assert!((&totals - &after).iter().all(|d| d.abs() < 1e-9));
        let signals = pops[0].population_signals(0).unwrap();
        assert_eq!(signals.ncols(), 6);
        assert!(signals.iter().all(|s| (0.0..=1.0).contains(s)));
    }
}
