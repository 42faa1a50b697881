use crate::error::Result;
use crate::matrix::{Matrix, Vector};
use crate::population::Population;
use rayon::prelude::*;

/// Basal metabolism for every population.
pub fn maintain(
    populations: &mut [Population],
    molecular_masses: &Vector,
    energy_index: usize,
    dt: f64,
) -> Result<()> {
    populations
        .par_iter_mut()
        .try_for_each(|p| p.maintain(molecular_masses, energy_index, dt))
}

/// Removes dead individuals from every population, returning their
/// resources to `environment`. Returns the survivors and the death count.
pub fn survive(
    populations: Vec<Population>,
    molecular_masses: &Vector,
    energy_index: usize,
    environment: &mut Matrix,
) -> Result<(Vec<Population>, usize)> {
    let mut deaths = 0;
    let mut survivors = Vec::with_capacity(populations.len());
    for population in populations {
        let (population, dead) = population.survive(molecular_masses, energy_index, environment)?;
        if dead > 0 {
            tracing::trace!(species = population.species().name(), dead, "individuals died");
        }
        deaths += dead;
        survivors.push(population);
    }
    Ok((survivors, deaths))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::Species;
    use ndarray::array;
    use std::sync::Arc;

    fn population(rate: f64, resources: Matrix, locations: Vec<usize>) -> Population {
        let species = Arc::new(Species::new("fern", rate, 1.0, 3.0).unwrap());
        Population::new(species, resources, locations, vec![], vec![], vec![]).unwrap()
    }

    #[test]
    fn test_maintain_then_survive() {
        let masses = array![1.0, 0.0];
        let mut pops = vec![
            population(0.5, array![[2.0, 4.0], [1.0, 5.0]], vec![0, 1]),
            population(0.0, array![[0.5], [1.0]], vec![1]),
        ];
        maintain(&mut pops, &masses, 1, 1.0).unwrap();
        assert_eq!(pops[0].resources().row(1), array![0.0, 3.0]);

        let mut env = Matrix::zeros((2, 2));
        let (pops, deaths) = survive(pops, &masses, 1, &mut env).unwrap();
        assert_eq!(deaths, 2);
        assert_eq!(pops[0].len(), 1);
        assert!(pops[1].is_empty());
        assert_eq!(env, array![[2.0, 0.5], [0.0, 1.0]]);
    }
}
