//! A colony of individuals of one species.
//!
//! Individuals are columns: of the resource matrix, of every gene's signal
//! matrix, and entries of the location list. Structural changes (death,
//! cloning) rebuild those arrays by gathering columns, so the three always
//! stay the same width.

use crate::error::{check_index, EngineError, Result};
use crate::gene::Mutation;
use crate::matrix::{
    append_columns, check_len, check_shape, gather_columns, scatter_add_columns, scatter_sum,
    weighted_column_sums, Matrix, Vector,
};
use crate::species::Species;
use rand::Rng;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    species: Arc<Species>,
    resources: Matrix,
    locations: Vec<usize>,
    individual_signals: Vec<Matrix>,
    environment_signals: Vec<Matrix>,
    population_signals: Vec<Matrix>,
}

impl Population {
    /// Assembles a population, checking that every array has one column per
    /// individual and one signal matrix, of the right height, per gene.
    pub fn new(
        species: Arc<Species>,
        resources: Matrix,
        locations: Vec<usize>,
        individual_signals: Vec<Matrix>,
        environment_signals: Vec<Matrix>,
        population_signals: Vec<Matrix>,
    ) -> Result<Self> {
        let individuals = resources.ncols();
        if locations.len() != individuals {
            return Err(EngineError::shape(
                "population locations",
                (individuals, 1),
                (locations.len(), 1),
            ));
        }
        let [ind, env, pop] = species.signal_counts();
        for (counts, signals) in [
            (&ind, &individual_signals),
            (&env, &environment_signals),
            (&pop, &population_signals),
        ] {
            if counts.len() != signals.len() {
                return Err(EngineError::shape(
                    "population signal matrices",
                    (counts.len(), 1),
                    (signals.len(), 1),
                ));
            }
            for (&rows, m) in counts.iter().zip(signals) {
                check_shape("population signals", m, rows, individuals)?;
            }
        }
        Ok(Self {
            species,
            resources,
            locations,
            individual_signals,
            environment_signals,
            population_signals,
        })
    }

    /// A population with no individuals.
    pub fn empty(species: Arc<Species>, resource_count: usize) -> Result<Self> {
        let [ind, env, pop] = species.signal_counts();
        let zeros = |counts: Vec<usize>| -> Vec<Matrix> {
            counts.into_iter().map(|r| Matrix::zeros((r, 0))).collect()
        };
        Self::new(
            species,
            Matrix::zeros((resource_count, 0)),
            Vec::new(),
            zeros(ind),
            zeros(env),
            zeros(pop),
        )
    }

    /// Seeds `count` identical individuals on uniformly random cells with
    /// uniformly random signals.
    pub fn random<R: Rng + ?Sized>(
        species: Arc<Species>,
        count: usize,
        cell_count: usize,
        resources_per_individual: &Vector,
        rng: &mut R,
    ) -> Result<Self> {
        if cell_count == 0 {
            return Err(EngineError::EmptySelection("Population::random cells"));
        }
        let rows = resources_per_individual.len();
        let resources = Matrix::from_shape_fn((rows, count), |(r, _)| resources_per_individual[r]);
        let locations = (0..count).map(|_| rng.gen_range(0..cell_count)).collect();
        let [ind, env, pop] = species.signal_counts();
        let mut signals = |counts: Vec<usize>| -> Vec<Matrix> {
            counts
                .into_iter()
                .map(|r| Matrix::from_shape_simple_fn((r, count), || rng.gen::<f64>()))
                .collect()
        };
        let individual_signals = signals(ind);
        let environment_signals = signals(env);
        let population_signals = signals(pop);
        Self::new(
            species,
            resources,
            locations,
            individual_signals,
            environment_signals,
            population_signals,
        )
    }

    #[must_use]
    pub fn species(&self) -> &Arc<Species> {
        &self.species
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    #[must_use]
    pub fn resources(&self) -> &Matrix {
        &self.resources
    }

    #[must_use]
    pub fn locations(&self) -> &[usize] {
        &self.locations
    }

    pub fn individual_signals(&self, slot: usize) -> Result<&Matrix> {
        check_index("individual gene", slot, self.individual_signals.len())?;
        Ok(&self.individual_signals[slot])
    }

    pub fn environment_signals(&self, slot: usize) -> Result<&Matrix> {
        check_index("environment gene", slot, self.environment_signals.len())?;
        Ok(&self.environment_signals[slot])
    }

    pub fn population_signals(&self, slot: usize) -> Result<&Matrix> {
        check_index("population gene", slot, self.population_signals.len())?;
        Ok(&self.population_signals[slot])
    }

    /// Adds a same-shape delta to the resource matrix in place.
    pub fn add_resources(&mut self, delta: &Matrix) -> Result<()> {
        check_shape("resource delta", delta, self.resources.nrows(), self.len())?;
        self.resources += delta;
        Ok(())
    }

    /// `Σ resources[row] * molecular_masses[row]` per individual.
    pub fn total_mass(&self, molecular_masses: &Vector) -> Result<Vector> {
        weighted_column_sums(&self.resources, molecular_masses)
    }

    /// Competing surface per individual: `mass ^ (surface_exponent / 3)`.
    pub fn surfaces(&self, molecular_masses: &Vector) -> Result<Vector> {
        let exponent = self.species.surface_exponent() / 3.0;
        Ok(self
            .total_mass(molecular_masses)?
            .mapv(|m| m.max(0.0).powf(exponent)))
    }

    /// Basal metabolism: removes `mass * rate * dt` from the energy row,
    /// flooring it at zero. Any shortfall is not carried over.
    pub fn maintain(&mut self, molecular_masses: &Vector, energy_index: usize, dt: f64) -> Result<()> {
        check_index("energy row", energy_index, self.resources.nrows())?;
        let rate = self.species.basal_metabolic_rate();
        let required = self.total_mass(molecular_masses)? * (rate * dt);
        let mut energy = self.resources.row_mut(energy_index);
        energy.zip_mut_with(&required, |e, &r| *e = (*e - r).max(0.0));
        Ok(())
    }

    /// Indices of individuals whose mass is below the species' surviving
    /// mass or whose energy is exhausted.
    pub fn dying(&self, molecular_masses: &Vector, energy_index: usize) -> Result<Vec<usize>> {
        check_index("energy row", energy_index, self.resources.nrows())?;
        let mass = self.total_mass(molecular_masses)?;
        let energy = self.resources.row(energy_index);
        let threshold = self.species.surviving_mass();
        Ok((0..self.len())
            .filter(|&i| mass[i] < threshold || energy[i] <= 0.0)
            .collect())
    }

    /// Removes dying individuals, returning their whole resource columns to
    /// the environment at their cells. Survivors keep their columns intact
    /// and in order. Returns the new population and the number of deaths.
    pub fn survive(
        self,
        molecular_masses: &Vector,
        energy_index: usize,
        environment: &mut Matrix,
    ) -> Result<(Population, usize)> {
        let dead = self.dying(molecular_masses, energy_index)?;
        if dead.is_empty() {
            return Ok((self, 0));
        }
        let dead_resources = gather_columns(&self.resources, &dead)?;
        let dead_locations: Vec<usize> = dead.iter().map(|&i| self.locations[i]).collect();
        scatter_add_columns(environment, &dead_resources, &dead_locations)?;

        let mut is_dead = vec![false; self.len()];
        for &i in &dead {
            is_dead[i] = true;
        }
        let survivors: Vec<usize> = (0..self.len()).filter(|&i| !is_dead[i]).collect();
        Ok((self.select(&survivors)?, dead.len()))
    }

    /// Keeps only the listed individuals, in the given order.
    pub fn select(&self, columns: &[usize]) -> Result<Population> {
        for &c in columns {
            check_index("individual", c, self.len())?;
        }
        let gather_all = |signals: &[Matrix]| -> Result<Vec<Matrix>> {
            signals.iter().map(|m| gather_columns(m, columns)).collect()
        };
        Ok(Population {
            species: Arc::clone(&self.species),
            resources: gather_columns(&self.resources, columns)?,
            locations: columns.iter().map(|&c| self.locations[c]).collect(),
            individual_signals: gather_all(&self.individual_signals)?,
            environment_signals: gather_all(&self.environment_signals)?,
            population_signals: gather_all(&self.population_signals)?,
        })
    }

    /// Clones each listed parent once.
    ///
    /// A child receives `fraction` of its parent's resource vector plus up
    /// to `energy` more of the energy row, limited by what the parent keeps
    /// after the fraction. Everything the child receives is debited from the
    /// parent. Children's signals are mutated copies of their parents' and
    /// are appended after the existing individuals. `fraction` must lie in
    /// `[0, 1)` and each parent may appear once.
    #[allow(clippy::too_many_arguments)]
    pub fn perform_clone<R: Rng + ?Sized>(
        mut self,
        parents: &[usize],
        child_locations: &[usize],
        fraction: f64,
        energy: f64,
        energy_index: usize,
        mutation: &Mutation,
        rng: &mut R,
    ) -> Result<Population> {
        if parents.is_empty() {
            return Err(EngineError::EmptySelection("perform_clone"));
        }
        if child_locations.len() != parents.len() {
            return Err(EngineError::shape(
                "clone locations",
                (parents.len(), 1),
                (child_locations.len(), 1),
            ));
        }
        check_index("energy row", energy_index, self.resources.nrows())?;
        if !(0.0..1.0).contains(&fraction) {
            return Err(EngineError::config(format!(
                "offspring fraction must lie in [0, 1), got {fraction}"
            )));
        }
        if !energy.is_finite() || energy < 0.0 {
            return Err(EngineError::config(format!(
                "offspring energy must be non-negative, got {energy}"
            )));
        }
        let mut seen = vec![false; self.len()];
        for &parent in parents {
            check_index("clone parent", parent, self.len())?;
            if std::mem::replace(&mut seen[parent], true) {
                return Err(EngineError::config(format!(
                    "parent {parent} listed twice for cloning"
                )));
            }
        }

        let parent_resources = gather_columns(&self.resources, parents)?;
        let mut children = &parent_resources * fraction;
        for j in 0..parents.len() {
            let kept = parent_resources[[energy_index, j]] - children[[energy_index, j]];
            children[[energy_index, j]] += energy.min(kept).max(0.0);
        }
        for (j, &parent) in parents.iter().enumerate() {
            let mut column = self.resources.column_mut(parent);
            column -= &children.column(j);
        }

        let mut clone_all = |signals: &[Matrix]| -> Result<Vec<Matrix>> {
            signals
                .iter()
                .map(|m| {
                    let child = mutation.clone_signals(&gather_columns(m, parents)?, rng)?;
                    append_columns(m, &child)
                })
                .collect()
        };
        let individual_signals = clone_all(&self.individual_signals)?;
        let environment_signals = clone_all(&self.environment_signals)?;
        let population_signals = clone_all(&self.population_signals)?;

        self.resources = append_columns(&self.resources, &children)?;
        self.locations.extend_from_slice(child_locations);
        self.individual_signals = individual_signals;
        self.environment_signals = environment_signals;
        self.population_signals = population_signals;
        Ok(self)
    }

    /// Number of distinct cells holding at least one individual.
    #[must_use]
    pub fn occupied_cells(&self) -> usize {
        let mut cells = self.locations.clone();
        cells.sort_unstable();
        cells.dedup();
        cells.len()
    }
}

/// Each individual's fraction of the total competing surface in its cell,
/// counting every population that shares the cell. One vector per
/// population, in order. Cells with no surface give a zero share.
pub fn distribution_shares(
    populations: &[Population],
    molecular_masses: &Vector,
    cell_count: usize,
) -> Result<Vec<Vector>> {
    let surfaces = populations
        .iter()
        .map(|p| p.surfaces(molecular_masses))
        .collect::<Result<Vec<_>>>()?;

    let mut totals = Vector::zeros(cell_count);
    for (population, surface) in populations.iter().zip(&surfaces) {
        totals += &scatter_sum(surface, population.locations(), cell_count)?;
    }

    populations
        .iter()
        .zip(surfaces)
        .map(|(population, surface)| {
            check_len("surface", &surface, population.len())?;
            Ok(surface
                .iter()
                .zip(population.locations())
                .map(|(&s, &cell)| {
                    let total = totals[cell];
                    if total > 0.0 {
                        s / total
                    } else {
                        0.0
                    }
                })
                .collect())
        })
        .collect()
}
