//! Immutable per-kind parameters shared by every individual of a population.

use crate::error::{EngineError, Result};
use crate::gene::{EnvironmentGene, IndividualGene, PopulationGene};

#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    name: String,
    basal_metabolic_rate: f64,
    surviving_mass: f64,
    surface_exponent: f64,
    individual_genes: Vec<IndividualGene>,
    environment_genes: Vec<EnvironmentGene>,
    population_genes: Vec<PopulationGene>,
}

impl Species {
    /// Creates a species with no genes.
    ///
    /// `surface_exponent` is the fractal dimension of the body: an
    /// individual's competing surface is `mass ^ (surface_exponent / 3)`.
    pub fn new(
        name: impl Into<String>,
        basal_metabolic_rate: f64,
        surviving_mass: f64,
        surface_exponent: f64,
    ) -> Result<Self> {
        let name = name.into();
        if !basal_metabolic_rate.is_finite() || basal_metabolic_rate < 0.0 {
            return Err(EngineError::config(format!(
                "{name}: basal metabolic rate must be non-negative"
            )));
        }
        if !surviving_mass.is_finite() || surviving_mass < 0.0 {
            return Err(EngineError::config(format!(
                "{name}: surviving mass must be non-negative"
            )));
        }
        if !surface_exponent.is_finite() || surface_exponent <= 0.0 {
            return Err(EngineError::config(format!(
                "{name}: surface exponent must be positive"
            )));
        }
        Ok(Self {
            name,
            basal_metabolic_rate,
            surviving_mass,
            surface_exponent,
            individual_genes: Vec::new(),
            environment_genes: Vec::new(),
            population_genes: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_individual_gene(mut self, gene: IndividualGene) -> Self {
        self.individual_genes.push(gene);
        self
    }

    #[must_use]
    pub fn with_environment_gene(mut self, gene: EnvironmentGene) -> Self {
        self.environment_genes.push(gene);
        self
    }

    #[must_use]
    pub fn with_population_gene(mut self, gene: PopulationGene) -> Self {
        self.population_genes.push(gene);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn basal_metabolic_rate(&self) -> f64 {
        self.basal_metabolic_rate
    }

    #[must_use]
    pub fn surviving_mass(&self) -> f64 {
        self.surviving_mass
    }

    #[must_use]
    pub fn surface_exponent(&self) -> f64 {
        self.surface_exponent
    }

    #[must_use]
    pub fn individual_genes(&self) -> &[IndividualGene] {
        &self.individual_genes
    }

    #[must_use]
    pub fn environment_genes(&self) -> &[EnvironmentGene] {
        &self.environment_genes
    }

    #[must_use]
    pub fn population_genes(&self) -> &[PopulationGene] {
        &self.population_genes
    }

    /// Signal rows per gene, in list order: individual, environment, population.
    #[must_use]
    pub fn signal_counts(&self) -> [Vec<usize>; 3] {
        [
            self.individual_genes.iter().map(IndividualGene::signal_count).collect(),
            self.environment_genes.iter().map(EnvironmentGene::signal_count).collect(),
            self.population_genes.iter().map(PopulationGene::signal_count).collect(),
        ]
    }

    /// Checks that every gene fits a world with `resource_count` resource
    /// rows and `neighbors_per_cell` neighbours.
    pub fn check_compatible(&self, resource_count: usize, neighbors_per_cell: usize) -> Result<()> {
        for gene in &self.individual_genes {
            if gene.resource_count() != resource_count {
                return Err(EngineError::config(format!(
                    "{}: gene reaction spans {} resources, world has {resource_count}",
                    self.name,
                    gene.resource_count()
                )));
            }
        }
        for gene in &self.environment_genes {
            if gene.max_resource_row() >= resource_count {
                return Err(EngineError::config(format!(
                    "{}: exchange gene touches row {}, world has {resource_count}",
                    self.name,
                    gene.max_resource_row()
                )));
            }
        }
        for gene in &self.population_genes {
            if let Some(choices) = gene.migration_choices() {
                if choices != neighbors_per_cell + 1 {
                    return Err(EngineError::config(format!(
                        "{}: clone gene has {choices} migration weights, topology needs {}",
                        self.name,
                        neighbors_per_cell + 1
                    )));
                }
            }
        }
        Ok(())
    }
}
