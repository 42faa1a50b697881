use biotope_core::matrix::{Matrix, Vector};
use biotope_core::{Population, SimulationEngine, SimulationStatus, Species, Topology};
use ndarray::Array1;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

/// Two resources unless overridden: row 0 matter (mass 1), row 1 energy.
#[allow(dead_code)]
pub struct WorldBuilder {
    adjacency: Option<Vec<Vec<usize>>>,
    width: usize,
    height: usize,
    molecular_masses: Vec<f64>,
    diffusion: Vec<f64>,
    energy_index: usize,
    light: f64,
    max_time_step: f64,
    environment_levels: Vec<f64>,
    populations: Vec<Population>,
    seed: u64,
}

#[allow(dead_code)]
impl WorldBuilder {
    pub fn new() -> Self {
        Self {
            adjacency: None,
            width: 4,
            height: 2,
            molecular_masses: vec![1.0, 0.0],
            diffusion: vec![0.0, 0.0],
            energy_index: 1,
            light: 0.0,
            max_time_step: 0.5,
            environment_levels: vec![0.0, 0.0],
            populations: Vec::new(),
            seed: 42,
        }
    }

    /// Two cells linked to each other.
    pub fn with_pair(mut self) -> Self {
        self.adjacency = Some(vec![vec![1], vec![0]]);
        self
    }

    pub fn with_honeycomb(mut self, width: usize, height: usize) -> Self {
        self.adjacency = None;
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_diffusion(mut self, diffusion: Vec<f64>) -> Self {
        self.diffusion = diffusion;
        self
    }

    pub fn with_light(mut self, light: f64) -> Self {
        self.light = light;
        self
    }

    pub fn with_max_time_step(mut self, step: f64) -> Self {
        self.max_time_step = step;
        self
    }

    pub fn with_environment(mut self, levels: Vec<f64>) -> Self {
        self.environment_levels = levels;
        self
    }

    pub fn with_population(mut self, population: Population) -> Self {
        self.populations.push(population);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(self) -> (SimulationEngine, SimulationStatus, ChaCha8Rng) {
        let topology = match self.adjacency {
            Some(adjacency) => Topology::from_adjacency(adjacency, 1.0),
            None => Topology::honeycomb(self.width, self.height, 1.0),
        }
        .expect("Failed to build topology in test builder");
        let topology = Arc::new(topology);
        let cells = topology.cell_count();
        let rows = self.molecular_masses.len();

        let diffusion = Matrix::from_shape_fn((rows, cells), |(r, _)| self.diffusion[r]);
        let engine = SimulationEngine::new(
            Arc::clone(&topology),
            Array1::from(self.molecular_masses),
            diffusion,
            self.energy_index,
            self.light,
            self.max_time_step,
        )
        .expect("Failed to build engine in test builder");

        let levels = self.environment_levels;
        let environment = Matrix::from_shape_fn((rows, cells), |(r, _)| levels[r]);
        let status = SimulationStatus::new(&topology, environment, self.populations, 0.0)
            .expect("Failed to build status in test builder");
        (engine, status, ChaCha8Rng::seed_from_u64(self.seed))
    }
}

/// A species without genes.
#[allow(dead_code)]
pub fn inert_species(rate: f64, surviving_mass: f64) -> Arc<Species> {
    Arc::new(Species::new("inert", rate, surviving_mass, 3.0).expect("valid species"))
}

/// Individuals given as `(matter, energy, cell)`.
#[allow(dead_code)]
pub fn inert_population(species: Arc<Species>, individuals: &[(f64, f64, usize)]) -> Population {
    let resources = Matrix::from_shape_fn((2, individuals.len()), |(r, i)| {
        if r == 0 {
            individuals[i].0
        } else {
            individuals[i].1
        }
    });
    let locations = individuals.iter().map(|i| i.2).collect();
    Population::new(species, resources, locations, vec![], vec![], vec![])
        .expect("valid population")
}

/// `Σ resources * masses` over the environment and every individual.
#[allow(dead_code)]
pub fn total_mass(status: &SimulationStatus, masses: &Vector) -> f64 {
    status.resource_totals().dot(masses)
}
