use crate::error::{check_index, EngineError, Result};
use crate::matrix::{Matrix, Vector};
use crate::population::Population;
use crate::topology::Topology;
use biotope_data::{PopulationSummary, StatusSnapshot};
use ndarray::Axis;

/// Full simulation state at one instant.
///
/// The environment matrix has one row per resource and one column per cell.
/// Each step produces a new status; the old one is consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationStatus {
    pub environment: Matrix,
    pub populations: Vec<Population>,
    pub time: f64,
}

impl SimulationStatus {
    /// Checks the environment against `topology` and every population
    /// against the environment before assembling the status.
    pub fn new(
        topology: &Topology,
        environment: Matrix,
        populations: Vec<Population>,
        time: f64,
    ) -> Result<Self> {
        let resources = environment.nrows();
        if environment.ncols() != topology.cell_count() {
            return Err(EngineError::shape(
                "environment",
                (resources, topology.cell_count()),
                environment.dim(),
            ));
        }
        for population in &populations {
            if population.resources().nrows() != resources {
                return Err(EngineError::shape(
                    "population resources",
                    (resources, population.len()),
                    population.resources().dim(),
                ));
            }
            if let Some(&cell) = population
                .locations()
                .iter()
                .find(|&&c| c >= topology.cell_count())
            {
                return Err(EngineError::out_of_range("cell", cell, topology.cell_count()));
            }
            population
                .species()
                .check_compatible(resources, topology.neighbors_per_cell())?;
        }
        Ok(Self {
            environment,
            populations,
            time,
        })
    }

    #[must_use]
    pub fn individuals(&self) -> usize {
        self.populations.iter().map(Population::len).sum()
    }

    /// Per-resource totals over the environment and every individual.
    #[must_use]
    pub fn resource_totals(&self) -> Vector {
        let mut totals = self.environment.sum_axis(Axis(1));
        for population in &self.populations {
            totals += &population.resources().sum_axis(Axis(1));
        }
        totals
    }

    /// Read-only summary for observers.
    pub fn snapshot(&self, molecular_masses: &Vector, energy_index: usize) -> Result<StatusSnapshot> {
        check_index("energy row", energy_index, self.environment.nrows())?;
        let populations = self
            .populations
            .iter()
            .map(|p| {
                let mass = p.total_mass(molecular_masses)?;
                let total_mass = mass.sum();
                let n = p.len();
                let mean = |total: f64| if n > 0 { total / n as f64 } else { 0.0 };
                let energy = p.resources().row(energy_index).sum();
                Ok(PopulationSummary {
                    species: p.species().name().to_string(),
                    individuals: n,
                    total_mass,
                    mean_mass: mean(total_mass),
                    mean_energy: mean(energy),
                    resources: p.resources().sum_axis(Axis(1)).to_vec(),
                    occupied_cells: p.occupied_cells(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(StatusSnapshot {
            time: self.time,
            cells: self.environment.ncols(),
            environment: self.environment.sum_axis(Axis(1)).to_vec(),
            populations,
        })
    }
}
