//! # Biotope Data
//!
//! Plain data shared between the simulation engine and its observers.
//! Nothing here mutates simulation state; the engine fills these structures
//! from a `SimulationStatus` and hands them out read-only.

use serde::{Deserialize, Serialize};

/// Aggregated view of one population at the moment a snapshot was taken.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PopulationSummary {
    /// Name of the species the population belongs to.
    pub species: String,
    /// Number of living individuals.
    pub individuals: usize,
    /// Sum of every individual's molecular mass.
    pub total_mass: f64,
    /// Mean molecular mass, zero when the population is empty.
    pub mean_mass: f64,
    /// Mean value of the energy row, zero when the population is empty.
    pub mean_energy: f64,
    /// Per-resource totals over all individuals (one entry per resource row).
    pub resources: Vec<f64>,
    /// Number of distinct cells occupied by the population.
    pub occupied_cells: usize,
}

impl PopulationSummary {
    #[must_use]
    pub fn is_extinct(&self) -> bool {
        self.individuals == 0
    }
}

/// Read-only picture of the whole simulation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct StatusSnapshot {
    /// Simulated time.
    pub time: f64,
    /// Number of cells in the topology.
    pub cells: usize,
    /// Environment totals, one entry per resource row.
    pub environment: Vec<f64>,
    pub populations: Vec<PopulationSummary>,
}

impl StatusSnapshot {
    /// Total number of individuals across every population.
    #[must_use]
    pub fn individuals(&self) -> usize {
        self.populations.iter().map(|p| p.individuals).sum()
    }

    /// Sum of a resource row over the environment and every population.
    ///
    /// Useful for checking conservation between two snapshots of a run
    /// without metabolism.
    #[must_use]
    pub fn resource_total(&self, row: usize) -> f64 {
        let env = self.environment.get(row).copied().unwrap_or(0.0);
        let pops: f64 = self
            .populations
            .iter()
            .map(|p| p.resources.get(row).copied().unwrap_or(0.0))
            .sum();
        env + pops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(individuals: usize, resources: Vec<f64>) -> PopulationSummary {
        PopulationSummary {
            species: "algae".to_string(),
            individuals,
            total_mass: 0.0,
            mean_mass: 0.0,
            mean_energy: 0.0,
            resources,
            occupied_cells: 0,
        }
    }

    #[test]
    fn test_resource_total_sums_environment_and_populations() {
        let snapshot = StatusSnapshot {
            time: 1.0,
            cells: 4,
            environment: vec![10.0, 2.0],
            populations: vec![summary(3, vec![1.0, 0.5]), summary(0, vec![0.0, 0.0])],
        };
        assert_eq!(snapshot.resource_total(0), 11.0);
        assert_eq!(snapshot.resource_total(1), 2.5);
        assert_eq!(snapshot.resource_total(7), 0.0);
        assert_eq!(snapshot.individuals(), 3);
        assert!(snapshot.populations[1].is_extinct());
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = StatusSnapshot {
            time: 2.5,
            cells: 1,
            environment: vec![1.0],
            populations: vec![summary(1, vec![4.0])],
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["time"], 2.5);
        assert_eq!(json["populations"][0]["species"], "algae");
    }
}
