use crate::error::{EngineError, Result};
use crate::matrix::{check_shape, Matrix, Vector};
use crate::process::{ExchangeChanges, ExchangeResourcesProcess};
use crate::signal::SignalLevels;

/// Per-resource target levels for exchange with the individual's cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeResourceGene {
    process: ExchangeResourcesProcess,
    targets: Vec<SignalLevels>,
}

impl ExchangeResourceGene {
    /// One target level per exchanged row, in the process's row order.
    pub fn new(process: ExchangeResourcesProcess, targets: Vec<SignalLevels>) -> Result<Self> {
        if targets.len() != process.rows().len() {
            return Err(EngineError::shape(
                "exchange gene levels",
                (process.rows().len(), 1),
                (targets.len(), 1),
            ));
        }
        Ok(Self { process, targets })
    }

    #[must_use]
    pub fn signal_count(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn max_resource_row(&self) -> usize {
        self.process.rows().iter().copied().max().unwrap_or(0)
    }

    pub fn compute_changes(
        &self,
        resources: &Matrix,
        signals: &Matrix,
        environment: &Matrix,
        locations: &[usize],
        shares: &Vector,
    ) -> Result<ExchangeChanges> {
        check_shape("exchange gene signals", signals, self.targets.len(), resources.ncols())?;
        let mut targets = Matrix::zeros(signals.dim());
        for (k, levels) in self.targets.iter().enumerate() {
            targets.row_mut(k).assign(&levels.decode_row(signals.row(k)));
        }
        self.process
            .compute_changes(resources, environment, locations, shares, &targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_level_count_must_match_rows() {
        let process = ExchangeResourcesProcess::new(vec![0, 1], 2).unwrap();
        let levels = SignalLevels::new(1.0, 10.0).unwrap();
        assert!(ExchangeResourceGene::new(process.clone(), vec![levels]).is_err());
        let gene = ExchangeResourceGene::new(process, vec![levels, levels]).unwrap();
        assert_eq!(gene.signal_count(), 2);
        assert_eq!(gene.max_resource_row(), 1);
    }

    #[test]
    fn test_decoded_targets_drive_exchange() {
        let process = ExchangeResourcesProcess::new(vec![1], 2).unwrap();
        let gene =
            ExchangeResourceGene::new(process, vec![SignalLevels::new(1.0, 100.0).unwrap()])
                .unwrap();
        let resources = array![[0.0], [0.0]];
        let environment = array![[0.0, 0.0], [0.0, 50.0]];
        let changes = gene
            .compute_changes(&resources, &array![[0.5]], &environment, &[1], &array![1.0])
            .unwrap();
        assert!((changes.individual[[1, 0]] - 10.0).abs() < 1e-9);
        assert!((changes.environment[[1, 1]] + 10.0).abs() < 1e-9);
        assert_eq!(changes.individual[[0, 0]], 0.0);
    }
}
