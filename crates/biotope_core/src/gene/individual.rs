use crate::error::Result;
use crate::matrix::{check_shape, Matrix, Vector};
use crate::process::{PhotoReactionProcess, ReactionProcess};
use crate::signal::SignalLevels;

/// Steers one internal product toward a genetically chosen level.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceGene {
    process: ReactionProcess,
    target: SignalLevels,
}

impl ResourceGene {
    #[must_use]
    pub fn new(process: ReactionProcess, target: SignalLevels) -> Self {
        Self { process, target }
    }

    #[must_use]
    pub fn signal_count(&self) -> usize {
        1
    }

    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.process.reaction().resource_count()
    }

    #[must_use]
    pub fn target(&self) -> SignalLevels {
        self.target
    }

    pub fn compute_changes(&self, resources: &Matrix, signals: &Matrix, dt: f64) -> Result<Matrix> {
        check_shape("resource gene signals", signals, 1, resources.ncols())?;
        let target = self.target.decode_row(signals.row(0));
        self.process.compute_changes(resources, &target, dt)
    }
}

/// Like [`ResourceGene`], but the reaction is fed by the cell's shared light.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoResourceGene {
    process: PhotoReactionProcess,
    target: SignalLevels,
}

impl PhotoResourceGene {
    #[must_use]
    pub fn new(process: PhotoReactionProcess, target: SignalLevels) -> Self {
        Self { process, target }
    }

    #[must_use]
    pub fn signal_count(&self) -> usize {
        1
    }

    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.process.reaction().resource_count()
    }

    pub fn compute_changes(
        &self,
        resources: &Matrix,
        signals: &Matrix,
        shares: &Vector,
        light: f64,
        dt: f64,
    ) -> Result<Matrix> {
        check_shape("photo gene signals", signals, 1, resources.ncols())?;
        let target = self.target.decode_row(signals.row(0));
        self.process
            .compute_changes(resources, &target, shares, light, dt)
    }
}
