//! Target-level controllers.
//!
//! Each controller steers a resource toward a per-individual target and
//! returns the resource delta it can actually realise this step. The delta
//! is bounded by the gap to the target, by the reaction's own kinetics, and
//! for shared processes by the individual's slice of a common supply.

use crate::error::{check_index, EngineError, Result};
use crate::matrix::{check_len, check_shape, scatter_add_columns, Matrix, Vector};
use crate::reaction::Reaction;

/// Internal reaction that only moves its reference product toward the target.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionProcess {
    reaction: Reaction,
    reference: usize,
}

impl ReactionProcess {
    pub fn new(reaction: Reaction, reference: usize) -> Result<Self> {
        reaction.check_product(reference)?;
        Ok(Self {
            reaction,
            reference,
        })
    }

    #[must_use]
    pub fn reaction(&self) -> &Reaction {
        &self.reaction
    }

    #[must_use]
    pub fn reference(&self) -> usize {
        self.reference
    }

    /// Resource delta that brings each column's reference row toward `target`
    /// without overshooting it. Columns already at or above target get zero.
    pub fn compute_changes(&self, resources: &Matrix, target: &Vector, dt: f64) -> Result<Matrix> {
        check_len("reaction target", target, resources.ncols())?;
        let gap = target_gap(resources, self.reference, target);
        let delta = self.reaction.max_capped(self.reference, resources, dt, &gap)?;
        self.reaction.apply(self.reference, &delta)
    }
}

/// Reaction fed by a flux shared among everybody in a cell, e.g. light.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoReactionProcess {
    reaction: Reaction,
    reference: usize,
}

impl PhotoReactionProcess {
    pub fn new(reaction: Reaction, reference: usize) -> Result<Self> {
        reaction.check_product(reference)?;
        Ok(Self {
            reaction,
            reference,
        })
    }

    #[must_use]
    pub fn reaction(&self) -> &Reaction {
        &self.reaction
    }

    #[must_use]
    pub fn reference(&self) -> usize {
        self.reference
    }

    /// Like [`ReactionProcess::compute_changes`], with the reference change
    /// further limited to `share * intensity * dt`, where `share` is the
    /// individual's fraction of the competing surface in its cell.
    pub fn compute_changes(
        &self,
        resources: &Matrix,
        target: &Vector,
        shares: &Vector,
        intensity: f64,
        dt: f64,
    ) -> Result<Matrix> {
        check_len("photo target", target, resources.ncols())?;
        check_len("photo shares", shares, resources.ncols())?;
        let mut cap = target_gap(resources, self.reference, target);
        cap.zip_mut_with(shares, |c, &share| {
            *c = c.min(share * intensity * dt);
        });
        let delta = self.reaction.max_capped(self.reference, resources, dt, &cap)?;
        self.reaction.apply(self.reference, &delta)
    }
}

/// Linear, per-resource exchange between individuals and their cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeResourcesProcess {
    rows: Vec<usize>,
}

/// Paired deltas from one exchange; they cancel cell by cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeChanges {
    /// Resource rows x individuals.
    pub individual: Matrix,
    /// Resource rows x cells.
    pub environment: Matrix,
}

impl ExchangeResourcesProcess {
    /// Exchanges the listed resource rows out of `resource_count`.
    pub fn new(rows: Vec<usize>, resource_count: usize) -> Result<Self> {
        if rows.is_empty() {
            return Err(EngineError::EmptySelection("ExchangeResourcesProcess"));
        }
        for &r in &rows {
            check_index("exchanged resource", r, resource_count)?;
        }
        Ok(Self { rows })
    }

    #[must_use]
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// For every exchanged row, `min(target - current, environment[cell] * share)`.
    ///
    /// Release toward the environment is unbounded; absorption is bounded by
    /// the individual's slice of what its cell holds. Because shares in a
    /// cell sum to at most one, a cell is never drained below zero.
    /// `targets` has one row per exchanged resource.
    pub fn compute_changes(
        &self,
        resources: &Matrix,
        environment: &Matrix,
        locations: &[usize],
        shares: &Vector,
        targets: &Matrix,
    ) -> Result<ExchangeChanges> {
        let individuals = resources.ncols();
        check_shape("exchange targets", targets, self.rows.len(), individuals)?;
        check_len("exchange shares", shares, individuals)?;
        if locations.len() != individuals {
            return Err(EngineError::shape(
                "exchange locations",
                (individuals, 1),
                (locations.len(), 1),
            ));
        }
        if environment.nrows() != resources.nrows() {
            return Err(EngineError::shape(
                "exchange environment",
                (resources.nrows(), environment.ncols()),
                environment.dim(),
            ));
        }

        let mut individual = Matrix::zeros(resources.dim());
        for (k, &row) in self.rows.iter().enumerate() {
            for (i, &cell) in locations.iter().enumerate() {
                check_index("exchange cell", cell, environment.ncols())?;
                let supply = environment[[row, cell]] * shares[i];
                individual[[row, i]] = (targets[[k, i]] - resources[[row, i]]).min(supply);
            }
        }

        let mut released = Matrix::zeros(environment.dim());
        scatter_add_columns(&mut released, &individual, locations)?;
        Ok(ExchangeChanges {
            environment: -released,
            individual,
        })
    }
}

/// `max(target - resources[reference], 0)` per column.
fn target_gap(resources: &Matrix, reference: usize, target: &Vector) -> Vector {
    let mut gap = target - &resources.row(reference);
    gap.mapv_inplace(|g| g.max(0.0));
    gap
}
