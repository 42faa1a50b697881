//! Stoichiometric reaction kinetics.
//!
//! A reaction turns reagents into products at a fixed ratio. Callers only
//! ever decide how much of one *reference* resource changes; [`Reaction::apply`]
//! expands that scalar into a full resource delta so every other row moves
//! by the stoichiometric ratio and mass is conserved across the reaction.

use crate::error::{check_index, EngineError, Result};
use crate::matrix::{check_shape, Matrix, Vector};
use ndarray::Array1;

#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    /// Nonzero reagent coefficients, indexed through `reagent_map`.
    reagents: Vector,
    reagent_map: Vec<usize>,
    /// Activation threshold per retained reagent.
    thresholds: Vector,
    /// Nonzero speeds (1/time) of reagent or product rows, indexed through `speed_map`.
    speeds: Vector,
    speed_map: Vec<usize>,
    /// `products - reagents`, one entry per resource row.
    alpha: Vector,
}

impl Reaction {
    /// Builds a reaction over `reagents.len()` resource rows.
    ///
    /// `thresholds` and `max_speeds` are given per resource row; only the
    /// entries for rows that take part in the reaction are kept. A row with
    /// zero speed places no kinetic bound.
    pub fn new(
        reagents: &[f64],
        products: &[f64],
        thresholds: &[f64],
        max_speeds: &[f64],
    ) -> Result<Self> {
        let rows = reagents.len();
        if products.len() != rows || thresholds.len() != rows || max_speeds.len() != rows {
            return Err(EngineError::reaction(format!(
                "vector lengths differ: reagents {rows}, products {}, thresholds {}, speeds {}",
                products.len(),
                thresholds.len(),
                max_speeds.len()
            )));
        }
        let mut all = reagents
            .iter()
            .chain(products)
            .chain(thresholds)
            .chain(max_speeds);
        if all.any(|v| !v.is_finite() || *v < 0.0) {
            return Err(EngineError::reaction(
                "coefficients, thresholds and speeds must be finite and non-negative",
            ));
        }

        let reagent_map: Vec<usize> = (0..rows).filter(|&r| reagents[r] > 0.0).collect();
        let speed_map: Vec<usize> = (0..rows)
            .filter(|&r| (reagents[r] > 0.0 || products[r] > 0.0) && max_speeds[r] > 0.0)
            .collect();

        Ok(Self {
            reagents: reagent_map.iter().map(|&r| reagents[r]).collect(),
            thresholds: reagent_map.iter().map(|&r| thresholds[r]).collect(),
            speeds: speed_map.iter().map(|&r| max_speeds[r]).collect(),
            alpha: Array1::from_shape_fn(rows, |r| products[r] - reagents[r]),
            reagent_map,
            speed_map,
        })
    }

    /// Number of resource rows the reaction is defined over.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.alpha.len()
    }

    /// Net change per reaction unit, one entry per resource row.
    #[must_use]
    pub fn alpha(&self) -> &Vector {
        &self.alpha
    }

    #[must_use]
    pub fn reagent_map(&self) -> &[usize] {
        &self.reagent_map
    }

    #[must_use]
    pub fn speed_map(&self) -> &[usize] {
        &self.speed_map
    }

    /// Fails unless `reference` is a row the reaction actually changes.
    pub fn check_reference(&self, reference: usize) -> Result<()> {
        check_index("reaction reference", reference, self.alpha.len())?;
        if self.alpha[reference] == 0.0 {
            return Err(EngineError::reaction(format!(
                "reference row {reference} has zero net coefficient"
            )));
        }
        Ok(())
    }

    /// Fails unless `reference` is a row the reaction produces.
    pub fn check_product(&self, reference: usize) -> Result<()> {
        self.check_reference(reference)?;
        if self.alpha[reference] < 0.0 {
            return Err(EngineError::reaction(format!(
                "reference row {reference} is consumed by the reaction"
            )));
        }
        Ok(())
    }

    /// Largest reference-resource change each column can undergo in `dt`.
    ///
    /// The result is the smaller of the kinetic bound (the minimum over
    /// speed rows of `resources * speed * dt`) and the availability bound
    /// (the minimum over reagents of the amount above threshold divided by
    /// the coefficient, times `alpha[reference]`). A reaction with neither
    /// kind of row is unbounded. The reference must be a product.
    pub fn max(&self, reference: usize, resources: &Matrix, dt: f64) -> Result<Vector> {
        self.check_product(reference)?;
        check_shape("reaction resources", resources, self.alpha.len(), resources.ncols())?;
        let scale = self.alpha[reference];

        let bounds = resources
            .columns()
            .into_iter()
            .map(|col| {
                let kinetic = self
                    .speed_map
                    .iter()
                    .zip(&self.speeds)
                    .map(|(&row, &speed)| col[row] * speed * dt)
                    .fold(f64::INFINITY, f64::min);
                let available = self
                    .reagent_map
                    .iter()
                    .zip(self.reagents.iter().zip(&self.thresholds))
                    .map(|(&row, (&coef, &threshold))| {
                        (col[row] - threshold).max(0.0) / coef * scale
                    })
                    .fold(f64::INFINITY, f64::min);
                kinetic.min(available).max(0.0)
            })
            .collect();
        Ok(bounds)
    }

    /// [`Reaction::max`] further clipped by a per-column cap, used when a
    /// target level bounds how much reference resource is actually needed.
    pub fn max_capped(
        &self,
        reference: usize,
        resources: &Matrix,
        dt: f64,
        cap: &Vector,
    ) -> Result<Vector> {
        let mut bound = self.max(reference, resources, dt)?;
        if cap.len() != bound.len() {
            return Err(EngineError::shape(
                "reaction cap",
                (bound.len(), 1),
                (cap.len(), 1),
            ));
        }
        bound.zip_mut_with(cap, |b, &c| *b = b.min(c.max(0.0)));
        Ok(bound)
    }

    /// Full resource delta for a per-column change of the reference row:
    /// `alpha ⊗ delta / alpha[reference]`.
    pub fn apply(&self, reference: usize, delta_reference: &Vector) -> Result<Matrix> {
        self.check_reference(reference)?;
        let ratio = &self.alpha / self.alpha[reference];
        Ok(Matrix::from_shape_fn(
            (self.alpha.len(), delta_reference.len()),
            |(row, col)| ratio[row] * delta_reference[col],
        ))
    }
}
