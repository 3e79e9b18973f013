//! Sampling of field quantities on behalf of interpolants.

use crate::{
    error::{BoozerError, Result},
    field::BoozerFieldSource,
    grid::fgr,
    interpolation::fip,
    quantity::Quantity,
};
use ndarray::prelude::*;

/// Saves the current points of a field source and sets them back when dropped.
pub struct PointsGuard<'a, S: BoozerFieldSource + ?Sized> {
    source: &'a mut S,
    saved_points: Option<Array2<fgr>>,
}

impl<'a, S: BoozerFieldSource + ?Sized> PointsGuard<'a, S> {
    /// Captures the current points of the given source.
    pub fn new(source: &'a mut S) -> Self {
        let saved_points = Some(source.get_points());
        Self {
            source,
            saved_points,
        }
    }

    /// Returns the guarded source.
    pub fn source_mut(&mut self) -> &mut S {
        &mut *self.source
    }

    /// Restores the saved points right away, reporting any failure.
    pub fn restore(mut self) -> Result<()> {
        match self.saved_points.take() {
            Some(points) => self.source.set_points(points),
            None => Ok(()),
        }
    }
}

impl<S: BoozerFieldSource + ?Sized> Drop for PointsGuard<'_, S> {
    fn drop(&mut self) {
        if let Some(points) = self.saved_points.take() {
            if let Err(err) = self.source.set_points(points) {
                tracing::warn!(%err, "could not restore points of field source");
            }
        }
    }
}

/// Evaluates one quantity of a field source for batches of coordinates,
/// leaving the source's points as they were once the sampler is dropped.
pub struct BatchSampler<'a, S: BoozerFieldSource + ?Sized> {
    guard: PointsGuard<'a, S>,
    quantity: Quantity,
}

impl<'a, S: BoozerFieldSource + ?Sized> BatchSampler<'a, S> {
    /// Creates a sampler for the given quantity.
    pub fn new(source: &'a mut S, quantity: Quantity) -> Self {
        Self {
            guard: PointsGuard::new(source),
            quantity,
        }
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Evaluates the quantity at the given coordinates.
    ///
    /// Angles are ignored for flux functions. The values are returned
    /// point-major, with all components of a point stored contiguously.
    pub fn sample(&mut self, s: &[fgr], theta: &[fgr], zeta: &[fgr]) -> Result<Vec<fip>> {
        let n_points = s.len();
        if theta.len() != n_points || zeta.len() != n_points {
            return Err(BoozerError::Internal(format!(
                "coordinate batches differ in length ({}, {}, {})",
                n_points,
                theta.len(),
                zeta.len()
            )));
        }

        let mut points = Array2::zeros((n_points, 3));
        points.column_mut(0).assign(&ArrayView1::from(s));
        if !self.quantity.is_flux_function() {
            points.column_mut(1).assign(&ArrayView1::from(theta));
            points.column_mut(2).assign(&ArrayView1::from(zeta));
        }

        let source = self.guard.source_mut();
        source.set_points(points)?;
        let values = source.evaluate(self.quantity)?;

        let expected = (n_points, self.quantity.arity());
        if values.dim() != expected {
            return Err(BoozerError::ShapeMismatch {
                quantity: self.quantity.name(),
                expected,
                found: values.dim(),
            });
        }
        tracing::trace!(quantity = %self.quantity, points = n_points, "sampled field source");
        Ok(values.into_iter().collect())
    }

    /// Restores the source's points, reporting any failure.
    pub fn finish(self) -> Result<()> {
        self.guard.restore()
    }
}
