//! Interpolation of scalar and multi-component quantities on regular grids.

pub mod regular_grid;

use crate::{
    error::{BoozerError, Result},
    geometry::Dim3,
    grid::{fgr, GridDescription},
};
use ndarray::prelude::*;
use rand::Rng;

/// Floating-point precision to use for interpolated values.
#[allow(non_camel_case_types)]
pub type fip = f64;

/// Summary of the discrepancy between interpolated and exact values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ErrorEstimate {
    /// Mean absolute difference over all sampled components.
    pub mean_abs_error: fip,
    /// Largest absolute difference over all sampled components.
    pub max_abs_error: fip,
    /// Mean relative difference over components with a non-zero exact value.
    pub mean_rel_error: fip,
}

impl ErrorEstimate {
    /// Computes error statistics from matching sequences of exact and interpolated values.
    pub fn from_values(exact: &[fip], interpolated: &[fip]) -> Self {
        let mut abs_sum = 0.0;
        let mut max_abs_error: fip = 0.0;
        let mut rel_sum = 0.0;
        let mut rel_count = 0usize;

        for (&exact_value, &interp_value) in exact.iter().zip(interpolated) {
            let abs_error = (interp_value - exact_value).abs();
            abs_sum += abs_error;
            max_abs_error = max_abs_error.max(abs_error);
            if exact_value != 0.0 {
                rel_sum += abs_error / exact_value.abs();
                rel_count += 1;
            }
        }
        let count = exact.len().min(interpolated.len()).max(1);
        Self {
            mean_abs_error: abs_sum / (count as fip),
            max_abs_error,
            mean_rel_error: if rel_count > 0 {
                rel_sum / (rel_count as fip)
            } else {
                0.0
            },
        }
    }
}

/// Defines the properties of an interpolant over a regular 3D grid in Boozer coordinates.
///
/// The interpolant is built once from a sampling callback and can then be
/// evaluated at arbitrary points. Sampled and evaluated values are laid out
/// point-major: component `c` of point `p` is found at `p * value_size + c`.
pub trait GridInterpolant3: Sized + Send + Sync {
    /// Creates an unbuilt interpolant over the given grid, producing
    /// `value_size` components per point.
    fn new(grid: &GridDescription, value_size: usize) -> Result<Self>;

    /// Returns the grid the interpolant is defined on.
    fn grid(&self) -> &GridDescription;

    /// Returns the number of components per point.
    fn value_size(&self) -> usize;

    /// Fits the interpolant to values produced by the given sampling callback,
    /// which receives the `s`, `theta` and `zeta` coordinates of the nodes.
    fn interpolate_batch<E>(&mut self, sample: E) -> Result<()>
    where
        E: FnMut(&[fgr], &[fgr], &[fgr]) -> Result<Vec<fip>>;

    /// Evaluates the interpolant at every `(s, theta, zeta)` row of `points`,
    /// writing `value_size` components per row into `out`.
    fn evaluate_batch(&self, points: ArrayView2<fgr>, out: ArrayViewMut2<fip>) -> Result<()>;

    /// Compares the interpolant with the sampling callback at `n_samples`
    /// random points inside the grid.
    fn estimate_error<E, R>(&self, mut sample: E, n_samples: usize, rng: &mut R) -> Result<ErrorEstimate>
    where
        E: FnMut(&[fgr], &[fgr], &[fgr]) -> Result<Vec<fip>>,
        R: Rng,
    {
        if n_samples == 0 {
            return Err(BoozerError::InvalidConfiguration(
                "error estimation requires at least one sample".to_string(),
            ));
        }
        let mut points = Array2::zeros((n_samples, 3));
        for dim in Dim3::slice() {
            let range = self.grid().range(dim);
            for coord in points.column_mut(dim.num()) {
                *coord = rng.random_range(range.lower..=range.upper);
            }
        }
        let columns: Vec<Vec<fgr>> = Dim3::slice()
            .iter()
            .map(|dim| points.column(dim.num()).to_vec())
            .collect();

        let exact = sample(&columns[0], &columns[1], &columns[2])?;
        let expected_len = n_samples * self.value_size();
        if exact.len() != expected_len {
            return Err(BoozerError::FieldSource(format!(
                "sampling returned {} values, expected {}",
                exact.len(),
                expected_len
            )));
        }

        let mut interpolated = Array2::zeros((n_samples, self.value_size()));
        self.evaluate_batch(points.view(), interpolated.view_mut())?;
        let interpolated: Vec<fip> = interpolated.into_iter().collect();

        Ok(ErrorEstimate::from_values(&exact, &interpolated))
    }
}
