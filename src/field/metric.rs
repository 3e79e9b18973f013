//! Metric tensor of normalized Boozer coordinates `(s, theta, zeta)`.

use super::BoozerFieldSource;
use crate::{
    error::{BoozerError, Result},
    interpolation::fip,
    quantity::Quantity,
};
use ndarray::prelude::*;
use std::ops::Deref;

/// Largest tolerated relative difference between `sqrt(det g)` and the
/// Jacobian computed from the covariant field components.
pub const JACOBIAN_TOLERANCE: fip = 1e-3;

/// The six independent components of a symmetric 3x3 metric, one value per point.
#[derive(Clone, Debug, PartialEq)]
pub struct BoozerMetric {
    pub ss: Array1<fip>,
    pub st: Array1<fip>,
    pub sz: Array1<fip>,
    pub tt: Array1<fip>,
    pub tz: Array1<fip>,
    pub zz: Array1<fip>,
}

impl BoozerMetric {
    /// Creates a metric from its components.
    ///
    /// All components must cover the same number of points, and the
    /// diagonal components must be positive.
    pub fn new(
        ss: Array1<fip>,
        st: Array1<fip>,
        sz: Array1<fip>,
        tt: Array1<fip>,
        tz: Array1<fip>,
        zz: Array1<fip>,
    ) -> Result<Self> {
        let n_points = ss.len();
        if [&st, &sz, &tt, &tz, &zz]
            .iter()
            .any(|component| component.len() != n_points)
        {
            return Err(BoozerError::InvalidMetric(
                "all metric components must cover the same points".to_string(),
            ));
        }
        if let Some(&value) = [&ss, &tt, &zz]
            .iter()
            .flat_map(|component| component.iter())
            .find(|&&value| !(value > 0.0))
        {
            return Err(BoozerError::InvalidMetric(format!(
                "diagonal metric components must be positive, found {}",
                value
            )));
        }
        Ok(Self {
            ss,
            st,
            sz,
            tt,
            tz,
            zz,
        })
    }

    pub fn n_points(&self) -> usize {
        self.ss.len()
    }

    /// Returns the full symmetric matrix at the point with the given index,
    /// or `None` if there is no such point.
    pub fn as_matrix(&self, idx: usize) -> Option<[[fip; 3]; 3]> {
        if idx >= self.n_points() {
            return None;
        }
        let (ss, st, sz) = (self.ss[idx], self.st[idx], self.sz[idx]);
        let (tt, tz, zz) = (self.tt[idx], self.tz[idx], self.zz[idx]);
        Some([[ss, st, sz], [st, tt, tz], [sz, tz, zz]])
    }

    /// Computes the determinant at every point.
    pub fn det(&self) -> Array1<fip> {
        &self.ss * &(&self.tt * &self.zz - &self.tz * &self.tz)
            - &self.st * &(&self.st * &self.zz - &self.tz * &self.sz)
            + &self.sz * &(&self.st * &self.tz - &self.sz * &self.tt)
    }

    /// Inverts the matrix at every point using its cofactors.
    ///
    /// Fails if any determinant is not positive and finite.
    fn inverse(&self) -> Result<Self> {
        let det = self.det();
        if let Some((idx, &value)) = det
            .iter()
            .enumerate()
            .find(|&(_, &value)| !(value > 0.0 && value.is_finite()))
        {
            return Err(BoozerError::InvalidMetric(format!(
                "metric at point {} has determinant {} and cannot be inverted",
                idx, value
            )));
        }
        Self::new(
            (&self.tt * &self.zz - &self.tz * &self.tz) / &det,
            (&self.sz * &self.tz - &self.st * &self.zz) / &det,
            (&self.st * &self.tz - &self.sz * &self.tt) / &det,
            (&self.ss * &self.zz - &self.sz * &self.sz) / &det,
            (&self.st * &self.sz - &self.ss * &self.tz) / &det,
            (&self.ss * &self.tt - &self.st * &self.st) / &det,
        )
    }
}

/// Metric with respect to the tangent basis `(d/ds, d/dtheta, d/dzeta)`.
#[derive(Clone, Debug, PartialEq)]
pub struct CovariantBoozerMetric(pub BoozerMetric);

/// Metric with respect to the gradient basis `(grad s, grad theta, grad zeta)`.
#[derive(Clone, Debug, PartialEq)]
pub struct ContravariantBoozerMetric(pub BoozerMetric);

impl CovariantBoozerMetric {
    pub fn to_contravariant(&self) -> Result<ContravariantBoozerMetric> {
        self.0.inverse().map(ContravariantBoozerMetric)
    }
}

impl ContravariantBoozerMetric {
    pub fn to_covariant(&self) -> Result<CovariantBoozerMetric> {
        self.0.inverse().map(CovariantBoozerMetric)
    }
}

impl Deref for CovariantBoozerMetric {
    type Target = BoozerMetric;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Deref for ContravariantBoozerMetric {
    type Target = BoozerMetric;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Computes the covariant metric at the current points of the given source.
///
/// The position is `(R cos(phi), R sin(phi), Z)` with `phi = zeta - nu`, so
/// `g_ij = R_i R_j + Z_i Z_j + R^2 phi_i phi_j`. The metric is singular on the
/// magnetic axis, so every point must have `s > 0`.
pub fn covariant_metric<S>(source: &mut S) -> Result<CovariantBoozerMetric>
where
    S: BoozerFieldSource + ?Sized,
{
    let n_points = source.points().nrows();
    if let Some(&s) = source.points().column(0).iter().find(|&&s| !(s > 0.0)) {
        return Err(BoozerError::InvalidMetric(format!(
            "metric is singular on the magnetic axis, got s = {}",
            s
        )));
    }

    let r = evaluated(source, Quantity::R, n_points)?;
    let r_derivs = evaluated(source, Quantity::RDerivs, n_points)?;
    let z_derivs = evaluated(source, Quantity::ZDerivs, n_points)?;
    let mut phi_derivs = -evaluated(source, Quantity::NuDerivs, n_points)?;
    phi_derivs.column_mut(2).mapv_inplace(|d| d + 1.0);
    let r_squared = r.column(0).mapv(|r| r * r);

    let component = |i: usize, j: usize| -> Array1<fip> {
        &r_derivs.column(i) * &r_derivs.column(j)
            + &z_derivs.column(i) * &z_derivs.column(j)
            + &r_squared * &phi_derivs.column(i) * &phi_derivs.column(j)
    };
    let metric = BoozerMetric::new(
        component(0, 0),
        component(0, 1),
        component(0, 2),
        component(1, 1),
        component(1, 2),
        component(2, 2),
    )?;

    let det = metric.det();
    if let Some(&value) = det.iter().find(|&&value| !(value > 0.0)) {
        return Err(BoozerError::InvalidMetric(format!(
            "metric determinant must be positive, found {}",
            value
        )));
    }

    match jacobian_mismatch(source, &det, n_points) {
        Ok(Some((idx, relative_error))) => tracing::warn!(
            point = idx,
            relative_error,
            "sqrt(det g) deviates from the Jacobian (G + iota I) psi0 / B^2"
        ),
        Ok(None) => {}
        Err(err) => tracing::trace!(%err, "skipping Jacobian check of metric"),
    }

    Ok(CovariantBoozerMetric(metric))
}

/// Computes the contravariant metric at the current points of the given source.
pub fn contravariant_metric<S>(source: &mut S) -> Result<ContravariantBoozerMetric>
where
    S: BoozerFieldSource + ?Sized,
{
    covariant_metric(source)?.to_contravariant()
}

/// Compares `sqrt(det g)` with the Boozer Jacobian and returns the worst point
/// if its relative error exceeds `JACOBIAN_TOLERANCE`.
fn jacobian_mismatch<S>(
    source: &mut S,
    det: &Array1<fip>,
    n_points: usize,
) -> Result<Option<(usize, fip)>>
where
    S: BoozerFieldSource + ?Sized,
{
    let mod_b = evaluated(source, Quantity::ModB, n_points)?;
    let g = evaluated(source, Quantity::G, n_points)?;
    let i = evaluated(source, Quantity::I, n_points)?;
    let iota = evaluated(source, Quantity::Iota, n_points)?;
    let psi0 = source.psi0();

    let mut worst: Option<(usize, fip)> = None;
    for idx in 0..n_points {
        let b = mod_b[[idx, 0]];
        let sqrtg = (g[[idx, 0]] + iota[[idx, 0]] * i[[idx, 0]]) * psi0 / (b * b);
        if sqrtg == 0.0 {
            return Err(BoozerError::InvalidMetric(format!(
                "Jacobian vanishes at point {}",
                idx
            )));
        }
        let relative_error = (det[idx].sqrt() - sqrtg.abs()).abs() / sqrtg.abs();
        if worst.map_or(true, |(_, largest)| relative_error > largest) {
            worst = Some((idx, relative_error));
        }
    }
    Ok(worst.filter(|&(_, relative_error)| relative_error > JACOBIAN_TOLERANCE))
}

fn evaluated<S>(source: &mut S, quantity: Quantity, n_points: usize) -> Result<Array2<fip>>
where
    S: BoozerFieldSource + ?Sized,
{
    let values = source.evaluate(quantity)?;
    let expected = (n_points, quantity.arity());
    if values.dim() != expected {
        return Err(BoozerError::ShapeMismatch {
            quantity: quantity.name(),
            expected,
            found: values.dim(),
        });
    }
    Ok(values)
}
