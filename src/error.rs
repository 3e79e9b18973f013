//! Error type shared by all fallible operations.

use crate::geometry::Dim3;
use thiserror::Error;

/// Failures raised while configuring, building or evaluating a field.
#[derive(Debug, Error)]
pub enum BoozerError {
    /// A grid range, degree or symmetry setting is malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A point batch did not have the expected `(s, theta, zeta)` columns.
    #[error("point batch must have 3 columns (s, theta, zeta), got {columns}")]
    InvalidPoints { columns: usize },

    /// A quantity name is not part of the catalog.
    #[error("unknown quantity: {0}")]
    UnknownQuantity(String),

    /// The field source has no way of computing the requested quantity.
    #[error("field source cannot compute {quantity}")]
    UnsupportedQuantity { quantity: &'static str },

    /// The field source returned an array of unexpected shape.
    #[error("{quantity} returned shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        quantity: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Fold flags were produced for a different batch than the values.
    #[error("fold flags cover {flags} points but values cover {values}")]
    FoldFlagMismatch { flags: usize, values: usize },

    /// A point lies outside the interpolation grid and extrapolation is disabled.
    #[error("{dim} = {coord} is outside the interpolation range [{lower}, {upper}]")]
    OutsideDomain {
        dim: Dim3,
        coord: f64,
        lower: f64,
        upper: f64,
    },

    /// Metric components are inconsistent, or the metric is singular.
    #[error("invalid metric: {0}")]
    InvalidMetric(String),

    /// The wrapped field source failed to evaluate.
    #[error("field source failed: {0}")]
    FieldSource(String),

    /// An interpolant or sampler was used in a way its caller should have ruled out.
    #[error("internal error: {0}")]
    Internal(String),

    /// The field source lock was poisoned by a panic in another user.
    #[error("field source is unavailable after a panic in another user")]
    SourcePoisoned,
}

pub type Result<T> = std::result::Result<T, BoozerError>;
