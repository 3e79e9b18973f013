//! Description of the regular interpolation grid in Boozer coordinates.

use crate::{
    error::{BoozerError, Result},
    geometry::{Dim3, In3D},
};
use std::fmt;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Floating-point precision to use for grid coordinates.
#[allow(non_camel_case_types)]
pub type fgr = f64;

/// Bounds and number of cells along one grid axis.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct RangeTriplet {
    /// Lower bound of the axis.
    pub lower: fgr,
    /// Upper bound of the axis.
    pub upper: fgr,
    /// Number of cells the interval is split into.
    pub resolution: usize,
}

impl RangeTriplet {
    /// Creates a new range triplet.
    pub fn new(lower: fgr, upper: fgr, resolution: usize) -> Self {
        Self {
            lower,
            upper,
            resolution,
        }
    }

    /// Returns the extent of the axis.
    pub fn extent(&self) -> fgr {
        self.upper - self.lower
    }

    /// Returns the extent of a single cell.
    pub fn cell_extent(&self) -> fgr {
        self.extent() / (self.resolution as fgr)
    }

    /// Whether the given coordinate lies within the closed interval.
    pub fn contains(&self, coord: fgr) -> bool {
        coord >= self.lower && coord <= self.upper
    }

    fn validate(&self, dim: Dim3) -> Result<()> {
        if !(self.lower.is_finite() && self.upper.is_finite()) {
            return Err(BoozerError::InvalidConfiguration(format!(
                "{} range bounds must be finite, got {}",
                dim, self
            )));
        }
        if self.lower >= self.upper {
            return Err(BoozerError::InvalidConfiguration(format!(
                "{} range lower bound must be smaller than upper bound, got {}",
                dim, self
            )));
        }
        if self.resolution == 0 {
            return Err(BoozerError::InvalidConfiguration(format!(
                "{} range must have at least one cell",
                dim
            )));
        }
        Ok(())
    }
}

impl fmt::Display for RangeTriplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.lower, self.upper, self.resolution)
    }
}

/// Placement and degree of the interpolation nodes within each grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct InterpolationRule {
    degree: usize,
}

impl InterpolationRule {
    /// Creates a rule with `degree + 1` uniformly spaced nodes per cell,
    /// shared between neighbouring cells at the cell boundaries.
    pub fn uniform(degree: usize) -> Result<Self> {
        if degree == 0 || degree > MAX_INTERPOLATION_DEGREE {
            Err(BoozerError::InvalidConfiguration(format!(
                "interpolation degree must be between 1 and {}, got {}",
                MAX_INTERPOLATION_DEGREE, degree
            )))
        } else {
            Ok(Self { degree })
        }
    }

    /// Returns the polynomial degree of the rule.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Returns the number of nodes per cell along one axis.
    pub fn nodes_per_cell(&self) -> usize {
        self.degree + 1
    }
}

/// Highest polynomial degree supported by the interpolation rules.
pub const MAX_INTERPOLATION_DEGREE: usize = 7;

/// Angular range used on both angle axes of flux-function grids.
pub const FLUX_FUNCTION_ANGLE_RANGE: RangeTriplet = RangeTriplet {
    lower: 0.0,
    upper: std::f64::consts::PI,
    resolution: 1,
};

/// Full description of a regular tensor-product interpolation grid.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct GridDescription {
    rule: InterpolationRule,
    ranges: In3D<RangeTriplet>,
    extrapolate: bool,
}

impl GridDescription {
    /// Creates a new grid description after validating the ranges.
    pub fn new(
        rule: InterpolationRule,
        s_range: RangeTriplet,
        theta_range: RangeTriplet,
        zeta_range: RangeTriplet,
        extrapolate: bool,
    ) -> Result<Self> {
        let ranges = In3D::new(s_range, theta_range, zeta_range);
        for dim in Dim3::slice() {
            ranges[dim].validate(dim)?;
        }
        Ok(Self {
            rule,
            ranges,
            extrapolate,
        })
    }

    /// Returns the interpolation rule.
    pub fn rule(&self) -> InterpolationRule {
        self.rule
    }

    /// Returns the range along the given dimension.
    pub fn range(&self, dim: Dim3) -> &RangeTriplet {
        &self.ranges[dim]
    }

    /// Returns the ranges along all dimensions.
    pub fn ranges(&self) -> &In3D<RangeTriplet> {
        &self.ranges
    }

    /// Whether evaluation outside the ranges is allowed.
    pub fn extrapolate(&self) -> bool {
        self.extrapolate
    }

    /// Returns the degenerate grid used for quantities depending only on `s`.
    pub fn flux_function_grid(&self) -> Self {
        Self {
            rule: self.rule,
            ranges: In3D::new(
                self.ranges[Dim3::S],
                FLUX_FUNCTION_ANGLE_RANGE,
                FLUX_FUNCTION_ANGLE_RANGE,
            ),
            extrapolate: self.extrapolate,
        }
    }

    /// Returns the number of interpolation nodes along each dimension.
    pub fn node_counts(&self) -> In3D<usize> {
        let degree = self.rule.degree();
        self.ranges.map(|_, range| range.resolution * degree + 1)
    }
}
