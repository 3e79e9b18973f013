//! Magnetic fields expressed in Boozer coordinates.

pub mod analytic;
pub mod metric;

use crate::{
    error::{BoozerError, Result},
    grid::fgr,
    interpolation::fip,
    quantity::Quantity,
};
use metric::{ContravariantBoozerMetric, CovariantBoozerMetric};
use ndarray::prelude::*;
use std::{fmt, str::FromStr};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Classification of a field by which covariant components it carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum FieldType {
    /// Vacuum field: `I = 0` and `K = 0`.
    Vacuum,
    /// Finite-current field without the radial component `K`.
    NoK,
    /// Field with all covariant components.
    General,
}

impl FieldType {
    /// Returns the short tag identifying the field type.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Vacuum => "vac",
            Self::NoK => "nok",
            Self::General => "",
        }
    }

    /// Returns the quantities that are worth interpolating up front for this field type.
    pub fn default_initialization(self) -> &'static [Quantity] {
        use Quantity::*;
        match self {
            Self::Vacuum => &[ModB, Psip, G, Iota, ModBDerivs],
            Self::NoK => &[ModB, Psip, G, Iota, ModBDerivs, I, DGDs, DIDs],
            Self::General => &[ModB, Psip, G, Iota, ModBDerivs, I, DGDs, DIDs, K, KDerivs],
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::General => f.write_str("general"),
            _ => f.write_str(self.tag()),
        }
    }
}

impl FromStr for FieldType {
    type Err = BoozerError;

    fn from_str(tag: &str) -> Result<Self> {
        match tag {
            "vac" => Ok(Self::Vacuum),
            "nok" => Ok(Self::NoK),
            "" | "general" => Ok(Self::General),
            _ => Err(BoozerError::InvalidConfiguration(format!(
                "unknown field type {:?}",
                tag
            ))),
        }
    }
}

macro_rules! named_getters {
    ($($getter:ident => $variant:ident),*) => {
        $(
            #[doc = concat!("Evaluates `Quantity::", stringify!($variant), "` at the current points.")]
            fn $getter(&mut self) -> Result<Array2<fip>> {
                self.evaluate(Quantity::$variant)
            }
        )*
    };
}

/// Defines the properties of a provider of magnetic field quantities
/// in Boozer coordinates.
///
/// A source is stateful: points are set once with `set_points`, and every
/// subsequent evaluation refers to those points. Evaluated quantities have
/// shape `(n_points, arity)`.
pub trait BoozerFieldSource: Send {
    /// Sets the `(s, theta, zeta)` rows subsequent evaluations refer to.
    fn set_points(&mut self, points: Array2<fgr>) -> Result<()>;

    /// Returns a view of the current points.
    fn points(&self) -> ArrayView2<'_, fgr>;

    /// Returns a copy of the current points.
    fn get_points(&self) -> Array2<fgr> {
        self.points().to_owned()
    }

    /// Computes the given quantity at the current points.
    fn evaluate(&mut self, quantity: Quantity) -> Result<Array2<fip>>;

    /// Computes the quantity with the given name at the current points.
    fn evaluate_by_name(&mut self, name: &str) -> Result<Array2<fip>> {
        self.evaluate(name.parse()?)
    }

    /// Toroidal flux on the boundary divided by `2*pi`.
    fn psi0(&self) -> fip;

    fn field_type(&self) -> FieldType {
        FieldType::General
    }

    /// Number of toroidal field periods.
    fn nfp(&self) -> u32 {
        1
    }

    fn stellarator_symmetric(&self) -> bool {
        true
    }

    /// Computes the covariant metric of `(s, theta, zeta)` at the current
    /// points from `R`, `Z` and `nu` and their derivatives.
    fn covariant_metric(&mut self) -> Result<CovariantBoozerMetric> {
        metric::covariant_metric(self)
    }

    /// Computes the contravariant metric by inverting the covariant one.
    fn contravariant_metric(&mut self) -> Result<ContravariantBoozerMetric> {
        metric::contravariant_metric(self)
    }

    crate::for_each_quantity!(named_getters);
}

/// Stacks the components of a derivative bundle into one `(n_points, arity)` array,
/// evaluating each component separately.
///
/// Quantities that are not bundles are evaluated directly.
pub fn assemble_bundle<S>(source: &mut S, bundle: Quantity) -> Result<Array2<fip>>
where
    S: BoozerFieldSource + ?Sized,
{
    let components = match bundle.bundle_components() {
        Some(components) => components,
        None => return source.evaluate(bundle),
    };
    let n_points = source.points().nrows();
    let mut values = Array2::zeros((n_points, components.len()));

    for (&component, mut column) in components.iter().zip(values.columns_mut()) {
        let component_values = source.evaluate(component)?;
        if component_values.dim() != (n_points, 1) {
            return Err(BoozerError::ShapeMismatch {
                quantity: component.name(),
                expected: (n_points, 1),
                found: component_values.dim(),
            });
        }
        column.assign(&component_values.column(0));
    }
    Ok(values)
}
