//! Field that replaces evaluations of another field with cached interpolants,
//! exploiting field periodicity and stellarator symmetry.

use crate::{
    error::{BoozerError, Result},
    field::{BoozerFieldSource, FieldType},
    geometry::Dim3,
    grid::{fgr, GridDescription, InterpolationRule, RangeTriplet},
    interpolation::{fip, regular_grid::RegularGridInterpolant3, ErrorEstimate, GridInterpolant3},
    num,
    quantity::{Parity, Quantity},
    sampling::BatchSampler,
    symmetry::{self, SymmetryConfig},
};
use ndarray::prelude::*;
use paste::paste;
use rand::Rng;
use std::sync::{Arc, Mutex, MutexGuard};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Configuration parameters for interpolated fields.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct InterpolatedFieldConfig {
    /// Polynomial degree of the interpolant in each cell.
    pub degree: usize,
    /// Range in `s`. Defaults to `(0, 1, n_s)`.
    pub s_range: Option<RangeTriplet>,
    /// Range in `theta`. Defaults to `(0, pi, n_theta)` for stellarator
    /// symmetric fields and `(0, 2*pi, n_theta)` otherwise.
    pub theta_range: Option<RangeTriplet>,
    /// Range in `zeta`. Defaults to one field period with `n_zeta` cells.
    pub zeta_range: Option<RangeTriplet>,
    /// Number of cells in `s` when no range is given.
    pub n_s: usize,
    /// Number of cells in `theta` when no range is given.
    pub n_theta: usize,
    /// Number of cells in `zeta` when no range is given.
    pub n_zeta: usize,
    /// Whether to evaluate outside the ranges instead of failing.
    pub extrapolate: bool,
    /// Number of field periods. Taken from the source when not given.
    pub nfp: Option<u32>,
    /// Whether to exploit stellarator symmetry. Taken from the source when not given.
    pub stellarator_symmetric: Option<bool>,
    /// Quantities to build by `initialize`. Determined by the field type when not given.
    pub initialize: Option<Vec<Quantity>>,
}

impl InterpolatedFieldConfig {
    pub const DEFAULT_DEGREE: usize = 3;
    pub const DEFAULT_N_S: usize = 48;
    pub const DEFAULT_N_THETA: usize = 48;
    pub const DEFAULT_N_ZETA: usize = 48;
    pub const DEFAULT_EXTRAPOLATE: bool = true;

    /// Creates a default configuration with the given interpolation degree.
    pub fn with_degree(degree: usize) -> Self {
        Self {
            degree,
            ..Self::default()
        }
    }
}

impl Default for InterpolatedFieldConfig {
    fn default() -> Self {
        Self {
            degree: Self::DEFAULT_DEGREE,
            s_range: None,
            theta_range: None,
            zeta_range: None,
            n_s: Self::DEFAULT_N_S,
            n_theta: Self::DEFAULT_N_THETA,
            n_zeta: Self::DEFAULT_N_ZETA,
            extrapolate: Self::DEFAULT_EXTRAPOLATE,
            nfp: None,
            stellarator_symmetric: None,
            initialize: None,
        }
    }
}

/// State of the interpolant for one quantity.
#[derive(Clone, Debug)]
pub enum CacheEntry<I> {
    Unbuilt,
    Built(I),
}

impl<I> CacheEntry<I> {
    pub fn is_built(&self) -> bool {
        matches!(self, Self::Built(_))
    }

    /// Returns the interpolant if it has been built.
    pub fn interpolant(&self) -> Option<&I> {
        match self {
            Self::Built(interpolant) => Some(interpolant),
            Self::Unbuilt => None,
        }
    }
}

/// A Boozer field evaluated through lazily built interpolants of another field.
///
/// Query points are folded into the fundamental domain given by the field
/// periods and the stellarator symmetry before evaluation, and values at
/// reflected points are sign corrected according to the parity of the
/// quantity. Each interpolant is built on first use and never rebuilt, so
/// later changes to the wrapped source are not picked up.
pub struct InterpolatedBoozerField<S, I = RegularGridInterpolant3> {
    source: Arc<Mutex<S>>,
    grid: GridDescription,
    flux_grid: GridDescription,
    symmetry: SymmetryConfig,
    field_type: FieldType,
    psi0: fip,
    initialization: Vec<Quantity>,
    entries: Vec<CacheEntry<I>>,
    points: Array2<fgr>,
}

macro_rules! error_estimators {
    ($($name:ident => $variant:ident),*) => {
        paste! {
            $(
                /// Estimates the interpolation error of the quantity the method is named after.
                pub fn [<estimate_error_ $name>](&mut self, n_samples: usize) -> Result<ErrorEstimate> {
                    self.estimate_error(Quantity::$variant, n_samples)
                }
            )*
        }
    };
}

impl<S, I> InterpolatedBoozerField<S, I>
where
    S: BoozerFieldSource,
    I: GridInterpolant3,
{
    /// Creates a new interpolated field wrapping the given source.
    ///
    /// Construction only reads the source's metadata. No interpolants are
    /// built here: each one is built when first evaluated, or up front by
    /// calling [`initialize`](Self::initialize), which builds the
    /// initialization list.
    pub fn new(source: Arc<Mutex<S>>, config: InterpolatedFieldConfig) -> Result<Self> {
        let (psi0, field_type, source_nfp, source_stellsym) = {
            let source = Self::lock(&source)?;
            (
                source.psi0(),
                source.field_type(),
                source.nfp(),
                source.stellarator_symmetric(),
            )
        };
        let symmetry = SymmetryConfig::new(
            config.nfp.unwrap_or(source_nfp),
            config.stellarator_symmetric.unwrap_or(source_stellsym),
        )?;

        let [s_range, theta_range, zeta_range] = resolve_ranges(&config, &symmetry)?;
        let grid = GridDescription::new(
            InterpolationRule::uniform(config.degree)?,
            s_range,
            theta_range,
            zeta_range,
            config.extrapolate,
        )?;
        let flux_grid = grid.flux_function_grid();

        let initialization = resolve_initialization(config.initialize, field_type);

        tracing::debug!(
            degree = config.degree,
            s = %s_range,
            theta = %theta_range,
            zeta = %zeta_range,
            nfp = symmetry.nfp(),
            stellarator_symmetric = symmetry.stellarator_symmetric(),
            field_type = %field_type,
            "created interpolated field"
        );

        Ok(Self {
            source,
            grid,
            flux_grid,
            symmetry,
            field_type,
            psi0,
            initialization,
            entries: (0..Quantity::COUNT).map(|_| CacheEntry::Unbuilt).collect(),
            points: Array2::zeros((0, 3)),
        })
    }

    /// Creates a new interpolated field taking ownership of the given source.
    pub fn from_source(source: S, config: InterpolatedFieldConfig) -> Result<Self> {
        Self::new(Arc::new(Mutex::new(source)), config)
    }

    /// Returns the shared handle to the wrapped source.
    pub fn source(&self) -> &Arc<Mutex<S>> {
        &self.source
    }

    /// Returns the grid used for quantities that depend on all coordinates.
    pub fn grid(&self) -> &GridDescription {
        &self.grid
    }

    /// Returns the grid used for flux functions.
    pub fn flux_grid(&self) -> &GridDescription {
        &self.flux_grid
    }

    pub fn symmetry(&self) -> &SymmetryConfig {
        &self.symmetry
    }

    /// Returns the quantities built by `initialize`.
    pub fn initialization(&self) -> &[Quantity] {
        &self.initialization
    }

    /// Whether the interpolant for the given quantity has been built.
    pub fn is_built(&self, quantity: Quantity) -> bool {
        self.entries[quantity.index()].is_built()
    }

    /// Returns the cache entry of the given quantity.
    pub fn entry(&self, quantity: Quantity) -> &CacheEntry<I> {
        &self.entries[quantity.index()]
    }

    /// Builds the interpolant for the given quantity unless it already exists.
    pub fn build(&mut self, quantity: Quantity) -> Result<()> {
        if self.is_built(quantity) {
            return Ok(());
        }
        let interpolant = self.build_interpolant(quantity)?;
        self.entries[quantity.index()] = CacheEntry::Built(interpolant);
        Ok(())
    }

    /// Builds the interpolants for all quantities in the initialization list.
    pub fn initialize(&mut self) -> Result<()> {
        for quantity in self.initialization.clone() {
            self.build(quantity)?;
        }
        Ok(())
    }

    /// Compares the interpolant of the given quantity with the wrapped source
    /// at random points, building the interpolant first if necessary.
    pub fn estimate_error(&mut self, quantity: Quantity, n_samples: usize) -> Result<ErrorEstimate> {
        self.estimate_error_with_rng(quantity, n_samples, &mut rand::rng())
    }

    /// Like `estimate_error`, but drawing the sample points from the given generator.
    pub fn estimate_error_with_rng<R: Rng>(
        &mut self,
        quantity: Quantity,
        n_samples: usize,
        rng: &mut R,
    ) -> Result<ErrorEstimate> {
        self.build(quantity)?;
        let interpolant = self.built_interpolant(quantity)?;

        let mut source = Self::lock(&self.source)?;
        let mut sampler = BatchSampler::new(&mut *source, quantity);
        let estimate = interpolant.estimate_error(
            |s, theta, zeta| sampler.sample(s, theta, zeta),
            n_samples,
            rng,
        );
        let restored = sampler.finish();
        let estimate = estimate?;
        restored?;

        tracing::debug!(
            quantity = %quantity,
            mean_abs_error = estimate.mean_abs_error,
            max_abs_error = estimate.max_abs_error,
            "estimated interpolation error"
        );
        Ok(estimate)
    }

    error_estimators!(
        mod_b => ModB,
        k => K,
        r => R,
        z => Z,
        nu => Nu,
        g => G,
        i => I,
        iota => Iota
    );

    fn lock(source: &Mutex<S>) -> Result<MutexGuard<'_, S>> {
        source.lock().map_err(|_| BoozerError::SourcePoisoned)
    }

    fn grid_for(&self, quantity: Quantity) -> &GridDescription {
        if quantity.is_flux_function() {
            &self.flux_grid
        } else {
            &self.grid
        }
    }

    fn build_interpolant(&self, quantity: Quantity) -> Result<I> {
        let grid = self.grid_for(quantity);
        let mut interpolant = I::new(grid, quantity.arity())?;
        let node_counts = grid.node_counts();
        let n_nodes: usize = node_counts.iter().product();

        tracing::debug!(
            quantity = %quantity,
            nodes = n_nodes,
            shape = %node_counts,
            value_size = quantity.arity(),
            "building interpolant"
        );

        let mut source = Self::lock(&self.source)?;
        let mut sampler = BatchSampler::new(&mut *source, quantity);
        let built = interpolant.interpolate_batch(|s, theta, zeta| sampler.sample(s, theta, zeta));
        let restored = sampler.finish();
        if let Err(err) = &built {
            tracing::debug!(quantity = %quantity, %err, "building interpolant failed");
        }
        built?;
        restored?;

        tracing::debug!(quantity = %quantity, "built interpolant");
        Ok(interpolant)
    }

    fn built_interpolant(&self, quantity: Quantity) -> Result<&I> {
        self.entries[quantity.index()].interpolant().ok_or_else(|| {
            BoozerError::Internal(format!("interpolant for {} is not built", quantity))
        })
    }
}

impl<S, I> BoozerFieldSource for InterpolatedBoozerField<S, I>
where
    S: BoozerFieldSource,
    I: GridInterpolant3,
{
    fn set_points(&mut self, points: Array2<fgr>) -> Result<()> {
        symmetry::check_point_columns(points.view())?;
        self.points = points;
        Ok(())
    }

    fn points(&self) -> ArrayView2<'_, fgr> {
        self.points.view()
    }

    fn evaluate(&mut self, quantity: Quantity) -> Result<Array2<fip>> {
        self.build(quantity)?;

        let (folded, flags) = if quantity.is_flux_function() {
            (symmetry::fold_flux_points(self.points.view())?, None)
        } else {
            let (folded, flags) = self.symmetry.fold_points(self.points.view())?;
            (folded, Some(flags))
        };

        let mut values = Array2::zeros((folded.nrows(), quantity.arity()));
        self.built_interpolant(quantity)?
            .evaluate_batch(folded.view(), values.view_mut())?;

        if let Some(flags) = flags {
            if self.symmetry.stellarator_symmetric() && quantity.parity() != Parity::None {
                symmetry::apply_parity(quantity.parity(), &mut values, &flags)?;
            }
        }
        Ok(values)
    }

    fn psi0(&self) -> fip {
        self.psi0
    }

    fn field_type(&self) -> FieldType {
        self.field_type
    }

    fn nfp(&self) -> u32 {
        self.symmetry.nfp()
    }

    fn stellarator_symmetric(&self) -> bool {
        self.symmetry.stellarator_symmetric()
    }
}

fn resolve_ranges(
    config: &InterpolatedFieldConfig,
    symmetry: &SymmetryConfig,
) -> Result<[RangeTriplet; 3]> {
    let two_pi = num::two_pi::<fgr>();
    let period = symmetry.period::<fgr>();

    let s_range = config
        .s_range
        .unwrap_or_else(|| RangeTriplet::new(0.0, 1.0, config.n_s));
    let theta_range = config.theta_range.unwrap_or_else(|| {
        let upper = if symmetry.stellarator_symmetric() {
            std::f64::consts::PI
        } else {
            two_pi
        };
        RangeTriplet::new(0.0, upper, config.n_theta)
    });
    let zeta_range = config
        .zeta_range
        .unwrap_or_else(|| RangeTriplet::new(0.0, period, config.n_zeta));

    for (dim, range) in [(Dim3::Theta, &theta_range), (Dim3::Zeta, &zeta_range)] {
        if range.lower < 0.0 || range.upper > two_pi {
            return Err(BoozerError::InvalidConfiguration(format!(
                "{} range {} must lie within [0, 2*pi]",
                dim, range
            )));
        }
    }
    if symmetry.stellarator_symmetric() && theta_range.upper > std::f64::consts::PI {
        tracing::warn!(
            theta = %theta_range,
            "with stellarator symmetry only theta in [0, pi] is ever evaluated"
        );
    }
    if symmetry.nfp() > 1 && zeta_range.upper > period {
        tracing::warn!(
            zeta = %zeta_range,
            period,
            "with field periodicity only zeta within one period is ever evaluated"
        );
    }
    Ok([s_range, theta_range, zeta_range])
}

fn resolve_initialization(requested: Option<Vec<Quantity>>, field_type: FieldType) -> Vec<Quantity> {
    let default = field_type.default_initialization();
    match requested {
        None => default.to_vec(),
        Some(requested) if requested.is_empty() => default.to_vec(),
        Some(requested) => {
            let mut sorted_requested = requested.clone();
            sorted_requested.sort();
            sorted_requested.dedup();
            let mut sorted_default = default.to_vec();
            sorted_default.sort();
            if sorted_requested != sorted_default {
                tracing::warn!(
                    field_type = %field_type,
                    requested = ?requested,
                    "initialization list does not match the field type"
                );
            }
            requested
        }
    }
}
