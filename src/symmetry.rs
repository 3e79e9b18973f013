//! Folding of query points into the fundamental domain and the
//! sign corrections that undo the stellarator reflection.

use crate::{
    error::{BoozerError, Result},
    geometry::Point3,
    grid::fgr,
    interpolation::fip,
    num::{self, BFloat},
    quantity::Parity,
};
use ndarray::prelude::*;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Toroidal periodicity and stellarator symmetry of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct SymmetryConfig {
    nfp: u32,
    stellarator_symmetric: bool,
}

/// One flag per folded point, set when the point was reflected.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct FoldFlags(Vec<bool>);

impl FoldFlags {
    /// Returns the number of points the flags were computed for.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of reflected points.
    pub fn count_reflected(&self) -> usize {
        self.0.iter().filter(|&&reflected| reflected).count()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }
}

impl SymmetryConfig {
    /// Creates a new symmetry configuration.
    pub fn new(nfp: u32, stellarator_symmetric: bool) -> Result<Self> {
        if nfp == 0 {
            return Err(BoozerError::InvalidConfiguration(
                "number of field periods must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            nfp,
            stellarator_symmetric,
        })
    }

    /// Returns the number of toroidal field periods.
    pub fn nfp(&self) -> u32 {
        self.nfp
    }

    /// Whether the field is stellarator symmetric.
    pub fn stellarator_symmetric(&self) -> bool {
        self.stellarator_symmetric
    }

    /// Returns the toroidal extent of one field period.
    pub fn period<F: BFloat>(&self) -> F {
        num::two_pi::<F>() / F::from_u32(self.nfp).unwrap_or_else(F::one)
    }

    /// Maps a point to its canonical representative in the fundamental domain.
    ///
    /// Returns the folded point and whether the reflection was applied.
    pub fn fold_point<F: BFloat>(&self, point: &Point3<F>) -> (Point3<F>, bool) {
        let two_pi = num::two_pi::<F>();
        let period = self.period::<F>();

        let theta = num::reduce_periodic(point.theta(), two_pi);
        let zeta = num::reduce_periodic(point.zeta(), period);

        if self.stellarator_symmetric && theta > F::PI() {
            let mut reflected_zeta = period - zeta;
            if reflected_zeta >= period {
                reflected_zeta = F::zero();
            }
            (
                Point3::new(point.s(), two_pi - theta, reflected_zeta),
                true,
            )
        } else {
            (Point3::new(point.s(), theta, zeta), false)
        }
    }

    /// Folds every `(s, theta, zeta)` row of the given batch.
    pub fn fold_points(&self, points: ArrayView2<fgr>) -> Result<(Array2<fgr>, FoldFlags)> {
        check_point_columns(points)?;
        let mut folded = Array2::zeros(points.raw_dim());
        let mut flags = Vec::with_capacity(points.nrows());

        for (point_row, mut folded_row) in points.rows().into_iter().zip(folded.rows_mut()) {
            let (folded_point, reflected) = self.fold_point(&Point3::from_row(point_row));
            folded_row.assign(&ArrayView1::from(&folded_point.to_array()));
            flags.push(reflected);
        }
        let flags = FoldFlags(flags);
        tracing::trace!(
            points = flags.len(),
            reflected = flags.count_reflected(),
            "folded points"
        );
        Ok((folded, flags))
    }
}

/// Keeps the `s` column of every row and zeroes both angles.
pub fn fold_flux_points(points: ArrayView2<fgr>) -> Result<Array2<fgr>> {
    check_point_columns(points)?;
    let mut folded = Array2::zeros(points.raw_dim());
    folded.column_mut(0).assign(&points.column(0));
    Ok(folded)
}

/// Undoes the effect of the reflection on values computed at reflected points.
///
/// Odd scalars change sign, and so does the `s`-derivative component of odd
/// derivative triples. For even derivative triples the two angular derivatives
/// change sign. All other combinations are left untouched.
pub fn apply_parity(parity: Parity, values: &mut Array2<fip>, flags: &FoldFlags) -> Result<()> {
    if flags.len() != values.nrows() {
        return Err(BoozerError::FoldFlagMismatch {
            flags: flags.len(),
            values: values.nrows(),
        });
    }
    let components: &[usize] = match (parity, values.ncols()) {
        (Parity::Odd, 1) | (Parity::Odd, 3) => &[0],
        (Parity::Even, 3) => &[1, 2],
        _ => &[],
    };
    if components.is_empty() {
        return Ok(());
    }
    for (mut row, _) in values
        .rows_mut()
        .into_iter()
        .zip(flags.as_slice())
        .filter(|(_, reflected)| **reflected)
    {
        for &component in components {
            row[component] = -row[component];
        }
    }
    Ok(())
}

pub(crate) fn check_point_columns<T>(points: ArrayView2<T>) -> Result<()> {
    if points.ncols() == 3 {
        Ok(())
    } else {
        Err(BoozerError::InvalidPoints {
            columns: points.ncols(),
        })
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;
    use std::f64::consts::PI;

    fn config(nfp: u32, stellarator_symmetric: bool) -> SymmetryConfig {
        SymmetryConfig::new(nfp, stellarator_symmetric).unwrap()
    }

    #[test]
    fn zero_field_periods_are_rejected() {
        assert!(matches!(
            SymmetryConfig::new(0, true),
            Err(BoozerError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn reflection_maps_upper_half_to_lower_half() {
        let symmetry = config(2, true);
        let period = symmetry.period::<f64>();
        let (folded, reflected) = symmetry.fold_point(&Point3::new(0.4, 1.5 * PI, 0.25));
        assert!(reflected);
        assert_abs_diff_eq!(folded, Point3::new(0.4, 0.5 * PI, period - 0.25), epsilon = 1e-14);
    }

    #[test]
    fn negative_angles_are_wrapped() {
        let symmetry = config(1, false);
        let (folded, reflected) = symmetry.fold_point(&Point3::new(0.1, -0.5, -1.0));
        assert!(!reflected);
        assert_abs_diff_eq!(
            folded,
            Point3::new(0.1, 2.0 * PI - 0.5, 2.0 * PI - 1.0),
            epsilon = 1e-14
        );
    }

    #[test]
    fn reflection_of_period_start_wraps_to_zero() {
        let symmetry = config(3, true);
        let (folded, reflected) = symmetry.fold_point(&Point3::new(0.5, 4.0, 0.0));
        assert!(reflected);
        assert_eq!(folded.zeta(), 0.0);
    }

    #[test]
    fn flux_folding_zeroes_angles() {
        let points = array![[0.3, 1.0, 2.0], [0.7, -4.0, 9.0]];
        let folded = fold_flux_points(points.view()).unwrap();
        assert_eq!(folded, array![[0.3, 0.0, 0.0], [0.7, 0.0, 0.0]]);
    }

    #[test]
    fn batches_with_wrong_column_count_are_rejected() {
        let points = array![[0.3, 1.0, 2.0, 0.0]];
        assert!(matches!(
            config(1, true).fold_points(points.view()),
            Err(BoozerError::InvalidPoints { columns: 4 })
        ));
    }

    #[test]
    fn odd_scalars_flip_on_reflected_points_only() {
        let mut values = array![[1.0], [2.0], [3.0]];
        let flags = FoldFlags(vec![true, false, true]);
        apply_parity(Parity::Odd, &mut values, &flags).unwrap();
        assert_eq!(values, array![[-1.0], [2.0], [-3.0]]);
    }

    #[test]
    fn odd_triples_flip_first_component_only() {
        let mut values = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let flags = FoldFlags(vec![true, false]);
        apply_parity(Parity::Odd, &mut values, &flags).unwrap();
        assert_eq!(values, array![[-1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    }

    #[test]
    fn even_triples_flip_angular_components() {
        let mut values = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let flags = FoldFlags(vec![false, true]);
        apply_parity(Parity::Even, &mut values, &flags).unwrap();
        assert_eq!(values, array![[1.0, 2.0, 3.0], [4.0, -5.0, -6.0]]);
    }

    #[test]
    fn even_scalars_and_pairs_are_untouched() {
        let flags = FoldFlags(vec![true]);
        let mut scalar = array![[1.0]];
        apply_parity(Parity::Even, &mut scalar, &flags).unwrap();
        assert_eq!(scalar, array![[1.0]]);
        let mut pair = array![[1.0, 2.0]];
        apply_parity(Parity::Even, &mut pair, &flags).unwrap();
        apply_parity(Parity::Odd, &mut pair, &flags).unwrap();
        assert_eq!(pair, array![[1.0, 2.0]]);
    }

    #[test]
    fn mismatched_flags_are_rejected() {
        let mut values = array![[1.0], [2.0]];
        let flags = FoldFlags(vec![true]);
        assert!(matches!(
            apply_parity(Parity::Odd, &mut values, &flags),
            Err(BoozerError::FoldFlagMismatch {
                flags: 1,
                values: 2
            })
        ));
    }

    proptest! {
        #[test]
        fn folding_is_idempotent(
            s in 0.0..1.0f64,
            theta in -50.0..50.0f64,
            zeta in -50.0..50.0f64,
            nfp in 1u32..6,
            stellarator_symmetric in any::<bool>(),
        ) {
            let symmetry = config(nfp, stellarator_symmetric);
            let (once, _) = symmetry.fold_point(&Point3::new(s, theta, zeta));
            let (twice, reflected_again) = symmetry.fold_point(&once);
            prop_assert_eq!(&twice, &once);
            prop_assert!(!reflected_again);
        }

        #[test]
        fn folded_points_lie_in_fundamental_domain(
            s in 0.0..1.0f64,
            theta in -50.0..50.0f64,
            zeta in -50.0..50.0f64,
            nfp in 1u32..6,
            stellarator_symmetric in any::<bool>(),
        ) {
            let symmetry = config(nfp, stellarator_symmetric);
            let period = symmetry.period::<f64>();
            let (folded, _) = symmetry.fold_point(&Point3::new(s, theta, zeta));
            prop_assert_eq!(folded.s(), s);
            prop_assert!(folded.theta() >= 0.0);
            if stellarator_symmetric {
                prop_assert!(folded.theta() <= PI);
            } else {
                prop_assert!(folded.theta() < 2.0 * PI);
            }
            prop_assert!(folded.zeta() >= 0.0 && folded.zeta() < period);
        }
    }
}
