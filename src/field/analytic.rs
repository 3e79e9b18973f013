//! Closed-form near-axis field with optional symmetry-breaking modes.

use super::{assemble_bundle, BoozerFieldSource, FieldType};
use crate::{
    error::{BoozerError, Result},
    grid::fgr,
    interpolation::fip,
    quantity::Quantity,
    symmetry::check_point_columns,
};
use ndarray::prelude::*;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// A perturbation `amplitude * cos(m*theta - n*N*zeta)` of the field strength.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct PerturbationMode {
    pub amplitude: fip,
    /// Poloidal mode number.
    pub m: fip,
    /// Toroidal mode number, in units of the helicity.
    pub n: fip,
}

/// Coefficients of the first-order near-axis model.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct AnalyticFieldParameters {
    /// First-order correction to the field strength.
    pub etabar: fip,
    /// Field strength on the axis.
    pub b0: fip,
    /// Helicity of the symmetry.
    pub helicity: fip,
    pub g0: fip,
    /// Toroidal flux on the boundary divided by `2*pi`.
    pub psi0: fip,
    pub iota0: fip,
    /// Normalizing field strength.
    pub bbar: fip,
    pub i0: fip,
    pub g1: fip,
    pub i1: fip,
    pub k1: fip,
    pub iota1: fip,
    pub perturbations: Vec<PerturbationMode>,
}

impl AnalyticFieldParameters {
    pub const DEFAULT_BBAR: fip = 1.0;

    /// Creates parameters for a quasi-symmetric vacuum field.
    pub fn new(etabar: fip, b0: fip, helicity: fip, g0: fip, psi0: fip, iota0: fip) -> Self {
        Self {
            etabar,
            b0,
            helicity,
            g0,
            psi0,
            iota0,
            bbar: Self::DEFAULT_BBAR,
            i0: 0.0,
            g1: 0.0,
            i1: 0.0,
            k1: 0.0,
            iota1: 0.0,
            perturbations: Vec::new(),
        }
    }
}

/// Field evaluated directly from the first-order expansion in distance from
/// the magnetic axis.
///
/// Cylindrical quantities (`R`, `Z`, `nu`) are not available.
#[derive(Clone, Debug)]
pub struct AnalyticBoozerField {
    parameters: AnalyticFieldParameters,
    field_type: FieldType,
    points: Array2<fgr>,
}

macro_rules! parameter_setters {
    ($($setter:ident => $field:ident),*) => {
        $(
            pub fn $setter(&mut self, value: fip) {
                self.parameters.$field = value;
                self.update_field_type();
            }
        )*
    };
}

impl AnalyticBoozerField {
    /// Creates a new analytic field with no points set.
    pub fn new(parameters: AnalyticFieldParameters) -> Self {
        let field_type = Self::derive_field_type(&parameters);
        Self {
            parameters,
            field_type,
            points: Array2::zeros((0, 3)),
        }
    }

    pub fn parameters(&self) -> &AnalyticFieldParameters {
        &self.parameters
    }

    parameter_setters!(
        set_etabar => etabar,
        set_b0 => b0,
        set_helicity => helicity,
        set_g0 => g0,
        set_psi0 => psi0,
        set_iota0 => iota0,
        set_bbar => bbar,
        set_i0 => i0,
        set_g1 => g1,
        set_i1 => i1,
        set_k1 => k1,
        set_iota1 => iota1
    );

    pub fn set_perturbations(&mut self, perturbations: Vec<PerturbationMode>) {
        self.parameters.perturbations = perturbations;
    }

    fn derive_field_type(parameters: &AnalyticFieldParameters) -> FieldType {
        if parameters.i0 == 0.0 && parameters.i1 == 0.0 && parameters.g1 == 0.0 && parameters.k1 == 0.0
        {
            FieldType::Vacuum
        } else if parameters.k1 == 0.0 {
            FieldType::NoK
        } else {
            FieldType::General
        }
    }

    fn update_field_type(&mut self) {
        self.field_type = Self::derive_field_type(&self.parameters);
    }

    /// Distance from the axis in units where `psi = B r^2 / 2`.
    fn minor_radius(&self, s: fgr) -> fip {
        (2.0 * s * self.parameters.psi0 / self.parameters.bbar)
            .abs()
            .sqrt()
    }

    fn helical_angle(&self, theta: fgr, zeta: fgr) -> fip {
        theta - self.parameters.helicity * zeta
    }

    fn mode_angle(&self, mode: &PerturbationMode, theta: fgr, zeta: fgr) -> fip {
        mode.m * theta - mode.n * self.parameters.helicity * zeta
    }

    fn compute_scalar(&self, quantity: Quantity, s: fgr, theta: fgr, zeta: fgr) -> Result<fip> {
        use Quantity::*;
        let p = &self.parameters;
        let r = self.minor_radius(s);
        let chi = self.helical_angle(theta, zeta);

        let value = match quantity {
            ModB => {
                p.b0 * (1.0 + p.etabar * r * chi.cos())
                    + p.perturbations
                        .iter()
                        .map(|mode| mode.amplitude * self.mode_angle(mode, theta, zeta).cos())
                        .sum::<fip>()
            }
            DModBDs => {
                let psi = s * p.psi0;
                if p.etabar == 0.0 || psi == 0.0 {
                    0.0
                } else {
                    let drds = 0.5 * r * p.psi0 / psi;
                    p.b0 * p.etabar * drds * chi.cos()
                }
            }
            DModBDtheta => {
                -p.b0 * p.etabar * r * chi.sin()
                    - p.perturbations
                        .iter()
                        .map(|mode| {
                            mode.amplitude * mode.m * self.mode_angle(mode, theta, zeta).sin()
                        })
                        .sum::<fip>()
            }
            DModBDzeta => {
                p.helicity * p.b0 * p.etabar * r * chi.sin()
                    + p.perturbations
                        .iter()
                        .map(|mode| {
                            mode.amplitude
                                * mode.n
                                * p.helicity
                                * self.mode_angle(mode, theta, zeta).sin()
                        })
                        .sum::<fip>()
            }
            G => p.g0 + s * p.g1,
            DGDs => p.g1,
            I => p.i0 + s * p.i1,
            DIDs => p.i1,
            Iota => p.iota0 + p.iota1 * s,
            DIotaDs => p.iota1,
            Psip => p.psi0 * (s * p.iota0 + s * s * p.iota1 / 2.0),
            K => p.k1 * r * chi.sin(),
            DKDtheta => p.k1 * r * chi.cos(),
            DKDzeta => -p.helicity * p.k1 * r * chi.cos(),
            _ => {
                return Err(BoozerError::UnsupportedQuantity {
                    quantity: quantity.name(),
                })
            }
        };
        Ok(value)
    }
}

impl BoozerFieldSource for AnalyticBoozerField {
    fn set_points(&mut self, points: Array2<fgr>) -> Result<()> {
        check_point_columns(points.view())?;
        self.points = points;
        Ok(())
    }

    fn points(&self) -> ArrayView2<'_, fgr> {
        self.points.view()
    }

    fn evaluate(&mut self, quantity: Quantity) -> Result<Array2<fip>> {
        if quantity.bundle_components().is_some() {
            return assemble_bundle(self, quantity);
        }
        let mut values = Array2::zeros((self.points.nrows(), 1));
        for (point, value) in self.points.rows().into_iter().zip(values.iter_mut()) {
            *value = self.compute_scalar(quantity, point[0], point[1], point[2])?;
        }
        Ok(values)
    }

    fn psi0(&self) -> fip {
        self.parameters.psi0
    }

    fn field_type(&self) -> FieldType {
        self.field_type
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn field() -> AnalyticBoozerField {
        let mut parameters = AnalyticFieldParameters::new(1.2, 1.0, 3.0, 1.1, 0.8, 0.42);
        parameters.iota1 = 0.1;
        parameters.perturbations = vec![PerturbationMode {
            amplitude: 0.05,
            m: 2.0,
            n: 1.0,
        }];
        AnalyticBoozerField::new(parameters)
    }

    #[test]
    fn field_type_follows_coefficients() {
        let mut field = field();
        assert_eq!(field.field_type(), FieldType::Vacuum);
        field.set_i1(0.3);
        assert_eq!(field.field_type(), FieldType::NoK);
        field.set_k1(0.2);
        assert_eq!(field.field_type(), FieldType::General);
        field.set_i1(0.0);
        field.set_k1(0.0);
        assert_eq!(field.field_type(), FieldType::Vacuum);
    }

    #[test]
    fn flux_functions_match_closed_form() {
        let mut field = field();
        field.set_points(array![[0.5, 1.0, 2.0]]).unwrap();
        assert_abs_diff_eq!(field.iota().unwrap()[[0, 0]], 0.47, epsilon = 1e-14);
        assert_abs_diff_eq!(
            field.psip().unwrap()[[0, 0]],
            0.8 * (0.5 * 0.42 + 0.25 * 0.1 / 2.0),
            epsilon = 1e-14
        );
        assert_abs_diff_eq!(field.g().unwrap()[[0, 0]], 1.1, epsilon = 1e-14);
    }

    #[test]
    fn field_strength_derivatives_match_finite_differences() {
        let mut field = field();
        let (s, theta, zeta) = (0.4, 0.7, 0.3);
        let h = 1e-6;
        let points = array![
            [s, theta, zeta],
            [s + h, theta, zeta],
            [s - h, theta, zeta],
            [s, theta + h, zeta],
            [s, theta - h, zeta],
            [s, theta, zeta + h],
            [s, theta, zeta - h]
        ];
        field.set_points(points).unwrap();
        let mod_b = field.mod_b().unwrap();
        let derivs = field.mod_b_derivs().unwrap();
        for (component, (plus, minus)) in [(1, 2), (3, 4), (5, 6)].into_iter().enumerate() {
            let finite_difference = (mod_b[[plus, 0]] - mod_b[[minus, 0]]) / (2.0 * h);
            assert_abs_diff_eq!(derivs[[0, component]], finite_difference, epsilon = 1e-6);
        }
    }

    #[test]
    fn radial_covariant_component_is_odd_under_reflection() {
        let mut field = field();
        field.set_k1(0.7);
        field
            .set_points(array![[0.3, 0.4, 0.2], [0.3, 2.0 * PI - 0.4, -0.2]])
            .unwrap();
        let k = field.k().unwrap();
        assert_abs_diff_eq!(k[[0, 0]], -k[[1, 0]], epsilon = 1e-12);
        let k_derivs = field.k_derivs().unwrap();
        assert_eq!(k_derivs.dim(), (2, 2));
        assert_abs_diff_eq!(k_derivs[[0, 0]], k_derivs[[1, 0]], epsilon = 1e-12);
    }

    #[test]
    fn cylindrical_quantities_are_unsupported() {
        let mut field = field();
        field.set_points(array![[0.3, 0.4, 0.2]]).unwrap();
        assert!(matches!(
            field.r(),
            Err(BoozerError::UnsupportedQuantity { quantity: "R" })
        ));
        assert!(matches!(
            field.nu_derivs(),
            Err(BoozerError::UnsupportedQuantity { quantity: "dnuds" })
        ));
    }
}
