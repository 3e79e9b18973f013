#![allow(dead_code)]

use boozer_interp::{
    field::{
        analytic::{AnalyticBoozerField, AnalyticFieldParameters, PerturbationMode},
        BoozerFieldSource, FieldType,
    },
    grid::fgr,
    interpolation::fip,
    BoozerError, InterpolatedBoozerField, InterpolatedFieldConfig, Quantity, Result,
};
use ndarray::prelude::*;
use std::{
    collections::HashMap,
    f64::consts::PI,
    sync::{Arc, Mutex},
};

/// Field source with simple closed-form quantities that records how it is used.
///
/// - `modB = 1 + s + 0.1 theta zeta`
/// - `iota = 0.4 + 0.2 s + 0.01 theta` (the angle term exposes unzeroed angles)
/// - `K = theta - pi/2 + offset`
/// - `modB_derivs = [s, theta + 10, zeta + 20]`
pub struct TestField {
    points: Array2<fgr>,
    evaluations: HashMap<Quantity, usize>,
    set_points_calls: usize,
    failures_left: usize,
    pub offset: fip,
}

impl TestField {
    pub fn new() -> Self {
        Self {
            points: array![[0.25, 0.5, 0.75], [0.6, 6.0, -2.0]],
            evaluations: HashMap::new(),
            set_points_calls: 0,
            failures_left: 0,
            offset: 0.0,
        }
    }

    /// Number of times the given quantity has been evaluated.
    pub fn evaluations(&self, quantity: Quantity) -> usize {
        self.evaluations.get(&quantity).copied().unwrap_or(0)
    }

    pub fn set_points_calls(&self) -> usize {
        self.set_points_calls
    }

    /// Makes the next `count` evaluations fail.
    pub fn fail_next(&mut self, count: usize) {
        self.failures_left = count;
    }

    fn compute(&self, quantity: Quantity, s: fgr, theta: fgr, zeta: fgr) -> Result<Vec<fip>> {
        match quantity {
            Quantity::ModB => Ok(vec![1.0 + s + 0.1 * theta * zeta]),
            Quantity::Iota => Ok(vec![0.4 + 0.2 * s + 0.01 * theta]),
            Quantity::K => Ok(vec![theta - PI / 2.0 + self.offset]),
            Quantity::ModBDerivs => Ok(vec![s, theta + 10.0, zeta + 20.0]),
            _ => Err(BoozerError::UnsupportedQuantity {
                quantity: quantity.name(),
            }),
        }
    }
}

impl BoozerFieldSource for TestField {
    fn set_points(&mut self, points: Array2<fgr>) -> Result<()> {
        self.set_points_calls += 1;
        self.points = points;
        Ok(())
    }

    fn points(&self) -> ArrayView2<'_, fgr> {
        self.points.view()
    }

    fn evaluate(&mut self, quantity: Quantity) -> Result<Array2<fip>> {
        *self.evaluations.entry(quantity).or_insert(0) += 1;
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(BoozerError::FieldSource("injected failure".to_string()));
        }
        let mut values = Array2::zeros((self.points.nrows(), quantity.arity()));
        for (point, mut row) in self.points.rows().into_iter().zip(values.rows_mut()) {
            let computed = self.compute(quantity, point[0], point[1], point[2])?;
            row.assign(&ArrayView1::from(&computed));
        }
        Ok(values)
    }

    fn psi0(&self) -> fip {
        1.0
    }

    fn field_type(&self) -> FieldType {
        FieldType::General
    }
}

/// Coarse linear grid, which reproduces the test field's quantities exactly.
pub fn linear_config() -> InterpolatedFieldConfig {
    InterpolatedFieldConfig {
        degree: 1,
        n_s: 4,
        n_theta: 8,
        n_zeta: 8,
        ..InterpolatedFieldConfig::default()
    }
}

pub fn interpolated_test_field(
    config: InterpolatedFieldConfig,
) -> (Arc<Mutex<TestField>>, InterpolatedBoozerField<TestField>) {
    let source = Arc::new(Mutex::new(TestField::new()));
    let field = InterpolatedBoozerField::new(Arc::clone(&source), config).unwrap();
    (source, field)
}

/// Stellarator symmetric near-axis field with a radial covariant component
/// and one symmetry-preserving perturbation.
pub fn analytic_field() -> AnalyticBoozerField {
    let mut parameters = AnalyticFieldParameters::new(1.1, 1.0, 2.0, 1.2, 0.7, 0.45);
    parameters.iota1 = 0.15;
    parameters.i1 = 0.2;
    parameters.k1 = 0.3;
    parameters.perturbations = vec![PerturbationMode {
        amplitude: 0.02,
        m: 2.0,
        n: 1.0,
    }];
    AnalyticBoozerField::new(parameters)
}

/// Stellarator symmetric three-period surface geometry with `chi = theta - 3 zeta`:
///
/// - `R = 1 + s cos(chi)`
/// - `Z = s sin(chi)`
/// - `nu = 0.1 s sin(chi)`
pub struct PeriodicTestField {
    points: Array2<fgr>,
}

impl PeriodicTestField {
    pub const NFP: u32 = 3;
    pub const NU_AMPLITUDE: fip = 0.1;

    pub fn new() -> Self {
        Self {
            points: array![[0.5, 0.0, 0.0]],
        }
    }

    /// Cartesian position, used to check the metric by finite differences.
    pub fn position(s: fgr, theta: fgr, zeta: fgr) -> [fip; 3] {
        let chi = theta - fip::from(Self::NFP) * zeta;
        let r = 1.0 + s * chi.cos();
        let phi = zeta - Self::NU_AMPLITUDE * s * chi.sin();
        [r * phi.cos(), r * phi.sin(), s * chi.sin()]
    }

    fn compute(quantity: Quantity, s: fgr, theta: fgr, zeta: fgr) -> Result<Vec<fip>> {
        let n = fip::from(Self::NFP);
        let a = Self::NU_AMPLITUDE;
        let (sin, cos) = (theta - n * zeta).sin_cos();
        let r_derivs = [cos, -s * sin, n * s * sin];
        let z_derivs = [sin, s * cos, -n * s * cos];
        let nu_derivs = [a * sin, a * s * cos, -a * n * s * cos];
        let values = match quantity {
            Quantity::R => vec![1.0 + s * cos],
            Quantity::DRDs => vec![r_derivs[0]],
            Quantity::DRDtheta => vec![r_derivs[1]],
            Quantity::DRDzeta => vec![r_derivs[2]],
            Quantity::RDerivs => r_derivs.to_vec(),
            Quantity::Z => vec![s * sin],
            Quantity::DZDs => vec![z_derivs[0]],
            Quantity::DZDtheta => vec![z_derivs[1]],
            Quantity::DZDzeta => vec![z_derivs[2]],
            Quantity::ZDerivs => z_derivs.to_vec(),
            Quantity::Nu => vec![a * s * sin],
            Quantity::DNuDs => vec![nu_derivs[0]],
            Quantity::DNuDtheta => vec![nu_derivs[1]],
            Quantity::DNuDzeta => vec![nu_derivs[2]],
            Quantity::NuDerivs => nu_derivs.to_vec(),
            _ => {
                return Err(BoozerError::UnsupportedQuantity {
                    quantity: quantity.name(),
                })
            }
        };
        Ok(values)
    }
}

impl BoozerFieldSource for PeriodicTestField {
    fn set_points(&mut self, points: Array2<fgr>) -> Result<()> {
        self.points = points;
        Ok(())
    }

    fn points(&self) -> ArrayView2<'_, fgr> {
        self.points.view()
    }

    fn evaluate(&mut self, quantity: Quantity) -> Result<Array2<fip>> {
        let mut values = Array2::zeros((self.points.nrows(), quantity.arity()));
        for (point, mut row) in self.points.rows().into_iter().zip(values.rows_mut()) {
            let computed = Self::compute(quantity, point[0], point[1], point[2])?;
            row.assign(&ArrayView1::from(&computed));
        }
        Ok(values)
    }

    fn psi0(&self) -> fip {
        0.5
    }

    fn nfp(&self) -> u32 {
        Self::NFP
    }
}

/// The surface quantities of `PeriodicTestField`.
pub const SURFACE_QUANTITIES: [Quantity; 15] = [
    Quantity::R,
    Quantity::DRDs,
    Quantity::DRDtheta,
    Quantity::DRDzeta,
    Quantity::RDerivs,
    Quantity::Z,
    Quantity::DZDs,
    Quantity::DZDtheta,
    Quantity::DZDzeta,
    Quantity::ZDerivs,
    Quantity::Nu,
    Quantity::DNuDs,
    Quantity::DNuDtheta,
    Quantity::DNuDzeta,
    Quantity::NuDerivs,
];

/// Quartic grid fine enough to resolve `PeriodicTestField` to about `1e-7`.
pub fn periodic_config() -> InterpolatedFieldConfig {
    InterpolatedFieldConfig {
        degree: 4,
        n_s: 4,
        n_theta: 24,
        n_zeta: 24,
        ..InterpolatedFieldConfig::default()
    }
}
