//! Piecewise polynomial interpolation on a regular tensor-product grid.

use super::{fip, GridInterpolant3};
use crate::{
    error::{BoozerError, Result},
    geometry::{Dim3, In3D},
    grid::{fgr, GridDescription, MAX_INTERPOLATION_DEGREE},
    symmetry::check_point_columns,
};
use ndarray::{prelude::*, Zip};
use rayon::prelude::*;
use Dim3::{Theta, Zeta, S};

const MAX_POINTS: usize = MAX_INTERPOLATION_DEGREE + 1;

/// A 3D interpolant evaluating a Lagrange polynomial of the rule's degree
/// within each grid cell.
///
/// Neighbouring cells share their boundary nodes, so the interpolant is
/// continuous across cells.
#[derive(Clone, Debug)]
pub struct RegularGridInterpolant3 {
    grid: GridDescription,
    value_size: usize,
    node_coords: In3D<Vec<fgr>>,
    values: Option<Vec<fip>>,
}

impl RegularGridInterpolant3 {
    /// Whether node values have been computed.
    pub fn is_built(&self) -> bool {
        self.values.is_some()
    }

    /// Returns the coordinates of the interpolation nodes along the given dimension.
    pub fn node_coords(&self, dim: Dim3) -> &[fgr] {
        &self.node_coords[dim]
    }

    fn value_offset(&self, i: usize, j: usize, k: usize) -> usize {
        let n_theta = self.node_coords[Theta].len();
        let n_zeta = self.node_coords[Zeta].len();
        ((i * n_theta + j) * n_zeta + k) * self.value_size
    }

    /// Returns the index of the first node of the cell to use for the given coordinate.
    /// Coordinates outside the range use the nearest boundary cell.
    fn start_node(&self, dim: Dim3, coord: fgr) -> usize {
        let range = self.grid.range(dim);
        let cell = ((coord - range.lower) / range.cell_extent()).floor();
        let cell = if cell.is_nan() || cell < 0.0 {
            0
        } else {
            (cell as usize).min(range.resolution - 1)
        };
        cell * self.grid.rule().degree()
    }

    fn check_domain(&self, points: &ArrayView2<fgr>) -> Result<()> {
        if self.grid.extrapolate() {
            return Ok(());
        }
        let outside = points
            .axis_iter(Axis(0))
            .into_par_iter()
            .find_map_first(|point| {
                Dim3::slice().into_iter().find_map(|dim| {
                    let range = self.grid.range(dim);
                    let coord = point[dim.num()];
                    (!range.contains(coord)).then(|| BoozerError::OutsideDomain {
                        dim,
                        coord,
                        lower: range.lower,
                        upper: range.upper,
                    })
                })
            });
        match outside {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn interp_point(&self, values: &[fip], point: ArrayView1<fgr>, mut out: ArrayViewMut1<fip>) {
        let n_points = self.grid.rule().nodes_per_cell();
        let starts = In3D::with_each_component(|dim| self.start_node(dim, point[dim.num()]));
        let coords = In3D::with_each_component(|dim| {
            &self.node_coords[dim][starts[dim]..starts[dim] + n_points]
        });

        let mut line = [0.0; MAX_POINTS];
        let mut poly_zeta = [0.0; MAX_POINTS];
        let mut poly_theta_zeta = [0.0; MAX_POINTS];

        for (component, out_value) in out.iter_mut().enumerate() {
            for i in 0..n_points {
                for j in 0..n_points {
                    for (k, value) in line[..n_points].iter_mut().enumerate() {
                        *value = values[self.value_offset(
                            starts[S] + i,
                            starts[Theta] + j,
                            starts[Zeta] + k,
                        ) + component];
                    }
                    poly_zeta[j] = neville(coords[Zeta], &line[..n_points], point[Zeta.num()]);
                }
                poly_theta_zeta[i] =
                    neville(coords[Theta], &poly_zeta[..n_points], point[Theta.num()]);
            }
            *out_value = neville(coords[S], &poly_theta_zeta[..n_points], point[S.num()]);
        }
    }
}

/// Evaluates the polynomial through the given nodes at `x` using Neville's scheme.
fn neville(coords: &[fgr], values: &[fip], x: fgr) -> fip {
    let n_points = values.len();
    let mut vals_c = [0.0; MAX_POINTS];
    let mut vals_d = [0.0; MAX_POINTS];
    vals_c[..n_points].copy_from_slice(values);
    vals_d[..n_points].copy_from_slice(values);

    let mut accum = vals_c[0];
    for n in 1..n_points {
        for i in 0..(n_points - n) {
            let correction = (vals_c[i + 1] - vals_d[i]) / (coords[i + n] - coords[i]);
            vals_c[i] = (x - coords[i]) * correction;
            vals_d[i] = (x - coords[i + n]) * correction;
        }
        accum += vals_c[0];
    }
    accum
}

impl GridInterpolant3 for RegularGridInterpolant3 {
    fn new(grid: &GridDescription, value_size: usize) -> Result<Self> {
        if value_size == 0 {
            return Err(BoozerError::InvalidConfiguration(
                "interpolated quantities need at least one component".to_string(),
            ));
        }
        let counts = grid.node_counts();
        let node_coords = In3D::with_each_component(|dim| {
            let range = grid.range(dim);
            let n_intervals = (counts[dim] - 1) as fgr;
            (0..counts[dim])
                .map(|idx| range.lower + range.extent() * (idx as fgr) / n_intervals)
                .collect::<Vec<_>>()
        });
        Ok(Self {
            grid: grid.clone(),
            value_size,
            node_coords,
            values: None,
        })
    }

    fn grid(&self) -> &GridDescription {
        &self.grid
    }

    fn value_size(&self) -> usize {
        self.value_size
    }

    fn interpolate_batch<E>(&mut self, mut sample: E) -> Result<()>
    where
        E: FnMut(&[fgr], &[fgr], &[fgr]) -> Result<Vec<fip>>,
    {
        let counts = In3D::with_each_component(|dim| self.node_coords[dim].len());
        let n_nodes = counts[S] * counts[Theta] * counts[Zeta];

        let mut s = Vec::with_capacity(n_nodes);
        let mut theta = Vec::with_capacity(n_nodes);
        let mut zeta = Vec::with_capacity(n_nodes);
        for &s_coord in &self.node_coords[S] {
            for &theta_coord in &self.node_coords[Theta] {
                for &zeta_coord in &self.node_coords[Zeta] {
                    s.push(s_coord);
                    theta.push(theta_coord);
                    zeta.push(zeta_coord);
                }
            }
        }

        let values = sample(&s, &theta, &zeta)?;
        let expected_len = n_nodes * self.value_size;
        if values.len() != expected_len {
            return Err(BoozerError::FieldSource(format!(
                "sampling returned {} values, expected {}",
                values.len(),
                expected_len
            )));
        }
        self.values = Some(values);
        Ok(())
    }

    fn evaluate_batch(&self, points: ArrayView2<fgr>, mut out: ArrayViewMut2<fip>) -> Result<()> {
        check_point_columns(points)?;
        let expected = (points.nrows(), self.value_size);
        if out.dim() != expected {
            return Err(BoozerError::Internal(format!(
                "output buffer has shape {:?}, expected {:?}",
                out.dim(),
                expected
            )));
        }
        let values = self.values.as_deref().ok_or_else(|| {
            BoozerError::Internal("interpolant evaluated before it was built".to_string())
        })?;
        self.check_domain(&points)?;

        Zip::from(out.rows_mut())
            .and(points.rows())
            .par_for_each(|out_row, point| self.interp_point(values, point, out_row));
        Ok(())
    }
}
