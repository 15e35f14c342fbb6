use std::f64::consts::PI;

use crate::params::{BoundaryKind, WaveParameters};

/// Cartesian point used for field evaluation.
pub type Point3 = [f64; 3];

/// Trait for 3D scalar fields sampled by the grid and meshed downstream.
pub trait ScalarField3 {
    fn evaluate(&self, point: Point3) -> f64;
}

/// Chladni standing-wave field: an immutable parameter set plus a boundary
/// basis, evaluated as a pure function of position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChladniField {
    params: WaveParameters,
    boundary: BoundaryKind,
}

impl ChladniField {
    pub fn new(params: WaveParameters, boundary: BoundaryKind) -> Self {
        Self { params, boundary }
    }

    pub fn params(&self) -> &WaveParameters {
        &self.params
    }

    pub fn boundary(&self) -> BoundaryKind {
        self.boundary
    }
}

impl ScalarField3 for ChladniField {
    #[inline]
    fn evaluate(&self, point: Point3) -> f64 {
        chladni_value(point, &self.params, self.boundary)
    }
}

/// Evaluates the Chladni field at one point.
///
/// The field is a sum of six terms, one per permutation of assigning the
/// mode-scaled basis factors to the three axes, each weighted by one of the
/// amplitude coefficients `a..f`. Dirichlet uses a sine basis, Neumann cosine.
#[inline]
pub fn chladni_value(point: Point3, params: &WaveParameters, boundary: BoundaryKind) -> f64 {
    match boundary {
        BoundaryKind::Dirichlet => superpose(point, params, f64::sin),
        BoundaryKind::Neumann => superpose(point, params, f64::cos),
    }
}

#[inline]
fn superpose<F>(point: Point3, params: &WaveParameters, basis: F) -> f64
where
    F: Fn(f64) -> f64,
{
    let [x, y, z] = point;

    // Nine basis factors cover all eighteen factor slots of the six terms.
    let ux = basis(params.u * PI * x);
    let uy = basis(params.u * PI * y);
    let uz = basis(params.u * PI * z);
    let vx = basis(params.v * PI * x);
    let vy = basis(params.v * PI * y);
    let vz = basis(params.v * PI * z);
    let wx = basis(params.w * PI * x);
    let wy = basis(params.w * PI * y);
    let wz = basis(params.w * PI * z);

    params.a * ux * vy * wz
        + params.b * ux * vz * wy
        + params.c * uy * vx * wz
        + params.d * uy * vz * wx
        + params.e * uz * vx * wy
        + params.f * uz * vy * wx
}
