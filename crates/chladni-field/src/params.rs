use std::str::FromStr;

use crate::error::{FieldError, Result};
use crate::field::Point3;

/// Trigonometric basis selection for the standing-wave field.
///
/// Dirichlet models fixed-edge vibration (sine basis), Neumann models
/// free-edge vibration (cosine basis).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
    Dirichlet,
    Neumann,
}

impl BoundaryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryKind::Dirichlet => "dirichlet",
            BoundaryKind::Neumann => "neumann",
        }
    }
}

impl FromStr for BoundaryKind {
    type Err = FieldError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "dirichlet" => Ok(BoundaryKind::Dirichlet),
            "neumann" => Ok(BoundaryKind::Neumann),
            other => Err(FieldError::InvalidBoundaryKind {
                name: other.to_string(),
            }),
        }
    }
}

/// Mode numbers and amplitude coefficients of the Chladni field.
///
/// `u`, `v`, `w` are the wave mode numbers per axis; `a` through `f` weight
/// the six (axis, mode) permutation terms. Immutable once constructed; the
/// value fully determines the field function together with a [`BoundaryKind`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveParameters {
    pub u: f64,
    pub v: f64,
    pub w: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for WaveParameters {
    fn default() -> Self {
        Self {
            u: 1.0,
            v: 1.0,
            w: 1.0,
            a: 1.0,
            b: 1.0,
            c: 1.0,
            d: 1.0,
            e: 1.0,
            f: 1.0,
        }
    }
}

/// Axis-aligned sampling region. Invariant: min < max on every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    min: Point3,
    max: Point3,
}

impl BoundingBox {
    pub fn new(min: Point3, max: Point3) -> Result<Self> {
        for (axis, name) in ['x', 'y', 'z'].into_iter().enumerate() {
            if !(min[axis] < max[axis]) {
                return Err(FieldError::InvalidBoundingBox {
                    axis: name,
                    min: min[axis],
                    max: max[axis],
                });
            }
        }
        Ok(Self { min, max })
    }

    /// The unit cube [-1, 1] per axis, the default region of the service.
    pub fn unit() -> Self {
        Self {
            min: [-1.0, -1.0, -1.0],
            max: [1.0, 1.0, 1.0],
        }
    }

    pub fn min(&self) -> Point3 {
        self.min
    }

    pub fn max(&self) -> Point3 {
        self.max
    }

    /// Per-axis step between adjacent lattice points for `resolution` samples
    /// spaced linearly from min to max inclusive.
    pub fn spacing(&self, resolution: usize) -> Point3 {
        if resolution < 2 {
            return [0.0, 0.0, 0.0];
        }
        let cells = (resolution - 1) as f64;
        [
            (self.max[0] - self.min[0]) / cells,
            (self.max[1] - self.min[1]) / cells,
            (self.max[2] - self.min[2]) / cells,
        ]
    }

    pub fn contains(&self, point: Point3, tolerance: f64) -> bool {
        (0..3).all(|axis| {
            point[axis] >= self.min[axis] - tolerance && point[axis] <= self.max[axis] + tolerance
        })
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::unit()
    }
}
