use crate::error::{FieldError, Result};
use crate::field::{Point3, ScalarField3};
use crate::params::BoundingBox;

/// Dense lattice of field samples over a bounding box.
///
/// Axis convention, used identically by the sampler and the isosurface
/// extractor: lattice point `(i, j, k)` lies at `min + (i, j, k) * spacing`
/// and is stored at linear index `i + j * n + k * n * n` (x fastest). The
/// grid owns its backing storage exclusively and is discarded after one
/// extraction; nothing is cached across requests.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarGrid {
    bounds: BoundingBox,
    resolution: usize,
    spacing: Point3,
    values: Vec<f64>,
}

impl ScalarGrid {
    /// Samples `field` at every lattice point of a `resolution`-cubed grid.
    ///
    /// Configuration errors are detected before the sample buffer is
    /// allocated. A non-finite field value aborts the run with
    /// [`FieldError::NonFiniteSample`]; no partial grid is returned.
    pub fn sample<S>(bounds: BoundingBox, resolution: usize, field: &S) -> Result<Self>
    where
        S: ScalarField3,
    {
        let total = checked_sample_count(resolution)?;
        let spacing = bounds.spacing(resolution);
        let min = bounds.min();

        let mut values = Vec::with_capacity(total);
        for k in 0..resolution {
            let z = min[2] + k as f64 * spacing[2];
            for j in 0..resolution {
                let y = min[1] + j as f64 * spacing[1];
                for i in 0..resolution {
                    let x = min[0] + i as f64 * spacing[0];
                    let value = field.evaluate([x, y, z]);
                    if !value.is_finite() {
                        return Err(FieldError::NonFiniteSample { i, j, k, value });
                    }
                    values.push(value);
                }
            }
        }

        Ok(Self {
            bounds,
            resolution,
            spacing,
            values,
        })
    }

    /// Wraps an existing sample buffer, enforcing the same invariants as
    /// [`ScalarGrid::sample`].
    pub fn from_values(bounds: BoundingBox, resolution: usize, values: Vec<f64>) -> Result<Self> {
        let total = checked_sample_count(resolution)?;
        if values.len() != total {
            return Err(FieldError::InvalidResolution {
                resolution,
                message: "sample buffer length does not match resolution cubed",
            });
        }
        if let Some(flat) = values.iter().position(|value| !value.is_finite()) {
            let n = resolution;
            return Err(FieldError::NonFiniteSample {
                i: flat % n,
                j: (flat / n) % n,
                k: flat / (n * n),
                value: values[flat],
            });
        }

        let spacing = bounds.spacing(resolution);
        Ok(Self {
            bounds,
            resolution,
            spacing,
            values,
        })
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn spacing(&self) -> Point3 {
        self.spacing
    }

    /// Cells per axis: one less than the resolution, zero for a single slice.
    pub fn cells_per_axis(&self) -> usize {
        self.resolution.saturating_sub(1)
    }

    #[inline]
    pub fn linear_index(&self, i: usize, j: usize, k: usize) -> usize {
        i + j * self.resolution + k * self.resolution * self.resolution
    }

    #[inline]
    pub fn value(&self, i: usize, j: usize, k: usize) -> f64 {
        self.values[self.linear_index(i, j, k)]
    }

    #[inline]
    pub fn position(&self, i: usize, j: usize, k: usize) -> Point3 {
        let min = self.bounds.min();
        [
            min[0] + i as f64 * self.spacing[0],
            min[1] + j as f64 * self.spacing[1],
            min[2] + k as f64 * self.spacing[2],
        ]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

fn checked_sample_count(resolution: usize) -> Result<usize> {
    if resolution < 1 {
        return Err(FieldError::InvalidResolution {
            resolution,
            message: "at least one sample per axis is required",
        });
    }
    resolution
        .checked_mul(resolution)
        .and_then(|squared| squared.checked_mul(resolution))
        .ok_or(FieldError::InvalidResolution {
            resolution,
            message: "sample count overflows",
        })
}
