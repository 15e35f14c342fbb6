use thiserror::Error;

pub type Result<T> = std::result::Result<T, FieldError>;

/// Errors surfaced by field configuration and sampling.
///
/// Configuration errors are raised before any grid storage is allocated;
/// `NonFiniteSample` aborts a sampling run with no partial result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("unknown boundary kind {name:?}, expected \"dirichlet\" or \"neumann\"")]
    InvalidBoundaryKind { name: String },

    #[error("invalid bounding box: {axis} axis has min {min} >= max {max}")]
    InvalidBoundingBox { axis: char, min: f64, max: f64 },

    #[error("invalid resolution {resolution}: {message}")]
    InvalidResolution {
        resolution: usize,
        message: &'static str,
    },

    #[error("non-finite field value {value} at lattice point ({i}, {j}, {k})")]
    NonFiniteSample {
        i: usize,
        j: usize,
        k: usize,
        value: f64,
    },
}
