pub mod error;
pub mod field;
pub mod grid;
pub mod params;

pub use error::{FieldError, Result};
pub use field::{ChladniField, Point3, ScalarField3, chladni_value};
pub use grid::ScalarGrid;
pub use params::{BoundaryKind, BoundingBox, WaveParameters};
