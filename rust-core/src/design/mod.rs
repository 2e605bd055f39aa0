//! Filter geometry: pole/zero storage, conjugate symmetry, coefficients

pub mod state;
pub mod conjugate;
pub mod coefficients;

pub use state::{DesignError, FilterState, PointRole};
pub use coefficients::{CoefficientError, ExtractedRoots, TransferFunction};
