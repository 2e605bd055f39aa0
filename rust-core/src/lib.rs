//! Filter Workbench - Interactive Pole-Zero Filter Design Core
//!
//! Engine behind a pole-zero placement tool: filter geometry and its
//! derived transfer function, frequency/impulse responses, a small signal
//! expression language, and offline simulation of the designed filter.

pub mod design;
pub mod filters;
pub mod signal;
pub mod spectrum;
pub mod workbench;

pub use design::{FilterState, PointRole, TransferFunction};
pub use signal::SignalExpression;
pub use spectrum::{AnalyzerConfig, SpectralAnalyzer};
pub use workbench::{FilterWorkbench, Simulation};
