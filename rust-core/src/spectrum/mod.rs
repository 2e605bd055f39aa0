//! Frequency and impulse response analysis

pub mod response;
pub mod impulse;
pub mod analysis;

pub use response::{AnalyzerConfig, FrequencyResponse, FrequencySample, SpectrumError};
pub use impulse::{ImpulseResponse, InverseFftEngine};
pub use analysis::{SpectralAnalyzer, SpectralReport};
