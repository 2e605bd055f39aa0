//! High-level spectral analyzer
//!
//! Combines the unit-circle evaluation with the inverse-FFT impulse
//! derivation and hands back one consistent report per filter revision.

use num_complex::Complex64;

use super::impulse::{ImpulseResponse, InverseFftEngine};
use super::response::{
    build_response, is_stable, sample_spectrum, AnalyzerConfig, FrequencyResponse, SpectrumError,
};
use crate::design::coefficients::TransferFunction;

/// All derived spectral views for one filter revision
#[derive(Debug, Clone)]
pub struct SpectralReport {
    pub response: FrequencyResponse,
    pub impulse: ImpulseResponse,
}

/// Spectral analyzer with a cached inverse-FFT plan
pub struct SpectralAnalyzer {
    config: AnalyzerConfig,
    ifft: InverseFftEngine,
}

impl SpectralAnalyzer {
    /// Create a new analyzer; the resolution is validated up front
    pub fn new(config: AnalyzerConfig) -> Result<Self, SpectrumError> {
        config.validate()?;
        let ifft = InverseFftEngine::new(config.resolution);
        Ok(Self { config, ifft })
    }

    /// Current configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Change the resolution, re-planning the inverse FFT if needed
    pub fn update_config(&mut self, config: AnalyzerConfig) -> Result<(), SpectrumError> {
        config.validate()?;
        if config.resolution != self.config.resolution {
            self.ifft = InverseFftEngine::new(config.resolution);
        }
        self.config = config;
        Ok(())
    }

    /// Produce the full spectral report for the given transfer function
    ///
    /// The spectrum is sampled once and shared by both derived views, so
    /// response and impulse always describe the same filter revision.
    pub fn analyze(&mut self, tf: &TransferFunction, poles: &[Complex64]) -> SpectralReport {
        let spectrum = sample_spectrum(tf, self.config.resolution);
        let stable = is_stable(poles, tf.extra_delay());

        SpectralReport {
            response: build_response(&spectrum, stable),
            impulse: self.ifft.compute(&spectrum),
        }
    }
}
