//! Impulse response via inverse transform of the sampled spectrum
//!
//! The sampled frequency response is treated as one period of a discrete
//! spectrum and inverted with an FFT. Evaluating on the unit circle keeps
//! this numerically well-behaved even for unstable pole configurations —
//! the result is the periodized impulse response, finite by construction.

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Imaginary residue above `RESIDUE_TOLERANCE * max(1, max|h|)` means the
/// spectrum was not conjugate-symmetric (asymmetric point set).
const RESIDUE_TOLERANCE: f64 = 1e-6;

/// Impulse response `h[n]` for `n = 0..N-1`
#[derive(Debug, Clone)]
pub struct ImpulseResponse {
    /// `(n, h[n])` pairs, causal indexing
    pub samples: Vec<(usize, f64)>,
    /// False when the inverse transform left a significant imaginary part,
    /// i.e. the filter cannot produce real output for real input
    pub real_within_tolerance: bool,
    /// True when a non-finite value was replaced by zero
    pub clamped: bool,
}

impl ImpulseResponse {
    /// Just the values, without the index column
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|&(_, v)| v).collect()
    }
}

/// Inverse FFT engine with a reusable plan and buffer
///
/// rustfft leaves the inverse unnormalized, so the output is scaled by
/// `1/N` here.
pub struct InverseFftEngine {
    size: usize,
    ifft: Arc<dyn Fft<f64>>,
    buffer: Vec<Complex64>,
}

impl InverseFftEngine {
    /// Create an engine for the given transform size
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let ifft = planner.plan_fft_inverse(size);

        Self {
            size,
            ifft,
            buffer: vec![Complex64::new(0.0, 0.0); size],
        }
    }

    /// Transform size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Invert a sampled spectrum into an impulse response
    ///
    /// # Arguments
    /// * `spectrum` - `H(e^{jω_k})` for `ω_k = 2πk/N`, length `N`
    pub fn compute(&mut self, spectrum: &[Complex64]) -> ImpulseResponse {
        debug_assert_eq!(spectrum.len(), self.size);

        self.buffer.copy_from_slice(spectrum);
        self.ifft.process(&mut self.buffer);

        let scale = 1.0 / self.size as f64;
        let mut clamped = false;
        let mut peak = 0.0f64;
        let mut residue = 0.0f64;

        let samples = self
            .buffer
            .iter()
            .enumerate()
            .map(|(n, h)| {
                let value = h.re * scale;
                let imag = h.im * scale;
                if value.is_finite() && imag.is_finite() {
                    peak = peak.max(value.abs());
                    residue = residue.max(imag.abs());
                    (n, value)
                } else {
                    clamped = true;
                    (n, 0.0)
                }
            })
            .collect();

        ImpulseResponse {
            samples,
            real_within_tolerance: residue <= RESIDUE_TOLERANCE * peak.max(1.0),
            clamped,
        }
    }
}
