//! Frequency response of the designed filter
//!
//! Evaluates `H(e^{jω})` by direct rational evaluation of the coefficient
//! polynomials on the unit circle. The frequency axis convention is
//! `ω_k = 2πk/N` over `[0, 2π)` — the same grid the impulse response is
//! derived from.

use num_complex::Complex64;
use thiserror::Error;

use crate::design::coefficients::TransferFunction;

/// Accepted resolutions (power-of-two sizes keep the inverse FFT fast)
pub const RESOLUTION_CHOICES: [usize; 6] = [64, 128, 256, 512, 1024, 2048];

/// Denominator magnitudes below this are clamped to avoid singularities
/// when a pole sits exactly on the evaluation grid.
const SINGULARITY_FLOOR: f64 = 1e-10;

/// A pole within this band of the unit circle marks the filter unstable
const STABILITY_MARGIN: f64 = 1e-9;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpectrumError {
    #[error("resolution must be one of {RESOLUTION_CHOICES:?}, got {0}")]
    InvalidResolution(usize),
}

/// Spectral analyzer configuration
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Number of evaluation points / inverse-FFT size
    pub resolution: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self { resolution: 512 }
    }
}

impl AnalyzerConfig {
    /// Reject resolutions outside the documented power-of-two set
    pub fn validate(&self) -> Result<(), SpectrumError> {
        if RESOLUTION_CHOICES.contains(&self.resolution) {
            Ok(())
        } else {
            Err(SpectrumError::InvalidResolution(self.resolution))
        }
    }
}

/// One evaluation point of the frequency response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencySample {
    /// Frequency in radians/sample, in `[0, 2π)`
    pub omega: f64,
    /// `|H(e^{jω})|`
    pub magnitude: f64,
    /// `arg H(e^{jω})` in radians, `atan2` convention (not unwrapped)
    pub phase: f64,
}

/// Sampled frequency response plus the flags derived alongside it
#[derive(Debug, Clone)]
pub struct FrequencyResponse {
    pub samples: Vec<FrequencySample>,
    /// False when any pole sits on or outside the unit circle, or the
    /// filter advances (negative extra delay). Informational only.
    pub stable: bool,
    /// True when a non-finite intermediate value was replaced by zero
    pub clamped: bool,
}

impl FrequencyResponse {
    /// Magnitudes in dB, floored to avoid `log(0)`
    pub fn magnitudes_db(&self) -> Vec<f64> {
        self.samples
            .iter()
            .map(|s| 20.0 * s.magnitude.max(1e-12).log10())
            .collect()
    }

    /// Phase with the 2π discontinuities removed
    pub fn unwrapped_phase(&self) -> Vec<f64> {
        let mut unwrapped = Vec::with_capacity(self.samples.len());
        let mut offset = 0.0;
        let mut previous = 0.0;

        for (k, sample) in self.samples.iter().enumerate() {
            if k > 0 {
                let jump = sample.phase - previous;
                if jump > std::f64::consts::PI {
                    offset -= 2.0 * std::f64::consts::PI;
                } else if jump < -std::f64::consts::PI {
                    offset += 2.0 * std::f64::consts::PI;
                }
            }
            previous = sample.phase;
            unwrapped.push(sample.phase + offset);
        }

        unwrapped
    }
}

/// Evaluate `H` at a single frequency by Horner evaluation in `z^-1`
///
/// The extra-delay factor `z^-k` is applied analytically, so the coefficient
/// arrays stay aligned with the root counts.
pub fn evaluate_at(tf: &TransferFunction, omega: f64) -> Complex64 {
    let z_inv = Complex64::from_polar(1.0, -omega);

    let numerator = horner(tf.b(), z_inv);
    let mut denominator = horner(tf.a(), z_inv);

    // Guard pole-on-grid singularities the way a display tool must:
    // clamp the denominator magnitude, keep its phase
    let magnitude = denominator.norm();
    if magnitude < SINGULARITY_FLOOR {
        denominator = if magnitude == 0.0 {
            Complex64::new(SINGULARITY_FLOOR, 0.0)
        } else {
            denominator * (SINGULARITY_FLOOR / magnitude)
        };
    }

    let delay = Complex64::from_polar(1.0, -omega * tf.extra_delay() as f64);
    numerator / denominator * delay
}

/// Sample `H` on the `[0, 2π)` grid at the given resolution
pub fn sample_spectrum(tf: &TransferFunction, resolution: usize) -> Vec<Complex64> {
    (0..resolution)
        .map(|k| {
            let omega = 2.0 * std::f64::consts::PI * k as f64 / resolution as f64;
            evaluate_at(tf, omega)
        })
        .collect()
}

/// Whether the pole configuration is stable and causal
pub fn is_stable(poles: &[Complex64], extra_delay: i64) -> bool {
    if extra_delay < 0 {
        return false;
    }
    poles.iter().all(|p| p.norm() < 1.0 - STABILITY_MARGIN)
}

/// Build the magnitude/phase view from a sampled complex spectrum
///
/// Non-finite samples are clamped to zero and flagged rather than
/// propagated; the result set is always complete.
pub fn build_response(spectrum: &[Complex64], stable: bool) -> FrequencyResponse {
    let resolution = spectrum.len();
    let mut clamped = false;

    let samples = spectrum
        .iter()
        .enumerate()
        .map(|(k, h)| {
            let omega = 2.0 * std::f64::consts::PI * k as f64 / resolution as f64;
            let (magnitude, phase) = if h.re.is_finite() && h.im.is_finite() {
                (h.norm(), h.im.atan2(h.re))
            } else {
                clamped = true;
                (0.0, 0.0)
            };
            FrequencySample {
                omega,
                magnitude,
                phase,
            }
        })
        .collect();

    FrequencyResponse {
        samples,
        stable,
        clamped,
    }
}

fn horner(coeffs: &[Complex64], z_inv: Complex64) -> Complex64 {
    let mut acc = Complex64::new(0.0, 0.0);
    for &c in coeffs.iter().rev() {
        acc = acc * z_inv + c;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::state::{FilterState, PointRole};
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn test_identity_filter_is_flat() {
        let tf = TransferFunction::identity();
        for k in 0..8 {
            let h = evaluate_at(&tf, 2.0 * PI * k as f64 / 8.0);
            assert_relative_eq!(h.re, 1.0, epsilon = 1e-12);
            assert_relative_eq!(h.im, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_single_pole_dc_gain() {
        // H(z) = 1 / (1 - 0.5 z^-1): at ω = 0, H = 2
        let mut state = FilterState::new();
        state.add_point(PointRole::Pole, c(0.5, 0.0)).unwrap();
        let tf = TransferFunction::from_state(&state);

        let h = evaluate_at(&tf, 0.0);
        assert_relative_eq!(h.re, 2.0, epsilon = 1e-12);

        // At ω = π, H = 1 / 1.5
        let h = evaluate_at(&tf, PI);
        assert_relative_eq!(h.re, 1.0 / 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_on_circle_nulls_response() {
        // Zero at z = 1 kills DC
        let mut state = FilterState::new();
        state.add_point(PointRole::Zero, c(1.0, 0.0)).unwrap();
        let tf = TransferFunction::from_state(&state);

        assert!(evaluate_at(&tf, 0.0).norm() < 1e-12);
    }

    #[test]
    fn test_delay_rotates_phase_only() {
        let mut state = FilterState::new();
        state.set_extra_delay(3);
        let tf = TransferFunction::from_state(&state);

        let omega = 0.4;
        let h = evaluate_at(&tf, omega);
        assert_relative_eq!(h.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(h.im.atan2(h.re), -omega * 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pole_on_grid_is_clamped_not_infinite() {
        // Pole exactly at z = 1 lands on the ω = 0 grid point
        let mut state = FilterState::new();
        state.add_point(PointRole::Pole, c(1.0, 0.0)).unwrap();
        let tf = TransferFunction::from_state(&state);

        let h = evaluate_at(&tf, 0.0);
        assert!(h.norm().is_finite());
        assert!(h.norm() >= 1.0 / SINGULARITY_FLOOR * 0.5);
    }

    #[test]
    fn test_stability_flag() {
        assert!(is_stable(&[c(0.5, 0.0), c(-0.3, 0.4)], 0));
        assert!(!is_stable(&[c(1.5, 0.0)], 0));
        assert!(!is_stable(&[c(0.0, 1.0)], 0));
        // An advance is non-causal even with stable poles
        assert!(!is_stable(&[c(0.5, 0.0)], -1));
    }

    #[test]
    fn test_resolution_validation() {
        for n in RESOLUTION_CHOICES {
            assert!(AnalyzerConfig { resolution: n }.validate().is_ok());
        }
        for n in [0, 63, 100, 4096] {
            assert_eq!(
                AnalyzerConfig { resolution: n }.validate(),
                Err(SpectrumError::InvalidResolution(n))
            );
        }
    }

    #[test]
    fn test_unwrapped_phase_is_continuous() {
        // A long delay wraps the raw phase many times over the grid
        let mut state = FilterState::new();
        state.set_extra_delay(5);
        let tf = TransferFunction::from_state(&state);

        let spectrum = sample_spectrum(&tf, 256);
        let response = build_response(&spectrum, true);
        let unwrapped = response.unwrapped_phase();

        for pair in unwrapped.windows(2) {
            assert!((pair[1] - pair[0]).abs() < PI);
        }
        // Raw phase stays wrapped into (-π, π]
        assert!(response.samples.iter().all(|s| s.phase.abs() <= PI + 1e-12));
    }

    #[test]
    fn test_magnitudes_db_floor() {
        let response = build_response(&[c(0.0, 0.0), c(1.0, 0.0)], true);
        let db = response.magnitudes_db();
        assert_relative_eq!(db[0], -240.0, epsilon = 1e-9);
        assert_relative_eq!(db[1], 0.0, epsilon = 1e-9);
    }
}
