//! The filter workbench: one filter, always-fresh derived views
//!
//! Owns the canonical `FilterState` and recomputes every derived view
//! (coefficients, frequency response, impulse response) inside each
//! mutation before returning — the synchronous contract that makes the
//! interactive tool feel real-time. Readers always see views that agree
//! with the state and with each other.

use num_complex::Complex64;

use crate::design::coefficients::{roots_from_coefficients, CoefficientError, TransferFunction};
use crate::design::state::{DesignError, FilterState, PointRole};
use crate::filters::iir::{shift_sequence, IirFilter};
use crate::signal::eval::{index_vector, SignalExpression};
use crate::signal::expr::ExpressionError;
use crate::spectrum::analysis::{SpectralAnalyzer, SpectralReport};
use crate::spectrum::response::{AnalyzerConfig, FrequencyResponse, SpectrumError};
use crate::spectrum::impulse::ImpulseResponse;

/// Input/output pair from running a signal through the filter
#[derive(Debug, Clone)]
pub struct Simulation {
    pub input: Vec<f64>,
    pub output: Vec<f64>,
}

/// Interactive filter-design session
pub struct FilterWorkbench {
    state: FilterState,
    analyzer: SpectralAnalyzer,
    transfer: TransferFunction,
    report: SpectralReport,
}

impl Default for FilterWorkbench {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterWorkbench {
    /// Start a session with the identity filter at the default resolution
    pub fn new() -> Self {
        Self::with_config(AnalyzerConfig::default())
            .expect("default analyzer configuration is valid")
    }

    /// Start a session with an explicit analyzer configuration
    pub fn with_config(config: AnalyzerConfig) -> Result<Self, SpectrumError> {
        let state = FilterState::new();
        let mut analyzer = SpectralAnalyzer::new(config)?;
        let transfer = TransferFunction::from_state(&state);
        let report = analyzer.analyze(&transfer, state.poles());

        Ok(Self {
            state,
            analyzer,
            transfer,
            report,
        })
    }

    /// Current filter geometry
    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Derived coefficients for the current geometry
    pub fn transfer_function(&self) -> &TransferFunction {
        &self.transfer
    }

    /// Derived frequency response for the current geometry
    pub fn frequency_response(&self) -> &FrequencyResponse {
        &self.report.response
    }

    /// Derived impulse response for the current geometry
    pub fn impulse_response(&self) -> &ImpulseResponse {
        &self.report.impulse
    }

    /// Whether the current pole configuration is stable
    pub fn is_stable(&self) -> bool {
        self.report.response.stable
    }

    /// Add a point and refresh all derived views
    pub fn add_point(&mut self, role: PointRole, position: Complex64) -> Result<(), DesignError> {
        self.state.add_point(role, position)?;
        self.recompute();
        Ok(())
    }

    /// Move a point and refresh all derived views
    pub fn move_point(
        &mut self,
        role: PointRole,
        index: usize,
        position: Complex64,
    ) -> Result<(), DesignError> {
        self.state.move_point(role, index, position)?;
        self.recompute();
        Ok(())
    }

    /// Remove a point and refresh all derived views
    pub fn remove_point(&mut self, role: PointRole, index: usize) -> Result<(), DesignError> {
        self.state.remove_point(role, index)?;
        self.recompute();
        Ok(())
    }

    /// Set the extra delay (`z^-k`) and refresh
    pub fn set_extra_delay(&mut self, delay: i64) {
        self.state.set_extra_delay(delay);
        self.recompute();
    }

    /// Set the numerator gain and refresh
    pub fn set_gain(&mut self, gain: f64) -> Result<(), DesignError> {
        self.state.set_gain(gain)?;
        self.recompute();
        Ok(())
    }

    /// Toggle real-filter mode and refresh
    pub fn set_real_mode(&mut self, enabled: bool) {
        self.state.set_real_mode(enabled);
        self.recompute();
    }

    /// Change the analysis resolution and refresh
    pub fn set_resolution(&mut self, resolution: usize) -> Result<(), SpectrumError> {
        self.analyzer.update_config(AnalyzerConfig { resolution })?;
        self.recompute();
        Ok(())
    }

    /// Replace the design from edited coefficient arrays
    ///
    /// The roots of `b` and `a` become the new zero/pole sets (re-paired
    /// under real-filter mode), the gain is re-derived from the leading
    /// coefficients, and leading structural zeros fold into the delay.
    /// Rejected edits leave the state untouched.
    pub fn set_coefficients(
        &mut self,
        b: &[f64],
        a: &[f64],
        extra_delay: i64,
    ) -> Result<(), CoefficientError> {
        let extracted = roots_from_coefficients(b, a)?;
        self.state.replace_roots(extracted, extra_delay);
        self.recompute();
        Ok(())
    }

    /// Evaluate an expression over `n = 0..length` and filter it
    pub fn simulate(
        &self,
        expression: &str,
        length: usize,
    ) -> Result<Simulation, ExpressionError> {
        let parsed = SignalExpression::parse(expression)?;
        let input = parsed.evaluate(&index_vector(0, length))?;
        Ok(self.run_through_filter(input))
    }

    /// Like [`simulate`](Self::simulate) with a fixed noise seed
    pub fn simulate_seeded(
        &self,
        expression: &str,
        length: usize,
        seed: u64,
    ) -> Result<Simulation, ExpressionError> {
        let parsed = SignalExpression::parse(expression)?;
        let input = parsed.evaluate_seeded(&index_vector(0, length), seed)?;
        Ok(self.run_through_filter(input))
    }

    fn run_through_filter(&self, input: Vec<f64>) -> Simulation {
        let filter = IirFilter::from_transfer_function(&self.transfer);
        let mut output = filter.filter(&input);

        let delay = self.state.extra_delay();
        if delay != 0 {
            output = shift_sequence(&output, delay);
        }

        Simulation { input, output }
    }

    fn recompute(&mut self) {
        self.transfer = TransferFunction::from_state(&self.state);
        self.report = self.analyzer.analyze(&self.transfer, self.state.poles());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn test_session_starts_as_identity() {
        let bench = FilterWorkbench::new();
        assert_eq!(bench.transfer_function().b_real(), vec![1.0]);
        assert_eq!(bench.transfer_function().a_real(), vec![1.0]);
        assert!(bench.is_stable());
    }

    #[test]
    fn test_mutation_refreshes_views_immediately() {
        let mut bench = FilterWorkbench::new();
        bench.add_point(PointRole::Zero, c(0.5, 0.0)).unwrap();
        assert_eq!(bench.transfer_function().b_real(), vec![1.0, -0.5]);

        bench.move_point(PointRole::Zero, 0, c(0.25, 0.0)).unwrap();
        assert_eq!(bench.transfer_function().b_real(), vec![1.0, -0.25]);

        bench.remove_point(PointRole::Zero, 0).unwrap();
        assert_eq!(bench.transfer_function().b_real(), vec![1.0]);
    }

    #[test]
    fn test_single_pole_impulse_response() {
        // Pole at 0.5, resolution 64: h[n] ≈ 0.5^n
        let mut bench = FilterWorkbench::with_config(AnalyzerConfig { resolution: 64 }).unwrap();
        bench.add_point(PointRole::Pole, c(0.5, 0.0)).unwrap();

        assert_eq!(bench.transfer_function().a_real(), vec![1.0, -0.5]);
        assert_eq!(bench.transfer_function().b_real(), vec![1.0]);

        for &(n, value) in &bench.impulse_response().samples {
            assert_relative_eq!(value, 0.5f64.powi(n as i32), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_unstable_pole_flagged_but_usable() {
        let mut bench = FilterWorkbench::with_config(AnalyzerConfig { resolution: 64 }).unwrap();
        bench.add_point(PointRole::Pole, c(1.5, 0.0)).unwrap();

        assert!(!bench.is_stable());
        assert_eq!(bench.impulse_response().samples.len(), 64);
        assert!(bench
            .impulse_response()
            .values()
            .iter()
            .all(|v| v.is_finite()));
    }

    #[test]
    fn test_coefficient_edit_round_trip() {
        let mut bench = FilterWorkbench::new();
        bench.set_real_mode(true);
        bench.set_coefficients(&[1.0, -0.6, 0.25], &[1.0, -0.5], 0).unwrap();

        // Roots of the numerator are the conjugate pair 0.3 ± 0.4j
        let zeros = bench.state().zeros();
        assert_eq!(zeros.len(), 2);
        assert_eq!(zeros[0].conj(), zeros[1]);
        assert_relative_eq!(zeros[0].re, 0.3, epsilon = 1e-8);
        assert_relative_eq!(zeros[0].im.abs(), 0.4, epsilon = 1e-8);

        let poles = bench.state().poles();
        assert_eq!(poles.len(), 1);
        assert_relative_eq!(poles[0].re, 0.5, epsilon = 1e-8);

        // And the derived coefficients reproduce the edit
        let b = bench.transfer_function().b_real();
        assert_relative_eq!(b[0], 1.0, epsilon = 1e-8);
        assert_relative_eq!(b[1], -0.6, epsilon = 1e-8);
        assert_relative_eq!(b[2], 0.25, epsilon = 1e-8);
    }

    #[test]
    fn test_rejected_coefficient_edit_preserves_state() {
        let mut bench = FilterWorkbench::new();
        bench.add_point(PointRole::Zero, c(0.5, 0.0)).unwrap();

        assert!(bench.set_coefficients(&[1.0], &[0.0], 0).is_err());
        assert_eq!(bench.state().zeros().len(), 1);
        assert_eq!(bench.transfer_function().b_real(), vec![1.0, -0.5]);
    }

    #[test]
    fn test_simulate_windowed_step() {
        let bench = FilterWorkbench::new();
        let sim = bench.simulate("u(n) - u(n - 10)", 20).unwrap();

        assert_eq!(sim.input.len(), 20);
        assert_eq!(sim.output.len(), 20);
        // Identity filter: output equals input
        assert_eq!(sim.input, sim.output);
    }

    #[test]
    fn test_simulate_applies_extra_delay() {
        let mut bench = FilterWorkbench::new();
        bench.set_extra_delay(3);

        let sim = bench.simulate("d(n)", 8).unwrap();
        let mut expected = vec![0.0; 8];
        expected[3] = 1.0;
        assert_eq!(sim.output, expected);
    }

    #[test]
    fn test_simulate_bad_expression_is_parse_error() {
        let bench = FilterWorkbench::new();
        assert!(matches!(
            bench.simulate("u(n) +", 10).unwrap_err(),
            ExpressionError::Parse { .. }
        ));
    }

    #[test]
    fn test_seeded_simulation_reproducible() {
        let bench = FilterWorkbench::new();
        let first = bench.simulate_seeded("noise()", 32, 7).unwrap();
        let second = bench.simulate_seeded("noise()", 32, 7).unwrap();
        assert_eq!(first.input, second.input);
        assert_eq!(first.output, second.output);
    }

    #[test]
    fn test_resolution_switch() {
        let mut bench = FilterWorkbench::new();
        bench.set_resolution(128).unwrap();
        assert_eq!(bench.impulse_response().samples.len(), 128);

        assert!(bench.set_resolution(100).is_err());
        // Failed switch leaves the previous resolution active
        assert_eq!(bench.impulse_response().samples.len(), 128);
    }

    #[test]
    fn test_real_mode_round_trip_through_edit() {
        // Scenario 3 via the workbench: conjugate auto-created, then removal
        let mut bench = FilterWorkbench::new();
        bench.set_real_mode(true);
        bench.add_point(PointRole::Pole, c(0.3, 0.4)).unwrap();

        assert_eq!(bench.state().poles().len(), 2);
        assert!(bench.transfer_function().is_real());

        bench.remove_point(PointRole::Pole, 1).unwrap();
        assert!(bench.state().poles().is_empty());
    }
}
