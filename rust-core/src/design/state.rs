//! Canonical filter state: pole/zero sequences, gain, and extra delay
//!
//! `FilterState` is the single source of truth for the filter geometry.
//! Coefficients, frequency response and impulse response are derived views
//! computed elsewhere; every mutation here validates its input fully before
//! committing so the state is never left half-updated.

use num_complex::Complex64;
use thiserror::Error;

use super::coefficients::ExtractedRoots;
use super::conjugate;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DesignError {
    #[error("point position must be finite, got ({re}, {im})")]
    InvalidPointPosition { re: f64, im: f64 },

    #[error("no {role} at index {index} (current count: {count})")]
    PointIndexOutOfRange {
        role: PointRole,
        index: usize,
        count: usize,
    },

    #[error("gain must be finite, got {0}")]
    InvalidGain(f64),
}

/// Which root sequence a point belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointRole {
    /// Root of the denominator polynomial
    Pole,
    /// Root of the numerator polynomial
    Zero,
}

impl std::fmt::Display for PointRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointRole::Pole => write!(f, "pole"),
            PointRole::Zero => write!(f, "zero"),
        }
    }
}

/// The designed filter: ordered pole and zero sets plus scalar parameters
///
/// Point identity is positional (an index into the role's sequence) and
/// insertion order is preserved. `extra_delay = k` multiplies the transfer
/// function by `z^-k`; negative values advance. Any finite position is
/// accepted, including points outside the unit circle — instability is
/// surfaced by the spectral analyzer, not rejected here.
#[derive(Debug, Clone)]
pub struct FilterState {
    zeros: Vec<Complex64>,
    poles: Vec<Complex64>,
    gain: f64,
    extra_delay: i64,
    real_mode: bool,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterState {
    /// Create an empty state (the identity filter `H(z) = 1`)
    pub fn new() -> Self {
        Self {
            zeros: Vec::new(),
            poles: Vec::new(),
            gain: 1.0,
            extra_delay: 0,
            real_mode: false,
        }
    }

    /// Zero positions, in insertion order
    pub fn zeros(&self) -> &[Complex64] {
        &self.zeros
    }

    /// Pole positions, in insertion order
    pub fn poles(&self) -> &[Complex64] {
        &self.poles
    }

    /// Points of the given role
    pub fn points(&self, role: PointRole) -> &[Complex64] {
        match role {
            PointRole::Pole => &self.poles,
            PointRole::Zero => &self.zeros,
        }
    }

    /// Overall numerator gain
    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Extra delay `k` in `z^-k` (negative values advance)
    pub fn extra_delay(&self) -> i64 {
        self.extra_delay
    }

    /// Whether conjugate symmetry is being enforced
    pub fn real_mode(&self) -> bool {
        self.real_mode
    }

    /// Add a point; in real-filter mode an off-axis point brings its conjugate
    pub fn add_point(&mut self, role: PointRole, position: Complex64) -> Result<(), DesignError> {
        Self::check_finite(position)?;

        let real_mode = self.real_mode;
        let points = self.points_mut(role);
        if real_mode {
            conjugate::add_with_conjugate(points, position);
        } else {
            points.push(position);
        }
        Ok(())
    }

    /// Move a point; its conjugate partner follows, collapses, or appears
    /// depending on where the point lands relative to the real axis
    pub fn move_point(
        &mut self,
        role: PointRole,
        index: usize,
        position: Complex64,
    ) -> Result<(), DesignError> {
        Self::check_finite(position)?;
        self.check_index(role, index)?;

        let real_mode = self.real_mode;
        let points = self.points_mut(role);
        if real_mode {
            conjugate::move_with_conjugate(points, index, position);
        } else {
            points[index] = position;
        }
        Ok(())
    }

    /// Remove a point, and its conjugate partner in real-filter mode
    pub fn remove_point(&mut self, role: PointRole, index: usize) -> Result<(), DesignError> {
        self.check_index(role, index)?;

        let real_mode = self.real_mode;
        let points = self.points_mut(role);
        if real_mode {
            conjugate::remove_with_conjugate(points, index);
        } else {
            points.remove(index);
        }
        Ok(())
    }

    /// Set the extra delay (`k > 0` delays, `k < 0` advances)
    pub fn set_extra_delay(&mut self, delay: i64) {
        self.extra_delay = delay;
    }

    /// Set the numerator gain
    pub fn set_gain(&mut self, gain: f64) -> Result<(), DesignError> {
        if !gain.is_finite() {
            return Err(DesignError::InvalidGain(gain));
        }
        self.gain = gain;
        Ok(())
    }

    /// Toggle real-filter mode
    ///
    /// Enabling re-validates the existing sets: every unpaired off-axis
    /// point gets its conjugate created. Disabling stops enforcement but
    /// deliberately leaves existing conjugates in place.
    pub fn set_real_mode(&mut self, enabled: bool) {
        self.real_mode = enabled;
        if enabled {
            conjugate::pair_missing(&mut self.zeros);
            conjugate::pair_missing(&mut self.poles);
        }
    }

    /// Replace both root sets from a coefficient edit
    ///
    /// In real-filter mode the incoming roots are snapped to exact conjugate
    /// symmetry first (the root finder only delivers symmetry up to
    /// floating-point error), then any leftover unpaired point is completed.
    pub fn replace_roots(&mut self, mut extracted: ExtractedRoots, extra_delay: i64) {
        if self.real_mode {
            conjugate::symmetrize(&mut extracted.zeros);
            conjugate::symmetrize(&mut extracted.poles);
        }

        self.zeros = extracted.zeros;
        self.poles = extracted.poles;
        self.gain = extracted.gain;
        self.extra_delay = extra_delay + extracted.delay_adjustment;

        if self.real_mode {
            conjugate::pair_missing(&mut self.zeros);
            conjugate::pair_missing(&mut self.poles);
        }
    }

    fn points_mut(&mut self, role: PointRole) -> &mut Vec<Complex64> {
        match role {
            PointRole::Pole => &mut self.poles,
            PointRole::Zero => &mut self.zeros,
        }
    }

    fn check_finite(position: Complex64) -> Result<(), DesignError> {
        if position.re.is_finite() && position.im.is_finite() {
            Ok(())
        } else {
            Err(DesignError::InvalidPointPosition {
                re: position.re,
                im: position.im,
            })
        }
    }

    fn check_index(&self, role: PointRole, index: usize) -> Result<(), DesignError> {
        let count = self.points(role).len();
        if index < count {
            Ok(())
        } else {
            Err(DesignError::PointIndexOutOfRange { role, index, count })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn test_new_state_is_identity() {
        let state = FilterState::new();
        assert!(state.zeros().is_empty());
        assert!(state.poles().is_empty());
        assert_eq!(state.gain(), 1.0);
        assert_eq!(state.extra_delay(), 0);
        assert!(!state.real_mode());
    }

    #[test]
    fn test_add_and_remove_point() {
        let mut state = FilterState::new();
        state.add_point(PointRole::Zero, c(0.5, 0.0)).unwrap();
        state.add_point(PointRole::Pole, c(-0.2, 0.7)).unwrap();

        assert_eq!(state.zeros().len(), 1);
        assert_eq!(state.poles().len(), 1);

        state.remove_point(PointRole::Pole, 0).unwrap();
        assert!(state.poles().is_empty());
    }

    #[test]
    fn test_non_finite_position_rejected() {
        let mut state = FilterState::new();
        let err = state
            .add_point(PointRole::Zero, c(f64::NAN, 0.0))
            .unwrap_err();
        assert!(matches!(err, DesignError::InvalidPointPosition { .. }));

        // Validation happens before any mutation
        assert!(state.zeros().is_empty());

        assert!(state
            .move_point(PointRole::Zero, 0, c(f64::INFINITY, 0.0))
            .is_err());
    }

    #[test]
    fn test_stale_index_rejected() {
        let mut state = FilterState::new();
        state.add_point(PointRole::Pole, c(0.5, 0.0)).unwrap();

        let err = state.remove_point(PointRole::Pole, 3).unwrap_err();
        assert_eq!(
            err,
            DesignError::PointIndexOutOfRange {
                role: PointRole::Pole,
                index: 3,
                count: 1,
            }
        );
    }

    #[test]
    fn test_real_mode_add_creates_conjugate() {
        // Scenario: pole at 0.3+0.4j with real mode on auto-creates 0.3-0.4j
        let mut state = FilterState::new();
        state.set_real_mode(true);
        state.add_point(PointRole::Pole, c(0.3, 0.4)).unwrap();

        assert_eq!(state.poles().len(), 2);
        assert_eq!(state.poles()[1], c(0.3, -0.4));

        // Removing either removes both
        state.remove_point(PointRole::Pole, 0).unwrap();
        assert!(state.poles().is_empty());
    }

    #[test]
    fn test_real_mode_move_keeps_pair_in_sync() {
        let mut state = FilterState::new();
        state.set_real_mode(true);
        state.add_point(PointRole::Zero, c(0.3, 0.4)).unwrap();

        state.move_point(PointRole::Zero, 0, c(0.1, 0.8)).unwrap();
        assert_eq!(state.zeros(), &[c(0.1, 0.8), c(0.1, -0.8)]);

        // Landing on the axis collapses the pair
        state.move_point(PointRole::Zero, 0, c(0.9, 0.0)).unwrap();
        assert_eq!(state.zeros(), &[c(0.9, 0.0)]);
    }

    #[test]
    fn test_real_axis_point_unpaired_in_real_mode() {
        let mut state = FilterState::new();
        state.set_real_mode(true);
        state.add_point(PointRole::Pole, c(0.5, 0.0)).unwrap();
        assert_eq!(state.poles().len(), 1);
    }

    #[test]
    fn test_reenabling_real_mode_repairs_symmetry() {
        let mut state = FilterState::new();
        state.add_point(PointRole::Pole, c(0.3, 0.4)).unwrap();
        assert_eq!(state.poles().len(), 1);

        // Symmetry was only advisory while the mode was off
        state.set_real_mode(true);
        assert_eq!(state.poles().len(), 2);
        assert_eq!(state.poles()[1], c(0.3, -0.4));
    }

    #[test]
    fn test_disabling_real_mode_keeps_existing_conjugates() {
        let mut state = FilterState::new();
        state.set_real_mode(true);
        state.add_point(PointRole::Zero, c(0.2, 0.6)).unwrap();

        state.set_real_mode(false);
        assert_eq!(state.zeros().len(), 2);

        // No longer synchronized: moving one leaves the other alone
        state.move_point(PointRole::Zero, 0, c(0.4, 0.6)).unwrap();
        assert_eq!(state.zeros()[1], c(0.2, -0.6));
    }

    #[test]
    fn test_outside_unit_circle_accepted() {
        let mut state = FilterState::new();
        state.add_point(PointRole::Pole, c(1.5, 0.0)).unwrap();
        assert_eq!(state.poles().len(), 1);
    }
}
