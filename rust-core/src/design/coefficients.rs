//! Transfer-function coefficients and the root/coefficient duality
//!
//! Forward map: expand `(1 - r·z^-1)` factors over the zero/pole sets into
//! numerator/denominator coefficient arrays (powers of `z^-1`, monic
//! denominator, numerator scaled by the overall gain). Inverse map: strip
//! and normalize edited coefficient arrays, then recover the root sets with
//! a Durand-Kerner iteration.
//!
//! Coefficient arrays read in ascending powers of `z^-1`, which is the same
//! array as the descending-power polynomial in `z` — so the roots of the
//! array are exactly the zeros/poles of the transfer function.

use num_complex::Complex64;
use thiserror::Error;

use super::state::FilterState;

/// Coefficients with magnitude below this are treated as structural zeros
/// when stripping array edges.
const COEFF_EPS: f64 = 1e-12;

/// Relative imaginary residue below which a coefficient counts as real
pub const REALNESS_TOLERANCE: f64 = 1e-9;

const MAX_ROOT_ITERATIONS: usize = 200;
const ROOT_CONVERGENCE: f64 = 1e-13;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoefficientError {
    #[error("denominator has no usable leading coefficient (all entries are zero)")]
    DegenerateDenominator,

    #[error("coefficient {index} of {which} is not finite ({value})")]
    NonFiniteCoefficient {
        which: &'static str,
        index: usize,
        value: f64,
    },
}

/// Derived transfer function `H(z) = z^-k · B(z) / A(z)`
///
/// `b` and `a` are kept complex internally — they are exact products of the
/// root factors — and exposed as real views with the sub-tolerance imaginary
/// residue clamped away. With a conjugate-symmetric root set the residue is
/// floating-point noise only; an asymmetric set genuinely leaks imaginary
/// parts, which [`TransferFunction::is_real`] reports.
#[derive(Debug, Clone)]
pub struct TransferFunction {
    b: Vec<Complex64>,
    a: Vec<Complex64>,
    extra_delay: i64,
}

impl TransferFunction {
    /// The identity filter `H(z) = 1`
    pub fn identity() -> Self {
        Self {
            b: vec![Complex64::new(1.0, 0.0)],
            a: vec![Complex64::new(1.0, 0.0)],
            extra_delay: 0,
        }
    }

    /// Derive coefficients from the current filter geometry
    ///
    /// The denominator comes out monic (`a[0] = 1` exactly) because the
    /// factor expansion starts from the constant polynomial 1.
    pub fn from_state(state: &FilterState) -> Self {
        let gain = state.gain();
        let mut b = polynomial_from_roots(state.zeros());
        for coeff in b.iter_mut() {
            *coeff *= gain;
        }

        Self {
            b,
            a: polynomial_from_roots(state.poles()),
            extra_delay: state.extra_delay(),
        }
    }

    /// Numerator coefficients, ascending powers of `z^-1`
    pub fn b(&self) -> &[Complex64] {
        &self.b
    }

    /// Denominator coefficients, ascending powers of `z^-1`
    pub fn a(&self) -> &[Complex64] {
        &self.a
    }

    /// Extra delay `k` in the `z^-k` factor (not folded into the arrays)
    pub fn extra_delay(&self) -> i64 {
        self.extra_delay
    }

    /// Real numerator view (imaginary residue clamped)
    pub fn b_real(&self) -> Vec<f64> {
        self.b.iter().map(|c| c.re).collect()
    }

    /// Real denominator view (imaginary residue clamped)
    pub fn a_real(&self) -> Vec<f64> {
        self.a.iter().map(|c| c.re).collect()
    }

    /// Whether every coefficient is real within [`REALNESS_TOLERANCE`]
    ///
    /// Always true when the root sets are conjugate-symmetric, so in
    /// real-filter mode a `false` here indicates a defect upstream.
    pub fn is_real(&self) -> bool {
        let residue_ok = |c: &Complex64| c.im.abs() <= REALNESS_TOLERANCE * c.norm().max(1.0);
        self.b.iter().all(residue_ok) && self.a.iter().all(residue_ok)
    }
}

/// Root sets recovered from edited coefficient arrays
#[derive(Debug, Clone)]
pub struct ExtractedRoots {
    pub zeros: Vec<Complex64>,
    pub poles: Vec<Complex64>,
    /// Signed gain, `b_lead / a_lead`
    pub gain: f64,
    /// Delay implied by leading structural zeros in the edited arrays
    /// (leading zeros of `b` delay, leading zeros of `a` advance)
    pub delay_adjustment: i64,
}

/// Expand `∏ (1 - r_i·z^-1)` into coefficients, ascending powers of `z^-1`
///
/// An empty root set yields the constant polynomial `[1]`.
pub fn polynomial_from_roots(roots: &[Complex64]) -> Vec<Complex64> {
    let mut coeffs = Vec::with_capacity(roots.len() + 1);
    coeffs.push(Complex64::new(1.0, 0.0));

    for &root in roots {
        coeffs.push(Complex64::new(0.0, 0.0));
        // Multiply the accumulated polynomial by (1 - root·z^-1)
        for k in (1..coeffs.len()).rev() {
            let lower = coeffs[k - 1];
            coeffs[k] -= root * lower;
        }
    }

    coeffs
}

/// Evaluate a polynomial given in descending powers at `z` (Horner)
pub fn evaluate_polynomial(coeffs: &[Complex64], z: Complex64) -> Complex64 {
    let mut acc = Complex64::new(0.0, 0.0);
    for &c in coeffs {
        acc = acc * z + c;
    }
    acc
}

/// Find all roots of a polynomial with the Durand-Kerner iteration
///
/// Coefficients read in descending powers; leading structural zeros are
/// stripped. Converges simultaneously on all roots from a complex spiral of
/// initial guesses; adequate for the point counts this tool works with
/// (tens of roots).
pub fn polynomial_roots(coeffs: &[Complex64]) -> Vec<Complex64> {
    let first = match coeffs.iter().position(|c| c.norm() > COEFF_EPS) {
        Some(i) => i,
        None => return Vec::new(),
    };
    let stripped = &coeffs[first..];
    let degree = stripped.len() - 1;
    if degree == 0 {
        return Vec::new();
    }

    let lead = stripped[0];
    let monic: Vec<Complex64> = stripped.iter().map(|&c| c / lead).collect();

    // Distinct non-real starting points; the classic (0.4 + 0.9i)^k spiral
    let seed = Complex64::new(0.4, 0.9);
    let mut roots: Vec<Complex64> = (1..=degree as u32).map(|k| seed.powu(k)).collect();

    for _ in 0..MAX_ROOT_ITERATIONS {
        let mut converged = true;

        for i in 0..degree {
            let numerator = evaluate_polynomial(&monic, roots[i]);

            let mut denominator = Complex64::new(1.0, 0.0);
            for j in 0..degree {
                if j != i {
                    denominator *= roots[i] - roots[j];
                }
            }
            if denominator.norm() < 1e-300 {
                continue;
            }

            let correction = numerator / denominator;
            roots[i] -= correction;
            if correction.norm() > ROOT_CONVERGENCE * roots[i].norm().max(1.0) {
                converged = false;
            }
        }

        if converged {
            break;
        }
    }

    roots
}

/// Inverse map: recover root sets, gain, and implied delay from edited arrays
///
/// The denominator must keep a nonzero leading coefficient after stripping;
/// otherwise the edit is rejected before any state changes.
pub fn roots_from_coefficients(
    b: &[f64],
    a: &[f64],
) -> Result<ExtractedRoots, CoefficientError> {
    check_finite(b, "numerator")?;
    check_finite(a, "denominator")?;

    let a_skip = a.iter().position(|c| c.abs() > COEFF_EPS);
    let a_lead_index = a_skip.ok_or(CoefficientError::DegenerateDenominator)?;
    let a_stripped = &a[a_lead_index..];

    let b_skip = b.iter().position(|c| c.abs() > COEFF_EPS);
    let (b_stripped, b_lead_index): (&[f64], usize) = match b_skip {
        Some(i) => (&b[i..], i),
        None => (&[], 0),
    };

    let gain = if b_stripped.is_empty() {
        0.0
    } else {
        b_stripped[0] / a_stripped[0]
    };

    let to_complex = |c: &[f64]| -> Vec<Complex64> {
        c.iter().map(|&x| Complex64::new(x, 0.0)).collect()
    };

    Ok(ExtractedRoots {
        zeros: polynomial_roots(&to_complex(b_stripped)),
        poles: polynomial_roots(&to_complex(a_stripped)),
        gain,
        delay_adjustment: b_lead_index as i64 - a_lead_index as i64,
    })
}

fn check_finite(coeffs: &[f64], which: &'static str) -> Result<(), CoefficientError> {
    for (index, &value) in coeffs.iter().enumerate() {
        if !value.is_finite() {
            return Err(CoefficientError::NonFiniteCoefficient {
                which,
                index,
                value,
            });
        }
    }
    Ok(())
}
