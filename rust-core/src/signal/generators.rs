//! Primitive DSP test sequences
//!
//! Scalar building blocks for the expression language: step, impulse,
//! ramp, rectangular pulse, impulse train. Each takes the (possibly
//! shifted) index value and returns one sample.

/// Unit step: 1 for `t >= 0`
#[inline]
pub fn unit_step(t: f64) -> f64 {
    if t >= 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Unit impulse: 1 at `t == 0` (within a small band, so shifted integer
/// indices hit it exactly)
#[inline]
pub fn impulse(t: f64) -> f64 {
    if t.abs() < 1e-9 {
        1.0
    } else {
        0.0
    }
}

/// Ramp: `t` for `t >= 0`, 0 before
#[inline]
pub fn ramp(t: f64) -> f64 {
    t * unit_step(t)
}

/// Rectangular pulse: 1 for `0 <= t < width`
#[inline]
pub fn rect(t: f64, width: f64) -> f64 {
    if t >= 0.0 && t < width {
        1.0
    } else {
        0.0
    }
}

/// Train of `count` unit impulses at `start, start + spacing, ...`
pub fn pulse_train(t: f64, start: f64, spacing: f64, count: usize) -> f64 {
    for k in 0..count {
        if (t - (start + k as f64 * spacing)).abs() < 1e-9 {
            return 1.0;
        }
    }
    0.0
}

/// Normalized sinc: `sin(πt) / (πt)`, 1 at the origin
pub fn sinc(t: f64) -> f64 {
    if t.abs() < 1e-12 {
        1.0
    } else {
        let x = std::f64::consts::PI * t;
        x.sin() / x
    }
}
