//! Conjugate-pair maintenance for real-valued filters
//!
//! A filter with real coefficients requires every non-real root to appear
//! together with its complex conjugate. These helpers keep a point sequence
//! symmetric across add/move/remove operations and re-symmetrize root sets
//! coming back from the polynomial root finder.

use num_complex::Complex64;

/// A point whose imaginary part is within this band counts as real-axis
/// and never participates in pairing.
pub const REAL_AXIS_EPS: f64 = 1e-9;

/// Maximum distance between a point and the conjugate of its candidate
/// partner for the two to be treated as a synchronized pair.
pub const PAIR_TOLERANCE: f64 = 1e-6;

/// Whether a point lies on the real axis (no conjugate partner exists)
#[inline]
pub fn is_on_real_axis(z: Complex64) -> bool {
    z.im.abs() <= REAL_AXIS_EPS
}

/// Find the synchronized conjugate partner of `points[index]`, if any
///
/// Returns the index of the nearest point within [`PAIR_TOLERANCE`] of the
/// exact conjugate, or `None` for real-axis points and unpaired points.
pub fn find_partner(points: &[Complex64], index: usize) -> Option<usize> {
    let z = points[index];
    if is_on_real_axis(z) {
        return None;
    }

    let target = z.conj();
    let mut best: Option<(usize, f64)> = None;

    for (j, &candidate) in points.iter().enumerate() {
        if j == index {
            continue;
        }
        let distance = (candidate - target).norm();
        if distance < PAIR_TOLERANCE {
            match best {
                Some((_, d)) if d <= distance => {}
                _ => best = Some((j, distance)),
            }
        }
    }

    best.map(|(j, _)| j)
}

/// Append a point, plus its conjugate when it lies off the real axis
pub fn add_with_conjugate(points: &mut Vec<Complex64>, z: Complex64) {
    points.push(z);
    if !is_on_real_axis(z) {
        points.push(z.conj());
    }
}

/// Reposition a point and keep its conjugate partner in sync
///
/// The partner is looked up at the *old* position, then:
/// - moved to the conjugate of the new position,
/// - removed if the point landed on the real axis (the pair collapses),
/// - created if the point left the real axis without a partner.
pub fn move_with_conjugate(points: &mut Vec<Complex64>, index: usize, z_new: Complex64) {
    let partner = find_partner(points, index);
    points[index] = z_new;

    match partner {
        Some(j) => {
            if is_on_real_axis(z_new) {
                points.remove(j);
            } else {
                points[j] = z_new.conj();
            }
        }
        None => {
            if !is_on_real_axis(z_new) {
                points.push(z_new.conj());
            }
        }
    }
}

/// Remove a point together with its conjugate partner
pub fn remove_with_conjugate(points: &mut Vec<Complex64>, index: usize) {
    match find_partner(points, index) {
        Some(j) => {
            // Remove the higher index first so the lower stays valid
            let (first, second) = if index > j { (index, j) } else { (j, index) };
            points.remove(first);
            points.remove(second);
        }
        None => {
            points.remove(index);
        }
    }
}

/// Create the missing conjugate for every unpaired off-axis point
///
/// Used when real-filter mode is re-enabled after edits made while it was
/// off: existing points are never removed, only completed into pairs.
pub fn pair_missing(points: &mut Vec<Complex64>) {
    let mut claimed = vec![false; points.len()];
    let mut missing = Vec::new();

    for i in 0..points.len() {
        if claimed[i] || is_on_real_axis(points[i]) {
            continue;
        }
        match find_partner(points, i) {
            Some(j) if !claimed[j] => {
                claimed[i] = true;
                claimed[j] = true;
            }
            _ => missing.push(points[i].conj()),
        }
    }

    points.extend(missing);
}

/// Snap a root set from the polynomial root finder to exact conjugate symmetry
///
/// Root finding on real coefficients yields conjugate pairs only up to
/// floating-point error. Near-real roots are clamped onto the axis and each
/// remaining root is matched to its nearest conjugate candidate, which is
/// then overwritten with the exact conjugate.
pub fn symmetrize(roots: &mut [Complex64]) {
    // Residual imaginary parts from the iteration are larger than the
    // pairing epsilon, so clamp with a coarser band first.
    const AXIS_SNAP: f64 = 1e-8;
    for root in roots.iter_mut() {
        if root.im.abs() <= AXIS_SNAP {
            root.im = 0.0;
        }
    }

    let mut claimed = vec![false; roots.len()];
    for i in 0..roots.len() {
        if claimed[i] || is_on_real_axis(roots[i]) {
            continue;
        }

        let target = roots[i].conj();
        let mut best: Option<(usize, f64)> = None;
        for (j, &candidate) in roots.iter().enumerate() {
            if j == i || claimed[j] || is_on_real_axis(candidate) {
                continue;
            }
            let distance = (candidate - target).norm();
            match best {
                Some((_, d)) if d <= distance => {}
                _ => best = Some((j, distance)),
            }
        }

        if let Some((j, _)) = best {
            roots[j] = target;
            claimed[i] = true;
            claimed[j] = true;
        }
    }
}
