const REL_TOL: f64 = 1e-9;
const NP_REL_TOL: f64 = 1e-5;
const NP_ABS_TOL: f64 = 1e-8;

/// True when `a` and `b` are indistinguishable up to a relative tolerance of 1e-9 (no absolute
/// tolerance, so nothing but 0.0 is close to 0.0).
pub fn is_close(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    (a - b).abs() <= REL_TOL * a.abs().max(b.abs())
}

/// `a > b`, or `a` within a loose tolerance of `b`. Used to snap beats onto meter changes.
pub fn gt_or_close(a: f64, b: f64) -> bool {
    a > b || (a - b).abs() <= NP_ABS_TOL + NP_REL_TOL * b.abs()
}
