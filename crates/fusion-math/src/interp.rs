//! 1-D linear interpolation with flat extrapolation.
//!
//! Shared by the time-varying parameter resolver (time axis) and by the
//! profile resolver (radial axis).

use ndarray::Array1;

/// Position of `x` relative to strictly increasing knots `xs`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bracket {
    /// `x` lies at or outside an end of the range, or exactly on a knot:
    /// the value at knot `index` is returned unchanged.
    Knot(usize),
    /// `xs[lo] < x < xs[lo + 1]`, with `frac` in (0, 1).
    Between { lo: usize, frac: f64 },
}

/// Locate `x` among `xs`.
///
/// `xs` must be non-empty and strictly increasing. Values before the first
/// knot clamp to knot 0, values after the last clamp to the last knot. NaN
/// clamps to knot 0.
pub fn bracket(xs: &[f64], x: f64) -> Bracket {
    let n = xs.len();
    // number of knots <= x
    let idx = xs.partition_point(|&k| k <= x);
    if idx == 0 {
        return Bracket::Knot(0);
    }
    if idx == n {
        return Bracket::Knot(n - 1);
    }
    let lo = idx - 1;
    if xs[lo] == x {
        return Bracket::Knot(lo);
    }
    Bracket::Between {
        lo,
        frac: (x - xs[lo]) / (xs[lo + 1] - xs[lo]),
    }
}

/// Index of the greatest knot <= `x`, or 0 if `x` precedes every knot.
pub fn step_index(xs: &[f64], x: f64) -> usize {
    xs.partition_point(|&k| k <= x).saturating_sub(1)
}

/// Linear interpolation of `ys` sampled at `xs`, flat outside the range.
pub fn interp1d(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    match bracket(xs, x) {
        Bracket::Knot(i) => ys[i],
        Bracket::Between { lo, frac } => (1.0 - frac) * ys[lo] + frac * ys[lo + 1],
    }
}

/// `interp1d` evaluated on every point of `query`.
pub fn interp1d_array(xs: &[f64], ys: &[f64], query: &Array1<f64>) -> Array1<f64> {
    query.mapv(|x| interp1d(xs, ys, x))
}

/// True if `xs` is non-empty, finite and strictly increasing in the order given.
pub fn is_strictly_increasing(xs: &[f64]) -> bool {
    !xs.is_empty()
        && xs.iter().all(|x| x.is_finite())
        && xs.windows(2).all(|w| w[0] < w[1])
}
