// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Tridiag
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Thomas algorithm for tridiagonal systems.
//!
//! Used by the transport solver when a single equation is evolved.

use fusion_types::error::{FusionError, FusionResult};
use ndarray::Array1;

/// Pivots smaller than this (relative to the row scale) mark the system singular.
const PIVOT_TOL: f64 = 1e-300;

/// Solve tridiagonal system Ax = d using the Thomas algorithm.
///
/// - `a`: sub-diagonal \[n\] (a\[0\] unused)
/// - `b`: main diagonal \[n\]
/// - `c`: super-diagonal \[n\] (c\[n-1\] unused)
/// - `d`: right-hand side \[n\]
///
/// Returns `LinAlg` on inconsistent lengths and `SolverDiverged` if a pivot
/// vanishes or the result is not finite.
pub fn thomas_solve(
    a: &Array1<f64>,
    b: &Array1<f64>,
    c: &Array1<f64>,
    d: &Array1<f64>,
) -> FusionResult<Array1<f64>> {
    let n = d.len();
    if n == 0 {
        return Err(FusionError::LinAlg("System size must be > 0".to_string()));
    }
    if a.len() != n || b.len() != n || c.len() != n {
        return Err(FusionError::LinAlg(format!(
            "tridiagonal bands have lengths a={}, b={}, c={}, rhs={n}",
            a.len(),
            b.len(),
            c.len()
        )));
    }

    let mut c_prime = Array1::zeros(n);
    let mut d_prime = Array1::zeros(n);

    if b[0].abs() < PIVOT_TOL {
        return Err(FusionError::SolverDiverged {
            iteration: 0,
            message: "zero pivot in row 0".to_string(),
        });
    }
    c_prime[0] = c[0] / b[0];
    d_prime[0] = d[0] / b[0];

    for i in 1..n {
        let den = b[i] - a[i] * c_prime[i - 1];
        if den.abs() < PIVOT_TOL {
            return Err(FusionError::SolverDiverged {
                iteration: i,
                message: format!("zero pivot in row {i}"),
            });
        }
        if i < n - 1 {
            c_prime[i] = c[i] / den;
        }
        d_prime[i] = (d[i] - a[i] * d_prime[i - 1]) / den;
    }

    let mut x = Array1::zeros(n);
    x[n - 1] = d_prime[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = d_prime[i] - c_prime[i] * x[i + 1];
    }

    if x.iter().any(|v: &f64| !v.is_finite()) {
        return Err(FusionError::SolverDiverged {
            iteration: n,
            message: "non-finite entry in tridiagonal solution".to_string(),
        });
    }
    Ok(x)
}
