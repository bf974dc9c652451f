//! Dense linear algebra for the coupled transport system.
//!
//! LU factorization with partial pivoting. Systems are small (a few
//! equations times the radial mesh), so a dense factorization is adequate.

use fusion_types::error::{FusionError, FusionResult};
use ndarray::{Array1, Array2};

/// Relative pivot threshold below which the matrix is treated as singular.
const SINGULAR_TOL: f64 = 1e-14;

/// Solve `A x = b` by Gaussian elimination with partial pivoting.
pub fn lu_solve(a: &Array2<f64>, b: &Array1<f64>) -> FusionResult<Array1<f64>> {
    let (rows, cols) = a.dim();
    if rows != cols {
        return Err(FusionError::LinAlg(format!(
            "matrix must be square, got {rows}x{cols}"
        )));
    }
    if b.len() != rows {
        return Err(FusionError::LinAlg(format!(
            "rhs has {} entries, matrix has {rows} rows",
            b.len()
        )));
    }
    let n = rows;
    let mut m = a.clone();
    let mut x = b.clone();

    let scale = m.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return Err(FusionError::SolverDiverged {
            iteration: 0,
            message: format!("matrix scale is {scale}"),
        });
    }

    for k in 0..n {
        // pivot search
        let mut p = k;
        let mut best = m[[k, k]].abs();
        for r in (k + 1)..n {
            let v = m[[r, k]].abs();
            if v > best {
                best = v;
                p = r;
            }
        }
        if best <= SINGULAR_TOL * scale {
            return Err(FusionError::SolverDiverged {
                iteration: k,
                message: format!("singular matrix: pivot {best:e} in column {k}"),
            });
        }
        if p != k {
            for c in 0..n {
                m.swap([k, c], [p, c]);
            }
            x.swap(k, p);
        }
        let pivot = m[[k, k]];
        for r in (k + 1)..n {
            let factor = m[[r, k]] / pivot;
            if factor == 0.0 {
                continue;
            }
            m[[r, k]] = 0.0;
            for c in (k + 1)..n {
                m[[r, c]] -= factor * m[[k, c]];
            }
            x[r] -= factor * x[k];
        }
    }

    for k in (0..n).rev() {
        let mut acc = x[k];
        for c in (k + 1)..n {
            acc -= m[[k, c]] * x[c];
        }
        x[k] = acc / m[[k, k]];
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(FusionError::SolverDiverged {
            iteration: n,
            message: "non-finite entry in dense solution".to_string(),
        });
    }
    Ok(x)
}

/// Extract the three diagonals of a square matrix as Thomas-solver bands.
pub fn tridiagonal_bands(a: &Array2<f64>) -> (Array1<f64>, Array1<f64>, Array1<f64>) {
    let n = a.nrows();
    let mut sub = Array1::zeros(n);
    let mut diag = Array1::zeros(n);
    let mut sup = Array1::zeros(n);
    for i in 0..n {
        diag[i] = a[[i, i]];
        if i > 0 {
            sub[i] = a[[i, i - 1]];
        }
        if i + 1 < n {
            sup[i] = a[[i, i + 1]];
        }
    }
    (sub, diag, sup)
}

/// Mean absolute value, the residual norm used by the Newton solver.
pub fn mean_abs(v: &Array1<f64>) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    v.iter().map(|x| x.abs()).sum::<f64>() / v.len() as f64
}
