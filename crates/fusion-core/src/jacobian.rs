// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Finite-Difference Jacobian
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Forward-difference Jacobian of a vector residual.
//!
//! Column j is (R(x + h_j e_j) - R(x)) / h_j with a step scaled to the
//! magnitude of x_j, so temperatures in keV and fluxes in Wb/rad share one
//! relative accuracy.

use fusion_types::error::{FusionError, FusionResult};
use ndarray::{Array1, Array2};

/// sqrt of f64 machine epsilon.
pub const DEFAULT_RELATIVE_STEP: f64 = 1.5e-8;

/// J[i][j] = dR_i / dx_j around `x`, reusing the already evaluated `r0`.
pub fn compute_fd_jacobian<F>(
    residual: F,
    x: &Array1<f64>,
    r0: &Array1<f64>,
    relative_step: f64,
) -> FusionResult<Array2<f64>>
where
    F: Fn(&Array1<f64>) -> FusionResult<Array1<f64>>,
{
    if !relative_step.is_finite() || relative_step <= 0.0 {
        return Err(FusionError::ConfigError(
            "jacobian relative_step must be finite and > 0".to_string(),
        ));
    }
    let n = x.len();
    if r0.len() != n {
        return Err(FusionError::MeshMismatch {
            expected: n,
            actual: r0.len(),
        });
    }

    let mut jac = Array2::zeros((n, n));
    let mut x_pert = x.clone();
    for col in 0..n {
        let h = relative_step * x[col].abs().max(1.0);
        x_pert[col] = x[col] + h;
        let r_pert = residual(&x_pert)?;
        x_pert[col] = x[col];
        if r_pert.len() != n {
            return Err(FusionError::MeshMismatch {
                expected: n,
                actual: r_pert.len(),
            });
        }
        for row in 0..n {
            jac[[row, col]] = (r_pert[row] - r0[row]) / h;
        }
    }
    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fd_jacobian_matches_analytic() {
        // R(x) = [x0^2 + x1, 3 x0 x1]
        let residual =
            |x: &Array1<f64>| -> FusionResult<Array1<f64>> { Ok(array![x[0] * x[0] + x[1], 3.0 * x[0] * x[1]]) };
        let x = array![2.0, -1.5];
        let r0 = residual(&x).expect("residual");
        let jac = compute_fd_jacobian(residual, &x, &r0, DEFAULT_RELATIVE_STEP).expect("jacobian");
        let expected = [[4.0, 1.0], [-4.5, 6.0]];
        for i in 0..2 {
            for j in 0..2 {
                let abs = (jac[[i, j]] - expected[i][j]).abs();
                assert!(abs < 1e-5, "Mismatch at ({i},{j}): fd={}, exact={}", jac[[i, j]], expected[i][j]);
            }
        }
    }

    #[test]
    fn test_fd_jacobian_of_linear_map_is_the_matrix() {
        let a = array![[2.0, -1.0, 0.0], [-1.0, 2.0, -1.0], [0.0, -1.0, 2.0]];
        let residual = |x: &Array1<f64>| -> FusionResult<Array1<f64>> { Ok(a.dot(x)) };
        let x = array![1.0e3, 0.5, -7.0];
        let r0 = residual(&x).expect("residual");
        let jac = compute_fd_jacobian(residual, &x, &r0, DEFAULT_RELATIVE_STEP).expect("jacobian");
        for ((i, j), v) in jac.indexed_iter() {
            assert!((v - a[[i, j]]).abs() < 1e-4, "({i},{j}) = {v}");
        }
    }

    #[test]
    fn test_fd_jacobian_rejects_invalid_step() {
        let residual = |x: &Array1<f64>| -> FusionResult<Array1<f64>> { Ok(x.clone()) };
        let x = array![1.0];
        let r0 = x.clone();
        assert!(compute_fd_jacobian(residual, &x, &r0, 0.0).is_err());
        assert!(compute_fd_jacobian(residual, &x, &r0, f64::NAN).is_err());
    }

    #[test]
    fn test_fd_jacobian_propagates_residual_error() {
        let residual = |_: &Array1<f64>| -> FusionResult<Array1<f64>> {
            Err(FusionError::PhysicsViolation("negative temperature".to_string()))
        };
        let x = array![1.0, 2.0];
        let r0 = array![0.0, 0.0];
        assert!(compute_fd_jacobian(residual, &x, &r0, DEFAULT_RELATIVE_STEP).is_err());
    }
}
