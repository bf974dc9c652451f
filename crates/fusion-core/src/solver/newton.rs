// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Newton-Raphson Theta Method
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Nonlinear theta step solved by Newton-Raphson.
//!
//! The Jacobian of the scaled residual is built by forward differences. Each
//! update is damped by a backtracking line search that rejects trial states
//! with non-positive temperature or density, non-finite residuals or a
//! residual that does not decrease. Non-convergence is reported through the
//! error state, never as an `Err`.

use super::kernel::SolverKernel;
use super::linear::predictor_corrector;
use super::{Solver, SolverInput, SolverOutput, ThetaProblem};
use crate::config::InitialGuessMode;
use crate::jacobian::{compute_fd_jacobian, DEFAULT_RELATIVE_STEP};
use fusion_math::linalg::{lu_solve, mean_abs};
use fusion_types::error::FusionResult;
use fusion_types::state::{SolverErrorState, SolverNumericOutputs};
use log::trace;
use ndarray::Array1;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct NewtonRaphsonThetaMethod {
    kernel: Arc<SolverKernel>,
}

impl NewtonRaphsonThetaMethod {
    pub fn new(kernel: Arc<SolverKernel>) -> Self {
        NewtonRaphsonThetaMethod { kernel }
    }

    fn initial_guess(&self, problem: &ThetaProblem<'_>) -> Array1<f64> {
        let fallback = self.kernel.pack(&problem.template);
        match self.kernel.initial_guess_mode {
            InitialGuessMode::XOld => fallback,
            InitialGuessMode::Linear => match predictor_corrector(problem) {
                Ok((x, _)) if self.kernel.is_physical(&x) => x,
                _ => fallback,
            },
        }
    }
}

/// Map the final residual onto the three-way error state.
pub fn classify_residual(residual: f64, tol: f64, coarse_tol: f64) -> SolverErrorState {
    if residual < tol {
        SolverErrorState::Converged
    } else if residual < coarse_tol {
        SolverErrorState::CoarseConverged
    } else {
        SolverErrorState::NotConverged
    }
}

struct LineSearch {
    x: Array1<f64>,
    r: Array1<f64>,
    norm: f64,
    evaluations: usize,
}

impl Solver for NewtonRaphsonThetaMethod {
    fn step(&self, input: &SolverInput<'_>) -> FusionResult<SolverOutput> {
        let kernel = &self.kernel;
        let problem = ThetaProblem::new(kernel, input)?;
        let params = &input.dynamic_t_plus_dt.solver;

        let mut x = self.initial_guess(&problem);
        let mut inner = 0usize;
        let mut outer = 0usize;
        let mut norm = f64::INFINITY;
        let mut r = Array1::zeros(x.len());
        if let Ok(r0) = problem.residual(&x) {
            norm = mean_abs(&r0);
            r = r0;
        }
        if kernel.log_iterations {
            trace!("newton t={:.6e} dt={:.3e} initial residual={norm:.3e}", input.t, input.dt);
        }

        while norm.is_finite() && norm >= params.residual_tol && outer < params.n_max_iterations {
            let jac = match compute_fd_jacobian(|y| problem.residual(y), &x, &r, DEFAULT_RELATIVE_STEP) {
                Ok(j) => j,
                Err(_) => break,
            };
            let neg_r = -&r;
            let delta = match lu_solve(&jac, &neg_r) {
                Ok(d) => d,
                Err(_) => break,
            };
            let Some(accepted) = self.line_search(&problem, &x, &delta, norm, params.delta_reduction_factor, params.tau_min) else {
                break;
            };
            inner += accepted.evaluations;
            outer += 1;
            x = accepted.x;
            r = accepted.r;
            norm = accepted.norm;
            if kernel.log_iterations {
                trace!("newton iteration {outer}: residual={norm:.3e}");
            }
        }

        let state = classify_residual(norm, params.residual_tol, params.residual_coarse_tol);
        if kernel.log_iterations {
            trace!("newton finished after {outer} iterations, error state {}", state.code());
        }
        let numerics = SolverNumericOutputs {
            outer_solver_iterations: outer,
            inner_solver_iterations: inner,
            solver_error_state: state,
        };
        if !kernel.is_physical(&x) {
            // Only reachable when the start state itself was unusable.
            return problem.finish(
                &kernel.pack(&problem.template),
                SolverNumericOutputs {
                    solver_error_state: SolverErrorState::NotConverged,
                    ..numerics
                },
            );
        }
        problem.finish(&x, numerics)
    }
}

impl NewtonRaphsonThetaMethod {
    /// Backtrack along `delta` until the residual decreases; `None` once the
    /// step fraction falls below `tau_min`.
    fn line_search(
        &self,
        problem: &ThetaProblem<'_>,
        x: &Array1<f64>,
        delta: &Array1<f64>,
        norm: f64,
        reduction: f64,
        tau_min: f64,
    ) -> Option<LineSearch> {
        let mut tau = 1.0;
        let mut evaluations = 0;
        while tau >= tau_min {
            let trial = x + &(delta * tau);
            evaluations += 1;
            if self.kernel.is_physical(&trial) {
                if let Ok(r) = problem.residual(&trial) {
                    let trial_norm = mean_abs(&r);
                    if trial_norm.is_finite() && trial_norm < norm {
                        return Some(LineSearch {
                            x: trial,
                            r,
                            norm: trial_norm,
                            evaluations,
                        });
                    }
                }
            }
            tau *= reduction;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        CriticalGradientConfig, EiExchangeConfig, GenericHeatConfig, SimulationConfig, SolverType,
        TransportModelConfig,
    };
    use crate::solver::test_support::fixture;

    fn newton_config() -> SimulationConfig {
        let mut cfg = SimulationConfig::default();
        cfg.solver.solver_type = SolverType::NewtonRaphson;
        cfg.transport.model = TransportModelConfig::CriticalGradient(CriticalGradientConfig::default());
        cfg.sources.generic_heat = Some(GenericHeatConfig::default());
        cfg.sources.ei_exchange = Some(EiExchangeConfig::default());
        cfg
    }

    fn run(cfg: &SimulationConfig, dt: f64) -> SolverOutput {
        let f = fixture(cfg, dt);
        let kernel = Arc::new(SolverKernel::build(&f.static_params).expect("kernel"));
        let input = SolverInput {
            t: cfg.numerics.t_initial,
            dt,
            dynamic_t: &f.dynamic_t,
            dynamic_t_plus_dt: &f.dynamic_t_plus_dt,
            static_params: &f.static_params,
            geo_t: &f.geo_t,
            geo_t_plus_dt: &f.geo_t_plus_dt,
            state_t: &f.state,
        };
        NewtonRaphsonThetaMethod::new(kernel).step(&input).expect("newton step")
    }

    #[test]
    fn test_classify_residual() {
        assert_eq!(classify_residual(1e-6, 1e-5, 1e-2), SolverErrorState::Converged);
        assert_eq!(classify_residual(1e-3, 1e-5, 1e-2), SolverErrorState::CoarseConverged);
        assert_eq!(classify_residual(1.0, 1e-5, 1e-2), SolverErrorState::NotConverged);
        assert_eq!(classify_residual(f64::NAN, 1e-5, 1e-2), SolverErrorState::NotConverged);
    }

    #[test]
    fn test_newton_converges_on_coupled_nonlinear_case() {
        let out = run(&newton_config(), 0.01);
        let n = out.solver_numeric_outputs;
        assert!(n.solver_error_state.is_acceptable(), "{n:?}");
        assert!(n.outer_solver_iterations <= 30, "{n:?}");
        assert!(out.core_profiles.t_i.value.iter().all(|v| *v > 0.0));
    }

    #[test]
    fn test_newton_from_x_old_converges() {
        let mut cfg = newton_config();
        cfg.solver.initial_guess_mode = InitialGuessMode::XOld;
        let out = run(&cfg, 0.01);
        assert!(out.solver_numeric_outputs.solver_error_state.is_acceptable());
    }

    #[test]
    fn test_impossible_tolerance_reports_not_converged() {
        let mut cfg = newton_config();
        cfg.solver.residual_tol = 1e-300;
        cfg.solver.residual_coarse_tol = 1e-300;
        cfg.solver.n_max_iterations = 1;
        let out = run(&cfg, 0.01);
        assert_eq!(out.solver_numeric_outputs.solver_error_state, SolverErrorState::NotConverged);
        assert!(out.solver_numeric_outputs.outer_solver_iterations <= 1);
    }

    #[test]
    fn test_newton_is_deterministic() {
        let cfg = newton_config();
        let a = run(&cfg, 0.01);
        let b = run(&cfg, 0.01);
        assert_eq!(a.core_profiles, b.core_profiles);
        assert_eq!(a.solver_numeric_outputs, b.solver_numeric_outputs);
    }
}
