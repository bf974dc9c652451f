// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Simulation Step Function
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! One accepted time step, with dt shrinking on solver failure.
//!
//! compute-dt -> attempt-solve -> accept | reject-and-shrink | fatal.
//! A rejected attempt retries from the same start state with
//! dt / dt_reduction_factor, never below min_dt. The attempt at min_dt is
//! the last one; with adaptive stepping off the first failure is fatal.

use crate::config::SimulationConfig;
use crate::geometry_provider::{consistent_params_and_geometry, GeometryProvider};
use crate::post_processing::{make_post_processed_outputs, PostProcessedOutputs};
use crate::runtime_params::{DynamicRuntimeParamsSlice, StaticRuntimeParamsSlice};
use crate::solver::{Solver, SolverInput, SolverOutput};
use crate::time_step_calculator::TimeStepCalculator;
use fusion_types::error::{FusionError, FusionResult};
use fusion_types::geometry::Geometry;
use fusion_types::state::{SimError, SimulationState, SolverErrorState, SolverNumericOutputs};
use log::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Accepted {
        state: Box<SimulationState>,
        post_processed: PostProcessedOutputs,
    },
    Failed {
        error: SimError,
        last_dt: f64,
        solver_numeric_outputs: SolverNumericOutputs,
    },
}

/// `NanDetected` when an evolved profile or a post-processed quantity is not
/// finite.
pub fn check_for_errors(state: &SimulationState, post_processed: &PostProcessedOutputs) -> SimError {
    if !state.core_profiles.is_finite() || !post_processed.is_finite() {
        SimError::NanDetected
    } else {
        SimError::NoError
    }
}

/// Numerical breakdown inside a solve counts as a failed attempt.
fn is_recoverable(err: &FusionError) -> bool {
    matches!(err, FusionError::SolverDiverged { .. } | FusionError::LinAlg(_))
}

#[derive(Debug)]
pub struct SimulationStepFn {
    config: SimulationConfig,
    static_params: StaticRuntimeParamsSlice,
    geometry_provider: GeometryProvider,
    solver: Box<dyn Solver>,
    time_step_calculator: TimeStepCalculator,
}

impl SimulationStepFn {
    pub fn new(
        config: SimulationConfig,
        static_params: StaticRuntimeParamsSlice,
        geometry_provider: GeometryProvider,
        solver: Box<dyn Solver>,
    ) -> Self {
        let time_step_calculator = TimeStepCalculator::from_type(static_params.time_step_calculator);
        SimulationStepFn {
            config,
            static_params,
            geometry_provider,
            solver,
            time_step_calculator,
        }
    }

    pub fn static_params(&self) -> &StaticRuntimeParamsSlice {
        &self.static_params
    }

    pub fn time_step_calculator(&self) -> TimeStepCalculator {
        self.time_step_calculator
    }

    pub fn slice_at(&self, t: f64) -> FusionResult<(DynamicRuntimeParamsSlice, Geometry)> {
        consistent_params_and_geometry(t, &self.config, &self.geometry_provider)
    }

    pub fn not_done(&self, t: f64) -> bool {
        self.time_step_calculator.not_done(t, self.config.numerics.t_final)
    }

    pub fn step(
        &self,
        state: &SimulationState,
        previous_post_processed: &PostProcessedOutputs,
    ) -> FusionResult<StepOutcome> {
        let (dynamic_t, geo_t) = self.slice_at(state.t)?;
        let numerics = &dynamic_t.numerics;
        let mut dt = self.time_step_calculator.next_dt(state.t, state, &dynamic_t);

        loop {
            let t_next = state.t + dt;
            let (dynamic_next, geo_next) = self.slice_at(t_next)?;
            let input = SolverInput {
                t: state.t,
                dt,
                dynamic_t: &dynamic_t,
                dynamic_t_plus_dt: &dynamic_next,
                static_params: &self.static_params,
                geo_t: &geo_t,
                geo_t_plus_dt: &geo_next,
                state_t: state,
            };

            let attempt = match self.solver.step(&input) {
                Ok(out) => Ok(out),
                Err(err) if is_recoverable(&err) => {
                    warn!("solver failed at t={:.6e} with dt={:.3e}: {err}", state.t, dt);
                    Err(SolverNumericOutputs {
                        solver_error_state: SolverErrorState::NotConverged,
                        ..SolverNumericOutputs::default()
                    })
                }
                Err(err) => return Err(err),
            };

            let numerics_out = match attempt {
                Ok(out) if out.solver_numeric_outputs.solver_error_state.is_acceptable() => {
                    return Ok(self.accept(out, t_next, dt, geo_next, &dynamic_next, previous_post_processed));
                }
                Ok(out) => out.solver_numeric_outputs,
                Err(numerics_out) => numerics_out,
            };

            if !numerics.adaptive_dt {
                return Ok(StepOutcome::Failed {
                    error: SimError::StepFailure,
                    last_dt: dt,
                    solver_numeric_outputs: numerics_out,
                });
            }
            if dt <= numerics.min_dt {
                return Ok(StepOutcome::Failed {
                    error: SimError::ReachedMinDt,
                    last_dt: dt,
                    solver_numeric_outputs: numerics_out,
                });
            }
            let next_dt = (dt / numerics.dt_reduction_factor).max(numerics.min_dt);
            warn!(
                "solver did not converge at t={:.6e} with dt={dt:.3e}; retrying with dt={next_dt:.3e}",
                state.t
            );
            dt = next_dt;
        }
    }

    fn accept(
        &self,
        out: SolverOutput,
        t_next: f64,
        dt: f64,
        geometry: Geometry,
        dynamic_next: &DynamicRuntimeParamsSlice,
        previous_post_processed: &PostProcessedOutputs,
    ) -> StepOutcome {
        if out.solver_numeric_outputs.solver_error_state == SolverErrorState::CoarseConverged {
            warn!("step to t={t_next:.6e} accepted at coarse tolerance");
        }
        let state = SimulationState {
            t: t_next,
            dt,
            core_profiles: out.core_profiles,
            core_transport: out.core_transport,
            core_sources: out.core_sources,
            solver_numeric_outputs: out.solver_numeric_outputs,
            geometry,
        };
        let post_processed = make_post_processed_outputs(&state, dynamic_next, Some(previous_post_processed));
        match check_for_errors(&state, &post_processed) {
            SimError::NoError => StepOutcome::Accepted {
                state: Box::new(state),
                post_processed,
            },
            error => StepOutcome::Failed {
                error,
                last_dt: dt,
                solver_numeric_outputs: state.solver_numeric_outputs,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initial_state::initial_state;
    use crate::runtime_params::build_static_params;
    use crate::solver::kernel::SolverKernel;
    use crate::solver::LinearThetaMethod;
    use std::cell::RefCell;
    use std::sync::Arc;

    /// Linear solver that reports non-convergence whenever dt exceeds a cap.
    #[derive(Debug)]
    struct DtCappedSolver {
        inner: LinearThetaMethod,
        max_ok_dt: f64,
        seen_dts: RefCell<Vec<f64>>,
    }

    impl Solver for DtCappedSolver {
        fn step(&self, input: &SolverInput<'_>) -> FusionResult<SolverOutput> {
            self.seen_dts.borrow_mut().push(input.dt);
            let mut out = self.inner.step(input)?;
            if input.dt > self.max_ok_dt {
                out.solver_numeric_outputs.solver_error_state = SolverErrorState::NotConverged;
            }
            Ok(out)
        }
    }

    fn step_fn(cfg: &SimulationConfig, max_ok_dt: f64) -> (SimulationStepFn, SimulationState, PostProcessedOutputs) {
        let static_params = build_static_params(cfg);
        let provider = GeometryProvider::from_config(&cfg.geometry).expect("valid geometry");
        let (state, post) = initial_state(cfg, &static_params, &provider).expect("initial state");
        let kernel = Arc::new(SolverKernel::build(&static_params).expect("kernel"));
        let solver = DtCappedSolver {
            inner: LinearThetaMethod::new(kernel),
            max_ok_dt,
            seen_dts: RefCell::new(Vec::new()),
        };
        (
            SimulationStepFn::new(cfg.clone(), static_params, provider, Box::new(solver)),
            state,
            post,
        )
    }

    fn fixed_dt_config(dt: f64) -> SimulationConfig {
        let mut cfg = SimulationConfig::default();
        cfg.time_step_calculator.calculator_type = crate::config::TimeStepCalculatorType::Fixed;
        cfg.numerics.fixed_dt = dt;
        cfg
    }

    #[test]
    fn test_accepted_step_advances_time() {
        let cfg = fixed_dt_config(0.01);
        let (f, state, post) = step_fn(&cfg, 1.0);
        match f.step(&state, &post).expect("step") {
            StepOutcome::Accepted { state: next, post_processed } => {
                assert!((next.t - 0.01).abs() < 1e-15);
                assert_eq!(next.dt, 0.01);
                assert_eq!(post_processed.t, next.t);
            }
            other => panic!("expected acceptance, got {other:?}"),
        }
    }

    #[test]
    fn test_rejected_attempt_shrinks_dt() {
        let cfg = fixed_dt_config(0.09);
        let (f, state, post) = step_fn(&cfg, 0.02);
        match f.step(&state, &post).expect("step") {
            StepOutcome::Accepted { state: next, .. } => {
                // 0.09 -> 0.03 -> 0.01
                assert!((next.dt - 0.01).abs() < 1e-15, "dt={}", next.dt);
                assert!((next.t - 0.01).abs() < 1e-15);
            }
            other => panic!("expected acceptance, got {other:?}"),
        }
    }

    #[test]
    fn test_adaptive_off_fails_without_retry() {
        let mut cfg = fixed_dt_config(0.09);
        cfg.numerics.adaptive_dt = false;
        let (f, state, post) = step_fn(&cfg, 0.02);
        match f.step(&state, &post).expect("step") {
            StepOutcome::Failed { error, last_dt, .. } => {
                assert_eq!(error, SimError::StepFailure);
                assert_eq!(last_dt, 0.09);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_min_dt_floor_is_fatal() {
        let mut cfg = fixed_dt_config(0.09);
        cfg.numerics.min_dt = 0.05;
        let (f, state, post) = step_fn(&cfg, 0.01);
        match f.step(&state, &post).expect("step") {
            StepOutcome::Failed { error, last_dt, .. } => {
                assert_eq!(error, SimError::ReachedMinDt);
                assert_eq!(last_dt, 0.05);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_check_for_errors_flags_nan() {
        let cfg = SimulationConfig::default();
        let (_, mut state, post) = step_fn(&cfg, 1.0);
        assert_eq!(check_for_errors(&state, &post), SimError::NoError);
        state.core_profiles.t_e.value[3] = f64::NAN;
        assert_eq!(check_for_errors(&state, &post), SimError::NanDetected);
    }
}
