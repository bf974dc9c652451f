// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — End-to-End Scenarios
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Whole-run scenarios through the public entry points.

use fusion_core::config::{
    CriticalGradientConfig, EiExchangeConfig, GenericHeatConfig, GeometrySnapshotConfig,
    RestartConfig, SimulationConfig, SolverType, TimeStepCalculatorType, TransportModelConfig,
};
use fusion_core::geometry_provider::{consistent_params_and_geometry, GeometryProvider};
use fusion_core::initial_state::{initial_state, RestartSnapshot};
use fusion_core::interpolated_param::{InterpolatedVar1d, InterpolationMode};
use fusion_core::kernel_cache::KernelCache;
use fusion_core::run_loop::{run_loop, RunLoopOptions, RunOutput};
use fusion_core::runtime_params::{build_dynamic_params, build_static_params};
use fusion_core::simulation::{run_simulation, run_simulation_with_cache};
use fusion_core::solver::kernel::SolverKernel;
use fusion_core::solver::{LinearThetaMethod, Solver, SolverInput, SolverOutput};
use fusion_core::step_function::SimulationStepFn;
use fusion_types::error::{FusionError, FusionResult};
use fusion_types::state::{RightFaceConstraint, SimError, SolverErrorState};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

fn fixed_dt_config(dt: f64, t_final: f64) -> SimulationConfig {
    let mut cfg = SimulationConfig::default();
    cfg.time_step_calculator.calculator_type = TimeStepCalculatorType::Fixed;
    cfg.numerics.fixed_dt = dt;
    cfg.numerics.t_final = t_final;
    cfg
}

/// Linear solver wrapper that reports non-convergence on chosen attempts and
/// records every (t, dt) it is asked to solve.
#[derive(Debug)]
struct ScriptedSolver {
    inner: LinearThetaMethod,
    calls: Cell<usize>,
    fail_on_call: Option<usize>,
    max_ok_dt: f64,
    attempts: Rc<RefCell<Vec<(f64, f64)>>>,
}

impl Solver for ScriptedSolver {
    fn step(&self, input: &SolverInput<'_>) -> FusionResult<SolverOutput> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        self.attempts.borrow_mut().push((input.t, input.dt));
        let mut out = self.inner.step(input)?;
        if Some(call) == self.fail_on_call || input.dt > self.max_ok_dt {
            out.solver_numeric_outputs.solver_error_state = SolverErrorState::NotConverged;
        }
        Ok(out)
    }
}

fn run_scripted(
    cfg: &SimulationConfig,
    fail_on_call: Option<usize>,
    max_ok_dt: f64,
) -> (RunOutput, Rc<RefCell<Vec<(f64, f64)>>>) {
    let static_params = build_static_params(cfg);
    let provider = GeometryProvider::from_config(&cfg.geometry).expect("geometry");
    let (state, post) = initial_state(cfg, &static_params, &provider).expect("initial state");
    let kernel = Arc::new(SolverKernel::build(&static_params).expect("kernel"));
    let attempts = Rc::new(RefCell::new(Vec::new()));
    let solver = ScriptedSolver {
        inner: LinearThetaMethod::new(kernel),
        calls: Cell::new(0),
        fail_on_call,
        max_ok_dt,
        attempts: Rc::clone(&attempts),
    };
    let step_fn = SimulationStepFn::new(cfg.clone(), static_params, provider, Box::new(solver));
    let out = run_loop(&step_fn, state, post, RunLoopOptions::default());
    (out, attempts)
}

// ── Scenario 1: heat-only, zero sources ──────────────────────────────

#[test]
fn heat_only_linear_run_completes_with_one_solve_per_step() {
    let mut cfg = SimulationConfig::default();
    cfg.numerics.t_final = 1.0;
    let out = run_simulation(&cfg).expect("run");

    assert_eq!(out.sim_error, SimError::NoError);
    assert!(out.is_complete());
    assert!(out.state_history.len() > 1);
    let times = out.times();
    for pair in times.windows(2) {
        assert!(pair[1] > pair[0], "times not increasing: {pair:?}");
    }
    assert!((times[times.len() - 1] - 1.0).abs() < 0.1 + 1e-9);
    for state in &out.state_history[1..] {
        let n = state.solver_numeric_outputs;
        assert_eq!(n.solver_error_state, SolverErrorState::Converged);
        assert_eq!(n.inner_solver_iterations, 1);
        assert!(state.core_profiles.t_e.value.iter().all(|v| *v > 0.0));
    }
    assert_eq!(out.post_processed_history.len(), out.state_history.len());
}

// ── Scenario 2: time-varying boundary temperature ────────────────────

#[test]
fn boundary_temperature_ramp_hits_anchors_exactly() {
    let mut cfg = SimulationConfig::default();
    let ramp = InterpolatedVar1d::scalar(vec![0.0, 1.5], vec![2.0, 200.0], InterpolationMode::PiecewiseLinear)
        .expect("valid ramp");
    cfg.profile_conditions.t_e_right_bc = Some(ramp);

    let at_start = build_dynamic_params(&cfg, 0.0).expect("slice at 0");
    let at_end = build_dynamic_params(&cfg, 1.5).expect("slice at 1.5");
    assert_eq!(at_start.profile_conditions.t_e_right_bc, 2.0);
    assert_eq!(at_end.profile_conditions.t_e_right_bc, 200.0);

    let provider = GeometryProvider::from_config(&cfg.geometry).expect("geometry");
    let (mid, _) = consistent_params_and_geometry(0.75, &cfg, &provider).expect("slice at 0.75");
    assert!((mid.profile_conditions.t_e_right_bc - 101.0).abs() < 1e-12);
}

#[test]
fn boundary_ramp_from_json_config() {
    let json = r#"{
        "profile_conditions": {
            "t_e_right_bc": { "times": [0.0, 1.5], "values": [2.0, 200.0] }
        },
        "numerics": { "t_final": 0.3 },
        "time_step_calculator": { "calculator_type": "fixed" }
    }"#;
    let cfg = SimulationConfig::from_json_str(json).expect("valid config");
    let out = run_simulation(&cfg).expect("run");
    assert!(out.is_complete());
    let last = out.final_state().expect("non-empty");
    let expected = 2.0 + (200.0 - 2.0) * last.t / 1.5;
    match last.core_profiles.t_e.right_face {
        RightFaceConstraint::Value(v) => assert!((v - expected).abs() < 1e-9, "{v} vs {expected}"),
        other => panic!("expected a value constraint, got {other:?}"),
    }
}

// ── Scenario 3: impossible tolerance, no adaptive stepping ───────────

#[test]
fn impossible_tolerance_without_adaptive_dt_is_step_failure() {
    let mut cfg = fixed_dt_config(0.05, 0.5);
    cfg.solver.solver_type = SolverType::NewtonRaphson;
    cfg.solver.residual_tol = 1e-300;
    cfg.solver.residual_coarse_tol = 1e-300;
    cfg.solver.n_max_iterations = 1;
    cfg.numerics.adaptive_dt = false;

    let out = run_simulation(&cfg).expect("run");
    assert_eq!(out.sim_error, SimError::StepFailure);
    // only the initial condition; no step converged
    assert_eq!(out.state_history.len(), 1);
    assert_eq!(out.post_processed_history.len(), 1);
}

// ── Failure truncation and dt reduction ──────────────────────────────

#[test]
fn failure_at_call_k_truncates_history_to_accepted_prefix() {
    let mut cfg = fixed_dt_config(0.1, 1.0);
    cfg.numerics.adaptive_dt = false;
    let (full, _) = run_scripted(&cfg, None, f64::INFINITY);
    assert_eq!(full.sim_error, SimError::NoError);
    assert_eq!(full.state_history.len(), 11);

    let k = 4;
    let (cut, attempts) = run_scripted(&cfg, Some(k), f64::INFINITY);
    assert_eq!(cut.sim_error, SimError::StepFailure);
    assert_eq!(cut.state_history.len(), k + 1);
    assert_eq!(attempts.borrow().len(), k + 1);
    assert_eq!(cut.state_history[..], full.state_history[..k + 1]);
    assert_eq!(cut.post_processed_history[..], full.post_processed_history[..k + 1]);
}

#[test]
fn rejected_attempts_shrink_dt_without_advancing_time() {
    let cfg = fixed_dt_config(0.09, 0.02);
    let (out, attempts) = run_scripted(&cfg, None, 0.02);
    let attempts = attempts.borrow();
    // 0.09 -> 0.03 -> 0.01 on the first step, all from t = 0
    assert_eq!(attempts[0], (0.0, 0.09));
    assert!((attempts[1].1 - 0.03).abs() < 1e-15);
    assert!((attempts[2].1 - 0.01).abs() < 1e-15);
    assert!(attempts[..3].iter().all(|(t, _)| *t == 0.0));
    assert_eq!(out.sim_error, SimError::NoError);
    assert!((out.state_history[1].t - 0.01).abs() < 1e-15);
}

#[test]
fn exhausted_dt_floor_keeps_last_accepted_state() {
    let mut cfg = fixed_dt_config(0.1, 1.0);
    cfg.numerics.min_dt = 0.01;
    // every attempt fails: 0.1 -> 0.033 -> 0.011 -> 0.01 (floor) -> fatal
    let (out, _) = run_scripted(&cfg, None, 0.0);
    assert_eq!(out.sim_error, SimError::ReachedMinDt);
    assert_eq!(out.state_history.len(), 1);
    assert_eq!(out.state_history[0].t, 0.0);
}

#[test]
fn error_inside_a_step_keeps_accepted_history() {
    // Z_eff overtakes Z_imp = 4 between t = 0.5 and t = 0.6; the slice at
    // t + dt of the sixth step has no quasineutral dilution.
    let mut bad = fixed_dt_config(0.1, 1.0);
    bad.plasma_composition.z_impurity = InterpolatedVar1d::constant(4.0);
    bad.plasma_composition.z_eff = InterpolatedVar1d::scalar(
        vec![0.0, 0.5, 0.6],
        vec![1.0, 2.0, 6.0],
        InterpolationMode::PiecewiseLinear,
    )
    .expect("valid ramp");
    assert!(matches!(run_simulation(&bad), Err(FusionError::ConfigError(_))));

    let (cut, _) = run_scripted(&bad, None, f64::INFINITY);
    assert_eq!(cut.sim_error, SimError::StepError);
    assert_eq!(cut.state_history.len(), 6);
    assert_eq!(cut.post_processed_history.len(), 6);
    assert!((cut.state_history[5].t - 0.5).abs() < 1e-9);

    // identical schedules up to t = 0.5, so identical states
    let mut good = bad.clone();
    good.plasma_composition.z_eff = InterpolatedVar1d::scalar(
        vec![0.0, 0.5, 0.6],
        vec![1.0, 2.0, 3.0],
        InterpolationMode::PiecewiseLinear,
    )
    .expect("valid ramp");
    let (full, _) = run_scripted(&good, None, f64::INFINITY);
    assert_eq!(full.sim_error, SimError::NoError);
    assert_eq!(cut.state_history[..], full.state_history[..6]);
}

// ── Kernel cache ─────────────────────────────────────────────────────

#[test]
fn kernel_cache_reuses_kernel_across_value_changes() {
    let mut cfg = fixed_dt_config(0.1, 0.2);
    let mut cache = KernelCache::new();
    run_simulation_with_cache(&cfg, &mut cache, RunLoopOptions::default()).expect("first run");
    assert_eq!(cache.build_count(), 1);

    cfg.numerics.fixed_dt = 0.05;
    cfg.profile_conditions.ip = InterpolatedVar1d::constant(12.0);
    run_simulation_with_cache(&cfg, &mut cache, RunLoopOptions::default()).expect("second run");
    assert_eq!(cache.build_count(), 1);

    cfg.solver.theta_implicit = 0.5;
    run_simulation_with_cache(&cfg, &mut cache, RunLoopOptions::default()).expect("third run");
    assert_eq!(cache.build_count(), 2);
}

// ── Restart ──────────────────────────────────────────────────────────

#[test]
fn restart_continues_the_uninterrupted_run() {
    let cfg = fixed_dt_config(0.1, 1.0);
    let full = run_simulation(&cfg).expect("full run");
    assert!(full.is_complete());

    let split = 5;
    let path = std::env::temp_dir().join("fusion_core_scenario_restart.json");
    RestartSnapshot {
        state: full.state_history[split].clone(),
        post_processed: full.post_processed_history[split].clone(),
    }
    .save(&path)
    .expect("save snapshot");

    let mut restarted = cfg.clone();
    restarted.numerics.t_initial = full.state_history[split].t;
    restarted.restart = Some(RestartConfig {
        do_restart: true,
        filename: path.to_string_lossy().into_owned(),
    });
    let tail = run_simulation(&restarted).expect("restarted run");
    let _ = std::fs::remove_file(&path);

    assert!(tail.is_complete());
    assert_eq!(tail.state_history.len(), full.state_history.len() - split);
    for (a, b) in tail.state_history.iter().zip(&full.state_history[split..]) {
        assert!((a.t - b.t).abs() < 1e-12);
        for (x, y) in a.core_profiles.t_i.value.iter().zip(b.core_profiles.t_i.value.iter()) {
            assert!((x - y).abs() <= 1e-9 * y.abs(), "{x} vs {y}");
        }
    }
}

// ── Newton-Raphson ───────────────────────────────────────────────────

#[test]
fn newton_run_on_coupled_stiff_transport() {
    let mut cfg = fixed_dt_config(0.02, 0.1);
    cfg.solver.solver_type = SolverType::NewtonRaphson;
    cfg.transport.model = TransportModelConfig::CriticalGradient(CriticalGradientConfig::default());
    cfg.sources.generic_heat = Some(GenericHeatConfig::default());
    cfg.sources.ei_exchange = Some(EiExchangeConfig::default());

    let out = run_simulation(&cfg).expect("run");
    assert!(out.is_complete(), "{:?}", out.sim_error);
    for state in &out.state_history[1..] {
        assert!(state.solver_numeric_outputs.solver_error_state.is_acceptable());
        assert!(state.core_profiles.t_i.value.iter().all(|v| *v > 0.0));
    }
}

// ── Full physics ─────────────────────────────────────────────────────

#[test]
fn four_equation_run_holds_pedestal_top() {
    for solver_type in [SolverType::Linear, SolverType::NewtonRaphson] {
        let mut cfg = fixed_dt_config(0.02, 0.1);
        cfg.solver.solver_type = solver_type;
        cfg.numerics.evolve_current = true;
        cfg.numerics.evolve_density = true;
        cfg.pedestal.set_pedestal = true;
        cfg.transport.model = TransportModelConfig::CriticalGradient(CriticalGradientConfig::default());
        cfg.sources.generic_heat = Some(GenericHeatConfig::default());
        cfg.sources.ei_exchange = Some(EiExchangeConfig::default());

        let out = run_simulation(&cfg).expect("run");
        assert!(out.is_complete(), "{solver_type:?}: {:?}", out.sim_error);
        assert_eq!(out.state_history.len(), 6);

        let initial = &out.state_history[0];
        let rho = initial.geometry.rho_norm();
        let top = (0..rho.len())
            .min_by(|&a, &b| (rho[a] - 0.91).abs().total_cmp(&(rho[b] - 0.91).abs()))
            .expect("non-empty mesh");

        for state in &out.state_history[1..] {
            let p = &state.core_profiles;
            assert!(state.solver_numeric_outputs.solver_error_state.is_acceptable());
            assert!((p.t_i.value[top] - 5.0).abs() < 5e-2, "{solver_type:?} T_i top {}", p.t_i.value[top]);
            assert!((p.t_e.value[top] - 5.0).abs() < 5e-2, "{solver_type:?} T_e top {}", p.t_e.value[top]);
            assert!((p.n_e.value[top] - 0.7).abs() < 7e-3, "{solver_type:?} n_e top {}", p.n_e.value[top]);
            assert!(p.n_e.value.iter().all(|v| *v > 0.0));
        }
        let last = out.final_state().expect("non-empty");
        assert_ne!(last.core_profiles.psi.value, initial.core_profiles.psi.value);
        assert!((last.core_profiles.ip - 15.0).abs() < 1e-6);
    }
}

#[test]
fn time_dependent_geometry_sets_plasma_current() {
    let snapshot = |time: f64, ip: f64| GeometrySnapshotConfig {
        time,
        r_major: None,
        a_minor: None,
        b_0: None,
        elongation_lcfs: None,
        ip_geometry: Some(ip),
    };
    let mut cfg = fixed_dt_config(0.1, 1.0);
    cfg.numerics.evolve_current = true;
    cfg.geometry.ip_from_parameters = false;
    cfg.geometry.time_series = Some(vec![snapshot(0.0, 15.0), snapshot(1.0, 13.0)]);

    let out = run_simulation(&cfg).expect("run");
    assert!(out.is_complete(), "{:?}", out.sim_error);
    assert_eq!(out.state_history.len(), 11);
    for state in &out.state_history {
        let expected = 15.0 - 2.0 * state.t;
        let face = &state.geometry.ip_profile_face;
        assert!((face[face.len() - 1] - expected).abs() < 1e-9, "t={}", state.t);
        assert!(
            (state.core_profiles.ip - expected).abs() < 1e-6,
            "t={}: Ip {} vs geometry {expected}",
            state.t,
            state.core_profiles.ip
        );
    }
    let last = out.final_state().expect("non-empty");
    assert!((last.core_profiles.ip - 13.0).abs() < 1e-6);
}
