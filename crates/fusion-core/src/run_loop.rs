// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Run Loop
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Drives the step function from t_initial to t_final.
//!
//! The history always starts with the initial state. A failed step ends the
//! run with the history accumulated so far and the failure recorded in
//! `sim_error`. An `Err` raised inside a step is recorded the same way, as
//! `SimError::StepError`, so accepted states are never discarded.

use crate::post_processing::PostProcessedOutputs;
use crate::step_function::{SimulationStepFn, StepOutcome};
use fusion_types::state::{SimError, SimulationState};
use log::{debug, error, info};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunLoopOptions {
    /// Log t, dt and solver iterations of every accepted step.
    pub log_timestep_info: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    pub state_history: Vec<SimulationState>,
    pub post_processed_history: Vec<PostProcessedOutputs>,
    pub sim_error: SimError,
    /// Wall-clock seconds of every step call, failed ones included.
    pub wall_clock_step_times: Vec<f64>,
}

const FIRST_STEP_STD_DEVS: f64 = 2.0;

fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Duration of the first step when it exceeds the mean of all step times,
/// itself included, by more than `FIRST_STEP_STD_DEVS` standard deviations.
fn long_first_step(step_times: &[f64]) -> Option<f64> {
    let &first = step_times.first()?;
    let (mean, std) = mean_and_std(step_times);
    (first > mean + FIRST_STEP_STD_DEVS * std).then_some(first)
}

pub fn run_loop(
    step_fn: &SimulationStepFn,
    initial_state: SimulationState,
    initial_post_processed: PostProcessedOutputs,
    options: RunLoopOptions,
) -> RunOutput {
    let start = Instant::now();
    info!("starting simulation at t={:.6e}", initial_state.t);

    let mut state_history = vec![initial_state];
    let mut post_processed_history = vec![initial_post_processed];
    let mut wall_clock_step_times = Vec::new();
    let mut sim_error = SimError::NoError;

    loop {
        let (Some(state), Some(post)) = (state_history.last(), post_processed_history.last()) else {
            break;
        };
        if !step_fn.not_done(state.t) {
            break;
        }
        let step_start = Instant::now();
        let outcome = step_fn.step(state, post);
        wall_clock_step_times.push(step_start.elapsed().as_secs_f64());

        match outcome {
            Ok(StepOutcome::Accepted {
                state: next,
                post_processed,
            }) => {
                if options.log_timestep_info {
                    let n = next.solver_numeric_outputs;
                    debug!(
                        "t={:.6e} dt={:.3e} outer={} inner={} state={}",
                        next.t,
                        next.dt,
                        n.outer_solver_iterations,
                        n.inner_solver_iterations,
                        n.solver_error_state.code()
                    );
                }
                state_history.push(*next);
                post_processed_history.push(post_processed);
            }
            Ok(StepOutcome::Failed { error, last_dt, .. }) => {
                error!(
                    "simulation stopped at t={:.6e} (last dt={last_dt:.3e}): {error:?}",
                    state.t
                );
                sim_error = error;
                break;
            }
            Err(err) => {
                error!("simulation stopped at t={:.6e}: {err}", state.t);
                sim_error = SimError::StepError;
                break;
            }
        }
    }

    let mut wall_clock = start.elapsed().as_secs_f64();
    if let Some(first) = long_first_step(&wall_clock_step_times) {
        info!(
            "first step took more than {FIRST_STEP_STD_DEVS} std devs longer than the rest \
             ({first:.3}s); left out of the wall clock total"
        );
        wall_clock -= first;
    }
    let simulated = match (state_history.first(), state_history.last()) {
        (Some(a), Some(b)) => b.t - a.t,
        _ => 0.0,
    };
    info!(
        "simulated {simulated:.3}s of physics in {wall_clock:.3}s of wall clock time: {} states, sim_error={}",
        state_history.len(),
        sim_error.code()
    );

    RunOutput {
        state_history,
        post_processed_history,
        sim_error,
        wall_clock_step_times,
    }
}
