// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Simulation Entry Point
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Configuration in, state history out.

use crate::config::SimulationConfig;
use crate::geometry_provider::GeometryProvider;
use crate::initial_state::initial_state;
use crate::kernel_cache::KernelCache;
use crate::post_processing::PostProcessedOutputs;
use crate::run_loop::{run_loop, RunLoopOptions};
use crate::runtime_params::build_static_params;
use crate::solver::build_solver;
use crate::step_function::SimulationStepFn;
use fusion_types::error::FusionResult;
use fusion_types::state::{SimError, SimulationState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutputs {
    pub state_history: Vec<SimulationState>,
    pub post_processed_history: Vec<PostProcessedOutputs>,
    pub sim_error: SimError,
}

impl SimulationOutputs {
    pub fn times(&self) -> Vec<f64> {
        self.state_history.iter().map(|s| s.t).collect()
    }

    /// True when the run ended without a recorded error.
    pub fn is_complete(&self) -> bool {
        self.sim_error == SimError::NoError
    }

    pub fn final_state(&self) -> Option<&SimulationState> {
        self.state_history.last()
    }
}

/// Run with a fresh kernel cache and default loop options.
pub fn run_simulation(config: &SimulationConfig) -> FusionResult<SimulationOutputs> {
    let mut cache = KernelCache::new();
    run_simulation_with_cache(config, &mut cache, RunLoopOptions::default())
}

/// Run reusing `cache`, so repeated runs with the same static slice share
/// one solver kernel.
pub fn run_simulation_with_cache(
    config: &SimulationConfig,
    cache: &mut KernelCache,
    options: RunLoopOptions,
) -> FusionResult<SimulationOutputs> {
    config.validate()?;
    let static_params = build_static_params(config);
    let provider = GeometryProvider::from_config(&config.geometry)?;
    let kernel = cache.get_or_build(&static_params)?;
    let solver = build_solver(kernel);
    let (state, post) = initial_state(config, &static_params, &provider)?;
    let step_fn = SimulationStepFn::new(config.clone(), static_params, provider, solver);
    let out = run_loop(&step_fn, state, post, options);
    Ok(SimulationOutputs {
        state_history: out.state_history,
        post_processed_history: out.post_processed_history,
        sim_error: out.sim_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeStepCalculatorType;
    use fusion_types::error::FusionError;

    #[test]
    fn test_invalid_config_is_rejected_before_running() {
        let mut cfg = SimulationConfig::default();
        cfg.numerics.t_final = -1.0;
        assert!(matches!(run_simulation(&cfg), Err(FusionError::ConfigError(_))));
    }

    #[test]
    fn test_outputs_accessors() {
        let mut cfg = SimulationConfig::default();
        cfg.time_step_calculator.calculator_type = TimeStepCalculatorType::Fixed;
        cfg.numerics.fixed_dt = 0.25;
        cfg.numerics.t_final = 0.5;
        let out = run_simulation(&cfg).expect("run");
        assert!(out.is_complete());
        assert_eq!(out.times(), vec![0.0, 0.25, 0.5]);
        assert_eq!(out.final_state().map(|s| s.t), Some(0.5));
    }
}
