// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Time-Step Calculator
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Proposed dt for the next step and the end-of-run test.

use crate::config::TimeStepCalculatorType;
use crate::runtime_params::DynamicRuntimeParamsSlice;
use fusion_types::state::SimulationState;

/// Relative slack on t_final so accumulated rounding does not force an
/// extra vanishing step.
const T_FINAL_RTOL: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeStepCalculator {
    /// dt = fixed_dt.
    Fixed,
    /// Explicit diffusion limit 0.75 (dx a)^2 / chi_max times a prefactor,
    /// capped at max_dt. Not raised to min_dt: the floor only bounds the
    /// retries after a failed solve.
    Chi,
}

impl TimeStepCalculator {
    pub fn from_type(kind: TimeStepCalculatorType) -> Self {
        match kind {
            TimeStepCalculatorType::Fixed => TimeStepCalculator::Fixed,
            TimeStepCalculatorType::Chi => TimeStepCalculator::Chi,
        }
    }

    pub fn next_dt(&self, t: f64, state: &SimulationState, dynamic: &DynamicRuntimeParamsSlice) -> f64 {
        let n = &dynamic.numerics;
        let dt = match self {
            TimeStepCalculator::Fixed => n.fixed_dt,
            TimeStepCalculator::Chi => {
                let chi_max = state.core_transport.max_diffusivity();
                if chi_max > 0.0 {
                    let dx = state.geometry.drho_norm() * state.geometry.a_minor;
                    let basic = 0.75 * dx * dx / chi_max;
                    (n.chi_timestep_prefactor * basic).min(n.max_dt)
                } else {
                    n.max_dt
                }
            }
        };
        if n.exact_t_final && t + dt > n.t_final {
            (n.t_final - t).max(0.0)
        } else {
            dt
        }
    }

    /// True while `t` is short of `t_final`.
    pub fn not_done(&self, t: f64, t_final: f64) -> bool {
        t_final - t > T_FINAL_RTOL * t_final.abs().max(1.0)
    }
}
