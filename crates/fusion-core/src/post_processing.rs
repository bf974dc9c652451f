// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Post-Processing
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Volume-integrated diagnostics of an accepted state.

use crate::runtime_params::DynamicRuntimeParamsSlice;
use fusion_types::constants::{DENSITY_REF, KEV_TO_J};
use fusion_types::state::SimulationState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PostProcessedOutputs {
    pub t: f64,
    /// Thermal energies (J).
    pub w_thermal_ion: f64,
    pub w_thermal_el: f64,
    pub w_thermal_total: f64,
    /// External heating power (W).
    pub p_external: f64,
    /// Net collisional power into the ions (W).
    pub p_ei_exchange: f64,
    pub t_i_volume_avg: f64,
    pub t_e_volume_avg: f64,
    pub n_e_volume_avg: f64,
    /// d W_thermal / dt (W), zero on the first output.
    pub dw_thermal_dt: f64,
    /// Energy confinement time W / (P_ext - dW/dt) (s); zero when the loss
    /// power is not positive.
    pub tau_e: f64,
    /// Time-integrated external heating energy (J).
    pub e_external_cumulative: f64,
    pub ip: f64,
    pub q_axis: f64,
    pub q_edge: f64,
}

impl PostProcessedOutputs {
    pub fn is_finite(&self) -> bool {
        [
            self.t,
            self.w_thermal_ion,
            self.w_thermal_el,
            self.w_thermal_total,
            self.p_external,
            self.p_ei_exchange,
            self.t_i_volume_avg,
            self.t_e_volume_avg,
            self.n_e_volume_avg,
            self.dw_thermal_dt,
            self.tau_e,
            self.e_external_cumulative,
            self.ip,
            self.q_axis,
            self.q_edge,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Diagnostics of `state`; `previous` supplies the time-integrated terms.
pub fn make_post_processed_outputs(
    state: &SimulationState,
    dynamic: &DynamicRuntimeParamsSlice,
    previous: Option<&PostProcessedOutputs>,
) -> PostProcessedOutputs {
    let geo = &state.geometry;
    let p = &state.core_profiles;
    let s = &state.core_sources;
    // same quadrature as the integrals, so a flat profile averages exactly
    let volume = geo.vpr.sum() * geo.drho_norm();
    let dilution = dynamic.plasma_composition.dilution;
    let energy_scale = 1.5 * DENSITY_REF * KEV_TO_J;

    let w_thermal_ion = geo.volume_integral(&(&p.n_e.value * &p.t_i.value)) * dilution * energy_scale;
    let w_thermal_el = geo.volume_integral(&(&p.n_e.value * &p.t_e.value)) * energy_scale;
    let w_thermal_total = w_thermal_ion + w_thermal_el;
    let p_external = geo.volume_integral(&(&s.q_el + &s.q_ion));
    let p_ei_exchange = geo.volume_integral(&(&s.qei_coef * &(&p.t_e.value - &p.t_i.value)));

    let avg = |v: f64| if volume > 0.0 { v / volume } else { 0.0 };
    let (dw_thermal_dt, e_external_cumulative) = match previous {
        Some(prev) if state.t > prev.t => {
            let dt = state.t - prev.t;
            (
                (w_thermal_total - prev.w_thermal_total) / dt,
                prev.e_external_cumulative + 0.5 * (prev.p_external + p_external) * dt,
            )
        }
        Some(prev) => (0.0, prev.e_external_cumulative),
        None => (0.0, 0.0),
    };
    let p_loss = p_external - dw_thermal_dt;
    let tau_e = if p_loss > 0.0 { w_thermal_total / p_loss } else { 0.0 };
    let last_face = p.q_face.len() - 1;

    PostProcessedOutputs {
        t: state.t,
        w_thermal_ion,
        w_thermal_el,
        w_thermal_total,
        p_external,
        p_ei_exchange,
        t_i_volume_avg: avg(geo.volume_integral(&p.t_i.value)),
        t_e_volume_avg: avg(geo.volume_integral(&p.t_e.value)),
        n_e_volume_avg: avg(geo.volume_integral(&p.n_e.value)),
        dw_thermal_dt,
        tau_e,
        e_external_cumulative,
        ip: p.ip,
        q_axis: p.q_face[0],
        q_edge: p.q_face[last_face],
    }
}
