// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Transport Models
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Turbulent transport coefficients on the face grid.
//!
//! A model only produces raw chi_i, chi_e, D_e and V_e. The shared
//! [`TransportModel::compute`] clamps them to the configured bounds and, when
//! a pedestal is active, imposes the H-mode transport barrier above the
//! pedestal top.

use crate::pedestal::PedestalOutput;
use crate::runtime_params::{DynamicRuntimeParamsSlice, DynamicTransportModel, TransportModelKind};
use fusion_types::constants::EPS;
use fusion_types::error::{FusionError, FusionResult};
use fusion_types::geometry::Geometry;
use fusion_types::state::{CellVariable, CoreProfiles, CoreTransport};
use ndarray::Array1;
use std::fmt::Debug;

pub trait TransportModel: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Unclamped coefficients from the model itself.
    fn call_implementation(
        &self,
        dynamic: &DynamicRuntimeParamsSlice,
        geo: &Geometry,
        profiles: &CoreProfiles,
    ) -> FusionResult<CoreTransport>;

    fn compute(
        &self,
        dynamic: &DynamicRuntimeParamsSlice,
        geo: &Geometry,
        profiles: &CoreProfiles,
        pedestal: Option<&PedestalOutput>,
    ) -> FusionResult<CoreTransport> {
        let raw = self.call_implementation(dynamic, geo, profiles)?;
        let out = postprocess(raw, dynamic, geo, pedestal);
        let finite = [&out.chi_face_ion, &out.chi_face_el, &out.d_face_el, &out.v_face_el]
            .iter()
            .all(|a| a.iter().all(|v| v.is_finite()));
        if !finite {
            return Err(FusionError::PhysicsViolation(format!(
                "{} transport produced non-finite coefficients",
                self.name()
            )));
        }
        Ok(out)
    }
}

fn postprocess(
    mut raw: CoreTransport,
    dynamic: &DynamicRuntimeParamsSlice,
    geo: &Geometry,
    pedestal: Option<&PedestalOutput>,
) -> CoreTransport {
    let b = &dynamic.transport;
    raw.chi_face_ion.mapv_inplace(|v| v.clamp(b.chi_min, b.chi_max));
    raw.chi_face_el.mapv_inplace(|v| v.clamp(b.chi_min, b.chi_max));
    raw.d_face_el.mapv_inplace(|v| v.clamp(b.d_e_min, b.d_e_max));
    raw.v_face_el.mapv_inplace(|v| v.clamp(b.v_e_min, b.v_e_max));

    // H-mode barrier: minimal transport outside the pedestal top.
    if let Some(ped) = pedestal {
        for (j, rho) in geo.rho_face_norm().iter().enumerate() {
            if *rho > ped.rho_norm_ped_top {
                raw.chi_face_ion[j] = b.chi_min;
                raw.chi_face_el[j] = b.chi_min;
                raw.d_face_el[j] = b.d_e_min;
                raw.v_face_el[j] = 0.0;
            }
        }
    }
    raw
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantTransportModel;

impl TransportModel for ConstantTransportModel {
    fn name(&self) -> &'static str {
        "constant"
    }

    fn call_implementation(
        &self,
        dynamic: &DynamicRuntimeParamsSlice,
        _geo: &Geometry,
        profiles: &CoreProfiles,
    ) -> FusionResult<CoreTransport> {
        let DynamicTransportModel::Constant {
            chi_i,
            chi_e,
            d_e,
            v_e,
        } = dynamic.transport.model
        else {
            return Err(mismatch(self.name(), &dynamic.transport.model));
        };
        let nf = profiles.nx() + 1;
        Ok(CoreTransport {
            chi_face_ion: Array1::from_elem(nf, chi_i),
            chi_face_el: Array1::from_elem(nf, chi_e),
            d_face_el: Array1::from_elem(nf, d_e),
            v_face_el: Array1::from_elem(nf, v_e),
        })
    }
}

/// Stiff critical-gradient model on R/L_T.
#[derive(Debug, Clone, Copy, Default)]
pub struct CriticalGradientTransportModel;

/// Normalized inverse temperature gradient length R0/L_T on faces.
pub fn r_over_l_t(temperature: &CellVariable, geo: &Geometry) -> Array1<f64> {
    let grad = temperature.face_grad();
    let faces = temperature.face_values();
    Array1::from_iter(
        grad.iter()
            .zip(faces.iter())
            .map(|(g, t)| -geo.r_major * (g / geo.a_minor) / t.max(EPS)),
    )
}

impl TransportModel for CriticalGradientTransportModel {
    fn name(&self) -> &'static str {
        "critical_gradient"
    }

    fn call_implementation(
        &self,
        dynamic: &DynamicRuntimeParamsSlice,
        geo: &Geometry,
        profiles: &CoreProfiles,
    ) -> FusionResult<CoreTransport> {
        let DynamicTransportModel::CriticalGradient {
            chi_base,
            chi_stiff,
            r_ln_t_crit,
            d_e_over_chi,
            v_e,
        } = dynamic.transport.model
        else {
            return Err(mismatch(self.name(), &dynamic.transport.model));
        };
        let chi = |r_ln_t: f64| chi_base + chi_stiff * (r_ln_t - r_ln_t_crit).max(0.0);
        let chi_face_ion = r_over_l_t(&profiles.t_i, geo).mapv(chi);
        let chi_face_el = r_over_l_t(&profiles.t_e, geo).mapv(chi);
        let d_face_el = chi_face_el.mapv(|c| d_e_over_chi * c);
        let v_face_el = Array1::from_elem(chi_face_el.len(), v_e);
        Ok(CoreTransport {
            chi_face_ion,
            chi_face_el,
            d_face_el,
            v_face_el,
        })
    }
}

fn mismatch(name: &str, params: &DynamicTransportModel) -> FusionError {
    FusionError::ConfigError(format!("{name} transport received parameters {params:?}"))
}

pub fn build_transport_model(kind: TransportModelKind) -> Box<dyn TransportModel> {
    match kind {
        TransportModelKind::Constant => Box::new(ConstantTransportModel),
        TransportModelKind::CriticalGradient => Box::new(CriticalGradientTransportModel),
    }
}
