// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Pedestal Model
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Pedestal height and location.
//!
//! The solver imposes the pedestal as an internal boundary condition: a
//! large adaptive source pins T_i, T_e and n_e at the pedestal-top cell.

use crate::profiles::greenwald_density;
use crate::runtime_params::{DynamicPedestalModel, DynamicRuntimeParamsSlice, PedestalModelKind};
use fusion_types::error::{FusionError, FusionResult};
use fusion_types::geometry::Geometry;

/// Bounds on the scaled pedestal width, in rho_norm.
const MIN_PED_WIDTH: f64 = 0.03;
const MAX_PED_WIDTH: f64 = 0.12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PedestalOutput {
    pub rho_norm_ped_top: f64,
    pub t_i_ped: f64,
    pub t_e_ped: f64,
    /// Absolute, 1e20 m^-3.
    pub n_e_ped: f64,
}

impl PedestalOutput {
    /// Index of the cell whose centre is closest to the pedestal top.
    pub fn top_cell(&self, geo: &Geometry) -> usize {
        let rho = geo.rho_norm();
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (i, r) in rho.iter().enumerate() {
            let d = (r - self.rho_norm_ped_top).abs();
            if d < best_dist {
                best = i;
                best_dist = d;
            }
        }
        best
    }
}

/// EPED-inspired width scaling: Delta_ped ~ sqrt(beta_p,ped) * (rho_s / R)
pub fn pedestal_width(beta_p_ped: f64, rho_s: f64, r_major: f64) -> f64 {
    let beta = beta_p_ped.max(0.0);
    let rho_s = rho_s.abs().max(1e-7);
    let r_major = r_major.abs().max(1e-3);
    (beta.sqrt() * (rho_s / r_major)).clamp(MIN_PED_WIDTH, MAX_PED_WIDTH)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PedestalModel {
    SetTpedNped,
    EpedScaling,
}

impl PedestalModel {
    pub fn from_kind(kind: PedestalModelKind) -> Self {
        match kind {
            PedestalModelKind::SetTpedNped => PedestalModel::SetTpedNped,
            PedestalModelKind::EpedScaling => PedestalModel::EpedScaling,
        }
    }

    /// Pedestal at the time of `dynamic`, or `None` when it is switched off.
    pub fn compute(
        &self,
        dynamic: &DynamicRuntimeParamsSlice,
        geo: &Geometry,
    ) -> FusionResult<Option<PedestalOutput>> {
        let ped = &dynamic.pedestal;
        if !ped.set_pedestal {
            return Ok(None);
        }
        let rho_norm_ped_top = match (self, &ped.model) {
            (PedestalModel::SetTpedNped, DynamicPedestalModel::SetTpedNped { rho_norm_ped_top }) => {
                *rho_norm_ped_top
            }
            (PedestalModel::EpedScaling, DynamicPedestalModel::EpedScaling { beta_p_ped, rho_s }) => {
                1.0 - pedestal_width(*beta_p_ped, *rho_s, geo.r_major)
            }
            (model, params) => {
                return Err(FusionError::ConfigError(format!(
                    "pedestal model {model:?} received parameters {params:?}"
                )));
            }
        };
        if !(rho_norm_ped_top > 0.0 && rho_norm_ped_top < 1.0) {
            return Err(FusionError::PhysicsViolation(format!(
                "pedestal top must lie inside (0, 1), got {rho_norm_ped_top}"
            )));
        }
        let n_e_ped = if ped.n_e_ped_is_fgw {
            ped.n_e_ped * greenwald_density(dynamic.profile_conditions.ip, geo.a_minor)
        } else {
            ped.n_e_ped
        };
        Ok(Some(PedestalOutput {
            rho_norm_ped_top,
            t_i_ped: ped.t_i_ped,
            t_e_ped: ped.t_e_ped,
            n_e_ped,
        }))
    }
}
