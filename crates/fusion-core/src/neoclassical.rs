//! Parallel electrical conductivity.

use crate::config::ConductivityConfig;
use crate::runtime_params::DynamicRuntimeParamsSlice;
use fusion_types::constants::COULOMB_LOG;
use fusion_types::error::{FusionError, FusionResult};
use fusion_types::state::CoreProfiles;
use ndarray::Array1;

/// Spitzer prefactor for T_e in eV, sigma in S/m.
const SPITZER_COEFF: f64 = 1.9012e4;

/// Temperature floor (keV) inside the conductivity.
const T_E_FLOOR: f64 = 0.01;

/// Z-dependent Spitzer correction N(Z) = 0.58 + 0.74 / (0.76 + Z).
fn spitzer_z_factor(z_eff: f64) -> f64 {
    0.58 + 0.74 / (0.76 + z_eff)
}

/// Conductivity on cells, divided by the resistivity multiplier.
pub fn conductivity(
    dynamic: &DynamicRuntimeParamsSlice,
    profiles: &CoreProfiles,
) -> FusionResult<Array1<f64>> {
    let multiplier = dynamic.numerics.resistivity_multiplier;
    if !(multiplier > 0.0) {
        return Err(FusionError::PhysicsViolation(format!(
            "resistivity multiplier must be > 0, got {multiplier}"
        )));
    }
    let sigma = match dynamic.conductivity {
        ConductivityConfig::Constant { sigma } => Array1::from_elem(profiles.nx(), sigma),
        ConductivityConfig::Spitzer => {
            let z = dynamic.plasma_composition.z_eff;
            let denom = z * spitzer_z_factor(z) * COULOMB_LOG;
            profiles
                .t_e
                .value
                .mapv(|t| SPITZER_COEFF * (t.max(T_E_FLOOR) * 1.0e3).powf(1.5) / denom)
        }
    };
    Ok(sigma / multiplier)
}
