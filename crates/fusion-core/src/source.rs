// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Source Terms
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Heat, particle and current sources plus the electron-ion exchange.
//!
//! Model-based shapes are normalized so their volume (or area, for current)
//! integral reproduces the configured total.

use crate::config::SourceMode;
use crate::runtime_params::{DynamicRuntimeParamsSlice, SourceModes};
use fusion_types::constants::{COULOMB_LOG, DENSITY_REF, KEV_TO_J, M_ELECTRON, M_PROTON};
use fusion_types::error::{FusionError, FusionResult};
use fusion_types::geometry::Geometry;
use fusion_types::state::{CoreProfiles, CoreSources};
use ndarray::Array1;

/// Electron temperature floor (keV) in the collision frequency.
const T_E_FLOOR_KEV: f64 = 0.01;

/// Unnormalized Gaussian in rho_norm.
pub fn gaussian_shape(rho: &Array1<f64>, center: f64, width: f64) -> Array1<f64> {
    let w = width.abs().max(1e-6);
    rho.mapv(|r| (-(r - center).powi(2) / (2.0 * w * w)).exp())
}

/// Edge-peaked exponential deposition exp(-(1 - rho) / lambda).
pub fn gas_puff_shape(rho: &Array1<f64>, decay_length: f64) -> Array1<f64> {
    let lambda = decay_length.abs().max(1e-6);
    rho.mapv(|r| (-(1.0 - r) / lambda).exp())
}

/// Scale `shape` so that sum(profile * weight) * dx equals `total`.
fn normalize(shape: Array1<f64>, weight: &Array1<f64>, dx: f64, total: f64) -> FusionResult<Array1<f64>> {
    let integral = shape.iter().zip(weight.iter()).map(|(s, w)| s * w).sum::<f64>() * dx;
    if !(integral > 0.0) || !integral.is_finite() {
        return Err(FusionError::PhysicsViolation(format!(
            "source shape has non-positive integral {integral}"
        )));
    }
    Ok(shape * (total / integral))
}

/// Collisional exchange coefficient (W m^-3 keV^-1) on cells.
pub fn qei_coefficient(
    profiles: &CoreProfiles,
    main_ion_a: f64,
    main_ion_z: f64,
    dilution: f64,
    multiplier: f64,
) -> Array1<f64> {
    let mass_ratio = 2.0 * M_ELECTRON / (main_ion_a * M_PROTON);
    let z2 = main_ion_z * main_ion_z;
    Array1::from_iter(profiles.n_e.value.iter().zip(profiles.t_e.value.iter()).map(|(n, t)| {
        let n_si = n * DENSITY_REF;
        let t_ev = t.max(T_E_FLOOR_KEV) * 1.0e3;
        let nu_ei = 2.91e-12 * n_si * COULOMB_LOG * t_ev.powf(-1.5);
        1.5 * n_si * KEV_TO_J * mass_ratio * nu_ei * dilution * z2 * multiplier
    }))
}

fn prescribed_or_err(values: Option<&Array1<f64>>, name: &str) -> FusionResult<Array1<f64>> {
    values.cloned().ok_or_else(|| {
        FusionError::ConfigError(format!("source {name} is prescribed but has no profile"))
    })
}

/// All configured sources for one static slice.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceModels {
    modes: SourceModes,
}

impl SourceModels {
    pub fn new(modes: SourceModes) -> Self {
        SourceModels { modes }
    }

    pub fn modes(&self) -> &SourceModes {
        &self.modes
    }

    pub fn compute(
        &self,
        dynamic: &DynamicRuntimeParamsSlice,
        geo: &Geometry,
        profiles: &CoreProfiles,
    ) -> FusionResult<CoreSources> {
        let nx = geo.nx();
        let dx = geo.drho_norm();
        let rho = geo.rho_norm();
        let src = &dynamic.sources;
        let mut out = CoreSources::zeros(nx);

        if let Some(heat) = &src.generic_heat {
            let total = match self.modes.generic_heat {
                SourceMode::Zero => None,
                SourceMode::ModelBased => Some(normalize(
                    gaussian_shape(rho, heat.gaussian_location, heat.gaussian_width),
                    &geo.vpr,
                    dx,
                    heat.p_total,
                )?),
                SourceMode::Prescribed => Some(prescribed_or_err(heat.prescribed.as_ref(), "generic_heat")?),
            };
            if let Some(q) = total {
                let f = heat.electron_heat_fraction;
                out.q_el = &out.q_el + &(&q * f);
                out.q_ion = &out.q_ion + &(&q * (1.0 - f));
            }
        }

        let mut particle = |shape: Option<Array1<f64>>| {
            if let Some(s) = shape {
                out.s_particle = &out.s_particle + &(s / DENSITY_REF);
            }
        };
        if let Some(p) = &src.generic_particle {
            particle(match self.modes.generic_particle {
                SourceMode::Zero => None,
                SourceMode::ModelBased => Some(normalize(
                    gaussian_shape(rho, p.deposition_location, p.particle_width),
                    &geo.vpr,
                    dx,
                    p.s_total,
                )?),
                SourceMode::Prescribed => Some(prescribed_or_err(p.prescribed.as_ref(), "generic_particle")?),
            });
        }
        if let Some(p) = &src.gas_puff {
            particle(match self.modes.gas_puff {
                SourceMode::Zero => None,
                SourceMode::ModelBased => Some(normalize(
                    gas_puff_shape(rho, p.puff_decay_length),
                    &geo.vpr,
                    dx,
                    p.s_total,
                )?),
                SourceMode::Prescribed => Some(prescribed_or_err(p.prescribed.as_ref(), "gas_puff")?),
            });
        }

        if let Some(c) = &src.generic_current {
            match self.modes.generic_current {
                SourceMode::Zero => {}
                SourceMode::ModelBased => {
                    out.j_external = normalize(
                        gaussian_shape(rho, c.gaussian_location, c.gaussian_width),
                        &geo.spr,
                        dx,
                        c.i_generic,
                    )?;
                }
                SourceMode::Prescribed => {
                    out.j_external = prescribed_or_err(c.prescribed.as_ref(), "generic_current")?;
                }
            }
        }

        if self.modes.ei_exchange == SourceMode::ModelBased {
            let pc = &dynamic.plasma_composition;
            out.qei_coef = qei_coefficient(
                profiles,
                pc.main_ion_a,
                pc.main_ion_z,
                pc.dilution,
                src.qei_multiplier,
            );
        }

        let lengths_ok = [&out.q_ion, &out.q_el, &out.s_particle, &out.j_external, &out.qei_coef]
            .iter()
            .all(|a| a.len() == nx);
        if !lengths_ok {
            return Err(FusionError::MeshMismatch {
                expected: nx,
                actual: out.q_el.len(),
            });
        }
        Ok(out)
    }
}
