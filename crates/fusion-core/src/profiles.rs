// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Core Profile Helpers
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Construction of core profiles from runtime parameters, boundary-condition
//! updates, and quantities derived from the poloidal flux (q, j, Ip).
//!
//! The current equation uses the large-aspect-ratio form on rho_norm:
//!   j = d(rho psi')/drho / (mu0 R0 a^2 rho),   q = a^2 rho B0 kappa_eff / psi'

use crate::runtime_params::DynamicRuntimeParamsSlice;
use fusion_types::constants::{EPS, MU0_SI};
use fusion_types::error::{FusionError, FusionResult};
use fusion_types::geometry::Geometry;
use fusion_types::state::{CellVariable, CoreProfiles, RightFaceConstraint};
use ndarray::Array1;
use std::f64::consts::PI;

/// Cap applied to q where the flux gradient vanishes.
const Q_MAX: f64 = 1.0e3;

/// Greenwald density limit n_GW = Ip / (pi a^2), in 1e20 m^-3 with Ip in MA.
pub fn greenwald_density(ip_ma: f64, a_minor: f64) -> f64 {
    ip_ma / (PI * a_minor * a_minor)
}

/// Edge gradient of psi (per unit rho_norm) carrying plasma current `ip_ma`.
pub fn psi_edge_gradient(ip_ma: f64, r_major: f64) -> f64 {
    MU0_SI * ip_ma * 1.0e6 * r_major / (2.0 * PI)
}

/// Plasma current (MA) implied by the psi edge gradient.
pub fn ip_from_psi(psi: &CellVariable, r_major: f64) -> f64 {
    let grad = psi.face_grad();
    2.0 * PI * grad[grad.len() - 1] / (MU0_SI * r_major) / 1.0e6
}

/// Safety factor on faces; the axis value copies the first interior face.
pub fn q_face(psi: &CellVariable, geo: &Geometry) -> Array1<f64> {
    let grad = psi.face_grad();
    let rho = geo.rho_face_norm();
    let a2 = geo.a_minor * geo.a_minor;
    let n = grad.len();
    let mut q = Array1::zeros(n);
    for j in 1..n {
        let kappa = geo.elongation_face[j];
        let shaping = 0.5 * (1.0 + kappa * kappa);
        q[j] = if grad[j].abs() < EPS {
            Q_MAX
        } else {
            (a2 * rho[j] * geo.b_0 * shaping / grad[j]).abs().min(Q_MAX)
        };
    }
    q[0] = q[1];
    q
}

/// Toroidal current density on cells (A/m^2).
pub fn j_total(psi: &CellVariable, geo: &Geometry) -> Array1<f64> {
    let grad = psi.face_grad();
    let rho_f = geo.rho_face_norm();
    let rho_c = geo.rho_norm();
    let dx = geo.drho_norm();
    let denom = MU0_SI * geo.r_major * geo.a_minor * geo.a_minor;
    Array1::from_iter((0..psi.nx()).map(|i| {
        let div = (rho_f[i + 1] * grad[i + 1] - rho_f[i] * grad[i]) / dx;
        div / (denom * rho_c[i])
    }))
}

/// Refresh q, j and Ip from the current psi.
pub fn update_derived(profiles: &mut CoreProfiles, geo: &Geometry) {
    profiles.q_face = q_face(&profiles.psi, geo);
    profiles.j_total = j_total(&profiles.psi, geo);
    profiles.ip = ip_from_psi(&profiles.psi, geo.r_major);
}

pub fn build_core_profiles(
    t_i: CellVariable,
    t_e: CellVariable,
    n_e: CellVariable,
    psi: CellVariable,
    geo: &Geometry,
) -> CoreProfiles {
    let nx = t_i.nx();
    let mut profiles = CoreProfiles {
        t_i,
        t_e,
        n_e,
        psi,
        q_face: Array1::zeros(nx + 1),
        j_total: Array1::zeros(nx),
        ip: 0.0,
    };
    update_derived(&mut profiles, geo);
    profiles
}

/// Absolute electron density on cells and at the edge (1e20 m^-3).
///
/// Greenwald fractions are converted with the consistent Ip and the
/// geometry's minor radius; when requested the profile is scaled so its
/// line average equals `nbar`.
pub fn electron_density(
    dynamic: &DynamicRuntimeParamsSlice,
    geo: &Geometry,
) -> FusionResult<(Array1<f64>, f64)> {
    let pc = &dynamic.profile_conditions;
    let n_gw = greenwald_density(pc.ip, geo.a_minor);
    let mut cells = pc.n_e.clone();
    let mut edge = if pc.n_e_right_bc_is_fgw {
        pc.n_e_right_bc * n_gw
    } else {
        pc.n_e_right_bc
    };

    if pc.normalize_n_e_to_nbar {
        let target = if pc.n_e_nbar_is_fgw { pc.nbar * n_gw } else { pc.nbar };
        let var = CellVariable::with_edge_value(cells.clone(), geo.drho_norm(), edge)?;
        let faces = var.face_values();
        let dx = geo.drho_norm();
        let line_avg: f64 = faces
            .windows(2)
            .into_iter()
            .map(|w| 0.5 * (w[0] + w[1]) * dx)
            .sum();
        if !(line_avg > 0.0) {
            return Err(FusionError::PhysicsViolation(format!(
                "density profile has non-positive line average {line_avg}"
            )));
        }
        let scale = target / line_avg;
        cells.mapv_inplace(|v| v * scale);
        if pc.n_e_right_bc_from_profile {
            edge *= scale;
        }
    }

    if cells.iter().any(|v| !(*v > 0.0)) || !(edge > 0.0) {
        return Err(FusionError::PhysicsViolation(
            "electron density must be > 0".to_string(),
        ));
    }
    Ok((cells, edge))
}

/// Initial psi from j ~ (1 - rho^2)^nu carrying the consistent Ip.
///
/// The enclosed current is I(rho) = Ip (1 - (1 - rho^2)^(nu+1)), so the face
/// gradients are known in closed form and psi is their running sum.
pub fn initial_psi(ip_ma: f64, nu: f64, geo: &Geometry) -> FusionResult<CellVariable> {
    let nx = geo.nx();
    let dx = geo.drho_norm();
    let rho_f = geo.rho_face_norm();
    let edge_grad = psi_edge_gradient(ip_ma, geo.r_major);
    let face_grad = |j: usize| -> f64 {
        let r = rho_f[j];
        if r <= 0.0 {
            return 0.0;
        }
        let enclosed = 1.0 - (1.0 - r * r).max(0.0).powf(nu + 1.0);
        edge_grad * enclosed / r
    };
    let mut psi = Array1::zeros(nx);
    for i in 1..nx {
        psi[i] = psi[i - 1] + face_grad(i) * dx;
    }
    CellVariable::new(psi, dx, 0.0, RightFaceConstraint::Gradient(edge_grad))
}

/// Profiles at t + dt before the solve: boundary values from `dynamic`,
/// non-evolved T/n channels replaced by their prescribed profiles.
pub fn profiles_for_next_time(
    current: &CoreProfiles,
    dynamic: &DynamicRuntimeParamsSlice,
    geo: &Geometry,
    evolved: &EvolvedFlags,
) -> FusionResult<CoreProfiles> {
    let pc = &dynamic.profile_conditions;
    let (n_e_cells, n_e_edge) = electron_density(dynamic, geo)?;

    let t_i_value = if evolved.ion_heat { current.t_i.value.clone() } else { pc.t_i.clone() };
    let t_e_value = if evolved.electron_heat { current.t_e.value.clone() } else { pc.t_e.clone() };
    let n_e_value = if evolved.density { current.n_e.value.clone() } else { n_e_cells };

    let t_i = CellVariable::with_edge_value(t_i_value, geo.drho_norm(), pc.t_i_right_bc)?;
    let t_e = CellVariable::with_edge_value(t_e_value, geo.drho_norm(), pc.t_e_right_bc)?;
    let n_e = CellVariable::with_edge_value(n_e_value, geo.drho_norm(), n_e_edge)?;
    let psi = CellVariable::new(
        current.psi.value.clone(),
        geo.drho_norm(),
        0.0,
        RightFaceConstraint::Gradient(psi_edge_gradient(pc.ip, geo.r_major)),
    )?;
    Ok(build_core_profiles(t_i, t_e, n_e, psi, geo))
}

/// Which channels the solver owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvolvedFlags {
    pub ion_heat: bool,
    pub electron_heat: bool,
    pub current: bool,
    pub density: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::geometry_provider::{consistent_params_and_geometry, GeometryProvider};

    fn setup() -> (DynamicRuntimeParamsSlice, Geometry) {
        let cfg = SimulationConfig::default();
        let provider = GeometryProvider::from_config(&cfg.geometry).expect("valid geometry");
        consistent_params_and_geometry(0.0, &cfg, &provider).expect("consistent slice")
    }

    #[test]
    fn test_greenwald_density() {
        let n_gw = greenwald_density(15.0, 2.0);
        assert!((n_gw - 15.0 / (PI * 4.0)).abs() < 1e-12);
    }

    #[test]
    fn test_initial_psi_carries_ip() {
        let (dynamic, geo) = setup();
        let psi = initial_psi(15.0, 3.0, &geo).expect("valid psi");
        let ip = ip_from_psi(&psi, geo.r_major);
        assert!((ip - 15.0).abs() < 1e-9, "ip={ip}");
        // monotone flux, positive current everywhere
        let j = j_total(&psi, &geo);
        assert!(j.iter().all(|v| *v > 0.0), "j={j}");
        assert_eq!(dynamic.profile_conditions.ip, 15.0);
    }

    #[test]
    fn test_current_density_integrates_to_ip() {
        let (_, geo) = setup();
        let psi = initial_psi(15.0, 1.0, &geo).expect("valid psi");
        let j = j_total(&psi, &geo);
        // I = integral of j dA with dA = 2 pi a^2 rho drho in the cylinder
        let a2 = geo.a_minor * geo.a_minor;
        let i_total: f64 = j
            .iter()
            .zip(geo.rho_norm().iter())
            .map(|(j, r)| j * 2.0 * PI * a2 * r * geo.drho_norm())
            .sum();
        assert!((i_total / 1e6 - 15.0).abs() < 1e-6, "I={}", i_total / 1e6);
    }

    #[test]
    fn test_q_increases_outward_for_peaked_current() {
        let (_, geo) = setup();
        let psi = initial_psi(15.0, 2.0, &geo).expect("valid psi");
        let q = q_face(&psi, &geo);
        assert_eq!(q[0], q[1]);
        assert!(q[geo.nx()] > q[1], "q={q}");
    }

    #[test]
    fn test_density_normalized_to_greenwald_fraction() {
        let (dynamic, geo) = setup();
        let (cells, edge) = electron_density(&dynamic, &geo).expect("valid density");
        let target = 0.85 * greenwald_density(15.0, geo.a_minor);
        let var = CellVariable::with_edge_value(cells, geo.drho_norm(), edge).expect("valid var");
        let faces = var.face_values();
        let avg: f64 = faces
            .windows(2)
            .into_iter()
            .map(|w| 0.5 * (w[0] + w[1]) * geo.drho_norm())
            .sum();
        assert!((avg - target).abs() < 1e-12 * target.max(1.0), "avg={avg}, target={target}");
    }

    #[test]
    fn test_next_time_profiles_take_new_boundaries() {
        let (mut dynamic, geo) = setup();
        let (n_e, n_edge) = electron_density(&dynamic, &geo).expect("valid density");
        let current = build_core_profiles(
            CellVariable::with_edge_value(dynamic.profile_conditions.t_i.clone(), geo.drho_norm(), 1.0).expect("t_i"),
            CellVariable::with_edge_value(dynamic.profile_conditions.t_e.clone(), geo.drho_norm(), 1.0).expect("t_e"),
            CellVariable::with_edge_value(n_e, geo.drho_norm(), n_edge).expect("n_e"),
            initial_psi(15.0, 3.0, &geo).expect("psi"),
            &geo,
        );
        dynamic.profile_conditions.t_e_right_bc = 42.0;
        let flags = EvolvedFlags { ion_heat: true, electron_heat: true, current: false, density: false };
        let next = profiles_for_next_time(&current, &dynamic, &geo, &flags).expect("next profiles");
        assert_eq!(next.t_e.right_face_value(), 42.0);
        assert_eq!(next.t_e.value, current.t_e.value);
    }
}
