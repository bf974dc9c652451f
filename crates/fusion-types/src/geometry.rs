// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Geometry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Flux-surface geometry on the radial transport mesh.
//!
//! All radial derivatives are taken with respect to the normalized
//! coordinate rho_norm, so `vpr = dV/drho_norm` and `spr = dA/drho_norm`.

use crate::error::{FusionError, FusionResult};
use crate::state::Grid1D;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryType {
    /// Ad-hoc circular-like equilibrium built from a handful of scalars.
    Circular,
    /// Arrays supplied from an external equilibrium reconstruction.
    Numeric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub geometry_type: GeometryType,
    pub mesh: Grid1D,
    pub r_major: f64,         // m
    pub a_minor: f64,         // m
    pub b_0: f64,             // T
    pub elongation_lcfs: f64, // dimensionless
    /// When true the configured Ip wins over the equilibrium's current.
    pub ip_from_parameters: bool,
    pub vpr: Array1<f64>,
    pub vpr_face: Array1<f64>,
    pub spr: Array1<f64>,
    pub spr_face: Array1<f64>,
    pub volume: Array1<f64>,
    pub volume_face: Array1<f64>,
    pub area: Array1<f64>,
    pub area_face: Array1<f64>,
    /// vpr_face * <|grad rho_norm|^2>, the diffusion metric.
    pub g1_over_vpr_face: Array1<f64>,
    pub elongation: Array1<f64>,
    pub elongation_face: Array1<f64>,
    /// Enclosed plasma current on faces (MA).
    pub ip_profile_face: Array1<f64>,
}

/// Scalars defining the ad-hoc circular equilibrium.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularGeometryParams {
    pub r_major: f64,
    pub a_minor: f64,
    pub b_0: f64,
    pub elongation_lcfs: f64,
    /// Equilibrium plasma current (MA) used for `ip_profile_face`.
    pub ip_geometry: f64,
    pub ip_from_parameters: bool,
}

/// Radial arrays of an externally computed equilibrium, all on the mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericGeometryArrays {
    pub vpr: Array1<f64>,
    pub vpr_face: Array1<f64>,
    pub spr: Array1<f64>,
    pub spr_face: Array1<f64>,
    pub volume: Array1<f64>,
    pub volume_face: Array1<f64>,
    pub area: Array1<f64>,
    pub area_face: Array1<f64>,
    pub g1_over_vpr_face: Array1<f64>,
    pub elongation: Array1<f64>,
    pub elongation_face: Array1<f64>,
    pub ip_profile_face: Array1<f64>,
}

fn check_positive(name: &str, value: f64) -> FusionResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(FusionError::ConfigError(format!(
            "geometry {name} must be finite and > 0, got {value}"
        )));
    }
    Ok(())
}

/// Builds the circular geometry: elongation grows linearly from 1 on axis to
/// `elongation_lcfs`, V = 2 pi^2 R a^2 kappa rho^2 and A = pi a^2 kappa rho^2.
/// The equilibrium current is taken uniform, so I(rho) = Ip rho^2.
pub fn build_circular_geometry(
    mesh: &Grid1D,
    params: &CircularGeometryParams,
) -> FusionResult<Geometry> {
    check_positive("r_major", params.r_major)?;
    check_positive("a_minor", params.a_minor)?;
    check_positive("b_0", params.b_0)?;
    check_positive("elongation_lcfs", params.elongation_lcfs)?;
    check_positive("ip_geometry", params.ip_geometry)?;
    if params.a_minor >= params.r_major {
        return Err(FusionError::ConfigError(format!(
            "a_minor ({}) must be smaller than r_major ({})",
            params.a_minor, params.r_major
        )));
    }

    let a2 = params.a_minor * params.a_minor;
    let dkappa = params.elongation_lcfs - 1.0;
    let kappa = |rho: f64| 1.0 + rho * dkappa;
    // d(kappa rho^2)/drho
    let dshape = |rho: f64| 2.0 * kappa(rho) * rho + rho * rho * dkappa;
    let vol_pref = 2.0 * PI * PI * params.r_major * a2;
    let area_pref = PI * a2;

    let cells = &mesh.cell_centers;
    let faces = &mesh.face_centers;

    let vpr_face = faces.mapv(|r| vol_pref * dshape(r));
    Ok(Geometry {
        geometry_type: GeometryType::Circular,
        mesh: mesh.clone(),
        r_major: params.r_major,
        a_minor: params.a_minor,
        b_0: params.b_0,
        elongation_lcfs: params.elongation_lcfs,
        ip_from_parameters: params.ip_from_parameters,
        vpr: cells.mapv(|r| vol_pref * dshape(r)),
        g1_over_vpr_face: vpr_face.mapv(|v| v / a2),
        vpr_face,
        spr: cells.mapv(|r| area_pref * dshape(r)),
        spr_face: faces.mapv(|r| area_pref * dshape(r)),
        volume: cells.mapv(|r| vol_pref * kappa(r) * r * r),
        volume_face: faces.mapv(|r| vol_pref * kappa(r) * r * r),
        area: cells.mapv(|r| area_pref * kappa(r) * r * r),
        area_face: faces.mapv(|r| area_pref * kappa(r) * r * r),
        elongation: cells.mapv(kappa),
        elongation_face: faces.mapv(kappa),
        ip_profile_face: faces.mapv(|r| params.ip_geometry * r * r),
    })
}

impl Geometry {
    /// Geometry from externally computed arrays; every array is checked
    /// against the mesh length.
    pub fn numeric(
        mesh: &Grid1D,
        scalars: &CircularGeometryParams,
        arrays: NumericGeometryArrays,
    ) -> FusionResult<Self> {
        check_positive("r_major", scalars.r_major)?;
        check_positive("a_minor", scalars.a_minor)?;
        check_positive("b_0", scalars.b_0)?;
        let cell_arrays = [
            ("vpr", &arrays.vpr),
            ("spr", &arrays.spr),
            ("volume", &arrays.volume),
            ("area", &arrays.area),
            ("elongation", &arrays.elongation),
        ];
        let face_arrays = [
            ("vpr_face", &arrays.vpr_face),
            ("spr_face", &arrays.spr_face),
            ("volume_face", &arrays.volume_face),
            ("area_face", &arrays.area_face),
            ("g1_over_vpr_face", &arrays.g1_over_vpr_face),
            ("elongation_face", &arrays.elongation_face),
            ("ip_profile_face", &arrays.ip_profile_face),
        ];
        for (name, arr) in cell_arrays {
            if arr.len() != mesh.nx {
                return Err(FusionError::ConfigError(format!(
                    "{name} has {} entries, mesh has {} cells",
                    arr.len(),
                    mesh.nx
                )));
            }
        }
        for (name, arr) in face_arrays {
            if arr.len() != mesh.nx + 1 {
                return Err(FusionError::ConfigError(format!(
                    "{name} has {} entries, mesh has {} faces",
                    arr.len(),
                    mesh.nx + 1
                )));
            }
        }
        Ok(Geometry {
            geometry_type: GeometryType::Numeric,
            mesh: mesh.clone(),
            r_major: scalars.r_major,
            a_minor: scalars.a_minor,
            b_0: scalars.b_0,
            elongation_lcfs: arrays.elongation_face[mesh.nx],
            ip_from_parameters: scalars.ip_from_parameters,
            vpr: arrays.vpr,
            vpr_face: arrays.vpr_face,
            spr: arrays.spr,
            spr_face: arrays.spr_face,
            volume: arrays.volume,
            volume_face: arrays.volume_face,
            area: arrays.area,
            area_face: arrays.area_face,
            g1_over_vpr_face: arrays.g1_over_vpr_face,
            elongation: arrays.elongation,
            elongation_face: arrays.elongation_face,
            ip_profile_face: arrays.ip_profile_face,
        })
    }

    pub fn nx(&self) -> usize {
        self.mesh.nx
    }

    pub fn drho_norm(&self) -> f64 {
        self.mesh.dx
    }

    pub fn rho_norm(&self) -> &Array1<f64> {
        &self.mesh.cell_centers
    }

    pub fn rho_face_norm(&self) -> &Array1<f64> {
        &self.mesh.face_centers
    }

    /// Plasma volume inside the last closed flux surface (m^3).
    pub fn volume_total(&self) -> f64 {
        self.volume_face[self.nx()]
    }

    /// Integral of a cell profile over the plasma volume.
    pub fn volume_integral(&self, cells: &Array1<f64>) -> f64 {
        cells
            .iter()
            .zip(self.vpr.iter())
            .map(|(f, v)| f * v)
            .sum::<f64>()
            * self.drho_norm()
    }

    /// Integral of a cell profile over the poloidal cross-section.
    pub fn area_integral(&self, cells: &Array1<f64>) -> f64 {
        cells
            .iter()
            .zip(self.spr.iter())
            .map(|(f, s)| f * s)
            .sum::<f64>()
            * self.drho_norm()
    }
}
