// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Geometry Provider
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Geometry as a function of time, and reconciliation of the plasma current
//! between the configured schedule and the equilibrium.

use crate::config::{GeometryConfig, SimulationConfig};
use crate::interpolated_param::{InterpolatedVar1d, InterpolationMode};
use crate::runtime_params::{build_dynamic_params, DynamicRuntimeParamsSlice};
use fusion_types::error::{FusionError, FusionResult};
use fusion_types::geometry::{build_circular_geometry, CircularGeometryParams, Geometry, GeometryType};
use fusion_types::state::Grid1D;
use ndarray::{Array1, Array2};

/// Geometry interpolated between equilibrium snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeDependentGeometryProvider {
    geometry_type: GeometryType,
    mesh: Grid1D,
    ip_from_parameters: bool,
    r_major: InterpolatedVar1d,
    a_minor: InterpolatedVar1d,
    b_0: InterpolatedVar1d,
    elongation_lcfs: InterpolatedVar1d,
    vpr: InterpolatedVar1d,
    vpr_face: InterpolatedVar1d,
    spr: InterpolatedVar1d,
    spr_face: InterpolatedVar1d,
    volume: InterpolatedVar1d,
    volume_face: InterpolatedVar1d,
    area: InterpolatedVar1d,
    area_face: InterpolatedVar1d,
    g1_over_vpr_face: InterpolatedVar1d,
    elongation: InterpolatedVar1d,
    elongation_face: InterpolatedVar1d,
    ip_profile_face: InterpolatedVar1d,
}

fn scalar_series(times: &Array1<f64>, geos: &[Geometry], f: impl Fn(&Geometry) -> f64) -> FusionResult<InterpolatedVar1d> {
    let values = Array2::from_shape_fn((geos.len(), 1), |(i, _)| f(&geos[i]));
    InterpolatedVar1d::new(times.clone(), values, InterpolationMode::PiecewiseLinear)
}

fn array_series(
    times: &Array1<f64>,
    geos: &[Geometry],
    f: impl Fn(&Geometry) -> &Array1<f64>,
) -> FusionResult<InterpolatedVar1d> {
    let width = f(&geos[0]).len();
    let values = Array2::from_shape_fn((geos.len(), width), |(i, j)| f(&geos[i])[j]);
    InterpolatedVar1d::new(times.clone(), values, InterpolationMode::PiecewiseLinear)
}

impl TimeDependentGeometryProvider {
    /// Build from `(time, geometry)` snapshots with increasing times. All
    /// snapshots must share the geometry type, mesh and Ip precedence flag.
    pub fn new(series: Vec<(f64, Geometry)>) -> FusionResult<Self> {
        let Some((_, first)) = series.first() else {
            return Err(FusionError::ConfigError(
                "time-dependent geometry needs at least one snapshot".to_string(),
            ));
        };
        for (t, geo) in &series {
            if geo.geometry_type != first.geometry_type {
                return Err(FusionError::ConfigError(format!(
                    "geometry at t={t} is {:?}, expected {:?}",
                    geo.geometry_type, first.geometry_type
                )));
            }
            if geo.mesh != first.mesh {
                return Err(FusionError::ConfigError(format!(
                    "geometry at t={t} has a different mesh ({} cells vs {})",
                    geo.mesh.nx, first.mesh.nx
                )));
            }
            if geo.ip_from_parameters != first.ip_from_parameters {
                return Err(FusionError::ConfigError(format!(
                    "geometry at t={t} disagrees on ip_from_parameters"
                )));
            }
        }
        let geometry_type = first.geometry_type;
        let mesh = first.mesh.clone();
        let ip_from_parameters = first.ip_from_parameters;

        let times = Array1::from_iter(series.iter().map(|(t, _)| *t));
        let geos: Vec<Geometry> = series.into_iter().map(|(_, g)| g).collect();

        Ok(TimeDependentGeometryProvider {
            geometry_type,
            mesh,
            ip_from_parameters,
            r_major: scalar_series(&times, &geos, |g| g.r_major)?,
            a_minor: scalar_series(&times, &geos, |g| g.a_minor)?,
            b_0: scalar_series(&times, &geos, |g| g.b_0)?,
            elongation_lcfs: scalar_series(&times, &geos, |g| g.elongation_lcfs)?,
            vpr: array_series(&times, &geos, |g| &g.vpr)?,
            vpr_face: array_series(&times, &geos, |g| &g.vpr_face)?,
            spr: array_series(&times, &geos, |g| &g.spr)?,
            spr_face: array_series(&times, &geos, |g| &g.spr_face)?,
            volume: array_series(&times, &geos, |g| &g.volume)?,
            volume_face: array_series(&times, &geos, |g| &g.volume_face)?,
            area: array_series(&times, &geos, |g| &g.area)?,
            area_face: array_series(&times, &geos, |g| &g.area_face)?,
            g1_over_vpr_face: array_series(&times, &geos, |g| &g.g1_over_vpr_face)?,
            elongation: array_series(&times, &geos, |g| &g.elongation)?,
            elongation_face: array_series(&times, &geos, |g| &g.elongation_face)?,
            ip_profile_face: array_series(&times, &geos, |g| &g.ip_profile_face)?,
        })
    }

    pub fn at(&self, t: f64) -> Geometry {
        Geometry {
            geometry_type: self.geometry_type,
            mesh: self.mesh.clone(),
            r_major: self.r_major.get_scalar(t),
            a_minor: self.a_minor.get_scalar(t),
            b_0: self.b_0.get_scalar(t),
            elongation_lcfs: self.elongation_lcfs.get_scalar(t),
            ip_from_parameters: self.ip_from_parameters,
            vpr: self.vpr.get_value(t),
            vpr_face: self.vpr_face.get_value(t),
            spr: self.spr.get_value(t),
            spr_face: self.spr_face.get_value(t),
            volume: self.volume.get_value(t),
            volume_face: self.volume_face.get_value(t),
            area: self.area.get_value(t),
            area_face: self.area_face.get_value(t),
            g1_over_vpr_face: self.g1_over_vpr_face.get_value(t),
            elongation: self.elongation.get_value(t),
            elongation_face: self.elongation_face.get_value(t),
            ip_profile_face: self.ip_profile_face.get_value(t),
        }
    }
}

/// Source of the geometry at a requested time.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryProvider {
    Constant(Geometry),
    TimeDependent(Box<TimeDependentGeometryProvider>),
}

impl GeometryProvider {
    pub fn from_config(config: &GeometryConfig) -> FusionResult<Self> {
        let mesh = Grid1D::new(config.n_rho)?;
        let base = CircularGeometryParams {
            r_major: config.r_major,
            a_minor: config.a_minor,
            b_0: config.b_0,
            elongation_lcfs: config.elongation_lcfs,
            ip_geometry: config.ip_geometry,
            ip_from_parameters: config.ip_from_parameters,
        };
        match &config.time_series {
            None => Ok(GeometryProvider::Constant(build_circular_geometry(&mesh, &base)?)),
            Some(snapshots) => {
                let series = snapshots
                    .iter()
                    .map(|snap| {
                        let params = CircularGeometryParams {
                            r_major: snap.r_major.unwrap_or(base.r_major),
                            a_minor: snap.a_minor.unwrap_or(base.a_minor),
                            b_0: snap.b_0.unwrap_or(base.b_0),
                            elongation_lcfs: snap.elongation_lcfs.unwrap_or(base.elongation_lcfs),
                            ip_geometry: snap.ip_geometry.unwrap_or(base.ip_geometry),
                            ip_from_parameters: base.ip_from_parameters,
                        };
                        Ok((snap.time, build_circular_geometry(&mesh, &params)?))
                    })
                    .collect::<FusionResult<Vec<_>>>()?;
                Ok(GeometryProvider::TimeDependent(Box::new(
                    TimeDependentGeometryProvider::new(series)?,
                )))
            }
        }
    }

    pub fn at(&self, t: f64) -> Geometry {
        match self {
            GeometryProvider::Constant(geo) => geo.clone(),
            GeometryProvider::TimeDependent(provider) => provider.at(t),
        }
    }

    /// The radial mesh, identical at every time.
    pub fn mesh(&self) -> &Grid1D {
        match self {
            GeometryProvider::Constant(geo) => &geo.mesh,
            GeometryProvider::TimeDependent(provider) => &provider.mesh,
        }
    }
}

/// Make the plasma current agree between the dynamic slice and the geometry.
///
/// With `ip_from_parameters` the slice value is kept and the geometry's
/// enclosed-current profile is rescaled to end on it; otherwise the slice
/// takes the geometry's edge current. Applying it twice changes nothing.
pub fn make_ip_consistent(
    mut dynamic: DynamicRuntimeParamsSlice,
    mut geo: Geometry,
) -> FusionResult<(DynamicRuntimeParamsSlice, Geometry)> {
    let last = geo.ip_profile_face.len() - 1;
    let edge = geo.ip_profile_face[last];
    if geo.ip_from_parameters {
        let target = dynamic.profile_conditions.ip;
        if edge != target {
            if !(edge > 0.0) {
                return Err(FusionError::PhysicsViolation(format!(
                    "geometry edge current is {edge} MA, cannot rescale to {target} MA"
                )));
            }
            let scale = target / edge;
            geo.ip_profile_face.mapv_inplace(|v| v * scale);
            geo.ip_profile_face[last] = target;
        }
    } else {
        dynamic.profile_conditions.ip = edge;
    }
    Ok((dynamic, geo))
}

/// Dynamic slice and geometry at `t`, with the plasma current reconciled.
pub fn consistent_params_and_geometry(
    t: f64,
    config: &SimulationConfig,
    provider: &GeometryProvider,
) -> FusionResult<(DynamicRuntimeParamsSlice, Geometry)> {
    let dynamic = build_dynamic_params(config, t)?;
    make_ip_consistent(dynamic, provider.at(t))
}
