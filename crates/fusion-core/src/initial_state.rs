// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Initial State and Restart
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! State at `t_initial`, either built from the configured profiles or
//! loaded from a restart snapshot.

use crate::config::SimulationConfig;
use crate::geometry_provider::{consistent_params_and_geometry, GeometryProvider};
use crate::physics::PhysicsModels;
use crate::post_processing::{make_post_processed_outputs, PostProcessedOutputs};
use crate::profiles::{build_core_profiles, electron_density, initial_psi};
use crate::runtime_params::StaticRuntimeParamsSlice;
use fusion_types::error::{FusionError, FusionResult};
use fusion_types::state::{CellVariable, SimulationState, SolverNumericOutputs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One saved step: the state and its post-processed outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestartSnapshot {
    pub state: SimulationState,
    pub post_processed: PostProcessedOutputs,
}

impl RestartSnapshot {
    pub fn load<P: AsRef<Path>>(path: P) -> FusionResult<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> FusionResult<()> {
        let text = serde_json::to_string(self)?;
        fs::write(path, text)?;
        Ok(())
    }
}

pub fn initial_state(
    config: &SimulationConfig,
    static_params: &StaticRuntimeParamsSlice,
    provider: &GeometryProvider,
) -> FusionResult<(SimulationState, PostProcessedOutputs)> {
    let t0 = config.numerics.t_initial;
    let (dynamic, geo) = consistent_params_and_geometry(t0, config, provider)?;

    if let Some(restart) = config.restart.as_ref().filter(|r| r.do_restart) {
        let snapshot = RestartSnapshot::load(&restart.filename)?;
        return from_snapshot(snapshot, static_params.nx, t0);
    }

    let pc = &dynamic.profile_conditions;
    let dx = geo.drho_norm();
    let (n_e_cells, n_e_edge) = electron_density(&dynamic, &geo)?;
    let t_i = CellVariable::with_edge_value(pc.t_i.clone(), dx, pc.t_i_right_bc)?;
    let t_e = CellVariable::with_edge_value(pc.t_e.clone(), dx, pc.t_e_right_bc)?;
    let n_e = CellVariable::with_edge_value(n_e_cells, dx, n_e_edge)?;
    let psi = initial_psi(pc.ip, pc.current_profile_nu, &geo)?;
    let core_profiles = build_core_profiles(t_i, t_e, n_e, psi, &geo);
    if !core_profiles.is_finite() {
        return Err(FusionError::PhysicsViolation(
            "initial profiles contain non-finite values".to_string(),
        ));
    }

    let physics = PhysicsModels::from_static(static_params).evaluate(&dynamic, &geo, &core_profiles)?;
    let state = SimulationState {
        t: t0,
        dt: 0.0,
        core_profiles,
        core_transport: physics.transport,
        core_sources: physics.sources,
        solver_numeric_outputs: SolverNumericOutputs::default(),
        geometry: geo,
    };
    let post = make_post_processed_outputs(&state, &dynamic, None);
    Ok((state, post))
}

/// Restarted state at `t0`; the mesh must match the configuration.
pub fn from_snapshot(
    snapshot: RestartSnapshot,
    nx: usize,
    t0: f64,
) -> FusionResult<(SimulationState, PostProcessedOutputs)> {
    let RestartSnapshot {
        mut state,
        mut post_processed,
    } = snapshot;
    let actual = state.core_profiles.nx();
    if actual != nx {
        return Err(FusionError::MeshMismatch { expected: nx, actual });
    }
    state.t = t0;
    post_processed.t = t0;
    Ok((state, post_processed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RestartConfig;
    use crate::profiles::ip_from_psi;
    use crate::runtime_params::build_static_params;

    fn build(cfg: &SimulationConfig) -> FusionResult<(SimulationState, PostProcessedOutputs)> {
        let provider = GeometryProvider::from_config(&cfg.geometry)?;
        initial_state(cfg, &build_static_params(cfg), &provider)
    }

    #[test]
    fn test_initial_state_from_profiles() {
        let cfg = SimulationConfig::default();
        let (state, post) = build(&cfg).expect("initial state");
        assert_eq!(state.t, 0.0);
        assert_eq!(state.core_profiles.nx(), 25);
        assert!((state.core_profiles.t_e.value[0] - 14.72).abs() < 1e-9);
        let ip = ip_from_psi(&state.core_profiles.psi, state.geometry.r_major);
        assert!((ip - 15.0).abs() < 1e-9);
        assert!(post.w_thermal_total > 0.0);
    }

    #[test]
    fn test_restart_round_trip() {
        let cfg = SimulationConfig::default();
        let (mut state, post) = build(&cfg).expect("initial state");
        state.t = 3.25;
        let path = std::env::temp_dir().join("fusion_core_restart_round_trip.json");
        RestartSnapshot {
            state: state.clone(),
            post_processed: post.clone(),
        }
        .save(&path)
        .expect("save snapshot");

        let mut restarted = cfg.clone();
        restarted.numerics.t_initial = 1.0;
        restarted.numerics.t_final = 2.0;
        restarted.restart = Some(RestartConfig {
            do_restart: true,
            filename: path.to_string_lossy().into_owned(),
        });
        let (loaded, loaded_post) = build(&restarted).expect("restart");
        assert_eq!(loaded.t, 1.0);
        assert_eq!(loaded_post.t, 1.0);
        assert_eq!(loaded.core_profiles, state.core_profiles);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_restart_mesh_mismatch_rejected() {
        let cfg = SimulationConfig::default();
        let (state, post) = build(&cfg).expect("initial state");
        let snapshot = RestartSnapshot {
            state,
            post_processed: post,
        };
        let err = from_snapshot(snapshot, 50, 0.0).expect_err("mesh mismatch");
        assert!(matches!(err, FusionError::MeshMismatch { expected: 50, actual: 25 }));
    }

    #[test]
    fn test_missing_restart_file_is_io_error() {
        let mut cfg = SimulationConfig::default();
        cfg.restart = Some(RestartConfig {
            do_restart: true,
            filename: "/nonexistent/restart.json".to_string(),
        });
        assert!(matches!(build(&cfg), Err(FusionError::Io(_))));
    }
}
