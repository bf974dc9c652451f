// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Solver Kernel
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Everything about a solve that depends only on the static slice: which
//! equations are evolved, where each one sits in the packed state vector,
//! how the linear system is factorized and which physics models feed it.

use crate::config::{InitialGuessMode, SolverType};
use crate::physics::PhysicsModels;
use crate::profiles::{update_derived, EvolvedFlags};
use crate::runtime_params::{EvolvedVariable, StaticRuntimeParamsSlice};
use fusion_math::linalg::{lu_solve, tridiagonal_bands};
use fusion_math::tridiag::thomas_solve;
use fusion_types::error::{FusionError, FusionResult};
use fusion_types::geometry::Geometry;
use fusion_types::state::{CellVariable, CoreProfiles};
use ndarray::{s, Array1, Array2};

/// Storage of the assembled system matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemLayout {
    /// One evolved equation: the operator is tridiagonal, Thomas solve.
    Tridiagonal,
    /// Coupled equations: dense LU with partial pivoting.
    Dense,
}

#[derive(Debug)]
pub struct SolverKernel {
    evolved: Vec<EvolvedVariable>,
    nx: usize,
    layout: SystemLayout,
    pub theta: f64,
    pub solver_type: SolverType,
    pub use_predictor_corrector: bool,
    pub n_corrector_steps: usize,
    pub use_pereverzev: bool,
    pub initial_guess_mode: InitialGuessMode,
    pub log_iterations: bool,
    physics: PhysicsModels,
}

impl SolverKernel {
    pub fn build(static_params: &StaticRuntimeParamsSlice) -> FusionResult<Self> {
        let evolved = static_params.evolved_variables();
        if evolved.is_empty() {
            return Err(FusionError::ConfigError(
                "at least one of ion heat, electron heat, current or density must be evolved"
                    .to_string(),
            ));
        }
        let theta = static_params.solver.theta_implicit;
        if !(0.0..=1.0).contains(&theta) {
            return Err(FusionError::ConfigError(format!(
                "theta_implicit must lie in [0, 1], got {theta}"
            )));
        }
        let layout = if evolved.len() == 1 {
            SystemLayout::Tridiagonal
        } else {
            SystemLayout::Dense
        };
        Ok(SolverKernel {
            nx: static_params.nx,
            layout,
            theta,
            solver_type: static_params.solver.solver_type,
            use_predictor_corrector: static_params.solver.use_predictor_corrector,
            n_corrector_steps: static_params.solver.n_corrector_steps,
            use_pereverzev: static_params.solver.use_pereverzev,
            initial_guess_mode: static_params.solver.initial_guess_mode,
            log_iterations: static_params.solver.log_iterations,
            physics: PhysicsModels::from_static(static_params),
            evolved,
        })
    }

    pub fn evolved(&self) -> &[EvolvedVariable] {
        &self.evolved
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn layout(&self) -> SystemLayout {
        self.layout
    }

    pub fn physics(&self) -> &PhysicsModels {
        &self.physics
    }

    /// Length of the packed state vector.
    pub fn size(&self) -> usize {
        self.evolved.len() * self.nx
    }

    /// Start of the block of `var`, if it is evolved.
    pub fn offset(&self, var: EvolvedVariable) -> Option<usize> {
        self.evolved.iter().position(|v| *v == var).map(|k| k * self.nx)
    }

    pub fn flags(&self) -> EvolvedFlags {
        EvolvedFlags {
            ion_heat: self.offset(EvolvedVariable::IonTemperature).is_some(),
            electron_heat: self.offset(EvolvedVariable::ElectronTemperature).is_some(),
            current: self.offset(EvolvedVariable::Psi).is_some(),
            density: self.offset(EvolvedVariable::ElectronDensity).is_some(),
        }
    }

    pub fn pack(&self, profiles: &CoreProfiles) -> Array1<f64> {
        let mut x = Array1::zeros(self.size());
        for (k, var) in self.evolved.iter().enumerate() {
            let o = k * self.nx;
            x.slice_mut(s![o..o + self.nx]).assign(&cell_var(profiles, *var).value);
        }
        x
    }

    /// `template` with its evolved channels replaced by the blocks of `x`;
    /// boundary constraints are kept and q, j and Ip are refreshed.
    pub fn unpack(&self, x: &Array1<f64>, template: &CoreProfiles, geo: &Geometry) -> FusionResult<CoreProfiles> {
        if x.len() != self.size() {
            return Err(FusionError::MeshMismatch {
                expected: self.size(),
                actual: x.len(),
            });
        }
        let mut out = template.clone();
        for (k, var) in self.evolved.iter().enumerate() {
            let o = k * self.nx;
            let target = cell_var_mut(&mut out, *var);
            *target = target.with_value(x.slice(s![o..o + self.nx]).to_owned());
        }
        if self.flags().current {
            update_derived(&mut out, geo);
        }
        Ok(out)
    }

    /// True when every evolved temperature and density in `x` is positive.
    pub fn is_physical(&self, x: &Array1<f64>) -> bool {
        self.evolved.iter().enumerate().all(|(k, var)| {
            *var == EvolvedVariable::Psi || {
                let o = k * self.nx;
                x.slice(s![o..o + self.nx]).iter().all(|v| *v > 0.0)
            }
        }) && x.iter().all(|v| v.is_finite())
    }

    pub fn solve_linear_system(&self, m: &Array2<f64>, rhs: &Array1<f64>) -> FusionResult<Array1<f64>> {
        match self.layout {
            SystemLayout::Tridiagonal => {
                let (sub, diag, sup) = tridiagonal_bands(m);
                thomas_solve(&sub, &diag, &sup, rhs)
            }
            SystemLayout::Dense => lu_solve(m, rhs),
        }
    }
}

pub fn cell_var(profiles: &CoreProfiles, var: EvolvedVariable) -> &CellVariable {
    match var {
        EvolvedVariable::IonTemperature => &profiles.t_i,
        EvolvedVariable::ElectronTemperature => &profiles.t_e,
        EvolvedVariable::Psi => &profiles.psi,
        EvolvedVariable::ElectronDensity => &profiles.n_e,
    }
}

fn cell_var_mut(profiles: &mut CoreProfiles, var: EvolvedVariable) -> &mut CellVariable {
    match var {
        EvolvedVariable::IonTemperature => &mut profiles.t_i,
        EvolvedVariable::ElectronTemperature => &mut profiles.t_e,
        EvolvedVariable::Psi => &mut profiles.psi,
        EvolvedVariable::ElectronDensity => &mut profiles.n_e,
    }
}
