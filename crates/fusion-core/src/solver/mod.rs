// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Theta-Method Solvers
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Implicit time advance of the evolved core profiles.
//!
//!   tc (x+ - x) / dt = theta F(x+) + (1 - theta) F(x)
//!
//! F(x) = A x + b is rebuilt from the physics at whichever state the
//! coefficients are evaluated. The linear variant evaluates them at a guess
//! and solves once per pass; the Newton variant drives the full nonlinear
//! residual to zero.

pub mod discretization;
pub mod kernel;
pub mod linear;
pub mod newton;

use crate::config::SolverType;
use crate::profiles::profiles_for_next_time;
use crate::runtime_params::{DynamicRuntimeParamsSlice, StaticRuntimeParamsSlice};
use discretization::{assemble, calc_coeffs, pereverzev_operator, SystemCoeffs};
use fusion_types::error::{FusionError, FusionResult};
use fusion_types::geometry::Geometry;
use fusion_types::state::{
    CoreProfiles, CoreSources, CoreTransport, SimulationState, SolverNumericOutputs,
};
use kernel::SolverKernel;
use ndarray::{Array1, Array2};
use std::fmt::Debug;
use std::sync::Arc;

pub use linear::LinearThetaMethod;
pub use newton::NewtonRaphsonThetaMethod;

/// Everything one solver call reads.
#[derive(Debug, Clone, Copy)]
pub struct SolverInput<'a> {
    pub t: f64,
    pub dt: f64,
    pub dynamic_t: &'a DynamicRuntimeParamsSlice,
    pub dynamic_t_plus_dt: &'a DynamicRuntimeParamsSlice,
    pub static_params: &'a StaticRuntimeParamsSlice,
    pub geo_t: &'a Geometry,
    pub geo_t_plus_dt: &'a Geometry,
    pub state_t: &'a SimulationState,
}

#[derive(Debug, Clone)]
pub struct SolverOutput {
    pub core_profiles: CoreProfiles,
    pub core_transport: CoreTransport,
    pub core_sources: CoreSources,
    pub solver_numeric_outputs: SolverNumericOutputs,
}

pub trait Solver: Debug {
    fn step(&self, input: &SolverInput<'_>) -> FusionResult<SolverOutput>;
}

pub fn build_solver(kernel: Arc<SolverKernel>) -> Box<dyn Solver> {
    match kernel.solver_type {
        SolverType::Linear => Box::new(LinearThetaMethod::new(kernel)),
        SolverType::NewtonRaphson => Box::new(NewtonRaphsonThetaMethod::new(kernel)),
    }
}

/// One theta step: the old state, the explicit half and the profile template
/// at t + dt.
pub(crate) struct ThetaProblem<'a> {
    pub kernel: &'a SolverKernel,
    pub input: &'a SolverInput<'a>,
    pub x_old: Array1<f64>,
    /// Profiles at t + dt with new boundary conditions and old evolved values.
    pub template: CoreProfiles,
    /// (1 - theta) F(x_old) at time t.
    pub explicit: Array1<f64>,
}

impl<'a> ThetaProblem<'a> {
    pub fn new(kernel: &'a SolverKernel, input: &'a SolverInput<'a>) -> FusionResult<Self> {
        if !(input.dt > 0.0) || !input.dt.is_finite() {
            return Err(FusionError::ConfigError(format!(
                "time step must be finite and > 0, got {}",
                input.dt
            )));
        }
        let profiles_t = &input.state_t.core_profiles;
        if profiles_t.nx() != kernel.nx() {
            return Err(FusionError::MeshMismatch {
                expected: kernel.nx(),
                actual: profiles_t.nx(),
            });
        }
        let x_old = kernel.pack(profiles_t);
        let template = profiles_for_next_time(
            profiles_t,
            input.dynamic_t_plus_dt,
            input.geo_t_plus_dt,
            &kernel.flags(),
        )?;
        let theta = kernel.theta;
        let explicit = if theta < 1.0 {
            let coeffs = calc_coeffs(kernel, input.dynamic_t, input.geo_t, profiles_t)?;
            let (a, b) = assemble(kernel, &coeffs, profiles_t);
            (a.dot(&x_old) + b) * (1.0 - theta)
        } else {
            Array1::zeros(kernel.size())
        };
        Ok(ThetaProblem {
            kernel,
            input,
            x_old,
            template,
            explicit,
        })
    }

    pub fn profiles_at(&self, x: &Array1<f64>) -> FusionResult<CoreProfiles> {
        self.kernel.unpack(x, &self.template, self.input.geo_t_plus_dt)
    }

    pub fn coeffs_at(&self, profiles: &CoreProfiles) -> FusionResult<SystemCoeffs> {
        calc_coeffs(
            self.kernel,
            self.input.dynamic_t_plus_dt,
            self.input.geo_t_plus_dt,
            profiles,
        )
    }

    /// One linearized solve with coefficients frozen at `guess`.
    pub fn linear_step(&self, guess: &CoreProfiles) -> FusionResult<Array1<f64>> {
        let kernel = self.kernel;
        let theta = kernel.theta;
        let dt = self.input.dt;
        let coeffs = self.coeffs_at(guess)?;
        let (a, b) = assemble(kernel, &coeffs, guess);
        let tc_over_dt = coeffs.transient() / dt;

        let mut m: Array2<f64> = a * (-theta);
        for (i, c) in tc_over_dt.iter().enumerate() {
            m[[i, i]] += c;
        }
        let mut rhs = &tc_over_dt * &self.x_old + b * theta + &self.explicit;

        if kernel.use_pereverzev {
            let per = pereverzev_operator(
                kernel,
                &coeffs,
                self.input.dynamic_t_plus_dt,
                self.input.geo_t_plus_dt,
                guess,
            );
            let x_guess = kernel.pack(guess);
            rhs = rhs - per.dot(&x_guess) * theta;
            m = m - per * theta;
        }
        kernel.solve_linear_system(&m, &rhs)
    }

    /// Theta residual at `x`, scaled by dt / tc so every channel reads as a
    /// change of its own variable over the step.
    pub fn residual(&self, x: &Array1<f64>) -> FusionResult<Array1<f64>> {
        let profiles = self.profiles_at(x)?;
        let coeffs = self.coeffs_at(&profiles)?;
        let (a, b) = assemble(self.kernel, &coeffs, &profiles);
        let tc = coeffs.transient();
        let dt = self.input.dt;
        let implicit = (a.dot(x) + b) * self.kernel.theta;
        let lhs = &tc * &(x - &self.x_old) / dt;
        Ok((lhs - implicit - &self.explicit) * dt / &tc)
    }

    /// Output at `x` with transport and sources evaluated there.
    pub fn finish(&self, x: &Array1<f64>, numerics: SolverNumericOutputs) -> FusionResult<SolverOutput> {
        let core_profiles = self.profiles_at(x)?;
        let physics = self.kernel.physics().evaluate(
            self.input.dynamic_t_plus_dt,
            self.input.geo_t_plus_dt,
            &core_profiles,
        )?;
        Ok(SolverOutput {
            core_profiles,
            core_transport: physics.transport,
            core_sources: physics.sources,
            solver_numeric_outputs: numerics,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::SimulationConfig;
    use crate::geometry_provider::{consistent_params_and_geometry, GeometryProvider};
    use crate::initial_state::initial_state;
    use crate::runtime_params::{build_static_params, DynamicRuntimeParamsSlice, StaticRuntimeParamsSlice};
    use fusion_types::geometry::Geometry;
    use fusion_types::state::SimulationState;

    pub struct Fixture {
        pub static_params: StaticRuntimeParamsSlice,
        pub dynamic_t: DynamicRuntimeParamsSlice,
        pub dynamic_t_plus_dt: DynamicRuntimeParamsSlice,
        pub geo_t: Geometry,
        pub geo_t_plus_dt: Geometry,
        pub state: SimulationState,
    }

    pub fn fixture(cfg: &SimulationConfig, dt: f64) -> Fixture {
        let static_params = build_static_params(cfg);
        let provider = GeometryProvider::from_config(&cfg.geometry).expect("valid geometry");
        let t0 = cfg.numerics.t_initial;
        let (dynamic_t, geo_t) = consistent_params_and_geometry(t0, cfg, &provider).expect("slice at t");
        let (dynamic_t_plus_dt, geo_t_plus_dt) =
            consistent_params_and_geometry(t0 + dt, cfg, &provider).expect("slice at t + dt");
        let (state, _) = initial_state(cfg, &static_params, &provider).expect("initial state");
        Fixture {
            static_params,
            dynamic_t,
            dynamic_t_plus_dt,
            geo_t,
            geo_t_plus_dt,
            state,
        }
    }
}
