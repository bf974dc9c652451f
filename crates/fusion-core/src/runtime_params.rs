// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Runtime Parameter Slices
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Static and dynamic views of the configuration.
//!
//! The static slice holds everything that fixes the structure of the solver
//! (mesh size, evolved equations, model variants, schedule shapes) and is
//! the solver-kernel cache key. The dynamic slice holds every numeric value
//! resolved at one simulation time.

use crate::config::{
    ConductivityConfig, InitialGuessMode, PedestalModelConfig, SimulationConfig, SolverType,
    SourceMode, TimeStepCalculatorType, TransportModelConfig,
};
use crate::interpolated_param::{InterpolatedVar1d, InterpolatedVar2d, ScheduleShape};
use fusion_types::error::{FusionError, FusionResult};
use fusion_types::state::Grid1D;
use ndarray::{array, Array1};

/// Equations the solver can evolve, in block order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EvolvedVariable {
    IonTemperature,
    ElectronTemperature,
    Psi,
    ElectronDensity,
}

impl EvolvedVariable {
    pub fn name(self) -> &'static str {
        match self {
            EvolvedVariable::IonTemperature => "T_i",
            EvolvedVariable::ElectronTemperature => "T_e",
            EvolvedVariable::Psi => "psi",
            EvolvedVariable::ElectronDensity => "n_e",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportModelKind {
    Constant,
    CriticalGradient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PedestalModelKind {
    SetTpedNped,
    EpedScaling,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticSolverParams {
    pub solver_type: SolverType,
    pub theta_implicit: f64,
    pub use_predictor_corrector: bool,
    pub n_corrector_steps: usize,
    pub use_pereverzev: bool,
    pub initial_guess_mode: InitialGuessMode,
    pub log_iterations: bool,
}

/// Mode of every source; unconfigured sources are `Zero`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceModes {
    pub generic_heat: SourceMode,
    pub generic_particle: SourceMode,
    pub gas_puff: SourceMode,
    pub generic_current: SourceMode,
    pub ei_exchange: SourceMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticRuntimeParamsSlice {
    pub nx: usize,
    pub evolve_ion_heat: bool,
    pub evolve_electron_heat: bool,
    pub evolve_current: bool,
    pub evolve_density: bool,
    pub solver: StaticSolverParams,
    pub source_modes: SourceModes,
    pub transport_model: TransportModelKind,
    pub set_pedestal: bool,
    pub pedestal_model: PedestalModelKind,
    pub time_step_calculator: TimeStepCalculatorType,
    pub geometry_time_dependent: bool,
    /// Anchor shape of every schedule, keyed by its config path.
    pub schedule_shapes: Vec<(&'static str, ScheduleShape)>,
}

impl StaticRuntimeParamsSlice {
    /// Evolved equations in block order.
    pub fn evolved_variables(&self) -> Vec<EvolvedVariable> {
        let mut out = Vec::with_capacity(4);
        if self.evolve_ion_heat {
            out.push(EvolvedVariable::IonTemperature);
        }
        if self.evolve_electron_heat {
            out.push(EvolvedVariable::ElectronTemperature);
        }
        if self.evolve_current {
            out.push(EvolvedVariable::Psi);
        }
        if self.evolve_density {
            out.push(EvolvedVariable::ElectronDensity);
        }
        out
    }
}

fn schedule_shapes(config: &SimulationConfig) -> Vec<(&'static str, ScheduleShape)> {
    let pc = &config.profile_conditions;
    let mut shapes = vec![
        ("profile_conditions.ip", pc.ip.shape()),
        ("profile_conditions.t_i", pc.t_i.shape()),
        ("profile_conditions.t_e", pc.t_e.shape()),
        ("profile_conditions.n_e", pc.n_e.shape()),
        ("profile_conditions.nbar", pc.nbar.shape()),
        ("numerics.resistivity_multiplier", config.numerics.resistivity_multiplier.shape()),
        ("plasma_composition.z_eff", config.plasma_composition.z_eff.shape()),
        ("plasma_composition.z_impurity", config.plasma_composition.z_impurity.shape()),
    ];
    let optional_1d = [
        ("profile_conditions.t_i_right_bc", pc.t_i_right_bc.as_ref()),
        ("profile_conditions.t_e_right_bc", pc.t_e_right_bc.as_ref()),
        ("profile_conditions.n_e_right_bc", pc.n_e_right_bc.as_ref()),
    ];
    for (name, var) in optional_1d {
        if let Some(var) = var {
            shapes.push((name, var.shape()));
        }
    }

    let s = &config.sources;
    if let Some(c) = &s.generic_heat {
        shapes.push(("sources.generic_heat.gaussian_location", c.gaussian_location.shape()));
        shapes.push(("sources.generic_heat.gaussian_width", c.gaussian_width.shape()));
        shapes.push(("sources.generic_heat.p_total", c.p_total.shape()));
        shapes.push(("sources.generic_heat.electron_heat_fraction", c.electron_heat_fraction.shape()));
        if let Some(p) = &c.prescribed_values {
            shapes.push(("sources.generic_heat.prescribed_values", p.shape()));
        }
    }
    if let Some(c) = &s.generic_particle {
        shapes.push(("sources.generic_particle.deposition_location", c.deposition_location.shape()));
        shapes.push(("sources.generic_particle.particle_width", c.particle_width.shape()));
        shapes.push(("sources.generic_particle.s_total", c.s_total.shape()));
        if let Some(p) = &c.prescribed_values {
            shapes.push(("sources.generic_particle.prescribed_values", p.shape()));
        }
    }
    if let Some(c) = &s.gas_puff {
        shapes.push(("sources.gas_puff.puff_decay_length", c.puff_decay_length.shape()));
        shapes.push(("sources.gas_puff.s_total", c.s_total.shape()));
        if let Some(p) = &c.prescribed_values {
            shapes.push(("sources.gas_puff.prescribed_values", p.shape()));
        }
    }
    if let Some(c) = &s.generic_current {
        shapes.push(("sources.generic_current.gaussian_location", c.gaussian_location.shape()));
        shapes.push(("sources.generic_current.gaussian_width", c.gaussian_width.shape()));
        shapes.push(("sources.generic_current.i_generic", c.i_generic.shape()));
        if let Some(p) = &c.prescribed_values {
            shapes.push(("sources.generic_current.prescribed_values", p.shape()));
        }
    }
    if let Some(c) = &s.ei_exchange {
        shapes.push(("sources.ei_exchange.qei_multiplier", c.qei_multiplier.shape()));
    }

    match &config.transport.model {
        TransportModelConfig::Constant(c) => {
            shapes.push(("transport.chi_i", c.chi_i.shape()));
            shapes.push(("transport.chi_e", c.chi_e.shape()));
            shapes.push(("transport.d_e", c.d_e.shape()));
            shapes.push(("transport.v_e", c.v_e.shape()));
        }
        TransportModelConfig::CriticalGradient(c) => {
            shapes.push(("transport.chi_base", c.chi_base.shape()));
            shapes.push(("transport.chi_stiff", c.chi_stiff.shape()));
            shapes.push(("transport.r_ln_t_crit", c.r_ln_t_crit.shape()));
            shapes.push(("transport.d_e_over_chi", c.d_e_over_chi.shape()));
            shapes.push(("transport.v_e", c.v_e.shape()));
        }
    }

    match &config.pedestal.model {
        PedestalModelConfig::SetTpedNped(c) => {
            shapes.push(("pedestal.t_i_ped", c.t_i_ped.shape()));
            shapes.push(("pedestal.t_e_ped", c.t_e_ped.shape()));
            shapes.push(("pedestal.n_e_ped", c.n_e_ped.shape()));
            shapes.push(("pedestal.rho_norm_ped_top", c.rho_norm_ped_top.shape()));
        }
        PedestalModelConfig::EpedScaling(c) => {
            shapes.push(("pedestal.beta_p_ped", c.beta_p_ped.shape()));
            shapes.push(("pedestal.rho_s", c.rho_s.shape()));
            shapes.push(("pedestal.t_i_ped", c.t_i_ped.shape()));
            shapes.push(("pedestal.t_e_ped", c.t_e_ped.shape()));
            shapes.push(("pedestal.n_e_ped", c.n_e_ped.shape()));
        }
    }
    shapes
}

fn mode_of<T>(source: Option<&T>, mode: impl Fn(&T) -> SourceMode) -> SourceMode {
    source.map_or(SourceMode::Zero, mode)
}

/// Structural view of `config`. Value-only edits leave it unchanged.
pub fn build_static_params(config: &SimulationConfig) -> StaticRuntimeParamsSlice {
    let n = &config.numerics;
    let s = &config.solver;
    let src = &config.sources;
    StaticRuntimeParamsSlice {
        nx: config.geometry.n_rho,
        evolve_ion_heat: n.evolve_ion_heat,
        evolve_electron_heat: n.evolve_electron_heat,
        evolve_current: n.evolve_current,
        evolve_density: n.evolve_density,
        solver: StaticSolverParams {
            solver_type: s.solver_type,
            theta_implicit: s.theta_implicit,
            use_predictor_corrector: s.use_predictor_corrector,
            n_corrector_steps: s.n_corrector_steps,
            use_pereverzev: s.use_pereverzev,
            initial_guess_mode: s.initial_guess_mode,
            log_iterations: s.log_iterations,
        },
        source_modes: SourceModes {
            generic_heat: mode_of(src.generic_heat.as_ref(), |c| c.mode),
            generic_particle: mode_of(src.generic_particle.as_ref(), |c| c.mode),
            gas_puff: mode_of(src.gas_puff.as_ref(), |c| c.mode),
            generic_current: mode_of(src.generic_current.as_ref(), |c| c.mode),
            ei_exchange: mode_of(src.ei_exchange.as_ref(), |c| c.mode),
        },
        transport_model: match config.transport.model {
            TransportModelConfig::Constant(_) => TransportModelKind::Constant,
            TransportModelConfig::CriticalGradient(_) => TransportModelKind::CriticalGradient,
        },
        set_pedestal: config.pedestal.set_pedestal,
        pedestal_model: match config.pedestal.model {
            PedestalModelConfig::SetTpedNped(_) => PedestalModelKind::SetTpedNped,
            PedestalModelConfig::EpedScaling(_) => PedestalModelKind::EpedScaling,
        },
        time_step_calculator: config.time_step_calculator.calculator_type,
        geometry_time_dependent: config.geometry.time_series.is_some(),
        schedule_shapes: schedule_shapes(config),
    }
}

// ── Dynamic slice ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicProfileConditions {
    /// Plasma current (MA).
    pub ip: f64,
    /// Configured profiles on cell centres.
    pub t_i: Array1<f64>,
    pub t_e: Array1<f64>,
    pub n_e: Array1<f64>,
    pub t_i_right_bc: f64,
    pub t_e_right_bc: f64,
    pub n_e_right_bc: f64,
    pub n_e_right_bc_is_fgw: bool,
    /// True when the density edge value was read off the profile.
    pub n_e_right_bc_from_profile: bool,
    pub nbar: f64,
    pub n_e_nbar_is_fgw: bool,
    pub normalize_n_e_to_nbar: bool,
    pub current_profile_nu: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicNumerics {
    pub t_initial: f64,
    pub t_final: f64,
    pub exact_t_final: bool,
    pub max_dt: f64,
    pub min_dt: f64,
    pub chi_timestep_prefactor: f64,
    pub fixed_dt: f64,
    pub adaptive_dt: bool,
    pub dt_reduction_factor: f64,
    pub resistivity_multiplier: f64,
    pub adaptive_t_source_prefactor: f64,
    pub adaptive_n_source_prefactor: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicPlasmaComposition {
    pub main_ion_a: f64,
    pub main_ion_z: f64,
    pub z_eff: f64,
    pub z_impurity: f64,
    /// n_i / n_e from quasineutrality with one impurity species.
    pub dilution: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicGenericHeat {
    pub gaussian_location: f64,
    pub gaussian_width: f64,
    pub p_total: f64,
    pub electron_heat_fraction: f64,
    pub prescribed: Option<Array1<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicGenericParticle {
    pub deposition_location: f64,
    pub particle_width: f64,
    pub s_total: f64,
    pub prescribed: Option<Array1<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicGasPuff {
    pub puff_decay_length: f64,
    pub s_total: f64,
    pub prescribed: Option<Array1<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicGenericCurrent {
    pub gaussian_location: f64,
    pub gaussian_width: f64,
    pub i_generic: f64,
    pub prescribed: Option<Array1<f64>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DynamicSources {
    pub generic_heat: Option<DynamicGenericHeat>,
    pub generic_particle: Option<DynamicGenericParticle>,
    pub gas_puff: Option<DynamicGasPuff>,
    pub generic_current: Option<DynamicGenericCurrent>,
    pub qei_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DynamicTransportModel {
    Constant {
        chi_i: f64,
        chi_e: f64,
        d_e: f64,
        v_e: f64,
    },
    CriticalGradient {
        chi_base: f64,
        chi_stiff: f64,
        r_ln_t_crit: f64,
        d_e_over_chi: f64,
        v_e: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicTransport {
    pub model: DynamicTransportModel,
    pub chi_min: f64,
    pub chi_max: f64,
    pub d_e_min: f64,
    pub d_e_max: f64,
    pub v_e_min: f64,
    pub v_e_max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DynamicPedestalModel {
    SetTpedNped { rho_norm_ped_top: f64 },
    EpedScaling { beta_p_ped: f64, rho_s: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicPedestal {
    pub set_pedestal: bool,
    pub model: DynamicPedestalModel,
    pub t_i_ped: f64,
    pub t_e_ped: f64,
    pub n_e_ped: f64,
    pub n_e_ped_is_fgw: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicSolverParams {
    pub chi_pereverzev: f64,
    pub d_pereverzev: f64,
    pub n_max_iterations: usize,
    pub residual_tol: f64,
    pub residual_coarse_tol: f64,
    pub delta_reduction_factor: f64,
    pub tau_min: f64,
}

/// Every numeric parameter resolved at time `t`.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicRuntimeParamsSlice {
    pub t: f64,
    pub profile_conditions: DynamicProfileConditions,
    pub numerics: DynamicNumerics,
    pub plasma_composition: DynamicPlasmaComposition,
    pub sources: DynamicSources,
    pub transport: DynamicTransport,
    pub pedestal: DynamicPedestal,
    pub solver: DynamicSolverParams,
    pub conductivity: ConductivityConfig,
}

fn edge_value(
    right_bc: Option<&InterpolatedVar1d>,
    profile: &InterpolatedVar2d,
    t: f64,
    name: &str,
) -> FusionResult<(f64, bool)> {
    if let Some(bc) = right_bc {
        return Ok((bc.get_scalar(t), false));
    }
    if !profile.right_boundary_defined() {
        return Err(FusionError::ConfigError(format!(
            "right boundary condition not specified for {name}"
        )));
    }
    Ok((profile.get_value(t, &array![1.0])[0], true))
}

pub(crate) fn dilution_factor(z_i: f64, z_eff: f64, z_imp: f64) -> FusionResult<f64> {
    if (z_imp - z_i).abs() < 1e-12 {
        return Err(FusionError::PhysicsViolation(format!(
            "impurity charge {z_imp} equals main ion charge"
        )));
    }
    let dilution = (z_imp - z_eff) / (z_i * (z_imp - z_i));
    if !(dilution > 0.0 && dilution <= 1.0 / z_i + 1e-12) {
        return Err(FusionError::PhysicsViolation(format!(
            "Z_eff={z_eff} with Z_imp={z_imp} gives dilution {dilution}"
        )));
    }
    Ok(dilution)
}

fn prescribed(profile: Option<&InterpolatedVar2d>, t: f64, cells: &Array1<f64>) -> Option<Array1<f64>> {
    profile.map(|p| p.get_value(t, cells))
}

/// Resolve every schedule of `config` at time `t`. Pure: equal inputs give
/// bit-identical slices.
pub fn build_dynamic_params(
    config: &SimulationConfig,
    t: f64,
) -> FusionResult<DynamicRuntimeParamsSlice> {
    let mesh = Grid1D::new(config.geometry.n_rho)?;
    let cells = &mesh.cell_centers;
    let pc = &config.profile_conditions;

    let (t_i_right_bc, _) = edge_value(pc.t_i_right_bc.as_ref(), &pc.t_i, t, "t_i")?;
    let (t_e_right_bc, _) = edge_value(pc.t_e_right_bc.as_ref(), &pc.t_e, t, "t_e")?;
    let (n_e_right_bc, n_e_right_bc_from_profile) =
        edge_value(pc.n_e_right_bc.as_ref(), &pc.n_e, t, "n_e")?;

    let profile_conditions = DynamicProfileConditions {
        ip: pc.ip.get_scalar(t),
        t_i: pc.t_i.get_value(t, cells),
        t_e: pc.t_e.get_value(t, cells),
        n_e: pc.n_e.get_value(t, cells),
        t_i_right_bc,
        t_e_right_bc,
        n_e_right_bc,
        n_e_right_bc_is_fgw: pc.n_e_right_bc_is_fgw && !n_e_right_bc_from_profile,
        n_e_right_bc_from_profile,
        nbar: pc.nbar.get_scalar(t),
        n_e_nbar_is_fgw: pc.n_e_nbar_is_fgw,
        normalize_n_e_to_nbar: pc.normalize_n_e_to_nbar,
        current_profile_nu: pc.current_profile_nu,
    };

    let n = &config.numerics;
    let numerics = DynamicNumerics {
        t_initial: n.t_initial,
        t_final: n.t_final,
        exact_t_final: n.exact_t_final,
        max_dt: n.max_dt,
        min_dt: n.min_dt,
        chi_timestep_prefactor: n.chi_timestep_prefactor,
        fixed_dt: n.fixed_dt,
        adaptive_dt: n.adaptive_dt,
        dt_reduction_factor: n.dt_reduction_factor,
        resistivity_multiplier: n.resistivity_multiplier.get_scalar(t),
        adaptive_t_source_prefactor: n.adaptive_t_source_prefactor,
        adaptive_n_source_prefactor: n.adaptive_n_source_prefactor,
    };

    let comp = &config.plasma_composition;
    let z_eff = comp.z_eff.get_scalar(t);
    let z_impurity = comp.z_impurity.get_scalar(t);
    let plasma_composition = DynamicPlasmaComposition {
        main_ion_a: comp.main_ion_a,
        main_ion_z: comp.main_ion_z,
        z_eff,
        z_impurity,
        dilution: dilution_factor(comp.main_ion_z, z_eff, z_impurity)?,
    };

    let src = &config.sources;
    let sources = DynamicSources {
        generic_heat: src.generic_heat.as_ref().map(|c| DynamicGenericHeat {
            gaussian_location: c.gaussian_location.get_scalar(t),
            gaussian_width: c.gaussian_width.get_scalar(t),
            p_total: c.p_total.get_scalar(t),
            electron_heat_fraction: c.electron_heat_fraction.get_scalar(t),
            prescribed: prescribed(c.prescribed_values.as_ref(), t, cells),
        }),
        generic_particle: src.generic_particle.as_ref().map(|c| DynamicGenericParticle {
            deposition_location: c.deposition_location.get_scalar(t),
            particle_width: c.particle_width.get_scalar(t),
            s_total: c.s_total.get_scalar(t),
            prescribed: prescribed(c.prescribed_values.as_ref(), t, cells),
        }),
        gas_puff: src.gas_puff.as_ref().map(|c| DynamicGasPuff {
            puff_decay_length: c.puff_decay_length.get_scalar(t),
            s_total: c.s_total.get_scalar(t),
            prescribed: prescribed(c.prescribed_values.as_ref(), t, cells),
        }),
        generic_current: src.generic_current.as_ref().map(|c| DynamicGenericCurrent {
            gaussian_location: c.gaussian_location.get_scalar(t),
            gaussian_width: c.gaussian_width.get_scalar(t),
            i_generic: c.i_generic.get_scalar(t),
            prescribed: prescribed(c.prescribed_values.as_ref(), t, cells),
        }),
        qei_multiplier: src
            .ei_exchange
            .as_ref()
            .map_or(1.0, |c| c.qei_multiplier.get_scalar(t)),
    };

    let tr = &config.transport;
    let transport = DynamicTransport {
        model: match &tr.model {
            TransportModelConfig::Constant(c) => DynamicTransportModel::Constant {
                chi_i: c.chi_i.get_scalar(t),
                chi_e: c.chi_e.get_scalar(t),
                d_e: c.d_e.get_scalar(t),
                v_e: c.v_e.get_scalar(t),
            },
            TransportModelConfig::CriticalGradient(c) => DynamicTransportModel::CriticalGradient {
                chi_base: c.chi_base.get_scalar(t),
                chi_stiff: c.chi_stiff.get_scalar(t),
                r_ln_t_crit: c.r_ln_t_crit.get_scalar(t),
                d_e_over_chi: c.d_e_over_chi.get_scalar(t),
                v_e: c.v_e.get_scalar(t),
            },
        },
        chi_min: tr.chi_min,
        chi_max: tr.chi_max,
        d_e_min: tr.d_e_min,
        d_e_max: tr.d_e_max,
        v_e_min: tr.v_e_min,
        v_e_max: tr.v_e_max,
    };

    let pedestal = match &config.pedestal.model {
        PedestalModelConfig::SetTpedNped(c) => DynamicPedestal {
            set_pedestal: config.pedestal.set_pedestal,
            model: DynamicPedestalModel::SetTpedNped {
                rho_norm_ped_top: c.rho_norm_ped_top.get_scalar(t),
            },
            t_i_ped: c.t_i_ped.get_scalar(t),
            t_e_ped: c.t_e_ped.get_scalar(t),
            n_e_ped: c.n_e_ped.get_scalar(t),
            n_e_ped_is_fgw: c.n_e_ped_is_fgw,
        },
        PedestalModelConfig::EpedScaling(c) => DynamicPedestal {
            set_pedestal: config.pedestal.set_pedestal,
            model: DynamicPedestalModel::EpedScaling {
                beta_p_ped: c.beta_p_ped.get_scalar(t),
                rho_s: c.rho_s.get_scalar(t),
            },
            t_i_ped: c.t_i_ped.get_scalar(t),
            t_e_ped: c.t_e_ped.get_scalar(t),
            n_e_ped: c.n_e_ped.get_scalar(t),
            n_e_ped_is_fgw: c.n_e_ped_is_fgw,
        },
    };

    let s = &config.solver;
    let solver = DynamicSolverParams {
        chi_pereverzev: s.chi_pereverzev,
        d_pereverzev: s.d_pereverzev,
        n_max_iterations: s.n_max_iterations,
        residual_tol: s.residual_tol,
        residual_coarse_tol: s.residual_coarse_tol,
        delta_reduction_factor: s.delta_reduction_factor,
        tau_min: s.tau_min,
    };

    Ok(DynamicRuntimeParamsSlice {
        t,
        profile_conditions,
        numerics,
        plasma_composition,
        sources,
        transport,
        pedestal,
        solver,
        conductivity: config.neoclassical.conductivity.clone(),
    })
}
