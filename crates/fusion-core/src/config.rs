// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Simulation configuration.
//!
//! Nested JSON mapping; every section and field has a default so `{}` is a
//! valid configuration. Time-varying fields are validated schedules, so a
//! malformed schedule fails at parse time. Cross-field rules are checked by
//! [`SimulationConfig::validate`].

use crate::interpolated_param::{InterpolatedVar1d, InterpolatedVar2d};
use crate::runtime_params::dilution_factor;
use fusion_types::error::{FusionError, FusionResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn tv(value: f64) -> InterpolatedVar1d {
    InterpolatedVar1d::constant(value)
}

/// Sorted union of the anchor times of `vars`.
fn joint_anchor_times(vars: &[&InterpolatedVar1d]) -> Vec<f64> {
    let mut times: Vec<f64> = vars.iter().flat_map(|v| v.times().iter().copied()).collect();
    times.sort_by(f64::total_cmp);
    times.dedup();
    times
}

fn peaked_profile(core: f64, edge: f64) -> InterpolatedVar2d {
    // Both anchors are finite and rho_norm is increasing, so this cannot fail;
    // fall back to a flat profile regardless.
    InterpolatedVar2d::profile(vec![0.0, 1.0], vec![core, edge])
        .unwrap_or_else(|_| InterpolatedVar2d::constant(core))
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub geometry: GeometryConfig,
    pub profile_conditions: ProfileConditionsConfig,
    pub numerics: NumericsConfig,
    pub plasma_composition: PlasmaCompositionConfig,
    pub sources: SourcesConfig,
    pub transport: TransportConfig,
    pub solver: SolverConfig,
    pub pedestal: PedestalConfig,
    pub neoclassical: NeoclassicalConfig,
    pub time_step_calculator: TimeStepCalculatorConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart: Option<RestartConfig>,
}

// ── Geometry ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub n_rho: usize,
    pub r_major: f64,
    pub a_minor: f64,
    pub b_0: f64,
    pub elongation_lcfs: f64,
    /// Equilibrium plasma current (MA).
    pub ip_geometry: f64,
    /// When true the configured Ip is authoritative; otherwise the
    /// equilibrium's enclosed current is.
    pub ip_from_parameters: bool,
    /// Time series of equilibria; unset fields fall back to the values above.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_series: Option<Vec<GeometrySnapshotConfig>>,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        GeometryConfig {
            n_rho: 25,
            r_major: 6.2,
            a_minor: 2.0,
            b_0: 5.3,
            elongation_lcfs: 1.72,
            ip_geometry: 15.0,
            ip_from_parameters: true,
            time_series: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometrySnapshotConfig {
    pub time: f64,
    #[serde(default)]
    pub r_major: Option<f64>,
    #[serde(default)]
    pub a_minor: Option<f64>,
    #[serde(default)]
    pub b_0: Option<f64>,
    #[serde(default)]
    pub elongation_lcfs: Option<f64>,
    #[serde(default)]
    pub ip_geometry: Option<f64>,
}

// ── Profile conditions ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConditionsConfig {
    /// Total plasma current (MA).
    pub ip: InterpolatedVar1d,
    /// Ion temperature profile (keV).
    pub t_i: InterpolatedVar2d,
    pub t_e: InterpolatedVar2d,
    /// Electron density profile (1e20 m^-3), or its shape when normalized.
    pub n_e: InterpolatedVar2d,
    /// Edge values; when absent the profile value at rho_norm = 1 is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t_i_right_bc: Option<InterpolatedVar1d>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t_e_right_bc: Option<InterpolatedVar1d>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_e_right_bc: Option<InterpolatedVar1d>,
    pub n_e_right_bc_is_fgw: bool,
    /// Line-averaged density target.
    pub nbar: InterpolatedVar1d,
    pub n_e_nbar_is_fgw: bool,
    pub normalize_n_e_to_nbar: bool,
    /// Peaking exponent of the initial current profile j ~ (1 - rho^2)^nu.
    pub current_profile_nu: f64,
}

impl Default for ProfileConditionsConfig {
    fn default() -> Self {
        ProfileConditionsConfig {
            ip: tv(15.0),
            t_i: peaked_profile(15.0, 1.0),
            t_e: peaked_profile(15.0, 1.0),
            n_e: peaked_profile(1.5, 1.0),
            t_i_right_bc: None,
            t_e_right_bc: None,
            n_e_right_bc: None,
            n_e_right_bc_is_fgw: false,
            nbar: tv(0.85),
            n_e_nbar_is_fgw: true,
            normalize_n_e_to_nbar: true,
            current_profile_nu: 3.0,
        }
    }
}

// ── Numerics ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumericsConfig {
    pub t_initial: f64,
    pub t_final: f64,
    /// Clip the last step so the run lands exactly on `t_final`.
    pub exact_t_final: bool,
    pub max_dt: f64,
    pub min_dt: f64,
    /// Safety multiplier of the chi-based timestep.
    pub chi_timestep_prefactor: f64,
    pub fixed_dt: f64,
    pub adaptive_dt: bool,
    pub dt_reduction_factor: f64,
    pub evolve_ion_heat: bool,
    pub evolve_electron_heat: bool,
    pub evolve_current: bool,
    pub evolve_density: bool,
    /// Divides the conductivity, speeding up current diffusion.
    pub resistivity_multiplier: InterpolatedVar1d,
    /// Strength of the pedestal internal boundary condition for T and n.
    pub adaptive_t_source_prefactor: f64,
    pub adaptive_n_source_prefactor: f64,
}

impl Default for NumericsConfig {
    fn default() -> Self {
        NumericsConfig {
            t_initial: 0.0,
            t_final: 5.0,
            exact_t_final: false,
            max_dt: 1e-1,
            min_dt: 1e-8,
            chi_timestep_prefactor: 9.0,
            fixed_dt: 1e-2,
            adaptive_dt: true,
            dt_reduction_factor: 3.0,
            evolve_ion_heat: true,
            evolve_electron_heat: true,
            evolve_current: false,
            evolve_density: false,
            resistivity_multiplier: tv(1.0),
            adaptive_t_source_prefactor: 2e10,
            adaptive_n_source_prefactor: 2e8,
        }
    }
}

// ── Plasma composition ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlasmaCompositionConfig {
    /// Main ion mass number.
    pub main_ion_a: f64,
    pub main_ion_z: f64,
    pub z_eff: InterpolatedVar1d,
    pub z_impurity: InterpolatedVar1d,
}

impl Default for PlasmaCompositionConfig {
    fn default() -> Self {
        PlasmaCompositionConfig {
            main_ion_a: 2.5,
            main_ion_z: 1.0,
            z_eff: tv(1.0),
            z_impurity: tv(10.0),
        }
    }
}

// ── Sources ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    #[default]
    Zero,
    ModelBased,
    Prescribed,
}

/// Absent sources contribute nothing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generic_heat: Option<GenericHeatConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generic_particle: Option<GenericParticleConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_puff: Option<GasPuffConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generic_current: Option<GenericCurrentConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ei_exchange: Option<EiExchangeConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericHeatConfig {
    pub mode: SourceMode,
    pub gaussian_location: InterpolatedVar1d,
    pub gaussian_width: InterpolatedVar1d,
    /// Total injected power (W).
    pub p_total: InterpolatedVar1d,
    pub electron_heat_fraction: InterpolatedVar1d,
    /// Total heating density (W/m^3) when `mode` is prescribed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prescribed_values: Option<InterpolatedVar2d>,
}

impl Default for GenericHeatConfig {
    fn default() -> Self {
        GenericHeatConfig {
            mode: SourceMode::ModelBased,
            gaussian_location: tv(0.0),
            gaussian_width: tv(0.25),
            p_total: tv(120e6),
            electron_heat_fraction: tv(0.66666),
            prescribed_values: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericParticleConfig {
    pub mode: SourceMode,
    pub deposition_location: InterpolatedVar1d,
    pub particle_width: InterpolatedVar1d,
    /// Total particle rate (particles/s).
    pub s_total: InterpolatedVar1d,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prescribed_values: Option<InterpolatedVar2d>,
}

impl Default for GenericParticleConfig {
    fn default() -> Self {
        GenericParticleConfig {
            mode: SourceMode::ModelBased,
            deposition_location: tv(0.0),
            particle_width: tv(0.25),
            s_total: tv(2.05e20),
            prescribed_values: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasPuffConfig {
    pub mode: SourceMode,
    /// e-folding length of the edge deposition, in rho_norm.
    pub puff_decay_length: InterpolatedVar1d,
    pub s_total: InterpolatedVar1d,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prescribed_values: Option<InterpolatedVar2d>,
}

impl Default for GasPuffConfig {
    fn default() -> Self {
        GasPuffConfig {
            mode: SourceMode::ModelBased,
            puff_decay_length: tv(0.05),
            s_total: tv(1e22),
            prescribed_values: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericCurrentConfig {
    pub mode: SourceMode,
    pub gaussian_location: InterpolatedVar1d,
    pub gaussian_width: InterpolatedVar1d,
    /// Total driven current (A).
    pub i_generic: InterpolatedVar1d,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prescribed_values: Option<InterpolatedVar2d>,
}

impl Default for GenericCurrentConfig {
    fn default() -> Self {
        GenericCurrentConfig {
            mode: SourceMode::ModelBased,
            gaussian_location: tv(0.4),
            gaussian_width: tv(0.05),
            i_generic: tv(3.0e6),
            prescribed_values: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EiExchangeConfig {
    pub mode: SourceMode,
    pub qei_multiplier: InterpolatedVar1d,
}

impl Default for EiExchangeConfig {
    fn default() -> Self {
        EiExchangeConfig {
            mode: SourceMode::ModelBased,
            qei_multiplier: tv(1.0),
        }
    }
}

// ── Transport ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub model: TransportModelConfig,
    pub chi_min: f64,
    pub chi_max: f64,
    pub d_e_min: f64,
    pub d_e_max: f64,
    pub v_e_min: f64,
    pub v_e_max: f64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            model: TransportModelConfig::default(),
            chi_min: 0.05,
            chi_max: 100.0,
            d_e_min: 0.05,
            d_e_max: 100.0,
            v_e_min: -50.0,
            v_e_max: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model_name", rename_all = "snake_case")]
pub enum TransportModelConfig {
    Constant(ConstantTransportConfig),
    CriticalGradient(CriticalGradientConfig),
}

impl Default for TransportModelConfig {
    fn default() -> Self {
        TransportModelConfig::Constant(ConstantTransportConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstantTransportConfig {
    pub chi_i: InterpolatedVar1d,
    pub chi_e: InterpolatedVar1d,
    pub d_e: InterpolatedVar1d,
    pub v_e: InterpolatedVar1d,
}

impl Default for ConstantTransportConfig {
    fn default() -> Self {
        ConstantTransportConfig {
            chi_i: tv(1.0),
            chi_e: tv(1.0),
            d_e: tv(1.0),
            v_e: tv(-0.33),
        }
    }
}

/// chi = chi_base + chi_stiff * max(0, R/L_T - R/L_T,crit)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriticalGradientConfig {
    pub chi_base: InterpolatedVar1d,
    pub chi_stiff: InterpolatedVar1d,
    pub r_ln_t_crit: InterpolatedVar1d,
    /// Particle diffusivity as a fraction of the electron heat diffusivity.
    pub d_e_over_chi: InterpolatedVar1d,
    pub v_e: InterpolatedVar1d,
}

impl Default for CriticalGradientConfig {
    fn default() -> Self {
        CriticalGradientConfig {
            chi_base: tv(0.5),
            chi_stiff: tv(2.0),
            r_ln_t_crit: tv(5.0),
            d_e_over_chi: tv(0.5),
            v_e: tv(0.0),
        }
    }
}

// ── Solver ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverType {
    #[default]
    Linear,
    NewtonRaphson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialGuessMode {
    XOld,
    #[default]
    Linear,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub solver_type: SolverType,
    pub theta_implicit: f64,
    pub use_predictor_corrector: bool,
    pub n_corrector_steps: usize,
    pub use_pereverzev: bool,
    pub chi_pereverzev: f64,
    pub d_pereverzev: f64,
    pub log_iterations: bool,
    pub initial_guess_mode: InitialGuessMode,
    pub n_max_iterations: usize,
    pub residual_tol: f64,
    pub residual_coarse_tol: f64,
    pub delta_reduction_factor: f64,
    pub tau_min: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            solver_type: SolverType::Linear,
            theta_implicit: 1.0,
            use_predictor_corrector: false,
            n_corrector_steps: 10,
            use_pereverzev: false,
            chi_pereverzev: 30.0,
            d_pereverzev: 15.0,
            log_iterations: false,
            initial_guess_mode: InitialGuessMode::Linear,
            n_max_iterations: 30,
            residual_tol: 1e-5,
            residual_coarse_tol: 1e-2,
            delta_reduction_factor: 0.5,
            tau_min: 0.01,
        }
    }
}

// ── Pedestal ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PedestalConfig {
    pub set_pedestal: bool,
    pub model: PedestalModelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model_name", rename_all = "snake_case")]
pub enum PedestalModelConfig {
    SetTpedNped(SetTpedNpedConfig),
    EpedScaling(EpedScalingConfig),
}

impl Default for PedestalModelConfig {
    fn default() -> Self {
        PedestalModelConfig::SetTpedNped(SetTpedNpedConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetTpedNpedConfig {
    pub t_i_ped: InterpolatedVar1d,
    pub t_e_ped: InterpolatedVar1d,
    pub n_e_ped: InterpolatedVar1d,
    pub n_e_ped_is_fgw: bool,
    pub rho_norm_ped_top: InterpolatedVar1d,
}

impl Default for SetTpedNpedConfig {
    fn default() -> Self {
        SetTpedNpedConfig {
            t_i_ped: tv(5.0),
            t_e_ped: tv(5.0),
            n_e_ped: tv(0.7),
            n_e_ped_is_fgw: false,
            rho_norm_ped_top: tv(0.91),
        }
    }
}

/// Pedestal width from the EPED-like scaling Delta = sqrt(beta_p,ped) * rho_s / R.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpedScalingConfig {
    pub beta_p_ped: InterpolatedVar1d,
    /// Ion sound gyroradius (m).
    pub rho_s: InterpolatedVar1d,
    pub t_i_ped: InterpolatedVar1d,
    pub t_e_ped: InterpolatedVar1d,
    pub n_e_ped: InterpolatedVar1d,
    pub n_e_ped_is_fgw: bool,
}

impl Default for EpedScalingConfig {
    fn default() -> Self {
        EpedScalingConfig {
            beta_p_ped: tv(0.35),
            rho_s: tv(2.0e-3),
            t_i_ped: tv(5.0),
            t_e_ped: tv(5.0),
            n_e_ped: tv(0.7),
            n_e_ped_is_fgw: false,
        }
    }
}

// ── Neoclassical ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NeoclassicalConfig {
    pub conductivity: ConductivityConfig,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "model_name", rename_all = "snake_case")]
pub enum ConductivityConfig {
    #[default]
    Spitzer,
    Constant {
        /// S/m
        sigma: f64,
    },
}

// ── Time stepping / restart ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeStepCalculatorType {
    Fixed,
    #[default]
    Chi,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeStepCalculatorConfig {
    pub calculator_type: TimeStepCalculatorType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestartConfig {
    #[serde(default)]
    pub do_restart: bool,
    pub filename: String,
}

// ── Loading and validation ───────────────────────────────────────────

impl SimulationConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> FusionResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(json: &str) -> FusionResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Cross-field checks that single-field deserialization cannot express.
    pub fn validate(&self) -> FusionResult<()> {
        self.validate_numerics()?;
        self.validate_profile_conditions()?;
        self.validate_sources()?;
        self.validate_solver()?;
        self.validate_transport()?;
        self.validate_plasma_composition()?;
        self.validate_pedestal()?;
        if self.geometry.n_rho < fusion_types::state::MIN_CELLS {
            return Err(FusionError::ConfigError(format!(
                "geometry.n_rho must be >= {}, got {}",
                fusion_types::state::MIN_CELLS,
                self.geometry.n_rho
            )));
        }
        if let ConductivityConfig::Constant { sigma } = self.neoclassical.conductivity {
            if !(sigma > 0.0 && sigma.is_finite()) {
                return Err(FusionError::ConfigError(format!(
                    "constant conductivity must be > 0, got {sigma}"
                )));
            }
        }
        Ok(())
    }

    fn validate_numerics(&self) -> FusionResult<()> {
        let n = &self.numerics;
        if !(n.t_final > n.t_initial) {
            return Err(FusionError::ConfigError(format!(
                "t_final ({}) must be greater than t_initial ({})",
                n.t_final, n.t_initial
            )));
        }
        if !(n.min_dt > 0.0) || !(n.max_dt >= n.min_dt) {
            return Err(FusionError::ConfigError(format!(
                "need 0 < min_dt <= max_dt, got min_dt={}, max_dt={}",
                n.min_dt, n.max_dt
            )));
        }
        if !(n.fixed_dt > 0.0) || !(n.chi_timestep_prefactor > 0.0) {
            return Err(FusionError::ConfigError(format!(
                "fixed_dt ({}) and chi_timestep_prefactor ({}) must be > 0",
                n.fixed_dt, n.chi_timestep_prefactor
            )));
        }
        if !(n.dt_reduction_factor > 1.0) {
            return Err(FusionError::ConfigError(format!(
                "dt_reduction_factor must be > 1, got {}",
                n.dt_reduction_factor
            )));
        }
        if !(n.evolve_ion_heat || n.evolve_electron_heat || n.evolve_current || n.evolve_density) {
            return Err(FusionError::ConfigError(
                "at least one equation must be evolved".to_string(),
            ));
        }
        if !n.resistivity_multiplier.all_positive() {
            return Err(FusionError::ConfigError(
                "resistivity_multiplier must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_profile_conditions(&self) -> FusionResult<()> {
        let pc = &self.profile_conditions;
        let channels = [
            ("t_i", &pc.t_i, &pc.t_i_right_bc),
            ("t_e", &pc.t_e, &pc.t_e_right_bc),
            ("n_e", &pc.n_e, &pc.n_e_right_bc),
        ];
        for (name, profile, right_bc) in channels {
            match right_bc {
                Some(bc) if !bc.all_positive() => {
                    return Err(FusionError::ConfigError(format!(
                        "{name}_right_bc must be > 0"
                    )));
                }
                Some(_) => {}
                None if !profile.right_boundary_defined() => {
                    return Err(FusionError::ConfigError(format!(
                        "right boundary condition not specified for {name}: set {name}_right_bc \
                         or give the profile a value at rho_norm = 1"
                    )));
                }
                None => {}
            }
            if !profile.all_positive() {
                return Err(FusionError::ConfigError(format!(
                    "{name} profile must be > 0"
                )));
            }
        }
        if !pc.ip.all_positive() {
            return Err(FusionError::ConfigError("ip must be > 0".to_string()));
        }
        if !pc.nbar.all_positive() {
            return Err(FusionError::ConfigError("nbar must be > 0".to_string()));
        }
        if !(pc.current_profile_nu >= 0.0) {
            return Err(FusionError::ConfigError(format!(
                "current_profile_nu must be >= 0, got {}",
                pc.current_profile_nu
            )));
        }
        Ok(())
    }

    fn validate_sources(&self) -> FusionResult<()> {
        let s = &self.sources;
        let prescribed = [
            ("generic_heat", s.generic_heat.as_ref().map(|c| (c.mode, c.prescribed_values.is_some()))),
            ("generic_particle", s.generic_particle.as_ref().map(|c| (c.mode, c.prescribed_values.is_some()))),
            ("gas_puff", s.gas_puff.as_ref().map(|c| (c.mode, c.prescribed_values.is_some()))),
            ("generic_current", s.generic_current.as_ref().map(|c| (c.mode, c.prescribed_values.is_some()))),
        ];
        for (name, entry) in prescribed {
            if let Some((SourceMode::Prescribed, false)) = entry {
                return Err(FusionError::ConfigError(format!(
                    "source {name} is prescribed but has no prescribed_values"
                )));
            }
        }
        if let Some(ei) = &s.ei_exchange {
            if ei.mode == SourceMode::Prescribed {
                return Err(FusionError::ConfigError(
                    "ei_exchange cannot be prescribed; use model_based or zero".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn validate_solver(&self) -> FusionResult<()> {
        let s = &self.solver;
        if !(0.0..=1.0).contains(&s.theta_implicit) {
            return Err(FusionError::ConfigError(format!(
                "theta_implicit must lie in [0, 1], got {}",
                s.theta_implicit
            )));
        }
        if !(s.residual_tol > 0.0) || !(s.residual_coarse_tol >= s.residual_tol) {
            return Err(FusionError::ConfigError(format!(
                "need 0 < residual_tol <= residual_coarse_tol, got {} and {}",
                s.residual_tol, s.residual_coarse_tol
            )));
        }
        if !(s.delta_reduction_factor > 0.0 && s.delta_reduction_factor < 1.0) {
            return Err(FusionError::ConfigError(format!(
                "delta_reduction_factor must lie in (0, 1), got {}",
                s.delta_reduction_factor
            )));
        }
        if !(s.tau_min > 0.0 && s.tau_min <= 1.0) {
            return Err(FusionError::ConfigError(format!(
                "tau_min must lie in (0, 1], got {}",
                s.tau_min
            )));
        }
        if s.n_max_iterations == 0 {
            return Err(FusionError::ConfigError(
                "n_max_iterations must be >= 1".to_string(),
            ));
        }
        if s.use_pereverzev && (s.chi_pereverzev < 0.0 || s.d_pereverzev < 0.0) {
            return Err(FusionError::ConfigError(
                "Pereverzev coefficients must be >= 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Quasineutral dilution at every anchor of Z_eff and Z_imp. Between
    /// anchors both schedules are linear or constant, and with the sign of
    /// Z_imp - Z_i fixed the admissible region is convex, so the anchors
    /// cover every time of the run.
    fn validate_plasma_composition(&self) -> FusionResult<()> {
        let pc = &self.plasma_composition;
        if pc.main_ion_a <= 0.0 || pc.main_ion_z <= 0.0 {
            return Err(FusionError::ConfigError(format!(
                "main ion A and Z must be > 0, got A={}, Z={}",
                pc.main_ion_a, pc.main_ion_z
            )));
        }
        let mut impurity_above: Option<bool> = None;
        for t in joint_anchor_times(&[&pc.z_eff, &pc.z_impurity]) {
            let z_eff = pc.z_eff.get_scalar(t);
            let z_imp = pc.z_impurity.get_scalar(t);
            dilution_factor(pc.main_ion_z, z_eff, z_imp).map_err(|e| {
                FusionError::ConfigError(format!("plasma_composition at t={t}: {e}"))
            })?;
            let above = z_imp > pc.main_ion_z;
            if *impurity_above.get_or_insert(above) != above {
                return Err(FusionError::ConfigError(format!(
                    "z_impurity crosses the main ion charge {} before t={t}",
                    pc.main_ion_z
                )));
            }
        }
        Ok(())
    }

    /// A prescribed pedestal top must sit inside (0, 1) at every anchor;
    /// interpolation between anchors stays inside the same interval.
    fn validate_pedestal(&self) -> FusionResult<()> {
        if !self.pedestal.set_pedestal {
            return Ok(());
        }
        if let PedestalModelConfig::SetTpedNped(ped) = &self.pedestal.model {
            for t in joint_anchor_times(&[&ped.rho_norm_ped_top]) {
                let top = ped.rho_norm_ped_top.get_scalar(t);
                if !(top > 0.0 && top < 1.0) {
                    return Err(FusionError::ConfigError(format!(
                        "rho_norm_ped_top must lie inside (0, 1), got {top} at t={t}"
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_transport(&self) -> FusionResult<()> {
        let t = &self.transport;
        if !(t.chi_min > 0.0 && t.chi_max >= t.chi_min) {
            return Err(FusionError::ConfigError(format!(
                "need 0 < chi_min <= chi_max, got {} and {}",
                t.chi_min, t.chi_max
            )));
        }
        if !(t.d_e_min > 0.0 && t.d_e_max >= t.d_e_min) || !(t.v_e_max >= t.v_e_min) {
            return Err(FusionError::ConfigError(
                "particle transport bounds are inconsistent".to_string(),
            ));
        }
        Ok(())
    }
}
