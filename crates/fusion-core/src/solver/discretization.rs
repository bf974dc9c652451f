// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Finite-Volume Discretization
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Coefficients of the transport equations and their assembly into
//! `F(x) = A x + b` over the packed state vector.
//!
//! Every equation has the conservative form
//!
//!   tc dx/dt = d/drho (D dx/drho) - d/drho (V x) + S_mat x + S + sum_k C_k y_k
//!
//! with D and V on faces, the rest on cells. Cell i sees
//!   (D_{i+1}(x_{i+1} - x_i) - D_i(x_i - x_{i-1})) / dx^2
//! and the boundary faces take their values from the cell-variable
//! constraints (zero axis gradient, edge value or edge gradient).

use super::kernel::{cell_var, SolverKernel};
use crate::physics::PhysicsSnapshot;
use crate::runtime_params::{DynamicRuntimeParamsSlice, EvolvedVariable};
use fusion_types::constants::{DENSITY_REF, KEV_TO_J, MU0_SI};
use fusion_types::error::FusionResult;
use fusion_types::geometry::Geometry;
use fusion_types::state::{CellVariable, CoreProfiles, RightFaceConstraint};
use ndarray::{Array1, Array2};

/// Local coupling to another evolved equation, `coeff_i * y_i` in cell i.
#[derive(Debug, Clone)]
pub struct Coupling {
    pub partner: EvolvedVariable,
    pub coeff: Array1<f64>,
}

#[derive(Debug, Clone)]
pub struct EquationCoeffs {
    pub variable: EvolvedVariable,
    pub transient: Array1<f64>,
    pub d_face: Array1<f64>,
    pub v_face: Array1<f64>,
    pub source_mat: Array1<f64>,
    pub source: Array1<f64>,
    pub couplings: Vec<Coupling>,
}

impl EquationCoeffs {
    fn new(variable: EvolvedVariable, transient: Array1<f64>, d_face: Array1<f64>) -> Self {
        let nx = transient.len();
        EquationCoeffs {
            variable,
            transient,
            v_face: Array1::zeros(nx + 1),
            d_face,
            source_mat: Array1::zeros(nx),
            source: Array1::zeros(nx),
            couplings: Vec::new(),
        }
    }

    /// Pin cell `k` to `target` through a large implicit source.
    fn pin(&mut self, k: usize, strength: f64, target: f64) {
        self.source_mat[k] -= strength;
        self.source[k] += strength * target;
    }
}

/// Coefficients of all evolved equations plus the physics they came from.
#[derive(Debug, Clone)]
pub struct SystemCoeffs {
    pub equations: Vec<EquationCoeffs>,
    pub physics: PhysicsSnapshot,
}

impl SystemCoeffs {
    /// Packed transient coefficients.
    pub fn transient(&self) -> Array1<f64> {
        let parts: Vec<f64> = self
            .equations
            .iter()
            .flat_map(|eq| eq.transient.iter().copied())
            .collect();
        Array1::from(parts)
    }
}

/// Evaluate the physics at `profiles` and build every evolved equation.
pub fn calc_coeffs(
    kernel: &SolverKernel,
    dynamic: &DynamicRuntimeParamsSlice,
    geo: &Geometry,
    profiles: &CoreProfiles,
) -> FusionResult<SystemCoeffs> {
    let physics = kernel.physics().evaluate(dynamic, geo, profiles)?;
    let equations = kernel
        .evolved()
        .iter()
        .map(|var| match var {
            EvolvedVariable::IonTemperature | EvolvedVariable::ElectronTemperature => {
                heat_coeffs(kernel, *var, dynamic, geo, profiles, &physics)
            }
            EvolvedVariable::Psi => psi_coeffs(geo, &physics),
            EvolvedVariable::ElectronDensity => density_coeffs(dynamic, geo, &physics),
        })
        .collect();
    Ok(SystemCoeffs { equations, physics })
}

fn heat_coeffs(
    kernel: &SolverKernel,
    var: EvolvedVariable,
    dynamic: &DynamicRuntimeParamsSlice,
    geo: &Geometry,
    profiles: &CoreProfiles,
    physics: &PhysicsSnapshot,
) -> EquationCoeffs {
    let ion = var == EvolvedVariable::IonTemperature;
    let scale = DENSITY_REF * KEV_TO_J;
    let species = if ion { dynamic.plasma_composition.dilution } else { 1.0 };
    let n_cell = &profiles.n_e.value * species;
    let n_face = profiles.n_e.face_values() * species;
    let (chi, q, partner, partner_var) = if ion {
        (
            &physics.transport.chi_face_ion,
            &physics.sources.q_ion,
            EvolvedVariable::ElectronTemperature,
            &profiles.t_e,
        )
    } else {
        (
            &physics.transport.chi_face_el,
            &physics.sources.q_el,
            EvolvedVariable::IonTemperature,
            &profiles.t_i,
        )
    };

    let transient = &geo.vpr * &n_cell * (1.5 * scale);
    let d_face = &geo.g1_over_vpr_face * &n_face * chi * scale;
    let mut eq = EquationCoeffs::new(var, transient, d_face);
    eq.source = &geo.vpr * q;

    // Collisional exchange, implicit in this channel.
    let qei = &geo.vpr * &physics.sources.qei_coef;
    eq.source_mat = -&qei;
    if kernel.offset(partner).is_some() {
        eq.couplings.push(Coupling {
            partner,
            coeff: qei,
        });
    } else {
        eq.source = &eq.source + &(&qei * &partner_var.value);
    }

    if let Some(ped) = &physics.pedestal {
        let target = if ion { ped.t_i_ped } else { ped.t_e_ped };
        let strength = dynamic.numerics.adaptive_t_source_prefactor * scale;
        eq.pin(ped.top_cell(geo), strength, target);
    }
    eq
}

fn psi_coeffs(geo: &Geometry, physics: &PhysicsSnapshot) -> EquationCoeffs {
    let a2 = geo.a_minor * geo.a_minor;
    let rho = geo.rho_norm();
    let transient = &physics.conductivity * rho * (MU0_SI * a2);
    let mut eq = EquationCoeffs::new(EvolvedVariable::Psi, transient, geo.rho_face_norm().clone());
    eq.source = &physics.sources.j_external * rho * (-MU0_SI * geo.r_major * a2);
    eq
}

fn density_coeffs(
    dynamic: &DynamicRuntimeParamsSlice,
    geo: &Geometry,
    physics: &PhysicsSnapshot,
) -> EquationCoeffs {
    let transient = geo.vpr.clone();
    let d_face = &geo.g1_over_vpr_face * &physics.transport.d_face_el;
    let mut eq = EquationCoeffs::new(EvolvedVariable::ElectronDensity, transient, d_face);
    eq.v_face = &geo.vpr_face * &physics.transport.v_face_el / geo.a_minor;
    eq.source = &geo.vpr * &physics.sources.s_particle;
    if let Some(ped) = &physics.pedestal {
        eq.pin(ped.top_cell(geo), dynamic.numerics.adaptive_n_source_prefactor, ped.n_e_ped);
    }
    eq
}

/// Diffusion and convection of one block into `a` and `b`.
fn add_transport_block(
    a: &mut Array2<f64>,
    b: &mut Array1<f64>,
    o: usize,
    d: &Array1<f64>,
    v: &Array1<f64>,
    var: &CellVariable,
) {
    let n = var.nx();
    let dx = var.dr;
    let dx2 = dx * dx;
    let last = o + n - 1;
    let g_left = var.left_face_grad_constraint;

    for j in 1..n {
        let c = d[j] / dx2;
        let (l, r) = (o + j - 1, o + j);
        a[[l, l]] -= c;
        a[[l, r]] += c;
        a[[r, r]] -= c;
        a[[r, l]] += c;

        let w = v[j] / (2.0 * dx);
        a[[l, l]] -= w;
        a[[l, r]] -= w;
        a[[r, l]] += w;
        a[[r, r]] += w;
    }

    // axis face: gradient constraint, face value x_0 - g dx / 2
    b[o] -= d[0] * g_left / dx;
    a[[o, o]] += v[0] / dx;
    b[o] -= v[0] * g_left / 2.0;

    match var.right_face {
        RightFaceConstraint::Value(c) => {
            a[[last, last]] -= 2.0 * d[n] / dx2;
            b[last] += 2.0 * d[n] * c / dx2;
            b[last] -= v[n] * c / dx;
        }
        RightFaceConstraint::Gradient(g) => {
            b[last] += d[n] * g / dx;
            a[[last, last]] -= v[n] / dx;
            b[last] -= v[n] * g / 2.0;
        }
    }
}

/// `F(x) = A x + b` for the coefficients, with boundary constraints taken
/// from `profiles`.
pub fn assemble(kernel: &SolverKernel, coeffs: &SystemCoeffs, profiles: &CoreProfiles) -> (Array2<f64>, Array1<f64>) {
    let size = kernel.size();
    let nx = kernel.nx();
    let mut a = Array2::zeros((size, size));
    let mut b = Array1::zeros(size);
    for (k, eq) in coeffs.equations.iter().enumerate() {
        let o = k * nx;
        add_transport_block(&mut a, &mut b, o, &eq.d_face, &eq.v_face, cell_var(profiles, eq.variable));
        for i in 0..nx {
            a[[o + i, o + i]] += eq.source_mat[i];
            b[o + i] += eq.source[i];
        }
        for coupling in &eq.couplings {
            if let Some(p) = kernel.offset(coupling.partner) {
                for i in 0..nx {
                    a[[o + i, p + i]] += coupling.coeff[i];
                }
            }
        }
    }
    (a, b)
}

/// Pereverzev-Corrigan operator: extra diffusion on the heat and density
/// channels, zero outside the pedestal top. Added implicitly and subtracted
/// explicitly at the guess, so it cancels at convergence.
pub fn pereverzev_operator(
    kernel: &SolverKernel,
    coeffs: &SystemCoeffs,
    dynamic: &DynamicRuntimeParamsSlice,
    geo: &Geometry,
    profiles: &CoreProfiles,
) -> Array2<f64> {
    let size = kernel.size();
    let nx = kernel.nx();
    let mut a = Array2::zeros((size, size));
    let mut scratch = Array1::zeros(size);
    let zero_v = Array1::zeros(nx + 1);
    let rho_top = coeffs.physics.pedestal.map(|p| p.rho_norm_ped_top);

    for (k, eq) in coeffs.equations.iter().enumerate() {
        let mut d = match eq.variable {
            EvolvedVariable::Psi => continue,
            EvolvedVariable::IonTemperature => {
                profiles.n_e.face_values()
                    * (dynamic.plasma_composition.dilution
                        * dynamic.solver.chi_pereverzev
                        * DENSITY_REF
                        * KEV_TO_J)
            }
            EvolvedVariable::ElectronTemperature => {
                profiles.n_e.face_values() * (dynamic.solver.chi_pereverzev * DENSITY_REF * KEV_TO_J)
            }
            EvolvedVariable::ElectronDensity => Array1::from_elem(nx + 1, dynamic.solver.d_pereverzev),
        };
        d = d * &geo.g1_over_vpr_face;
        if let Some(top) = rho_top {
            for (j, rho) in geo.rho_face_norm().iter().enumerate() {
                if *rho > top {
                    d[j] = 0.0;
                }
            }
        }
        add_transport_block(&mut a, &mut scratch, k * nx, &d, &zero_v, cell_var(profiles, eq.variable));
    }
    a
}
