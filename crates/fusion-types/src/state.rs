// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Radial mesh, cell variables and the per-timestep simulation state.

use crate::error::{FusionError, FusionResult};
use crate::geometry::Geometry;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Smallest mesh accepted by the transport discretization.
pub const MIN_CELLS: usize = 4;

/// Uniform 1-D mesh on the normalized toroidal flux coordinate rho_norm in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid1D {
    pub nx: usize,
    pub dx: f64,
    pub cell_centers: Array1<f64>, // [nx]
    pub face_centers: Array1<f64>, // [nx + 1]
}

impl Grid1D {
    pub fn new(nx: usize) -> FusionResult<Self> {
        if nx < MIN_CELLS {
            return Err(FusionError::ConfigError(format!(
                "mesh needs at least {MIN_CELLS} cells, got {nx}"
            )));
        }
        let dx = 1.0 / nx as f64;
        let face_centers = Array1::linspace(0.0, 1.0, nx + 1);
        let cell_centers = Array1::from_iter((0..nx).map(|i| (i as f64 + 0.5) * dx));
        Ok(Grid1D {
            nx,
            dx,
            cell_centers,
            face_centers,
        })
    }
}

/// Constraint imposed on the right (rho_norm = 1) face of a cell variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RightFaceConstraint {
    Value(f64),
    Gradient(f64),
}

/// Cell-centred profile with its boundary constraints.
///
/// The left (axis) face always carries a gradient constraint; the right face
/// carries exactly one of a value or a gradient constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellVariable {
    pub value: Array1<f64>,
    pub dr: f64,
    pub left_face_grad_constraint: f64,
    pub right_face: RightFaceConstraint,
}

impl CellVariable {
    pub fn new(
        value: Array1<f64>,
        dr: f64,
        left_face_grad_constraint: f64,
        right_face: RightFaceConstraint,
    ) -> FusionResult<Self> {
        if value.is_empty() {
            return Err(FusionError::ConfigError(
                "cell variable needs at least one cell".to_string(),
            ));
        }
        if !dr.is_finite() || dr <= 0.0 {
            return Err(FusionError::ConfigError(format!(
                "cell spacing must be finite and > 0, got {dr}"
            )));
        }
        Ok(CellVariable {
            value,
            dr,
            left_face_grad_constraint,
            right_face,
        })
    }

    /// Zero axis gradient, fixed edge value. The common case for T and n.
    pub fn with_edge_value(value: Array1<f64>, dr: f64, edge: f64) -> FusionResult<Self> {
        Self::new(value, dr, 0.0, RightFaceConstraint::Value(edge))
    }

    pub fn nx(&self) -> usize {
        self.value.len()
    }

    /// Same constraints, new cell values.
    pub fn with_value(&self, value: Array1<f64>) -> Self {
        CellVariable {
            value,
            dr: self.dr,
            left_face_grad_constraint: self.left_face_grad_constraint,
            right_face: self.right_face,
        }
    }

    pub fn right_face_value(&self) -> f64 {
        let n = self.nx();
        match self.right_face {
            RightFaceConstraint::Value(v) => v,
            RightFaceConstraint::Gradient(g) => self.value[n - 1] + g * self.dr / 2.0,
        }
    }

    /// Values on the nx + 1 faces: linear averages inside, constraints at the ends.
    pub fn face_values(&self) -> Array1<f64> {
        let n = self.nx();
        let mut faces = Array1::zeros(n + 1);
        faces[0] = self.value[0] - self.left_face_grad_constraint * self.dr / 2.0;
        for j in 1..n {
            faces[j] = 0.5 * (self.value[j - 1] + self.value[j]);
        }
        faces[n] = self.right_face_value();
        faces
    }

    /// Gradients on the nx + 1 faces.
    pub fn face_grad(&self) -> Array1<f64> {
        let n = self.nx();
        let mut grad = Array1::zeros(n + 1);
        grad[0] = self.left_face_grad_constraint;
        for j in 1..n {
            grad[j] = (self.value[j] - self.value[j - 1]) / self.dr;
        }
        grad[n] = match self.right_face {
            RightFaceConstraint::Value(v) => (v - self.value[n - 1]) / (self.dr / 2.0),
            RightFaceConstraint::Gradient(g) => g,
        };
        grad
    }

    pub fn is_finite(&self) -> bool {
        self.value.iter().all(|v| v.is_finite())
            && match self.right_face {
                RightFaceConstraint::Value(v) | RightFaceConstraint::Gradient(v) => v.is_finite(),
            }
    }
}

/// Evolvable plasma profiles plus the quantities derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreProfiles {
    pub t_i: CellVariable, // keV
    pub t_e: CellVariable, // keV
    pub n_e: CellVariable, // 1e20 m^-3
    pub psi: CellVariable, // Wb/rad, poloidal flux
    pub q_face: Array1<f64>,
    pub j_total: Array1<f64>, // A/m^2, cell centres
    /// Total plasma current implied by the psi edge gradient (MA).
    pub ip: f64,
}

impl CoreProfiles {
    pub fn nx(&self) -> usize {
        self.t_i.nx()
    }

    pub fn is_finite(&self) -> bool {
        self.t_i.is_finite()
            && self.t_e.is_finite()
            && self.n_e.is_finite()
            && self.psi.is_finite()
            && self.q_face.iter().all(|v| v.is_finite())
            && self.j_total.iter().all(|v| v.is_finite())
            && self.ip.is_finite()
    }
}

/// Face-centred transport coefficients (m^2/s and m/s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreTransport {
    pub chi_face_ion: Array1<f64>,
    pub chi_face_el: Array1<f64>,
    pub d_face_el: Array1<f64>,
    pub v_face_el: Array1<f64>,
}

impl CoreTransport {
    pub fn zeros(nx: usize) -> Self {
        CoreTransport {
            chi_face_ion: Array1::zeros(nx + 1),
            chi_face_el: Array1::zeros(nx + 1),
            d_face_el: Array1::zeros(nx + 1),
            v_face_el: Array1::zeros(nx + 1),
        }
    }

    /// Largest diffusivity over all faces and channels.
    pub fn max_diffusivity(&self) -> f64 {
        self.chi_face_ion
            .iter()
            .chain(self.chi_face_el.iter())
            .chain(self.d_face_el.iter())
            .fold(0.0_f64, |acc, &v| acc.max(v))
    }
}

/// Cell-centred source profiles as seen by the solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreSources {
    /// Collisional exchange coefficient, W m^-3 keV^-1; ions gain qei_coef * (Te - Ti).
    pub qei_coef: Array1<f64>,
    pub q_ion: Array1<f64>,      // W/m^3
    pub q_el: Array1<f64>,       // W/m^3
    pub s_particle: Array1<f64>, // 1e20 m^-3 s^-1
    pub j_external: Array1<f64>, // A/m^2
}

impl CoreSources {
    pub fn zeros(nx: usize) -> Self {
        CoreSources {
            qei_coef: Array1::zeros(nx),
            q_ion: Array1::zeros(nx),
            q_el: Array1::zeros(nx),
            s_particle: Array1::zeros(nx),
            j_external: Array1::zeros(nx),
        }
    }
}

/// Outcome class of one solver attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SolverErrorState {
    #[default]
    Converged,
    NotConverged,
    CoarseConverged,
}

impl SolverErrorState {
    pub fn code(self) -> u8 {
        match self {
            SolverErrorState::Converged => 0,
            SolverErrorState::NotConverged => 1,
            SolverErrorState::CoarseConverged => 2,
        }
    }

    /// States 0 and 2 are accepted by the step function.
    pub fn is_acceptable(self) -> bool {
        self != SolverErrorState::NotConverged
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SolverNumericOutputs {
    pub outer_solver_iterations: usize,
    pub inner_solver_iterations: usize,
    pub solver_error_state: SolverErrorState,
}

/// Run-level termination status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SimError {
    #[default]
    NoError,
    NanDetected,
    ReachedMinDt,
    StepFailure,
    /// The step raised an error a smaller dt cannot fix, e.g. a parameter
    /// slice that violates a physical constraint at t + dt.
    StepError,
}

impl SimError {
    pub fn code(self) -> u8 {
        match self {
            SimError::NoError => 0,
            SimError::NanDetected => 1,
            SimError::ReachedMinDt => 2,
            SimError::StepFailure => 3,
            SimError::StepError => 4,
        }
    }

    pub fn is_step_failure(self) -> bool {
        matches!(self, SimError::ReachedMinDt | SimError::StepFailure | SimError::StepError)
    }
}

/// Complete state at one simulated instant. Never mutated in place between steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub t: f64,
    pub dt: f64,
    pub core_profiles: CoreProfiles,
    pub core_transport: CoreTransport,
    pub core_sources: CoreSources,
    pub solver_numeric_outputs: SolverNumericOutputs,
    pub geometry: Geometry,
}
