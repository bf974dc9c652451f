// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Linear Theta Method
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Linearized theta step with optional predictor-corrector passes.

use super::kernel::SolverKernel;
use super::{Solver, SolverInput, SolverOutput, ThetaProblem};
use fusion_types::error::FusionResult;
use fusion_types::state::{SolverErrorState, SolverNumericOutputs};
use ndarray::Array1;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct LinearThetaMethod {
    kernel: Arc<SolverKernel>,
}

impl LinearThetaMethod {
    pub fn new(kernel: Arc<SolverKernel>) -> Self {
        LinearThetaMethod { kernel }
    }
}

/// Predictor pass at the t + dt template, then `n_corrector_steps` passes
/// with coefficients refreshed at the previous result. Returns the solution
/// and the number of linear solves.
pub(crate) fn predictor_corrector(problem: &ThetaProblem<'_>) -> FusionResult<(Array1<f64>, usize)> {
    let kernel = problem.kernel;
    let passes = if kernel.use_predictor_corrector {
        kernel.n_corrector_steps + 1
    } else {
        1
    };
    let mut guess = problem.template.clone();
    let mut x = kernel.pack(&guess);
    for pass in 0..passes {
        x = problem.linear_step(&guess)?;
        if pass + 1 < passes {
            guess = problem.profiles_at(&x)?;
        }
    }
    Ok((x, passes))
}

impl Solver for LinearThetaMethod {
    fn step(&self, input: &SolverInput<'_>) -> FusionResult<SolverOutput> {
        let problem = ThetaProblem::new(&self.kernel, input)?;
        let (x, passes) = predictor_corrector(&problem)?;
        problem.finish(
            &x,
            SolverNumericOutputs {
                outer_solver_iterations: 1,
                inner_solver_iterations: passes,
                solver_error_state: SolverErrorState::Converged,
            },
        )
    }
}
