use thiserror::Error;

#[derive(Error, Debug)]
pub enum FusionError {
    /// A linear or nonlinear solve hit a numerically singular system.
    #[error("Solver diverged at iteration {iteration}: {message}")]
    SolverDiverged { iteration: usize, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Physics constraint violated: {0}")]
    PhysicsViolation(String),

    #[error("Mesh mismatch: expected {expected} cells, got {actual}")]
    MeshMismatch { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Linear algebra error: {0}")]
    LinAlg(String),
}

pub type FusionResult<T> = Result<T, FusionError>;
