//! 1.5-D core transport simulation.
//!
//! Stage 1: configuration, schedules, runtime slices, geometry provider
//! Stage 2: physics models (transport, sources, pedestal, conductivity)
//! Stage 3: theta-method solvers
//! Stage 4: step function, run loop, post-processing, restart

pub mod config;
pub mod geometry_provider;
pub mod initial_state;
pub mod interpolated_param;
pub mod jacobian;
pub mod kernel_cache;
pub mod neoclassical;
pub mod pedestal;
pub mod physics;
pub mod post_processing;
pub mod profiles;
pub mod run_loop;
pub mod runtime_params;
pub mod simulation;
pub mod solver;
pub mod source;
pub mod step_function;
pub mod time_step_calculator;
pub mod transport;

pub use config::SimulationConfig;
pub use simulation::{run_simulation, run_simulation_with_cache, SimulationOutputs};
