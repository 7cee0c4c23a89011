pub mod integrator;
pub mod runner;
pub mod event;
pub mod summary;

pub use runner::{simulate, simulate_with, time_grid, Trajectory};
pub use integrator::{integrate, rk4_step, Method, SolverConfig};
