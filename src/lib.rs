pub mod error;
pub mod physics;
pub mod dynamics;
pub mod sim;
pub mod scene;

pub use error::{Result, SimError};

pub mod types {
    pub use crate::dynamics::state::{SimConfig, State};
    pub use crate::physics::fields::ParticleParams;
    pub use crate::sim::integrator::{Method, SolverConfig};
    pub use crate::sim::runner::Trajectory;
}
