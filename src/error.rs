use thiserror::Error;

/// Failures from configuring, integrating or rendering a trajectory.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("non-finite state component {component} at t = {time:e} s")]
    NonFinite { time: f64, component: usize },

    #[error("step size underflow at t = {time:e} s (h = {step:e} s); tolerance cannot be met")]
    StepSizeUnderflow { time: f64, step: f64 },

    #[error("step budget exhausted after {steps} steps at t = {time:e} s")]
    TooManySteps { time: f64, steps: usize },

    #[error("coordinate sequences differ in length: x = {x}, y = {y}, z = {z}")]
    MismatchedCoordinates { x: usize, y: usize, z: usize },

    #[error("trajectory is empty")]
    EmptyTrajectory,

    #[error("rendering failed: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
