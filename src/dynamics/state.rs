use nalgebra::{Vector3, Vector6};

use crate::error::{Result, SimError};
use crate::physics::fields::{ParticleParams, ELEMENTARY_CHARGE};
use crate::sim::integrator::SolverConfig;

// ---------------------------------------------------------------------------
// Particle state: position and velocity at a single instant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State {
    pub time: f64,         // s
    pub pos: Vector3<f64>, // m
    pub vel: Vector3<f64>, // m/s
}

impl State {
    pub fn new(time: f64, pos: Vector3<f64>, vel: Vector3<f64>) -> Self {
        Self { time, pos, vel }
    }

    /// Rebuild a state from the integrator's flat (x, y, z, vx, vy, vz) layout.
    pub fn from_vector(time: f64, y: &Vector6<f64>) -> Self {
        Self {
            time,
            pos: Vector3::new(y[0], y[1], y[2]),
            vel: Vector3::new(y[3], y[4], y[5]),
        }
    }

    pub fn to_vector(&self) -> Vector6<f64> {
        Vector6::new(
            self.pos.x, self.pos.y, self.pos.z, self.vel.x, self.vel.y, self.vel.z,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.time.is_finite()
            && self.pos.iter().all(|c| c.is_finite())
            && self.vel.iter().all(|c| c.is_finite())
    }

    pub fn speed(&self) -> f64 {
        self.vel.norm()
    }

    /// Distance from the z axis (cyclotron centre line), m.
    pub fn radius_xy(&self) -> f64 {
        self.pos.x.hypot(self.pos.y)
    }

    /// Non-relativistic kinetic energy in electron-volts.
    pub fn kinetic_energy_ev(&self, params: &ParticleParams) -> f64 {
        0.5 * params.mass * self.vel.norm_squared() / ELEMENTARY_CHARGE
    }
}

// ---------------------------------------------------------------------------
// Simulation config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub params: ParticleParams,
    pub initial: State,
    pub t_end: f64,          // s, integration span is [0, t_end]
    pub sample_count: usize, // evenly spaced output samples, ends included
    pub solver: SolverConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            params: ParticleParams::default(),
            // Starts on the gap edge with a purely +y velocity.
            initial: State::new(0.0, Vector3::new(0.01, 0.0, 0.0), Vector3::new(0.0, 1e4, 0.0)),
            t_end: 1e-6,
            sample_count: 2000,
            solver: SolverConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<()> {
        let p = &self.params;
        if !(self.t_end.is_finite() && self.t_end > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "t_end must be positive and finite, got {}",
                self.t_end
            )));
        }
        if self.sample_count < 2 {
            return Err(SimError::InvalidConfig(format!(
                "sample_count must be at least 2, got {}",
                self.sample_count
            )));
        }
        if !(p.mass.is_finite() && p.mass > 0.0) {
            return Err(SimError::InvalidConfig(format!("mass must be positive, got {}", p.mass)));
        }
        if ![p.charge, p.b_field, p.e_max, p.gap_half_width].iter().all(|v| v.is_finite()) {
            return Err(SimError::InvalidConfig("field parameters must be finite".into()));
        }
        if p.charge == 0.0 {
            return Err(SimError::InvalidConfig("charge must be non-zero".into()));
        }
        if p.b_field == 0.0 {
            // Zero B leaves no cyclotron frequency to drive the gap field at.
            return Err(SimError::InvalidConfig("b_field must be non-zero".into()));
        }
        if p.gap_half_width <= 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "gap_half_width must be positive, got {}",
                p.gap_half_width
            )));
        }
        if !self.initial.is_finite() {
            return Err(SimError::InvalidConfig("initial state must be finite".into()));
        }
        self.solver.validate()
    }
}
