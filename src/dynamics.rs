use nalgebra::{Vector3, Vector6};

use crate::physics::fields::ParticleParams;

pub mod state;

// ---------------------------------------------------------------------------
// Equations of motion
// ---------------------------------------------------------------------------

/// Right-hand side of the cyclotron ODE: d/dt (x, y, z, vx, vy, vz).
///
/// Forces modeled:
///   1. Magnetic - uniform B along +z, v x B
///   2. Electric - E_max cos(2 pi f t) along x, only while |x| < gap half-width
///
/// Pure in `t` and `y`: the integrator may call it at trial times in any
/// order.
pub fn derivatives(t: f64, y: &Vector6<f64>, params: &ParticleParams) -> Vector6<f64> {
    let pos = Vector3::new(y[0], y[1], y[2]);
    let vel = Vector3::new(y[3], y[4], y[5]);
    let acc = params.acceleration(t, &pos, &vel);

    Vector6::new(vel.x, vel.y, vel.z, acc.x, acc.y, acc.z)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
