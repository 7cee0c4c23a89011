use std::f64::consts::PI;

use nalgebra::Vector3;

// ---------------------------------------------------------------------------
// Particle constants
// ---------------------------------------------------------------------------

pub const PROTON_CHARGE: f64 = 1.6e-19; // C
pub const PROTON_MASS: f64 = 1.67e-27; // kg
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19; // C, J per eV

/// Half-width of the accelerating gap around the x = 0 plane, m.
pub const GAP_HALF_WIDTH: f64 = 0.01;

// ---------------------------------------------------------------------------
// Physical parameters
// ---------------------------------------------------------------------------

/// Charge, mass and field strengths of a single cyclotron run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleParams {
    pub charge: f64,         // C
    pub mass: f64,           // kg
    pub b_field: f64,        // T, along +z
    pub e_max: f64,          // V/m, peak gap field along x
    pub gap_half_width: f64, // m
}

impl Default for ParticleParams {
    fn default() -> Self {
        Self {
            charge: PROTON_CHARGE,
            mass: PROTON_MASS,
            b_field: 1.0,
            e_max: 1e3,
            gap_half_width: GAP_HALF_WIDTH,
        }
    }
}

impl ParticleParams {
    /// Charge-to-mass ratio q/m, C/kg.
    pub fn charge_to_mass(&self) -> f64 {
        self.charge / self.mass
    }

    /// Cyclotron frequency f = qB / (2 pi m), Hz.
    pub fn cyclotron_frequency(&self) -> f64 {
        self.charge * self.b_field / (2.0 * PI * self.mass)
    }

    /// Revolution period 1/f, s.
    pub fn cyclotron_period(&self) -> f64 {
        1.0 / self.cyclotron_frequency()
    }

    /// Larmor radius m|v| / (|q| B) for a given in-plane speed, m.
    pub fn larmor_radius(&self, speed: f64) -> f64 {
        self.mass * speed / (self.charge.abs() * self.b_field)
    }

    /// True when `x` lies strictly inside the accelerating gap.
    ///
    /// The comparison is strict: a particle sitting exactly on the edge
    /// (|x| == half width) is outside.
    pub fn in_gap(&self, x: f64) -> bool {
        x.abs() < self.gap_half_width
    }

    /// Gap field along x at time `t` for a particle at `x`, V/m.
    /// E_max * cos(2 pi f t) inside the gap, zero elsewhere.
    pub fn electric_field(&self, t: f64, x: f64) -> f64 {
        if self.in_gap(x) {
            self.e_max * (2.0 * PI * self.cyclotron_frequency() * t).cos()
        } else {
            0.0
        }
    }

    /// Lorentz acceleration (q/m)(E + v x B) with B along +z and E along x.
    ///
    /// Written out per component: ax = (q/m)(vy B + E), ay = -(q/m) vx B,
    /// az = 0.
    pub fn acceleration(&self, t: f64, pos: &Vector3<f64>, vel: &Vector3<f64>) -> Vector3<f64> {
        let qm = self.charge_to_mass();
        let e = self.electric_field(t, pos.x);
        Vector3::new(
            qm * (vel.y * self.b_field + e),
            qm * (-vel.x * self.b_field),
            0.0,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
