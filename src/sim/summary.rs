use crate::dynamics::state::State;
use crate::error::{Result, SimError};
use crate::physics::fields::ParticleParams;
use super::runner::Trajectory;

/// Summary statistics computed from a cyclotron trajectory.
#[derive(Debug, Clone)]
pub struct OrbitSummary {
    pub duration: f64,
    pub periods: f64,
    pub max_radius: f64,      // m from the z axis
    pub min_x: f64,
    pub max_x: f64,
    pub max_speed: f64,
    pub initial_energy_ev: f64,
    pub final_energy_ev: f64,
    pub max_energy_ev: f64,
    pub gap_samples: usize,   // samples taken with the particle inside the gap
}

impl OrbitSummary {
    pub fn from_trajectory(trajectory: &Trajectory, params: &ParticleParams) -> Result<Self> {
        let (first, last) = match (trajectory.first(), trajectory.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return Err(SimError::EmptyTrajectory),
        };

        let max_of = |key: fn(&State) -> f64| trajectory.iter().map(key).fold(f64::NEG_INFINITY, f64::max);

        let max_energy_ev = trajectory
            .iter()
            .map(|s| s.kinetic_energy_ev(params))
            .fold(0.0_f64, f64::max);

        let duration = last.time - first.time;

        Ok(OrbitSummary {
            duration,
            periods: duration * params.cyclotron_frequency(),
            max_radius: max_of(State::radius_xy),
            min_x: trajectory.iter().map(|s| s.pos.x).fold(f64::INFINITY, f64::min),
            max_x: max_of(|s| s.pos.x),
            max_speed: max_of(State::speed),
            initial_energy_ev: first.kinetic_energy_ev(params),
            final_energy_ev: last.kinetic_energy_ev(params),
            max_energy_ev,
            gap_samples: trajectory.iter().filter(|s| params.in_gap(s.pos.x)).count(),
        })
    }

    pub fn energy_gain_ev(&self) -> f64 {
        self.final_energy_ev - self.initial_energy_ev
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::state::SimConfig;
    use crate::sim::integrator::SolverConfig;
    use crate::sim::runner::simulate;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn magnetic_only_orbit_summary() {
        let mut config = SimConfig::default();
        config.params.e_max = 0.0;
        config.solver = SolverConfig { rtol: 1e-9, atol: 1e-12, ..SolverConfig::default() };
        let traj = simulate(&config).unwrap();
        let s = OrbitSummary::from_trajectory(&traj, &config.params).unwrap();

        let r = config.params.larmor_radius(1e4);
        assert_approx_eq!(s.duration, 1e-6, 1e-18);
        assert!((s.periods - 15.25).abs() < 0.05, "periods = {}", s.periods);
        assert_approx_eq!(s.min_x, 0.01, 1e-3 * r);
        assert_approx_eq!(s.max_x, 0.01 + 2.0 * r, 1e-3 * r);
        assert!((s.energy_gain_ev() / s.initial_energy_ev).abs() < 1e-3);
        assert!(s.max_radius > 0.01 && s.max_radius < 0.01 + 2.5 * r);
    }

    #[test]
    fn reference_run_summary_is_finite() {
        let config = SimConfig::default();
        let traj = simulate(&config).unwrap();
        let s = OrbitSummary::from_trajectory(&traj, &config.params).unwrap();
        assert!(s.max_speed.is_finite());
        assert!(s.final_energy_ev.is_finite());
        assert!(s.max_energy_ev >= s.initial_energy_ev);
        assert!(s.gap_samples <= traj.len());
    }
}
