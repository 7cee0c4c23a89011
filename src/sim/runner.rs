use log::{debug, info};

use crate::dynamics;
use crate::dynamics::state::{SimConfig, State};
use crate::error::{Result, SimError};
use super::integrator::{self, SolverStats, StateVec};

// ---------------------------------------------------------------------------
// Time grid
// ---------------------------------------------------------------------------

/// `n` evenly spaced times covering `[0, t_end]`, both ends included exactly.
pub fn time_grid(t_end: f64, n: usize) -> Result<Vec<f64>> {
    if n < 2 {
        return Err(SimError::InvalidConfig(format!("need at least 2 samples, got {}", n)));
    }
    if !(t_end.is_finite() && t_end > 0.0) {
        return Err(SimError::InvalidConfig(format!("invalid time span end {}", t_end)));
    }
    let last = (n - 1) as f64;
    let mut grid: Vec<f64> = (0..n).map(|i| t_end * (i as f64 / last)).collect();
    grid[n - 1] = t_end;
    Ok(grid)
}

// ---------------------------------------------------------------------------
// Trajectory
// ---------------------------------------------------------------------------

/// Evenly sampled particle states in time order. Read-only once built.
#[derive(Debug, Clone)]
pub struct Trajectory {
    samples: Vec<State>,
    stats: SolverStats,
}

impl Trajectory {
    pub fn samples(&self) -> &[State] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, State> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&State> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&State> {
        self.samples.last()
    }

    pub fn stats(&self) -> SolverStats {
        self.stats
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time).collect()
    }

    /// Position components as three equal-length sequences.
    pub fn positions(&self) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let xs = self.samples.iter().map(|s| s.pos.x).collect();
        let ys = self.samples.iter().map(|s| s.pos.y).collect();
        let zs = self.samples.iter().map(|s| s.pos.z).collect();
        (xs, ys, zs)
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a State;
    type IntoIter = std::slice::Iter<'a, State>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Integrate the cyclotron equations of motion over `[0, t_end]` and sample
/// `sample_count` evenly spaced states.
pub fn simulate(config: &SimConfig) -> Result<Trajectory> {
    let params = config.params;
    if params.gap_half_width == config.initial.pos.x.abs() {
        debug!(
            "initial x = {} sits exactly on the gap edge; field starts switched off",
            config.initial.pos.x
        );
    }
    simulate_with(config, |t, y| dynamics::derivatives(t, y, &params))
}

/// Same sampling and failure rules as [`simulate`], with caller-supplied
/// equations of motion in place of the cyclotron fields.
pub fn simulate_with<F>(config: &SimConfig, rhs: F) -> Result<Trajectory>
where
    F: FnMut(f64, &StateVec) -> StateVec,
{
    config.validate()?;

    let t_eval = time_grid(config.t_end, config.sample_count)?;
    let y0 = config.initial.to_vector();

    let solution = integrator::integrate(rhs, &t_eval, &y0, &config.solver)?;

    let stats = solution.stats;
    debug!(
        "{:?}: {} accepted, {} rejected steps, {} rhs evaluations",
        config.solver.method, stats.accepted, stats.rejected, stats.evaluations
    );

    let samples: Vec<State> = solution
        .t
        .iter()
        .zip(&solution.y)
        .map(|(&t, y)| State::from_vector(t, y))
        .collect();

    info!(
        "simulated {:.3e} s ({:.2} cyclotron periods) into {} samples",
        config.t_end,
        config.t_end * config.params.cyclotron_frequency(),
        samples.len()
    );

    Ok(Trajectory { samples, stats })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
