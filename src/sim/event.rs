use std::f64::consts::PI;

use crate::dynamics::state::State;
use crate::physics::fields::ParticleParams;
use super::runner::Trajectory;

// ---------------------------------------------------------------------------
// Simulation events
// ---------------------------------------------------------------------------

/// Kinds of simulation events.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    GapEntry,
    GapExit,
    /// Gap field changed sign; `rising` when it went from negative to positive.
    FieldReversal { rising: bool },
}

/// A discrete event that occurred during simulation, stamped with the
/// first sample after it.
#[derive(Debug, Clone)]
pub struct SimEvent {
    pub time: f64,
    pub kind: EventKind,
    pub state: State,
}

/// Trait for passive event detectors.
/// Implementations inspect consecutive states and report events.
pub trait EventDetector {
    fn check(&mut self, prev: &State, current: &State) -> Option<EventKind>;
}

/// Detects the particle entering or leaving the accelerating gap.
pub struct GapDetector {
    pub half_width: f64,
}

impl GapDetector {
    pub fn new(params: &ParticleParams) -> Self {
        Self { half_width: params.gap_half_width }
    }

    fn inside(&self, s: &State) -> bool {
        s.pos.x.abs() < self.half_width
    }
}

impl EventDetector for GapDetector {
    fn check(&mut self, prev: &State, current: &State) -> Option<EventKind> {
        match (self.inside(prev), self.inside(current)) {
            (false, true) => Some(EventKind::GapEntry),
            (true, false) => Some(EventKind::GapExit),
            _ => None,
        }
    }
}

/// Detects sign changes of cos(2 pi f t), the phase of the gap field.
pub struct FieldReversalDetector {
    pub frequency: f64,
}

impl FieldReversalDetector {
    pub fn new(params: &ParticleParams) -> Self {
        Self { frequency: params.cyclotron_frequency() }
    }

    fn phase(&self, t: f64) -> f64 {
        (2.0 * PI * self.frequency * t).cos()
    }
}

impl EventDetector for FieldReversalDetector {
    fn check(&mut self, prev: &State, current: &State) -> Option<EventKind> {
        let (a, b) = (self.phase(prev.time), self.phase(current.time));
        if a < 0.0 && b >= 0.0 {
            Some(EventKind::FieldReversal { rising: true })
        } else if a >= 0.0 && b < 0.0 {
            Some(EventKind::FieldReversal { rising: false })
        } else {
            None
        }
    }
}

/// Run every detector over each consecutive sample pair, in time order.
pub fn detect_events(trajectory: &Trajectory, detectors: &mut [Box<dyn EventDetector>]) -> Vec<SimEvent> {
    let mut events = Vec::new();
    for pair in trajectory.samples().windows(2) {
        for det in detectors.iter_mut() {
            if let Some(kind) = det.check(&pair[0], &pair[1]) {
                events.push(SimEvent { time: pair[1].time, kind, state: pair[1] });
            }
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::state::SimConfig;
    use crate::sim::runner::simulate;
    use nalgebra::Vector3;

    fn make_state(t: f64, x: f64) -> State {
        State::new(t, Vector3::new(x, 0.0, 0.0), Vector3::new(0.0, 1e4, 0.0))
    }

    #[test]
    fn gap_entry_and_exit() {
        let mut det = GapDetector::new(&ParticleParams::default());
        assert_eq!(det.check(&make_state(0.0, 0.02), &make_state(1e-9, 0.005)), Some(EventKind::GapEntry));
        assert_eq!(det.check(&make_state(0.0, -0.005), &make_state(1e-9, -0.015)), Some(EventKind::GapExit));
        assert_eq!(det.check(&make_state(0.0, 0.005), &make_state(1e-9, -0.005)), None);
    }

    #[test]
    fn gap_edge_counts_as_outside() {
        let mut det = GapDetector::new(&ParticleParams::default());
        assert_eq!(det.check(&make_state(0.0, 0.01), &make_state(1e-9, 0.011)), None);
        assert_eq!(det.check(&make_state(0.0, 0.01), &make_state(1e-9, 0.0099)), Some(EventKind::GapEntry));
    }

    #[test]
    fn field_reverses_twice_per_period() {
        let params = ParticleParams::default();
        let config = SimConfig { params, ..SimConfig::default() };
        let traj = simulate(&config).unwrap();

        let mut detectors: Vec<Box<dyn EventDetector>> = vec![Box::new(FieldReversalDetector::new(&params))];
        let events = detect_events(&traj, &mut detectors);

        let expected = 2.0 * config.t_end * params.cyclotron_frequency();
        assert!(
            (events.len() as f64 - expected).abs() <= 1.0,
            "{} reversals, expected about {}",
            events.len(),
            expected
        );
        assert_eq!(events[0].kind, EventKind::FieldReversal { rising: false });
        assert!(events.windows(2).all(|w| w[0].time < w[1].time));
    }
}
