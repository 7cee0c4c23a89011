use std::process;

use cyclotron_sim::sim::event::{self, EventDetector, EventKind, FieldReversalDetector, GapDetector};
use cyclotron_sim::sim::summary::OrbitSummary;
use cyclotron_sim::sim::{self, Trajectory};
use cyclotron_sim::types::SimConfig;
use cyclotron_sim::Result;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = SimConfig::default();
    let trajectory = sim::simulate(&config)?;
    let summary = OrbitSummary::from_trajectory(&trajectory, &config.params)?;
    report(&config, &trajectory, &summary);
    Ok(())
}

fn report(config: &SimConfig, trajectory: &Trajectory, summary: &OrbitSummary) {
    let p = &config.params;

    println!();
    println!("====================================================================");
    println!("  CYCLOTRON SIMULATION");
    println!("====================================================================");
    println!();
    println!("  Particle & Fields");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Charge:        {:>10.3e} C     Mass:         {:>10.3e} kg",
        p.charge, p.mass
    );
    println!(
        "  B field:       {:>10.3} T     E max:        {:>10.3e} V/m",
        p.b_field, p.e_max
    );
    println!(
        "  Cyclotron f:   {:>10.4e} Hz    Period:       {:>10.4e} s",
        p.cyclotron_frequency(),
        p.cyclotron_period()
    );
    println!(
        "  Gap:           |x| < {} m    Larmor r0:    {:>10.4e} m",
        p.gap_half_width,
        p.larmor_radius(config.initial.speed())
    );
    println!();

    let mut detectors: Vec<Box<dyn EventDetector>> = vec![
        Box::new(GapDetector::new(p)),
        Box::new(FieldReversalDetector::new(p)),
    ];
    let events = event::detect_events(trajectory, &mut detectors);
    let gap_events: Vec<_> = events
        .iter()
        .filter(|e| matches!(e.kind, EventKind::GapEntry | EventKind::GapExit))
        .collect();
    let reversals = events.len() - gap_events.len();

    println!("  Gap Events");
    println!("  ──────────────────────────────────────────────────────────────────");
    if gap_events.is_empty() {
        println!("  (no sampled gap transits)");
    }
    for e in gap_events.iter().take(20) {
        let label = match e.kind {
            EventKind::GapEntry => "ENTRY",
            _ => "EXIT ",
        };
        println!(
            "  {}   t={:>10.4e}s   x={:>11.4e}m   |v|={:>10.4e}m/s",
            label,
            e.time,
            e.state.pos.x,
            e.state.speed()
        );
    }
    if gap_events.len() > 20 {
        println!("  ... {} more", gap_events.len() - 20);
    }
    println!("  Field reversals: {}", reversals);
    println!();

    println!("  Orbit Summary");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  Duration:      {:>10.4e} s   ({:.2} periods)", summary.duration, summary.periods);
    println!("  x range:       [{:.6e}, {:.6e}] m", summary.min_x, summary.max_x);
    println!("  Max radius:    {:>10.6e} m", summary.max_radius);
    println!("  Max speed:     {:>10.4e} m/s", summary.max_speed);
    println!(
        "  Energy:        {:.4} eV -> {:.4} eV   (gain {:+.4} eV, peak {:.4} eV)",
        summary.initial_energy_ev,
        summary.final_energy_ev,
        summary.energy_gain_ev(),
        summary.max_energy_ev
    );
    println!("  Gap samples:   {} of {}", summary.gap_samples, trajectory.len());
    println!();

    println!("  Trajectory");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>11}  {:>13}  {:>13}  {:>11}  {:>8}",
        "t (s)", "x (m)", "y (m)", "|v| (m/s)", "gap"
    );
    println!("  {}", "─".repeat(64));

    let last = trajectory.len().saturating_sub(1);
    let sample_interval = (trajectory.len() / 25).max(1);
    for (i, s) in trajectory.iter().enumerate() {
        if i % sample_interval != 0 && i != last {
            continue;
        }
        println!(
            "  {:>11.4e}  {:>13.6e}  {:>13.6e}  {:>11.4e}  {:>8}",
            s.time,
            s.pos.x,
            s.pos.y,
            s.speed(),
            if p.in_gap(s.pos.x) { "IN" } else { "-" }
        );
    }

    let stats = trajectory.stats();
    println!();
    println!(
        "  Solver: {:?}, {} accepted / {} rejected steps, {} evaluations",
        config.solver.method, stats.accepted, stats.rejected, stats.evaluations
    );
    println!("====================================================================");
    println!();
}
