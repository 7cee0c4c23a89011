use nalgebra::Vector6;

use crate::error::{Result, SimError};

/// Flat integrator state: (x, y, z, vx, vy, vz).
pub type StateVec = Vector6<f64>;

// ---------------------------------------------------------------------------
// Solver configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Method {
    /// Adaptive Dormand-Prince 5(4) with cubic Hermite output between steps.
    Dopri5,
    /// Classical RK4 with a fixed number of steps per output interval.
    Rk4 { substeps: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct SolverConfig {
    pub method: Method,
    pub rtol: f64,
    pub atol: f64,
    pub max_step: f64,     // s, upper bound on adaptive steps
    pub max_steps: usize,  // attempted steps before giving up
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            method: Method::Dopri5,
            rtol: 1e-3,
            atol: 1e-6,
            max_step: f64::INFINITY,
            max_steps: 100_000,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.rtol > 0.0 && self.atol > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "tolerances must be positive (rtol = {}, atol = {})",
                self.rtol, self.atol
            )));
        }
        if !(self.max_step > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "max_step must be positive, got {}",
                self.max_step
            )));
        }
        if let Method::Rk4 { substeps: 0 } = self.method {
            return Err(SimError::InvalidConfig("rk4 needs at least one substep".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Solution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    pub accepted: usize,
    pub rejected: usize,
    pub evaluations: usize,
}

/// States at the requested evaluation times, in order.
#[derive(Debug, Clone)]
pub struct Solution {
    pub t: Vec<f64>,
    pub y: Vec<StateVec>,
    pub stats: SolverStats,
}

/// Integrate `f` from `t_eval[0]` to the last entry of `t_eval`, returning
/// the state at every requested time. `t_eval` must be strictly increasing.
pub fn integrate<F>(mut f: F, t_eval: &[f64], y0: &StateVec, config: &SolverConfig) -> Result<Solution>
where
    F: FnMut(f64, &StateVec) -> StateVec,
{
    config.validate()?;
    if t_eval.is_empty() {
        return Err(SimError::InvalidConfig("no evaluation times requested".into()));
    }
    if t_eval.windows(2).any(|w| !(w[1] > w[0])) {
        return Err(SimError::InvalidConfig(
            "evaluation times must be strictly increasing".into(),
        ));
    }
    check_finite(t_eval[0], y0)?;

    let mut evaluations = 0usize;
    let mut counted = |t: f64, y: &StateVec| {
        evaluations += 1;
        f(t, y)
    };

    let (y, mut stats) = match config.method {
        Method::Dopri5 => dopri5(&mut counted, t_eval, y0, config)?,
        Method::Rk4 { substeps } => rk4_fixed(&mut counted, t_eval, y0, substeps)?,
    };
    stats.evaluations = evaluations;

    Ok(Solution { t: t_eval.to_vec(), y, stats })
}

fn check_finite(t: f64, y: &StateVec) -> Result<()> {
    match y.iter().position(|c| !c.is_finite()) {
        Some(component) => Err(SimError::NonFinite { time: t, component }),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Classical 4th-order Runge-Kutta
// ---------------------------------------------------------------------------

/// Single RK4 step: advance `y` from `t` by `h`.
pub fn rk4_step<F>(f: &mut F, t: f64, y: &StateVec, h: f64) -> StateVec
where
    F: FnMut(f64, &StateVec) -> StateVec,
{
    let k1 = f(t, y);
    let k2 = f(t + h * 0.5, &(y + k1 * (h * 0.5)));
    let k3 = f(t + h * 0.5, &(y + k2 * (h * 0.5)));
    let k4 = f(t + h, &(y + k3 * h));

    y + (k1 + 2.0 * k2 + 2.0 * k3 + k4) * (h / 6.0)
}

fn rk4_fixed<F>(
    f: &mut F,
    t_eval: &[f64],
    y0: &StateVec,
    substeps: usize,
) -> Result<(Vec<StateVec>, SolverStats)>
where
    F: FnMut(f64, &StateVec) -> StateVec,
{
    let mut out = Vec::with_capacity(t_eval.len());
    let mut stats = SolverStats::default();
    let mut y = *y0;
    out.push(y);

    for w in t_eval.windows(2) {
        let h = (w[1] - w[0]) / substeps as f64;
        for i in 0..substeps {
            let t = w[0] + i as f64 * h;
            y = rk4_step(f, t, &y, h);
            stats.accepted += 1;
        }
        check_finite(w[1], &y)?;
        out.push(y);
    }

    Ok((out, stats))
}

// ---------------------------------------------------------------------------
// Dormand-Prince 5(4)
// ---------------------------------------------------------------------------

mod tableau {
    pub const C: [f64; 6] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0];

    pub const A2: [f64; 1] = [1.0 / 5.0];
    pub const A3: [f64; 2] = [3.0 / 40.0, 9.0 / 40.0];
    pub const A4: [f64; 3] = [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0];
    pub const A5: [f64; 4] = [19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0];
    pub const A6: [f64; 5] = [
        9017.0 / 3168.0,
        -355.0 / 33.0,
        46732.0 / 5247.0,
        49.0 / 176.0,
        -5103.0 / 18656.0,
    ];

    // 5th-order weights (b2 = 0); also the FSAL stage coefficients.
    pub const B: [f64; 6] = [
        35.0 / 384.0,
        0.0,
        500.0 / 1113.0,
        125.0 / 192.0,
        -2187.0 / 6784.0,
        11.0 / 84.0,
    ];

    // Difference between 5th- and 4th-order weights, seven stages.
    pub const E: [f64; 7] = [
        -71.0 / 57600.0,
        0.0,
        71.0 / 16695.0,
        -71.0 / 1920.0,
        17253.0 / 339200.0,
        -22.0 / 525.0,
        1.0 / 40.0,
    ];
}

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;
const ERROR_EXPONENT: f64 = -1.0 / 5.0;

struct Step {
    y: StateVec,
    f: StateVec,
    err: StateVec,
}

fn dopri_step<F>(f: &mut F, t: f64, y: &StateVec, k1: &StateVec, h: f64) -> Step
where
    F: FnMut(f64, &StateVec) -> StateVec,
{
    use tableau::*;

    let k2 = f(t + C[1] * h, &(y + *k1 * (A2[0] * h)));
    let k3 = f(t + C[2] * h, &(y + (*k1 * A3[0] + k2 * A3[1]) * h));
    let k4 = f(t + C[3] * h, &(y + (*k1 * A4[0] + k2 * A4[1] + k3 * A4[2]) * h));
    let k5 = f(
        t + C[4] * h,
        &(y + (*k1 * A5[0] + k2 * A5[1] + k3 * A5[2] + k4 * A5[3]) * h),
    );
    let k6 = f(
        t + C[5] * h,
        &(y + (*k1 * A6[0] + k2 * A6[1] + k3 * A6[2] + k4 * A6[3] + k5 * A6[4]) * h),
    );

    let y_new = y + (*k1 * B[0] + k3 * B[2] + k4 * B[3] + k5 * B[4] + k6 * B[5]) * h;
    let k7 = f(t + h, &y_new);

    let err = (*k1 * E[0] + k3 * E[2] + k4 * E[3] + k5 * E[4] + k6 * E[5] + k7 * E[6]) * h;

    Step { y: y_new, f: k7, err }
}

/// Root-mean-square of `v / scale`, component-wise.
fn rms_norm(v: &StateVec, scale: &StateVec) -> f64 {
    (v.component_div(scale).norm_squared() / v.len() as f64).sqrt()
}

/// Starting step from the local derivative magnitudes (Hairer, Norsett & Wanner, II.4).
fn initial_step<F>(f: &mut F, t0: f64, y0: &StateVec, f0: &StateVec, span: f64, config: &SolverConfig) -> f64
where
    F: FnMut(f64, &StateVec) -> StateVec,
{
    let scale = y0.abs() * config.rtol + StateVec::repeat(config.atol);
    let d0 = rms_norm(y0, &scale);
    let d1 = rms_norm(f0, &scale);

    let h0 = if d0 < 1e-5 || d1 < 1e-5 { 1e-6 } else { 0.01 * d0 / d1 };
    let h0 = h0.min(span);

    let y1 = y0 + f0 * h0;
    let f1 = f(t0 + h0, &y1);
    let d2 = rms_norm(&(f1 - f0), &scale) / h0;

    let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
        (h0 * 1e-3).max(1e-6)
    } else {
        (0.01 / d1.max(d2)).powf(1.0 / 5.0)
    };

    (100.0 * h0).min(h1).min(span)
}

/// Cubic Hermite interpolation across an accepted step.
fn hermite(t0: f64, y0: &StateVec, f0: &StateVec, h: f64, y1: &StateVec, f1: &StateVec, t: f64) -> StateVec {
    let s = (t - t0) / h;
    let s2 = s * s;
    let s3 = s2 * s;

    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;

    y0 * h00 + f0 * (h10 * h) + y1 * h01 + f1 * (h11 * h)
}

fn dopri5<F>(
    f: &mut F,
    t_eval: &[f64],
    y0: &StateVec,
    config: &SolverConfig,
) -> Result<(Vec<StateVec>, SolverStats)>
where
    F: FnMut(f64, &StateVec) -> StateVec,
{
    let t_start = t_eval[0];
    let t_end = t_eval[t_eval.len() - 1];

    let mut out = Vec::with_capacity(t_eval.len());
    let mut stats = SolverStats::default();

    let mut t = t_start;
    let mut y = *y0;
    let mut fy = f(t, &y);
    check_finite(t, &fy)?;

    out.push(y);
    let mut next = 1;
    if next == t_eval.len() {
        return Ok((out, stats));
    }

    let mut h = initial_step(f, t, &y, &fy, t_end - t_start, config).min(config.max_step);
    let mut rejected_last = false;

    while t < t_end {
        let attempts = stats.accepted + stats.rejected;
        if attempts >= config.max_steps {
            return Err(SimError::TooManySteps { time: t, steps: attempts });
        }

        let min_step = 10.0 * f64::EPSILON * t.abs().max(f64::MIN_POSITIVE);
        h = h.min(config.max_step);
        if h < min_step {
            return Err(SimError::StepSizeUnderflow { time: t, step: h });
        }

        let t_new = if t + h >= t_end { t_end } else { t + h };
        let h_step = t_new - t;

        let step = dopri_step(f, t, &y, &fy, h_step);

        let scale = y.abs().sup(&step.y.abs()) * config.rtol + StateVec::repeat(config.atol);
        let err_norm = rms_norm(&step.err, &scale);

        if err_norm < 1.0 {
            check_finite(t_new, &step.y)?;

            while next < t_eval.len() && t_eval[next] <= t_new {
                out.push(hermite(t, &y, &fy, h_step, &step.y, &step.f, t_eval[next]));
                next += 1;
            }

            let mut factor = if err_norm == 0.0 {
                MAX_FACTOR
            } else {
                MAX_FACTOR.min(SAFETY * err_norm.powf(ERROR_EXPONENT))
            };
            if rejected_last {
                factor = factor.min(1.0);
            }

            t = t_new;
            y = step.y;
            fy = step.f;
            h = h_step * factor;
            rejected_last = false;
            stats.accepted += 1;
        } else {
            if !err_norm.is_finite() {
                // Shrinking the step cannot recover from a NaN/inf stage.
                check_finite(t_new, &step.y)?;
                check_finite(t_new, &step.f)?;
            }
            let factor = if err_norm.is_finite() {
                MIN_FACTOR.max(SAFETY * err_norm.powf(ERROR_EXPONENT))
            } else {
                MIN_FACTOR
            };
            h = h_step * factor;
            rejected_last = true;
            stats.rejected += 1;
        }
    }

    // Only reachable through rounding in t_eval: the remaining times sit at t_end.
    while next < t_eval.len() {
        out.push(y);
        next += 1;
    }

    Ok((out, stats))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn grid(t_end: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| t_end * i as f64 / (n - 1) as f64).collect()
    }

    /// y0' = -y0, the remaining components stay put.
    fn decay(_t: f64, y: &StateVec) -> StateVec {
        StateVec::new(-y[0], 0.0, 0.0, 0.0, 0.0, 0.0)
    }

    /// Unit-frequency harmonic oscillator in (y0, y3).
    fn oscillator(_t: f64, y: &StateVec) -> StateVec {
        StateVec::new(y[3], 0.0, 0.0, -y[0], 0.0, 0.0)
    }

    #[test]
    fn rk4_single_step_accuracy() {
        let y0 = StateVec::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let mut f = decay;
        let y = rk4_step(&mut f, 0.0, &y0, 0.1);
        assert_approx_eq!(y[0], (-0.1f64).exp(), 1e-6);
    }

    #[test]
    fn dopri5_exponential_decay() {
        let t = grid(5.0, 51);
        let y0 = StateVec::new(1.0, 2.0, 0.0, 0.0, 0.0, 0.0);
        let config = SolverConfig { rtol: 1e-9, atol: 1e-12, ..SolverConfig::default() };
        let sol = integrate(decay, &t, &y0, &config).unwrap();

        assert_eq!(sol.y.len(), t.len());
        for (ti, yi) in sol.t.iter().zip(&sol.y) {
            assert_approx_eq!(yi[0], (-ti).exp(), 1e-7);
            assert_eq!(yi[1], 2.0);
        }
    }

    #[test]
    fn dense_output_between_steps() {
        // Many more samples than steps; interpolated values must still track cos/sin.
        let t = grid(10.0, 1001);
        let y0 = StateVec::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let config = SolverConfig { rtol: 1e-8, atol: 1e-10, ..SolverConfig::default() };
        let sol = integrate(oscillator, &t, &y0, &config).unwrap();

        assert!(sol.stats.accepted < t.len(), "expected fewer steps than samples");
        for (ti, yi) in sol.t.iter().zip(&sol.y) {
            assert_approx_eq!(yi[0], ti.cos(), 1e-5);
            assert_approx_eq!(yi[3], -ti.sin(), 1e-5);
        }
    }

    #[test]
    fn endpoints_are_exact() {
        let t = grid(2.0, 7);
        let y0 = StateVec::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let sol = integrate(oscillator, &t, &y0, &SolverConfig::default()).unwrap();
        assert_eq!(sol.y[0], y0);
        assert_eq!(sol.t[6], 2.0);
    }

    #[test]
    fn rk4_and_dopri5_agree() {
        let t = grid(3.0, 31);
        let y0 = StateVec::new(1.0, 0.0, 0.0, 0.5, 0.0, 0.0);
        let tight = SolverConfig { rtol: 1e-10, atol: 1e-12, ..SolverConfig::default() };
        let fixed = SolverConfig { method: Method::Rk4 { substeps: 20 }, ..SolverConfig::default() };

        let a = integrate(oscillator, &t, &y0, &tight).unwrap();
        let b = integrate(oscillator, &t, &y0, &fixed).unwrap();
        for (ya, yb) in a.y.iter().zip(&b.y) {
            assert!((ya - yb).norm() < 1e-6);
        }
        assert_eq!(b.stats.accepted, 30 * 20);
        assert_eq!(b.stats.evaluations, 30 * 20 * 4);
    }

    #[test]
    fn blow_up_is_reported() {
        // y' = y^2 from y = 1 diverges at t = 1; the rate overflows once y passes 10.
        let blow_up = |_t: f64, y: &StateVec| {
            let rate = if y[0] > 10.0 { f64::INFINITY } else { y[0] * y[0] };
            StateVec::new(rate, 0.0, 0.0, 0.0, 0.0, 0.0)
        };
        let t = grid(2.0, 3);
        let y0 = StateVec::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let err = integrate(blow_up, &t, &y0, &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, SimError::NonFinite { component: 0, .. }), "unexpected error {:?}", err);
    }

    #[test]
    fn non_finite_rhs_is_fatal() {
        let poisoned = |t: f64, _y: &StateVec| {
            let v = if t > 0.5 { f64::NAN } else { 1.0 };
            StateVec::new(v, 0.0, 0.0, 0.0, 0.0, 0.0)
        };
        let t = grid(1.0, 11);
        let y0 = StateVec::zeros();
        let fixed = SolverConfig { method: Method::Rk4 { substeps: 4 }, ..SolverConfig::default() };

        for config in [SolverConfig::default(), fixed] {
            let err = integrate(poisoned, &t, &y0, &config).unwrap_err();
            match err {
                SimError::NonFinite { time, component } => {
                    assert_eq!(component, 0);
                    assert!(time > 0.5, "reported at t = {}", time);
                }
                other => panic!("{:?}: expected NonFinite, got {:?}", config.method, other),
            }
        }
    }

    #[test]
    fn infinite_rhs_is_named_non_finite() {
        let t = grid(1.0, 11);
        let y0 = StateVec::zeros();
        let err = integrate(
            |t: f64, _y: &StateVec| StateVec::repeat(if t > 0.5 { f64::INFINITY } else { 1.0 }),
            &t,
            &y0,
            &SolverConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SimError::NonFinite { .. }), "unexpected error {:?}", err);
        assert!(err.to_string().contains("non-finite"));
    }

    #[test]
    fn step_budget_is_enforced() {
        let t = grid(100.0, 2);
        let y0 = StateVec::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let config = SolverConfig { rtol: 1e-12, atol: 1e-14, max_steps: 10, ..SolverConfig::default() };
        let err = integrate(oscillator, &t, &y0, &config).unwrap_err();
        assert!(matches!(err, SimError::TooManySteps { steps: 10, .. }));
    }

    #[test]
    fn rejects_unordered_times() {
        let y0 = StateVec::zeros();
        let err = integrate(decay, &[0.0, 1.0, 1.0], &y0, &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));
    }

    #[test]
    fn max_step_is_respected() {
        let t = grid(1.0, 2);
        let y0 = StateVec::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let config = SolverConfig { max_step: 0.01, ..SolverConfig::default() };
        let sol = integrate(decay, &t, &y0, &config).unwrap();
        assert!(sol.stats.accepted >= 100);
    }
}
