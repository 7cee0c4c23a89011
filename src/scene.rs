use nalgebra::{Rotation3, Vector3};

use crate::error::{Result, SimError};
use crate::sim::runner::Trajectory;

pub const TITLE: &str = "Cyclotron Simulation in 3D";
pub const AXIS_LABELS: [&str; 3] = ["X (m)", "Y (m)", "Z (m)"];

/// RGB colours and sizes for the two traces.
pub const PATH_COLOR: [u8; 3] = [0, 0, 255];
pub const PATH_WIDTH: f32 = 2.0;
pub const MARKER_COLOR: [u8; 3] = [255, 0, 0];
pub const MARKER_RADIUS: f32 = 5.0;

/// Backend-independent description of the trajectory plot: the path, its
/// start marker and labels. Any surface that can draw lines and markers can
/// show it through a [`Camera`].
#[derive(Debug, Clone)]
pub struct Scene {
    pub title: String,
    pub path: Vec<Vector3<f64>>,
    pub start: Vector3<f64>,
}

/// Axis segment drawn from the scene's bounding-box minimum.
#[derive(Debug, Clone)]
pub struct Axis {
    pub label: &'static str,
    pub from: Vector3<f64>,
    pub to: Vector3<f64>,
}

impl Scene {
    pub fn from_coordinates(xs: &[f64], ys: &[f64], zs: &[f64]) -> Result<Self> {
        if xs.len() != ys.len() || xs.len() != zs.len() {
            return Err(SimError::MismatchedCoordinates { x: xs.len(), y: ys.len(), z: zs.len() });
        }
        if xs.is_empty() {
            return Err(SimError::EmptyTrajectory);
        }
        let path: Vec<Vector3<f64>> = xs
            .iter()
            .zip(ys)
            .zip(zs)
            .map(|((&x, &y), &z)| Vector3::new(x, y, z))
            .collect();

        Ok(Scene { title: TITLE.to_string(), start: path[0], path })
    }

    pub fn from_trajectory(trajectory: &Trajectory) -> Result<Self> {
        let (xs, ys, zs) = trajectory.positions();
        Self::from_coordinates(&xs, &ys, &zs)
    }

    pub fn bounds(&self) -> (Vector3<f64>, Vector3<f64>) {
        let mut lo = self.path[0];
        let mut hi = self.path[0];
        for p in &self.path {
            lo = lo.inf(p);
            hi = hi.sup(p);
        }
        (lo, hi)
    }

    pub fn center(&self) -> Vector3<f64> {
        let (lo, hi) = self.bounds();
        (lo + hi) * 0.5
    }

    /// Largest bounding-box extent; never zero so flat scenes still get axes.
    pub fn extent(&self) -> f64 {
        let (lo, hi) = self.bounds();
        let e = (hi - lo).max();
        if e > 0.0 {
            e
        } else {
            1.0
        }
    }

    /// X, Y and Z axes of equal length anchored at the bounding-box minimum.
    pub fn axes(&self) -> [Axis; 3] {
        let (lo, _) = self.bounds();
        let len = self.extent();
        let unit = [Vector3::x(), Vector3::y(), Vector3::z()];
        [0, 1, 2].map(|i| Axis { label: AXIS_LABELS[i], from: lo, to: lo + unit[i] * len })
    }
}

// ---------------------------------------------------------------------------
// Orbit camera
// ---------------------------------------------------------------------------

const MAX_PITCH: f64 = 89.0 * std::f64::consts::PI / 180.0;

/// Orthographic camera orbiting the scene centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub yaw: f64,   // rad about the scene z axis
    pub pitch: f64, // rad above the XY plane
}

impl Default for Camera {
    fn default() -> Self {
        Self { yaw: -0.6, pitch: 0.5 }
    }
}

impl Camera {
    /// Turn the camera by a drag of (dx, dy) radians.
    pub fn rotate(&mut self, dx: f64, dy: f64) {
        self.yaw += dx;
        self.pitch = (self.pitch + dy).clamp(-MAX_PITCH, MAX_PITCH);
    }

    fn view(&self) -> Rotation3<f64> {
        // Yaw spins the scene about z, pitch then tilts it towards the viewer.
        let yaw = Rotation3::from_axis_angle(&Vector3::z_axis(), -self.yaw);
        let tilt = Rotation3::from_axis_angle(&Vector3::x_axis(), self.pitch - std::f64::consts::FRAC_PI_2);
        tilt * yaw
    }

    /// Project `p` onto the view plane, relative to `center`.
    pub fn project(&self, p: &Vector3<f64>, center: &Vector3<f64>) -> [f64; 2] {
        let v = self.view() * (p - center);
        [v.x, v.y]
    }

    pub fn project_all(&self, points: &[Vector3<f64>], center: &Vector3<f64>) -> Vec<[f64; 2]> {
        let view = self.view();
        points
            .iter()
            .map(|p| {
                let v = view * (p - center);
                [v.x, v.y]
            })
            .collect()
    }
}
