use std::process;

use eframe::egui::{self, Color32};
use egui_plot::{Line, Plot, PlotPoint, PlotPoints, Points, Text};
use log::info;

use cyclotron_sim::scene::{self, Camera, Scene};
use cyclotron_sim::sim;
use cyclotron_sim::types::SimConfig;
use cyclotron_sim::{Result, SimError};

/// Radians of camera turn per point of mouse drag.
const DRAG_SENSITIVITY: f64 = 0.01;

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
    let scene = Scene::from_trajectory(&trajectory)?;
    info!("rendering {} points", scene.path.len());

    let app = SceneViewer { scene, camera: Camera::default() };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1000.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(scene::TITLE, options, Box::new(|_| Ok(Box::new(app))))
        .map_err(|e| SimError::Render(e.to_string()))
}

fn rgb(c: [u8; 3]) -> Color32 {
    Color32::from_rgb(c[0], c[1], c[2])
}

struct SceneViewer {
    scene: Scene,
    camera: Camera,
}

impl eframe::App for SceneViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.heading(&self.scene.title);
            ui.label(format!(
                "Drag to rotate  |  yaw {:.0}°  pitch {:.0}°",
                self.camera.yaw.to_degrees(),
                self.camera.pitch.to_degrees()
            ));
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let center = self.scene.center();
            let camera = self.camera;

            let path: PlotPoints = camera
                .project_all(&self.scene.path, &center)
                .into_iter()
                .collect();
            let start = camera.project(&self.scene.start, &center);
            let axes = self.scene.axes();

            let response = Plot::new("trajectory")
                .data_aspect(1.0)
                .allow_drag(false)
                .show_axes(false)
                .show_grid(false)
                .show(ui, |plot_ui| {
                    for axis in &axes {
                        let a = camera.project(&axis.from, &center);
                        let b = camera.project(&axis.to, &center);
                        plot_ui.line(
                            Line::new(axis.label, vec![a, b])
                                .color(Color32::GRAY)
                                .width(1.0),
                        );
                        plot_ui.text(
                            Text::new(axis.label, PlotPoint::new(b[0], b[1]), axis.label)
                                .color(Color32::GRAY),
                        );
                    }
                    plot_ui.line(
                        Line::new("Trajectory", path)
                            .color(rgb(scene::PATH_COLOR))
                            .width(scene::PATH_WIDTH),
                    );
                    plot_ui.points(
                        Points::new("Start", vec![start])
                            .color(rgb(scene::MARKER_COLOR))
                            .radius(scene::MARKER_RADIUS),
                    );
                })
                .response;

            if response.dragged() {
                let d = response.drag_delta();
                self.camera.rotate(
                    d.x as f64 * DRAG_SENSITIVITY,
                    d.y as f64 * DRAG_SENSITIVITY,
                );
            }
        });
    }
}
