//! Interactive viewer
//!
//! Runs a scene in real time with a frame-rate capped clock, draws bodies,
//! segments and springs, and reloads the scene when its file changes.

use eframe::egui;
use log::{info, warn};
use notify::{Event, RecommendedWatcher, Watcher};
use rollsim_core::view::{angle_marker, spring_coil, to_screen, PanKeys};
use rollsim_core::{
    advance, apply_spin_input, build_simulation_context_from_source, FrameClock,
    SimulationContext,
};
use std::path::PathBuf;
use std::sync::mpsc;

const BODY_STROKE: f32 = 2.0;
const SEGMENT_STROKE: f32 = 4.0;
const SPRING_STROKE: f32 = 1.0;

#[derive(Debug, Clone, Copy)]
pub struct ViewSettings {
    pub max_fps: f32,
    pub time_ratio: f32,
}

pub struct ViewApp {
    source_path: PathBuf,
    source_text: String,
    ctx_opt: Option<SimulationContext>,
    last_load_error: Option<String>,
    playing: bool,
    clock: FrameClock,
    camera: glam::Vec2,
    #[allow(dead_code)] // Kept alive to maintain file watching
    file_watcher: Option<RecommendedWatcher>,
    file_receiver: mpsc::Receiver<notify::Result<Event>>,
}

impl ViewApp {
    pub fn new(
        source_path: PathBuf,
        settings: ViewSettings,
        _cc: &eframe::CreationContext<'_>,
    ) -> Self {
        let source_text = std::fs::read_to_string(&source_path)
            .unwrap_or_else(|e| format!("# error reading file: {}", e));

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            // The receiver is gone during shutdown
            let _ = tx.send(res);
        })
        .ok();

        if let Some(ref mut w) = watcher {
            if let Err(e) = w.watch(&source_path, notify::RecursiveMode::NonRecursive) {
                warn!("not watching {}: {}", source_path.display(), e);
            }
        }

        let mut app = Self {
            source_path,
            source_text,
            ctx_opt: None,
            last_load_error: None,
            playing: true,
            clock: FrameClock::new(settings.max_fps, settings.time_ratio),
            camera: glam::Vec2::ZERO,
            file_watcher: watcher,
            file_receiver: rx,
        };

        app.reload_context();

        app
    }

    fn reload_context(&mut self) {
        match build_simulation_context_from_source(&self.source_text) {
            Ok((ctx, diagnostics)) => {
                for warning in diagnostics.warnings() {
                    warn!("{}", warning.render(&self.source_text));
                }
                info!(
                    "loaded {} ({} bodies)",
                    self.source_path.display(),
                    ctx.scene.bodies().len()
                );
                self.ctx_opt = Some(ctx);
                self.last_load_error = None;
                self.clock.reset();
            }
            Err(e) => {
                self.last_load_error = Some(e.to_string());
                self.ctx_opt = None;
                self.playing = false;
            }
        }
    }

    fn check_file_changes(&mut self) {
        let mut needs_reload = false;

        while let Ok(event) = self.file_receiver.try_recv() {
            match event {
                Ok(Event {
                    kind: notify::EventKind::Modify(_),
                    paths,
                    ..
                }) => {
                    if paths.iter().any(|p| p.ends_with(&self.source_path)) {
                        if let Ok(new_text) = std::fs::read_to_string(&self.source_path) {
                            self.source_text = new_text;
                            needs_reload = true;
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => warn!("file watcher error: {}", e),
            }
        }

        if needs_reload {
            self.reload_context();
        }
    }

    fn handle_input(&mut self, ctx: &egui::Context) {
        let (pan, left, right) = ctx.input(|i| {
            (
                PanKeys {
                    up: i.key_down(egui::Key::W),
                    left: i.key_down(egui::Key::A),
                    down: i.key_down(egui::Key::S),
                    right: i.key_down(egui::Key::D),
                },
                i.key_down(egui::Key::ArrowLeft),
                i.key_down(egui::Key::ArrowRight),
            )
        });

        self.camera += pan.offset();

        if let Some(ref mut sim) = self.ctx_opt {
            apply_spin_input(sim, left, right);
        }
    }

    fn draw_scene(&self, painter: &egui::Painter, rect: egui::Rect) {
        let Some(ref sim) = self.ctx_opt else {
            return;
        };

        let center = rect.center();
        let origin = glam::Vec2::new(center.x, center.y);
        let screen = |p: glam::Vec2| {
            let s = to_screen(origin, self.camera, p);
            egui::pos2(s.x, s.y)
        };
        let white = egui::Color32::WHITE;

        for body in sim.scene.bodies() {
            painter.circle_stroke(
                screen(body.pos),
                body.radius,
                egui::Stroke::new(BODY_STROKE, white),
            );
            painter.line_segment(
                [screen(body.pos), screen(angle_marker(body))],
                egui::Stroke::new(BODY_STROKE, white),
            );
        }

        for segment in sim.scene.segments() {
            painter.line_segment(
                [screen(segment.p1), screen(segment.p2)],
                egui::Stroke::new(SEGMENT_STROKE, white),
            );
        }

        for handle in sim.scene.spring_handles() {
            let (p1, p2) = sim.scene.spring_endpoints(handle);
            let points = spring_coil(p1, p2).into_iter().map(&screen).collect();
            painter.add(egui::Shape::line(
                points,
                egui::Stroke::new(SPRING_STROKE, white),
            ));
        }
    }
}

impl eframe::App for ViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_file_changes();
        self.handle_input(ctx);

        let frame_seconds = ctx.input(|i| i.unstable_dt);
        if self.playing {
            let dt = self.clock.tick(frame_seconds);
            if let Some(ref mut sim) = self.ctx_opt {
                advance(sim, dt);
            }
        }

        let caption = self.clock.caption();
        ctx.send_viewport_cmd(egui::ViewportCommand::Title(caption.clone()));

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button(if self.playing { "⏸ Pause" } else { "▶ Play" }).clicked() {
                    self.playing = !self.playing;
                }

                if ui.button("⏮ Reset").clicked() {
                    self.reload_context();
                }

                if ui.button("⏭ Step").clicked() {
                    if let Some(ref mut sim) = self.ctx_opt {
                        let dt = sim.dt;
                        advance(sim, dt);
                    }
                }

                ui.separator();

                let mut ratio = self.clock.time_ratio();
                ui.label("Time ratio:");
                if ui.add(egui::Slider::new(&mut ratio, 0.1..=5.0)).changed() {
                    self.clock.set_time_ratio(ratio);
                }

                ui.separator();
                ui.label(caption);
            });
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                self.draw_scene(ui.painter(), rect);

                if let Some(ref error) = self.last_load_error {
                    ui.vertical_centered(|ui| {
                        ui.add_space(rect.height() * 0.4);
                        ui.label(
                            egui::RichText::new(format!("Error: {}", error))
                                .color(egui::Color32::RED)
                                .size(16.0),
                        );
                    });
                }
            });

        if self.playing {
            ctx.request_repaint();
        }
    }
}
