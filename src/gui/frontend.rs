#![allow(clippy::collapsible_if)]
use std::time::{Duration, Instant};

use eframe::egui::{self, Color32, Rect, Sense, Stroke, Vec2};

use crate::graph_utils::graph::GraphDocument;
use crate::graph_utils::layout::ViewMode;
use crate::gui::info_panel::InfoPanel;
use crate::interaction::gesture::{PointerEvent, PointerKind};
use crate::interaction::router::RouteOutcome;
use crate::loader::{DataLoader, DataSource};
use crate::persistence::persist::{self, ViewStateFile};
use crate::persistence::settings::AppSettings;
use crate::scene::picking;
use crate::viewer::session::ViewerSession;
use crate::viewer::xr::{XrCapability, XrRuntime};

// Mouse shares the pointer id space with touches; keep them apart
const MOUSE_POINTER_ID: u64 = 0;
const TOUCH_ID_BASE: u64 = 1;

const NODE_MIN_PX: f32 = 2.5;
const NODE_MAX_PX: f32 = 48.0;

// Style for toast notifications
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum NoticeStyle {
    Subtle,
    Prominent,
}

enum LoadStatus {
    // nothing requested yet
    Idle,
    Loading,
    Failed(String),
    Ready,
}

pub struct ViewerApp {
    settings: AppSettings,
    loader: Option<DataLoader>,
    source: Option<DataSource>,
    status: LoadStatus,
    document: Option<GraphDocument>,
    session: Option<ViewerSession>,
    // source the current session was built from
    session_source: Option<String>,
    mode: ViewMode,
    xr: Box<dyn XrRuntime>,
    saved_view: Option<ViewStateFile>,
    source_input: String,
    hover_node: Option<usize>,
    // transient toast
    notice: Option<String>,
    notice_time: Option<Instant>,
    notice_style: NoticeStyle,
}

impl ViewerApp {
    pub fn new(
        ctx: &egui::Context,
        settings: AppSettings,
        source: Option<DataSource>,
        mode: ViewMode,
        xr: Box<dyn XrRuntime>,
    ) -> Self {
        let loader = match DataLoader::new() {
            Ok(mut l) => {
                let repaint = ctx.clone();
                l.set_notifier(move || repaint.request_repaint());
                Some(l)
            }
            Err(e) => {
                log::error!("failed to start loader runtime: {}", e);
                None
            }
        };
        let saved_view = if settings.restore_view {
            persist::load_view_state(&settings).unwrap_or_else(|e| {
                log::warn!("ignoring unreadable view state: {}", e);
                None
            })
        } else {
            None
        };
        let mut s = Self {
            settings,
            loader,
            source: None,
            status: LoadStatus::Idle,
            document: None,
            session: None,
            session_source: None,
            mode: ViewMode::Desktop,
            xr,
            saved_view,
            source_input: String::new(),
            hover_node: None,
            notice: None,
            notice_time: None,
            notice_style: NoticeStyle::Subtle,
        };
        if mode == ViewMode::Ar {
            s.enter_mode(ViewMode::Ar);
        }
        if let Some(src) = source {
            s.start_load(src);
        }
        s
    }

    fn notify(&mut self, msg: impl Into<String>, style: NoticeStyle) {
        self.notice = Some(msg.into());
        self.notice_time = Some(Instant::now());
        self.notice_style = style;
    }

    fn source_key(&self) -> Option<String> {
        self.source.as_ref().map(|s| s.to_string())
    }

    fn start_load(&mut self, source: DataSource) {
        self.source_input = source.to_string();
        let Some(loader) = self.loader.as_mut() else {
            self.status = LoadStatus::Failed("Loader unavailable".into());
            return;
        };
        if loader.is_loading() {
            log::info!("superseding in-flight load with {}", source);
        }
        loader.start(source.clone());
        self.source = Some(source);
        self.status = LoadStatus::Loading;
    }

    fn retry(&mut self) {
        if let Some(src) = self.source.clone() {
            self.start_load(src);
        }
    }

    fn poll_loader(&mut self) {
        let Some(outcome) = self.loader.as_mut().and_then(|l| l.poll()) else { return };
        match outcome.result {
            Ok(doc) => {
                log::info!(
                    "loaded {} entities, {} relationships from {}",
                    doc.entities.len(),
                    doc.relationships.len(),
                    outcome.source
                );
                self.document = Some(doc);
                self.status = LoadStatus::Ready;
                self.rebuild_session();
            }
            Err(e) => {
                log::error!("loading {} failed: {}", outcome.source, e);
                self.status = LoadStatus::Failed(e.to_string());
            }
        }
    }

    // Fresh session for the current mode; any previous selection goes with the old one
    fn rebuild_session(&mut self) {
        self.save_view_state();
        self.hover_node = None;
        let Some(doc) = &self.document else {
            self.session = None;
            return;
        };
        let mut session = ViewerSession::new(doc, self.mode, &self.settings);
        let key = self.source_key();
        if let Some(saved) = &self.saved_view
            && saved.matches(key.as_deref(), self.mode)
        {
            session.restore_view(saved);
        }
        self.session = Some(session);
        self.session_source = key;
    }

    fn enter_mode(&mut self, mode: ViewMode) {
        if mode == self.mode {
            return;
        }
        if mode == ViewMode::Ar {
            if let XrCapability::Unsupported(reason) = self.xr.immersive_ar_support() {
                log::warn!("AR unavailable: {}", reason);
                self.notify(reason, NoticeStyle::Prominent);
                return;
            }
        }
        self.mode = mode;
        self.rebuild_session();
        self.notify(format!("{} mode", mode.as_str()), NoticeStyle::Subtle);
    }

    fn switch_mode(&mut self) {
        let next = match self.mode {
            ViewMode::Desktop => ViewMode::Ar,
            ViewMode::Ar => ViewMode::Desktop,
        };
        self.enter_mode(next);
    }

    // Exit leaves AR first; from the 3D view it closes the window
    fn exit(&mut self, ctx: &egui::Context) {
        match self.mode {
            ViewMode::Ar => self.enter_mode(ViewMode::Desktop),
            ViewMode::Desktop => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
        }
    }

    fn save_view_state(&mut self) {
        if !self.settings.restore_view {
            return;
        }
        let Some(session) = &self.session else { return };
        let state = session.view_state(self.session_source.clone());
        match persist::save_view_state(&self.settings, &state) {
            Ok(path) => log::debug!("view state saved to {}", path.display()),
            Err(e) => log::warn!("failed to save view state: {}", e),
        }
        self.saved_view = Some(state);
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        // Desktop viewer only; text fields keep their keys
        if self.mode != ViewMode::Desktop || ctx.memory(|m| m.focused().is_some()) {
            return;
        }
        let (reset, fit) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::R) || i.key_pressed(egui::Key::Escape),
                i.key_pressed(egui::Key::F),
            )
        });
        if let Some(session) = self.session.as_mut() {
            if reset {
                session.reset_view();
            }
            if fit {
                session.fit_view();
            }
        }
    }

    fn top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("KG-Viewer");
                ui.separator();

                let has_session = self.session.is_some();
                if ui.add_enabled(has_session, egui::Button::new("Reset View")).on_hover_text("R / Esc").clicked() {
                    if let Some(s) = self.session.as_mut() { s.reset_view(); }
                }
                if ui.add_enabled(has_session, egui::Button::new("Fit")).on_hover_text("F").clicked() {
                    if let Some(s) = self.session.as_mut() { s.fit_view(); }
                }
                if ui.add_enabled(has_session, egui::Button::new("Zoom In")).clicked() {
                    if let Some(s) = self.session.as_mut() { s.zoom_in(); }
                }
                if ui.add_enabled(has_session, egui::Button::new("Zoom Out")).clicked() {
                    if let Some(s) = self.session.as_mut() { s.zoom_out(); }
                }
                let switch_label = match self.mode {
                    ViewMode::Desktop => "Enter AR",
                    ViewMode::Ar => "Back to 3D",
                };
                if ui.button(switch_label).clicked() {
                    self.switch_mode();
                }
                if ui.button("Exit").clicked() {
                    self.exit(ctx);
                }

                ui.separator();
                // Mode indicator
                let mode_color = match self.mode {
                    ViewMode::Desktop => Color32::from_rgb(120, 220, 255),
                    ViewMode::Ar => Color32::from_rgb(255, 200, 80),
                };
                ui.colored_label(mode_color, format!("Mode: {}", self.mode.as_str()));
                if self.session.as_ref().is_some_and(|s| s.rotate_armed()) {
                    ui.small("rotate");
                }
            });
        });
    }

    fn stats_bar(&mut self, ctx: &egui::Context) {
        let Some(session) = &self.session else { return };
        let stats = session.stats();
        egui::TopBottomPanel::bottom("stats_bar").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                ui.small(format!("Nodes: {}", stats.nodes));
                ui.small(format!("Links: {}", stats.links));
                for (t, count) in &stats.types {
                    let name = if t.is_empty() { "(untyped)" } else { t.as_str() };
                    ui.small(format!("{}: {}", name, count));
                }
                if let Some(src) = &self.source {
                    ui.separator();
                    ui.small(src.to_string());
                }
            });
        });
    }

    fn info_panel(&mut self, ctx: &egui::Context) {
        let Some(info) = self.session.as_ref().and_then(|s| s.selected_info()) else { return };
        let mut close = false;
        egui::SidePanel::right("info_panel")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| {
                draw_info(ui, &info);
                ui.add_space(8.0);
                if ui.button("Close").clicked() {
                    close = true;
                }
            });
        if close {
            if let Some(s) = self.session.as_mut() {
                s.clear_selection();
            }
        }
    }

    fn source_prompt(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.3);
            ui.heading("Open a knowledge graph");
            ui.label("JSON file path or http(s) URL");
            let resp = ui.add(egui::TextEdit::singleline(&mut self.source_input).desired_width(420.0));
            let submit = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Open").clicked() || submit {
                match self.source_input.parse::<DataSource>() {
                    Ok(src) => self.start_load(src),
                    Err(e) => self.status = LoadStatus::Failed(e.to_string()),
                }
            }
        });
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        let Some(session) = self.session.as_mut() else { return };
        let rect = ui.available_rect_before_wrap();
        let resp = ui.allocate_rect(rect, Sense::click_and_drag());

        for ev in pointer_events(ui.ctx(), rect, resp.hovered()) {
            for outcome in session.handle_pointer(ev, rect) {
                if let RouteOutcome::Selected(idx) = outcome {
                    if let Some(n) = session.graph().node(idx) {
                        log::info!("selected {:?}", n.entity.id);
                    }
                }
            }
        }
        let now = ui.input(|i| i.time);
        session.tick(now, rect);
        if session.long_press_pending() {
            ui.ctx().request_repaint_after(Duration::from_millis(50));
        }

        self.hover_node = ui
            .ctx()
            .pointer_hover_pos()
            .filter(|p| rect.contains(*p))
            .and_then(|p| session.node_at(p, rect));

        paint_scene(ui, rect, session, self.hover_node, self.settings.label_hide_node_threshold);
    }

    fn failure_screen(&mut self, ui: &mut egui::Ui, err: String) {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.3);
            ui.heading("Could not load the graph");
            ui.colored_label(Color32::from_rgb(255, 120, 120), err);
            ui.add_space(8.0);
            if self.source.is_some() && ui.button("Retry").clicked() {
                self.retry();
            }
            if ui.button("Open another…").clicked() {
                self.status = LoadStatus::Idle;
            }
        });
    }

    fn toast(&self, ctx: &egui::Context) {
        // Bottom-right transient info toast (visible for 3 seconds)
        if let (Some(msg), Some(when)) = (&self.notice, self.notice_time) {
            if Instant::now().duration_since(when) <= Duration::from_secs(3) {
                let margin = egui::vec2(12.0, 36.0);
                egui::Area::new("bottom_right_toast".into())
                    .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-margin.x, -margin.y))
                    .interactable(false)
                    .show(ctx, |ui| {
                        let (fill, stroke_col, stroke_w, text_col, inner_margin) = match self.notice_style {
                            NoticeStyle::Subtle => (
                                Color32::from_rgba_premultiplied(20, 20, 20, 170),
                                Color32::from_gray(60),
                                0.5,
                                Color32::from_gray(200),
                                egui::Margin::symmetric(8, 6),
                            ),
                            NoticeStyle::Prominent => (
                                Color32::from_rgba_premultiplied(30, 30, 30, 230),
                                Color32::from_gray(100),
                                1.5,
                                Color32::from_rgb(255, 200, 80),
                                egui::Margin::symmetric(12, 8),
                            ),
                        };
                        egui::Frame::popup(ui.style())
                            .corner_radius(egui::CornerRadius::same(8))
                            .stroke(Stroke { width: stroke_w, color: stroke_col })
                            .fill(fill)
                            .inner_margin(inner_margin)
                            .show(ui, |ui| match self.notice_style {
                                NoticeStyle::Subtle => { ui.small(egui::RichText::new(msg).color(text_col)); }
                                NoticeStyle::Prominent => { ui.colored_label(text_col, msg); }
                            });
                    });
                ctx.request_repaint_after(Duration::from_millis(250));
            }
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_loader();
        self.handle_shortcuts(ctx);
        self.top_bar(ctx);
        self.stats_bar(ctx);
        self.info_panel(ctx);

        egui::CentralPanel::default().show(ctx, |ui| match &self.status {
            LoadStatus::Idle => self.source_prompt(ui),
            LoadStatus::Loading => {
                ui.centered_and_justified(|ui| {
                    ui.horizontal_centered(|ui| {
                        ui.spinner();
                        ui.label("Loading graph…");
                    });
                });
            }
            LoadStatus::Failed(err) => {
                let err = err.clone();
                self.failure_screen(ui, err);
            }
            LoadStatus::Ready => self.canvas(ui),
        });

        self.toast(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(loader) = self.loader.as_mut() {
            loader.cancel();
        }
        self.save_view_state();
    }
}

fn draw_info(ui: &mut egui::Ui, info: &InfoPanel) {
    let type_name = if info.entity_type.is_empty() { "Entity" } else { info.entity_type.as_str() };
    ui.small(type_name);
    ui.heading(&info.label);
    ui.monospace(format!("id: {}", info.id));
    if let Some(doc) = &info.source_doc {
        ui.small(format!("source: {}", doc));
    }
    if !info.properties.is_empty() {
        ui.separator();
        egui::ScrollArea::vertical().show(ui, |ui| {
            for line in info.property_lines() {
                ui.label(line);
            }
        });
    }
}

/// Translate this frame's egui input into classifier events.
fn pointer_events(ctx: &egui::Context, rect: Rect, hovered: bool) -> Vec<PointerEvent> {
    ctx.input(|i| {
        let time = i.time;
        // Touch screens also emit emulated mouse events; prefer the touches
        let has_touch = i.events.iter().any(|e| matches!(e, egui::Event::Touch { .. }));
        let mut out = Vec::new();
        for e in &i.events {
            match e {
                egui::Event::Touch { id, phase, pos, .. } => {
                    let id = TOUCH_ID_BASE + id.0;
                    let pos = *pos;
                    match phase {
                        egui::TouchPhase::Start => {
                            if rect.contains(pos) {
                                out.push(PointerEvent::Down { id, kind: PointerKind::Touch, pos, time });
                            }
                        }
                        egui::TouchPhase::Move => out.push(PointerEvent::Move { id, pos, time }),
                        egui::TouchPhase::End => out.push(PointerEvent::Up { id, pos, time }),
                        egui::TouchPhase::Cancel => out.push(PointerEvent::Cancel { id }),
                    }
                }
                egui::Event::PointerButton { pos, button: egui::PointerButton::Primary, pressed, .. } if !has_touch => {
                    let pos = *pos;
                    if *pressed {
                        if hovered && rect.contains(pos) {
                            out.push(PointerEvent::Down { id: MOUSE_POINTER_ID, kind: PointerKind::Mouse, pos, time });
                        }
                    } else {
                        out.push(PointerEvent::Up { id: MOUSE_POINTER_ID, pos, time });
                    }
                }
                egui::Event::PointerMoved(pos) if !has_touch => {
                    out.push(PointerEvent::Move { id: MOUSE_POINTER_ID, pos: *pos, time });
                }
                _ => {}
            }
        }
        if hovered {
            let delta = i.raw_scroll_delta.y;
            if delta != 0.0 {
                out.push(PointerEvent::Wheel { delta });
            }
        }
        out
    })
}

// Blend toward white by the emissive intensity, and toward the background with distance
fn shade(color: Color32, emissive: f32, fog: f32) -> Color32 {
    let e = emissive.clamp(0.0, 1.0);
    let f = fog.clamp(0.0, 0.7);
    let ch = |c: u8| -> u8 {
        let lit = c as f32 + (255.0 - c as f32) * e;
        (lit * (1.0 - f) + 20.0 * f) as u8
    };
    Color32::from_rgb(ch(color.r()), ch(color.g()), ch(color.b()))
}

fn paint_scene(ui: &egui::Ui, rect: Rect, session: &ViewerSession, hover: Option<usize>, label_threshold: usize) {
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, Color32::from_rgb(16, 18, 24));

    let graph = session.graph();
    let camera = session.camera();
    let transform = session.transform();
    let selected = session.selection().selected();

    // Reticle: AR placement indicator under the graph origin
    if session.mode() == ViewMode::Ar {
        if let Some(p) = camera.project(transform.apply(glam::Vec3::ZERO), rect) {
            let r = (camera.pixels_per_unit(p.depth, rect) * ViewMode::Ar.base_radius() * 0.25).clamp(6.0, 60.0);
            painter.circle_stroke(p.pos, r, Stroke::new(2.0, Color32::from_rgb(255, 200, 80)));
        }
    }

    let projected: Vec<_> = graph
        .nodes
        .iter()
        .map(|n| camera.project(transform.apply(n.position), rect))
        .collect();
    let far = projected.iter().flatten().map(|p| p.depth).fold(f32::MIN, f32::max);
    let near = projected.iter().flatten().map(|p| p.depth).fold(f32::MAX, f32::min);
    let span = (far - near).max(1e-3);

    // Links under nodes
    for link in &graph.links {
        if let (Some(a), Some(b)) = (projected[link.source], projected[link.target]) {
            let incident = |i: Option<usize>| i.is_some_and(|i| i == link.source || i == link.target);
            let stroke = if incident(selected) {
                Stroke::new(2.5, Color32::from_rgb(255, 200, 80))
            } else if incident(hover) {
                Stroke::new(2.0, Color32::from_rgb(120, 220, 255))
            } else {
                Stroke::new(1.0, Color32::from_rgba_premultiplied(150, 150, 160, 140))
            };
            painter.line_segment([a.pos, b.pos], stroke);
        }
    }

    // Far to near so closer nodes cover further ones
    let mut order: Vec<usize> = (0..graph.nodes.len()).filter(|&i| projected[i].is_some()).collect();
    order.sort_by(|&a, &b| {
        let da = projected[a].map(|p| p.depth).unwrap_or(0.0);
        let db = projected[b].map(|p| p.depth).unwrap_or(0.0);
        db.total_cmp(&da)
    });

    let show_all_labels = graph.node_count() <= label_threshold;
    let font = egui::FontId::proportional(12.0);
    for idx in order {
        let (Some(p), Some(node)) = (projected[idx], graph.node(idx)) else { continue };
        let world_r = picking::node_radius(graph, idx, session.mode(), transform);
        let r = (world_r * camera.pixels_per_unit(p.depth, rect)).clamp(NODE_MIN_PX, NODE_MAX_PX);
        let fog = (p.depth - near) / span * 0.5;
        painter.circle_filled(p.pos, r, shade(node.color, node.visual.emissive, fog));
        let is_sel = selected == Some(idx);
        let is_hover = hover == Some(idx);
        if is_sel {
            painter.circle_stroke(p.pos, r + 2.0, Stroke::new(2.0, Color32::WHITE));
        } else if is_hover {
            painter.circle_stroke(p.pos, r + 1.5, Stroke::new(1.5, Color32::from_rgb(120, 220, 255)));
        }
        if show_all_labels || is_sel || is_hover {
            let text_col = if is_sel { Color32::WHITE } else { Color32::from_gray(200) };
            painter.text(
                p.pos + Vec2::new(0.0, r + 2.0),
                egui::Align2::CENTER_TOP,
                node.entity.display_name(),
                font.clone(),
                text_col,
            );
        }
    }

    if graph.is_empty() {
        painter.text(rect.center(), egui::Align2::CENTER_CENTER, "Graph is empty", font, Color32::from_gray(160));
    }

}
