use egui::epaint::Shadow;

use super::coordinator::{SessionState, TickSnapshot};

pub struct DebugStats {
    pub fps: u32,
    pub frame_time_avg_ms: f32,
    pub frame_time_min_ms: f32,
    pub frame_time_max_ms: f32,
    pub resolution: (u32, u32),
    /// Grid size in cells.
    pub grid: (u32, u32),
    pub blocked_cells: usize,
    pub agent_count: usize,
    /// Time spent inside the last coordinator tick (ms).
    pub tick_ms: f32,
    pub tick: u64,
    pub state: SessionState,
    pub active: usize,
    pub searches: u64,
    pub failed_searches: u64,
    pub reshuffles: u32,
}

impl DebugStats {
    pub fn new() -> Self {
        Self {
            fps: 0,
            frame_time_avg_ms: 0.0,
            frame_time_min_ms: 0.0,
            frame_time_max_ms: 0.0,
            resolution: (0, 0),
            grid: (0, 0),
            blocked_cells: 0,
            agent_count: 0,
            tick_ms: 0.0,
            tick: 0,
            state: SessionState::IdleSettled,
            active: 0,
            searches: 0,
            failed_searches: 0,
            reshuffles: 0,
        }
    }

    /// Copy the per-tick counters out of a snapshot.
    pub fn record_tick(&mut self, snapshot: &TickSnapshot, tick_ms: f32) {
        self.tick = snapshot.tick;
        self.state = snapshot.state;
        self.active = snapshot.active;
        self.searches = snapshot.searches;
        self.failed_searches = snapshot.failed_searches;
        self.tick_ms = tick_ms;
        if snapshot.reshuffled {
            self.reshuffles += 1;
        }
    }
}

impl Default for DebugStats {
    fn default() -> Self {
        Self::new()
    }
}

pub struct DebugOverlay {
    pub visible: bool,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl DebugOverlay {
    pub fn new(
        window: &winit::window::Window,
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let egui_ctx = egui::Context::default();

        // Style: dark, semi-transparent, small monospace white font
        let mut visuals = egui::Visuals::dark();
        visuals.window_fill = egui::Color32::from_rgba_premultiplied(0, 0, 0, 180);
        visuals.window_stroke = egui::Stroke::NONE;
        visuals.window_shadow = Shadow::NONE;
        visuals.override_text_color = Some(egui::Color32::WHITE);
        egui_ctx.set_visuals(visuals);

        let mut style = (*egui_ctx.style()).clone();
        style.override_font_id = Some(egui::FontId::monospace(13.0));
        egui_ctx.set_style(style);

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            surface_format,
            None,  // no depth
            1,     // msaa samples
            false, // no dithering
        );

        Self {
            visible: false,
            egui_ctx,
            egui_state,
            egui_renderer,
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn handle_window_event(
        &mut self,
        window: &winit::window::Window,
        event: &winit::event::WindowEvent,
    ) -> egui_winit::EventResponse {
        self.egui_state.on_window_event(window, event)
    }

    /// Render one egui frame with the stats panel (`None` = hidden).
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &winit::window::Window,
        view: &wgpu::TextureView,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
        stats: Option<&DebugStats>,
    ) {
        let raw_input = self.egui_state.take_egui_input(window);

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if let Some(stats) = stats {
                egui::Area::new(egui::Id::new("debug_overlay"))
                    .fixed_pos(egui::pos2(10.0, 10.0))
                    .show(ctx, |ui| {
                        egui::Frame::none()
                            .fill(egui::Color32::from_rgba_premultiplied(0, 0, 0, 180))
                            .inner_margin(egui::Margin::same(8.0))
                            .rounding(4.0)
                            .show(ui, |ui: &mut egui::Ui| {
                                ui.label(format!("FPS: {}", stats.fps));
                                ui.label(format!(
                                    "Frame: {:.2} ms (min: {:.1} | max: {:.1})",
                                    stats.frame_time_avg_ms,
                                    stats.frame_time_min_ms,
                                    stats.frame_time_max_ms
                                ));
                                ui.label(format!(
                                    "Resolution: {} x {}  Grid: {} x {}",
                                    stats.resolution.0, stats.resolution.1,
                                    stats.grid.0, stats.grid.1
                                ));
                                ui.label(format!("Blocked cells: {}", stats.blocked_cells));
                                ui.label(format!(
                                    "Tick {} ({:.2} ms)  {:?}",
                                    stats.tick, stats.tick_ms, stats.state
                                ));
                                ui.label(format!(
                                    "Agents: {}  moving: {}  reshuffles: {}",
                                    stats.agent_count, stats.active, stats.reshuffles
                                ));
                                ui.label(format!(
                                    "Searches: {}  failed: {}",
                                    stats.searches, stats.failed_searches,
                                ));
                            });
                    });
            }
        });

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let tris = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, &tris, screen_descriptor);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.egui_renderer
                .render(&mut render_pass.forget_lifetime(), &tris, screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}
