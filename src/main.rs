// Maze swarm viewer: agents wander a generated maze on INSTANCED quads.
// Hold the left mouse button to pull them into an orbit around the cursor;
// release it and they walk back to their parking slots.
//
// F3 toggles the stats overlay, Escape quits. RUST_LOG controls logging and
// MAZE_SWARM_SEED pins the random seed.

use std::sync::Arc;
use std::time::Instant;

use bevy_ecs::prelude::*;
use glam::Mat4;
use rand::rngs::StdRng;
use rand::SeedableRng;
use winit::{
    event::{ElementState, Event as WinitEvent, KeyEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorIcon, Window},
};

use maze_swarm::engine::camera::GridCamera;
use maze_swarm::engine::components::COLOR_BACKGROUND;
use maze_swarm::engine::debug_overlay::{DebugOverlay, DebugStats};
use maze_swarm::engine::input::InputState;
use maze_swarm::engine::maze::{self, MazeConfig};
use maze_swarm::engine::systems::{self, SpriteInstance};
use maze_swarm::engine::{GridPlanner, InitError, MotionCoordinator, ObstacleMask, SwarmConfig};

// ============================================================================
// VIEWER SETTINGS
// ============================================================================

/// Pixels per grid cell.
const CELL_PX: f32 = 2.0;
/// Agent radius in cells; also the obstacle inflation.
const VIEW_AGENT_RADIUS: u32 = 3;
/// Orbit radius in cells (about 32 px on screen).
const VIEW_ORBIT_RADIUS: f32 = 16.0;
const VIEW_MAZE: MazeConfig = MazeConfig {
    tile: 10,
    wall: 2,
    max_attempts: 16,
};

fn viewer_config(seed: Option<u64>) -> SwarmConfig {
    SwarmConfig {
        inflate_radius: VIEW_AGENT_RADIUS,
        orbit_radius: VIEW_ORBIT_RADIUS,
        seed,
        ..Default::default()
    }
}

// ============================================================================
// VERTEX DEFINITION
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
}

impl Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

// ============================================================================
// INSTANCE DATA (per-sprite)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct InstanceData {
    center: [f32; 3],
    round: f32,
    size: [f32; 2],
    _padding: [f32; 2],  // Align color to 16 bytes
    color: [f32; 4],
}

impl InstanceData {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,  // One per instance, not per vertex
            attributes: &[
                // Center (location 1)
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Round flag (location 2)
                wgpu::VertexAttribute {
                    offset: 12,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32,
                },
                // Size (location 3)
                wgpu::VertexAttribute {
                    offset: 16,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // Color (location 4)
                wgpu::VertexAttribute {
                    offset: 32,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

impl From<&SpriteInstance> for InstanceData {
    fn from(s: &SpriteInstance) -> Self {
        Self {
            center: s.center.to_array(),
            round: if s.round { 1.0 } else { 0.0 },
            size: s.size.to_array(),
            _padding: [0.0; 2],
            color: [s.color.r, s.color.g, s.color.b, 1.0],
        }
    }
}

// Unit quad centred on the origin
const QUAD_VERTICES: &[Vertex] = &[
    Vertex { position: [-0.5, -0.5, 0.0] },
    Vertex { position: [ 0.5, -0.5, 0.0] },
    Vertex { position: [ 0.5,  0.5, 0.0] },
    Vertex { position: [-0.5,  0.5, 0.0] },
];

const QUAD_INDICES: &[u16] = &[0, 1, 2, 0, 2, 3];

// ============================================================================
// UNIFORM DATA (camera only)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
}

impl Uniforms {
    fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
        }
    }
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

struct State {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    render_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    num_indices: u32,
    max_instances: usize,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    overlay: DebugOverlay,

    // Simulation
    coordinator: MotionCoordinator<GridPlanner>,
    camera: GridCamera,
    input: InputState,
    rng: StdRng,
    stats: DebugStats,

    // ECS World (render entities)
    world: World,
}

/// Generate the obstacle mask for the current viewport.
fn build_mask(camera: &GridCamera, rng: &mut StdRng) -> Result<ObstacleMask, InitError> {
    let bounds = camera.grid_bounds();
    maze::generate_mask(bounds.width, bounds.height, &VIEW_MAZE, rng)
}

/// Respawn wall spans and agent discs for a fresh session.
fn populate_world(world: &mut World, mask: &ObstacleMask, camera: &GridCamera, agents: usize) -> usize {
    systems::clear_world(world);
    let spans = systems::spawn_obstacle_spans(world, mask, camera);
    let diameter = (2 * VIEW_AGENT_RADIUS) as f32 * CELL_PX;
    systems::spawn_agent_sprites(world, agents, diameter);
    spans + agents
}

impl State {
    async fn new(window: Arc<Window>, seed: Option<u64>) -> Self {
        use wgpu::util::DeviceExt;

        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone()).unwrap();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .unwrap();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .unwrap();

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader_instanced.wgsl").into()),
        });

        let uniforms = Uniforms::new();

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("uniform_bind_group_layout"),
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("uniform_bind_group"),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc(), InstanceData::desc()],  // Vertex + Instance buffers
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,  // Y-down projection flips winding
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        let num_indices = QUAD_INDICES.len() as u32;

        let overlay = DebugOverlay::new(&window, &device, surface_format);

        // Build the first session from a maze sized to the window
        let mut camera = GridCamera::new(CELL_PX);
        camera.resize(config.width, config.height);
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let mask = build_mask(&camera, &mut rng).expect("maze generation failed");
        let coordinator = MotionCoordinator::from_mask(viewer_config(seed), &mask, GridPlanner::new())
            .expect("invalid swarm configuration");

        let mut world = World::new();
        let needed = populate_world(&mut world, &mask, &camera, coordinator.agents().len());

        // Create instance buffer (large enough for every wall span and agent)
        let max_instances = needed.next_power_of_two();
        let instance_buffer = create_instance_buffer(&device, max_instances);

        let mut stats = DebugStats::new();
        stats.resolution = (config.width, config.height);
        stats.grid = (coordinator.field().width(), coordinator.field().height());
        stats.blocked_cells = coordinator.field().blocked_count();
        stats.agent_count = coordinator.agents().len();

        Self {
            window,
            surface,
            device,
            queue,
            config,
            render_pipeline,
            vertex_buffer,
            index_buffer,
            instance_buffer,
            num_indices,
            max_instances,
            uniform_buffer,
            uniform_bind_group,
            overlay,
            coordinator,
            camera,
            input: InputState::new(),
            rng,
            stats,
            world,
        }
    }

    /// On a real viewport change, reconfigure the surface and start a new
    /// session on a maze that fits it.
    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if !self.camera.resize(new_size.width, new_size.height) {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        if let Err(e) = self.rebuild_session() {
            log::error!("could not rebuild session after resize: {}", e);
        }
    }

    /// Recover a lost surface without touching the simulation.
    fn reconfigure_surface(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// New maze for the current viewport; agents restart on the top band.
    fn rebuild_session(&mut self) -> Result<(), InitError> {
        let mask = build_mask(&self.camera, &mut self.rng)?;
        self.coordinator.rebuild(&mask)?;

        let needed = populate_world(
            &mut self.world,
            &mask,
            &self.camera,
            self.coordinator.agents().len(),
        );
        if needed > self.max_instances {
            self.max_instances = needed.next_power_of_two();
            self.instance_buffer = create_instance_buffer(&self.device, self.max_instances);
        }

        self.stats.resolution = (self.config.width, self.config.height);
        self.stats.grid = (self.coordinator.field().width(), self.coordinator.field().height());
        self.stats.blocked_cells = self.coordinator.field().blocked_count();
        self.stats.reshuffles = 0;
        Ok(())
    }

    fn update(&mut self) {
        let pointer = self.input.pointer_input(&self.camera);
        if self.input.was_pressed() {
            self.window.set_cursor(CursorIcon::Crosshair);
        } else if self.input.was_released() {
            self.window.set_cursor(CursorIcon::Default);
        }

        let started = Instant::now();
        let snapshot = self.coordinator.tick(pointer);
        let tick_ms = started.elapsed().as_secs_f32() * 1000.0;

        self.stats.record_tick(&snapshot, tick_ms);
        systems::sync_agent_sprites(&mut self.world, &snapshot, &self.camera);
        self.input.end_frame();
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Collect instance data from ECS BEFORE creating render pass
        let instance_data: Vec<InstanceData> = systems::collect_instances(&mut self.world)
            .iter()
            .map(InstanceData::from)
            .collect();

        let instance_count = instance_data.len().min(self.max_instances);

        // Write instance data to buffer BEFORE render pass
        if !instance_data.is_empty() {
            self.queue.write_buffer(
                &self.instance_buffer,
                0,
                bytemuck::cast_slice(&instance_data[..instance_count]),
            );
        }

        let uniforms = Uniforms {
            view_proj: self.camera.view_projection().to_cols_array_2d(),
        };
        self.queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: COLOR_BACKGROUND.r as f64,
                            g: COLOR_BACKGROUND.g as f64,
                            b: COLOR_BACKGROUND.b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));  // Instance data
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);

            // ONE DRAW CALL for walls and agents
            render_pass.draw_indexed(0..self.num_indices, 0, 0..instance_count as u32);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };
        let stats = self.overlay.visible.then_some(&self.stats);
        self.overlay.render(
            &self.device,
            &self.queue,
            &mut encoder,
            &self.window,
            &view,
            &screen_descriptor,
            stats,
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Instance Buffer"),
        size: (capacity * std::mem::size_of::<InstanceData>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

// ============================================================================
// MAIN
// ============================================================================

fn main() {
    env_logger::init();

    let seed = std::env::var("MAZE_SWARM_SEED")
        .ok()
        .and_then(|s| s.parse::<u64>().ok());

    let event_loop = EventLoop::new().unwrap();

    let window_attributes = Window::default_attributes()
        .with_title("Maze Swarm - hold the left mouse button to gather the agents")
        .with_inner_size(winit::dpi::LogicalSize::new(1024, 512));

    let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

    let mut state = pollster::block_on(State::new(window.clone(), seed));
    let mut frame_count = 0;
    let mut frame_ms_sum = 0.0f32;
    let mut frame_ms_min = f32::MAX;
    let mut frame_ms_max = 0.0f32;
    let mut last_frame = Instant::now();
    let mut last_fps_update = Instant::now();

    event_loop.run(move |event, control_flow| {
        match event {
            WinitEvent::WindowEvent {
                ref event,
                window_id,
            } if window_id == window.id() => {
                let _ = state.overlay.handle_window_event(&window, event);
                state.input.process_event(event);

                match event {
                    WindowEvent::CloseRequested
                    | WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                state: ElementState::Pressed,
                                physical_key: PhysicalKey::Code(KeyCode::Escape),
                                ..
                            },
                        ..
                    } => control_flow.exit(),
                    WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                state: ElementState::Pressed,
                                physical_key: PhysicalKey::Code(KeyCode::F3),
                                repeat: false,
                                ..
                            },
                        ..
                    } => state.overlay.toggle(),
                    WindowEvent::Resized(physical_size) => {
                        state.resize(*physical_size);
                    }
                    WindowEvent::RedrawRequested => {
                        let now = Instant::now();
                        let frame_ms = (now - last_frame).as_secs_f32() * 1000.0;
                        last_frame = now;

                        state.update();
                        match state.render() {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost) => state.reconfigure_surface(),
                            Err(wgpu::SurfaceError::OutOfMemory) => control_flow.exit(),
                            Err(e) => log::warn!("{:?}", e),
                        }

                        frame_count += 1;
                        frame_ms_sum += frame_ms;
                        frame_ms_min = frame_ms_min.min(frame_ms);
                        frame_ms_max = frame_ms_max.max(frame_ms);
                        if (now - last_fps_update).as_secs_f32() >= 1.0 {
                            state.stats.fps = frame_count;
                            state.stats.frame_time_avg_ms = frame_ms_sum / frame_count as f32;
                            state.stats.frame_time_min_ms = frame_ms_min;
                            state.stats.frame_time_max_ms = frame_ms_max;
                            log::debug!(
                                "FPS: {} | tick {} {:?} | moving {}",
                                frame_count, state.stats.tick, state.stats.state, state.stats.active
                            );
                            frame_count = 0;
                            frame_ms_sum = 0.0;
                            frame_ms_min = f32::MAX;
                            frame_ms_max = 0.0;
                            last_fps_update = now;
                        }
                    }
                    _ => {}
                }
            }
            WinitEvent::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    }).unwrap();
}
