//! Interactive session.
//!
//! [`Experience`] is the builder; [`Experience::run`] loads the model,
//! prepares every host-side array, opens a window and drives the frame
//! loop. The window is created hidden and only shown once every GPU
//! resource is in place, so a failed setup never shows a partial scene:
//! `run` returns the error instead.

use std::path::PathBuf;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::controls::Controls;
use crate::error::ExperienceError;
use crate::frame::{FrameDriver, FrameStage, FrameState};
use crate::gpu::{
    create_depth_texture, BackdropRenderer, FeedbackSimulator, GpuContext, OrbitCamera, ParticleRenderer,
    SnowRenderer,
};
use crate::loader::load_gltf;
use crate::mesh::SourceMesh;
use crate::preset::ModelPreset;
use crate::program::FLOW_FIELD_PROGRAM;
use crate::setup::{ParticleSetup, PARTICLE_VARIABLE};
use crate::snow::SnowField;

/// Radius of the procedural sphere used when no model is given.
const FALLBACK_RADIUS: f32 = 20.0;

/// Builder for an interactive session.
///
/// # Example
///
/// ```ignore
/// Experience::new()
///     .with_model_path("polar_bear.glb")
///     .with_preset(ModelPreset::default())
///     .run()?;
/// ```
pub struct Experience {
    mesh: Option<SourceMesh>,
    model_path: Option<PathBuf>,
    preset: ModelPreset,
    program: String,
    fallback_points: u32,
    title: String,
}

impl Experience {
    pub fn new() -> Self {
        Self {
            mesh: None,
            model_path: None,
            preset: ModelPreset::default(),
            program: FLOW_FIELD_PROGRAM.to_string(),
            fallback_points: 20_000,
            title: "Mesh Particles".to_string(),
        }
    }

    /// Use an already loaded mesh.
    pub fn with_mesh(mut self, mesh: SourceMesh) -> Self {
        self.mesh = Some(mesh);
        self
    }

    /// Load a `.glb`/`.gltf` at startup. Takes precedence over
    /// [`with_mesh`](Self::with_mesh).
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    pub fn with_preset(mut self, preset: ModelPreset) -> Self {
        self.preset = preset;
        self
    }

    /// Replace the particle update program.
    ///
    /// The program must define `fn update(coord: vec2<i32>, uv: vec2<f32>)
    /// -> vec4<f32>`; it can call `read_particles`, `read_base` and use
    /// `params.influence`, `params.strength` and `params.frequency`.
    pub fn with_program(mut self, wgsl: &str) -> Self {
        self.program = wgsl.to_string();
        self
    }

    /// Vertex count of the procedural sphere used without a model.
    pub fn with_fallback_points(mut self, count: u32) -> Self {
        self.fallback_points = count;
        self
    }

    pub fn without_snow(mut self) -> Self {
        self.preset.snow.enabled = false;
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Run until the window is closed.
    ///
    /// Asset and configuration errors are returned before or instead of
    /// showing the window.
    pub fn run(self) -> Result<(), ExperienceError> {
        self.preset.clear_color()?;

        let mesh = match (&self.model_path, self.mesh) {
            (Some(path), _) => load_gltf(path)?,
            (None, Some(mesh)) => mesh,
            (None, None) => SourceMesh::fibonacci_sphere(self.fallback_points, FALLBACK_RADIUS),
        };

        let mut rng = StdRng::from_entropy();
        let setup = ParticleSetup::from_mesh(&mesh, &mut rng)?;
        let controls = Controls::from_preset(&self.preset);
        // Catches program errors before a window exists
        let computation = setup.computation(&self.program, &controls)?;
        computation.compile()?;

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App {
            pending: Some(Pending {
                setup,
                program: self.program,
                preset: self.preset,
                controls,
                rng,
            }),
            title: self.title,
            session: None,
            driver: FrameDriver::new(),
            error: None,
            mouse_pressed: false,
            last_mouse_pos: None,
        };
        event_loop.run_app(&mut app)?;

        match app.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for Experience {
    fn default() -> Self {
        Self::new()
    }
}

/// Host data waiting for a window.
struct Pending {
    setup: ParticleSetup,
    program: String,
    preset: ModelPreset,
    controls: Controls,
    rng: StdRng,
}

/// Everything alive while the window is open.
struct Session {
    window: Arc<Window>,
    gpu: GpuContext,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    simulator: FeedbackSimulator,
    particles: ParticleRenderer,
    backdrop: BackdropRenderer,
    snow_field: SnowField,
    snow: SnowRenderer,
    camera: OrbitCamera,
    model: Mat4,
    clear_color: Vec3,
    controls: Controls,
    rng: StdRng,
    /// Set when the surface is out of memory; the loop exits.
    fatal: bool,
    #[cfg(feature = "egui")]
    egui: crate::gpu::egui_integration::EguiIntegration,
}

impl Session {
    fn new(window: Arc<Window>, pending: Pending) -> Result<Self, ExperienceError> {
        let Pending {
            setup,
            program,
            preset,
            controls,
            mut rng,
        } = pending;

        let (gpu, surface, config) = pollster::block_on(GpuContext::for_window(window.clone()))?;
        let depth_view = create_depth_texture(&gpu.device, &config);

        let computation = setup.computation(&program, &controls)?;
        let simulator = FeedbackSimulator::new(&gpu.device, &gpu.queue, computation)?;

        let mut particles = ParticleRenderer::new(&gpu.device, config.format, &setup.geometry, controls.particle_size);
        particles.set_resolution(config.width, config.height);

        let clear_color = preset.clear_color_linear()?;
        let backdrop = BackdropRenderer::new(&gpu.device, config.format, clear_color);

        let snow_field = SnowField::new(&preset.snow, &mut rng);
        let snow = SnowRenderer::new(&gpu.device, &gpu.queue, config.format, &snow_field);

        #[cfg(feature = "egui")]
        let egui = crate::gpu::egui_integration::EguiIntegration::new(&gpu.device, config.format, &window);

        Ok(Self {
            window,
            gpu,
            surface,
            config,
            depth_view,
            simulator,
            particles,
            backdrop,
            snow_field,
            snow,
            camera: OrbitCamera::looking_at_origin(preset.camera_position()),
            model: preset.model_matrix(),
            clear_color,
            controls,
            rng,
            fatal: false,
            #[cfg(feature = "egui")]
            egui,
        })
    }

    /// Reconfigure everything sized by the window.
    fn on_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.gpu.device, &self.config);
        self.depth_view = create_depth_texture(&self.gpu.device, &self.config);
        self.particles.set_resolution(width, height);
    }

    /// Render one frame; `running` selects the full scene or the backdrop
    /// shown while idle.
    fn render(&mut self, elapsed: f32, running: bool) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let aspect = self.config.width as f32 / self.config.height as f32;
        let view_matrix = self.camera.view_matrix();
        let projection = self.camera.projection_matrix(aspect);

        self.backdrop.update(&self.gpu.queue, view_matrix, projection);
        let draw_snow = running && self.controls.snow_enabled;
        if running {
            self.particles.set_matrices(projection, view_matrix, self.model);
            self.particles.uniforms.time = elapsed;
            self.particles.uniforms.size = self.controls.particle_size;
            self.particles.upload(&self.gpu.queue);
        }
        if draw_snow {
            self.snow
                .update(&self.gpu.queue, &self.snow_field, view_matrix, projection, elapsed);
        }

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: self.clear_color.x as f64,
                            g: self.clear_color.y as f64,
                            b: self.clear_color.z as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.backdrop.draw(&mut render_pass);
            if running {
                self.particles.draw(&mut render_pass);
            }
            if draw_snow {
                self.snow.draw(&mut render_pass);
            }
        }

        #[cfg(feature = "egui")]
        if running {
            let controls = &mut self.controls;
            self.egui.paint(
                &self.gpu.device,
                &self.gpu.queue,
                &mut encoder,
                &view,
                &self.window,
                [self.config.width, self.config.height],
                |ctx| controls.ui(ctx),
            );
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    fn present(&mut self, elapsed: f32, running: bool) {
        match self.render(elapsed, running) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.on_resize(self.config.width, self.config.height)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Surface out of memory");
                self.fatal = true;
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }
    }
}

impl FrameStage for Session {
    fn advance_host(&mut self, _elapsed: f32, delta: f32) {
        self.camera.update(delta);

        if self.snow_field.speed() != self.controls.snow_speed {
            self.snow_field.set_speed(self.controls.snow_speed);
        }
        if self.snow_field.size() != self.controls.snow_size {
            self.snow_field.set_size(self.controls.snow_size);
        }
        self.snow_field.enabled = self.controls.snow_enabled;
        if self.snow_field.enabled {
            self.snow_field.update(delta, &mut self.rng);
        }
    }

    fn step_simulation(&mut self, elapsed: f32, delta: f32) {
        self.simulator.set_param("influence", self.controls.influence);
        self.simulator.set_param("strength", self.controls.strength);
        self.simulator.set_param("frequency", self.controls.frequency);
        self.simulator.step(&self.gpu.device, &self.gpu.queue, elapsed, delta);
    }

    fn bind_simulation_output(&mut self) {
        if let Some(texture) = self.simulator.current_texture(PARTICLE_VARIABLE) {
            self.particles.bind_simulation_texture(&self.gpu.device, &texture);
        }
    }

    fn draw(&mut self, elapsed: f32) {
        self.present(elapsed, true);
    }
}

struct App {
    pending: Option<Pending>,
    title: String,
    session: Option<Session>,
    driver: FrameDriver,
    error: Option<ExperienceError>,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
}

impl App {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: ExperienceError) {
        log::error!("Setup failed: {}", err);
        self.error = Some(err);
        event_loop.exit();
    }

    /// Idle to Running, triggered by Enter, Space or a click.
    fn on_enter(&mut self) {
        if self.driver.enter() {
            if let Some(session) = &self.session {
                session.window.set_title(&self.title);
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        let window_attrs = Window::default_attributes()
            .with_title(format!("{} - press Enter", self.title))
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720))
            .with_visible(false);

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => return self.fail(event_loop, err.into()),
        };

        match Session::new(window.clone(), pending) {
            Ok(session) => {
                window.set_visible(true);
                window.request_redraw();
                self.session = Some(session);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        #[cfg(feature = "egui")]
        if let Some(session) = &mut self.session {
            if self.driver.state() == FrameState::Running
                && session.egui.on_window_event(&session.window, &event)
            {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(session) = &mut self.session {
                    session.on_resize(physical_size.width, physical_size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && !event.repeat
                    && matches!(event.logical_key, Key::Named(NamedKey::Enter | NamedKey::Space))
                {
                    self.on_enter();
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    if state == ElementState::Pressed && self.driver.state() == FrameState::Idle {
                        self.on_enter();
                        return;
                    }
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        let dx = position.x - last_x;
                        let dy = position.y - last_y;

                        if let Some(session) = &mut self.session {
                            session.camera.rotate(-dx as f32 * 0.005, -dy as f32 * 0.005);
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::RedrawRequested => {
                let Some(session) = &mut self.session else {
                    return;
                };

                if !self.driver.tick(session) {
                    session.present(0.0, false);
                }
                if session.fatal {
                    event_loop.exit();
                    return;
                }

                let clock = self.driver.clock();
                if self.driver.state() == FrameState::Running && clock.fps_refreshed() {
                    session
                        .window
                        .set_title(&format!("{} - {:.0} fps", self.title, clock.fps()));
                }
                session.window.request_redraw();
            }
            _ => {}
        }
    }
}
