//! Driftwater - animated water with a floating hull
//!
//! A noise-driven heightfield moves the water, the hull rides it, and a
//! mirror pass reflects the scene while the sun runs its day cycle.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use driftwater::camera::CameraSystem;
use driftwater::cli::Args;
use driftwater::error::RenderError;
use driftwater::frame::FrameOrchestrator;
use driftwater::object::ObjectHandle;
use driftwater::params::*;
use driftwater::rendering::RenderSystem;
use driftwater::sky::AnalyticSky;

const TITLE: &str = "Driftwater";

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,
    /// Set when startup failed; the frame loop never runs
    startup_failed: bool,

    // Simulation
    orchestrator: FrameOrchestrator,
    camera: CameraSystem,
    water: WaterParams,
    shading: ShadingParams,

    last_frame: Instant,
}

impl App {
    fn new(args: &Args) -> anyhow::Result<Self> {
        let water = args.water_params().context("invalid water parameters")?;
        let render_config = args.render_config().context("invalid window size")?;
        let clock = args.clock_params().context("invalid clock settings")?;
        let alignment = AlignmentParams::default();
        alignment.validate().context("invalid alignment parameters")?;
        let sun_cycle = SunCycle::default();
        sun_cycle.validate().context("invalid sun cycle")?;
        let shading = ShadingParams::default();

        // Assets load on a worker thread; frames no-op until they arrive
        let object = ObjectHandle::spawn(args.asset_request());
        let orchestrator = FrameOrchestrator::new(
            water.clone(),
            shading.clone(),
            alignment,
            sun_cycle,
            &clock,
            object,
        );
        let camera = CameraSystem::new(args.camera_preset(), render_config);

        Ok(Self {
            window: None,
            render_system: None,
            startup_failed: false,
            orchestrator,
            camera,
            water,
            shading,
            last_frame: Instant::now(),
        })
    }

    /// Show a startup failure in the title bar and stop rendering
    fn fail_startup(&mut self, window: &Window, error: &RenderError) {
        log::error!("Renderer unavailable: {}", error);
        window.set_title(&format!("{} - {}", TITLE, error));
        self.startup_failed = true;
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.render_system.is_none() {
            return;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.startup_failed {
            return; // Already initialized
        }

        let config = self.camera.config();
        let window_attributes = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(winit::dpi::PhysicalSize::new(
                config.window_width,
                config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let sky = Box::new(AnalyticSky::new(AtmosphereParams::default()));
        match pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            self.camera.config(),
            self.water.clone(),
            self.shading.clone(),
            sky,
        )) {
            Ok(render_system) => {
                log::info!("Driftwater is running (C: switch camera, ESC: quit)");
                let size = window.inner_size();
                self.camera.resize(size.width, size.height);
                self.render_system = Some(render_system);
                self.last_frame = Instant::now();
            }
            Err(e) => self.fail_startup(&window, &e),
        }
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat: false,
                        ..
                    },
                ..
            } => match code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::KeyC => {
                    let mode = self.camera.toggle();
                    log::info!("Camera: {:?}", mode);
                }
                _ => {}
            },
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => self.camera.set_dragging(state == ElementState::Pressed),
            WindowEvent::CursorMoved { position, .. } => {
                self.camera.cursor_moved(position.x as f32, position.y as f32)
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
                };
                self.camera.scroll(lines);
            }
            WindowEvent::Resized(size) => {
                self.camera.resize(size.width, size.height);
                if let Some(render_system) = &mut self.render_system {
                    render_system.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.render_frame(),
            _ => {}
        }
    }
}

impl App {
    /// Run one orchestrated frame
    fn render_frame(&mut self) {
        let Some(render_system) = &mut self.render_system else {
            return;
        };

        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        let camera = self.camera.camera();
        match self.orchestrator.run_frame(render_system, &camera, dt) {
            Ok(_) => {}
            Err(RenderError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::warn!("Surface lost, reconfiguring");
                render_system.reconfigure();
            }
            Err(e) => log::error!("Render error: {}", e),
        }

        if let Some(window) = &self.window {
            window.set_title(&format!("{} - {}", TITLE, self.orchestrator.clock().label()));
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut app = App::new(&args)?;
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.run_app(&mut app).context("event loop terminated abnormally")?;
    Ok(())
}
