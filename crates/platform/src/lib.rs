//! Platform layer: window, event loop and the per-frame update/draw cycle.
//!
//! Startup runs inside `resumed`: window -> device -> loading screen -> mesh
//! parse -> upload. After that every redraw does, strictly in order:
//! frame delta, input -> camera, transform upload, draw.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use asset::ProgressSink;
use corelib::{Camera, Projection, Transform, model_view_projection};
use renderer::GpuState;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowId},
};

pub mod input;
pub mod timing;

use input::InputState;
use timing::{FpsCounter, FrameClock, FrameLimiter};

const LOADING_TITLE: &str = "Loading...";
const VIEWER_TITLE: &str = "Triangle Splatting Real-Time Engine";

/// Runtime options gathered by the binary.
#[derive(Clone, Debug)]
pub struct Config {
    pub mesh_path: PathBuf,
    pub backends: wgpu::Backends,
    pub width: u32,
    pub height: u32,
    /// Frame-rate cap; 0 disables it.
    pub max_fps: u32,
    pub show_fps: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mesh_path: PathBuf::from("room.off"),
            backends: wgpu::Backends::all(),
            width: 1280,
            height: 720,
            max_fps: 60,
            show_fps: false,
        }
    }
}

/// Open the viewer and block until the window is closed.
/// Fails if the mesh can't be loaded or the device can't be initialised.
pub fn run(config: Config) -> Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::new(config);
    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow!("Event loop error: {e:?}"))?;

    match app.failure.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct App {
    config: Config,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,

    camera: Camera,
    projection: Projection,
    model: Transform,
    input: InputState,

    clock: FrameClock,
    limiter: FrameLimiter,
    fps: FpsCounter,

    failure: Option<anyhow::Error>,
}

impl App {
    fn new(config: Config) -> Self {
        let projection = Projection::new(config.width, config.height);
        let limiter = FrameLimiter::new(config.max_fps);
        Self {
            config,
            window: None,
            gpu: None,
            camera: Camera::default(),
            projection,
            model: Transform::asset_orientation(),
            input: InputState::new(),
            clock: FrameClock::new(),
            limiter,
            fps: FpsCounter::new(Duration::from_secs(1)),
            failure: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(LOADING_TITLE)
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("Failed to create window")?,
        );
        let size = window.inner_size();
        log::info!("Window created: {}x{}", size.width, size.height);
        self.window = Some(window.clone());

        let mut gpu = pollster::block_on(GpuState::new(window.clone(), self.config.backends))
            .context("GPU initialization failed")?;

        let mut screen = LoadingScreen {
            gpu: &gpu,
            window: &window,
        };
        screen.report(0.0, "Starting Loading...");
        let path = &self.config.mesh_path;
        let soup = asset::load_off_from_path(path, screen)
            .with_context(|| format!("Failed to load mesh {}", path.display()))?;
        gpu.upload_mesh(&soup).context("Mesh upload failed")?;

        window.set_title(VIEWER_TITLE);
        grab_cursor(&window);

        let (width, height) = gpu.size();
        self.projection.set_viewport(width, height);
        self.gpu = Some(gpu);
        self.clock.reset();
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let dt = self.clock.tick();
        let keys = self.input.keys();
        let pointer = self.input.take_pointer_delta();
        self.camera.process_input(&keys, pointer, dt);

        gpu.set_transform(model_view_projection(
            &self.projection,
            &self.camera,
            &self.model,
        ));
        match gpu.render() {
            Ok(()) => {}
            Err(err) if GpuState::is_surface_lost(&err) => {
                log::warn!("Surface {err:?}; reconfiguring");
                gpu.recreate_surface();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory; exiting");
                event_loop.exit();
            }
            Err(err) => log::warn!("Frame skipped: {err:?}"),
        }

        if self.config.show_fps {
            if let Some(fps) = self.fps.frame(Instant::now()) {
                log::info!("FPS: {fps:.1}");
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.start(event_loop) {
            log::error!("{err:#}");
            self.failure = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                let pressed = event.state == ElementState::Pressed;
                if code == KeyCode::Escape && pressed {
                    log::info!("Escape pressed. Exiting event loop.");
                    event_loop.exit();
                } else {
                    self.input.set_key(code, pressed);
                }
            }
            WindowEvent::Focused(false) => self.input.release_all(),
            WindowEvent::Resized(new_size) => {
                log::info!("Resized: {}x{}", new_size.width, new_size.height);
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(new_size.width, new_size.height);
                    let (width, height) = gpu.size();
                    self.projection.set_viewport(width, height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn device_event(&mut self, _: &ActiveEventLoop, _: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if self.gpu.is_some() {
                self.input.add_pointer_motion(dx, dy);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = &self.window else {
            return;
        };
        if self.limiter.ready(Instant::now()) {
            window.request_redraw();
        }
        match self.limiter.deadline() {
            Some(deadline) => event_loop.set_control_flow(ControlFlow::WaitUntil(deadline)),
            None => event_loop.set_control_flow(ControlFlow::Poll),
        }
    }
}

/// Progress sink that draws the loading bar and mirrors the message in the title.
struct LoadingScreen<'a> {
    gpu: &'a GpuState,
    window: &'a Window,
}

impl ProgressSink for LoadingScreen<'_> {
    fn report(&mut self, fraction: f32, message: &str) {
        self.window.set_title(&format!("{LOADING_TITLE} {message}"));
        if let Err(err) = self.gpu.render_loading(fraction) {
            log::warn!("Loading frame skipped: {err:?}");
        }
    }
}

fn grab_cursor(window: &Window) {
    // Confined isn't available everywhere (macOS), Locked isn't on Windows.
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Confined)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked));
    if let Err(err) = grabbed {
        log::warn!("Cursor grab unavailable: {err}");
    }
    window.set_cursor_visible(false);
}
