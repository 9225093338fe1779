//! Window creation and the winit event loop.
//!
//! [`OrreryApp`] implements [`ApplicationHandler`]: it creates the window,
//! GPU context and renderer on `resumed`, forwards input into the trackers,
//! and runs one orchestrated frame per `RedrawRequested`.

use std::sync::Arc;

use orrery_config::Config;
use orrery_input::{InputMap, KeyboardState, MouseState};
use orrery_render::{RenderContext, SurfaceError, init_render_context_blocking};
use orrery_scene::Scene;
use tracing::{error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use crate::error::AppError;
use crate::frame::{FrameState, FrameTimer};
use crate::orchestrator::{FrameInput, Orchestrator};
use crate::renderer::SceneRenderer;

/// [`WindowAttributes`] for the configured size, title and fullscreen mode.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ))
        .with_fullscreen(
            config
                .window
                .fullscreen
                .then_some(Fullscreen::Borderless(None)),
        )
}

/// Window, GPU and renderer, created together on first resume.
struct Graphics {
    window: Arc<Window>,
    gpu: RenderContext,
    renderer: SceneRenderer,
}

/// Application state driven by the event loop.
pub struct OrreryApp {
    config: Config,
    scene: Scene,
    orchestrator: Orchestrator,
    state: FrameState,
    timer: FrameTimer,
    input_map: InputMap,
    keyboard: KeyboardState,
    mouse: MouseState,
    graphics: Option<Graphics>,
    fatal: Option<AppError>,
}

impl OrreryApp {
    pub fn new(config: Config, scene: Scene) -> Self {
        Self {
            orchestrator: Orchestrator::from_config(&config.render),
            state: FrameState::from_config(&config),
            timer: FrameTimer::new(),
            input_map: InputMap::fly_camera(),
            keyboard: KeyboardState::new(),
            mouse: MouseState::new(),
            graphics: None,
            fatal: None,
            config,
            scene,
        }
    }

    pub fn state(&self) -> &FrameState {
        &self.state
    }

    fn init_graphics(&self, event_loop: &ActiveEventLoop) -> Result<Graphics, AppError> {
        let attributes = window_attributes_from_config(&self.config);
        let window = Arc::new(event_loop.create_window(attributes)?);
        let gpu = init_render_context_blocking(Arc::clone(&window), self.config.window.vsync)?;
        let renderer = SceneRenderer::new(&gpu, &self.scene, &self.config)?;
        Ok(Graphics {
            window,
            gpu,
            renderer,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: AppError) {
        error!("{err}");
        self.fatal = Some(err);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let dt = self.timer.tick();
        let input = FrameInput {
            actions: self.input_map.resolve(&self.keyboard),
            mouse_delta: self.mouse.delta(),
        };
        self.keyboard.clear_transients();
        self.mouse.clear_transients();

        let plan = self
            .orchestrator
            .run_frame(&mut self.state, &self.scene, &input, dt);

        let Some(graphics) = &mut self.graphics else {
            return;
        };
        match graphics.renderer.render(&graphics.gpu, &plan) {
            Ok(_) => {}
            Err(AppError::Surface(SurfaceError::Lost)) => {
                warn!("Surface lost, reconfiguring");
                let (width, height) = self.state.viewport();
                graphics.gpu.resize(width, height);
            }
            Err(err) => {
                self.fail(event_loop, err);
                return;
            }
        }

        if self.state.exit_requested() {
            info!(day = self.state.clock.day(), "Exiting");
            event_loop.exit();
        } else {
            graphics.window.request_redraw();
        }
    }

    /// The error that stopped the loop, if any.
    pub fn take_error(&mut self) -> Option<AppError> {
        self.fatal.take()
    }
}

impl ApplicationHandler for OrreryApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.graphics.is_some() {
            return;
        }
        match self.init_graphics(event_loop) {
            Ok(graphics) => {
                let size = graphics.window.inner_size();
                self.state.resize(size.width, size.height);
                self.mouse.set_captured(&graphics.window, true);
                graphics.window.request_redraw();
                self.timer = FrameTimer::new();
                info!(
                    "Window ready: {}x{} ({})",
                    size.width, size.height, self.config.window.title
                );
                self.graphics = Some(graphics);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.state.resize(size.width, size.height);
                if let Some(graphics) = &mut self.graphics {
                    graphics.gpu.resize(size.width, size.height);
                    graphics.renderer.resize(&graphics.gpu);
                }
                info!("Window resized to {}x{}", size.width, size.height);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.keyboard.process_event(&event);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse.on_cursor_moved(position.x, position.y);
            }
            WindowEvent::CursorLeft { .. } => {
                self.mouse.on_cursor_left();
            }
            WindowEvent::Focused(false) => {
                self.keyboard.release_all();
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.mouse.on_raw_motion(delta.0, delta.1);
        }
    }
}

/// Build the solar system and run the viewer until the window closes.
#[instrument(skip_all)]
pub fn run(config: Config) -> Result<(), AppError> {
    let scene = Scene::solar_system(config.render.sky_radius)?;
    let event_loop = EventLoop::new()?;
    let mut app = OrreryApp::new(config, scene);
    event_loop.run_app(&mut app)?;
    app.take_error().map_or(Ok(()), Err)
}
