//! Window creation and event handling via winit.
//!
//! [`AppState`] implements winit's [`ApplicationHandler`]. Every
//! `RedrawRequested` runs one [`FrameUpdater`] tick, and the tick's
//! [`FrameHost::request_next_tick`] asks winit for the next redraw, so the
//! loop is paced by the display until the [`ShutdownToken`] is cancelled.

use std::sync::Arc;

use haunted_config::{CameraConfig, Config, RenderConfig};
use haunted_input::{MouseState, OrbitControls};
use haunted_render::{
    RenderContext, RenderContextError, RendererSettings, SceneRenderer, SurfaceWrapper,
    init_render_context_blocking,
};
use haunted_scene::{
    FrameHost, FrameUpdater, SceneState, ShutdownToken, Timer, build_haunted_house,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

/// Errors that end the application early.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("GPU initialization failed: {0}")]
    Render(#[from] RenderContextError),
}

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    let attrs = WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            f64::from(config.window.width),
            f64::from(config.window.height),
        ));
    if config.window.fullscreen {
        attrs.with_fullscreen(Some(Fullscreen::Borderless(None)))
    } else {
        attrs
    }
}

/// Orbit controls centred on the origin with the configured damping.
pub fn orbit_controls_from_config(camera: &CameraConfig) -> OrbitControls {
    OrbitControls::new(glam::Vec3::ZERO).with_damping(camera.enable_damping, camera.damping_factor)
}

pub fn renderer_settings(render: &RenderConfig) -> RendererSettings {
    RendererSettings {
        shadows: render.shadows,
        shadow_map_size: render.shadow_map_size,
    }
}

/// Escape closes the viewer.
fn is_exit_key(key: &Key, state: ElementState) -> bool {
    state == ElementState::Pressed && *key == Key::Named(NamedKey::Escape)
}

fn frame_limit_reached(ticks: u64, limit: Option<u64>) -> bool {
    limit.is_some_and(|limit| ticks >= limit)
}

/// The GPU side of the frame loop: draws into the window and schedules redraws.
pub struct WindowHost {
    window: Arc<Window>,
    gpu: RenderContext,
    renderer: SceneRenderer,
    shutdown: ShutdownToken,
    skipped_frames: u64,
}

impl WindowHost {
    fn resize(&mut self, surface: &SurfaceWrapper) {
        let physical = surface.physical_size();
        self.gpu.resize(physical.width, physical.height);
        self.renderer.resize(&self.gpu, surface.render_size());
    }
}

impl FrameHost for WindowHost {
    fn render(&mut self, state: &SceneState) {
        match self.renderer.render(&self.gpu, state) {
            Ok(()) => {}
            Err(e) if e.is_fatal() => {
                error!("Unrecoverable surface error: {e}");
                self.shutdown.cancel();
            }
            Err(e) => {
                self.skipped_frames += 1;
                warn!(skipped = self.skipped_frames, "Frame skipped: {e}");
            }
        }
    }

    fn request_next_tick(&mut self) {
        self.window.request_redraw();
    }
}

/// Application state: the scene, the frame updater, input, and (once the
/// window exists) the GPU host.
pub struct AppState {
    config: Config,
    frame_limit: Option<u64>,
    shutdown: ShutdownToken,
    scene: SceneState,
    updater: FrameUpdater<Timer, ChaCha8Rng>,
    controls: OrbitControls,
    mouse: MouseState,
    surface: SurfaceWrapper,
    host: Option<WindowHost>,
    failure: Option<AppError>,
}

impl AppState {
    /// Build the scene from `config`. `frame_limit` stops the loop after that
    /// many ticks; a limit of zero runs none.
    pub fn new(config: Config, frame_limit: Option<u64>) -> Self {
        let mut layout_rng = match config.scene.grave_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };
        let scene = build_haunted_house(&config, &mut layout_rng);
        let updater = FrameUpdater::new(Timer::new(), ChaCha8Rng::from_os_rng())
            .with_log_interval(config.debug.frame_log_interval);
        let controls = orbit_controls_from_config(&config.camera);
        let surface = SurfaceWrapper::new(
            config.window.width,
            config.window.height,
            1.0,
            config.render.max_pixel_ratio,
        );

        let shutdown = ShutdownToken::new();
        if frame_limit_reached(0, frame_limit) {
            info!("Frame limit is zero, nothing to run");
            shutdown.cancel();
        }

        Self {
            config,
            frame_limit,
            shutdown,
            scene,
            updater,
            controls,
            mouse: MouseState::new(),
            surface,
            host: None,
            failure: None,
        }
    }

    /// Token that stops the frame loop when cancelled.
    pub fn shutdown_token(&self) -> ShutdownToken {
        self.shutdown.clone()
    }

    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    pub fn ticks(&self) -> u64 {
        self.updater.ticks()
    }

    fn create_host(&mut self, event_loop: &ActiveEventLoop) -> Result<WindowHost, AppError> {
        let window = Arc::new(event_loop.create_window(window_attributes_from_config(&self.config))?);
        let inner = window.inner_size();
        self.surface = SurfaceWrapper::new(
            inner.width,
            inner.height,
            window.scale_factor(),
            self.config.render.max_pixel_ratio,
        );
        let physical = self.surface.physical_size();
        let render_size = self.surface.render_size();
        info!(
            "Surface {}x{} (scale {:.2}), rendering at {}x{}",
            physical.width,
            physical.height,
            self.surface.scale_factor(),
            render_size.width,
            render_size.height
        );

        let gpu = init_render_context_blocking(
            window.clone(),
            physical.width,
            physical.height,
            self.config.window.vsync,
        )?;
        let renderer = SceneRenderer::new(
            &gpu,
            &self.scene.scene,
            render_size,
            renderer_settings(&self.config.render),
        );
        self.scene
            .camera
            .set_aspect_ratio(physical.width as f32, physical.height as f32);
        self.controls.set_viewport_height(physical.height);

        Ok(WindowHost {
            window,
            gpu,
            renderer,
            shutdown: self.shutdown.clone(),
            skipped_frames: 0,
        })
    }

    /// Restart elapsed time so window and GPU start-up is not part of the
    /// first tick.
    fn start_clock(&mut self) {
        self.updater.restart_clock(Timer::new());
    }

    fn apply_resize(&mut self) {
        let physical = self.surface.physical_size();
        self.scene
            .camera
            .set_aspect_ratio(physical.width as f32, physical.height as f32);
        self.controls.set_viewport_height(physical.height);
        if let Some(host) = &mut self.host {
            host.resize(&self.surface);
        }
    }

    fn redraw(&mut self) {
        let Some(host) = &mut self.host else {
            return;
        };
        self.controls.handle_input(&self.mouse, &self.scene.camera);
        self.updater
            .tick_unless_cancelled(&self.shutdown, &mut self.scene, &mut self.controls, host);
        self.mouse.clear_transients();

        if frame_limit_reached(self.updater.ticks(), self.frame_limit) {
            info!("Frame limit of {} reached", self.updater.ticks());
            self.shutdown.cancel();
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.host.is_some() {
            return;
        }
        if self.shutdown.is_cancelled() {
            event_loop.exit();
            return;
        }
        match self.create_host(event_loop) {
            Ok(host) => {
                self.start_clock();
                host.window.request_redraw();
                self.host = Some(host);
            }
            Err(e) => {
                error!("{e}");
                self.failure = Some(e);
                self.shutdown.cancel();
                event_loop.exit();
            }
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
                self.shutdown.cancel();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if is_exit_key(&event.logical_key, event.state) {
                    info!("Escape pressed, shutting down");
                    self.shutdown.cancel();
                }
            }
            WindowEvent::Resized(new_size) => {
                if let Some(resize) = self.surface.handle_resize(new_size.width, new_size.height) {
                    self.apply_resize();
                    debug!(
                        "Window resized to {}x{}, rendering at {}x{}",
                        resize.physical.width,
                        resize.physical.height,
                        resize.render.width,
                        resize.render.height
                    );
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(window) = self.host.as_ref().map(|h| h.window.clone()) {
                    let inner = window.inner_size();
                    let resize = self.surface.handle_scale_factor_changed(
                        scale_factor,
                        inner.width,
                        inner.height,
                    );
                    self.apply_resize();
                    info!(
                        "Scale factor changed to {:.2}, rendering at {}x{}",
                        resize.scale_factor, resize.render.width, resize.render.height
                    );
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse.on_cursor_moved(position.x, position.y);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.mouse.on_button(button, state);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.mouse.on_scroll(delta);
            }
            WindowEvent::CursorEntered { .. } => {
                self.mouse.on_cursor_entered();
            }
            WindowEvent::CursorLeft { .. } => {
                self.mouse.on_cursor_left();
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }

        if self.shutdown.is_cancelled() {
            event_loop.exit();
        }
    }
}

/// Open the window and run the frame loop until the viewer is closed, Escape
/// is pressed, or `frame_limit` ticks have run.
///
/// # Errors
///
/// Returns [`AppError`] if the event loop, window, or GPU context cannot be
/// created.
#[instrument(skip(config))]
pub fn run(config: Config, frame_limit: Option<u64>) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    let mut app = AppState::new(config, frame_limit);
    event_loop.run_app(&mut app)?;

    if let Some(host) = &app.host {
        info!(
            frames = host.renderer.frames_rendered(),
            skipped = host.skipped_frames,
            textures = host.renderer.texture_count(),
            "Viewer closed"
        );
    }
    match app.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
