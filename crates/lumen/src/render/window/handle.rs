//! Frame orchestrator
//!
//! [`Window`] owns everything a frame touches: the window backend, the render
//! back end, the batch controller, the camera and the input collector. Its
//! [`run`](Window::run) method drives the application through a fixed-step
//! loop:
//!
//! - updates fire at most once per loop iteration, every `1e9 / max_ups` ns
//!   of accumulated time, followed by the engine's loopers
//! - frames fire every `1e9 / max_fps` ns: clear, application draw, input
//!   edge roll, projection refresh, batch flush, buffer swap
//! - every second the frame and tick counts become the observed FPS and UPS
//!
//! Callback failures never leave the loop; they are reported through the
//! engine's [`ErrorRouter`] and the loop carries on.

use std::fmt;

use crate::application::Application;
use crate::core::config::WindowConfig;
use crate::engine::Engine;
use crate::foundation::logging::{codes, ErrorRouter, Severity};
use crate::foundation::math::{screen_projection, Mat4};
use crate::foundation::time::{nanos_per_tick, Clock, MonotonicClock, NANOS_PER_SECOND};
use crate::input::InputManager;
use crate::render::backend::{ClearMask, Render};
use crate::render::batch_controller::BatchController;
use crate::render::camera::Camera2D;
use crate::render::window::backend::{CursorShape, WindowBackend, WindowError, WindowEvent, WindowRect, WindowResult};

/// Callback invoked after every framebuffer resize
pub type ResizeCallback = Box<dyn FnMut(&Window)>;

/// Lifecycle of a [`Window`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// Constructed, nothing allocated on the GPU yet
    Created,
    /// Batches allocated and projection set, application not started
    Initialized,
    /// Inside the frame loop
    Running,
    /// GPU resources and the native window released
    Terminated,
}

/// Window and frame loop
pub struct Window {
    config: WindowConfig,
    state: WindowState,
    backend: Box<dyn WindowBackend>,
    render: Box<dyn Render>,
    clock: Box<dyn Clock>,
    batch: BatchController,
    camera: Camera2D,
    input: InputManager,
    router: ErrorRouter,

    width: u32,
    height: u32,
    projection: Mat4,

    time_u: f64,
    time_f: f64,
    delta_u: f64,
    delta_f: f64,
    frames: u32,
    ticks: u32,
    current_fps: u32,
    current_ups: u32,
    current_frame: u64,
    current_tick: u64,
    last_title: String,

    resize_callbacks: Vec<ResizeCallback>,
    windowed_rect: Option<WindowRect>,
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("state", &self.state)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("fps", &self.current_fps)
            .field("ups", &self.current_ups)
            .field("current_frame", &self.current_frame)
            .finish_non_exhaustive()
    }
}

impl Window {
    /// Assemble a window from its back ends
    ///
    /// Nothing touches the GPU until [`run`](Self::run). Batches hold
    /// `batch_size` vertices.
    pub fn new(
        config: WindowConfig,
        backend: Box<dyn WindowBackend>,
        render: Box<dyn Render>,
        batch_size: usize,
        router: ErrorRouter,
    ) -> Self {
        let (width, height) = (config.width, config.height);
        Self {
            time_u: nanos_per_tick(config.max_ups),
            time_f: nanos_per_tick(config.max_fps),
            last_title: config.title.clone(),
            config,
            state: WindowState::Created,
            backend,
            render,
            clock: Box::new(MonotonicClock::new()),
            batch: BatchController::new(batch_size),
            camera: Camera2D::default(),
            input: InputManager::new(),
            router,
            width,
            height,
            projection: screen_projection(width, height),
            delta_u: 0.0,
            delta_f: 0.0,
            frames: 0,
            ticks: 0,
            current_fps: 0,
            current_ups: 0,
            current_frame: 0,
            current_tick: 0,
            resize_callbacks: Vec::new(),
            windowed_rect: None,
        }
    }

    /// Replace the time source of the frame loop
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run the application until the window closes
    ///
    /// `start` runs once before the loop and `exit` once after it, whatever
    /// the callbacks returned. GPU resources and the native window are
    /// released before `exit` is called.
    pub fn run<A: Application + ?Sized>(&mut self, engine: &mut Engine, app: &mut A) -> WindowResult<()> {
        if self.state != WindowState::Created {
            return Err(WindowError::InvalidState(self.state));
        }

        if let Err(e) = self.init() {
            log::error!("Window initialization failed: {e}");
            self.terminate();
            return Err(e);
        }

        if let Err(e) = app.start(engine, self) {
            self.router.send(codes::APP_START, Severity::Recoverable, &e);
        }

        self.state = WindowState::Running;
        log::info!("Entering frame loop ({} FPS, {} UPS)", self.config.max_fps, self.config.max_ups);
        self.main_loop(engine, app);

        self.terminate();

        if let Err(e) = app.exit(engine, self) {
            self.router.send(codes::APP_EXIT, Severity::Recoverable, &e);
        }
        Ok(())
    }

    fn init(&mut self) -> WindowResult<()> {
        self.batch.start(self.render.as_mut())?;

        let (width, height) = self.backend.size();
        self.width = width;
        self.height = height;
        self.render.set_viewport(width, height);
        self.refresh_projection();

        self.backend.set_swap_interval(self.config.vsync);
        if self.config.fullscreen {
            self.set_fullscreen(true);
        }

        self.state = WindowState::Initialized;
        log::info!("Window initialized at {width}x{height}");
        Ok(())
    }

    fn main_loop<A: Application + ?Sized>(&mut self, engine: &mut Engine, app: &mut A) {
        let mut prev = self.clock.now_nanos();
        let mut second = prev;

        while !self.backend.should_close() {
            let now = self.clock.now_nanos();
            let elapsed = now.saturating_sub(prev) as f64;
            self.delta_u += elapsed / self.time_u;
            self.delta_f += elapsed / self.time_f;
            prev = now;

            self.pump_events();

            if self.delta_u >= 1.0 {
                if let Err(e) = app.update(engine, self) {
                    self.router.send(codes::APP_UPDATE, Severity::Recoverable, &e);
                }
                engine.tick_loopers(self);
                self.refresh_title();
                self.delta_u -= 1.0;
                self.ticks += 1;
                self.current_tick += 1;
            }

            if self.delta_f >= 1.0 {
                self.render.clear(ClearMask::all());
                if let Err(e) = app.draw(engine, self) {
                    self.router.send(codes::APP_DRAW, Severity::Recoverable, &e);
                }
                self.input.update();
                self.refresh_projection();
                if let Err(e) = self.batch.finish_and_render(self.render.as_mut()) {
                    self.router.send(codes::RENDER_FLUSH, Severity::Recoverable, &e);
                }
                self.backend.swap_buffers();
                self.delta_f -= 1.0;
                self.frames += 1;
                self.current_frame += 1;
            }

            if now.saturating_sub(second) >= NANOS_PER_SECOND {
                second += NANOS_PER_SECOND;
                self.current_fps = self.frames;
                self.current_ups = self.ticks;
                self.frames = 0;
                self.ticks = 0;
                log::trace!("{} FPS, {} UPS", self.current_fps, self.current_ups);
            }
        }
    }

    fn terminate(&mut self) {
        self.render.release();
        self.backend.destroy();
        self.state = WindowState::Terminated;
        log::info!("Window terminated after {} frames", self.current_frame);
    }

    fn pump_events(&mut self) {
        for event in self.backend.poll_events() {
            match event {
                WindowEvent::Resized(width, height) => self.handle_resize(width, height),
                WindowEvent::CloseRequested => self.backend.set_should_close(true),
                _ => self.input.handle_event(&event),
            }
        }
    }

    fn handle_resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        // A minimized window reports 0x0; keep drawing with the last valid projection.
        if !self.is_minimized() {
            self.render.set_viewport(width, height);
            self.refresh_projection();
        }

        let mut callbacks = std::mem::take(&mut self.resize_callbacks);
        for callback in &mut callbacks {
            callback(&*self);
        }
        // Callbacks registered during dispatch run from the next resize on.
        callbacks.append(&mut self.resize_callbacks);
        self.resize_callbacks = callbacks;
    }

    fn refresh_projection(&mut self) {
        if !self.is_minimized() {
            self.projection = screen_projection(self.width, self.height);
        }
        self.render.set_projection(&self.projection);
        self.render.set_view(&self.camera.view_matrix());
    }

    fn composed_title(&self) -> String {
        if self.config.append_fps_to_title {
            self.config.fps_append.format(&self.config.title, self.current_fps)
        } else {
            self.config.title.clone()
        }
    }

    fn refresh_title(&mut self) {
        let title = self.composed_title();
        if title != self.last_title {
            self.backend.set_title(&title);
            self.last_title = title;
        }
    }

    /// True while the framebuffer has no area
    pub fn is_minimized(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Ask the loop to exit at the next iteration boundary
    pub fn stop(&mut self) {
        self.backend.set_should_close(true);
    }

    /// Current lifecycle state
    pub fn state(&self) -> WindowState {
        self.state
    }

    /// Framebuffer width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Framebuffer height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Dots per inch of the monitor
    pub fn dpi(&self) -> f32 {
        self.backend.dpi()
    }

    /// Frames rendered during the last full second
    pub fn fps(&self) -> u32 {
        self.current_fps
    }

    /// Updates run during the last full second
    pub fn ups(&self) -> u32 {
        self.current_ups
    }

    /// Render pacing cap
    pub fn fps_cap(&self) -> u32 {
        self.config.max_fps
    }

    /// Update pacing cap
    pub fn ups_cap(&self) -> u32 {
        self.config.max_ups
    }

    /// Change the render pacing cap; takes effect on the next iteration
    pub fn set_fps_cap(&mut self, max_fps: u32) {
        self.config.max_fps = max_fps;
        self.time_f = nanos_per_tick(max_fps);
    }

    /// Change the update pacing cap; takes effect on the next iteration
    pub fn set_ups_cap(&mut self, max_ups: u32) {
        self.config.max_ups = max_ups;
        self.time_u = nanos_per_tick(max_ups);
    }

    /// Frames rendered since the loop started
    pub fn current_frame(&self) -> u64 {
        self.current_frame
    }

    /// Updates run since the loop started
    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// Fraction of a frame interval accumulated towards the next frame
    pub fn delta_time(&self) -> f64 {
        self.delta_f
    }

    /// Screen-space orthographic projection
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// True when swap interval 1 is requested
    pub fn is_vsync(&self) -> bool {
        self.config.vsync
    }

    /// Toggle vertical sync
    pub fn set_vsync(&mut self, vsync: bool) {
        self.config.vsync = vsync;
        self.backend.set_swap_interval(vsync);
    }

    /// True while the window covers the primary monitor
    pub fn is_fullscreen(&self) -> bool {
        self.windowed_rect.is_some()
    }

    /// Enter or leave fullscreen
    ///
    /// Entering saves the window's position and size; leaving restores them.
    /// The new size arrives through the next event pump like any resize.
    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        match (fullscreen, self.windowed_rect) {
            (true, None) => {
                let (x, y) = self.backend.position();
                let rect = WindowRect {
                    x,
                    y,
                    width: self.width,
                    height: self.height,
                };
                if self.backend.set_fullscreen().is_some() {
                    self.windowed_rect = Some(rect);
                    self.config.fullscreen = true;
                } else {
                    log::warn!("No primary monitor available, staying windowed");
                }
            }
            (false, Some(rect)) => {
                self.backend.set_windowed(rect);
                self.windowed_rect = None;
                self.config.fullscreen = false;
            }
            _ => {}
        }
    }

    /// Flip between fullscreen and windowed
    pub fn toggle_fullscreen(&mut self) {
        self.set_fullscreen(!self.is_fullscreen());
    }

    /// Title prefix
    pub fn title(&self) -> &str {
        &self.config.title
    }

    /// Replace the title prefix and show it immediately
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.config.title = title.into();
        self.last_title = self.composed_title();
        self.backend.set_title(&self.last_title);
    }

    /// Change the cursor shape
    pub fn set_cursor(&mut self, cursor: CursorShape) {
        self.backend.set_cursor(cursor);
    }

    /// Clipboard contents, if they are text
    pub fn clipboard(&self) -> Option<String> {
        self.backend.clipboard()
    }

    /// Replace the clipboard contents
    pub fn set_clipboard(&mut self, text: &str) {
        self.backend.set_clipboard(text);
    }

    /// Register a callback run after every resize, in registration order
    pub fn add_resize_callback(&mut self, callback: impl FnMut(&Window) + 'static) {
        self.resize_callbacks.push(Box::new(callback));
    }

    /// Batch controller for draw submissions
    pub fn batch_controller(&self) -> &BatchController {
        &self.batch
    }

    /// Mutable batch controller for draw submissions
    pub fn batch_controller_mut(&mut self) -> &mut BatchController {
        &mut self.batch
    }

    /// Render back end
    pub fn render(&self) -> &dyn Render {
        self.render.as_ref()
    }

    /// Mutable render back end, e.g. for texture uploads
    pub fn render_mut(&mut self) -> &mut dyn Render {
        self.render.as_mut()
    }

    /// Window backend
    pub fn backend(&self) -> &dyn WindowBackend {
        self.backend.as_ref()
    }

    /// 2D camera applied to vertices drawn with the camera flag
    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    /// Mutable 2D camera
    pub fn camera_mut(&mut self) -> &mut Camera2D {
        &mut self.camera
    }

    /// Keyboard and mouse state
    pub fn input(&self) -> &InputManager {
        &self.input
    }

    /// Router used for callback failures
    pub fn router(&self) -> &ErrorRouter {
        &self.router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::HeadlessRender;
    use crate::render::window::headless::HeadlessBackend;

    fn window(backend: HeadlessBackend) -> Window {
        Window::new(
            WindowConfig::new(100, 100, "Test"),
            Box::new(backend),
            Box::new(HeadlessRender::new()),
            64,
            ErrorRouter::new(),
        )
    }

    fn headless(window: &Window) -> &HeadlessBackend {
        window.backend().as_any().downcast_ref().unwrap()
    }

    #[test]
    fn test_caps_recompute_intervals() {
        let mut window = window(HeadlessBackend::new(100, 100));
        window.set_fps_cap(120);
        window.set_ups_cap(10);

        assert_eq!(window.fps_cap(), 120);
        assert_eq!(window.ups_cap(), 10);
        assert_eq!(window.time_f, 1e9 / 120.0);
        assert_eq!(window.time_u, 1e8);
    }

    #[test]
    fn test_fullscreen_saves_and_restores_rect() {
        let mut window = window(HeadlessBackend::new(100, 100).with_position(30, 40));
        window.set_fullscreen(true);
        assert!(window.is_fullscreen());
        assert_eq!(window.backend().size(), (1920, 1080));

        window.set_fullscreen(false);
        assert!(!window.is_fullscreen());
        assert_eq!(window.backend().position(), (30, 40));
        assert_eq!(window.backend().size(), (100, 100));
    }

    #[test]
    fn test_fullscreen_without_monitor_stays_windowed() {
        let mut window = window(HeadlessBackend::new(100, 100).without_monitor());
        window.toggle_fullscreen();
        assert!(!window.is_fullscreen());
    }

    #[test]
    fn test_set_title_shows_immediately() {
        let mut window = window(HeadlessBackend::new(100, 100));
        window.set_title("Renamed");

        assert_eq!(window.title(), "Renamed");
        assert_eq!(headless(&window).titles(), ["Renamed".to_string()]);
    }

    #[test]
    fn test_vsync_and_clipboard_reach_backend() {
        let mut window = window(HeadlessBackend::new(100, 100));
        window.set_vsync(true);
        window.set_clipboard("copied");
        window.set_cursor(CursorShape::Hand);

        assert!(window.is_vsync());
        assert_eq!(window.clipboard().as_deref(), Some("copied"));
        let backend = headless(&window);
        assert_eq!(backend.vsync(), Some(true));
        assert_eq!(backend.cursor(), CursorShape::Hand);
    }
}
