//! Core engine implementation
//!
//! [`Engine`] is the explicit context threaded through every application
//! callback. It holds the engine configuration, the error router shared by
//! all subsystems and the per-tick loopers, and it creates windows.

use thiserror::Error;

use crate::application::AppError;
use crate::core::config::{EngineConfig, RenderingApi, WindowConfig};
use crate::foundation::logging::{self, codes, ErrorRouter, ErrorSink, Severity};
use crate::render::headless::HeadlessRender;
use crate::render::opengl::GlRender;
use crate::render::window::glfw::GlfwBackend;
use crate::render::window::{HeadlessBackend, Window, WindowBackend, WindowError};
use crate::render::Render;

/// Hook run once per logic tick, right after the application's `update`
pub trait Looper {
    /// Advance one tick
    fn tick(&mut self, window: &mut Window) -> Result<(), AppError>;
}

impl<F> Looper for F
where
    F: FnMut(&mut Window) -> Result<(), AppError>,
{
    fn tick(&mut self, window: &mut Window) -> Result<(), AppError> {
        self(window)
    }
}

/// Main engine struct
pub struct Engine {
    config: EngineConfig,
    router: ErrorRouter,
    loopers: Vec<Box<dyn Looper>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("loopers", &self.loopers.len())
            .finish_non_exhaustive()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    /// Create a new engine instance
    ///
    /// Initializes logging and installs the default log sink on the router.
    pub fn new(config: EngineConfig) -> Self {
        logging::init();
        log::info!("Initializing engine ({:?})", config.rendering_api);
        Self {
            config,
            router: ErrorRouter::new(),
            loopers: Vec::new(),
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Shared error router
    pub fn router(&self) -> &ErrorRouter {
        &self.router
    }

    /// Replace where routed errors go, for every subsystem at once
    pub fn set_error_sink(&self, sink: impl ErrorSink + 'static) {
        self.router.set_sink(sink);
    }

    /// Register a per-tick hook; hooks run in registration order
    pub fn register_looper(&mut self, looper: impl Looper + 'static) {
        self.loopers.push(Box::new(looper));
    }

    /// Number of registered loopers
    pub fn looper_count(&self) -> usize {
        self.loopers.len()
    }

    /// Run every looper once, routing failures
    pub(crate) fn tick_loopers(&mut self, window: &mut Window) {
        for looper in &mut self.loopers {
            if let Err(e) = looper.tick(window) {
                self.router.send(codes::LOOPER, Severity::Recoverable, &e);
            }
        }
    }

    /// Create a native window with the configured rendering API
    ///
    /// Failures are reported to the router as fatal before being returned.
    pub fn create_window(&self, config: WindowConfig) -> Result<Window, EngineError> {
        match self.config.rendering_api {
            RenderingApi::OpenGl => {
                let (backend, gl) = GlfwBackend::new(&config).map_err(|e| {
                    let code = match &e {
                        WindowError::InitializationFailed(_) => codes::GLFW_INIT,
                        _ => codes::GLFW_WINDOW_INIT,
                    };
                    self.router.send(code, Severity::Fatal, &e);
                    e
                })?;
                let render = GlRender::new(gl).map_err(|e| {
                    self.router.send(codes::GLFW_WINDOW_INIT, Severity::Fatal, &e);
                    WindowError::from(e)
                })?;
                Ok(self.create_window_with(config, Box::new(backend), Box::new(render)))
            }
            api @ RenderingApi::Vulkan => {
                log::error!("Rendering API {api:?} is not available");
                Err(EngineError::UnsupportedBackend(api))
            }
        }
    }

    /// Create a native window from the engine's default window config
    pub fn create_default_window(&self) -> Result<Window, EngineError> {
        self.create_window(self.config.window.clone())
    }

    /// Create a window over custom back ends
    pub fn create_window_with(
        &self,
        config: WindowConfig,
        backend: Box<dyn WindowBackend>,
        render: Box<dyn Render>,
    ) -> Window {
        Window::new(config, backend, render, self.config.batch_size, self.router.clone())
    }

    /// Create a window that needs no display or GPU
    ///
    /// Its backend and render can be inspected through
    /// [`Window::backend`] and [`Window::render`] downcasts.
    pub fn create_headless_window(&self, config: WindowConfig) -> Window {
        let backend = HeadlessBackend::new(config.width, config.height);
        self.create_window_with(config, Box::new(backend), Box::new(HeadlessRender::new()))
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// The configured rendering API has no back end
    #[error("Unsupported rendering API: {0:?}")]
    UnsupportedBackend(RenderingApi),

    /// Window creation or the frame loop failed
    #[error("Window error: {0}")]
    Window(#[from] WindowError),
}
