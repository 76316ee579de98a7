//! Application trait and lifecycle management

use thiserror::Error;

use crate::config::ConfigError;
use crate::engine::Engine;
use crate::render::backend::RenderError;
use crate::render::batch_controller::BatchError;
use crate::render::text::FontError;
use crate::render::texture::TextureError;
use crate::render::window::Window;

/// Application lifecycle trait
///
/// Implement this trait to create your game or application using the engine.
/// Every hook has an empty default, and every failure is reported through
/// the engine's error router without stopping the frame loop.
pub trait Application {
    /// Called once after the window is initialized, before the first frame
    ///
    /// Load fonts and textures here; the render back end is live.
    fn start(&mut self, _engine: &mut Engine, _window: &mut Window) -> Result<(), AppError> {
        Ok(())
    }

    /// Called once per logic tick, at most `max_ups` times a second
    fn update(&mut self, _engine: &mut Engine, _window: &mut Window) -> Result<(), AppError> {
        Ok(())
    }

    /// Called once per rendered frame
    ///
    /// Submit geometry to [`Window::batch_controller_mut`]; the window flushes
    /// it once this returns.
    fn draw(&mut self, _engine: &mut Engine, _window: &mut Window) -> Result<(), AppError> {
        Ok(())
    }

    /// Called once after the loop ends and the window has been released
    fn exit(&mut self, _engine: &mut Engine, _window: &mut Window) -> Result<(), AppError> {
        Ok(())
    }
}

/// No application: the window just clears and presents
impl Application for () {}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Draw submission failed
    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    /// A render back end call failed
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Font loading failed
    #[error("Font error: {0}")]
    Font(#[from] FontError),

    /// Texture loading failed
    #[error("Texture error: {0}")]
    Texture(#[from] TextureError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),
}

impl AppError {
    /// Wrap a message as a custom error
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}
