//! Backend-agnostic window management trait
//!
//! This module defines the trait that all window backends implement. The
//! frame orchestrator ([`Window`](super::Window)) only talks to this trait,
//! so the loop runs unchanged over GLFW or over the scripted headless
//! backend used in tests.

use std::any::Any;

use thiserror::Error;

use crate::input::{KeyCode, MouseButton};

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW could not be initialized
    #[error("GLFW initialization failed: {0}")]
    InitializationFailed(String),

    /// The window or its GL context could not be created
    #[error("Window creation failed")]
    CreationFailed,

    /// The render back end could not be set up on the new context
    #[error("Render setup failed: {0}")]
    Render(#[from] crate::render::backend::RenderError),

    /// The batch controller could not allocate its buffers
    #[error("Batch setup failed: {0}")]
    Batch(#[from] crate::render::batch_controller::BatchError),

    /// `run` was called on a window that already ran
    #[error("Window cannot run from state {0:?}")]
    InvalidState(super::WindowState),
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// Events delivered by a backend's event pump
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowEvent {
    /// Framebuffer size changed
    Resized(u32, u32),
    /// Key pressed (`true`) or released (`false`)
    Key(KeyCode, bool),
    /// Mouse button pressed (`true`) or released (`false`)
    MouseButton(MouseButton, bool),
    /// Cursor moved to window coordinates
    CursorMoved(f64, f64),
    /// Scroll wheel or touchpad scroll
    Scroll(f64, f64),
    /// Text input
    Char(char),
    /// Focus gained (`true`) or lost (`false`)
    Focus(bool),
    /// The user asked to close the window
    CloseRequested,
}

/// Standard cursor shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CursorShape {
    /// Regular arrow
    #[default]
    Arrow,
    /// Text input beam
    IBeam,
    /// Crosshair
    Crosshair,
    /// Pointing hand
    Hand,
    /// Horizontal resize arrows
    HResize,
    /// Vertical resize arrows
    VResize,
}

/// Position and size of a window in screen coordinates
///
/// Saved when entering fullscreen and restored when leaving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowRect {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

/// Trait for window backend implementations
///
/// All methods run on the thread that created the window.
pub trait WindowBackend {
    /// Check if the window should close
    fn should_close(&self) -> bool;

    /// Set whether the window should close
    fn set_should_close(&mut self, should_close: bool);

    /// Pump the platform event queue once and return what arrived
    fn poll_events(&mut self) -> Vec<WindowEvent>;

    /// Framebuffer size in pixels
    fn size(&self) -> (u32, u32);

    /// Position of the top-left corner on screen
    fn position(&self) -> (i32, i32);

    /// Set the window title text
    fn set_title(&mut self, title: &str);

    /// Switch to the primary monitor's video mode
    ///
    /// Returns the new framebuffer size, or `None` when no monitor is
    /// available.
    fn set_fullscreen(&mut self) -> Option<(u32, u32)>;

    /// Leave fullscreen and restore `rect`
    fn set_windowed(&mut self, rect: WindowRect);

    /// Present the back buffer
    fn swap_buffers(&mut self);

    /// Swap interval 1 when `vsync`, else 0
    fn set_swap_interval(&mut self, vsync: bool);

    /// Clipboard contents, if they are text
    fn clipboard(&self) -> Option<String>;

    /// Replace the clipboard contents
    fn set_clipboard(&mut self, text: &str);

    /// Change the cursor shape while it is over the window
    fn set_cursor(&mut self, cursor: CursorShape);

    /// Dots per inch of the monitor the window was created on
    fn dpi(&self) -> f32;

    /// Release the native window; later calls become no-ops
    fn destroy(&mut self);

    /// Get access to the concrete type for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Get mutable access to the concrete type for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
