//! Window management subsystem
//!
//! - **`handle`**: the [`Window`] frame orchestrator applications talk to
//! - **`backend`**: the [`WindowBackend`] trait native windows implement
//! - **`glfw`**: GLFW window with an OpenGL 3.3 core context
//! - **`headless`**: scripted backend for running the loop without a display

pub mod backend;
pub mod glfw;
pub mod handle;
pub mod headless;

pub use backend::{CursorShape, WindowBackend, WindowError, WindowEvent, WindowRect, WindowResult};
pub use handle::{ResizeCallback, Window, WindowState};
pub use headless::HeadlessBackend;
