//! Rendering system
//!
//! Draw submissions flow from [`Draw2D`] (or direct [`BatchController`]
//! calls) into pooled [`Batch`]es, which the controller flushes through a
//! [`Render`] back end once per frame. [`GlRender`] talks to OpenGL through
//! `glow`; [`HeadlessRender`] records every call for tests.

pub mod backend;
pub mod batch;
pub mod batch_controller;
pub mod camera;
pub mod draw;
pub mod headless;
pub mod opengl;
pub mod text;
pub mod texture;
pub mod vertex;
pub mod window;

pub use backend::{ClearMask, Render, RenderError, RenderMode, RenderResult, Shader, Texture};
pub use batch::Batch;
pub use batch_controller::{BatchController, BatchError};
pub use camera::Camera2D;
pub use draw::Draw2D;
pub use headless::HeadlessRender;
pub use opengl::GlRender;
pub use text::{BitmapFont, FontError, FontSource};
pub use vertex::{Transform, Vertex, VertexGroup};
pub use window::{Window, WindowBackend, WindowEvent};
