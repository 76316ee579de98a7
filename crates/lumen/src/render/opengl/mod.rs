//! OpenGL back end built on `glow`

pub mod render;
pub mod shader;

pub use render::GlRender;
