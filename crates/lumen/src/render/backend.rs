//! Render back-end contract
//!
//! Batches and the frame orchestrator only see the [`Render`] trait. The
//! OpenGL implementation lives in [`crate::render::opengl`]; a recording
//! implementation in [`crate::render::headless`] stands in when no GPU is
//! available.
//!
//! GPU objects are referred to by opaque slotmap keys. A key is only
//! meaningful to the back end that issued it.

use std::any::Any;

use bitflags::bitflags;
use image::RgbaImage;
use slotmap::new_key_type;
use thiserror::Error;

use crate::foundation::math::Mat4;
use crate::render::vertex::Vertex;

new_key_type! {
    /// Identity of a GPU texture
    pub struct TextureId;
    /// Identity of a linked shader program
    pub struct ShaderId;
    /// Identity of a GPU buffer object
    pub struct BufferId;
}

/// Result type for render back-end operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors raised by a render back end
#[derive(Debug, Error)]
pub enum RenderError {
    /// A GPU object could not be created
    #[error("Failed to create {what}: {reason}")]
    Creation {
        /// Kind of object
        what: &'static str,
        /// Driver message
        reason: String,
    },

    /// Shader compilation or linking failed
    #[error("Shader error: {0}")]
    Shader(String),

    /// A handle was not issued by this back end or was already released
    #[error("Unknown {0} handle")]
    UnknownHandle(&'static str),
}

bitflags! {
    /// Framebuffer planes to clear
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearMask: u8 {
        /// Color buffer
        const COLOR = 0b001;
        /// Depth buffer
        const DEPTH = 0b010;
        /// Stencil buffer
        const STENCIL = 0b100;
    }
}

/// Primitive topology of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Independent triangles, two per quad
    Triangles,
    /// One strip, quads stitched with degenerate triangles
    TriangleStrip,
}

/// A texture uploaded to the GPU
///
/// Cloning copies the handle, not the pixels. Two textures are the same
/// texture when their ids are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Texture {
    id: TextureId,
    width: u32,
    height: u32,
}

impl Texture {
    /// Wrap a back-end id with its dimensions
    pub const fn new(id: TextureId, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }

    /// Back-end identity
    pub const fn id(&self) -> TextureId {
        self.id
    }

    /// Width in pixels
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// A linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shader {
    id: ShaderId,
}

impl Shader {
    /// Wrap a back-end id
    pub const fn new(id: ShaderId) -> Self {
        Self { id }
    }

    /// Back-end identity
    pub const fn id(&self) -> ShaderId {
        self.id
    }
}

/// Vertex and index buffer pair owned by one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchBuffers {
    /// Vertex buffer
    pub vbo: BufferId,
    /// Index buffer
    pub ibo: BufferId,
}

/// Everything a back end needs to issue one batch draw
#[derive(Debug, Clone, Copy)]
pub struct BatchDraw<'a> {
    /// Buffers to upload into
    pub buffers: BatchBuffers,
    /// Vertex data, uploaded in full
    pub vertices: &'a [Vertex],
    /// Index data, uploaded in full
    pub indices: &'a [u32],
    /// Textures bound to units `1..=textures.len()`
    pub textures: &'a [Texture],
    /// Program to draw with
    pub shader: Shader,
    /// Primitive topology
    pub mode: RenderMode,
    /// Draw into the stencil buffer instead of the color buffer
    pub stencil: bool,
}

/// GPU capability used by batches and the frame loop
///
/// All methods run on the thread that owns the GL context.
pub trait Render {
    /// Allocate a GPU buffer
    fn gen_buffer(&mut self) -> RenderResult<BufferId>;

    /// Compile and link the default batch shader
    fn create_batch_shader(&mut self) -> RenderResult<Shader>;

    /// Upload RGBA pixels as a texture
    fn create_texture(&mut self, image: &RgbaImage) -> RenderResult<Texture>;

    /// Release a texture; unknown handles are ignored
    fn delete_texture(&mut self, texture: &Texture);

    /// Upload the batch data and draw it
    fn draw_batch(&mut self, draw: &BatchDraw<'_>) -> RenderResult<()>;

    /// Clear the requested framebuffer planes
    fn clear(&mut self, mask: ClearMask);

    /// Resize the viewport
    fn set_viewport(&mut self, width: u32, height: u32);

    /// Set the projection used by subsequent draws
    fn set_projection(&mut self, projection: &Mat4);

    /// Set the camera view used by vertices with `use_camera = 1`
    fn set_view(&mut self, view: &Mat4);

    /// Release every GPU object this back end created
    fn release(&mut self);

    /// Get access to the concrete type for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Get mutable access to the concrete type for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn test_texture_identity_is_the_id() {
        let mut keys: SlotMap<TextureId, ()> = SlotMap::with_key();
        let a = keys.insert(());
        let b = keys.insert(());

        assert_eq!(Texture::new(a, 16, 16), Texture::new(a, 16, 16));
        assert_ne!(Texture::new(a, 16, 16), Texture::new(b, 16, 16));
    }

    #[test]
    fn test_clear_mask_combines() {
        let all = ClearMask::COLOR | ClearMask::DEPTH | ClearMask::STENCIL;
        assert!(all.contains(ClearMask::STENCIL));
        assert_eq!(all, ClearMask::all());
    }
}
