//! Recording render back end
//!
//! [`HeadlessRender`] implements [`Render`] without a GPU. Every call is kept
//! so tests and tools can inspect exactly what a frame would have drawn.

use std::any::Any;

use image::RgbaImage;
use slotmap::SlotMap;

use crate::foundation::math::Mat4;
use crate::render::backend::{
    BatchDraw, BufferId, ClearMask, Render, RenderMode, RenderResult, Shader, ShaderId, Texture, TextureId,
};
use crate::render::vertex::Vertex;

/// A draw call as the back end received it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    /// Uploaded vertices
    pub vertices: Vec<Vertex>,
    /// Uploaded indices
    pub indices: Vec<u32>,
    /// Bound textures, slot 1 first
    pub textures: Vec<Texture>,
    /// Primitive topology
    pub mode: RenderMode,
    /// Stencil pass
    pub stencil: bool,
}

/// Render back end that records instead of drawing
#[derive(Debug)]
pub struct HeadlessRender {
    buffers: SlotMap<BufferId, ()>,
    shaders: SlotMap<ShaderId, ()>,
    textures: SlotMap<TextureId, (u32, u32)>,
    draws: Vec<RecordedDraw>,
    clears: Vec<ClearMask>,
    viewport: (u32, u32),
    projection: Mat4,
    view: Mat4,
    released: bool,
}

impl Default for HeadlessRender {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessRender {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self {
            buffers: SlotMap::with_key(),
            shaders: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            draws: Vec::new(),
            clears: Vec::new(),
            viewport: (0, 0),
            projection: Mat4::identity(),
            view: Mat4::identity(),
            released: false,
        }
    }

    /// Create a texture without pixel data
    pub fn solid_texture(&mut self, width: u32, height: u32) -> Texture {
        let id = self.textures.insert((width, height));
        Texture::new(id, width, height)
    }

    /// Draw calls since the last [`HeadlessRender::take_draws`]
    pub fn draws(&self) -> &[RecordedDraw] {
        &self.draws
    }

    /// Drain the recorded draw calls
    pub fn take_draws(&mut self) -> Vec<RecordedDraw> {
        std::mem::take(&mut self.draws)
    }

    /// Every clear issued so far
    pub fn clears(&self) -> &[ClearMask] {
        &self.clears
    }

    /// Buffers currently allocated
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Textures currently alive
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// True when `texture` has not been deleted
    pub fn has_texture(&self, texture: &Texture) -> bool {
        self.textures.contains_key(texture.id())
    }

    /// Last viewport size
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Last projection matrix
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Last camera view matrix
    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    /// True once [`Render::release`] ran
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Render for HeadlessRender {
    fn gen_buffer(&mut self) -> RenderResult<BufferId> {
        Ok(self.buffers.insert(()))
    }

    fn create_batch_shader(&mut self) -> RenderResult<Shader> {
        Ok(Shader::new(self.shaders.insert(())))
    }

    fn create_texture(&mut self, image: &RgbaImage) -> RenderResult<Texture> {
        Ok(self.solid_texture(image.width(), image.height()))
    }

    fn delete_texture(&mut self, texture: &Texture) {
        self.textures.remove(texture.id());
    }

    fn draw_batch(&mut self, draw: &BatchDraw<'_>) -> RenderResult<()> {
        self.draws.push(RecordedDraw {
            vertices: draw.vertices.to_vec(),
            indices: draw.indices.to_vec(),
            textures: draw.textures.to_vec(),
            mode: draw.mode,
            stencil: draw.stencil,
        });
        Ok(())
    }

    fn clear(&mut self, mask: ClearMask) {
        self.clears.push(mask);
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    fn set_projection(&mut self, projection: &Mat4) {
        self.projection = *projection;
    }

    fn set_view(&mut self, view: &Mat4) {
        self.view = *view;
    }

    fn release(&mut self) {
        self.buffers.clear();
        self.shaders.clear();
        self.textures.clear();
        self.released = true;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
