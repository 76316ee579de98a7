//! OpenGL 3.3 render back end
//!
//! Owns the `glow` context and every GL object created through it. GL names
//! never leave this module; batches and windows hold slotmap keys instead.

use std::any::Any;

use glow::HasContext;
use image::RgbaImage;
use slotmap::SlotMap;

use crate::foundation::math::Mat4;
use crate::render::backend::{
    BatchDraw, BufferId, ClearMask, Render, RenderError, RenderMode, RenderResult, Shader, ShaderId, Texture, TextureId,
};
use crate::render::opengl::shader::{self, PROJECTION_UNIFORM, SAMPLER_UNIFORM, VIEW_UNIFORM};
use crate::render::vertex::{VERTEX_ATTRIBUTES, VERTEX_SIZE_BYTES};

/// A linked program and the uniforms the batcher writes
struct GlProgram {
    program: glow::Program,
    projection: Option<glow::UniformLocation>,
    view: Option<glow::UniformLocation>,
}

/// [`Render`] implementation over a current OpenGL context
pub struct GlRender {
    gl: glow::Context,
    vao: glow::VertexArray,
    buffers: SlotMap<BufferId, glow::Buffer>,
    programs: SlotMap<ShaderId, GlProgram>,
    textures: SlotMap<TextureId, glow::Texture>,
    projection: Mat4,
    view: Mat4,
    released: bool,
}

impl std::fmt::Debug for GlRender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlRender")
            .field("buffers", &self.buffers.len())
            .field("programs", &self.programs.len())
            .field("textures", &self.textures.len())
            .field("released", &self.released)
            .finish()
    }
}

impl GlRender {
    /// Take ownership of a context and set up the 2D pipeline state
    ///
    /// Enables alpha blending, `LEQUAL` depth testing and the stencil test.
    /// The context must stay current on this thread for the lifetime of the
    /// render.
    pub fn new(gl: glow::Context) -> RenderResult<Self> {
        let vao = unsafe {
            gl.enable(glow::BLEND);
            gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(glow::LEQUAL);
            gl.enable(glow::STENCIL_TEST);
            gl.stencil_func(glow::ALWAYS, 1, 0xFF);
            gl.stencil_op(glow::KEEP, glow::KEEP, glow::KEEP);
            gl.clear_color(0.0, 0.0, 0.0, 1.0);

            gl.create_vertex_array()
                .map_err(|reason| RenderError::Creation { what: "vertex array", reason })?
        };

        log::info!("OpenGL render initialized");

        Ok(Self {
            gl,
            vao,
            buffers: SlotMap::with_key(),
            programs: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            projection: Mat4::identity(),
            view: Mat4::identity(),
            released: false,
        })
    }

    /// The underlying context, for callers issuing their own GL calls
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    fn bind_layout(&self) {
        unsafe {
            for attribute in &VERTEX_ATTRIBUTES {
                self.gl.enable_vertex_attrib_array(attribute.location);
                self.gl.vertex_attrib_pointer_f32(
                    attribute.location,
                    attribute.size as i32,
                    glow::FLOAT,
                    false,
                    VERTEX_SIZE_BYTES as i32,
                    attribute.offset_bytes() as i32,
                );
            }
        }
    }
}

impl Render for GlRender {
    fn gen_buffer(&mut self) -> RenderResult<BufferId> {
        let buffer = unsafe { self.gl.create_buffer() }
            .map_err(|reason| RenderError::Creation { what: "buffer", reason })?;
        Ok(self.buffers.insert(buffer))
    }

    fn create_batch_shader(&mut self) -> RenderResult<Shader> {
        let program = unsafe {
            shader::link_program(&self.gl, &shader::vertex_source(), &shader::fragment_source())?
        };

        let (projection, view) = unsafe {
            self.gl.use_program(Some(program));
            let samplers = self.gl.get_uniform_location(program, SAMPLER_UNIFORM);
            self.gl.uniform_1_i32_slice(samplers.as_ref(), &shader::sampler_units());
            (
                self.gl.get_uniform_location(program, PROJECTION_UNIFORM),
                self.gl.get_uniform_location(program, VIEW_UNIFORM),
            )
        };

        log::debug!("Batch shader linked");
        Ok(Shader::new(self.programs.insert(GlProgram { program, projection, view })))
    }

    fn create_texture(&mut self, image: &RgbaImage) -> RenderResult<Texture> {
        let texture = unsafe {
            let texture = self
                .gl
                .create_texture()
                .map_err(|reason| RenderError::Creation { what: "texture", reason })?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::NEAREST as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::NEAREST as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                image.width() as i32,
                image.height() as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                Some(image.as_raw().as_slice()),
            );
            self.gl.bind_texture(glow::TEXTURE_2D, None);
            texture
        };

        let id = self.textures.insert(texture);
        Ok(Texture::new(id, image.width(), image.height()))
    }

    fn delete_texture(&mut self, texture: &Texture) {
        if let Some(texture) = self.textures.remove(texture.id()) {
            unsafe { self.gl.delete_texture(texture) };
        }
    }

    fn draw_batch(&mut self, draw: &BatchDraw<'_>) -> RenderResult<()> {
        let program = self
            .programs
            .get(draw.shader.id())
            .ok_or(RenderError::UnknownHandle("shader"))?;
        let vbo = *self.buffers.get(draw.buffers.vbo).ok_or(RenderError::UnknownHandle("buffer"))?;
        let ibo = *self.buffers.get(draw.buffers.ibo).ok_or(RenderError::UnknownHandle("buffer"))?;
        let textures = draw
            .textures
            .iter()
            .map(|t| self.textures.get(t.id()).copied().ok_or(RenderError::UnknownHandle("texture")))
            .collect::<RenderResult<Vec<_>>>()?;

        let gl = &self.gl;
        unsafe {
            gl.use_program(Some(program.program));
            gl.uniform_matrix_4_f32_slice(program.projection.as_ref(), false, self.projection.as_slice());
            gl.uniform_matrix_4_f32_slice(program.view.as_ref(), false, self.view.as_slice());

            // Slot k lives on texture unit k; unit 0 stays free.
            for (i, texture) in textures.iter().enumerate() {
                gl.active_texture(glow::TEXTURE1 + i as u32);
                gl.bind_texture(glow::TEXTURE_2D, Some(*texture));
            }

            gl.bind_vertex_array(Some(self.vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, bytemuck::cast_slice(draw.vertices), glow::DYNAMIC_DRAW);
        }
        self.bind_layout();

        let gl = &self.gl;
        unsafe {
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo));
            gl.buffer_data_u8_slice(glow::ELEMENT_ARRAY_BUFFER, bytemuck::cast_slice(draw.indices), glow::DYNAMIC_DRAW);

            if draw.stencil {
                gl.color_mask(false, false, false, false);
                gl.depth_mask(false);
                gl.stencil_mask(0xFF);
                gl.stencil_func(glow::ALWAYS, 1, 0xFF);
                gl.stencil_op(glow::KEEP, glow::KEEP, glow::REPLACE);
            }

            let mode = match draw.mode {
                RenderMode::Triangles => glow::TRIANGLES,
                RenderMode::TriangleStrip => glow::TRIANGLE_STRIP,
            };
            gl.draw_elements(mode, draw.indices.len() as i32, glow::UNSIGNED_INT, 0);

            if draw.stencil {
                gl.stencil_op(glow::KEEP, glow::KEEP, glow::KEEP);
                gl.depth_mask(true);
                gl.color_mask(true, true, true, true);
            }

            gl.bind_vertex_array(None);
        }

        Ok(())
    }

    fn clear(&mut self, mask: ClearMask) {
        let mut bits = 0;
        if mask.contains(ClearMask::COLOR) {
            bits |= glow::COLOR_BUFFER_BIT;
        }
        if mask.contains(ClearMask::DEPTH) {
            bits |= glow::DEPTH_BUFFER_BIT;
        }
        if mask.contains(ClearMask::STENCIL) {
            bits |= glow::STENCIL_BUFFER_BIT;
        }
        unsafe {
            // Clearing honours the write masks.
            self.gl.stencil_mask(0xFF);
            self.gl.clear(bits);
        }
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        unsafe { self.gl.viewport(0, 0, width as i32, height as i32) };
    }

    fn set_projection(&mut self, projection: &Mat4) {
        self.projection = *projection;
    }

    fn set_view(&mut self, view: &Mat4) {
        self.view = *view;
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        unsafe {
            for (_, buffer) in self.buffers.drain() {
                self.gl.delete_buffer(buffer);
            }
            for (_, program) in self.programs.drain() {
                self.gl.delete_program(program.program);
            }
            for (_, texture) in self.textures.drain() {
                self.gl.delete_texture(texture);
            }
            self.gl.delete_vertex_array(self.vao);
        }
        self.released = true;
        log::info!("OpenGL resources released");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
