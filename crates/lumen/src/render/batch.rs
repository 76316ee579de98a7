//! # Batch
//!
//! A fixed-capacity accumulator of vertices, indices and texture slots that
//! turns into exactly one GPU draw call when flushed.
//!
//! Capacity is counted in vertices. Every submission occupies four vertices
//! (triangles are padded by repeating their first vertex) and six indices.
//! Running out of room is not an error: the batch refuses the write and the
//! [`BatchController`](super::batch_controller::BatchController) moves on to
//! another batch.
//!
//! Buffers are allocated once and reused for the whole process lifetime.
//! [`Batch::clear_batch`] only rewinds the cursors;
//! [`Batch::force_clear_batch`] also zeroes the used prefix and runs after
//! every flush.

use crate::render::backend::{BatchBuffers, BatchDraw, Render, RenderMode, RenderResult, Shader, Texture};
use crate::render::vertex::{Transform, Vertex, VertexGroup};

/// User-visible texture slots per batch (tex-id 1..=16, 0 means untextured)
pub const TEXTURE_SLOTS: usize = 16;

/// Vertices written per submission
pub const VERTICES_PER_QUAD: usize = 4;

/// Indices written per submission
pub const INDICES_PER_QUAD: usize = 6;

/// Counts captured by [`Batch::finish`] for the next upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Staged {
    vertices: usize,
    indices: usize,
}

/// Fixed-capacity vertex/index/texture accumulator
#[derive(Debug)]
pub struct Batch {
    /// Capacity in vertices
    max_size: usize,
    data: Vec<Vertex>,
    indices: Vec<u32>,
    /// Vertices written so far; write cursor into `data`
    vert_count: usize,
    /// Submissions written so far
    obj_count: usize,
    textures: [Option<Texture>; TEXTURE_SLOTS],
    next_free_tex_slot: usize,
    is_full: bool,
    is_full_tex: bool,
    is_stencil: bool,
    mode: RenderMode,
    shader: Shader,
    buffers: Option<BatchBuffers>,
    staged: Option<Staged>,
}

impl Batch {
    /// Create a batch holding up to `max_size` vertices
    pub fn new(max_size: usize, shader: Shader, mode: RenderMode, is_stencil: bool) -> Self {
        let max_quads = max_size / VERTICES_PER_QUAD;
        Self {
            max_size,
            data: vec![Vertex::default(); max_size],
            indices: vec![0; max_quads * INDICES_PER_QUAD],
            vert_count: 0,
            obj_count: 0,
            textures: [None; TEXTURE_SLOTS],
            next_free_tex_slot: 0,
            is_full: false,
            is_full_tex: false,
            is_stencil,
            mode,
            shader,
            buffers: None,
            staged: None,
        }
    }

    /// Rewind the cursors without touching the stored data
    pub fn clear_batch(&mut self) {
        self.vert_count = 0;
        self.obj_count = 0;
        self.next_free_tex_slot = 0;
        self.is_full = false;
        self.is_full_tex = false;
        self.staged = None;
    }

    /// Zero the used prefix of the vertex data and texture table, then rewind
    pub fn force_clear_batch(&mut self) {
        self.data[..self.vert_count].fill(Vertex::default());
        self.indices[..self.obj_count * INDICES_PER_QUAD].fill(0);
        self.textures[..self.next_free_tex_slot].fill(None);
        self.clear_batch();
    }

    /// True when `amount` more vertices would not fit
    pub fn is_full(&self, amount: usize) -> bool {
        self.vert_count + amount > self.max_size
    }

    /// True once every texture slot is taken
    pub fn is_full_of_textures(&self) -> bool {
        self.is_full_tex
    }

    /// Append one submission, padded to four vertices
    ///
    /// Returns `false` and writes nothing when the batch has no room; check
    /// [`Batch::is_full`] first.
    pub fn add_vertices(&mut self, group: &VertexGroup, use_camera: bool, transform: &Transform, is_font: bool) -> bool {
        if self.is_full(VERTICES_PER_QUAD) {
            self.is_full = true;
            return false;
        }

        self.gen_indices();

        let stamp = |vertex: &Vertex| Vertex {
            use_camera: if use_camera { 1.0 } else { 0.0 },
            transform_rotation: transform.rotation,
            transform_translate: transform.translate,
            transform_origin: transform.origin,
            is_font: if is_font { 1.0 } else { 0.0 },
            ..*vertex
        };

        let supplied = group.vertices();
        for vertex in supplied {
            self.data[self.vert_count] = stamp(vertex);
            self.vert_count += 1;
        }
        if supplied.len() < VERTICES_PER_QUAD {
            self.data[self.vert_count] = stamp(&supplied[0]);
            self.vert_count += 1;
        }

        self.obj_count += 1;
        true
    }

    fn gen_indices(&mut self) {
        let base = (self.obj_count * VERTICES_PER_QUAD) as u32;
        let offset = self.obj_count * INDICES_PER_QUAD;
        let quad = match self.mode {
            RenderMode::Triangles => [base, base + 1, base + 2, base + 2, base + 3, base],
            // Repeating the first and last index stitches consecutive quads
            // with degenerate triangles.
            RenderMode::TriangleStrip => [base, base, base + 1, base + 3, base + 2, base + 2],
        };
        self.indices[offset..offset + INDICES_PER_QUAD].copy_from_slice(&quad);
    }

    /// Register a texture and return its 1-based slot
    ///
    /// A texture already in the table keeps its slot. Returns `None` when the
    /// table is full.
    pub fn add_texture(&mut self, texture: &Texture) -> Option<u32> {
        if let Some(slot) = self.texture_slot(texture) {
            return Some(slot);
        }
        if self.is_full_tex {
            return None;
        }

        self.textures[self.next_free_tex_slot] = Some(*texture);
        self.next_free_tex_slot += 1;
        if self.next_free_tex_slot >= TEXTURE_SLOTS {
            self.is_full_tex = true;
        }

        Some(self.next_free_tex_slot as u32)
    }

    /// Slot of a texture already in the table
    pub fn texture_slot(&self, texture: &Texture) -> Option<u32> {
        self.textures[..self.next_free_tex_slot]
            .iter()
            .position(|t| t.is_some_and(|t| t.id() == texture.id()))
            .map(|i| i as u32 + 1)
    }

    /// Capture the written prefix for upload
    pub fn finish(&mut self) {
        self.staged = Some(Staged {
            vertices: self.vert_count,
            indices: self.obj_count * INDICES_PER_QUAD,
        });
    }

    /// Upload, draw and clear
    ///
    /// An empty batch issues no draw call. Buffers are allocated on the first
    /// non-empty flush.
    pub fn render(&mut self, render: &mut dyn Render) -> RenderResult<()> {
        if self.staged.is_none() {
            self.finish();
        }
        let staged = self.staged.take().unwrap_or(Staged { vertices: 0, indices: 0 });
        if staged.vertices == 0 {
            self.force_clear_batch();
            return Ok(());
        }

        let buffers = match self.buffers {
            Some(buffers) => buffers,
            None => {
                let buffers = BatchBuffers {
                    vbo: render.gen_buffer()?,
                    ibo: render.gen_buffer()?,
                };
                self.buffers = Some(buffers);
                buffers
            }
        };

        let textures: Vec<Texture> = self.textures[..self.next_free_tex_slot].iter().flatten().copied().collect();
        let result = render.draw_batch(&BatchDraw {
            buffers,
            vertices: &self.data[..staged.vertices],
            indices: &self.indices[..staged.indices],
            textures: &textures,
            shader: self.shader,
            mode: self.mode,
            stencil: self.is_stencil,
        });

        self.force_clear_batch();
        result
    }

    /// Vertices written so far
    pub fn vert_count(&self) -> usize {
        self.vert_count
    }

    /// Submissions written so far
    pub fn obj_count(&self) -> usize {
        self.obj_count
    }

    /// True when nothing was written since the last clear
    pub fn is_empty(&self) -> bool {
        self.vert_count == 0
    }

    /// Capacity in vertices
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Written vertices
    pub fn vertices(&self) -> &[Vertex] {
        &self.data[..self.vert_count]
    }

    /// Written indices
    pub fn indices(&self) -> &[u32] {
        &self.indices[..self.obj_count * INDICES_PER_QUAD]
    }

    /// Occupied texture slots, slot 1 first
    pub fn textures(&self) -> impl Iterator<Item = &Texture> {
        self.textures[..self.next_free_tex_slot].iter().flatten()
    }

    /// True for the dedicated stencil batch
    pub fn is_stencil(&self) -> bool {
        self.is_stencil
    }

    /// Primitive topology
    pub fn render_mode(&self) -> RenderMode {
        self.mode
    }

    /// Program this batch draws with
    pub fn shader(&self) -> Shader {
        self.shader
    }

    /// Swap the program for subsequent flushes
    pub fn set_shader(&mut self, shader: Shader) {
        self.shader = shader;
    }

    /// True when the last write was refused for lack of vertex room
    pub fn rejected_write(&self) -> bool {
        self.is_full
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::HeadlessRender;

    fn quad() -> VertexGroup {
        let c = [1.0, 0.0, 0.0, 1.0];
        VertexGroup::quad(
            Vertex::colored(0.0, 10.0, c),
            Vertex::colored(10.0, 10.0, c),
            Vertex::colored(10.0, 0.0, c),
            Vertex::colored(0.0, 0.0, c),
        )
    }

    fn batch(render: &mut HeadlessRender, max_size: usize) -> Batch {
        let shader = render.create_batch_shader().unwrap();
        Batch::new(max_size, shader, RenderMode::Triangles, false)
    }

    #[test]
    fn test_single_quad_indices() {
        let mut render = HeadlessRender::new();
        let mut batch = batch(&mut render, 100);

        assert!(batch.add_vertices(&quad(), false, &Transform::IDENTITY, false));

        assert_eq!(batch.vert_count(), 4);
        assert_eq!(batch.obj_count(), 1);
        assert_eq!(batch.indices(), &[0, 1, 2, 2, 3, 0]);
    }

    #[test]
    fn test_triangle_is_padded_with_first_vertex() {
        let mut render = HeadlessRender::new();
        let mut batch = batch(&mut render, 100);
        let c = [0.0, 1.0, 0.0, 1.0];
        let tri = VertexGroup::triangle(
            Vertex::colored(0.0, 0.0, c),
            Vertex::colored(5.0, 0.0, c),
            Vertex::colored(0.0, 5.0, c),
        );

        batch.add_vertices(&tri, false, &Transform::IDENTITY, false);

        assert_eq!(batch.vert_count(), 4);
        assert_eq!(batch.vertices()[3], batch.vertices()[0]);
        assert_eq!(batch.indices(), &[0, 1, 2, 2, 3, 0]);
    }

    #[test]
    fn test_per_object_fields_are_stamped() {
        let mut render = HeadlessRender::new();
        let mut batch = batch(&mut render, 100);
        let transform = Transform {
            rotation: 0.5,
            translate: [3.0, 4.0],
            origin: [1.0, 2.0],
        };

        batch.add_vertices(&quad(), true, &transform, true);

        for vertex in batch.vertices() {
            assert_eq!(vertex.use_camera, 1.0);
            assert_eq!(vertex.transform_rotation, 0.5);
            assert_eq!(vertex.transform_translate, [3.0, 4.0]);
            assert_eq!(vertex.transform_origin, [1.0, 2.0]);
            assert_eq!(vertex.is_font, 1.0);
        }
    }

    #[test]
    fn test_admission_drops_only_overflowing_suffix() {
        let mut render = HeadlessRender::new();
        let mut batch = batch(&mut render, 12);

        let accepted: Vec<bool> = (0..5)
            .map(|_| batch.add_vertices(&quad(), false, &Transform::IDENTITY, false))
            .collect();

        assert_eq!(accepted, vec![true, true, true, false, false]);
        assert_eq!(batch.vert_count(), 12);
        assert!(batch.rejected_write());
    }

    #[test]
    fn test_exact_fit_is_not_full() {
        let mut render = HeadlessRender::new();
        let mut batch = batch(&mut render, 8);

        assert!(!batch.is_full(8));
        assert!(batch.is_full(9));
        batch.add_vertices(&quad(), false, &Transform::IDENTITY, false);
        assert!(!batch.is_full(4));
        assert!(batch.is_full(5));
    }

    #[test]
    fn test_strip_indices_are_stitched() {
        let mut render = HeadlessRender::new();
        let shader = render.create_batch_shader().unwrap();
        let mut batch = Batch::new(100, shader, RenderMode::TriangleStrip, false);

        batch.add_vertices(&quad(), false, &Transform::IDENTITY, false);
        batch.add_vertices(&quad(), false, &Transform::IDENTITY, false);

        assert_eq!(batch.indices(), &[0, 0, 1, 3, 2, 2, 4, 4, 5, 7, 6, 6]);
    }

    #[test]
    fn test_texture_dedup_and_saturation() {
        let mut render = HeadlessRender::new();
        let mut batch = batch(&mut render, 100);
        let first = render.solid_texture(1, 1);

        for _ in 0..5 {
            assert_eq!(batch.add_texture(&first), Some(1));
        }
        let second = render.solid_texture(1, 1);
        assert_eq!(batch.add_texture(&second), Some(2));

        for expected in 3..=16 {
            let tex = render.solid_texture(1, 1);
            assert_eq!(batch.add_texture(&tex), Some(expected));
        }
        assert!(batch.is_full_of_textures());

        let overflow = render.solid_texture(1, 1);
        assert_eq!(batch.add_texture(&overflow), None);
        assert_eq!(batch.add_texture(&first), Some(1));
    }

    #[test]
    fn test_render_uploads_and_clears() {
        let mut render = HeadlessRender::new();
        let mut batch = batch(&mut render, 100);
        let tex = render.solid_texture(2, 2);
        batch.add_texture(&tex);
        batch.add_vertices(&quad(), false, &Transform::IDENTITY, false);

        batch.finish();
        batch.render(&mut render).unwrap();

        let draws = render.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].vertices.len(), 4);
        assert_eq!(draws[0].indices, vec![0, 1, 2, 2, 3, 0]);
        assert_eq!(draws[0].textures, vec![tex]);

        assert!(batch.is_empty());
        assert_eq!(batch.textures().count(), 0);
        assert_eq!(batch.add_texture(&tex), Some(1));
    }

    #[test]
    fn test_empty_batch_issues_no_draw() {
        let mut render = HeadlessRender::new();
        let mut batch = batch(&mut render, 100);

        batch.finish();
        batch.render(&mut render).unwrap();

        assert!(render.draws().is_empty());
        assert_eq!(render.buffer_count(), 0);
    }

    #[test]
    fn test_buffers_allocated_once() {
        let mut render = HeadlessRender::new();
        let mut batch = batch(&mut render, 100);

        for _ in 0..3 {
            batch.add_vertices(&quad(), false, &Transform::IDENTITY, false);
            batch.render(&mut render).unwrap();
        }

        assert_eq!(render.buffer_count(), 2);
        assert_eq!(render.draws().len(), 3);
    }
}
