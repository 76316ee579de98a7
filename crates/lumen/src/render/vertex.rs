//! # Batch Vertex Layout
//!
//! Every vertex the batcher writes is exactly [`VERTEX_SIZE_FLOATS`] floats
//! wide, interleaved in a fixed field order:
//!
//! ```text
//! p p p | r | ro ro | c c c c | uv uv | ti | uc | tr | tt tt | to to | f
//! ```
//!
//! The leading fields (position to texture id) describe the vertex itself and
//! are filled by drawing code. The trailing fields (camera flag, transform and
//! font flag) are per-object values the batch stamps onto every vertex of a
//! submission.

use bytemuck::{Pod, Zeroable};

/// RGBA color with components in `0.0..=1.0`
pub type Color = [f32; 4];

/// Position: x, y, z
pub const POSITION_SIZE: usize = 3;
/// Rotation angle in radians
pub const ROTATION_SIZE: usize = 1;
/// Point the rotation turns around
pub const ROTATION_ORIGIN_SIZE: usize = 2;
/// RGBA color
pub const COLOR_SIZE: usize = 4;
/// Texture coordinates
pub const UV_SIZE: usize = 2;
/// 1-based texture slot, 0 means untextured
pub const TEX_ID_SIZE: usize = 1;
/// 1 when the camera view applies
pub const USE_CAMERA_SIZE: usize = 1;
/// Per-object rotation
pub const TRANSFORM_ROTATION_SIZE: usize = 1;
/// Per-object translation
pub const TRANSFORM_TRANSLATE_SIZE: usize = 2;
/// Per-object rotation origin
pub const TRANSFORM_ORIGIN_SIZE: usize = 2;
/// 1 when the quad is a font glyph
pub const IS_FONT_SIZE: usize = 1;

/// Offset of [`Vertex::position`] in floats
pub const POSITION_OFFSET: usize = 0;
/// Offset of [`Vertex::rotation`] in floats
pub const ROTATION_OFFSET: usize = POSITION_OFFSET + POSITION_SIZE;
/// Offset of [`Vertex::rotation_origin`] in floats
pub const ROTATION_ORIGIN_OFFSET: usize = ROTATION_OFFSET + ROTATION_SIZE;
/// Offset of [`Vertex::color`] in floats
pub const COLOR_OFFSET: usize = ROTATION_ORIGIN_OFFSET + ROTATION_ORIGIN_SIZE;
/// Offset of [`Vertex::uv`] in floats
pub const UV_OFFSET: usize = COLOR_OFFSET + COLOR_SIZE;
/// Offset of [`Vertex::tex_id`] in floats
pub const TEX_ID_OFFSET: usize = UV_OFFSET + UV_SIZE;
/// Offset of [`Vertex::use_camera`] in floats
pub const USE_CAMERA_OFFSET: usize = TEX_ID_OFFSET + TEX_ID_SIZE;
/// Offset of [`Vertex::transform_rotation`] in floats
pub const TRANSFORM_ROTATION_OFFSET: usize = USE_CAMERA_OFFSET + USE_CAMERA_SIZE;
/// Offset of [`Vertex::transform_translate`] in floats
pub const TRANSFORM_TRANSLATE_OFFSET: usize = TRANSFORM_ROTATION_OFFSET + TRANSFORM_ROTATION_SIZE;
/// Offset of [`Vertex::transform_origin`] in floats
pub const TRANSFORM_ORIGIN_OFFSET: usize = TRANSFORM_TRANSLATE_OFFSET + TRANSFORM_TRANSLATE_SIZE;
/// Offset of [`Vertex::is_font`] in floats
pub const IS_FONT_OFFSET: usize = TRANSFORM_ORIGIN_OFFSET + TRANSFORM_ORIGIN_SIZE;

/// Width of one vertex in floats
pub const VERTEX_SIZE_FLOATS: usize = IS_FONT_OFFSET + IS_FONT_SIZE;
/// Width of one vertex in bytes
pub const VERTEX_SIZE_BYTES: usize = VERTEX_SIZE_FLOATS * std::mem::size_of::<f32>();

/// One shader input of the interleaved layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Attribute location in the batch shader
    pub location: u32,
    /// Name used in the GLSL source
    pub name: &'static str,
    /// Component count
    pub size: usize,
    /// Offset in floats
    pub offset: usize,
}

impl VertexAttribute {
    /// Offset in bytes
    pub const fn offset_bytes(&self) -> usize {
        self.offset * std::mem::size_of::<f32>()
    }
}

/// The full layout in declaration order; locations are fixed
pub const VERTEX_ATTRIBUTES: [VertexAttribute; 11] = [
    VertexAttribute { location: 0, name: "aPosition", size: POSITION_SIZE, offset: POSITION_OFFSET },
    VertexAttribute { location: 1, name: "aRotation", size: ROTATION_SIZE, offset: ROTATION_OFFSET },
    VertexAttribute { location: 2, name: "aRotationOrigin", size: ROTATION_ORIGIN_SIZE, offset: ROTATION_ORIGIN_OFFSET },
    VertexAttribute { location: 3, name: "aColor", size: COLOR_SIZE, offset: COLOR_OFFSET },
    VertexAttribute { location: 4, name: "aTexCoords", size: UV_SIZE, offset: UV_OFFSET },
    VertexAttribute { location: 5, name: "aTexID", size: TEX_ID_SIZE, offset: TEX_ID_OFFSET },
    VertexAttribute { location: 6, name: "aUseCamera", size: USE_CAMERA_SIZE, offset: USE_CAMERA_OFFSET },
    VertexAttribute { location: 7, name: "aTransformRotation", size: TRANSFORM_ROTATION_SIZE, offset: TRANSFORM_ROTATION_OFFSET },
    VertexAttribute { location: 8, name: "aTransformTranslate", size: TRANSFORM_TRANSLATE_SIZE, offset: TRANSFORM_TRANSLATE_OFFSET },
    VertexAttribute { location: 9, name: "aTransformOrigin", size: TRANSFORM_ORIGIN_SIZE, offset: TRANSFORM_ORIGIN_OFFSET },
    VertexAttribute { location: 10, name: "aIsFont", size: IS_FONT_SIZE, offset: IS_FONT_OFFSET },
];

/// Interleaved batch vertex
///
/// `#[repr(C)]` with only `f32` fields, so a `&[Vertex]` can be uploaded as
/// raw bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    /// Screen position (z is depth)
    pub position: [f32; 3],
    /// Rotation in radians around `rotation_origin`
    pub rotation: f32,
    /// Pivot for `rotation`
    pub rotation_origin: [f32; 2],
    /// RGBA color
    pub color: Color,
    /// Texture coordinates
    pub uv: [f32; 2],
    /// 1-based texture slot in the owning batch, 0 when untextured
    pub tex_id: f32,
    /// 1.0 when the camera view applies
    pub use_camera: f32,
    /// Per-object rotation
    pub transform_rotation: f32,
    /// Per-object translation
    pub transform_translate: [f32; 2],
    /// Per-object rotation origin
    pub transform_origin: [f32; 2],
    /// 1.0 for font glyph quads
    pub is_font: f32,
}

impl Vertex {
    /// Colored, untextured vertex
    pub fn colored(x: f32, y: f32, color: Color) -> Self {
        Self {
            position: [x, y, 0.0],
            color,
            ..Self::default()
        }
    }

    /// Vertex sampling a texture at `uv`
    pub fn textured(x: f32, y: f32, color: Color, uv: [f32; 2]) -> Self {
        Self {
            position: [x, y, 0.0],
            color,
            uv,
            ..Self::default()
        }
    }

    /// Set depth
    pub fn with_depth(mut self, z: f32) -> Self {
        self.position[2] = z;
        self
    }

    /// Set rotation around `origin`
    pub fn with_rotation(mut self, radians: f32, origin: [f32; 2]) -> Self {
        self.rotation = radians;
        self.rotation_origin = origin;
        self
    }

    /// The vertex as its raw float layout
    pub fn as_floats(&self) -> &[f32; VERTEX_SIZE_FLOATS] {
        bytemuck::cast_ref(self)
    }
}

/// Per-object fields stamped on every vertex of one submission
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    /// Rotation in radians around `origin`
    pub rotation: f32,
    /// Translation applied after rotation
    pub translate: [f32; 2],
    /// Pivot for `rotation`
    pub origin: [f32; 2],
}

impl Transform {
    /// Identity transform
    pub const IDENTITY: Self = Self {
        rotation: 0.0,
        translate: [0.0, 0.0],
        origin: [0.0, 0.0],
    };

    /// Pure translation
    pub fn translation(x: f32, y: f32) -> Self {
        Self {
            translate: [x, y],
            ..Self::IDENTITY
        }
    }

    /// Rotation around a pivot
    pub fn rotation(radians: f32, origin: [f32; 2]) -> Self {
        Self {
            rotation: radians,
            origin,
            ..Self::IDENTITY
        }
    }
}

/// Errors building a vertex group
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VertexGroupError {
    /// Groups are triangles or quads
    #[error("vertex group needs 3 or 4 vertices, got {0}")]
    InvalidLength(usize),
}

/// A triangle (3 vertices) or quad (4 vertices)
///
/// Triangles are padded to quads by the batch by repeating vertex 0.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexGroup {
    vertices: [Vertex; 4],
    len: usize,
}

impl VertexGroup {
    /// Build a triangle
    pub fn triangle(a: Vertex, b: Vertex, c: Vertex) -> Self {
        Self {
            vertices: [a, b, c, Vertex::default()],
            len: 3,
        }
    }

    /// Build a quad, vertices in winding order
    pub fn quad(a: Vertex, b: Vertex, c: Vertex, d: Vertex) -> Self {
        Self {
            vertices: [a, b, c, d],
            len: 4,
        }
    }

    /// Build a group from a slice of 3 or 4 vertices
    pub fn from_slice(vertices: &[Vertex]) -> Result<Self, VertexGroupError> {
        match *vertices {
            [a, b, c] => Ok(Self::triangle(a, b, c)),
            [a, b, c, d] => Ok(Self::quad(a, b, c, d)),
            _ => Err(VertexGroupError::InvalidLength(vertices.len())),
        }
    }

    /// Number of supplied vertices (3 or 4)
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Always false, groups hold at least three vertices
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// The supplied vertices
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices[..self.len]
    }

    /// Mutable access to the supplied vertices
    pub fn vertices_mut(&mut self) -> &mut [Vertex] {
        &mut self.vertices[..self.len]
    }

    /// Set the texture slot on every vertex
    pub fn set_tex_id(&mut self, slot: u32) {
        for vertex in self.vertices_mut() {
            vertex.tex_id = slot as f32;
        }
    }
}
