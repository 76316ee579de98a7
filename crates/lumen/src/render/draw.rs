//! 2D drawing helpers on top of the batch controller
//!
//! [`Draw2D`] turns shapes into vertex groups. It holds no state between
//! frames; create one inside the application's `draw` callback:
//!
//! ```ignore
//! let mut draw = Draw2D::new(window.batch_controller_mut()).color([1.0, 0.5, 0.0, 1.0]);
//! draw.rectangle(10.0, 10.0, 100.0, 50.0)?;
//! draw.text(&font, "Score: 10", 10.0, 80.0, 24)?;
//! ```
//!
//! Rectangles are wound top-left, top-right, bottom-right, bottom-left with
//! +Y up, matching the glyph UV corner order.

use crate::render::batch_controller::{BatchController, BatchResult};
use crate::render::backend::Texture;
use crate::render::text::BitmapFont;
use crate::render::vertex::{Color, Transform, Vertex, VertexGroup};

/// Full-texture UV corners in quad winding order
pub const FULL_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

/// Shape submission helper
#[derive(Debug)]
pub struct Draw2D<'a> {
    batch: &'a mut BatchController,
    color: Color,
    depth: f32,
    use_camera: bool,
    stencil: bool,
    transform: Transform,
}

impl<'a> Draw2D<'a> {
    /// Draw into the regular pass, white, screen space
    pub fn new(batch: &'a mut BatchController) -> Self {
        Self {
            batch,
            color: [1.0; 4],
            depth: 0.0,
            use_camera: false,
            stencil: false,
            transform: Transform::IDENTITY,
        }
    }

    /// Draw into the stencil pass
    pub fn stencil(batch: &'a mut BatchController) -> Self {
        Self {
            stencil: true,
            ..Self::new(batch)
        }
    }

    /// Set the fill color
    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Set the depth of subsequent shapes
    pub fn depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }

    /// Apply the camera view to subsequent shapes
    pub fn with_camera(mut self, use_camera: bool) -> Self {
        self.use_camera = use_camera;
        self
    }

    /// Per-object transform for subsequent shapes
    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Change the fill color in place
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    fn submit(&mut self, group: &VertexGroup, is_font: bool) -> BatchResult<()> {
        if self.stencil {
            self.batch.add_stencil_figure(group, &self.transform, self.use_camera, is_font)
        } else {
            self.batch.add_figure(group, &self.transform, self.use_camera, is_font)
        }
    }

    fn submit_textured(&mut self, group: &VertexGroup, texture: &Texture, is_font: bool) -> BatchResult<u32> {
        if self.stencil {
            self.batch
                .add_stencil_textured_figure(group, texture, &self.transform, self.use_camera, is_font)
        } else {
            self.batch
                .add_textured_figure(group, texture, &self.transform, self.use_camera, is_font)
        }
    }

    fn quad(&self, x: f32, y: f32, width: f32, height: f32, uvs: [[f32; 2]; 4]) -> VertexGroup {
        let corner = |cx: f32, cy: f32, uv: [f32; 2]| Vertex::textured(cx, cy, self.color, uv).with_depth(self.depth);
        VertexGroup::quad(
            corner(x, y + height, uvs[0]),
            corner(x + width, y + height, uvs[1]),
            corner(x + width, y, uvs[2]),
            corner(x, y, uvs[3]),
        )
    }

    /// Filled rectangle with its bottom-left corner at `(x, y)`
    pub fn rectangle(&mut self, x: f32, y: f32, width: f32, height: f32) -> BatchResult<()> {
        let group = self.quad(x, y, width, height, FULL_UVS);
        self.submit(&group, false)
    }

    /// Filled rectangle rotated by `radians` around its center
    pub fn rotated_rectangle(&mut self, x: f32, y: f32, width: f32, height: f32, radians: f32) -> BatchResult<()> {
        let mut group = self.quad(x, y, width, height, FULL_UVS);
        let center = [x + width / 2.0, y + height / 2.0];
        for vertex in group.vertices_mut() {
            *vertex = vertex.with_rotation(radians, center);
        }
        self.submit(&group, false)
    }

    /// Filled triangle
    pub fn triangle(&mut self, a: [f32; 2], b: [f32; 2], c: [f32; 2]) -> BatchResult<()> {
        let vertex = |p: [f32; 2]| Vertex::colored(p[0], p[1], self.color).with_depth(self.depth);
        let group = VertexGroup::triangle(vertex(a), vertex(b), vertex(c));
        self.submit(&group, false)
    }

    /// Whole texture stretched over a rectangle, tinted by the fill color
    pub fn image(&mut self, x: f32, y: f32, width: f32, height: f32, texture: &Texture) -> BatchResult<u32> {
        self.image_region(x, y, width, height, texture, FULL_UVS)
    }

    /// Part of a texture stretched over a rectangle
    pub fn image_region(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        texture: &Texture,
        uvs: [[f32; 2]; 4],
    ) -> BatchResult<u32> {
        let group = self.quad(x, y, width, height, uvs);
        self.submit_textured(&group, texture, false)
    }

    /// Text with the bottom-left of its line box at `(x, y)`
    ///
    /// Returns the number of glyph quads submitted. Nothing is drawn for an
    /// unloaded font.
    pub fn text(&mut self, font: &BitmapFont, text: &str, x: f32, y: f32, px: i32) -> BatchResult<usize> {
        let Some(texture) = font.texture() else {
            return Ok(0);
        };
        let quads = font.layout(text, x, y, px);
        for quad in &quads {
            let group = self.quad(quad.x, quad.y, quad.width, quad.height, quad.uvs);
            self.submit_textured(&group, &texture, true)?;
        }
        Ok(quads.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::HeadlessRender;

    fn controller() -> (BatchController, HeadlessRender) {
        let mut render = HeadlessRender::new();
        let mut controller = BatchController::new(100);
        controller.start(&mut render).unwrap();
        (controller, render)
    }

    #[test]
    fn test_rectangle_corners() {
        let (mut controller, _render) = controller();
        Draw2D::new(&mut controller)
            .color([0.0, 1.0, 0.0, 1.0])
            .rectangle(10.0, 20.0, 30.0, 40.0)
            .unwrap();

        let vertices = controller.batch(0).unwrap().vertices();
        let positions: Vec<[f32; 2]> = vertices.iter().map(|v| [v.position[0], v.position[1]]).collect();
        assert_eq!(positions, vec![[10.0, 60.0], [40.0, 60.0], [40.0, 20.0], [10.0, 20.0]]);
        assert!(vertices.iter().all(|v| v.color == [0.0, 1.0, 0.0, 1.0] && v.tex_id == 0.0));
    }

    #[test]
    fn test_rotated_rectangle_pivots_on_center() {
        let (mut controller, _render) = controller();
        Draw2D::new(&mut controller).rotated_rectangle(0.0, 0.0, 10.0, 20.0, 1.5).unwrap();

        for vertex in controller.batch(0).unwrap().vertices() {
            assert_eq!(vertex.rotation, 1.5);
            assert_eq!(vertex.rotation_origin, [5.0, 10.0]);
        }
    }

    #[test]
    fn test_triangle_is_padded() {
        let (mut controller, _render) = controller();
        Draw2D::new(&mut controller).triangle([0.0, 0.0], [1.0, 0.0], [0.0, 1.0]).unwrap();
        assert_eq!(controller.batch(0).unwrap().vert_count(), 4);
    }

    #[test]
    fn test_image_gets_a_slot() {
        let (mut controller, mut render) = controller();
        let texture = render.solid_texture(8, 8);
        let slot = Draw2D::new(&mut controller).image(0.0, 0.0, 8.0, 8.0, &texture).unwrap();

        assert_eq!(slot, 1);
        let batch = controller.batch(0).unwrap();
        assert!(batch.vertices().iter().all(|v| v.tex_id == 1.0));
        assert_eq!(batch.vertices()[2].uv, [1.0, 1.0]);
    }

    #[test]
    fn test_stencil_helper_targets_stencil_pass() {
        let (mut controller, _render) = controller();
        Draw2D::stencil(&mut controller).rectangle(0.0, 0.0, 1.0, 1.0).unwrap();

        assert!(controller.batch(0).unwrap().is_empty());
        assert_eq!(controller.stencil_batch(0).unwrap().vert_count(), 4);
    }

    #[test]
    fn test_camera_and_transform_are_stamped() {
        let (mut controller, _render) = controller();
        Draw2D::new(&mut controller)
            .with_camera(true)
            .transform(Transform::translation(5.0, 6.0))
            .rectangle(0.0, 0.0, 1.0, 1.0)
            .unwrap();

        let vertex = controller.batch(0).unwrap().vertices()[0];
        assert_eq!(vertex.use_camera, 1.0);
        assert_eq!(vertex.transform_translate, [5.0, 6.0]);
    }
}
