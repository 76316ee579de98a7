//! # 2D Camera
//!
//! Vertices submitted with `use_camera = true` are multiplied by the camera
//! view before the screen projection. Everything else (HUD, text overlays)
//! stays fixed to the screen.

use crate::foundation::math::{Mat4, Vec2, Vec3};

/// Pan, rotate and zoom for world-space submissions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera2D {
    /// World point shown at the screen origin
    pub position: Vec2,

    /// Rotation of the world around the screen origin, in radians
    pub rotation: f32,

    /// Scale factor; 2.0 shows everything twice as large
    pub zoom: f32,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            position: Vec2::zeros(),
            rotation: 0.0,
            zoom: 1.0,
        }
    }
}

impl Camera2D {
    /// Camera looking at `position` with no rotation or zoom
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Move by `delta` world units
    pub fn pan(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// View matrix: translate by `-position`, rotate by `-rotation`, then scale
    pub fn view_matrix(&self) -> Mat4 {
        let translate = Mat4::new_translation(&Vec3::new(-self.position.x, -self.position.y, 0.0));
        let rotate = Mat4::new_rotation(Vec3::new(0.0, 0.0, -self.rotation));
        let scale = Mat4::new_nonuniform_scaling(&Vec3::new(self.zoom, self.zoom, 1.0));
        scale * rotate * translate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector4;

    #[test]
    fn test_default_view_is_identity() {
        assert_relative_eq!(Camera2D::default().view_matrix(), Mat4::identity());
    }

    #[test]
    fn test_position_maps_to_origin() {
        let camera = Camera2D::new(Vec2::new(100.0, 50.0));
        let p = camera.view_matrix() * Vector4::new(100.0, 50.0, 0.0, 1.0);
        assert_relative_eq!(p.x, 0.0);
        assert_relative_eq!(p.y, 0.0);
    }

    #[test]
    fn test_zoom_scales_after_translation() {
        let mut camera = Camera2D::new(Vec2::new(10.0, 0.0));
        camera.zoom = 2.0;
        let p = camera.view_matrix() * Vector4::new(15.0, 5.0, 3.0, 1.0);
        assert_relative_eq!(p.x, 10.0);
        assert_relative_eq!(p.y, 10.0);
        assert_relative_eq!(p.z, 3.0);
    }

    #[test]
    fn test_rotation_turns_world_clockwise() {
        let camera = Camera2D {
            rotation: std::f32::consts::FRAC_PI_2,
            ..Camera2D::default()
        };
        let p = camera.view_matrix() * Vector4::new(0.0, 1.0, 0.0, 1.0);
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-6);
    }
}
