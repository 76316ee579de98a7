//! Math utilities and types
//!
//! Provides the small set of nalgebra types the 2D renderer works with.

pub use nalgebra::{Matrix4, Vector2, Vector3};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Far clipping plane of the 2D projection
pub const Z_FAR: f32 = 2000.0;

/// Build the screen-space orthographic projection `ortho(0, width, 0, height, 0, Z_FAR)`
///
/// The origin sits in the bottom-left corner of the framebuffer and +Y points up.
/// A zero dimension is treated as one pixel so the matrix stays invertible.
pub fn screen_projection(width: u32, height: u32) -> Mat4 {
    Mat4::new_orthographic(0.0, width.max(1) as f32, 0.0, height.max(1) as f32, 0.0, Z_FAR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_sized_projection_is_finite() {
        let proj = screen_projection(0, 0);
        assert!(proj.iter().all(|v| v.is_finite()));
        assert_eq!(proj, screen_projection(1, 1));
    }

    #[test]
    fn test_projection_maps_corners_to_ndc() {
        let proj = screen_projection(640, 480);

        let bottom_left = proj * nalgebra::Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(bottom_left.x, -1.0);
        assert_relative_eq!(bottom_left.y, -1.0);

        let top_right = proj * nalgebra::Vector4::new(640.0, 480.0, 0.0, 1.0);
        assert_relative_eq!(top_right.x, 1.0);
        assert_relative_eq!(top_right.y, 1.0);
    }
}
