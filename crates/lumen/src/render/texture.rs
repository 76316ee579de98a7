//! Texture loading
//!
//! Decodes images with the `image` crate, converts them to RGBA8 and uploads
//! them through a [`Render`] back end.

use std::path::Path;

use image::RgbaImage;
use thiserror::Error;

use crate::render::backend::{Render, RenderError, Texture};

/// Errors raised while loading a texture
#[derive(Debug, Error)]
pub enum TextureError {
    /// The file could not be read or decoded
    #[error("Failed to load image: {0}")]
    Image(#[from] image::ImageError),

    /// The upload failed
    #[error("Failed to upload texture: {0}")]
    Render(#[from] RenderError),
}

/// Load an image file and upload it
pub fn load_texture(render: &mut dyn Render, path: impl AsRef<Path>) -> Result<Texture, TextureError> {
    let path = path.as_ref();
    log::debug!("Loading texture from: {:?}", path);

    let image = image::open(path)?.to_rgba8();
    let texture = render.create_texture(&image)?;

    log::info!("Loaded texture {}x{} from {:?}", image.width(), image.height(), path);
    Ok(texture)
}

/// Decode an encoded image (PNG) held in memory and upload it
pub fn texture_from_bytes(render: &mut dyn Render, bytes: &[u8]) -> Result<Texture, TextureError> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    log::debug!("Loaded texture {}x{} from memory", image.width(), image.height());
    Ok(render.create_texture(&image)?)
}

/// Solid color image, useful for placeholders and tests
pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, image::Rgba(color))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::HeadlessRender;

    #[test]
    fn test_solid_color_fills_every_pixel() {
        let image = solid_color(3, 2, [10, 20, 30, 255]);
        assert_eq!(image.dimensions(), (3, 2));
        assert!(image.pixels().all(|p| p.0 == [10, 20, 30, 255]));
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let mut render = HeadlessRender::new();
        let result = texture_from_bytes(&mut render, b"definitely not a png");
        assert!(matches!(result, Err(TextureError::Image(_))));
        assert_eq!(render.texture_count(), 0);
    }

    #[test]
    fn test_missing_file_fails() {
        let mut render = HeadlessRender::new();
        assert!(load_texture(&mut render, "/nonexistent/texture.png").is_err());
    }
}
