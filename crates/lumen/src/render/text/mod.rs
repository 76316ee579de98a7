//! Bitmap font text rendering
//!
//! Fonts are BMFont atlases: a PNG holding every glyph and a `.fnt` file
//! describing where each glyph sits. Text is drawn as one textured quad per
//! glyph through the batch controller.

pub mod bitmap_font;
pub mod fnt;

use thiserror::Error;

use crate::render::backend::RenderError;

pub use bitmap_font::{BitmapFont, FontSource, Glyph, GlyphQuad};

/// Errors raised while loading a font
#[derive(Debug, Error)]
pub enum FontError {
    /// A font file could not be read
    #[error("Failed to read font file: {0}")]
    Io(#[from] std::io::Error),

    /// The atlas is not a decodable image
    #[error("Failed to decode font atlas: {0}")]
    Image(#[from] image::ImageError),

    /// The `.fnt` text is malformed
    #[error("Malformed .fnt (line {line}): {reason}")]
    Parse {
        /// 1-based line number, 0 when the file as a whole is at fault
        line: usize,
        /// What was wrong
        reason: String,
    },

    /// The atlas could not be uploaded
    #[error("Failed to upload font atlas: {0}")]
    Render(#[from] RenderError),
}
