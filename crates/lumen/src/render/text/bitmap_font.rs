//! # Bitmap Font
//!
//! A BMFont atlas plus the glyph table parsed from its `.fnt` file.
//!
//! ## Loading
//!
//! A font is either `Unloaded` or `Loaded`. Eager constructors load
//! immediately; [`BitmapFont::new`] only remembers where the data lives and
//! loads on [`BitmapFont::load`]. Loading a loaded font and unloading an
//! unloaded one are no-ops, and a font can be reloaded after
//! [`BitmapFont::unload`] because the source is kept.
//!
//! ## Scaling
//!
//! Every pixel-size query scales atlas units by `px / em`, where `em` is the
//! line height from the `common` line (or the tallest glyph when the file
//! does not give one). A font drawn at its native line height therefore
//! measures exactly what the `.fnt` says.
//!
//! ## Missing glyphs
//!
//! Characters without a glyph are reported to the error router under
//! `GLYPH_MISSING` and skipped; measurements and layout carry on with the
//! remaining characters.

use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;

use image::RgbaImage;

use crate::foundation::logging::{codes, ErrorRouter, Severity};
use crate::render::backend::{Render, Texture};
use crate::render::text::fnt::{self, FntChar, FntFile};
use crate::render::text::FontError;

/// Atlas rectangle and placement metrics of one character
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    /// Atlas x
    pub x: i32,
    /// Atlas y, from the top
    pub y: i32,
    /// Atlas width
    pub width: i32,
    /// Atlas height
    pub height: i32,
    /// Horizontal placement offset
    pub x_offset: i32,
    /// Vertical placement offset from the top of the line
    pub y_offset: i32,
    /// Pen advance
    pub x_advance: i32,
    uvs: [[f32; 2]; 4],
    baseline_shift: i32,
}

impl Glyph {
    fn from_fnt(ch: &FntChar) -> Self {
        Self {
            x: ch.x,
            y: ch.y,
            width: ch.width,
            height: ch.height,
            x_offset: ch.x_offset,
            y_offset: ch.y_offset,
            x_advance: ch.x_advance,
            uvs: [[0.0; 2]; 4],
            baseline_shift: 0,
        }
    }

    fn make_coordinates(&mut self, atlas_width: u32, atlas_height: u32, line_box: i32) {
        let w = atlas_width.max(1) as f32;
        let h = atlas_height.max(1) as f32;
        let u = |px: i32| (px as f32 / w).clamp(0.0, 1.0);
        let v = |px: i32| (px as f32 / h).clamp(0.0, 1.0);

        self.uvs = [
            [u(self.x), v(self.y)],
            [u(self.x + self.width), v(self.y)],
            [u(self.x + self.width), v(self.y + self.height)],
            [u(self.x), v(self.y + self.height)],
        ];
        self.baseline_shift = line_box - self.y_offset - self.height;
    }

    /// UV corners: top-left, top-right, bottom-right, bottom-left
    pub fn uvs(&self) -> [[f32; 2]; 4] {
        self.uvs
    }

    /// Distance from the bottom of the line box to the bottom of the glyph,
    /// in atlas pixels
    pub fn baseline_shift(&self) -> i32 {
        self.baseline_shift
    }
}

/// A glyph placed on screen by [`BitmapFont::layout`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphQuad {
    /// Character drawn
    pub ch: char,
    /// Left edge
    pub x: f32,
    /// Bottom edge
    pub y: f32,
    /// Width on screen
    pub width: f32,
    /// Height on screen
    pub height: f32,
    /// UV corners, see [`Glyph::uvs`]
    pub uvs: [[f32; 2]; 4],
}

/// Where a font's atlas and metrics come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    /// Bytes already in memory
    Memory {
        /// Encoded PNG atlas
        png: Vec<u8>,
        /// `.fnt` text
        fnt: String,
    },
    /// Files read on load
    Paths {
        /// PNG atlas path
        png: PathBuf,
        /// `.fnt` path
        fnt: PathBuf,
    },
}

impl FontSource {
    fn read(&self) -> Result<(RgbaImage, FntFile), FontError> {
        let (png, fnt) = match self {
            Self::Memory { png, fnt } => (image::load_from_memory(png)?, fnt::parse(fnt)?),
            Self::Paths { png, fnt } => {
                log::debug!("Loading font atlas from {:?}", png);
                (image::open(png)?, fnt::parse(&std::fs::read_to_string(fnt)?)?)
            }
        };
        Ok((png.to_rgba8(), fnt))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Metrics {
    max_width: i32,
    max_height: i32,
    max_x_offset: i32,
    max_y_offset: i32,
    em: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FontState {
    Unloaded,
    Loaded(Texture),
}

/// BMFont atlas with its glyph table
#[derive(Debug)]
pub struct BitmapFont {
    source: FontSource,
    state: FontState,
    glyphs: HashMap<char, Glyph>,
    kernings: HashMap<(char, char), i32>,
    metrics: Metrics,
    router: ErrorRouter,
}

impl BitmapFont {
    /// Create an unloaded font; nothing is read until [`BitmapFont::load`]
    pub fn new(source: FontSource, router: ErrorRouter) -> Self {
        Self {
            source,
            state: FontState::Unloaded,
            glyphs: HashMap::new(),
            kernings: HashMap::new(),
            metrics: Metrics::default(),
            router,
        }
    }

    /// Create an unloaded font backed by two files
    pub fn from_paths(png: impl Into<PathBuf>, fnt: impl Into<PathBuf>, router: ErrorRouter) -> Self {
        Self::new(
            FontSource::Paths {
                png: png.into(),
                fnt: fnt.into(),
            },
            router,
        )
    }

    /// Load a font from in-memory PNG bytes and `.fnt` text
    pub fn from_memory(
        png: Vec<u8>,
        fnt: impl Into<String>,
        render: &mut dyn Render,
        router: ErrorRouter,
    ) -> Result<Self, FontError> {
        let mut font = Self::new(FontSource::Memory { png, fnt: fnt.into() }, router);
        font.try_load(render)?;
        Ok(font)
    }

    /// Load a font by draining two readers
    pub fn from_readers(
        mut png: impl Read,
        mut fnt: impl Read,
        render: &mut dyn Render,
        router: ErrorRouter,
    ) -> Result<Self, FontError> {
        let mut png_bytes = Vec::new();
        png.read_to_end(&mut png_bytes)?;
        let mut fnt_text = String::new();
        fnt.read_to_string(&mut fnt_text)?;
        Self::from_memory(png_bytes, fnt_text, render, router)
    }

    /// Load the atlas and glyph table, returning the failure
    pub fn try_load(&mut self, render: &mut dyn Render) -> Result<(), FontError> {
        if self.is_loaded() {
            return Ok(());
        }

        let (atlas, file) = self.source.read()?;
        let texture = render.create_texture(&atlas)?;

        let mut metrics = Metrics::default();
        let mut glyphs = HashMap::with_capacity(file.chars.len());
        for ch in &file.chars {
            metrics.max_width = metrics.max_width.max(ch.width);
            metrics.max_height = metrics.max_height.max(ch.height);
            metrics.max_x_offset = metrics.max_x_offset.max(ch.x_offset);
            metrics.max_y_offset = metrics.max_y_offset.max(ch.y_offset);
            match char::from_u32(ch.id) {
                Some(c) => {
                    glyphs.insert(c, Glyph::from_fnt(ch));
                }
                None => log::warn!("Skipping glyph with invalid character id {}", ch.id),
            }
        }
        metrics.em = if file.common.line_height > 0 {
            file.common.line_height
        } else {
            metrics.max_height
        };

        let kernings = file
            .kernings
            .iter()
            .filter_map(|k| Some(((char::from_u32(k.first)?, char::from_u32(k.second)?), k.amount)))
            .collect();

        let line_box = metrics.max_height + metrics.max_y_offset;
        for glyph in glyphs.values_mut() {
            glyph.make_coordinates(file.common.scale_w, file.common.scale_h, line_box);
        }

        log::debug!("Loaded font with {} glyphs ({}x{} atlas)", glyphs.len(), atlas.width(), atlas.height());
        self.glyphs = glyphs;
        self.kernings = kernings;
        self.metrics = metrics;
        self.state = FontState::Loaded(texture);
        Ok(())
    }

    /// Load the font, reporting failures under `FONT_LOAD`
    ///
    /// Returns whether the font is loaded afterwards.
    pub fn load(&mut self, render: &mut dyn Render) -> bool {
        if let Err(e) = self.try_load(render) {
            self.router.send(codes::FONT_LOAD, Severity::Recoverable, &e);
        }
        self.is_loaded()
    }

    /// Release the atlas and clear the glyph table
    pub fn unload(&mut self, render: &mut dyn Render) {
        if let FontState::Loaded(texture) = self.state {
            render.delete_texture(&texture);
            self.glyphs.clear();
            self.kernings.clear();
            self.metrics = Metrics::default();
            self.state = FontState::Unloaded;
        }
    }

    /// True between a successful load and the next unload
    pub fn is_loaded(&self) -> bool {
        matches!(self.state, FontState::Loaded(_))
    }

    /// Atlas texture while loaded
    pub fn texture(&self) -> Option<Texture> {
        match self.state {
            FontState::Loaded(texture) => Some(texture),
            FontState::Unloaded => None,
        }
    }

    /// Where the font is loaded from
    pub fn source(&self) -> &FontSource {
        &self.source
    }

    fn multiplier(&self, px: i32) -> f32 {
        if self.metrics.em == 0 {
            0.0
        } else {
            px as f32 / self.metrics.em as f32
        }
    }

    fn scaled(&self, value: i32, px: i32) -> i32 {
        (value as f32 * self.multiplier(px)) as i32
    }

    /// Suggested gap between words, a tenth of the widest glyph
    pub fn spacing(&self) -> i32 {
        self.metrics.max_width / 10
    }

    /// Tallest glyph in atlas pixels
    pub fn max_height(&self) -> i32 {
        self.metrics.max_height
    }

    /// Tallest glyph at `px`
    pub fn max_height_px(&self, px: i32) -> i32 {
        self.scaled(self.metrics.max_height, px)
    }

    /// Widest glyph in atlas pixels
    pub fn max_width(&self) -> i32 {
        self.metrics.max_width
    }

    /// Largest x offset in atlas pixels
    pub fn max_x_offset(&self) -> i32 {
        self.metrics.max_x_offset
    }

    /// Largest x offset at `px`
    pub fn max_x_offset_px(&self, px: i32) -> i32 {
        self.scaled(self.metrics.max_x_offset, px)
    }

    /// Largest y offset in atlas pixels
    pub fn max_y_offset(&self) -> i32 {
        self.metrics.max_y_offset
    }

    /// Largest y offset at `px`
    pub fn max_y_offset_px(&self, px: i32) -> i32 {
        self.scaled(self.metrics.max_y_offset, px)
    }

    /// True when the font has a glyph for `c`
    pub fn contains(&self, c: char) -> bool {
        self.glyphs.contains_key(&c)
    }

    /// Glyph for `c`; a miss is reported under `GLYPH_MISSING`
    pub fn glyph(&self, c: char) -> Option<&Glyph> {
        let glyph = self.glyphs.get(&c);
        if glyph.is_none() {
            self.router.send(
                codes::GLYPH_MISSING,
                Severity::Warning,
                &format_args!("Character {c:?} not supported by this font"),
            );
        }
        glyph
    }

    /// Pen adjustment in atlas pixels between `first` and `second`
    pub fn kerning(&self, first: char, second: char) -> i32 {
        self.kernings.get(&(first, second)).copied().unwrap_or(0)
    }

    /// Glyphs for every character of `s`, in order
    pub fn glyphs(&self, s: &str) -> Vec<Option<&Glyph>> {
        s.chars().map(|c| self.glyph(c)).collect()
    }

    /// Height of `c` at `px`, `None` when the font lacks it
    pub fn height(&self, c: char, px: i32) -> Option<i32> {
        self.glyph(c).map(|g| self.scaled(g.height, px))
    }

    /// Width of `s` drawn at `px`
    ///
    /// The sum of the advances and kerning pairs, minus the trailing gap
    /// after the last glyph unless the string ends in a space.
    pub fn width(&self, s: &str, px: i32) -> i32 {
        let k = self.multiplier(px);
        let mut width = 0.0;
        let mut last: Option<(char, Option<&Glyph>)> = None;
        for c in s.chars() {
            if let Some((prev, _)) = last {
                width += self.kerning(prev, c) as f32 * k;
            }
            let glyph = self.glyph(c);
            if let Some(glyph) = glyph {
                width += glyph.x_advance as f32 * k;
            }
            last = Some((c, glyph));
        }
        if let Some((c, Some(glyph))) = last {
            if c != ' ' {
                width -= (glyph.x_advance - glyph.width) as f32 * k;
            }
        }
        width as i32
    }

    /// How many trailing characters of `s` fit in `limit_px` at `px`
    ///
    /// Measures suffixes, so callers can keep the end of a string that is
    /// too long and cut its beginning.
    pub fn possible_amount_of_chars(&self, s: &str, limit_px: i32, px: i32) -> usize {
        let chars: Vec<char> = s.chars().collect();
        for i in 0..=chars.len() {
            let suffix: String = chars[chars.len() - i..].iter().collect();
            if limit_px < self.width(&suffix, px) {
                return i.saturating_sub(1);
            }
        }
        chars.len()
    }

    /// Place every glyph of `text` starting at `(x, y)`, the bottom-left
    /// corner of the line box
    pub fn layout(&self, text: &str, x: f32, y: f32, px: i32) -> Vec<GlyphQuad> {
        let k = self.multiplier(px);
        let mut pen = x;
        let mut prev = None;
        let mut quads = Vec::with_capacity(text.len());
        for c in text.chars() {
            if let Some(prev) = prev.replace(c) {
                pen += self.kerning(prev, c) as f32 * k;
            }
            let Some(glyph) = self.glyph(c) else {
                continue;
            };
            if glyph.width > 0 && glyph.height > 0 {
                quads.push(GlyphQuad {
                    ch: c,
                    x: pen + glyph.x_offset as f32 * k,
                    y: y + glyph.baseline_shift as f32 * k,
                    width: glyph.width as f32 * k,
                    height: glyph.height as f32 * k,
                    uvs: glyph.uvs,
                });
            }
            pen += glyph.x_advance as f32 * k;
        }
        quads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::logging::MemorySink;
    use crate::render::headless::HeadlessRender;
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;

    const FNT: &str = "common lineHeight=32 scaleW=256 scaleH=256\n\
        chars count=3\n\
        char id=65 x=0 y=0 width=16 height=24 xoffset=1 yoffset=2 xadvance=18\n\
        char id=66 x=16 y=0 width=14 height=24 xoffset=0 yoffset=2 xadvance=15\n\
        char id=32 x=240 y=0 width=0 height=0 xoffset=0 yoffset=0 xadvance=8\n";

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(RgbaImage::new(width, height))
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn font() -> (BitmapFont, HeadlessRender, MemorySink) {
        let mut render = HeadlessRender::new();
        let sink = MemorySink::new();
        let font = BitmapFont::from_memory(png(256, 256), FNT, &mut render, ErrorRouter::with_sink(sink.clone())).unwrap();
        (font, render, sink)
    }

    #[test]
    fn test_single_glyph_width() {
        let (font, _render, _sink) = font();
        assert_eq!(font.width("A", 32), 16);
    }

    #[test]
    fn test_width_of_empty_string_is_zero() {
        let (font, _render, _sink) = font();
        assert_eq!(font.width("", 32), 0);
    }

    #[test]
    fn test_trailing_space_keeps_advance() {
        let (font, _render, _sink) = font();
        assert_eq!(font.width("A ", 32), 18 + 8);
        assert_eq!(font.width("AB", 32), 18 + 15 - 1);
    }

    #[test]
    fn test_width_scales_with_pixel_size() {
        let (font, _render, _sink) = font();
        assert_eq!(font.width("A", 64), 32);
        assert_eq!(font.height('A', 64), Some(48));
    }

    #[test]
    fn test_metrics() {
        let (font, _render, _sink) = font();
        assert_eq!(font.max_width(), 16);
        assert_eq!(font.max_height(), 24);
        assert_eq!(font.spacing(), 1);
        assert_eq!(font.max_x_offset(), 1);
        assert_eq!(font.max_y_offset(), 2);
    }

    #[test]
    fn test_uvs_are_normalized() {
        let (font, _render, _sink) = font();
        let uvs = font.glyph('B').unwrap().uvs();
        assert_eq!(uvs[0], [16.0 / 256.0, 0.0]);
        assert_eq!(uvs[2], [30.0 / 256.0, 24.0 / 256.0]);
        for glyph in font.glyphs.values() {
            for [u, v] in glyph.uvs() {
                assert!((0.0..=1.0).contains(&u) && (0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_missing_glyph_is_reported_and_skipped() {
        let (font, _render, sink) = font();

        assert!(font.glyph('Z').is_none());
        assert_eq!(font.height('Z', 32), None);
        // No trailing-gap correction when the last glyph is missing.
        assert_eq!(font.width("AZ", 32), 18);
        assert!(sink.count(codes::GLYPH_MISSING) >= 3);
        assert!(!font.contains('Z'));
    }

    #[test]
    fn test_possible_amount_measures_suffix() {
        let (font, _render, _sink) = font();
        // "BA" is 15 + 16 = 31 wide, "ABA" is 49 wide.
        assert_eq!(font.possible_amount_of_chars("ABA", 31, 32), 2);
        assert_eq!(font.possible_amount_of_chars("ABA", 1000, 32), 3);
        assert_eq!(font.possible_amount_of_chars("ABA", 10, 32), 0);
    }

    #[test]
    fn test_layout_advances_pen() {
        let (font, _render, _sink) = font();
        let quads = font.layout("A B", 10.0, 100.0, 32);

        assert_eq!(quads.len(), 2);
        assert_eq!(quads[0].ch, 'A');
        assert_eq!(quads[0].x, 11.0);
        assert_eq!(quads[0].width, 16.0);
        assert_eq!(quads[1].ch, 'B');
        assert_eq!(quads[1].x, 10.0 + 18.0 + 8.0);
        assert_eq!(quads[0].y, 100.0 + (26 - 2 - 24) as f32);
    }

    #[test]
    fn test_kerning_pair_tightens_width_and_layout() {
        let kerned = format!("{FNT}kerning first=65 second=66 amount=-3\n");
        let mut render = HeadlessRender::new();
        let font = BitmapFont::from_memory(png(256, 256), kerned, &mut render, ErrorRouter::new()).unwrap();

        assert_eq!(font.kerning('A', 'B'), -3);
        assert_eq!(font.kerning('B', 'A'), 0);
        assert_eq!(font.width("AB", 32), 18 + 15 - 1 - 3);
        assert_eq!(font.width("BA", 32), 15 + 16);

        let quads = font.layout("AB", 0.0, 0.0, 32);
        assert_eq!(quads[1].x, 18.0 - 3.0);
        // "AB" now measures 29.
        assert_eq!(font.possible_amount_of_chars("AB", 29, 32), 2);
    }

    #[test]
    fn test_missing_glyph_is_a_warning() {
        let (font, _render, sink) = font();
        font.glyph('Z');
        let records = sink.records();
        assert!(!records.is_empty());
        assert!(records.iter().all(|r| r.severity == Severity::Warning));
    }

    #[test]
    fn test_load_unload_toggle() {
        let (mut font, mut render, _sink) = font();
        assert!(font.is_loaded());
        assert_eq!(render.texture_count(), 1);

        assert!(font.load(&mut render));
        assert_eq!(render.texture_count(), 1);

        font.unload(&mut render);
        font.unload(&mut render);
        assert!(!font.is_loaded());
        assert_eq!(render.texture_count(), 0);
        assert!(font.texture().is_none());

        assert!(font.load(&mut render));
        assert_eq!(font.width("A", 32), 16);
    }

    #[test]
    fn test_deferred_font_reports_load_failure() {
        let mut render = HeadlessRender::new();
        let sink = MemorySink::new();
        let mut font = BitmapFont::from_paths("/nonexistent/font.png", "/nonexistent/font.fnt", ErrorRouter::with_sink(sink.clone()));

        assert!(!font.is_loaded());
        assert!(!font.load(&mut render));
        assert_eq!(sink.count(codes::FONT_LOAD), 1);
        assert_eq!(font.width("A", 32), 0);
    }

    #[test]
    fn test_from_readers_loads_eagerly() {
        let mut render = HeadlessRender::new();
        let font = BitmapFont::from_readers(
            Cursor::new(png(256, 256)),
            Cursor::new(FNT.as_bytes()),
            &mut render,
            ErrorRouter::new(),
        )
        .unwrap();
        assert!(font.is_loaded());
        assert!(font.contains('A'));
    }
}
