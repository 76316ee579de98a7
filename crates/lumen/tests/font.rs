//! Bitmap font loading, metrics and text submission

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbaImage};
use lumen::foundation::logging::{codes, ErrorRouter, MemorySink};
use lumen::render::draw::Draw2D;
use lumen::render::headless::HeadlessRender;
use lumen::render::text::{BitmapFont, FontSource};
use lumen::render::BatchController;

const SINGLE_GLYPH: &str = "info face=\"Test\" size=32\n\
    common lineHeight=32 scaleW=256 scaleH=256\n\
    chars count=1\n\
    char id=65 x=0 y=0 width=16 height=24 xoffset=1 yoffset=2 xadvance=18\n";

const ALPHABET: &str = "common lineHeight=20 scaleW=128 scaleH=64\n\
    chars count=4\n\
    char id=97 x=0 y=0 width=10 height=12 xoffset=0 yoffset=4 xadvance=11\n\
    char id=98 x=10 y=0 width=10 height=16 xoffset=1 yoffset=0 xadvance=11\n\
    char id=99 x=120 y=48 width=8 height=16 xoffset=0 yoffset=4 xadvance=9\n\
    char id=32 x=0 y=0 width=0 height=0 xoffset=0 yoffset=0 xadvance=5\n";

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(RgbaImage::new(width, height))
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn load(fnt: &str, render: &mut HeadlessRender) -> (BitmapFont, MemorySink) {
    let sink = MemorySink::new();
    let font = BitmapFont::from_memory(png(256, 256), fnt, render, ErrorRouter::with_sink(sink.clone())).unwrap();
    (font, sink)
}

#[test]
fn single_glyph_width_drops_trailing_gap() {
    let mut render = HeadlessRender::new();
    let (font, _sink) = load(SINGLE_GLYPH, &mut render);

    assert_eq!(font.width("A", 32), 18 - (18 - 16));
    assert_eq!(font.height('A', 32), Some(24));
}

#[test]
fn width_of_empty_is_zero_and_grows_with_suffixes() {
    let mut render = HeadlessRender::new();
    let (font, _sink) = load(ALPHABET, &mut render);

    assert_eq!(font.width("", 20), 0);
    let samples = ["a", "ab", "abc", "abc ", "abc a", "c b a"];
    for s in samples {
        for split in 0..=s.len() {
            let (head, _) = s.split_at(split);
            assert!(font.width(s, 20) >= font.width(head, 20), "{s:?} vs {head:?}");
        }
    }
}

#[test]
fn glyph_uvs_stay_in_unit_range() {
    let mut render = HeadlessRender::new();
    let (font, _sink) = load(ALPHABET, &mut render);

    for c in ['a', 'b', 'c', ' '] {
        let glyph = font.glyph(c).unwrap();
        for uv in glyph.uvs() {
            assert!((0.0..=1.0).contains(&uv[0]), "{c:?} u = {}", uv[0]);
            assert!((0.0..=1.0).contains(&uv[1]), "{c:?} v = {}", uv[1]);
        }
    }
}

#[test]
fn load_and_unload_are_idempotent() {
    let mut render = HeadlessRender::new();
    let sink = MemorySink::new();
    let mut font = BitmapFont::new(
        FontSource::Memory {
            png: png(64, 64),
            fnt: ALPHABET.to_string(),
        },
        ErrorRouter::with_sink(sink.clone()),
    );

    assert!(font.load(&mut render));
    assert!(font.load(&mut render));
    assert_eq!(render.texture_count(), 1);
    let before = font.width("abc", 20);

    font.unload(&mut render);
    font.unload(&mut render);
    assert!(!font.is_loaded());
    assert_eq!(render.texture_count(), 0);

    assert!(font.load(&mut render));
    assert_eq!(font.width("abc", 20), before);
    assert!(font.contains('b'));
    assert_eq!(sink.count(codes::FONT_LOAD), 0);
}

#[test]
fn missing_atlas_is_reported_not_fatal() {
    let mut render = HeadlessRender::new();
    let sink = MemorySink::new();
    let mut font = BitmapFont::from_paths(
        "/nonexistent/font.png",
        "/nonexistent/font.fnt",
        ErrorRouter::with_sink(sink.clone()),
    );

    assert!(!font.load(&mut render));
    assert_eq!(sink.count(codes::FONT_LOAD), 1);
    assert_eq!(font.width("abc", 20), 0);
}

#[test]
fn missing_glyph_is_skipped_and_reported() {
    let mut render = HeadlessRender::new();
    let (font, sink) = load(ALPHABET, &mut render);

    assert!(font.glyph('z').is_none());
    assert_eq!(font.height('z', 20), None);
    assert_eq!(font.width("aza", 20), font.width("aa", 20));
    assert!(sink.count(codes::GLYPH_MISSING) >= 3);
}

#[test]
fn text_submits_one_font_quad_per_visible_glyph() {
    let mut render = HeadlessRender::new();
    let (font, _sink) = load(ALPHABET, &mut render);
    let mut controller = BatchController::new(100);
    controller.start(&mut render).unwrap();

    let quads = Draw2D::new(&mut controller).text(&font, "ab c", 0.0, 0.0, 20).unwrap();
    assert_eq!(quads, 3);

    controller.finish_and_render(&mut render).unwrap();
    let draw = &render.draws()[0];
    assert_eq!(draw.vertices.len(), 12);
    assert!(draw.vertices.iter().all(|v| v.is_font == 1.0 && v.tex_id == 1.0));
    assert_eq!(draw.textures, vec![font.texture().unwrap()]);
}
